use std::io;
use std::io::ErrorKind::InvalidData;
use std::sync::Arc;

use rustc_serialize::hex::ToHex;

use algorithm::KeyExchangeAlgorithm;
use error::KexError;
use hash::HashAlgorithm;
use key_exchange::{KexResult, KeyExchange};
use key_exchange::dh::{DhKeyPair, SharedSecret};
use key_exchange::group::{self, Group, GroupProvider, GroupRequest};
use message::MessageType;
use packet::{Packet, ReadPacketExt, WritePacketExt};
use public_key;
use session::{KexOutput, Role, Session};

const DH_GEX_GROUP: u8 = 31;
const DH_GEX_INIT: u8 = 32;
const DH_GEX_REPLY: u8 = 33;
const DH_GEX_REQUEST: u8 = 34;

#[derive(Clone, Copy, PartialEq, Debug)]
enum State {
    Idle,
    /// Client, waiting for the group
    SentRequest,
    /// Client, waiting for the reply
    SentInit,
    /// Server, waiting for the client's public value
    SentGroup,
    Done,
    Failed,
}

/// Outcome of a successful transition
enum Step {
    /// Send this and wait for the next message
    Continue(Packet),
    /// The exchange is complete, send this last packet if any
    Finish(Option<Packet>),
}

/// Diffie-Hellman group exchange, RFC 4419, for either side of a
/// connection. One instance runs exactly one exchange.
pub struct DhGroupExchange {
    algorithm: KeyExchangeAlgorithm,
    hash: &'static HashAlgorithm,
    groups: Arc<dyn GroupProvider>,
    request: GroupRequest,
    state: State,
    /// min || n || max || p || g || e || f, in exchange hash encoding
    transcript: Vec<u8>,
    group: Option<Group>,
    key: Option<DhKeyPair>,
}

impl DhGroupExchange {
    pub fn new(
        algorithm: KeyExchangeAlgorithm,
        hash: &'static HashAlgorithm,
        groups: Arc<dyn GroupProvider>,
        request: GroupRequest,
    ) -> DhGroupExchange {
        DhGroupExchange {
            algorithm: algorithm,
            hash: hash,
            groups: groups,
            request: request,
            state: State::Idle,
            transcript: Vec::new(),
            group: None,
            key: None,
        }
    }

    fn transition(&mut self, session: &mut Session, packet: &Packet)
        -> Result<Step, KexError> {
        let role = session.role();
        let msg = packet.code();

        match (role, msg)
        {
            (Role::Server, DH_GEX_REQUEST) |
            (Role::Server, DH_GEX_INIT) |
            (Role::Client, DH_GEX_GROUP) |
            (Role::Client, DH_GEX_REPLY) => (),
            (_, DH_GEX_REQUEST) |
            (_, DH_GEX_INIT) |
            (_, DH_GEX_GROUP) |
            (_, DH_GEX_REPLY) => {
                return Err(KexError::RoleViolation { role: role, msg: msg })
            }
            _ => return Err(KexError::Unimplemented(msg)),
        }

        match (self.state, msg)
        {
            (State::Idle, DH_GEX_REQUEST) => {
                self.group_request(packet).map(Step::Continue)
            }
            (State::SentRequest, DH_GEX_GROUP) => self.group(packet).map(Step::Continue),
            (State::SentGroup, DH_GEX_INIT) => {
                self.initialize(session, packet).map(|reply| Step::Finish(Some(reply)))
            }
            (State::SentInit, DH_GEX_REPLY) => {
                self.reply(session, packet).map(|_| Step::Finish(None))
            }
            _ => Err(KexError::OutOfSequence(msg)),
        }
    }

    /// Server: pick a group for the requested size range
    fn group_request(&mut self, packet: &Packet) -> Result<Packet, KexError> {
        let body = packet.reader();
        let mut reader = body;

        let min = reader.read_uint32()?;
        let n = reader.read_uint32()?;
        let max = reader.read_uint32()?;
        expect_end(reader)?;

        debug!("Group size request: min {}, n {}, max {}", min, n, max);

        let (min, n, max) = group::clamp(min, n, max)?;
        trace!("Clamped group size request: min {}, n {}, max {}", min, n, max);

        let group = self.groups.select_group(n)?;

        let mut encoded = Vec::new();
        encoded.write_mpint(&group.p)?;
        encoded.write_mpint(&group.g)?;

        self.transcript.extend_from_slice(body);
        self.transcript.extend_from_slice(&encoded);

        let mut packet = Packet::new(MessageType::KeyExchange(DH_GEX_GROUP));
        packet.write_raw_bytes(&encoded)?;

        self.group = Some(group);
        self.state = State::SentGroup;

        Ok(packet)
    }

    /// Client: generate our key pair for the group the server picked
    fn group(&mut self, packet: &Packet) -> Result<Packet, KexError> {
        let body = packet.reader();
        let mut reader = body;

        let group = Group {
            p: reader.read_mpint()?,
            g: reader.read_mpint()?,
        };
        expect_end(reader)?;

        debug!("Received {} bit group", group.bits());
        group.validate(self.request.min, self.request.max)?;

        let key = DhKeyPair::generate(&group)?;

        let mut e = Vec::new();
        e.write_mpint(key.public())?;

        self.transcript.extend_from_slice(body);
        self.transcript.extend_from_slice(&e);

        let mut packet = Packet::new(MessageType::KeyExchange(DH_GEX_INIT));
        packet.write_raw_bytes(&e)?;

        self.group = Some(group);
        self.key = Some(key);
        self.state = State::SentInit;

        Ok(packet)
    }

    /// Server: finish the exchange and sign the exchange hash
    fn initialize(&mut self, session: &mut Session, packet: &Packet)
        -> Result<Packet, KexError> {
        let body = packet.reader();
        let mut reader = body;

        let e = reader.read_mpint()?;
        expect_end(reader)?;

        let group = self.group.as_ref().ok_or(KexError::MissingContext("group"))?;
        let key = DhKeyPair::generate(group)?;

        self.transcript.extend_from_slice(body);
        self.transcript.write_mpint(key.public())?;

        let shared_secret = key.compute_shared_secret(group, &e)?;

        let (host_key_blob, signature, exchange_hash) = {
            let host_key = session
                .host_key()
                .ok_or(KexError::MissingContext("host key"))?;
            let blob = host_key
                .public_blob()
                .map_err(|_| KexError::Crypto("encoding the host key failed"))?;

            let hash = self.exchange_hash(session, &blob, &shared_secret)?;
            let signature = host_key
                .sign(&hash)
                .map_err(|_| KexError::Crypto("signing the exchange hash failed"))?;

            (blob, signature, hash)
        };

        let mut packet = Packet::new(MessageType::KeyExchange(DH_GEX_REPLY));
        packet.write_bytes(&host_key_blob)?;
        packet.write_mpint(key.public())?;
        packet.write_bytes(&signature)?;

        info!("{} complete, exchange hash {}", self.algorithm, exchange_hash.to_hex());

        session.commit(KexOutput {
            exchange_hash: exchange_hash,
            shared_secret: shared_secret,
            host_key: host_key_blob,
        });

        Ok(packet)
    }

    /// Client: check the server's signature over the exchange hash
    fn reply(&mut self, session: &mut Session, packet: &Packet)
        -> Result<(), KexError> {
        let mut reader = packet.reader();

        let host_key_blob = reader.read_string()?;
        let f = reader.read_mpint()?;
        let signature = reader.read_string()?;
        expect_end(reader)?;

        let algorithm = session
            .host_key_algorithm
            .ok_or(KexError::MissingContext("host key algorithm"))?;

        let host_key = (public_key::system(algorithm).decode_public)(&host_key_blob)
            .map_err(|err| {
                error!(
                    "Could not decode server host key {}: {}",
                    host_key_blob.to_hex(),
                    err
                );
                KexError::Trust("undecodable host key")
            })?;

        self.transcript.write_mpint(&f)?;

        let shared_secret = {
            let group = self.group.as_ref().ok_or(KexError::MissingContext("group"))?;
            let key = self.key.as_ref().ok_or(KexError::MissingContext("key pair"))?;
            key.compute_shared_secret(group, &f)?
        };

        let exchange_hash = self.exchange_hash(session, &host_key_blob, &shared_secret)?;

        match host_key.verify(&exchange_hash, &signature)
        {
            Ok(true) => (),
            Ok(false) => {
                return Err(KexError::Trust("exchange hash signature mismatch"))
            }
            Err(()) => return Err(KexError::Trust("malformed signature")),
        }

        info!("{} complete, exchange hash {}", self.algorithm, exchange_hash.to_hex());

        session.commit(KexOutput {
            exchange_hash: exchange_hash,
            shared_secret: shared_secret,
            host_key: host_key_blob,
        });

        Ok(())
    }

    /// H = HASH(V_C || V_S || I_C || I_S || K_S || transcript || K)
    fn exchange_hash(&self, session: &Session, host_key: &[u8], shared_secret: &SharedSecret)
        -> Result<Vec<u8>, KexError> {
        use error::KexError::MissingContext;

        let client_version = session
            .client_version
            .as_ref()
            .ok_or(MissingContext("client version"))?;
        let server_version = session
            .server_version
            .as_ref()
            .ok_or(MissingContext("server version"))?;
        let client_kexinit = session
            .client_kexinit
            .as_ref()
            .ok_or(MissingContext("client KEXINIT"))?;
        let server_kexinit = session
            .server_kexinit
            .as_ref()
            .ok_or(MissingContext("server KEXINIT"))?;

        let mut data = Vec::new();
        data.write_string(client_version)?;
        data.write_string(server_version)?;
        data.write_bytes(client_kexinit)?;
        data.write_bytes(server_kexinit)?;
        data.write_bytes(host_key)?;
        data.write_raw_bytes(&self.transcript)?;
        data.write_raw_bytes(shared_secret)?;

        Ok(self.hash.hash(&[data.as_slice()]))
    }

    /// Drop all handshake material, whichever way the exchange ended
    fn finish(&mut self, state: State) {
        self.state = state;
        self.transcript.clear();
        self.group = None;
        self.key = None;
    }
}

impl KeyExchange for DhGroupExchange {
    fn algorithm(&self) -> KeyExchangeAlgorithm {
        self.algorithm
    }

    fn initiate(&mut self, session: &Session) -> Result<Packet, KexError> {
        if session.role() != Role::Client {
            return Err(KexError::RoleViolation {
                role: session.role(),
                msg: DH_GEX_REQUEST,
            });
        }

        if self.state != State::Idle {
            return Err(KexError::OutOfSequence(DH_GEX_REQUEST));
        }

        let mut request = Vec::new();
        request.write_uint32(self.request.min)?;
        request.write_uint32(self.request.n)?;
        request.write_uint32(self.request.max)?;

        let mut packet = Packet::new(MessageType::KeyExchange(DH_GEX_REQUEST));
        packet.write_raw_bytes(&request)?;

        debug!(
            "Requesting group: min {}, n {}, max {}",
            self.request.min,
            self.request.n,
            self.request.max
        );

        self.transcript = request;
        self.state = State::SentRequest;

        Ok(packet)
    }

    fn process(&mut self, session: &mut Session, packet: &Packet) -> KexResult {
        trace!("{} in state {:?}: {:?}", self.algorithm, self.state, packet);

        match self.transition(session, packet)
        {
            Ok(Step::Continue(response)) => KexResult::Ok(response),
            Ok(Step::Finish(response)) => {
                self.finish(State::Done);
                KexResult::Done(response)
            }
            Err(err) => {
                error!("{} failed: {}", self.algorithm, err);
                self.finish(State::Failed);
                KexResult::Error(err)
            }
        }
    }
}

fn expect_end(reader: &[u8]) -> Result<(), KexError> {
    if reader.is_empty() {
        Ok(())
    }
    else {
        Err(KexError::Decode(io::Error::new(InvalidData, "trailing data")))
    }
}
