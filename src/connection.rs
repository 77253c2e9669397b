use std::io::{self, Read, Write};
use std::sync::Arc;

use algorithm::negotiate;
use client::ClientConfig;
use error::{ConnectionError, ConnectionResult as Result};
use key_exchange::{KexResult, KeyExchange, KeyExchangeFactory};
use message::MessageType;
use message::kex::KeyExchangeInit;
use packet::Packet;
use server::ServerConfig;
use session::{Role, Session};

/// Longest identification line we accept, including CR LF
const MAX_ID_LEN: usize = 255;
/// Lines a server may send before its identification string
const MAX_BANNER_LINES: usize = 32;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ConnectionState {
    Initial,
    KeyExchange,
    /// The key exchange finished. Sending and awaiting NEWKEYS is left to
    /// whoever owns the connection next.
    KeysExchanged,
}

#[derive(Clone)]
pub enum ConnectionType {
    Server(Arc<ServerConfig>),
    Client(Arc<ClientConfig>),
}

/// Drives the initial key exchange of one connection over a blocking stream.
pub struct Connection {
    pub conn_type: ConnectionType,
    factory: Arc<KeyExchangeFactory>,
    session: Session,
    state: ConnectionState,
    seq: (u32, u32),
}

impl Connection {
    pub fn new(conn_type: ConnectionType, factory: Arc<KeyExchangeFactory>) -> Connection {
        let session = match conn_type
        {
            ConnectionType::Server(ref config) => Session::server(config.key.clone()),
            ConnectionType::Client(_) => Session::new(Role::Client),
        };

        Connection {
            conn_type: conn_type,
            factory: factory,
            session: session,
            state: ConnectionState::Initial,
            seq: (0, 0),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    fn role(&self) -> Role {
        self.session.role()
    }

    pub fn run<S: Read + Write>(&mut self, stream: &mut S) -> Result<()> {
        self.send_id(stream)?;
        self.read_id(stream)?;

        let mut kex = self.kex_init(stream)?;

        if self.role() == Role::Client {
            let packet = kex.initiate(&self.session)?;
            self.send(stream, &packet)?;
        }

        loop {
            let packet = self.recv(stream)?;

            match packet.msg_type()
            {
                MessageType::Ignore | MessageType::Debug => {
                    trace!("Ignoring {:?}", packet);
                    continue;
                }
                MessageType::KeyExchange(_) => (),
                MessageType::Disconnect => {
                    warn!("Peer disconnected during key exchange");
                    return Err(ConnectionError::ProtocolError);
                }
                _ => {
                    error!("Unexpected packet during key exchange: {:?}", packet);
                    return Err(ConnectionError::ProtocolError);
                }
            }

            match kex.process(&mut self.session, &packet)
            {
                KexResult::Ok(packet) => self.send(stream, &packet)?,
                KexResult::Done(packet) => {
                    if let Some(packet) = packet {
                        self.send(stream, &packet)?;
                    }
                    self.state = ConnectionState::KeysExchanged;
                    return Ok(());
                }
                KexResult::Error(err) => return Err(err.into()),
            }
        }
    }

    /// Exchange KEXINIT messages and set up the negotiated key exchange
    fn kex_init<S: Read + Write>(&mut self, stream: &mut S) -> Result<Box<dyn KeyExchange>> {
        let local = KeyExchangeInit::local(&self.factory.algorithms());
        let packet = local.to_packet()?;
        self.send(stream, &packet)?;
        self.state = ConnectionState::KeyExchange;

        let peer_packet = loop {
            let packet = self.recv(stream)?;
            match packet.msg_type()
            {
                MessageType::KexInit => break packet,
                MessageType::Ignore | MessageType::Debug => continue,
                _ => {
                    error!("Expected KEXINIT, got {:?}", packet);
                    return Err(ConnectionError::ProtocolError);
                }
            }
        };

        let peer = KeyExchangeInit::read(&peer_packet)?;

        let (client, server) = match self.role()
        {
            Role::Client => {
                self.session.client_kexinit = Some(packet.into_payload());
                self.session.server_kexinit = Some(peer_packet.into_payload());
                (&local, &peer)
            }
            Role::Server => {
                self.session.client_kexinit = Some(peer_packet.into_payload());
                self.session.server_kexinit = Some(packet.into_payload());
                (&peer, &local)
            }
        };

        let kex_algorithm = negotiate(&server.kex_algorithms, &client.kex_algorithms)?;
        let host_key_algorithm = negotiate(
            &server.server_host_key_algorithms,
            &client.server_host_key_algorithms,
        )?;

        debug!("Negotiated Kex Algorithm: {}", kex_algorithm);
        debug!("Negotiated Host Key Algorithm: {}", host_key_algorithm);

        if peer.first_kex_packet_follows {
            warn!("Peer guessed a key exchange packet, handling it in order");
        }

        self.session.host_key_algorithm = Some(host_key_algorithm);

        self.factory
            .instance(kex_algorithm)
            .ok_or(ConnectionError::NegotiationError)
    }

    fn recv(&mut self, mut stream: &mut dyn Read) -> Result<Packet> {
        let packet = Packet::read_from(&mut stream)?;

        debug!("Packet {} received: {:?}", self.seq.0, packet);
        self.seq.0 = self.seq.0.wrapping_add(1);

        Ok(packet)
    }

    fn send(&mut self, mut stream: &mut dyn Write, packet: &Packet) -> io::Result<()> {
        debug!("Sending packet {}: {:?}", self.seq.1, packet);

        packet.write_to(&mut stream)?;
        self.seq.1 = self.seq.1.wrapping_add(1);

        Ok(())
    }

    fn send_id(&mut self, stream: &mut dyn Write) -> io::Result<()> {
        let id = format!("SSH-2.0-GexSSH_{}", env!("CARGO_PKG_VERSION"));
        info!("Identifying as {:?}", id);

        stream.write_all(id.as_bytes())?;
        stream.write_all(b"\r\n")?;
        stream.flush()?;

        match self.role()
        {
            Role::Client => self.session.client_version = Some(id),
            Role::Server => self.session.server_version = Some(id),
        }

        Ok(())
    }

    fn read_id(&mut self, stream: &mut dyn Read) -> io::Result<()> {
        for _ in 0..MAX_BANNER_LINES {
            let line = read_line(stream)?;

            if line.starts_with("SSH-2.0-") || line.starts_with("SSH-1.99-") {
                info!("Peer identifies as {:?}", line);

                match self.role()
                {
                    Role::Client => self.session.server_version = Some(line),
                    Role::Server => self.session.client_version = Some(line),
                }

                return Ok(());
            }

            // Only servers may greet with other lines first
            if self.role() == Role::Server || line.starts_with("SSH-") {
                break;
            }

            debug!("Skipping banner line {:?}", line);
        }

        Err(io::Error::new(io::ErrorKind::InvalidData, "invalid id"))
    }
}

/// Read a single CR LF (or LF) terminated line without consuming anything
/// past it, since the binary packets start right after.
fn read_line(stream: &mut dyn Read) -> io::Result<String> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        stream.read_exact(&mut byte)?;

        if byte[0] == b'\n' {
            break;
        }

        if line.len() >= MAX_ID_LEN {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "id too long"));
        }

        line.push(byte[0]);
    }

    if line.last() == Some(&b'\r') {
        line.pop();
    }

    String::from_utf8(line).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid id"))
}
