use std::sync::Arc;

use rustc_serialize::hex::ToHex;
use zeroize::Zeroizing;

use algorithm::PublicKeyAlgorithm;
use public_key::KeyPair;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    Client,
    Server,
}

/// Everything a finished key exchange writes into the session.
pub struct KexOutput {
    pub exchange_hash: Vec<u8>,
    /// The shared secret K, encoded as an mpint
    pub shared_secret: Zeroizing<Vec<u8>>,
    /// The server host key blob K_S the exchange hash was computed over
    pub host_key: Vec<u8>,
}

/// Per connection state shared by consecutive key exchanges.
///
/// The version strings and KEXINIT payloads are transcript anchors filled
/// in by the transport before a key exchange runs. The exchange hash,
/// shared secret and session id are only ever written by `commit`.
pub struct Session {
    role: Role,
    pub client_version: Option<String>,
    pub server_version: Option<String>,
    pub client_kexinit: Option<Vec<u8>>,
    pub server_kexinit: Option<Vec<u8>>,
    pub host_key_algorithm: Option<PublicKeyAlgorithm>,
    host_key: Option<Arc<dyn KeyPair>>,
    peer_host_key: Option<Vec<u8>>,
    exchange_hash: Option<Vec<u8>>,
    shared_secret: Option<Zeroizing<Vec<u8>>>,
    session_id: Option<Vec<u8>>,
}

impl Session {
    pub fn new(role: Role) -> Session {
        Session {
            role: role,
            client_version: None,
            server_version: None,
            client_kexinit: None,
            server_kexinit: None,
            host_key_algorithm: None,
            host_key: None,
            peer_host_key: None,
            exchange_hash: None,
            shared_secret: None,
            session_id: None,
        }
    }

    /// A server session signing with `key`
    pub fn server(key: Arc<dyn KeyPair>) -> Session {
        let mut session = Session::new(Role::Server);
        session.host_key = Some(key);
        session
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Our own host key, servers only
    pub fn host_key(&self) -> Option<&dyn KeyPair> {
        self.host_key.as_ref().map(|key| &**key)
    }

    /// The server host key blob accepted by the last key exchange
    pub fn peer_host_key(&self) -> Option<&[u8]> {
        self.peer_host_key.as_ref().map(|key| key.as_slice())
    }

    pub fn exchange_hash(&self) -> Option<&[u8]> {
        self.exchange_hash.as_ref().map(|hash| hash.as_slice())
    }

    pub fn shared_secret(&self) -> Option<&[u8]> {
        self.shared_secret.as_ref().map(|secret| secret.as_slice())
    }

    pub fn session_id(&self) -> Option<&[u8]> {
        self.session_id.as_ref().map(|id| id.as_slice())
    }

    /// Store the result of a completed key exchange. The session id is set
    /// by the first exchange on a connection and kept for its lifetime.
    pub fn commit(&mut self, output: KexOutput) {
        if self.session_id.is_none() {
            debug!("Session id {}", output.exchange_hash.to_hex());
            self.session_id = Some(output.exchange_hash.clone());
        }

        self.exchange_hash = Some(output.exchange_hash);
        self.shared_secret = Some(output.shared_secret);
        self.peer_host_key = Some(output.host_key);
    }
}
