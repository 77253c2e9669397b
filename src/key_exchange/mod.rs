use std::sync::Arc;

use algorithm::{self, KeyExchangeAlgorithm};
use error::KexError;
use hash::HashAlgorithm;
use packet::Packet;
use session::Session;

mod dh;
mod dh_group_exchange;
pub mod group;

pub use self::dh::{DhKeyPair, SharedSecret};
pub use self::dh_group_exchange::DhGroupExchange;
pub use self::group::{Group, GroupPolicy, GroupProvider, GroupRequest};

pub enum KexResult {
    /// Send this packet and keep feeding the exchange
    Ok(Packet),
    /// The exchange completed and the session holds its results. The packet,
    /// if any, still has to be sent to the peer.
    Done(Option<Packet>),
    Error(KexError),
}

pub trait KeyExchange: Send {
    fn algorithm(&self) -> KeyExchangeAlgorithm;

    /// Registered wire name of the algorithm
    fn name(&self) -> String {
        self.algorithm().to_string()
    }

    /// Produce the first message of the exchange. Only clients send one.
    fn initiate(&mut self, session: &Session) -> Result<Packet, KexError>;

    fn process(&mut self, session: &mut Session, packet: &Packet) -> KexResult;
}

/// Settings every key exchange instance is created with
#[derive(Clone)]
pub struct KexConfig {
    /// Where a server gets its groups from
    pub groups: Arc<dyn GroupProvider>,
    /// What a client asks for
    pub request: GroupRequest,
}

impl KexConfig {
    pub fn new(policy: GroupPolicy) -> KexConfig {
        KexConfig {
            groups: policy.provider(),
            request: GroupRequest::default(),
        }
    }
}

impl Default for KexConfig {
    fn default() -> KexConfig {
        KexConfig::new(GroupPolicy::default())
    }
}

/// Registry of key exchange algorithms by name.
///
/// Handing out an instance never shares state with an earlier one, so a
/// single factory can serve any number of connections.
pub struct KeyExchangeFactory {
    config: KexConfig,
    prototypes: Vec<(KeyExchangeAlgorithm, &'static HashAlgorithm)>,
}

impl KeyExchangeFactory {
    /// An empty factory
    pub fn new(config: KexConfig) -> KeyExchangeFactory {
        KeyExchangeFactory {
            config: config,
            prototypes: Vec::new(),
        }
    }

    /// A factory offering every implemented key exchange algorithm
    pub fn with_defaults(config: KexConfig) -> KeyExchangeFactory {
        let mut factory = KeyExchangeFactory::new(config);
        for &algorithm in algorithm::KEY_EXCHANGE {
            factory.register(algorithm, algorithm.hash());
        }
        factory
    }

    /// Register `algorithm`, replacing an earlier registration of the same
    /// name. Registration order is preference order.
    pub fn register(&mut self, algorithm: KeyExchangeAlgorithm, hash: &'static HashAlgorithm) {
        if let Some(entry) = self.prototypes.iter_mut().find(|e| e.0 == algorithm) {
            entry.1 = hash;
            return;
        }
        self.prototypes.push((algorithm, hash));
    }

    pub fn algorithms(&self) -> Vec<KeyExchangeAlgorithm> {
        self.prototypes.iter().map(|&(algorithm, _)| algorithm).collect()
    }

    pub fn config(&self) -> &KexConfig {
        &self.config
    }

    /// A fresh, independent key exchange for `algorithm`
    pub fn instance(&self, algorithm: KeyExchangeAlgorithm) -> Option<Box<dyn KeyExchange>> {
        self.prototypes
            .iter()
            .find(|&&(registered, _)| registered == algorithm)
            .map(|&(algorithm, hash)| {
                Box::new(DhGroupExchange::new(
                    algorithm,
                    hash,
                    self.config.groups.clone(),
                    self.config.request,
                )) as Box<dyn KeyExchange>
            })
    }
}
