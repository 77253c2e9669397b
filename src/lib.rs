extern crate byteorder;
extern crate crypto;
#[macro_use]
extern crate log;
extern crate num_bigint;
extern crate num_traits;
extern crate rand;
extern crate rustc_serialize;
extern crate zeroize;

pub mod algorithm;
pub mod client;
pub mod connection;
pub mod error;
pub mod hash;
pub mod key_exchange;
pub mod message;
pub mod packet;
pub mod public_key;
pub mod server;
pub mod session;

pub use self::client::ClientConfig;
pub use self::server::{Server, ServerConfig};
pub use self::session::{Role, Session};
