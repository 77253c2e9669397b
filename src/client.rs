use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;

use connection::{Connection, ConnectionType};
use error::ConnectionResult;
use key_exchange::{GroupRequest, KexConfig, KeyExchangeFactory};
use session::Session;

#[derive(Clone, Copy, Default, Debug)]
pub struct ClientConfig {
    /// Group sizes asked for in the group exchange request
    pub group_request: GroupRequest,
}

/// Connect to `addr` and run the key exchange
pub fn connect<A: ToSocketAddrs>(addr: A, config: ClientConfig) -> ConnectionResult<Session> {
    let mut stream = TcpStream::connect(addr)?;
    handshake(&mut stream, config)
}

/// Run the client side of the key exchange on an established stream
pub fn handshake<S: Read + Write>(stream: &mut S, config: ClientConfig)
    -> ConnectionResult<Session> {
    let kex_config = KexConfig {
        request: config.group_request,
        ..KexConfig::default()
    };

    let mut connection = Connection::new(
        ConnectionType::Client(Arc::new(config)),
        Arc::new(KeyExchangeFactory::with_defaults(kex_config)),
    );

    connection.run(stream)?;

    Ok(connection.into_session())
}
