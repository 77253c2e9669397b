use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use connection::{Connection, ConnectionType};
use error::ConnectionResult;
use key_exchange::{GroupPolicy, KexConfig, KeyExchangeFactory};
use public_key::KeyPair;
use session::Session;

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub key: Arc<dyn KeyPair>,
    pub groups: GroupPolicy,
    /// How long to wait for the peer before giving up on a connection
    pub timeout: Option<Duration>,
}

pub struct Server {
    config: Arc<ServerConfig>,
    factory: Arc<KeyExchangeFactory>,
}

impl Server {
    pub fn with_config(config: ServerConfig) -> Server {
        let factory = KeyExchangeFactory::with_defaults(KexConfig::new(config.groups));

        Server {
            config: Arc::new(config),
            factory: Arc::new(factory),
        }
    }

    /// Run the key exchange of a single connection on `stream`
    pub fn accept<S: Read + Write>(&self, stream: &mut S) -> ConnectionResult<Session> {
        let mut connection = Connection::new(
            ConnectionType::Server(self.config.clone()),
            self.factory.clone(),
        );

        connection.run(stream)?;

        Ok(connection.into_session())
    }

    /// Bind to the configured address and serve forever
    pub fn run(&self) -> ConnectionResult<()> {
        let listener = TcpListener::bind((&*self.config.host, self.config.port))?;

        info!("Listening on {}:{}", self.config.host, self.config.port);

        self.serve(listener)
    }

    /// Accept connections, each on its own thread so that a slow group
    /// generation only ever delays the connection that asked for it.
    pub fn serve(&self, listener: TcpListener) -> ConnectionResult<()> {
        for stream in listener.incoming() {
            let mut stream = match stream
            {
                Ok(stream) => stream,
                Err(err) => {
                    warn!("Failed to establish incoming connection: {}", err);
                    continue;
                }
            };

            let addr = match stream.peer_addr()
            {
                Ok(addr) => addr,
                Err(err) => {
                    warn!("Dropping connection without peer address: {}", err);
                    continue;
                }
            };
            info!("Incoming connection from {}", addr);

            if let Err(err) = stream.set_read_timeout(self.config.timeout) {
                warn!("Dropping connection from {}: {}", addr, err);
                continue;
            }

            let server = Server {
                config: self.config.clone(),
                factory: self.factory.clone(),
            };

            thread::spawn(move || match server.accept(&mut stream)
            {
                Ok(_) => info!("Key exchange with {} complete", addr),
                Err(err) => error!("Connection with {} failed: {}", addr, err),
            });
        }

        Ok(())
    }
}
