extern crate env_logger;
extern crate log;
extern crate ssh;

use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use log::LevelFilter;
use ssh::{Server, ServerConfig};
use ssh::key_exchange::GroupPolicy;
use ssh::public_key::{self, KeyPair};

fn usage() -> ! {
    let _ = writeln!(
        io::stderr(),
        "usage: sshd [-v]... [-p port] [-k key_file] [--test-group]"
    );
    process::exit(1);
}

/// Map the number of `-v` flags to a level
fn log_level(count: usize) -> LevelFilter {
    match count
    {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Load the host key, or generate and store a new one if there is none
fn host_key(path: &str) -> io::Result<Arc<dyn KeyPair>> {
    match File::open(path)
    {
        Ok(mut file) => {
            let key = (public_key::ED25519.import)(&mut file)?;
            Ok(Arc::from(key))
        }
        Err(ref err) if err.kind() == io::ErrorKind::NotFound => {
            let key = (public_key::ED25519.generate_key_pair)(None);
            let mut file = File::create(path)?;
            key.export(&mut file)?;
            Ok(Arc::from(key))
        }
        Err(err) => Err(err),
    }
}

pub fn main() {
    let mut verbosity = 0;
    let mut port: u16 = 22222;
    let mut key_file = String::from("server.key");
    let mut groups = GroupPolicy::default();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_ref()
        {
            "-v" => verbosity += 1,
            "-p" => {
                port = args.next().and_then(|p| p.parse().ok()).unwrap_or_else(
                    || usage(),
                )
            }
            "-k" => key_file = args.next().unwrap_or_else(|| usage()),
            "--test-group" => groups = GroupPolicy::Fixed,
            _ => usage(),
        }
    }

    env_logger::Builder::new()
        .filter_level(log_level(verbosity))
        .init();

    let key = match host_key(&key_file)
    {
        Ok(key) => key,
        Err(err) => {
            let _ = writeln!(io::stderr(), "sshd: failed to load {}: {}", key_file, err);
            process::exit(1);
        }
    };

    let config = ServerConfig {
        host: String::from("0.0.0.0"),
        port: port,
        key: key,
        groups: groups,
        timeout: Some(Duration::from_secs(120)),
    };

    let server = Server::with_config(config);

    if let Err(err) = server.run() {
        let _ = writeln!(io::stderr(), "sshd: {}", err);
        process::exit(1);
    }
}
