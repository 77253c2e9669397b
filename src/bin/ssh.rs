extern crate env_logger;
extern crate log;
extern crate rustc_serialize;
extern crate ssh;

use std::env;
use std::io::{self, Write};
use std::process;

use log::LevelFilter;
use rustc_serialize::hex::ToHex;
use ssh::ClientConfig;
use ssh::client;

fn usage() -> ! {
    let _ = writeln!(io::stderr(), "usage: ssh [-v]... [-p port] host");
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

pub fn main() {
    let mut verbosity = 0;
    let mut port: u16 = 22;
    let mut host = None;

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
            _ if host.is_none() && !arg.starts_with('-') => host = Some(arg.clone()),
            _ => usage(),
        }
    }

    let host = host.unwrap_or_else(|| usage());

    env_logger::Builder::new()
        .filter_level(log_level(verbosity))
        .init();

    match client::connect((&*host, port), ClientConfig::default())
    {
        Ok(session) => {
            if let Some(key) = session.peer_host_key() {
                println!("Host key: {}", key.to_hex());
            }
            if let Some(id) = session.session_id() {
                println!("Session id: {}", id.to_hex());
            }
        }
        Err(err) => {
            let _ = writeln!(io::stderr(), "ssh: {}", err);
            process::exit(1);
        }
    }
}
