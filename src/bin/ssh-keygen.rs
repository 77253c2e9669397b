extern crate ssh;

use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::process;

use ssh::public_key;

pub fn main() {
    let path = env::args().nth(1).unwrap_or_else(|| String::from("server.key"));

    let keypair = (public_key::ED25519.generate_key_pair)(None);

    let result = File::create(&path).and_then(|mut file| keypair.export(&mut file));

    if let Err(err) = result {
        let _ = writeln!(io::stderr(), "ssh-keygen: failed to write {}: {}", path, err);
        process::exit(1);
    }
}
