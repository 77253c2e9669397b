use std::io::Result;

use rand::{self, RngCore};

use algorithm::{self, KeyExchangeAlgorithm, PublicKeyAlgorithm};
use message::MessageType;
use packet::{Packet, ReadPacketExt, WritePacketExt};

/// SSH_MSG_KEXINIT body, RFC 4253 section 7.1
#[derive(Debug, Clone)]
pub struct KeyExchangeInit {
    pub cookie: Vec<u8>,
    pub kex_algorithms: Vec<KeyExchangeAlgorithm>,
    pub server_host_key_algorithms: Vec<PublicKeyAlgorithm>,
    pub encryption_algorithms_client_to_server: Vec<String>,
    pub encryption_algorithms_server_to_client: Vec<String>,
    pub mac_algorithms_client_to_server: Vec<String>,
    pub mac_algorithms_server_to_client: Vec<String>,
    pub compression_algorithms_client_to_server: Vec<String>,
    pub compression_algorithms_server_to_client: Vec<String>,
    pub languages_client_to_server: Vec<String>,
    pub languages_server_to_client: Vec<String>,
    pub first_kex_packet_follows: bool,
}

impl KeyExchangeInit {
    /// Our own proposal with a fresh random cookie
    pub fn local(kex_algorithms: &[KeyExchangeAlgorithm]) -> KeyExchangeInit {
        let mut cookie = vec![0; 16];
        rand::thread_rng().fill_bytes(&mut cookie);

        KeyExchangeInit {
            cookie: cookie,
            kex_algorithms: kex_algorithms.to_vec(),
            server_host_key_algorithms: algorithm::HOST_KEY.to_vec(),
            encryption_algorithms_client_to_server: names(algorithm::ENCRYPTION),
            encryption_algorithms_server_to_client: names(algorithm::ENCRYPTION),
            mac_algorithms_client_to_server: names(algorithm::MAC),
            mac_algorithms_server_to_client: names(algorithm::MAC),
            compression_algorithms_client_to_server: names(algorithm::COMPRESSION),
            compression_algorithms_server_to_client: names(algorithm::COMPRESSION),
            languages_client_to_server: Vec::new(),
            languages_server_to_client: Vec::new(),
            first_kex_packet_follows: false,
        }
    }

    pub fn read(packet: &Packet) -> Result<KeyExchangeInit> {
        let mut reader = packet.reader();

        Ok(KeyExchangeInit {
            cookie: reader.read_bytes(16)?,
            kex_algorithms: reader.read_enum_list()?,
            server_host_key_algorithms: reader.read_enum_list()?,
            encryption_algorithms_client_to_server: reader.read_name_list()?,
            encryption_algorithms_server_to_client: reader.read_name_list()?,
            mac_algorithms_client_to_server: reader.read_name_list()?,
            mac_algorithms_server_to_client: reader.read_name_list()?,
            compression_algorithms_client_to_server: reader.read_name_list()?,
            compression_algorithms_server_to_client: reader.read_name_list()?,
            languages_client_to_server: reader.read_name_list()?,
            languages_server_to_client: reader.read_name_list()?,
            first_kex_packet_follows: {
                let follows = reader.read_bool()?;
                let _reserved = reader.read_uint32()?;
                follows
            },
        })
    }

    pub fn to_packet(&self) -> Result<Packet> {
        let mut packet = Packet::new(MessageType::KexInit);
        packet.write_raw_bytes(self.cookie.as_slice())?;
        packet.write_list(self.kex_algorithms.as_slice())?;
        packet.write_list(self.server_host_key_algorithms.as_slice())?;
        packet.write_list(self.encryption_algorithms_client_to_server.as_slice())?;
        packet.write_list(self.encryption_algorithms_server_to_client.as_slice())?;
        packet.write_list(self.mac_algorithms_client_to_server.as_slice())?;
        packet.write_list(self.mac_algorithms_server_to_client.as_slice())?;
        packet.write_list(self.compression_algorithms_client_to_server.as_slice())?;
        packet.write_list(self.compression_algorithms_server_to_client.as_slice())?;
        packet.write_list(self.languages_client_to_server.as_slice())?;
        packet.write_list(self.languages_server_to_client.as_slice())?;
        packet.write_bool(self.first_kex_packet_follows)?;
        packet.write_uint32(0)?;
        Ok(packet)
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
