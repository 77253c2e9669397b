extern crate num_bigint;
extern crate rand;
extern crate ssh;

use std::io::ErrorKind;

use num_bigint::{BigUint, RandBigInt};
use rand::Rng;
use ssh::algorithm::{KeyExchangeAlgorithm, PublicKeyAlgorithm, KEY_EXCHANGE};
use ssh::message::MessageType;
use ssh::message::kex::KeyExchangeInit;
use ssh::packet::{self, Packet, ReadPacketExt, WritePacketExt, MAX_PACKET_LEN};

fn mpint(value: &BigUint) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_mpint(value).unwrap();
    buf
}

#[test]
fn test_mpint_encoding() {
    // Examples from RFC 4251 section 5
    assert_eq!(mpint(&BigUint::from(0u32)), [0u8, 0, 0, 0]);
    assert_eq!(
        mpint(&BigUint::from(0x9a378f9b2e332a7u64)),
        [0u8, 0, 0, 8, 0x09, 0xa3, 0x78, 0xf9, 0xb2, 0xe3, 0x32, 0xa7]
    );
    assert_eq!(mpint(&BigUint::from(0x80u32)), [0u8, 0, 0, 2, 0x00, 0x80]);
    assert_eq!(mpint(&BigUint::from(0x7fu32)), [0u8, 0, 0, 1, 0x7f]);

    assert_eq!(packet::mpint_bytes(&BigUint::from(0x80u32)), mpint(&BigUint::from(0x80u32)));
}

#[test]
fn test_random_values_survive_the_wire() {
    let mut rng = rand::thread_rng();

    for _ in 0..200 {
        let number: u32 = rng.gen();

        let bits = rng.gen_range(0..=8192u64);
        let mut value = rng.gen_biguint(bits);
        if bits > 0 && rng.gen_bool(0.5) {
            value = value | (BigUint::from(1u32) << (bits - 1));
        }

        let mut bytes = vec![0u8; rng.gen_range(0..512)];
        rng.fill(&mut bytes[..]);

        let mut buf = Vec::new();
        buf.write_uint32(number).unwrap();
        buf.write_mpint(&value).unwrap();
        buf.write_bytes(&bytes).unwrap();

        let mut reader = &buf[..];
        assert_eq!(reader.read_uint32().unwrap(), number);
        assert_eq!(reader.read_mpint().unwrap(), value);
        assert_eq!(reader.read_string().unwrap(), bytes);
        assert!(reader.is_empty());

        // Minimal two's complement: a zero byte only ahead of a set high bit
        let encoded = mpint(&value);
        if encoded.len() > 4 {
            match encoded[4]
            {
                0 => assert!(encoded[5] & 0x80 != 0),
                first => assert!(first & 0x80 == 0),
            }
        }
    }
}

#[test]
fn test_mpint_decoding() {
    let mut reader: &[u8] = &[0, 0, 0, 2, 0x00, 0x80, 0, 0, 0, 0];
    assert_eq!(reader.read_mpint().unwrap(), BigUint::from(0x80u32));
    assert_eq!(reader.read_mpint().unwrap(), BigUint::from(0u32));
    assert!(reader.is_empty());

    // -0x80
    let mut reader: &[u8] = &[0, 0, 0, 1, 0x80];
    assert_eq!(reader.read_mpint().unwrap_err().kind(), ErrorKind::InvalidData);

    let value = BigUint::parse_bytes(b"e31dfe85599bcb5c2bbecf201f5f49f1", 16).unwrap();
    let encoded = mpint(&value);
    assert_eq!(encoded[4], 0x00);
    assert_eq!((&encoded[..]).read_mpint().unwrap(), value);
}

#[test]
fn test_truncated_fields() {
    let mut buf = Vec::new();
    buf.write_bytes(b"0123456789").unwrap();
    buf.write_uint32(7).unwrap();

    for len in 0..buf.len() {
        let mut reader = &buf[..len];
        let result = reader.read_string().and_then(|_| reader.read_uint32());
        assert_eq!(result.unwrap_err().kind(), ErrorKind::UnexpectedEof, "len {}", len);
    }

    let mut reader = &buf[..];
    assert_eq!(reader.read_string().unwrap(), b"0123456789");
    assert_eq!(reader.read_uint32().unwrap(), 7);
}

#[test]
fn test_name_lists() {
    let mut buf = Vec::new();
    buf.write_list(KEY_EXCHANGE).unwrap();
    buf.write_string("curve25519-sha256,diffie-hellman-group-exchange-sha1")
        .unwrap();
    buf.write_string("").unwrap();

    let mut reader = &buf[..];
    assert_eq!(
        reader.read_utf8().unwrap(),
        "diffie-hellman-group-exchange-sha256,diffie-hellman-group-exchange-sha1"
    );
    assert_eq!(
        reader.read_enum_list::<KeyExchangeAlgorithm>().unwrap(),
        vec![KeyExchangeAlgorithm::DH_GROUP_EXCHANGE_SHA1]
    );
    assert!(reader.read_name_list().unwrap().is_empty());
}

#[test]
fn test_message_types() {
    assert_eq!(MessageType::from(20u8), MessageType::KexInit);
    assert_eq!(MessageType::from(34u8), MessageType::KeyExchange(34));
    assert_eq!(MessageType::from(94u8), MessageType::Other(94));
    assert_eq!(MessageType::from(0u8), MessageType::Unknown);

    let code: u8 = MessageType::KeyExchange(31).into();
    assert_eq!(code, 31);

    let packet = Packet::new(MessageType::KeyExchange(33));
    assert_eq!(packet.code(), 33);
    assert!(packet.reader().is_empty());

    let empty = Packet::from_payload(Vec::new());
    assert_eq!(empty.msg_type(), MessageType::Unknown);
}

#[test]
fn test_packet_framing() {
    for len in 0..40 {
        let mut packet = Packet::new(MessageType::Ignore);
        packet.write_raw_bytes(&vec![0xaa; len]).unwrap();

        let mut buf = Vec::new();
        packet.write_to(&mut buf).unwrap();

        assert_eq!(buf.len() % 8, 0);
        assert!(buf[4] >= 4);

        let read = Packet::read_from(&mut &buf[..]).unwrap();
        assert_eq!(read, packet);
    }
}

#[test]
fn test_packet_framing_rejects_bad_lengths() {
    // Oversized
    let mut buf = Vec::new();
    buf.write_uint32(MAX_PACKET_LEN as u32 + 1).unwrap();
    buf.push(4);
    assert!(Packet::read_from(&mut &buf[..]).is_err());

    // Padding longer than the packet
    let mut buf = Vec::new();
    buf.write_uint32(8).unwrap();
    buf.push(12);
    buf.extend_from_slice(&[0; 12]);
    assert!(Packet::read_from(&mut &buf[..]).is_err());

    // Truncated payload
    let mut packet = Packet::new(MessageType::Ignore);
    packet.write_bytes(b"data").unwrap();
    let mut buf = Vec::new();
    packet.write_to(&mut buf).unwrap();
    buf.truncate(buf.len() - 1);
    assert!(Packet::read_from(&mut &buf[..]).is_err());
}

#[test]
fn test_kexinit() {
    let local = KeyExchangeInit::local(KEY_EXCHANGE);
    let packet = local.to_packet().unwrap();
    assert_eq!(packet.msg_type(), MessageType::KexInit);

    let read = KeyExchangeInit::read(&packet).unwrap();
    assert_eq!(read.cookie, local.cookie);
    assert_eq!(read.kex_algorithms, KEY_EXCHANGE);
    assert_eq!(read.server_host_key_algorithms, vec![PublicKeyAlgorithm::SSH_ED25519]);
    assert_eq!(read.mac_algorithms_server_to_client, local.mac_algorithms_server_to_client);
    assert!(!read.first_kex_packet_follows);

    // Two local proposals differ in their cookie
    assert!(KeyExchangeInit::local(KEY_EXCHANGE).cookie != local.cookie);
}
