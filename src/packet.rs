use std::fmt;
use std::io::{self, Read, Result, Write};
use std::io::ErrorKind::{InvalidData, UnexpectedEof};
use std::str::FromStr;
use std::string::ToString;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use message::MessageType;

/// Upper bound for a whole binary packet, see RFC 4253 section 6.1
pub const MAX_PACKET_LEN: usize = 35000;

#[derive(Clone, PartialEq)]
pub struct Packet {
    payload: Vec<u8>,
}

impl Packet {
    pub fn new(msg_type: MessageType) -> Packet {
        Packet { payload: (&[msg_type.into()]).to_vec() }
    }

    /// Wrap a payload as received from the transport. The first byte is the
    /// message code.
    pub fn from_payload(payload: Vec<u8>) -> Packet {
        Packet { payload: payload }
    }

    pub fn msg_type(&self) -> MessageType {
        self.code().into()
    }

    pub fn code(&self) -> u8 {
        self.payload.first().cloned().unwrap_or(255)
    }

    pub fn payload(&self) -> &[u8] {
        self.payload.as_slice()
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn read_from<R: io::Read>(stream: &mut R) -> Result<Packet> {
        let packet_len = stream.read_u32::<BigEndian>()? as usize;
        let padding_len = stream.read_u8()? as usize;

        if packet_len > MAX_PACKET_LEN {
            return Err(io::Error::new(InvalidData, "packet too large"));
        }

        let payload_len = packet_len
            .checked_sub(padding_len + 1)
            .filter(|&len| len > 0)
            .ok_or_else(|| io::Error::new(InvalidData, "invalid padding length"))?;

        let payload = stream.read_bytes(payload_len)?;
        let _padding = stream.read_bytes(padding_len)?;

        Ok(Packet { payload: payload })
    }

    pub fn write_to<W: io::Write>(&self, stream: &mut W) -> Result<()> {
        let padding_len = self.padding_len();
        let packet_len = self.payload.len() + padding_len + 1;

        stream.write_u32::<BigEndian>(packet_len as u32)?;
        stream.write_u8(padding_len as u8)?;
        stream.write_all(&self.payload)?;
        stream.write_all(&[0u8; 255][..padding_len])?;
        stream.flush()?;

        Ok(())
    }

    /// Reader over the message body, positioned after the message code
    pub fn reader<'a>(&'a self) -> &'a [u8] {
        self.payload.get(1..).unwrap_or(&[])
    }

    pub fn padding_len(&self) -> usize {
        // Calculate the padding to reach a multiple of 8 bytes
        let padding_len = 8 - ((self.payload.len() + 5) % 8);

        // The padding has to be at least 4 bytes long
        if padding_len < 4 {
            padding_len + 8
        }
        else {
            padding_len
        }
    }
}

impl Write for Packet {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.payload.write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

pub trait ReadPacketExt: ReadBytesExt {
    fn read_string(&mut self) -> Result<Vec<u8>> {
        let len = self.read_u32::<BigEndian>()?;
        self.read_bytes(len as usize)
    }

    /// Read a non-negative mpint. Negative values are rejected since every
    /// integer on the key exchange wire is a group element or a modulus.
    fn read_mpint(&mut self) -> Result<BigUint> {
        let bytes = self.read_string()?;
        BigInt::from_signed_bytes_be(bytes.as_slice())
            .to_biguint()
            .ok_or_else(|| io::Error::new(InvalidData, "negative mpint"))
    }

    fn read_uint32(&mut self) -> Result<u32> {
        Ok(self.read_u32::<BigEndian>()?)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        // Don't trust `len` for the allocation, it comes from the peer
        let mut buffer = Vec::new();
        self.take(len as u64).read_to_end(&mut buffer)?;

        if buffer.len() != len {
            return Err(io::Error::new(UnexpectedEof, "truncated field"));
        }

        Ok(buffer)
    }

    fn read_utf8(&mut self) -> Result<String> {
        String::from_utf8(self.read_string()?)
            .map_err(|_| io::Error::new(InvalidData, "invalid utf-8"))
    }

    fn read_bool(&mut self) -> Result<bool> {
        self.read_u8().map(|i| i != 0)
    }

    fn read_enum_list<T: FromStr>(&mut self) -> Result<Vec<T>> {
        let string = self.read_utf8()?;
        Ok(
            string
                .split(",")
                .filter_map(|l| T::from_str(&l).ok())
                .collect(),
        )
    }

    fn read_name_list(&mut self) -> Result<Vec<String>> {
        let string = self.read_utf8()?;
        Ok(
            string
                .split(",")
                .filter(|l| !l.is_empty())
                .map(|l| l.to_owned())
                .collect(),
        )
    }
}

impl<R: ReadBytesExt> ReadPacketExt for R {}

pub trait WritePacketExt: WriteBytesExt {
    fn write_msg_type(&mut self, msg_type: MessageType) -> Result<()> {
        self.write_u8(msg_type.into())
    }

    fn write_string(&mut self, s: &str) -> Result<()> {
        let bytes = s.as_bytes();
        self.write_bytes(bytes)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_uint32(bytes.len() as u32)?;
        self.write_all(bytes)
    }

    fn write_raw_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all(bytes)
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(if value { 1 } else { 0 })
    }

    fn write_mpint(&mut self, value: &BigUint) -> Result<()> {
        if value.is_zero() {
            return self.write_uint32(0);
        }

        // Two's complement, so a set high bit gets a leading zero byte
        let bytes = BigInt::from_biguint(Sign::Plus, value.clone())
            .to_signed_bytes_be();
        self.write_bytes(bytes.as_slice())
    }

    fn write_uint32(&mut self, value: u32) -> Result<()> {
        self.write_u32::<BigEndian>(value as u32)
    }

    fn write_list<T: ToString>(&mut self, list: &[T]) -> Result<()> {
        let mut string = String::new();
        let mut iter = list.iter();

        while let Some(item) = iter.next() {
            if !string.is_empty() {
                string += ",";
            }
            string += &*item.to_string();
        }
        self.write_string(&*string)
    }
}

impl<W: WriteBytesExt + ?Sized> WritePacketExt for W {}

/// Encode a single mpint into a fresh buffer
pub fn mpint_bytes(value: &BigUint) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail
    let _ = buf.write_mpint(value);
    buf
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Packet({:?}, {} bytes)",
            self.msg_type(),
            self.payload.len()
        )
    }
}
