pub mod kex;

/// Transport layer message numbers, RFC 4250 section 4.1.2. Everything past
/// the key exchange method range is opaque to this crate.
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum MessageType {
    Disconnect,
    Ignore,
    Unimplemented,
    Debug,
    ServiceRequest,
    ServiceAccept,
    KexInit,
    NewKeys,
    /// Method specific messages, 30 to 49
    KeyExchange(u8),
    Other(u8),
    Unknown,
}

impl From<u8> for MessageType {
    fn from(id: u8) -> Self {
        use self::MessageType::*;
        match id {
            1 => Disconnect,
            2 => Ignore,
            3 => Unimplemented,
            4 => Debug,
            5 => ServiceRequest,
            6 => ServiceAccept,
            20 => KexInit,
            21 => NewKeys,
            30..=49 => KeyExchange(id),
            50..=254 => Other(id),
            _ => Unknown,
        }
    }
}

impl Into<u8> for MessageType {
    fn into(self) -> u8 {
        use self::MessageType::*;
        match self {
            Disconnect => 1,
            Ignore => 2,
            Unimplemented => 3,
            Debug => 4,
            ServiceRequest => 5,
            ServiceAccept => 6,
            KexInit => 20,
            NewKeys => 21,
            KeyExchange(id) => id,
            Other(id) => id,
            Unknown => 255,
        }
    }
}
