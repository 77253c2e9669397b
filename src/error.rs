use std::convert::From;
use std::error::Error;
use std::fmt;
use std::io;

use session::Role;

pub type ConnectionResult<T> = Result<T, ConnectionError>;

#[derive(Debug)]
pub enum ConnectionError {
    IoError(io::Error),
    ProtocolError,
    NegotiationError,
    KeyExchange(KexError),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::ConnectionError::*;
        match self
        {
            &IoError(ref err) => write!(f, "connection error: io error: {}", err),
            &ProtocolError => f.write_str("connection error: protocol error"),
            &NegotiationError => {
                f.write_str("connection error: negotiation error")
            }
            &KeyExchange(ref err) => write!(f, "connection error: {}", err),
        }
    }
}

impl Error for ConnectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self
        {
            &ConnectionError::IoError(ref err) => Some(err),
            &ConnectionError::KeyExchange(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ConnectionError {
    fn from(err: io::Error) -> ConnectionError {
        ConnectionError::IoError(err)
    }
}

impl From<KexError> for ConnectionError {
    fn from(err: KexError) -> ConnectionError {
        ConnectionError::KeyExchange(err)
    }
}

/// Terminal failure of a single key exchange.
#[derive(Debug)]
pub enum KexError {
    /// The message code is never legal for this side of the exchange
    RoleViolation { role: Role, msg: u8 },
    /// The message is legal for this role, but not in the current state
    OutOfSequence(u8),
    /// Truncated or malformed message body
    Decode(io::Error),
    /// The requested group size range is empty after clamping
    GroupRange { min: u32, max: u32 },
    Crypto(&'static str),
    /// The peer's identity could not be established
    Trust(&'static str),
    Unimplemented(u8),
    /// A transcript anchor (version string, KEXINIT payload, host key) is
    /// missing from the session
    MissingContext(&'static str),
}

impl fmt::Display for KexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::KexError::*;
        match self
        {
            &RoleViolation { role, msg } => {
                write!(f, "key exchange error: message {} received as {:?}", msg, role)
            }
            &OutOfSequence(msg) => {
                write!(f, "key exchange error: message {} out of sequence", msg)
            }
            &Decode(ref err) => {
                write!(f, "key exchange error: malformed message: {}", err)
            }
            &GroupRange { min, max } => {
                write!(f, "key exchange error: empty group range {}..{}", min, max)
            }
            &Crypto(what) => write!(f, "key exchange error: {}", what),
            &Trust(what) => write!(f, "key exchange error: untrusted peer: {}", what),
            &Unimplemented(msg) => {
                write!(f, "key exchange error: message {} not implemented", msg)
            }
            &MissingContext(what) => {
                write!(f, "key exchange error: missing {}", what)
            }
        }
    }
}

impl Error for KexError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self
        {
            &KexError::Decode(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for KexError {
    fn from(err: io::Error) -> KexError {
        KexError::Decode(err)
    }
}
