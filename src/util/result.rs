use hex::FromHexError;
use std;
use std::io;
use std::string::FromUtf8Error;

/// Standard error type used in the library
#[derive(Debug)]
pub enum Error {
    /// An argument provided is invalid
    BadArgument(String),
    /// The data given is not valid
    BadData(String),
    /// The remote advertised a best height of zero or less
    NonPositiveHeight(i32),
    /// The remote's chain is behind ours
    ExpiredChain { local_height: i32, peer_height: i32 },
    /// Hex string could not be decoded
    FromHexError(FromHexError),
    /// UTF8 parsing error
    FromUtf8Error(FromUtf8Error),
    /// The state is not valid
    IllegalState(String),
    /// Standard library IO error
    IOError(io::Error),
    /// The remote does not serve blocks bloom filtering
    NoBloomService(u64),
    /// The remote does not serve the full block chain
    NotFullNode(u64),
    /// A queued task gave up
    TaskFailed(String),
    /// The operation timed out
    Timeout,
    /// The data or functionality is not supported by this library
    Unsupported(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadArgument(s) => f.write_str(&format!("Bad argument: {}", s)),
            Error::BadData(s) => f.write_str(&format!("Bad data: {}", s)),
            Error::NonPositiveHeight(h) => {
                f.write_str(&format!("Peer announced non-positive height: {}", h))
            }
            Error::ExpiredChain {
                local_height,
                peer_height,
            } => f.write_str(&format!(
                "Expired chain: local height {}, peer height {}",
                local_height, peer_height
            )),
            Error::FromHexError(e) => f.write_str(&format!("Hex decoding error: {}", e)),
            Error::FromUtf8Error(e) => f.write_str(&format!("Utf8 parsing error: {}", e)),
            Error::IllegalState(s) => f.write_str(&format!("Illegal state: {}", s)),
            Error::IOError(e) => f.write_str(&format!("IO error: {}", e)),
            Error::NoBloomService(s) => {
                f.write_str(&format!("Peer does not support bloom filters: {:#x}", s))
            }
            Error::NotFullNode(s) => f.write_str(&format!("Peer is not a full node: {:#x}", s)),
            Error::TaskFailed(s) => f.write_str(&format!("Task failed: {}", s)),
            Error::Timeout => f.write_str("Timeout"),
            Error::Unsupported(s) => f.write_str(&format!("Unsuppored: {}", s)),
        }
    }
}

impl std::error::Error for Error {
    fn description(&self) -> &str {
        match self {
            Error::BadArgument(_) => "Bad argument",
            Error::BadData(_) => "Bad data",
            Error::NonPositiveHeight(_) => "Non-positive height",
            Error::ExpiredChain { .. } => "Expired chain",
            Error::FromHexError(_) => "Hex decoding error",
            Error::FromUtf8Error(_) => "Utf8 parsing error",
            Error::IllegalState(_) => "Illegal state",
            Error::IOError(_) => "IO error",
            Error::NoBloomService(_) => "No bloom service",
            Error::NotFullNode(_) => "Not a full node",
            Error::TaskFailed(_) => "Task failed",
            Error::Timeout => "Timeout",
            Error::Unsupported(_) => "Unsupported",
        }
    }

    fn cause(&self) -> Option<&dyn std::error::Error> {
        match self {
            Error::FromHexError(e) => Some(e),
            Error::FromUtf8Error(e) => Some(e),
            Error::IOError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FromHexError> for Error {
    fn from(e: FromHexError) -> Self {
        Error::FromHexError(e)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(e: FromUtf8Error) -> Self {
        Error::FromUtf8Error(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IOError(e)
    }
}

/// Standard Result used in the library
pub type Result<T> = std::result::Result<T, Error>;
