use crate::messages::filter_load::FilterLoad;
use crate::messages::message_header::MessageHeader;
use crate::messages::opaque::Opaque;
use crate::messages::ping::Ping;
use crate::messages::version::Version;
use crate::util::{Error, Result, Serializable};
use std::fmt;
use std::io;
use std::io::{Cursor, Read, Write};

/// Checksum to use when there is an empty payload
pub const NO_CHECKSUM: [u8; 4] = [0x5d, 0xf6, 0xe0, 0xe2];

/// Max message payload size (32MB)
pub const MAX_PAYLOAD_SIZE: u32 = 0x02000000;

/// Message commands for the header
pub mod commands {
    /// [Filter load command](https://en.bitcoin.it/wiki/Protocol_documentation#filterload.2C_filteradd.2C_filterclear.2C_merkleblock)
    pub const FILTERLOAD: [u8; 12] = *b"filterload\0\0";

    /// [Mempool command](https://en.bitcoin.it/wiki/Protocol_documentation#mempool)
    pub const MEMPOOL: [u8; 12] = *b"mempool\0\0\0\0\0";

    /// [Ping command](https://en.bitcoin.it/wiki/Protocol_documentation#ping)
    pub const PING: [u8; 12] = *b"ping\0\0\0\0\0\0\0\0";

    /// [Pong command](https://en.bitcoin.it/wiki/Protocol_documentation#pong)
    pub const PONG: [u8; 12] = *b"pong\0\0\0\0\0\0\0\0";

    /// [Version command](https://en.bitcoin.it/wiki/Protocol_documentation#version)
    pub const VERSION: [u8; 12] = *b"version\0\0\0\0\0";

    /// [Version acknowledgement command](https://en.bitcoin.it/wiki/Protocol_documentation#verack)
    pub const VERACK: [u8; 12] = *b"verack\0\0\0\0\0\0";
}

/// Bitcoin peer-to-peer message with its payload
///
/// Only the messages the peer engine acts on are decoded. Everything else is carried
/// as `Other` so tasks can claim it.
#[derive(PartialEq, Eq, Hash, Clone)]
pub enum Message {
    FilterLoad(FilterLoad),
    Mempool,
    Other(Opaque),
    Partial(MessageHeader),
    Ping(Ping),
    Pong(Ping),
    Verack,
    Version(Version),
}

impl Message {
    /// Reads a Bitcoin P2P message with its payload from bytes
    ///
    /// It's possible for a message's header to be read but not its payload. In this case, the
    /// return value is not an Error but a Partial message, and the complete message may be read
    /// later using read_partial.
    pub fn read(reader: &mut dyn Read, magic: [u8; 4]) -> Result<Self> {
        let header = MessageHeader::read(reader)?;
        header.validate(magic, MAX_PAYLOAD_SIZE)?;
        match Message::read_partial(reader, &header) {
            Ok(msg) => Ok(msg),
            Err(Error::IOError(ref e)) if is_timeout(e) => Ok(Message::Partial(header)),
            Err(e) => Err(e),
        }
    }

    /// Reads the complete message given a message header
    ///
    /// It may be used after read() returns Message::Partial.
    pub fn read_partial(reader: &mut dyn Read, header: &MessageHeader) -> Result<Self> {
        use self::commands::*;
        match header.command {
            FILTERLOAD => {
                let payload = header.payload(reader)?;
                let filter_load = FilterLoad::read(&mut Cursor::new(payload))?;
                filter_load.validate()?;
                Ok(Message::FilterLoad(filter_load))
            }
            MEMPOOL => {
                expect_empty(header)?;
                Ok(Message::Mempool)
            }
            PING => {
                let payload = header.payload(reader)?;
                Ok(Message::Ping(Ping::read(&mut Cursor::new(payload))?))
            }
            PONG => {
                let payload = header.payload(reader)?;
                Ok(Message::Pong(Ping::read(&mut Cursor::new(payload))?))
            }
            VERSION => {
                let payload = header.payload(reader)?;
                let version = Version::read(&mut Cursor::new(payload))?;
                version.validate()?;
                Ok(Message::Version(version))
            }
            VERACK => {
                expect_empty(header)?;
                Ok(Message::Verack)
            }
            command => {
                let payload = header.payload(reader)?;
                Ok(Message::Other(Opaque { command, payload }))
            }
        }
    }

    /// Writes a Bitcoin P2P message with its payload to bytes
    pub fn write(&self, writer: &mut dyn Write, magic: [u8; 4]) -> io::Result<()> {
        use self::commands::*;
        match self {
            Message::FilterLoad(p) => write_with_payload(writer, FILTERLOAD, p, magic),
            Message::Mempool => write_without_payload(writer, MEMPOOL, magic),
            Message::Other(p) => write_with_payload(writer, p.command, p, magic),
            Message::Partial(_) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Cannot write partial message".to_string(),
            )),
            Message::Ping(p) => write_with_payload(writer, PING, p, magic),
            Message::Pong(p) => write_with_payload(writer, PONG, p, magic),
            Message::Verack => write_without_payload(writer, VERACK, magic),
            Message::Version(v) => write_with_payload(writer, VERSION, v, magic),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Message::FilterLoad(p) => f.write_str(&format!("{:#?}", p)),
            Message::Mempool => f.write_str("Mempool"),
            Message::Other(p) => f.write_str(&format!("{:#?}", p)),
            Message::Partial(h) => f.write_str(&format!("Partial {:#?}", h)),
            Message::Ping(p) => f.write_str(&format!("{:#?}", p)),
            Message::Pong(p) => f.debug_struct("Pong").field("nonce", &p.nonce).finish(),
            Message::Verack => f.write_str("Verack"),
            Message::Version(p) => f.write_str(&format!("{:#?}", p)),
        }
    }
}

// Depending on platform, either TimedOut or WouldBlock may be returned to indicate a non-error timeout
pub(crate) fn is_timeout(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock
}

fn expect_empty(header: &MessageHeader) -> Result<()> {
    if header.payload_size != 0 {
        return Err(Error::BadData("Bad payload".to_string()));
    }
    Ok(())
}

fn write_without_payload(
    writer: &mut dyn Write,
    command: [u8; 12],
    magic: [u8; 4],
) -> io::Result<()> {
    let header = MessageHeader {
        magic,
        command,
        payload_size: 0,
        checksum: NO_CHECKSUM,
    };
    header.write(writer)
}

fn write_with_payload<T: Serializable<T>>(
    writer: &mut dyn Write,
    command: [u8; 12],
    payload: &dyn Payload<T>,
    magic: [u8; 4],
) -> io::Result<()> {
    let mut bytes = Vec::with_capacity(payload.size());
    payload.write(&mut bytes)?;
    let header = MessageHeader::for_payload(magic, command, &bytes);
    header.write(writer)?;
    writer.write_all(&bytes)
}

/// Message payload that is writable to bytes
pub trait Payload<T>: Serializable<T> + fmt::Debug {
    fn size(&self) -> usize;
}
