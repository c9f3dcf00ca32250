use crate::messages::message::{commands, Payload};
use crate::util::{Error, Result, Serializable};
use hex;
use std::fmt;
use std::io;
use std::io::{Read, Write};
use std::str;

/// Commands decoded into their own message variants
const DECODED: [[u8; 12]; 6] = [
    commands::FILTERLOAD,
    commands::MEMPOOL,
    commands::PING,
    commands::PONG,
    commands::VERACK,
    commands::VERSION,
];

/// A message this library does not decode, kept as its raw command and payload
///
/// Tasks use these to exchange messages such as getheaders or merkleblock whose
/// codecs live outside the peer engine.
#[derive(Default, PartialEq, Eq, Hash, Clone)]
pub struct Opaque {
    /// Command name, null padded
    pub command: [u8; 12],
    /// Raw payload bytes
    pub payload: Vec<u8>,
}

impl Opaque {
    /// Creates an opaque message from a command name of at most 12 ASCII bytes
    ///
    /// Commands with their own `Message` variant are rejected since they would not
    /// read back as opaque.
    pub fn new(command: &str, payload: Vec<u8>) -> Result<Opaque> {
        let bytes = command.as_bytes();
        if bytes.is_empty() || bytes.len() > 12 || !command.is_ascii() {
            let msg = format!("Bad command: {:?}", command);
            return Err(Error::BadArgument(msg));
        }
        let mut padded = [0; 12];
        padded[..bytes.len()].clone_from_slice(bytes);
        if DECODED.contains(&padded) {
            let msg = format!("Command {:?} has its own message type", command);
            return Err(Error::BadArgument(msg));
        }
        Ok(Opaque {
            command: padded,
            payload,
        })
    }

    /// Returns the command name without the null padding
    pub fn command_name(&self) -> String {
        let end = self.command.iter().position(|b| *b == 0).unwrap_or(12);
        match str::from_utf8(&self.command[..end]) {
            Ok(s) => s.to_string(),
            Err(_) => format!("Not Ascii ({:?})", self.command),
        }
    }
}

impl Serializable<Opaque> for Opaque {
    /// Reads the remainder of the stream as the payload, with an empty command
    ///
    /// The command lives in the message header, so callers fill it in afterward.
    fn read(reader: &mut dyn Read) -> Result<Opaque> {
        let mut payload = Vec::new();
        reader.read_to_end(&mut payload)?;
        Ok(Opaque {
            command: [0; 12],
            payload,
        })
    }

    fn write(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(&self.payload)
    }
}

impl Payload<Opaque> for Opaque {
    fn size(&self) -> usize {
        self.payload.len()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Opaque")
            .field("command", &self.command_name())
            .field("payload", &hex::encode(&self.payload))
            .finish()
    }
}
