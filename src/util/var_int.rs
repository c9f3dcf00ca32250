//! Functions to read and write variable length integers and the byte strings they prefix

use crate::util::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io;
use std::io::{Read, Write};

/// Returns the number of bytes required
pub fn size(n: u64) -> usize {
    if n <= 252 {
        1
    } else if n <= 0xffff {
        3
    } else if n <= 0xffffffff {
        5
    } else {
        9
    }
}

/// Writes the var int to bytes
pub fn write(n: u64, writer: &mut dyn Write) -> io::Result<()> {
    if n <= 252 {
        writer.write_u8(n as u8)?;
    } else if n <= 0xffff {
        writer.write_u8(0xfd)?;
        writer.write_u16::<LittleEndian>(n as u16)?;
    } else if n <= 0xffffffff {
        writer.write_u8(0xfe)?;
        writer.write_u32::<LittleEndian>(n as u32)?;
    } else {
        writer.write_u8(0xff)?;
        writer.write_u64::<LittleEndian>(n)?;
    }
    Ok(())
}

/// Reads a var int from bytes
pub fn read(reader: &mut dyn Read) -> io::Result<u64> {
    let n0 = reader.read_u8()?;
    Ok(match n0 {
        0xff => reader.read_u64::<LittleEndian>()?,
        0xfe => reader.read_u32::<LittleEndian>()? as u64,
        0xfd => reader.read_u16::<LittleEndian>()? as u64,
        _ => n0 as u64,
    })
}

/// Reads a var int length followed by that many bytes
///
/// The length comes from the remote, so it is checked against `max` before allocating.
pub fn read_bytes(reader: &mut dyn Read, max: usize) -> Result<Vec<u8>> {
    let len = read(reader)?;
    if len > max as u64 {
        let msg = format!("Length {} exceeds {}", len, max);
        return Err(Error::BadData(msg));
    }
    let mut bytes = vec![0; len as usize];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// Writes a var int length followed by the bytes
pub fn write_bytes(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    write(bytes.len() as u64, writer)?;
    writer.write_all(bytes)
}
