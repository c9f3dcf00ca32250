use std::io;
use std::io::Read;

/// Wraps a reader so each read either fills the output or consumes nothing
///
/// Bytes from an incomplete read are held back and returned first on the next call,
/// so a socket read that times out halfway through a message can be retried.
pub struct AtomicReader<'a> {
    buf: Vec<u8>,
    reader: &'a mut dyn Read,
}

impl<'a> AtomicReader<'a> {
    pub fn new(reader: &mut dyn Read) -> AtomicReader {
        AtomicReader {
            buf: Vec::new(),
            reader,
        }
    }
}

impl<'a> Read for AtomicReader<'a> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let want = out.len();
        let have = self.buf.len().min(want);
        out[..have].copy_from_slice(&self.buf[..have]);
        if have == want {
            self.buf.drain(..want);
            return Ok(want);
        }

        let size = self.reader.read(&mut out[have..])?;
        if size == 0 {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "Disconnected"));
        }
        if have + size < want {
            self.buf.extend_from_slice(&out[have..have + size]);
            return Err(io::Error::new(io::ErrorKind::TimedOut, "Incomplete read"));
        }
        self.buf.clear();
        Ok(want)
    }
}
