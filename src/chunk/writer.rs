//! Random-access output buffer for chunk files.
//!
//! Builders append chunks, then seek back to patch sizes and header offsets
//! once they are known. Writes at a position inside the buffer overwrite in
//! place and never truncate what follows. Nothing touches the filesystem
//! until [`ChunkWriter::save`].

use std::fs;
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use super::Tag;
#[cfg(test)]
use super::CHUNK_HEADER_SIZE;

#[derive(Debug, Default)]
pub struct ChunkWriter {
    buf: Vec<u8>,
    pos: usize,
}

impl ChunkWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    pub fn len(&self) -> u64 {
        self.buf.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[cfg(test)]
    pub fn seek_to(&mut self, pos: u64) {
        self.pos = pos as usize;
    }

    pub fn seek_end(&mut self) {
        self.pos = self.buf.len();
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.pos > self.buf.len() {
            self.buf.resize(self.pos, 0);
        }
        let overlap = (self.buf.len() - self.pos).min(bytes.len());
        self.buf[self.pos..self.pos + overlap].copy_from_slice(&bytes[..overlap]);
        self.buf.extend_from_slice(&bytes[overlap..]);
        self.pos += bytes.len();
    }

    pub fn write_zeros(&mut self, n: usize) {
        self.write_bytes(&vec![0u8; n]);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_i16(&mut self, v: i16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Tag + size only; the caller writes `size` payload bytes after it.
    pub fn write_header(&mut self, tag: Tag, size: u32) {
        self.write_bytes(&tag.disk_bytes());
        self.write_u32(size);
    }

    pub fn write_chunk(&mut self, tag: Tag, payload: &[u8]) {
        self.write_header(tag, payload.len() as u32);
        self.write_bytes(payload);
    }

    /// Overwrite a `u32` at `offset` and return to the previous position.
    pub fn patch_u32(&mut self, offset: u64, value: u32) {
        let saved = self.pos;
        self.pos = offset as usize;
        self.write_u32(value);
        self.pos = saved;
    }

    /// Offset of the first top-level chunk with `tag`, walking headers from
    /// the start of the buffer.
    #[cfg(test)]
    pub fn find_chunk(&self, tag: Tag) -> Option<u64> {
        let mut pos = 0usize;
        while pos + CHUNK_HEADER_SIZE as usize <= self.buf.len() {
            let found =
                Tag::from_disk_bytes([self.buf[pos], self.buf[pos + 1], self.buf[pos + 2], self.buf[pos + 3]]);
            if found == tag {
                return Some(pos as u64);
            }
            let size = u32::from_le_bytes([
                self.buf[pos + 4],
                self.buf[pos + 5],
                self.buf[pos + 6],
                self.buf[pos + 7],
            ]) as usize;
            pos += CHUNK_HEADER_SIZE as usize + size;
        }
        None
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    /// Replace whatever is at `path` with the buffer contents.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if path.exists() {
            fs::remove_file(path)?;
        }
        fs::write(path, &self.buf)
    }
}

impl Write for ChunkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for ChunkWriter {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => p as i64,
            SeekFrom::End(d) => self.buf.len() as i64 + d,
            SeekFrom::Current(d) => self.pos as i64 + d,
        };
        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of chunk buffer",
            ));
        }
        self.pos = target as usize;
        Ok(self.pos as u64)
    }
}
