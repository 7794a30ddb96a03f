use std::io::{self, Read, Seek, SeekFrom};

use log::{debug, warn};

use super::cursor::{read_up_to, stream_len};
use super::{ChunkWriter, Tag, CHUNK_HEADER_SIZE};

/// One top-level chunk of a tile, payload held verbatim.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub tag: Tag,
    /// Offset of the tag in the source tile.
    pub offset: u64,
    pub payload: Vec<u8>,
}

impl Chunk {
    pub fn size(&self) -> u32 {
        self.payload.len() as u32
    }
}

/// Every top-level chunk of one input tile, in file order.
#[derive(Debug, Default)]
pub struct ChunkCatalog {
    chunks: Vec<Chunk>,
}

impl ChunkCatalog {
    /// Single linear pass from offset 0. Stops when fewer than 8 bytes are
    /// left for another header. A payload that runs past the end of the
    /// stream is kept with the bytes that exist.
    pub fn load<R: Read + Seek>(reader: &mut R) -> io::Result<Self> {
        let len = stream_len(reader)?;
        reader.seek(SeekFrom::Start(0))?;

        let mut chunks = Vec::new();
        let mut pos = 0u64;
        while len - pos >= CHUNK_HEADER_SIZE {
            let mut header = [0u8; 8];
            reader.read_exact(&mut header)?;
            let tag = Tag::from_disk_bytes([header[0], header[1], header[2], header[3]]);
            let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

            let payload = read_up_to(reader, size as usize)?;
            if payload.len() < size as usize {
                warn!(
                    "Chunk {} at {:#x} declares {} bytes but only {} remain",
                    tag,
                    pos,
                    size,
                    payload.len()
                );
            }
            debug!("Load {} ({} bytes)", tag, payload.len());

            let offset = pos;
            pos += CHUNK_HEADER_SIZE + payload.len() as u64;
            chunks.push(Chunk { tag, offset, payload });
        }

        Ok(Self { chunks })
    }

    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn get(&self, tag: Tag) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.tag == tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.get(tag).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Copy every chunk whose tag is in `allow_list` to `writer`, keeping
    /// file order. Returns how many chunks were written.
    pub fn write_passthrough(&self, writer: &mut ChunkWriter, allow_list: &[Tag]) -> usize {
        let mut written = 0;
        for chunk in self.chunks.iter().filter(|c| allow_list.contains(&c.tag)) {
            writer.write_chunk(chunk.tag, &chunk.payload);
            written += 1;
        }
        written
    }
}
