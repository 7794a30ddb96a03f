//! IFF-style chunk container shared by every ADT/WDT/WDL file:
//! `tag (4) | size (u32 LE) | payload[size]`.
//!
//! Tags are stored reversed on disk: the logical `MVER` is written as the
//! bytes `R E V M`, which is the same as writing the big-endian value of
//! the logical name as a little-endian `u32`.

pub mod catalog;
pub mod cursor;
pub mod writer;

pub use catalog::{Chunk, ChunkCatalog};
pub use writer::ChunkWriter;

/// Size of a chunk header (tag + size).
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// A four character chunk code in its logical (readable) order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag([u8; 4]);

impl Tag {
    // Tile chunks
    pub const MVER: Tag = Tag::new(b"MVER");
    pub const MHDR: Tag = Tag::new(b"MHDR");
    pub const MCIN: Tag = Tag::new(b"MCIN");
    pub const MTEX: Tag = Tag::new(b"MTEX");
    pub const MAMP: Tag = Tag::new(b"MAMP");
    pub const MMDX: Tag = Tag::new(b"MMDX");
    pub const MMID: Tag = Tag::new(b"MMID");
    pub const MWMO: Tag = Tag::new(b"MWMO");
    pub const MWID: Tag = Tag::new(b"MWID");
    pub const MDDF: Tag = Tag::new(b"MDDF");
    pub const MODF: Tag = Tag::new(b"MODF");
    pub const MH2O: Tag = Tag::new(b"MH2O");
    pub const MFBO: Tag = Tag::new(b"MFBO");
    pub const MCNK: Tag = Tag::new(b"MCNK");

    // MCNK sub-chunks
    pub const MCVT: Tag = Tag::new(b"MCVT");
    pub const MCCV: Tag = Tag::new(b"MCCV");
    pub const MCLV: Tag = Tag::new(b"MCLV");
    pub const MCNR: Tag = Tag::new(b"MCNR");
    pub const MCSE: Tag = Tag::new(b"MCSE");
    pub const MCLY: Tag = Tag::new(b"MCLY");
    pub const MCSH: Tag = Tag::new(b"MCSH");
    pub const MCAL: Tag = Tag::new(b"MCAL");
    pub const MCMT: Tag = Tag::new(b"MCMT");
    pub const MCRF: Tag = Tag::new(b"MCRF");
    pub const MCRD: Tag = Tag::new(b"MCRD");
    pub const MCRW: Tag = Tag::new(b"MCRW");

    // Next-gen object chunks
    pub const MLDD: Tag = Tag::new(b"MLDD");
    pub const MLDX: Tag = Tag::new(b"MLDX");
    pub const MLDL: Tag = Tag::new(b"MLDL");
    pub const MLMD: Tag = Tag::new(b"MLMD");
    pub const MLMX: Tag = Tag::new(b"MLMX");

    // World table chunks
    pub const MPHD: Tag = Tag::new(b"MPHD");
    pub const MAIN: Tag = Tag::new(b"MAIN");
    pub const MAOI: Tag = Tag::new(b"MAOI");
    pub const MAOH: Tag = Tag::new(b"MAOH");
    pub const MAOF: Tag = Tag::new(b"MAOF");
    pub const MARE: Tag = Tag::new(b"MARE");
    pub const MAHO: Tag = Tag::new(b"MAHO");
    pub const TXVR: Tag = Tag::new(b"TXVR");

    pub const fn new(name: &[u8; 4]) -> Self {
        Tag(*name)
    }

    /// The `u32` read from disk when this tag is stored little-endian.
    pub const fn signature(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub const fn from_signature(signature: u32) -> Self {
        Tag(signature.to_be_bytes())
    }

    /// Bytes as they appear in a file.
    pub const fn disk_bytes(self) -> [u8; 4] {
        self.signature().to_le_bytes()
    }

    pub fn from_disk_bytes(bytes: [u8; 4]) -> Self {
        Tag::from_signature(u32::from_le_bytes(bytes))
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.0).to_string()
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::fmt::Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag({})", self.name())
    }
}
