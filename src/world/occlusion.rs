//! `_occ.wdt`: one zero-filled horizon occlusion block per tile.

use super::{version_chunk, WorldContext};
use crate::chunk::{ChunkWriter, Tag};

/// Bytes of occlusion data per tile in MAOH.
pub const OCCLUSION_BLOCK_SIZE: u32 = 1090;

pub fn build_occ(ctx: &WorldContext) -> ChunkWriter {
    let tiles = ctx.world_tiles();

    let mut out = ChunkWriter::new();
    version_chunk(&mut out);

    out.write_header(Tag::MAOI, 12 * tiles.len() as u32);
    for (i, (_, a, b)) in tiles.iter().enumerate() {
        out.write_u16(*b as u16);
        out.write_u16(*a as u16);
        out.write_u32(OCCLUSION_BLOCK_SIZE * i as u32);
        out.write_u32(OCCLUSION_BLOCK_SIZE);
    }

    let blocks = (OCCLUSION_BLOCK_SIZE as usize) * tiles.len();
    out.write_header(Tag::MAOH, blocks as u32);
    out.write_zeros(blocks);
    out
}
