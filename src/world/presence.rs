//! `.wdt` presence table plus the two near-empty companions, `_lgt.wdt` and
//! `.tex`.

use super::{version_chunk, WorldContext, GRID_SIZE};
use crate::chunk::{ChunkWriter, Tag};

// MPHD flags
pub const MPHD_VERTEX_SHADING: u32 = 0x2;
pub const MPHD_SORTED_DOODADS: u32 = 0x8;
pub const MPHD_VERTEX_LIGHTING: u32 = 0x10;
pub const MPHD_UPSIDE_DOWN_GROUND: u32 = 0x40;
pub const MPHD_LOD_OBJECTS: u32 = 0x100;

/// MAIN cell flags
pub const CELL_HAS_TILE: u32 = 0x1;
pub const CELL_EMPTY: u32 = 0x2;

pub fn header_flags(has_vertex_colors: bool, next_gen: bool) -> u32 {
    let mut flags = MPHD_SORTED_DOODADS | MPHD_VERTEX_LIGHTING | MPHD_UPSIDE_DOWN_GROUND;
    if has_vertex_colors {
        flags |= MPHD_VERTEX_SHADING;
    }
    if next_gen {
        flags |= MPHD_LOD_OBJECTS;
    }
    flags
}

pub fn build_wdt(ctx: &WorldContext) -> ChunkWriter {
    let mut out = ChunkWriter::new();
    version_chunk(&mut out);

    out.write_header(Tag::MPHD, 32);
    out.write_u32(header_flags(ctx.has_vertex_colors, ctx.next_gen));
    out.write_zeros(7 * 4);

    let grid = ctx.tile_grid();
    out.write_header(Tag::MAIN, GRID_SIZE * GRID_SIZE * 8);
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            let flags = if grid.contains_key(&(col, row)) {
                CELL_HAS_TILE
            } else {
                CELL_EMPTY
            };
            out.write_u32(flags);
            out.write_u32(0);
        }
    }
    out
}

pub fn build_lgt() -> ChunkWriter {
    let mut out = ChunkWriter::new();
    version_chunk(&mut out);
    out
}

pub fn build_tex() -> ChunkWriter {
    let mut out = ChunkWriter::new();
    out.write_chunk(Tag::TXVR, &[0u8; 4]);
    out
}
