//! `.wdl`: low-resolution height grid of every tile in a world.
//!
//! Each tile is resampled to a 17x17 outer grid plus a 16x16 inner grid
//! (offset by half a step) from its per-record MCVT heights.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use log::{debug, warn};

use super::{version_chunk, WorldContext, GRID_SIZE};
use crate::chunk::{ChunkWriter, Tag, CHUNK_HEADER_SIZE};
use crate::convert::error::{ConvertError, Result};
use crate::terrain::liquid::record_scan_start;
use crate::terrain::rewriter::{read_heights, walk_records};

pub const TILE_SIZE: f32 = 533.333_33;
pub const CHUNK_SIZE: f32 = TILE_SIZE / 16.0;
pub const UNIT_SIZE: f32 = CHUNK_SIZE / 8.0;

pub const CHUNKS_PER_TILE: usize = 256;
pub const OUTER_GRID: usize = 17;
pub const INNER_GRID: usize = 16;
/// i16 samples per MARE payload.
pub const MARE_SAMPLES: usize = OUTER_GRID * OUTER_GRID + INNER_GRID * INNER_GRID;

/// MARE chunk + MAHO chunk for one tile.
pub const TILE_ENTRY_SIZE: u32 = (CHUNK_HEADER_SIZE as u32) + (MARE_SAMPLES as u32) * 2 + (CHUNK_HEADER_SIZE as u32) + 32;

/// Absolute heights of a tile, one optional 145-sample block per record in
/// file order.
pub struct TileHeights {
    chunks: Vec<Option<Vec<f32>>>,
}

impl TileHeights {
    pub fn from_chunks(chunks: Vec<Option<Vec<f32>>>) -> Self {
        Self { chunks }
    }

    /// Read a tile. `None` when it has fewer than 256 terrain records.
    pub fn extract(data: &[u8]) -> Result<Option<Self>> {
        let mut input = Cursor::new(data);
        let scan_start = record_scan_start(&mut input)?;

        let mut chunks = Vec::with_capacity(CHUNKS_PER_TILE);
        walk_records(&mut input, scan_start, |input, ctx| {
            if chunks.len() < CHUNKS_PER_TILE {
                let base = ctx.header.base_height();
                let heights = read_heights(input, ctx)?
                    .map(|samples| samples.into_iter().map(|h| h + base).collect());
                chunks.push(heights);
            }
            Ok(())
        })?;

        if chunks.len() < CHUNKS_PER_TILE {
            return Ok(None);
        }
        Ok(Some(Self { chunks }))
    }

    /// Height at tile-local `(x, y)`, zero where no sample exists.
    pub fn land_height(&self, x: f32, y: f32) -> f32 {
        let cx = ((x / CHUNK_SIZE).floor() as i32).clamp(0, 15);
        let cy = ((y / CHUNK_SIZE).floor() as i32).clamp(0, 15);
        let Some(Some(heights)) = self.chunks.get((cy * 16 + cx) as usize) else {
            return 0.0;
        };

        let x = x - cx as f32 * CHUNK_SIZE;
        let y = y - cy as f32 * CHUNK_SIZE;

        let row = (y / (UNIT_SIZE * 0.5) + 0.5) as i32;
        let odd = row % 2 != 0;
        let col = ((x - UNIT_SIZE * 0.5 * (row % 2) as f32) / UNIT_SIZE + 0.5) as i32;
        if row < 0 || col < 0 || row > 16 || col > if odd { 8 } else { 9 } {
            return 0.0;
        }

        let index = 17 * (row / 2) + if odd { 9 } else { 0 } + col;
        heights.get(index as usize).copied().unwrap_or(0.0)
    }

    /// Outer 17x17 grid followed by the inner 16x16 grid.
    pub fn sample(&self) -> Vec<i16> {
        let step = TILE_SIZE / 16.0;
        let mut out = Vec::with_capacity(MARE_SAMPLES);
        for i in 0..OUTER_GRID {
            for j in 0..OUTER_GRID {
                out.push(quantize_height(self.land_height(j as f32 * step, i as f32 * step)));
            }
        }
        for i in 0..INNER_GRID {
            for j in 0..INNER_GRID {
                let x = j as f32 * step + step / 2.0;
                let y = i as f32 * step + step / 2.0;
                out.push(quantize_height(self.land_height(x, y)));
            }
        }
        out
    }
}

/// Round to nearest (ties to even) and clamp into `i16`.
pub fn quantize_height(h: f32) -> i16 {
    h.round_ties_even().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Samples of one sibling tile. A tile that cannot be read or walked is
/// left out of the WDL like an incomplete one.
fn load_tile(path: &Path) -> Option<Vec<i16>> {
    let heights = fs::read(path)
        .map_err(ConvertError::from)
        .and_then(|data| TileHeights::extract(&data));
    match heights {
        Ok(Some(heights)) => Some(heights.sample()),
        Ok(None) => {
            warn!("{}: fewer than {} terrain records, left out of WDL", path.display(), CHUNKS_PER_TILE);
            None
        }
        Err(e) => {
            warn!("{}: {}, left out of WDL", path.display(), e);
            None
        }
    }
}

pub fn build_wdl(ctx: &WorldContext) -> ChunkWriter {
    let mut out = ChunkWriter::new();
    version_chunk(&mut out);
    out.write_chunk(Tag::MWMO, &[]);
    out.write_chunk(Tag::MWID, &[]);
    out.write_chunk(Tag::MODF, &[]);

    let grid = ctx.tile_grid();
    let cells = (GRID_SIZE * GRID_SIZE) as usize;

    let mut offsets = vec![0u32; cells];
    let mut entries = Vec::new();
    let mut next = out.position() as u32 + CHUNK_HEADER_SIZE as u32 + cells as u32 * 4;
    for (i, offset) in offsets.iter_mut().enumerate() {
        let cell = (i as u32 % GRID_SIZE, i as u32 / GRID_SIZE);
        let Some(path) = grid.get(&cell) else {
            continue;
        };
        if let Some(samples) = load_tile(path) {
            *offset = next;
            next += TILE_ENTRY_SIZE;
            entries.push(samples);
        }
    }
    debug!("WDL: {} of {} cells with heights", entries.len(), grid.len());

    out.write_header(Tag::MAOF, cells as u32 * 4);
    for offset in &offsets {
        out.write_u32(*offset);
    }
    for samples in &entries {
        out.write_header(Tag::MARE, MARE_SAMPLES as u32 * 2);
        for h in samples {
            out.write_i16(*h);
        }
        out.write_chunk(Tag::MAHO, &[0u8; 32]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_tile(height: f32) -> TileHeights {
        TileHeights::from_chunks(vec![Some(vec![height; 145]); CHUNKS_PER_TILE])
    }

    #[test]
    fn entry_size_matches_layout() {
        assert_eq!(MARE_SAMPLES, 545);
        assert_eq!(TILE_ENTRY_SIZE, 1138);
    }

    #[test]
    fn quantize_rounds_and_clamps() {
        assert_eq!(quantize_height(12.4), 12);
        assert_eq!(quantize_height(-12.6), -13);
        assert_eq!(quantize_height(40000.0), i16::MAX);
        assert_eq!(quantize_height(-40000.0), i16::MIN);
        assert_eq!(quantize_height(32767.4), i16::MAX);
    }

    #[test]
    fn quantize_ties_go_to_even() {
        assert_eq!(quantize_height(12.5), 12);
        assert_eq!(quantize_height(13.5), 14);
        assert_eq!(quantize_height(-0.5), 0);
        assert_eq!(quantize_height(-1.5), -2);
    }

    #[test]
    fn tile_edges_clamp_into_last_chunk() {
        let mut chunks = vec![None; CHUNKS_PER_TILE];
        let mut first = vec![0.0f32; 145];
        first[0] = 5.0;
        chunks[0] = Some(first);
        let mut last = vec![0.0f32; 145];
        last[144] = 77.0;
        chunks[255] = Some(last);
        let tile = TileHeights::from_chunks(chunks);

        // Far corner lands on the last vertex of the last record.
        assert_eq!(tile.land_height(TILE_SIZE, TILE_SIZE), 77.0);
        // Slightly before the origin clamps into the first record.
        assert_eq!(tile.land_height(-1.0, -1.0), 5.0);
        // Far outside the last record there is no vertex.
        assert_eq!(tile.land_height(TILE_SIZE + 50.0, TILE_SIZE + 50.0), 0.0);
        // A record without heights reads as zero.
        assert_eq!(tile.land_height(CHUNK_SIZE * 3.0, 0.0), 0.0);
    }

    #[test]
    fn flat_tile_samples_flat() {
        let samples = flat_tile(123.6).sample();
        assert_eq!(samples.len(), MARE_SAMPLES);
        assert!(samples.iter().all(|&h| h == 124));
    }

    #[test]
    fn extract_requires_full_tile() {
        assert!(TileHeights::extract(&[]).unwrap().is_none());
    }

    #[test]
    fn unreadable_tile_is_left_out() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_tile(&dir.path().join("W_00_00.adt")).is_none());

        // One record too small to hold its header.
        let mut data = Tag::MCNK.disk_bytes().to_vec();
        data.extend_from_slice(&12u32.to_le_bytes());
        data.extend_from_slice(&[0u8; 12]);
        let broken = dir.path().join("W_01_00.adt");
        fs::write(&broken, data).unwrap();
        assert!(load_tile(&broken).is_none());
    }
}
