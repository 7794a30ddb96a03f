//! Per-world tables built once a world's first tile has been converted:
//! presence (`.wdt`), lights (`_lgt.wdt`), occlusion (`_occ.wdt`),
//! low-resolution heights (`.wdl`) and texture streaming (`.tex`).

pub mod height;
pub mod occlusion;
pub mod presence;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::info;

use crate::chunk::{ChunkWriter, Tag};
use crate::convert::error::Result;

pub const MAP_VERSION: u32 = 18;

/// Tiles per side of a world grid.
pub const GRID_SIZE: u32 = 64;

/// Split `<base>_<a>_<b>.adt` into its base name and the two numbers.
pub fn parse_tile_name(file_name: &str) -> Option<(&str, u32, u32)> {
    let split = file_name.len().checked_sub(4)?;
    let (stem, ext) = (file_name.get(..split)?, file_name.get(split..)?);
    if !ext.eq_ignore_ascii_case(".adt") {
        return None;
    }

    let mut parts = stem.rsplitn(3, '_');
    let b = parts.next()?;
    let a = parts.next()?;
    let base = parts.next()?;
    let number = |s: &str| {
        if !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit()) {
            s.parse::<u32>().ok()
        } else {
            None
        }
    };
    Some((base, number(a)?, number(b)?))
}

/// World name of a tile: the file name with its `_<a>_<b>.adt` suffix
/// removed, or without extension when it does not follow that pattern.
pub fn base_name(tile: &Path) -> String {
    let file_name = tile.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    if let Some((base, _, _)) = parse_tile_name(&file_name) {
        return base.to_string();
    }
    tile.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Everything a table build needs to know about one world.
pub struct WorldContext<'a> {
    pub base_name: &'a str,
    pub export_dir: &'a Path,
    /// Every tile of the current batch; only those of `base_name` are used.
    pub tiles: &'a [PathBuf],
    pub has_vertex_colors: bool,
    pub next_gen: bool,
}

impl WorldContext<'_> {
    /// Tiles of this world keyed by `(col, row)`, the two numbers of
    /// `<base>_<col>_<row>.adt`, in batch order.
    pub fn tile_grid(&self) -> HashMap<(u32, u32), &Path> {
        let mut grid = HashMap::new();
        for tile in self.tiles {
            let Some(name) = tile.file_name().map(|n| n.to_string_lossy()) else {
                continue;
            };
            if let Some((base, col, row)) = parse_tile_name(&name) {
                if base == self.base_name && col < GRID_SIZE && row < GRID_SIZE {
                    grid.entry((col, row)).or_insert(tile.as_path());
                }
            }
        }
        grid
    }

    /// This world's tiles inside the grid with their parsed numbers, in
    /// batch order.
    pub fn world_tiles(&self) -> Vec<(&Path, u32, u32)> {
        self.tiles
            .iter()
            .filter_map(|tile| {
                let name = tile.file_name()?.to_string_lossy();
                let (base, a, b) = parse_tile_name(&name)?;
                (base == self.base_name && a < GRID_SIZE && b < GRID_SIZE).then_some((tile.as_path(), a, b))
            })
            .collect()
    }

    pub fn table_path(&self, suffix: &str) -> PathBuf {
        self.export_dir.join(format!("{}{}", self.base_name, suffix))
    }
}

pub fn version_chunk(out: &mut ChunkWriter) {
    out.write_chunk(Tag::MVER, &MAP_VERSION.to_le_bytes());
}

/// Write all five tables for one world. Returns the written paths.
pub fn build_world_tables(ctx: &WorldContext) -> Result<Vec<PathBuf>> {
    info!("Build world tables for {}", ctx.base_name);

    let tables = [
        (".tex", presence::build_tex()),
        (".wdt", presence::build_wdt(ctx)),
        ("_lgt.wdt", presence::build_lgt()),
        ("_occ.wdt", occlusion::build_occ(ctx)),
        (".wdl", height::build_wdl(ctx)),
    ];

    let mut written = Vec::with_capacity(tables.len());
    for (suffix, table) in tables {
        let path = ctx.table_path(suffix);
        table.save(&path)?;
        written.push(path);
    }
    Ok(written)
}
