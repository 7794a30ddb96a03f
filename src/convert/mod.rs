//! Conversion of legacy tiles into split files, one tile at a time.
//!
//! For each tile: root, tex0/tex1 and obj0/obj1 are written in that order,
//! then the world tables when the tile starts a new world. The first
//! failing step stops the tile; files written by earlier steps stay.

pub mod config;
pub mod error;
pub mod watch;

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::chunk::cursor::seek_chunk;
use crate::chunk::{ChunkCatalog, ChunkWriter, Tag};
use crate::terrain::liquid::record_scan_start;
use crate::terrain::{build_next_gen_objects, build_objects, build_root, build_texture};
use crate::world::{base_name, build_world_tables, WorldContext};
use config::Config;
use error::{ConvertError, Result};

/// Chunks a legacy monolithic tile must have.
pub const REQUIRED_CHUNKS: [Tag; 3] = [Tag::MVER, Tag::MHDR, Tag::MCIN];

/// Result of converting one tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileReport {
    pub tile: String,
    pub outputs: Vec<String>,
    pub records: usize,
    pub has_vertex_colors: bool,
    pub liquid_repaired: bool,
    /// World tables written because this tile started a new world.
    pub world_tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedTile {
    pub tile: String,
    pub error: String,
}

/// Result of a whole run.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub converted: usize,
    pub failed: usize,
    pub tiles: Vec<TileReport>,
    pub failures: Vec<FailedTile>,
}

impl RunSummary {
    fn record(&mut self, tile: &Path, result: Result<TileReport>) {
        match result {
            Ok(report) => {
                self.converted += 1;
                self.tiles.push(report);
            }
            Err(e) => {
                self.failed += 1;
                self.failures.push(FailedTile {
                    tile: tile.display().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }
}

/// Every `*.adt` below `dir`, sorted by path.
pub fn list_tiles(dir: &Path) -> Vec<PathBuf> {
    let mut tiles: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("adt"))
        })
        .map(|e| e.into_path())
        .collect();
    tiles.sort();
    tiles
}

fn validate(input: &mut Cursor<&[u8]>, tile: &Path) -> Result<()> {
    for tag in REQUIRED_CHUNKS {
        if seek_chunk(input, tag, true)?.is_none() {
            return Err(ConvertError::InvalidFormat(format!(
                "{} has no {} chunk, not a legacy tile",
                tile.display(),
                tag
            )));
        }
    }
    Ok(())
}

pub struct Converter<'a> {
    config: &'a Config,
    /// Tiles of the current batch, used to fill the world tables.
    tiles: Vec<PathBuf>,
    world_name: Option<String>,
    world_has_vertex_colors: bool,
    last_report: Option<TileReport>,
}

impl<'a> Converter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            tiles: Vec::new(),
            world_name: None,
            world_has_vertex_colors: false,
            last_report: None,
        }
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    pub fn set_tiles(&mut self, tiles: Vec<PathBuf>) {
        self.tiles = tiles;
    }

    pub fn last_report(&self) -> Option<&TileReport> {
        self.last_report.as_ref()
    }

    /// Convert one tile, logging any failure. Returns whether it succeeded.
    pub fn convert(&mut self, tile: &Path) -> bool {
        match self.convert_tile(tile) {
            Ok(report) => {
                self.last_report = Some(report);
                true
            }
            Err(e) => {
                error!("{}: {}", tile.display(), e);
                self.last_report = None;
                false
            }
        }
    }

    pub fn convert_tile(&mut self, tile: &Path) -> Result<TileReport> {
        info!("Convert {}", tile.display());
        let data = fs::read(tile)?;
        let mut input = Cursor::new(data.as_slice());

        validate(&mut input, tile)?;
        let catalog = ChunkCatalog::load(&mut input)?;
        let scan_start = record_scan_start(&mut input)?;

        let export_dir = self.config.export_dir_for(tile);
        fs::create_dir_all(&export_dir)?;
        let stem = tile
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let mut outputs = Vec::new();
        let mut save = |writer: &ChunkWriter, suffix: &str| -> Result<()> {
            let path = export_dir.join(format!("{}{}.adt", stem, suffix));
            writer.save(&path)?;
            outputs.push(path.display().to_string());
            Ok(())
        };

        info!("Create root");
        let root = build_root(&mut input, &catalog, scan_start)?;
        save(&root.writer, "")?;

        info!("Create tex0");
        let texture = build_texture(&mut input, &catalog, scan_start)?;
        save(&texture, "_tex0")?;
        if !self.config.next_gen {
            save(&texture, "_tex1")?;
        }

        info!("Create obj0");
        let objects = build_objects(&mut input, &catalog, scan_start)?;
        save(&objects, "_obj0")?;
        if self.config.next_gen {
            info!("Create next-gen obj1");
            let lod = build_next_gen_objects(&catalog, self.config.bounding_box_radius)?;
            save(&lod, "_obj1")?;
        } else {
            save(&objects, "_obj1")?;
        }

        // The tile's own files are written; a table failure is logged and
        // retried at the next tile of the same world.
        let mut world_tables = Vec::new();
        if self.config.input_is_dir() {
            let base = base_name(tile);
            if self.world_name.as_deref() != Some(base.as_str()) {
                self.world_has_vertex_colors = root.has_vertex_colors;
                match self.build_tables(tile) {
                    Ok(written) => {
                        self.world_name = Some(base);
                        world_tables = written;
                    }
                    Err(e) => error!("World tables for {}: {}", base, e),
                }
            }
        }

        Ok(TileReport {
            tile: tile.display().to_string(),
            outputs,
            records: root.records,
            has_vertex_colors: root.has_vertex_colors,
            liquid_repaired: root.liquid_repaired,
            world_tables: world_tables.iter().map(|p| p.display().to_string()).collect(),
        })
    }

    /// Write the world tables of the world `tile` belongs to. No-op when
    /// tables are disabled.
    pub fn build_tables(&self, tile: &Path) -> Result<Vec<PathBuf>> {
        if self.config.disable_tables {
            return Ok(Vec::new());
        }
        let base = base_name(tile);
        let export_dir = self.config.export_dir_for(tile);
        fs::create_dir_all(&export_dir)?;

        let ctx = WorldContext {
            base_name: &base,
            export_dir: &export_dir,
            tiles: &self.tiles,
            has_vertex_colors: self.world_has_vertex_colors,
            next_gen: self.config.next_gen,
        };
        build_world_tables(&ctx)
    }

    /// Convert the configured file, or every tile of the configured
    /// directory. In directory mode a failing tile is logged and skipped.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        if !self.config.input_is_dir() {
            let input = self.config.input.clone();
            let report = self.convert_tile(&input)?;
            summary.record(&input, Ok(report));
            return Ok(summary);
        }

        let tiles = list_tiles(&self.config.input);
        if tiles.is_empty() {
            warn!("No .adt files found in {}", self.config.input.display());
        }
        self.tiles = tiles.clone();

        for tile in &tiles {
            let result = self.convert_tile(tile);
            match &result {
                Err(e) if e.is_fatal() => error!("{}: {}", tile.display(), e),
                Err(e) => warn!("Skip {}: {}", tile.display(), e),
                Ok(_) => {}
            }
            summary.record(tile, result);
        }

        info!(
            "Converted {} tiles, {} failed",
            summary.converted, summary.failed
        );
        Ok(summary)
    }
}
