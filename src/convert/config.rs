use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::terrain::next_gen::DEFAULT_BOUNDING_RADIUS;

/// Run configuration, built once from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Tile file or directory of tiles.
    pub input: PathBuf,
    /// Export root; derived from `input` when unset.
    pub output: Option<PathBuf>,
    pub verbose: bool,
    pub silent: bool,
    pub watch: bool,
    pub disable_tables: bool,
    pub next_gen: bool,
    pub bounding_box_radius: f32,
    #[serde(skip)]
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            verbose: false,
            silent: false,
            watch: false,
            disable_tables: false,
            next_gen: false,
            bounding_box_radius: DEFAULT_BOUNDING_RADIUS,
            json: false,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, PartialEq)]
pub enum Command {
    Run(Config),
    Help,
}

pub const USAGE: &str = "\
Usage:
  adt-convert <file|directory> [options]

Options:
  -o=<dir>, --output=<dir>   export directory
  -w, --watch                keep converting tiles that change in <directory>
  -v, --verbose              debug logging
  -s, --silent               no logging
  --no-tables                do not build .wdt/.wdl/.tex world tables
  --next-gen                 write level-of-detail object files (obj1)
  --bbox=<size>              bounding box size for next-gen objects (default 300)
  --json                     print a JSON run summary on stdout
  -h, --help                 show this help

Examples:
  adt-convert ./World/Maps/Azeroth
  adt-convert ./World/Maps/Azeroth/Azeroth_32_48.adt -o=./out
  adt-convert ./World/Maps/Azeroth --watch --next-gen";

impl Config {
    /// Parse `args` (without the program name).
    pub fn from_args(args: &[String]) -> Result<Command, String> {
        let mut config = Config::default();
        let mut input = None;

        for arg in args {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Command::Help),
                "-v" | "--verbose" => config.verbose = true,
                "-s" | "--silent" => config.silent = true,
                "-w" | "--watch" => config.watch = true,
                "--no-tables" => config.disable_tables = true,
                "--next-gen" => config.next_gen = true,
                "--json" => config.json = true,
                other => {
                    if let Some(dir) = other.strip_prefix("-o=").or_else(|| other.strip_prefix("--output=")) {
                        if dir.is_empty() {
                            return Err("--output requires a directory".to_string());
                        }
                        config.output = Some(PathBuf::from(dir));
                    } else if let Some(size) = other.strip_prefix("--bbox=") {
                        config.bounding_box_radius = size
                            .parse::<f32>()
                            .ok()
                            .filter(|v| v.is_finite() && *v > 0.0)
                            .ok_or_else(|| format!("Invalid bounding box size '{}'", size))?;
                    } else if other.starts_with('-') {
                        return Err(format!("Unknown option '{}'", other));
                    } else if input.is_none() {
                        input = Some(PathBuf::from(other));
                    } else {
                        return Err(format!("Unexpected argument '{}'", other));
                    }
                }
            }
        }

        config.input = input.ok_or_else(|| "No input file or directory given".to_string())?;
        Ok(Command::Run(config))
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.silent {
            LevelFilter::Off
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    pub fn input_is_dir(&self) -> bool {
        self.input.is_dir()
    }

    /// Directory the split files of `tile` are written to.
    ///
    /// Single file: `<output>` or `<tile dir>/export`. Directory: the
    /// tile's path relative to `input` is reproduced under `<output>` or
    /// under `<input>/../export`.
    pub fn export_dir_for(&self, tile: &Path) -> PathBuf {
        let tile_dir = tile.parent().unwrap_or_else(|| Path::new("."));

        if !self.input_is_dir() {
            return match &self.output {
                Some(out) => out.clone(),
                None => tile_dir.join("export"),
            };
        }

        let root = match &self.output {
            Some(out) => out.clone(),
            None => self.input.join("..").join("export"),
        };
        match tile_dir.strip_prefix(&self.input) {
            Ok(relative) => root.join(relative),
            Err(_) => root,
        }
    }
}
