//! Converts legacy monolithic ADT terrain tiles into the split layout
//! (`.adt`, `_tex0/1.adt`, `_obj0/1.adt`) and builds the per-world tables
//! that go with it.

pub mod chunk;
pub mod convert;
pub mod terrain;
pub mod world;

pub use convert::config::Config;
pub use convert::error::{ConvertError, Result};
pub use convert::{Converter, RunSummary, TileReport};
