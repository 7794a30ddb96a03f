//! Splitting of a monolithic ADT tile into root, texture and object files.

pub mod header;
pub mod liquid;
pub mod next_gen;
pub mod object;
pub mod placement;
pub mod rewriter;
pub mod root;
pub mod texture;

pub use header::McnkHeader;
pub use next_gen::build_next_gen_objects;
pub use object::build_objects;
pub use root::{build_root, RootOutput};
pub use texture::build_texture;
