//! tex0 builder: texture tables plus per-record layers, shadows, alpha maps
//! and material ids.

use std::io::{Read, Seek};

use log::debug;

use super::rewriter::{copy_subchunk, for_each_record};
use crate::chunk::{ChunkCatalog, ChunkWriter, Tag};
use crate::convert::error::Result;

pub const TEXTURE_PASSTHROUGH: [Tag; 3] = [Tag::MVER, Tag::MAMP, Tag::MTEX];

pub const TEXTURE_SUBCHUNKS: [Tag; 4] = [Tag::MCLY, Tag::MCSH, Tag::MCAL, Tag::MCMT];

pub fn build_texture<R: Read + Seek>(
    input: &mut R,
    catalog: &ChunkCatalog,
    scan_start: u64,
) -> Result<ChunkWriter> {
    let mut out = ChunkWriter::new();
    catalog.write_passthrough(&mut out, &TEXTURE_PASSTHROUGH);
    if !catalog.contains(Tag::MAMP) {
        debug!("No MAMP in source, writing empty one");
        out.write_chunk(Tag::MAMP, &[0u8; 4]);
    }

    for_each_record(input, &mut out, scan_start, |input, out, ctx| {
        for tag in TEXTURE_SUBCHUNKS {
            let copied = copy_subchunk(input, out, ctx, tag)?;
            if !copied && tag == Tag::MCMT {
                out.write_chunk(Tag::MCMT, &[0u8; 4]);
            }
        }
        Ok(())
    })?;

    Ok(out)
}
