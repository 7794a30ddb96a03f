//! obj0 builder: model and placement tables plus per-record doodad and map
//! object references, split out of the combined MCRF list.

use std::io::{Read, Seek};

use super::rewriter::{copy_subchunk, for_each_record, read_subchunk};
use crate::chunk::{ChunkCatalog, ChunkWriter, Tag};
use crate::convert::error::{ConvertError, Result};

pub const OBJECT_PASSTHROUGH: [Tag; 7] = [
    Tag::MVER,
    Tag::MMDX,
    Tag::MMID,
    Tag::MWMO,
    Tag::MWID,
    Tag::MDDF,
    Tag::MODF,
];

/// Reference sub-chunks that may already be split in the source.
pub const OBJECT_SUBCHUNKS: [Tag; 2] = [Tag::MCRD, Tag::MCRW];

/// MCRF halves: doodad indices first, map object indices after.
#[derive(Debug, PartialEq, Eq)]
pub struct ReferenceSplit<'a> {
    pub doodads: &'a [u8],
    pub objects: &'a [u8],
}

/// Split a combined reference list of `u32` indices. `None` when the list
/// length is not exactly `4 * (doodad_count + object_count)`.
pub fn split_references(list: &[u8], doodad_count: u32, object_count: u32) -> Option<ReferenceSplit<'_>> {
    let doodad_bytes = doodad_count as u64 * 4;
    let expected = doodad_bytes + object_count as u64 * 4;
    if list.len() as u64 != expected {
        return None;
    }
    let (doodads, objects) = list.split_at(doodad_bytes as usize);
    Some(ReferenceSplit { doodads, objects })
}

pub fn build_objects<R: Read + Seek>(
    input: &mut R,
    catalog: &ChunkCatalog,
    scan_start: u64,
) -> Result<ChunkWriter> {
    let mut out = ChunkWriter::new();
    catalog.write_passthrough(&mut out, &OBJECT_PASSTHROUGH);

    for_each_record(input, &mut out, scan_start, |input, out, ctx| {
        for tag in OBJECT_SUBCHUNKS {
            copy_subchunk(input, out, ctx, tag)?;
        }

        let Some((at, list)) = read_subchunk(input, ctx, Tag::MCRF)? else {
            return Ok(());
        };
        let doodads = ctx.header.doodad_ref_count;
        let objects = ctx.header.map_obj_ref_count;
        let split = split_references(&list, doodads, objects).ok_or_else(|| {
            ConvertError::structural(
                Tag::MCRF,
                at,
                format!(
                    "{} bytes of references for {} doodads and {} map objects",
                    list.len(),
                    doodads,
                    objects
                ),
            )
        })?;

        out.write_chunk(Tag::MCRD, split.doodads);
        out.write_chunk(Tag::MCRW, split.objects);
        Ok(())
    })?;

    Ok(out)
}
