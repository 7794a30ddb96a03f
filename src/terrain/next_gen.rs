//! obj1 builder for the level-of-detail object layout: placement copies
//! (MLDD, MLMD) with per-placement bounding records (MLDX, MLMX).

use log::debug;

use super::placement::{
    decode_records, write_records, BoundingRecord, DoodadPlacement, ObjectPlacement,
    StrippedObjectPlacement,
};
use crate::chunk::{ChunkCatalog, ChunkWriter, Tag};
use crate::convert::error::Result;

pub const NEXT_GEN_PASSTHROUGH: [Tag; 5] = [Tag::MVER, Tag::MMDX, Tag::MMID, Tag::MWMO, Tag::MWID];

/// Edge length of the cube used when nothing better is known about a
/// placed model.
pub const DEFAULT_BOUNDING_RADIUS: f32 = 300.0;

/// Payload of `tag` and its source offset; empty when the tile has none.
fn payload(catalog: &ChunkCatalog, tag: Tag) -> (&[u8], u64) {
    catalog
        .get(tag)
        .map(|c| (c.payload.as_slice(), c.offset))
        .unwrap_or((&[], 0))
}

pub fn build_next_gen_objects(catalog: &ChunkCatalog, bounding_radius: f32) -> Result<ChunkWriter> {
    let mut out = ChunkWriter::new();
    catalog.write_passthrough(&mut out, &NEXT_GEN_PASSTHROUGH);

    let (mddf, mddf_at) = payload(catalog, Tag::MDDF);
    let doodads: Vec<DoodadPlacement> = decode_records(mddf, Tag::MDDF, mddf_at)?;
    if !mddf.is_empty() {
        out.write_chunk(Tag::MLDD, mddf);
    }
    let doodad_bounds: Vec<BoundingRecord> = doodads
        .iter()
        .map(|d| BoundingRecord::around(d.position, bounding_radius))
        .collect();
    write_records(&mut out, Tag::MLDX, &doodad_bounds)?;
    out.write_chunk(Tag::MLDL, &[]);

    let (modf, modf_at) = payload(catalog, Tag::MODF);
    let objects: Vec<ObjectPlacement> = decode_records(modf, Tag::MODF, modf_at)?;
    let stripped: Vec<StrippedObjectPlacement> = objects.iter().map(StrippedObjectPlacement::from).collect();
    if !stripped.is_empty() {
        write_records(&mut out, Tag::MLMD, &stripped)?;
    }
    let object_bounds: Vec<BoundingRecord> = stripped
        .iter()
        .map(|o| BoundingRecord::around(o.position, bounding_radius))
        .collect();
    write_records(&mut out, Tag::MLMX, &object_bounds)?;

    debug!(
        "Next-gen objects: {} doodads, {} map objects",
        doodads.len(),
        objects.len()
    );
    Ok(out)
}
