//! Root file builder: MVER, MHDR, MH2O, the rebuilt MCNK records carrying
//! geometry only, and MFBO.

use std::io::{Read, Seek, SeekFrom};

use log::{debug, info};

use super::header::McnkHeader;
use super::liquid::copy_liquid;
use super::rewriter::{copy_normals, copy_subchunk, for_each_record};
use crate::chunk::cursor::{read_up_to, seek_chunk};
use crate::chunk::{ChunkCatalog, ChunkWriter, Tag, CHUNK_HEADER_SIZE};
use crate::convert::error::{ConvertError, Result};

/// Top-level chunks copied from the source before MHDR.
pub const ROOT_PASSTHROUGH: [Tag; 1] = [Tag::MVER];

/// Geometry sub-chunks kept in root records, in output order.
pub const ROOT_SUBCHUNKS: [Tag; 3] = [Tag::MCVT, Tag::MCLV, Tag::MCCV];

pub const MHDR_SIZE: usize = 64;

// MHDR field offsets, relative to the MHDR payload
const MHDR_FLAGS: u64 = 0;
const MHDR_OFS_MFBO: u64 = 36;
const MHDR_OFS_MH2O: u64 = 40;

const MHDR_FLAG_HAS_MFBO: u32 = 0x1;

/// Flight bounds written when the source has none: a 3x3 ceiling at 900
/// followed by a 3x3 floor at -150.
pub fn default_flight_bounds() -> Vec<u8> {
    let mut out = Vec::with_capacity(36);
    for _ in 0..9 {
        out.extend_from_slice(&900i16.to_le_bytes());
    }
    for _ in 0..9 {
        out.extend_from_slice(&(-150i16).to_le_bytes());
    }
    out
}

pub struct RootOutput {
    pub writer: ChunkWriter,
    pub records: usize,
    /// Any converted record carried an MCCV offset.
    pub has_vertex_colors: bool,
    pub liquid_repaired: bool,
}

pub fn build_root<R: Read + Seek>(
    input: &mut R,
    catalog: &ChunkCatalog,
    scan_start: u64,
) -> Result<RootOutput> {
    let mut out = ChunkWriter::new();
    catalog.write_passthrough(&mut out, &ROOT_PASSTHROUGH);

    let mhdr_at = out.position();
    out.write_chunk(Tag::MHDR, &[0u8; MHDR_SIZE]);
    let mhdr_payload = mhdr_at + CHUNK_HEADER_SIZE;

    let liquid = copy_liquid(input, &mut out)?;

    let mut has_vertex_colors = false;
    let records = for_each_record(input, &mut out, scan_start, |input, out, ctx| {
        has_vertex_colors |= ctx.header.has_vertex_colors();

        out.write_bytes(&McnkHeader::for_root(&ctx.header).encode()?);
        for tag in ROOT_SUBCHUNKS {
            copy_subchunk(input, out, ctx, tag)?;
        }
        copy_normals(input, out, ctx)?;
        copy_subchunk(input, out, ctx, Tag::MCSE)?;
        Ok(())
    })?;
    info!("Rebuilt {} root records", records);

    // Same start as the record walk, so a repaired MH2O is not skipped by
    // its declared size.
    out.seek_end();
    input.seek(SeekFrom::Start(scan_start))?;
    let mfbo_at = match seek_chunk(input, Tag::MFBO, false)? {
        Some(size) => {
            let at = out.position();
            let payload = read_up_to(input, size as usize)?;
            if payload.len() < size as usize {
                return Err(ConvertError::structural(
                    Tag::MFBO,
                    input.stream_position()? - payload.len() as u64 - CHUNK_HEADER_SIZE,
                    format!("declares {} bytes but only {} remain", size, payload.len()),
                ));
            }
            out.write_chunk(Tag::MFBO, &payload);
            Some(at)
        }
        None => {
            debug!("No MFBO in source, writing default flight bounds");
            out.write_chunk(Tag::MFBO, &default_flight_bounds());
            None
        }
    };

    // Offsets point at the chunk tag, relative to the MHDR payload. A chunk
    // that did not exist in the source stays unreferenced.
    let flags = if mfbo_at.is_some() { MHDR_FLAG_HAS_MFBO } else { 0 };
    out.patch_u32(mhdr_payload + MHDR_FLAGS, flags);
    if let Some(at) = mfbo_at {
        out.patch_u32(mhdr_payload + MHDR_OFS_MFBO, (at - mhdr_payload) as u32);
    }
    if let Some((at, _)) = liquid {
        out.patch_u32(mhdr_payload + MHDR_OFS_MH2O, (at - mhdr_payload) as u32);
    }

    Ok(RootOutput {
        writer: out,
        records,
        has_vertex_colors,
        liquid_repaired: liquid.is_some_and(|(_, span)| span.repaired),
    })
}
