//! MH2O copy with recovery for tiles whose liquid chunk size was miswritten
//! by third-party water tools.

use std::io::{Read, Seek, SeekFrom};

use log::info;

use crate::chunk::cursor::{read_bytes, seek_any_of, seek_chunk, stream_len};
use crate::chunk::{ChunkWriter, Tag};
use crate::convert::error::Result;

/// Top-level tags that can follow MH2O; the first one found after a broken
/// MH2O marks where its payload really ends.
pub const LIQUID_END_MARKERS: [Tag; 4] = [Tag::MVER, Tag::MHDR, Tag::MFBO, Tag::MCNK];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidSpan {
    pub payload_start: u64,
    pub size: u32,
    pub repaired: bool,
}

impl LiquidSpan {
    pub fn end(&self) -> u64 {
        self.payload_start + self.size as u64
    }
}

/// Find the MH2O payload. A declared size that runs past the end of the
/// stream is replaced by the distance to the next known top-level tag (or
/// to the end of the stream when none follows).
pub fn locate_liquid<R: Read + Seek>(input: &mut R) -> Result<Option<LiquidSpan>> {
    let Some(declared) = seek_chunk(input, Tag::MH2O, true)? else {
        return Ok(None);
    };
    let payload_start = input.stream_position()?;
    let len = stream_len(input)?;

    if payload_start + declared as u64 <= len {
        return Ok(Some(LiquidSpan {
            payload_start,
            size: declared,
            repaired: false,
        }));
    }

    let end = match seek_any_of(input, &LIQUID_END_MARKERS, false, 0)? {
        Some((_, tag_start)) => tag_start,
        None => len,
    };
    Ok(Some(LiquidSpan {
        payload_start,
        size: (end - payload_start) as u32,
        repaired: true,
    }))
}

/// Copy MH2O (repaired when needed) to `output`. Returns the output offset
/// of the written chunk's tag together with the span that was copied.
pub fn copy_liquid<R: Read + Seek>(
    input: &mut R,
    output: &mut ChunkWriter,
) -> Result<Option<(u64, LiquidSpan)>> {
    let Some(span) = locate_liquid(input)? else {
        return Ok(None);
    };

    if span.repaired {
        info!("Fix MH2O chunk ({} bytes recovered)", span.size);
    } else {
        info!("Copy MH2O chunk");
    }

    input.seek(SeekFrom::Start(span.payload_start))?;
    let payload = read_bytes(input, span.size as usize)?;

    let offset = output.position();
    output.write_chunk(Tag::MH2O, &payload);
    Ok(Some((offset, span)))
}

/// Offset to start walking top-level chunks from when looking for MCNKs.
/// Header-skipping past a broken MH2O would jump over every record, so
/// the walk resumes after the repaired span instead.
pub fn record_scan_start<R: Read + Seek>(input: &mut R) -> Result<u64> {
    Ok(match locate_liquid(input)? {
        Some(span) if span.repaired => span.end(),
        _ => 0,
    })
}
