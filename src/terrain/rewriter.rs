//! Shared walk over a tile's MCNK records.
//!
//! Every split file carries one MCNK per source record, each rebuilt from a
//! subset of the source sub-chunks. The walk, the 8-byte header and the
//! size back-patch are the same for all of them; what goes into the body is
//! up to the caller.

use std::io::{Read, Seek, SeekFrom};

use log::debug;

use super::header::{McnkHeader, MCNK_HEADER_SIZE};
use crate::chunk::cursor::{read_bytes, read_u32, read_up_to, seek_chunk, seek_subchunk};
use crate::chunk::{ChunkWriter, Tag, CHUNK_HEADER_SIZE};
use crate::convert::error::{ConvertError, Result};

/// MCNR payload: 145 packed normals (435 bytes) plus 13 bytes of padding.
pub const NORMALS_SIZE: usize = 448;

/// Where one source MCNK lives and what its header says.
#[derive(Debug, Clone)]
pub struct RecordContext {
    /// Offset of the record's tag in the source.
    pub start: u64,
    /// First byte after the declared payload; sub-chunk scans stop here.
    pub end: u64,
    pub header: McnkHeader,
}

impl RecordContext {
    /// Offset of the first byte after the fixed header.
    pub fn body_start(&self) -> u64 {
        self.start + CHUNK_HEADER_SIZE + MCNK_HEADER_SIZE
    }
}

/// Visit every non-empty MCNK of `input`, walking top-level chunks from
/// `scan_start`. After each visit the cursor moves to the record's declared
/// end. Returns the number of records visited.
pub fn walk_records<R, F>(input: &mut R, scan_start: u64, mut visit: F) -> Result<usize>
where
    R: Read + Seek,
    F: FnMut(&mut R, &RecordContext) -> Result<()>,
{
    input.seek(SeekFrom::Start(scan_start))?;

    let mut count = 0;
    while let Some(size) = seek_chunk(input, Tag::MCNK, false)? {
        let payload_start = input.stream_position()?;
        let start = payload_start - CHUNK_HEADER_SIZE;
        let end = payload_start + size as u64;

        if size == 0 {
            continue;
        }
        if (size as u64) < MCNK_HEADER_SIZE {
            return Err(ConvertError::structural(
                Tag::MCNK,
                start,
                format!("record of {} bytes cannot hold its {} byte header", size, MCNK_HEADER_SIZE),
            ));
        }

        let raw = read_up_to(input, MCNK_HEADER_SIZE as usize)?;
        if raw.len() < MCNK_HEADER_SIZE as usize {
            return Err(ConvertError::structural(Tag::MCNK, start, "header truncated by end of file"));
        }
        let ctx = RecordContext {
            start,
            end,
            header: McnkHeader::decode(&raw)?,
        };

        visit(input, &ctx)?;

        input.seek(SeekFrom::Start(end))?;
        count += 1;
    }

    Ok(count)
}

/// Rebuild every non-empty MCNK of `input` into `output`.
///
/// For each record an MCNK header with a placeholder size is written,
/// `visit` fills the body, and the size is patched to the number of bytes
/// actually written after the header. Returns the number of records
/// emitted.
pub fn for_each_record<R, F>(
    input: &mut R,
    output: &mut ChunkWriter,
    scan_start: u64,
    mut visit: F,
) -> Result<usize>
where
    R: Read + Seek,
    F: FnMut(&mut R, &mut ChunkWriter, &RecordContext) -> Result<()>,
{
    output.seek_end();
    walk_records(input, scan_start, |input, ctx| {
        output.write_header(Tag::MCNK, 0);
        let body_start = output.position();
        visit(input, output, ctx)?;

        output.seek_end();
        let new_size = (output.position() - body_start) as u32;
        output.patch_u32(output.position() - new_size as u64 - 4, new_size);
        debug!(
            "MCNK {},{}: {} -> {} bytes",
            ctx.header.index_x,
            ctx.header.index_y,
            ctx.end - ctx.start - CHUNK_HEADER_SIZE,
            new_size
        );
        Ok(())
    })
}

/// Locate `tag` inside the record body. On success the cursor is at the
/// sub-chunk payload and its tag offset and declared size are returned.
pub fn find_subchunk<R: Read + Seek>(
    input: &mut R,
    ctx: &RecordContext,
    tag: Tag,
) -> Result<Option<(u64, u32)>> {
    input.seek(SeekFrom::Start(ctx.body_start()))?;
    let Some(tag_start) = seek_subchunk(input, tag, false, ctx.end)? else {
        return Ok(None);
    };
    match read_u32(input) {
        Ok(size) => Ok(Some((tag_start, size))),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(ConvertError::structural(
            tag,
            tag_start,
            "size field truncated by end of file",
        )),
        Err(e) => Err(e.into()),
    }
}

/// Read the full payload of sub-chunk `tag`, if present.
pub fn read_subchunk<R: Read + Seek>(
    input: &mut R,
    ctx: &RecordContext,
    tag: Tag,
) -> Result<Option<(u64, Vec<u8>)>> {
    let Some((tag_start, size)) = find_subchunk(input, ctx, tag)? else {
        return Ok(None);
    };
    let payload = read_up_to(input, size as usize)?;
    if payload.len() < size as usize {
        return Err(ConvertError::structural(
            tag,
            tag_start,
            format!("declares {} bytes but only {} remain", size, payload.len()),
        ));
    }
    Ok(Some((tag_start, payload)))
}

/// Copy sub-chunk `tag` verbatim. Returns whether it was present.
pub fn copy_subchunk<R: Read + Seek>(
    input: &mut R,
    output: &mut ChunkWriter,
    ctx: &RecordContext,
    tag: Tag,
) -> Result<bool> {
    let Some((_, payload)) = read_subchunk(input, ctx, tag)? else {
        return Ok(false);
    };
    output.write_chunk(tag, &payload);
    Ok(true)
}

/// Copy MCNR with its payload forced to [`NORMALS_SIZE`]. The declared size
/// is ignored (some exporters leave the padding out); a short read is
/// padded with zeros.
pub fn copy_normals<R: Read + Seek>(
    input: &mut R,
    output: &mut ChunkWriter,
    ctx: &RecordContext,
) -> Result<bool> {
    if find_subchunk(input, ctx, Tag::MCNR)?.is_none() {
        return Ok(false);
    }
    let mut payload = read_up_to(input, NORMALS_SIZE)?;
    payload.resize(NORMALS_SIZE, 0);
    output.write_chunk(Tag::MCNR, &payload);
    Ok(true)
}

/// 145 height samples of a record, if its MCVT can be found.
///
/// The header offset is tried first; when it does not point at an MCVT the
/// body is scanned instead.
pub fn read_heights<R: Read + Seek>(input: &mut R, ctx: &RecordContext) -> Result<Option<Vec<f32>>> {
    const SAMPLES: usize = 145;

    let ofs = ctx.header.ofs_height as u64;
    let mut located = false;
    if ofs >= CHUNK_HEADER_SIZE + MCNK_HEADER_SIZE && ctx.start + ofs + CHUNK_HEADER_SIZE <= ctx.end {
        input.seek(SeekFrom::Start(ctx.start + ofs))?;
        let tag = read_bytes(input, 4)?;
        if Tag::from_disk_bytes([tag[0], tag[1], tag[2], tag[3]]) == Tag::MCVT {
            input.seek(SeekFrom::Current(4))?;
            located = true;
        }
    }
    if !located && find_subchunk(input, ctx, Tag::MCVT)?.is_none() {
        return Ok(None);
    }

    let raw = read_up_to(input, SAMPLES * 4)?;
    if raw.len() < SAMPLES * 4 {
        return Ok(None);
    }
    Ok(Some(
        raw.chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn raw_chunk(tag: Tag, payload: &[u8]) -> Vec<u8> {
        let mut out = tag.disk_bytes().to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn record(body: &[u8]) -> Vec<u8> {
        let mut payload = vec![0u8; MCNK_HEADER_SIZE as usize];
        payload.extend_from_slice(body);
        raw_chunk(Tag::MCNK, &payload)
    }

    #[test]
    fn records_are_resized_to_what_the_visitor_wrote() {
        let mut data = raw_chunk(Tag::MVER, &18u32.to_le_bytes());
        data.extend(record(&raw_chunk(Tag::MCSE, &[1, 2, 3])));
        data.extend(raw_chunk(Tag::MCNK, &[]));
        data.extend(record(&raw_chunk(Tag::MCLY, &[4; 16])));
        let mut input = Cursor::new(data);

        let mut out = ChunkWriter::new();
        let count = for_each_record(&mut input, &mut out, 0, |input, out, ctx| {
            copy_subchunk(input, out, ctx, Tag::MCSE)?;
            Ok(())
        })
        .unwrap();

        // Empty records are dropped; the second record has no MCSE.
        assert_eq!(count, 2);
        let mut expected = raw_chunk(Tag::MCNK, &raw_chunk(Tag::MCSE, &[1, 2, 3]));
        expected.extend(raw_chunk(Tag::MCNK, &[]));
        assert_eq!(out.into_inner(), expected);
    }

    #[test]
    fn subchunk_scan_stops_at_record_end() {
        let mut data = record(&[]);
        data.extend(record(&raw_chunk(Tag::MCSH, &[1; 8])));
        let mut input = Cursor::new(data);

        let mut found = Vec::new();
        for_each_record(&mut input, &mut ChunkWriter::new(), 0, |input, _, ctx| {
            found.push(find_subchunk(input, ctx, Tag::MCSH)?.is_some());
            Ok(())
        })
        .unwrap();
        assert_eq!(found, vec![false, true]);
    }

    #[test]
    fn normals_are_padded_to_fixed_size() {
        let data = record(&raw_chunk(Tag::MCNR, &[7; 435]));
        let mut input = Cursor::new(data);

        let mut out = ChunkWriter::new();
        for_each_record(&mut input, &mut out, 0, |input, out, ctx| {
            assert!(copy_normals(input, out, ctx)?);
            Ok(())
        })
        .unwrap();

        let bytes = out.into_inner();
        // MCNK header + MCNR header + fixed payload
        assert_eq!(bytes.len(), 8 + 8 + NORMALS_SIZE);
        assert_eq!(u32::from_le_bytes(bytes[12..16].try_into().unwrap()), NORMALS_SIZE as u32);
        assert!(bytes[16..16 + 435].iter().all(|&b| b == 7));
        assert!(bytes[16 + 435..].iter().all(|&b| b == 0));
    }

    #[test]
    fn short_record_is_structural() {
        let data = raw_chunk(Tag::MCNK, &[0; 20]);
        let err = for_each_record(&mut Cursor::new(data), &mut ChunkWriter::new(), 0, |_, _, _| Ok(()))
            .unwrap_err();
        assert!(matches!(err, ConvertError::Structural { tag, .. } if tag == Tag::MCNK));
    }

    #[test]
    fn heights_follow_header_offset() {
        let heights: Vec<u8> = (0..145).flat_map(|i| (i as f32).to_le_bytes()).collect();
        let mut body = raw_chunk(Tag::MCSE, &[0; 4]);
        let mcvt_ofs = (8 + MCNK_HEADER_SIZE as usize + body.len()) as u32;
        body.extend(raw_chunk(Tag::MCVT, &heights));

        let mut payload = vec![0u8; MCNK_HEADER_SIZE as usize];
        payload[0x14..0x18].copy_from_slice(&mcvt_ofs.to_le_bytes());
        payload.extend(body);
        let mut input = Cursor::new(raw_chunk(Tag::MCNK, &payload));

        let mut seen = None;
        walk_records(&mut input, 0, |input, ctx| {
            seen = read_heights(input, ctx)?;
            Ok(())
        })
        .unwrap();
        let seen = seen.unwrap();
        assert_eq!(seen.len(), 145);
        assert_eq!(seen[144], 144.0);
    }
}
