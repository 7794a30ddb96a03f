//! Seek and scan primitives over a chunk stream.
//!
//! Running out of input while scanning is the normal "not found" answer and
//! is reported as `Ok(None)`; only genuine I/O failures surface as errors.

use std::io::{self, Read, Seek, SeekFrom};

use super::Tag;

// ============================================================================
// Byte reading helpers
// ============================================================================

/// `read_exact` that reports a clean end of stream as `Ok(false)`.
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

pub fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn read_bytes<R: Read>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read at most `len` bytes, stopping early at end of stream.
pub fn read_up_to<R: Read>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len);
    reader.take(len as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Total length of the stream; the cursor position is preserved.
pub fn stream_len<R: Seek>(reader: &mut R) -> io::Result<u64> {
    let cur = reader.stream_position()?;
    let len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(cur))?;
    Ok(len)
}

// ============================================================================
// Scanners
// ============================================================================

/// Walk top-level chunks (`tag`, `size`, skip `size`) until `tag` is found.
///
/// On success the cursor is at the payload start and the declared payload
/// size is returned.
pub fn seek_chunk<R: Read + Seek>(
    reader: &mut R,
    tag: Tag,
    from_start: bool,
) -> io::Result<Option<u32>> {
    if from_start {
        reader.seek(SeekFrom::Start(0))?;
    }

    let target = tag.signature();
    let mut header = [0u8; 8];
    loop {
        if !read_exact_or_eof(reader, &mut header)? {
            return Ok(None);
        }
        let signature = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if signature == target {
            return Ok(Some(size));
        }
        reader.seek(SeekFrom::Current(size as i64))?;
    }
}

/// Byte-by-byte scan for the raw signature of `tag`.
///
/// `end_bound` (absolute offset, 0 = unbounded) limits the search: the tag
/// must lie entirely before it. On success returns the offset of the tag's
/// first byte and leaves the cursor right after the tag, at the size field.
pub fn seek_subchunk<R: Read + Seek>(
    reader: &mut R,
    tag: Tag,
    from_start: bool,
    end_bound: u64,
) -> io::Result<Option<u64>> {
    Ok(seek_any_of(reader, &[tag], from_start, end_bound)?.map(|(_, start)| start))
}

/// Same strategy as [`seek_subchunk`], matching any tag of `tags`.
pub fn seek_any_of<R: Read + Seek>(
    reader: &mut R,
    tags: &[Tag],
    from_start: bool,
    end_bound: u64,
) -> io::Result<Option<(Tag, u64)>> {
    if from_start {
        reader.seek(SeekFrom::Start(0))?;
    }

    let mut pos = reader.stream_position()?;
    let mut window = [0u8; 4];
    if !read_exact_or_eof(reader, &mut window)? {
        return Ok(None);
    }

    let mut next = [0u8; 1];
    loop {
        if end_bound > 0 && pos + 4 > end_bound {
            return Ok(None);
        }

        let found = Tag::from_disk_bytes(window);
        if tags.contains(&found) {
            return Ok(Some((found, pos)));
        }

        if !read_exact_or_eof(reader, &mut next)? {
            return Ok(None);
        }
        window.rotate_left(1);
        window[3] = next[0];
        pos += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn chunk(tag: Tag, payload: &[u8]) -> Vec<u8> {
        let mut out = tag.disk_bytes().to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn seek_chunk_lands_on_payload() {
        let mut data = chunk(Tag::MVER, &18u32.to_le_bytes());
        data.extend(chunk(Tag::MTEX, b"a.blp\0"));
        let mut cursor = Cursor::new(data.as_slice());

        let size = seek_chunk(&mut cursor, Tag::MTEX, true).unwrap();
        assert_eq!(size, Some(6));
        assert_eq!(cursor.position(), 12 + 8);
        assert_eq!(read_bytes(&mut cursor, 6).unwrap(), b"a.blp\0");
    }

    #[test]
    fn seek_chunk_missing_is_none() {
        let data = chunk(Tag::MVER, &18u32.to_le_bytes());
        let mut cursor = Cursor::new(data.as_slice());
        assert_eq!(seek_chunk(&mut cursor, Tag::MH2O, true).unwrap(), None);

        // Truncated trailing header is also just "not found".
        let mut data = chunk(Tag::MVER, &18u32.to_le_bytes());
        data.extend_from_slice(&Tag::MH2O.disk_bytes());
        let mut cursor = Cursor::new(data.as_slice());
        assert_eq!(seek_chunk(&mut cursor, Tag::MH2O, true).unwrap(), None);
    }

    #[test]
    fn seek_chunk_continues_from_current_position() {
        let mut data = chunk(Tag::MCNK, &[1, 2, 3, 4]);
        data.extend(chunk(Tag::MCNK, &[5, 6]));
        let mut cursor = Cursor::new(data.as_slice());

        assert_eq!(seek_chunk(&mut cursor, Tag::MCNK, false).unwrap(), Some(4));
        cursor.seek(SeekFrom::Current(4)).unwrap();
        assert_eq!(seek_chunk(&mut cursor, Tag::MCNK, false).unwrap(), Some(2));
        cursor.seek(SeekFrom::Current(2)).unwrap();
        assert_eq!(seek_chunk(&mut cursor, Tag::MCNK, false).unwrap(), None);
    }

    #[test]
    fn seek_subchunk_finds_unaligned_tags() {
        let mut data = vec![0xAAu8; 3];
        data.extend(chunk(Tag::MCVT, &[0; 4]));
        let mut cursor = Cursor::new(data.as_slice());

        assert_eq!(seek_subchunk(&mut cursor, Tag::MCVT, true, 0).unwrap(), Some(3));
        assert_eq!(cursor.position(), 7);
        assert_eq!(read_u32(&mut cursor).unwrap(), 4);
    }

    #[test]
    fn seek_subchunk_respects_end_bound() {
        let mut data = vec![0u8; 8];
        data.extend(chunk(Tag::MCSE, &[]));
        let mut cursor = Cursor::new(data.as_slice());

        assert_eq!(seek_subchunk(&mut cursor, Tag::MCSE, true, 10).unwrap(), None);
        assert_eq!(seek_subchunk(&mut cursor, Tag::MCSE, true, 12).unwrap(), Some(8));
    }

    #[test]
    fn seek_any_of_reports_which_tag_matched() {
        let mut data = vec![0x11u8; 5];
        data.extend(chunk(Tag::MFBO, &[0; 2]));
        data.extend(chunk(Tag::MCNK, &[]));
        let mut cursor = Cursor::new(data.as_slice());

        let found = seek_any_of(&mut cursor, &[Tag::MCNK, Tag::MFBO], true, 0).unwrap();
        assert_eq!(found, Some((Tag::MFBO, 5)));

        let none = seek_any_of(&mut cursor, &[Tag::MVER], true, 0).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn read_up_to_stops_at_eof() {
        let data = [1u8, 2, 3];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_up_to(&mut cursor, 10).unwrap(), vec![1, 2, 3]);
        assert_eq!(stream_len(&mut cursor).unwrap(), 3);
    }
}
