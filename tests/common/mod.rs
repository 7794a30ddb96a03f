// Synthetic legacy tiles and helpers to pick split outputs apart
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// Chunk with its tag stored reversed, as on disk.
pub fn chunk(tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    chunk_with_size(tag, payload.len() as u32, payload)
}

pub fn chunk_with_size(tag: &[u8; 4], size: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![tag[3], tag[2], tag[1], tag[0]];
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

pub fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(bytes[at..at + 4].try_into().unwrap())
}

pub fn read_i16(bytes: &[u8], at: usize) -> i16 {
    i16::from_le_bytes(bytes[at..at + 2].try_into().unwrap())
}

/// One source MCNK.
#[derive(Clone)]
pub struct RecordSpec {
    pub doodad_refs: u32,
    pub object_refs: u32,
    /// Raw MCRF payload; `None` writes `4 * (doodads + objects)` bytes.
    pub refs: Option<Vec<u8>>,
    pub vertex_colors: bool,
    pub base_height: f32,
    /// Value of every MCVT sample.
    pub height: f32,
    pub material_ids: bool,
}

impl Default for RecordSpec {
    fn default() -> Self {
        Self {
            doodad_refs: 0,
            object_refs: 0,
            refs: None,
            vertex_colors: false,
            base_height: 0.0,
            height: 0.0,
            material_ids: true,
        }
    }
}

impl RecordSpec {
    pub fn build(&self, index: u32) -> Vec<u8> {
        let mut body = chunk(b"MCVT", &vec![self.height; 145].iter().flat_map(|h| h.to_le_bytes()).collect::<Vec<u8>>());
        let mccv_ofs = if self.vertex_colors {
            let at = 8 + 128 + body.len() as u32;
            body.extend(chunk(b"MCCV", &[0x7F; 145 * 4]));
            at
        } else {
            0
        };
        body.extend(chunk(b"MCNR", &[0x11; 448]));
        body.extend(chunk(b"MCLY", &[0x22; 16]));
        let refs = match &self.refs {
            Some(raw) => raw.clone(),
            None => u32s(&(0..self.doodad_refs + self.object_refs).collect::<Vec<u32>>()),
        };
        body.extend(chunk(b"MCRF", &refs));
        body.extend(chunk(b"MCSH", &[0x33; 64]));
        body.extend(chunk(b"MCAL", &[0x44; 32]));
        if self.material_ids {
            body.extend(chunk(b"MCMT", &[1, 2, 3, 4]));
        }
        body.extend(chunk(b"MCSE", &[]));

        let mut header = vec![0u8; 128];
        header[0x04..0x08].copy_from_slice(&(index % 16).to_le_bytes());
        header[0x08..0x0C].copy_from_slice(&(index / 16).to_le_bytes());
        header[0x0C..0x10].copy_from_slice(&1u32.to_le_bytes());
        header[0x10..0x14].copy_from_slice(&self.doodad_refs.to_le_bytes());
        header[0x14..0x18].copy_from_slice(&(8u32 + 128).to_le_bytes());
        header[0x34..0x38].copy_from_slice(&12u32.to_le_bytes());
        header[0x38..0x3C].copy_from_slice(&self.object_refs.to_le_bytes());
        header[0x70..0x74].copy_from_slice(&self.base_height.to_le_bytes());
        header[0x74..0x78].copy_from_slice(&mccv_ofs.to_le_bytes());

        header.extend(body);
        chunk(b"MCNK", &header)
    }
}

/// Builder for a legacy monolithic tile.
#[derive(Clone, Default)]
pub struct TileBuilder {
    pub records: Vec<RecordSpec>,
    /// MH2O payload and an optional size to declare instead of its length.
    pub liquid: Option<(Vec<u8>, Option<u32>)>,
    pub flight_bounds: Option<Vec<u8>>,
    pub material_amplifier: bool,
    pub doodads: Vec<u8>,
    pub objects: Vec<u8>,
    pub skip_index: bool,
}

impl TileBuilder {
    pub fn with_records(records: Vec<RecordSpec>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn flat(count: usize, base_height: f32, height: f32) -> Self {
        let record = RecordSpec {
            base_height,
            height,
            ..RecordSpec::default()
        };
        Self::with_records(vec![record; count])
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = chunk(b"MVER", &18u32.to_le_bytes());
        out.extend(chunk(b"MHDR", &[0u8; 64]));
        if !self.skip_index {
            out.extend(chunk(b"MCIN", &[0u8; 16 * 4]));
        }
        out.extend(chunk(b"MTEX", b"tileset\\grass.blp\0"));
        if self.material_amplifier {
            out.extend(chunk(b"MAMP", &[5, 0, 0, 0]));
        }
        out.extend(chunk(b"MMDX", b"tree.m2\0"));
        out.extend(chunk(b"MMID", &u32s(&[0])));
        out.extend(chunk(b"MWMO", b"keep.wmo\0"));
        out.extend(chunk(b"MWID", &u32s(&[0])));
        out.extend(chunk(b"MDDF", &self.doodads));
        out.extend(chunk(b"MODF", &self.objects));
        if let Some((payload, declared)) = &self.liquid {
            let size = declared.unwrap_or(payload.len() as u32);
            out.extend(chunk_with_size(b"MH2O", size, payload));
        }
        for (i, record) in self.records.iter().enumerate() {
            out.extend(record.build(i as u32));
        }
        if let Some(bounds) = &self.flight_bounds {
            out.extend(chunk(b"MFBO", bounds));
        }
        out
    }

    pub fn write(&self, path: &Path) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, self.build()).unwrap();
        path.to_path_buf()
    }
}

/// `(tag, offset of tag, payload)` of every top-level chunk.
pub fn top_level(bytes: &[u8]) -> Vec<(String, usize, Vec<u8>)> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos + 8 <= bytes.len() {
        let tag: String = bytes[pos..pos + 4].iter().rev().map(|&b| b as char).collect();
        let size = read_u32(bytes, pos + 4) as usize;
        let end = (pos + 8 + size).min(bytes.len());
        out.push((tag, pos, bytes[pos + 8..end].to_vec()));
        pos += 8 + size;
    }
    out
}

pub fn tags(chunks: &[(String, usize, Vec<u8>)]) -> Vec<&str> {
    chunks.iter().map(|(t, _, _)| t.as_str()).collect()
}

pub fn payloads_of<'a>(chunks: &'a [(String, usize, Vec<u8>)], tag: &str) -> Vec<&'a [u8]> {
    chunks
        .iter()
        .filter(|(t, _, _)| t == tag)
        .map(|(_, _, p)| p.as_slice())
        .collect()
}

pub fn read_output(dir: &Path, name: &str) -> Vec<u8> {
    let path = dir.join(name);
    fs::read(&path).unwrap_or_else(|e| panic!("missing output {}: {}", path.display(), e))
}
