//! Fixed-size placement records (MDDF, MODF) and the derived records the
//! next-gen object layout needs.

use std::io::Cursor;

use binrw::{binrw, BinRead, BinWrite};
use cgmath::{Array, Vector3};

use crate::chunk::{ChunkWriter, Tag};
use crate::convert::error::{ConvertError, Result};

/// Placement positions are stored as `MAP_EXTENT - coordinate` on the
/// first axis.
pub const MAP_EXTENT: f32 = 17066.0;

pub fn flip_axis(v: f32) -> f32 {
    MAP_EXTENT - v
}

/// A record with a fixed on-disk size.
pub trait FixedRecord: Sized {
    const STRIDE: usize;

    fn decode_one(cursor: &mut Cursor<&[u8]>) -> binrw::BinResult<Self>;
    fn encode_one(&self, out: &mut ChunkWriter) -> binrw::BinResult<()>;
}

/// Decode a whole chunk payload of `T`. A payload that is not an exact
/// multiple of the stride is rejected; `position` is the chunk's source
/// offset, used in the error.
pub fn decode_records<T: FixedRecord>(payload: &[u8], tag: Tag, position: u64) -> Result<Vec<T>> {
    if payload.len() % T::STRIDE != 0 {
        return Err(ConvertError::structural(
            tag,
            position,
            format!("{} bytes is not a multiple of the {} byte record", payload.len(), T::STRIDE),
        ));
    }
    let mut cursor = Cursor::new(payload);
    (0..payload.len() / T::STRIDE)
        .map(|_| T::decode_one(&mut cursor).map_err(ConvertError::from))
        .collect()
}

/// Write `records` as one chunk.
pub fn write_records<T: FixedRecord>(out: &mut ChunkWriter, tag: Tag, records: &[T]) -> Result<()> {
    out.write_header(tag, (records.len() * T::STRIDE) as u32);
    for record in records {
        record.encode_one(out)?;
    }
    Ok(())
}

macro_rules! fixed_record {
    ($ty:ty, $stride:expr) => {
        impl FixedRecord for $ty {
            const STRIDE: usize = $stride;

            fn decode_one(cursor: &mut Cursor<&[u8]>) -> binrw::BinResult<Self> {
                Self::read(cursor)
            }

            fn encode_one(&self, out: &mut ChunkWriter) -> binrw::BinResult<()> {
                self.write(out)
            }
        }
    };
}

/// MDDF entry, 36 bytes.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq)]
#[brw(little)]
pub struct DoodadPlacement {
    pub name_id: u32,
    pub unique_id: u32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    /// 1024 = 1.0
    pub scale: u16,
    pub flags: u16,
}

/// MODF entry, 64 bytes.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq)]
#[brw(little)]
pub struct ObjectPlacement {
    pub name_id: u32,
    pub unique_id: u32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    /// Lower then upper corner of the placed object's bounds.
    pub extents: [f32; 6],
    pub flags: u16,
    pub doodad_set: u16,
    pub name_set: u16,
    pub scale: u16,
}

/// MLMD entry: an MODF entry without its extents, 40 bytes.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq)]
#[brw(little)]
pub struct StrippedObjectPlacement {
    pub name_id: u32,
    pub unique_id: u32,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub flags: u16,
    pub doodad_set: u16,
    pub name_set: u16,
    pub scale: u16,
}

impl From<&ObjectPlacement> for StrippedObjectPlacement {
    fn from(p: &ObjectPlacement) -> Self {
        Self {
            name_id: p.name_id,
            unique_id: p.unique_id,
            position: p.position,
            rotation: p.rotation,
            flags: p.flags,
            doodad_set: p.doodad_set,
            name_set: p.name_set,
            scale: p.scale,
        }
    }
}

/// MLDX / MLMX entry: axis-aligned box plus radius, 28 bytes.
#[binrw]
#[derive(Debug, Clone, Copy, PartialEq)]
#[brw(little)]
pub struct BoundingRecord {
    #[br(map = |raw: [f32; 3]| Vector3::new(raw[0], raw[1], raw[2]))]
    #[bw(map = |v: &Vector3<f32>| [v.x, v.y, v.z])]
    pub min: Vector3<f32>,
    #[br(map = |raw: [f32; 3]| Vector3::new(raw[0], raw[1], raw[2]))]
    #[bw(map = |v: &Vector3<f32>| [v.x, v.y, v.z])]
    pub max: Vector3<f32>,
    pub radius: f32,
}

impl BoundingRecord {
    /// Cube of edge `radius` centred on a placement position, with the
    /// first axis flipped into terrain space.
    pub fn around(position: [f32; 3], radius: f32) -> Self {
        let center = Vector3::new(flip_axis(position[0]), position[1], position[2]);
        let half = Vector3::from_value(radius / 2.0);
        Self {
            min: center - half,
            max: center + half,
            radius,
        }
    }
}

fixed_record!(DoodadPlacement, 36);
fixed_record!(ObjectPlacement, 64);
fixed_record!(StrippedObjectPlacement, 40);
fixed_record!(BoundingRecord, 28);

#[cfg(test)]
mod tests {
    use super::*;

    fn object(unique_id: u32, x: f32) -> ObjectPlacement {
        ObjectPlacement {
            name_id: 1,
            unique_id,
            position: [x, 50.0, 200.0],
            rotation: [0.0, 90.0, 0.0],
            extents: [1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            flags: 0x2,
            doodad_set: 3,
            name_set: 0,
            scale: 1024,
        }
    }

    #[test]
    fn strides_match_encoded_sizes() {
        let mut out = ChunkWriter::new();
        object(1, 0.0).encode_one(&mut out).unwrap();
        assert_eq!(out.len() as usize, ObjectPlacement::STRIDE);

        let mut out = ChunkWriter::new();
        StrippedObjectPlacement::from(&object(1, 0.0)).encode_one(&mut out).unwrap();
        assert_eq!(out.len() as usize, StrippedObjectPlacement::STRIDE);

        let mut out = ChunkWriter::new();
        BoundingRecord::around([0.0; 3], 300.0).encode_one(&mut out).unwrap();
        assert_eq!(out.len() as usize, BoundingRecord::STRIDE);
    }

    #[test]
    fn decode_rejects_partial_records() {
        let err = decode_records::<DoodadPlacement>(&[0u8; 37], Tag::MDDF, 0x40).unwrap_err();
        assert!(matches!(err, ConvertError::Structural { tag, position: 0x40, .. } if tag == Tag::MDDF));
        assert!(decode_records::<DoodadPlacement>(&[], Tag::MDDF, 0).unwrap().is_empty());
    }

    #[test]
    fn stripping_drops_only_extents() {
        let mut out = ChunkWriter::new();
        write_records(&mut out, Tag::MODF, &[object(9, 100.0)]).unwrap();
        let full = out.into_inner();

        let mut out = ChunkWriter::new();
        write_records(&mut out, Tag::MLMD, &[StrippedObjectPlacement::from(&object(9, 100.0))]).unwrap();
        let stripped = out.into_inner();

        // Skip chunk headers; the 24 bytes of extents sit at 32..56.
        assert_eq!(&full[8..8 + 32], &stripped[8..8 + 32]);
        assert_eq!(&full[8 + 56..], &stripped[8 + 32..]);
    }

    #[test]
    fn flip_is_an_involution() {
        for v in [0.0f32, 1.5, 8533.0, 17066.0, -20.0] {
            assert_eq!(flip_axis(flip_axis(v)), v);
        }
    }

    #[test]
    fn bounds_are_symmetric_around_flipped_position() {
        let b = BoundingRecord::around([1066.0, 10.0, -4.0], 300.0);
        assert_eq!((b.min + b.max) / 2.0, Vector3::new(16000.0, 10.0, -4.0));
        assert_eq!(b.max - b.min, Vector3::from_value(300.0));
        assert_eq!(b.radius, 300.0);
    }
}
