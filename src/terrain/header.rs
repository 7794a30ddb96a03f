use std::io::Cursor;

use binrw::{binrw, BinRead, BinWrite};

use crate::convert::error::Result;

/// Size of the fixed MCNK header that precedes the sub-chunks.
pub const MCNK_HEADER_SIZE: u64 = 128;

/// Header offset of the doodad reference count.
pub const DOODAD_REF_COUNT_OFFSET: usize = 0x10;
/// Header offset of the map object (WMO) reference count.
pub const MAP_OBJ_REF_COUNT_OFFSET: usize = 0x38;

/// MCNK header, 128 bytes. Sub-chunk offsets are relative to the start of
/// the MCNK chunk (its tag) and are zero when the sub-chunk is absent.
///
/// ```text
/// 0x00 flags               0x40 low_quality_texture_map[16]
/// 0x04 index_x             0x50 pred_tex
/// 0x08 index_y             0x54 no_effect_doodad
/// 0x0C layer_count         0x58 ofs_sound_emitters
/// 0x10 doodad_ref_count    0x5C sound_emitter_count
/// 0x14 ofs_height (MCVT)   0x60 ofs_liquid
/// 0x18 ofs_normal (MCNR)   0x64 size_liquid
/// 0x1C ofs_layer  (MCLY)   0x68 position[3]
/// 0x20 ofs_refs   (MCRF)   0x74 ofs_mccv
/// 0x24 ofs_alpha  (MCAL)   0x78 ofs_mclv
/// 0x28 size_alpha          0x7C unused
/// 0x2C ofs_shadow (MCSH)
/// 0x30 size_shadow
/// 0x34 area_id
/// 0x38 map_obj_ref_count
/// 0x3C holes_low_res (u16), 0x3E unknown_but_used (u16)
/// ```
#[binrw]
#[derive(Debug, Clone, Default, PartialEq)]
#[brw(little)]
pub struct McnkHeader {
    pub flags: u32,
    pub index_x: u32,
    pub index_y: u32,
    pub layer_count: u32,
    pub doodad_ref_count: u32,
    pub ofs_height: u32,
    pub ofs_normal: u32,
    pub ofs_layer: u32,
    pub ofs_refs: u32,
    pub ofs_alpha: u32,
    pub size_alpha: u32,
    pub ofs_shadow: u32,
    pub size_shadow: u32,
    pub area_id: u32,
    pub map_obj_ref_count: u32,
    pub holes_low_res: u16,
    pub unknown_but_used: u16,
    pub low_quality_texture_map: [u8; 16],
    pub pred_tex: u32,
    pub no_effect_doodad: u32,
    pub ofs_sound_emitters: u32,
    pub sound_emitter_count: u32,
    pub ofs_liquid: u32,
    pub size_liquid: u32,
    pub position: [f32; 3],
    pub ofs_mccv: u32,
    pub ofs_mclv: u32,
    pub unused: u32,
}

impl McnkHeader {
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(Self::read(&mut Cursor::new(bytes))?)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(MCNK_HEADER_SIZE as usize));
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Header as stored in the split root file: sub-chunks are laid out
    /// linearly there, so every structural offset and count is zeroed.
    pub fn for_root(&self) -> Self {
        Self {
            flags: self.flags,
            index_x: self.index_x,
            index_y: self.index_y,
            area_id: self.area_id,
            holes_low_res: self.holes_low_res,
            unknown_but_used: self.unknown_but_used,
            low_quality_texture_map: self.low_quality_texture_map,
            pred_tex: self.pred_tex,
            no_effect_doodad: self.no_effect_doodad,
            ofs_sound_emitters: self.ofs_sound_emitters,
            sound_emitter_count: self.sound_emitter_count,
            ofs_liquid: self.ofs_liquid,
            size_liquid: self.size_liquid,
            position: self.position,
            ofs_mccv: self.ofs_mccv,
            ofs_mclv: self.ofs_mclv,
            ..Self::default()
        }
    }

    pub fn has_vertex_colors(&self) -> bool {
        self.ofs_mccv > 0
    }

    /// Elevation every MCVT sample is relative to.
    pub fn base_height(&self) -> f32 {
        self.position[2]
    }
}
