use std::{fmt, mem};

use crate::consts::{ColVersion, MODEL_NAME_LEN};

/// Read a plain-old-data struct at `offset`, or `None` if the buffer is too short.
pub fn read_pod<T: bytemuck::Pod>(data: &[u8], offset: usize) -> Option<T> {
    data.get(offset..)
        .and_then(|rest| rest.get(..mem::size_of::<T>()))
        .map(bytemuck::pod_read_unaligned)
}

/// Fixed header in front of every model.
#[repr(C, packed)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ColHeader {
    pub magic: [u8; 4],
    /// Byte count of everything after `magic` and `size`.
    pub size: u32,
    pub name: [u8; MODEL_NAME_LEN],
    pub model_id: u16,
}

pub const COL_HEADER_SIZE: usize = mem::size_of::<ColHeader>();

impl ColHeader {
    pub fn new(version: ColVersion, name: &str, model_id: u16, size: u32) -> Self {
        Self {
            magic: version.magic(),
            size: size.to_le(),
            name: name_to_slot(name),
            model_id: model_id.to_le(),
        }
    }

    pub fn read(data: &[u8], offset: usize) -> Option<Self> {
        read_pod::<Self>(data, offset).map(|h| Self {
            size: u32::from_le(h.size),
            model_id: u16::from_le(h.model_id),
            ..h
        })
    }

    pub fn version(&self) -> Option<ColVersion> {
        ColVersion::from_magic(self.magic)
    }

    pub fn name(&self) -> String {
        let name = self.name;
        name_from_slot(&name)
    }
}

impl fmt::Debug for ColHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.size;
        let model_id = self.model_id;
        f.debug_struct("ColHeader")
            .field("magic", &String::from_utf8_lossy(&self.magic))
            .field("size", &size)
            .field("name", &self.name())
            .field("model_id", &model_id)
            .finish()
    }
}

/// Counts and block offsets following the bounds of a version 2+ model.
/// Offsets are relative to the start of the model's header.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModernHeader {
    pub sphere_count: u16,
    pub box_count: u16,
    pub face_count: u16,
    pub line_count: u8,
    pub(crate) _pad: u8,
    pub flags: u32,
    pub spheres_offset: u32,
    pub boxes_offset: u32,
    pub lines_offset: u32,
    pub verts_offset: u32,
    pub faces_offset: u32,
    /// Never read.
    pub triangles_offset: u32,
}

impl ModernHeader {
    /// Swaps every multi-byte field between little-endian and native order.
    /// The operation is its own inverse.
    pub fn swap_le(self) -> Self {
        Self {
            sphere_count: u16::from_le(self.sphere_count),
            box_count: u16::from_le(self.box_count),
            face_count: u16::from_le(self.face_count),
            flags: u32::from_le(self.flags),
            spheres_offset: u32::from_le(self.spheres_offset),
            boxes_offset: u32::from_le(self.boxes_offset),
            lines_offset: u32::from_le(self.lines_offset),
            verts_offset: u32::from_le(self.verts_offset),
            faces_offset: u32::from_le(self.faces_offset),
            triangles_offset: u32::from_le(self.triangles_offset),
            ..self
        }
    }
}

/// Shadow mesh extension present from version 3.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowHeader {
    pub face_count: u32,
    pub verts_offset: u32,
    pub faces_offset: u32,
}

impl ShadowHeader {
    pub fn swap_le(self) -> Self {
        Self {
            face_count: u32::from_le(self.face_count),
            verts_offset: u32::from_le(self.verts_offset),
            faces_offset: u32::from_le(self.faces_offset),
        }
    }
}

/// Size of the secondary header block, including the version 3 shadow extension
/// and the 4 reserved bytes of version 4.
pub fn modern_header_size(version: ColVersion) -> usize {
    let mut size = mem::size_of::<ModernHeader>();
    if version.supports_shadow_mesh() {
        size += mem::size_of::<ShadowHeader>();
    }
    if version == ColVersion::Col4 {
        size += mem::size_of::<u32>();
    }
    size
}

/// Name up to the first NUL. Non-ASCII bytes are dropped.
pub fn name_from_slot(slot: &[u8]) -> String {
    slot.iter()
        .take_while(|&&b| b != 0)
        .filter(|b| b.is_ascii())
        .map(|&b| b as char)
        .collect()
}

pub fn name_to_slot(name: &str) -> [u8; MODEL_NAME_LEN] {
    let bytes = name.as_bytes();
    if bytes.len() > MODEL_NAME_LEN {
        log::warn!("model name {name:?} is longer than {MODEL_NAME_LEN} bytes, truncating");
    }

    let mut slot = [0; MODEL_NAME_LEN];
    let len = bytes.len().min(MODEL_NAME_LEN);
    slot[..len].copy_from_slice(&bytes[..len]);
    slot
}
