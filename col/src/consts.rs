use flagset::{flags, FlagSet};
use num_derive::FromPrimitive;

use crate::sections::Layout;

/// Width of the magic tag plus the `u32` size field that opens every model.
/// The declared size counts everything after these bytes.
pub const FRAME_OVERHEAD: usize = 8;

/// Length of the fixed model name slot in the header.
pub const MODEL_NAME_LEN: usize = 22;

/// Modern vertices are stored as `round(value * 128)` in an `i16`.
pub const FIXED_POINT_SCALE: f32 = 128.0;

/// Every offset-addressed block is preceded by a `u32` element count.
pub const BLOCK_COUNT_SIZE: usize = 4;

/// Byte width of one compressed vertex, used to derive the shadow vertex count.
pub const COMPRESSED_VERTEX_SIZE: usize = 6;

/// The three bytes every versioned magic starts with.
pub const MAGIC_PREFIX: &[u8; 3] = b"COL";

/// Name and id given to a model synthesized for a headerless buffer.
pub const HEADERLESS_NAME: &str = "col";

#[derive(Copy, Clone, FromPrimitive, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColVersion {
    Coll = 1,
    Col2 = 2,
    Col3 = 3,
    Col4 = 4,
}

impl ColVersion {
    pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
        match &magic {
            b"COLL" => Some(Self::Coll),
            b"COL2" => Some(Self::Col2),
            b"COL3" => Some(Self::Col3),
            b"COL4" => Some(Self::Col4),
            _ => None,
        }
    }

    pub const fn magic(self) -> [u8; 4] {
        match self {
            Self::Coll => *b"COLL",
            Self::Col2 => *b"COL2",
            Self::Col3 => *b"COL3",
            Self::Col4 => *b"COL4",
        }
    }

    pub const fn number(self) -> u32 {
        self as u32
    }

    /// Version 1 uses the legacy record layouts, everything after it the modern ones.
    pub const fn layout(self) -> Layout {
        match self {
            Self::Coll => Layout::Legacy,
            Self::Col2 | Self::Col3 | Self::Col4 => Layout::Modern,
        }
    }

    pub fn supports_shadow_mesh(self) -> bool {
        self >= Self::Col3
    }
}

flags! {
    #[repr(u32)]
    pub enum ColFlag: u32 {
        NotEmpty    = 0x02,
        FaceGroups  = 0x08,
        ShadowMesh  = 0x10,
    }
}

/// Interpret a raw flags word, ignoring bits without a known meaning.
pub fn col_flags(bits: u32) -> FlagSet<ColFlag> {
    FlagSet::new_truncated(bits)
}
