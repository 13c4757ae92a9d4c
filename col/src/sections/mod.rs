//! Fixed-layout records shared by every COL version.
//!
//! Each record type lists its on-disk fields per [`Layout`]. Version 1 files use the
//! legacy layouts; versions 2, 3 and 4 share the modern ones. The field list drives
//! [`Section::size`], and each record reads and writes its fields in that order.

mod cursor;
mod records;

use std::mem;

pub use cursor::{SectionReader, SectionWriter};
pub use records::{Bounds, ColBox, Face, FaceGroup, Sphere, Surface, Vertex};

use crate::{
    consts::ColVersion,
    error::{ColError, Result},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Layout {
    Legacy,
    Modern,
}

/// One on-disk field of a record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Field {
    /// Three `f32` components.
    Vector,
    /// An embedded [`Surface`].
    Surface,
    F32,
    U8,
    U16,
    I16,
    U32,
}

impl Field {
    pub const fn size(self) -> usize {
        match self {
            Field::Vector => 3 * mem::size_of::<f32>(),
            Field::Surface => mem::size_of::<Surface>(),
            Field::F32 => mem::size_of::<f32>(),
            Field::U8 => mem::size_of::<u8>(),
            Field::U16 => mem::size_of::<u16>(),
            Field::I16 => mem::size_of::<i16>(),
            Field::U32 => mem::size_of::<u32>(),
        }
    }
}

pub fn packed_size(fields: &[Field]) -> usize {
    fields.iter().map(|f| f.size()).sum()
}

pub trait Section: Sized {
    /// Record name used in error reports.
    const NAME: &'static str;

    fn fields(layout: Layout) -> &'static [Field];

    fn read(reader: &mut SectionReader<'_>) -> Result<Self>;

    fn write(&self, writer: &mut SectionWriter<'_>) -> Result<()>;

    fn size(layout: Layout) -> usize {
        packed_size(Self::fields(layout))
    }
}

/// Reads and writes records in the layout of one format version.
///
/// A codec is a plain value, so models of different versions can be decoded side by
/// side without sharing any state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SectionCodec {
    layout: Layout,
}

impl SectionCodec {
    pub const fn new(layout: Layout) -> Self {
        Self { layout }
    }

    pub const fn for_version(version: ColVersion) -> Self {
        Self::new(version.layout())
    }

    pub fn size_of<T: Section>(&self) -> usize {
        T::size(self.layout)
    }

    /// Decode one record at `offset`, returning it with the offset just past it.
    pub fn decode<T: Section>(&self, data: &[u8], offset: usize) -> Result<(T, usize)> {
        let size = self.size_of::<T>();
        let bytes = data
            .get(offset..)
            .and_then(|rest| rest.get(..size))
            .ok_or(ColError::MalformedRecord {
                record: T::NAME,
                offset,
                needed: size,
                available: data.len().saturating_sub(offset),
            })?;

        let mut reader = SectionReader::new(bytes, offset, self.layout, T::NAME);
        let record = T::read(&mut reader)?;
        debug_assert_eq!(reader.consumed(), size);

        Ok((record, offset + size))
    }

    /// Decode `count` consecutive records with no length prefix.
    pub fn decode_array<T: Section>(
        &self,
        data: &[u8],
        mut offset: usize,
        count: usize,
    ) -> Result<(Vec<T>, usize)> {
        let needed = count.saturating_mul(self.size_of::<T>());
        if data.len().saturating_sub(offset) < needed {
            return Err(ColError::MalformedRecord {
                record: T::NAME,
                offset,
                needed,
                available: data.len().saturating_sub(offset),
            });
        }

        let mut records = Vec::with_capacity(count);
        for _ in 0..count {
            let (record, next) = self.decode(data, offset)?;
            records.push(record);
            offset = next;
        }
        Ok((records, offset))
    }

    pub fn encode<T: Section>(&self, record: &T) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.size_of::<T>());
        self.encode_into(record, &mut out)?;
        Ok(out)
    }

    pub fn encode_into<T: Section>(&self, record: &T, out: &mut Vec<u8>) -> Result<()> {
        let start = out.len();
        record.write(&mut SectionWriter::new(out, self.layout))?;
        debug_assert_eq!(out.len() - start, self.size_of::<T>());
        Ok(())
    }

    pub fn encode_array<T: Section>(&self, records: &[T], out: &mut Vec<u8>) -> Result<()> {
        out.reserve(records.len() * self.size_of::<T>());
        for record in records {
            self.encode_into(record, out)?;
        }
        Ok(())
    }
}
