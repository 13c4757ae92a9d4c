use glam::Vec3;

use crate::error::{ColError, Result};

use super::{Layout, Section};

/// Little-endian reads over the bytes of a single record.
pub struct SectionReader<'a> {
    data: &'a [u8],
    /// Offset of `data[0]` within the containing buffer, for error reports.
    origin: usize,
    pos: usize,
    layout: Layout,
    record: &'static str,
}

impl<'a> SectionReader<'a> {
    pub fn new(data: &'a [u8], origin: usize, layout: Layout, record: &'static str) -> Self {
        Self {
            data,
            origin,
            pos: 0,
            layout,
            record,
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn consumed(&self) -> usize {
        self.pos
    }

    pub fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self
            .data
            .get(self.pos..)
            .and_then(|rest| rest.get(..N))
            .ok_or(ColError::MalformedRecord {
                record: self.record,
                offset: self.origin + self.pos,
                needed: N,
                available: self.data.len().saturating_sub(self.pos),
            })?;

        let mut out = [0; N];
        out.copy_from_slice(bytes);
        self.pos += N;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(u8::from_le_bytes(self.take()?))
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.take()?))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.take()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.take()?))
    }

    pub fn read_vector(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(self.read_f32()?, self.read_f32()?, self.read_f32()?))
    }

    /// Read an embedded record in the same layout.
    pub fn read_section<T: Section>(&mut self) -> Result<T> {
        T::read(self)
    }
}

/// Little-endian writes appended to an output buffer.
pub struct SectionWriter<'a> {
    out: &'a mut Vec<u8>,
    layout: Layout,
}

impl<'a> SectionWriter<'a> {
    pub fn new(out: &'a mut Vec<u8>, layout: Layout) -> Self {
        Self { out, layout }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.out.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_vector(&mut self, value: Vec3) {
        self.write_f32(value.x);
        self.write_f32(value.y);
        self.write_f32(value.z);
    }

    pub fn write_section<T: Section>(&mut self, record: &T) -> Result<()> {
        record.write(self)
    }
}
