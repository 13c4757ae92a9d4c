use glam::Vec3;

use crate::{
    consts::FIXED_POINT_SCALE,
    error::{ColError, Result},
};

use super::{Field, Layout, Section, SectionReader, SectionWriter};

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Surface {
    pub material: u8,
    pub flags: u8,
    pub brightness: u8,
    pub light: u8,
}

impl Section for Surface {
    const NAME: &'static str = "surface";

    fn fields(_layout: Layout) -> &'static [Field] {
        &[Field::U8, Field::U8, Field::U8, Field::U8]
    }

    fn read(reader: &mut SectionReader<'_>) -> Result<Self> {
        Ok(bytemuck::pod_read_unaligned(&reader.take::<4>()?))
    }

    fn write(&self, writer: &mut SectionWriter<'_>) -> Result<()> {
        writer.write_bytes(bytemuck::bytes_of(self));
        Ok(())
    }
}

/// Bounding sphere and axis aligned box of a whole model.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bounds {
    pub radius: f32,
    pub center: Vec3,
    pub min: Vec3,
    pub max: Vec3,
}

impl Section for Bounds {
    const NAME: &'static str = "bounds";

    fn fields(layout: Layout) -> &'static [Field] {
        match layout {
            Layout::Legacy => &[Field::F32, Field::Vector, Field::Vector, Field::Vector],
            Layout::Modern => &[Field::Vector, Field::Vector, Field::Vector, Field::F32],
        }
    }

    fn read(reader: &mut SectionReader<'_>) -> Result<Self> {
        Ok(match reader.layout() {
            Layout::Legacy => {
                let radius = reader.read_f32()?;
                let center = reader.read_vector()?;
                let min = reader.read_vector()?;
                let max = reader.read_vector()?;
                Self {
                    radius,
                    center,
                    min,
                    max,
                }
            }
            Layout::Modern => {
                let min = reader.read_vector()?;
                let max = reader.read_vector()?;
                let center = reader.read_vector()?;
                let radius = reader.read_f32()?;
                Self {
                    radius,
                    center,
                    min,
                    max,
                }
            }
        })
    }

    fn write(&self, writer: &mut SectionWriter<'_>) -> Result<()> {
        match writer.layout() {
            Layout::Legacy => {
                writer.write_f32(self.radius);
                writer.write_vector(self.center);
                writer.write_vector(self.min);
                writer.write_vector(self.max);
            }
            Layout::Modern => {
                writer.write_vector(self.min);
                writer.write_vector(self.max);
                writer.write_vector(self.center);
                writer.write_f32(self.radius);
            }
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Sphere {
    pub radius: f32,
    pub center: Vec3,
    pub surface: Surface,
}

impl Section for Sphere {
    const NAME: &'static str = "sphere";

    fn fields(layout: Layout) -> &'static [Field] {
        match layout {
            Layout::Legacy => &[Field::F32, Field::Vector, Field::Surface],
            Layout::Modern => &[Field::Vector, Field::F32, Field::Surface],
        }
    }

    fn read(reader: &mut SectionReader<'_>) -> Result<Self> {
        let (radius, center) = match reader.layout() {
            Layout::Legacy => {
                let radius = reader.read_f32()?;
                (radius, reader.read_vector()?)
            }
            Layout::Modern => {
                let center = reader.read_vector()?;
                (reader.read_f32()?, center)
            }
        };
        Ok(Self {
            radius,
            center,
            surface: reader.read_section()?,
        })
    }

    fn write(&self, writer: &mut SectionWriter<'_>) -> Result<()> {
        match writer.layout() {
            Layout::Legacy => {
                writer.write_f32(self.radius);
                writer.write_vector(self.center);
            }
            Layout::Modern => {
                writer.write_vector(self.center);
                writer.write_f32(self.radius);
            }
        }
        writer.write_section(&self.surface)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ColBox {
    pub min: Vec3,
    pub max: Vec3,
    pub surface: Surface,
}

impl Section for ColBox {
    const NAME: &'static str = "box";

    fn fields(_layout: Layout) -> &'static [Field] {
        &[Field::Vector, Field::Vector, Field::Surface]
    }

    fn read(reader: &mut SectionReader<'_>) -> Result<Self> {
        Ok(Self {
            min: reader.read_vector()?,
            max: reader.read_vector()?,
            surface: reader.read_section()?,
        })
    }

    fn write(&self, writer: &mut SectionWriter<'_>) -> Result<()> {
        writer.write_vector(self.min);
        writer.write_vector(self.max);
        writer.write_section(&self.surface)
    }
}

/// Spatial bound over a run of faces, `start..=end`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FaceGroup {
    pub min: Vec3,
    pub max: Vec3,
    pub start: u16,
    pub end: u16,
}

impl Section for FaceGroup {
    const NAME: &'static str = "face group";

    fn fields(_layout: Layout) -> &'static [Field] {
        &[Field::Vector, Field::Vector, Field::U16, Field::U16]
    }

    fn read(reader: &mut SectionReader<'_>) -> Result<Self> {
        Ok(Self {
            min: reader.read_vector()?,
            max: reader.read_vector()?,
            start: reader.read_u16()?,
            end: reader.read_u16()?,
        })
    }

    fn write(&self, writer: &mut SectionWriter<'_>) -> Result<()> {
        writer.write_vector(self.min);
        writer.write_vector(self.max);
        writer.write_u16(self.start);
        writer.write_u16(self.end);
        Ok(())
    }
}

/// A mesh vertex as stored on disk.
///
/// Legacy vertices are plain floats. Modern vertices are fixed point: the components
/// hold whole `i16` values, see [`Vertex::compress`] and [`Vertex::decompress`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vertex(pub Vec3);

impl Vertex {
    /// Quantize a position into fixed-point units, saturating at the `i16` range.
    pub fn compress(position: Vec3) -> Self {
        let scaled = (position * FIXED_POINT_SCALE).round();
        if scaled.is_nan() {
            // Left for the encoder to reject.
            return Self(scaled);
        }
        let clamped = scaled.clamp(Vec3::splat(i16::MIN as f32), Vec3::splat(i16::MAX as f32));
        if clamped != scaled {
            log::warn!("vertex {position} is outside the fixed-point range, clamping");
        }
        Self(clamped)
    }

    pub fn decompress(self) -> Vec3 {
        self.0 / FIXED_POINT_SCALE
    }
}

fn fixed_component(value: f32) -> Result<i16> {
    let rounded = value.round();
    if !(i16::MIN as f32..=i16::MAX as f32).contains(&rounded) {
        return Err(ColError::invalid(
            Vertex::NAME,
            format!("component {value} does not fit a 16 bit fixed-point value"),
        ));
    }
    Ok(rounded as i16)
}

impl Section for Vertex {
    const NAME: &'static str = "vertex";

    fn fields(layout: Layout) -> &'static [Field] {
        match layout {
            Layout::Legacy => &[Field::F32, Field::F32, Field::F32],
            Layout::Modern => &[Field::I16, Field::I16, Field::I16],
        }
    }

    fn read(reader: &mut SectionReader<'_>) -> Result<Self> {
        Ok(Self(match reader.layout() {
            Layout::Legacy => reader.read_vector()?,
            Layout::Modern => Vec3::new(
                reader.read_i16()? as f32,
                reader.read_i16()? as f32,
                reader.read_i16()? as f32,
            ),
        }))
    }

    fn write(&self, writer: &mut SectionWriter<'_>) -> Result<()> {
        match writer.layout() {
            Layout::Legacy => writer.write_vector(self.0),
            Layout::Modern => {
                for component in self.0.to_array() {
                    writer.write_i16(fixed_component(component)?);
                }
            }
        }
        Ok(())
    }
}

/// A mesh triangle.
///
/// Modern faces only carry the material and light bytes of the surface; the other
/// two read back as zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Face {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub surface: Surface,
}

impl Face {
    pub fn indices(&self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }

    pub fn max_index(&self) -> u32 {
        self.a.max(self.b).max(self.c)
    }
}

fn narrow_index(index: u32) -> Result<u16> {
    u16::try_from(index).map_err(|_| {
        ColError::invalid(
            Face::NAME,
            format!("vertex index {index} does not fit a 16 bit face"),
        )
    })
}

impl Section for Face {
    const NAME: &'static str = "face";

    fn fields(layout: Layout) -> &'static [Field] {
        match layout {
            Layout::Legacy => &[Field::U32, Field::U32, Field::U32, Field::Surface],
            Layout::Modern => &[Field::U16, Field::U16, Field::U16, Field::U8, Field::U8],
        }
    }

    fn read(reader: &mut SectionReader<'_>) -> Result<Self> {
        Ok(match reader.layout() {
            Layout::Legacy => Self {
                a: reader.read_u32()?,
                b: reader.read_u32()?,
                c: reader.read_u32()?,
                surface: reader.read_section()?,
            },
            Layout::Modern => {
                let a = reader.read_u16()? as u32;
                let b = reader.read_u16()? as u32;
                let c = reader.read_u16()? as u32;
                let material = reader.read_u8()?;
                let light = reader.read_u8()?;
                Self {
                    a,
                    b,
                    c,
                    surface: Surface {
                        material,
                        light,
                        ..Default::default()
                    },
                }
            }
        })
    }

    fn write(&self, writer: &mut SectionWriter<'_>) -> Result<()> {
        match writer.layout() {
            Layout::Legacy => {
                writer.write_u32(self.a);
                writer.write_u32(self.b);
                writer.write_u32(self.c);
                writer.write_section(&self.surface)?;
            }
            Layout::Modern => {
                for index in self.indices() {
                    writer.write_u16(narrow_index(index)?);
                }
                writer.write_u8(self.surface.material);
                writer.write_u8(self.surface.light);
            }
        }
        Ok(())
    }
}
