use std::mem;

use crate::{
    config::ColConfig,
    consts::{
        ColFlag, ColVersion, BLOCK_COUNT_SIZE, COMPRESSED_VERTEX_SIZE, FRAME_OVERHEAD,
        HEADERLESS_NAME, MAGIC_PREFIX,
    },
    error::{ColError, Result},
    header::{read_pod, ColHeader, ModernHeader, ShadowHeader, COL_HEADER_SIZE},
    model::{vertex_count_from_faces, ColModel},
    sections::{Bounds, Face, FaceGroup, Section, SectionCodec, Vertex},
};

/// Where one model sits in the buffer.
struct Frame {
    version: ColVersion,
    name: String,
    model_id: u16,
    /// Declared byte count after the magic and size fields.
    size: usize,
    body_start: usize,
}

/// Cursor over a buffer of concatenated models.
pub struct ColReader<'a> {
    data: &'a [u8],
    pos: usize,
    headerless_fallback: bool,
}

impl<'a> ColReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_config(data, &ColConfig::default())
    }

    pub fn with_config(data: &'a [u8], config: &ColConfig) -> Self {
        Self {
            data,
            pos: 0,
            headerless_fallback: config.headerless_fallback,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Decode the model at the cursor, then move the cursor to the end of the model's
    /// declared frame, whether or not every byte in it was used.
    pub fn read_model(&mut self) -> Result<ColModel> {
        let pos = self.pos;
        let frame = self.read_frame(pos)?;
        let codec = SectionCodec::for_version(frame.version);

        log::debug!(
            "reading {:?} model {:?} ({}) at {pos:#x}, {} bytes",
            frame.version,
            frame.name,
            frame.model_id,
            frame.size
        );

        let mut model = ColModel::new(frame.version, frame.name, frame.model_id);
        let (bounds, body) = codec.decode::<Bounds>(self.data, frame.body_start)?;
        model.bounds = bounds;

        match frame.version {
            ColVersion::Coll => self.read_legacy_body(&codec, &mut model, body)?,
            ColVersion::Col2 | ColVersion::Col3 | ColVersion::Col4 => {
                self.read_modern_body(&codec, &mut model, pos, body)?
            }
        }

        self.pos = pos
            .saturating_add(frame.size)
            .saturating_add(FRAME_OVERHEAD);
        Ok(model)
    }

    fn read_frame(&self, pos: usize) -> Result<Frame> {
        let available = self.data.len().saturating_sub(pos);

        if pos == 0 && self.headerless_fallback && !self.data.starts_with(MAGIC_PREFIX) {
            // Bare model body with no header: it spans the whole buffer.
            let needed = Bounds::size(ColVersion::Coll.layout());
            if available < needed {
                return Err(ColError::UnexpectedEndOfInput {
                    offset: pos,
                    needed,
                    available,
                });
            }
            return Ok(Frame {
                version: ColVersion::Coll,
                name: HEADERLESS_NAME.to_owned(),
                model_id: 0,
                size: available.saturating_sub(FRAME_OVERHEAD),
                body_start: pos,
            });
        }

        let header = ColHeader::read(self.data, pos).ok_or(ColError::UnexpectedEndOfInput {
            offset: pos,
            needed: COL_HEADER_SIZE,
            available,
        })?;

        let version = header.version().ok_or(ColError::UnknownFormat {
            offset: pos,
            magic: header.magic,
        })?;

        Ok(Frame {
            version,
            name: header.name(),
            model_id: header.model_id,
            size: header.size as usize,
            body_start: pos + COL_HEADER_SIZE,
        })
    }

    fn read_count(&self, offset: usize, record: &'static str) -> Result<usize> {
        let bytes = self
            .data
            .get(offset..)
            .and_then(|rest| rest.get(..BLOCK_COUNT_SIZE))
            .ok_or(ColError::MalformedRecord {
                record,
                offset,
                needed: BLOCK_COUNT_SIZE,
                available: self.data.len().saturating_sub(offset),
            })?;

        let mut count = [0; BLOCK_COUNT_SIZE];
        count.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(count) as usize)
    }

    /// A `u32` count followed by that many records.
    fn read_counted_block<T: Section>(
        &self,
        codec: &SectionCodec,
        offset: usize,
    ) -> Result<(Vec<T>, usize)> {
        let count = self.read_count(offset, T::NAME)?;
        codec.decode_array(self.data, offset + BLOCK_COUNT_SIZE, count)
    }

    fn read_legacy_body(
        &self,
        codec: &SectionCodec,
        model: &mut ColModel,
        offset: usize,
    ) -> Result<()> {
        let (spheres, offset) = self.read_counted_block(codec, offset)?;
        // unused
        let offset = offset + mem::size_of::<u32>();
        let (boxes, offset) = self.read_counted_block(codec, offset)?;
        let (verts, offset) = self.read_counted_block::<Vertex>(codec, offset)?;
        let (faces, _) = self.read_counted_block(codec, offset)?;

        model.spheres = spheres;
        model.boxes = boxes;
        model.mesh_verts = verts.into_iter().map(|v| v.0).collect();
        model.mesh_faces = faces;
        Ok(())
    }

    fn read_modern_body(
        &self,
        codec: &SectionCodec,
        model: &mut ColModel,
        pos: usize,
        offset: usize,
    ) -> Result<()> {
        let version = model.version();
        let header = read_pod::<ModernHeader>(self.data, offset)
            .ok_or(self.truncated_header::<ModernHeader>(offset))?
            .swap_le();

        let shadow_at = offset + mem::size_of::<ModernHeader>();
        let shadow = if version.supports_shadow_mesh() {
            Some(
                read_pod::<ShadowHeader>(self.data, shadow_at)
                    .ok_or(self.truncated_header::<ShadowHeader>(shadow_at))?
                    .swap_le(),
            )
        } else {
            None
        };

        model.flags = header.flags;

        // Block data follows a count word at `pos + offset`.
        let block = |offset: u32| pos + offset as usize + BLOCK_COUNT_SIZE;

        (model.spheres, _) =
            codec.decode_array(self.data, block(header.spheres_offset), header.sphere_count as usize)?;
        (model.boxes, _) =
            codec.decode_array(self.data, block(header.boxes_offset), header.box_count as usize)?;

        if model.col_flags().contains(ColFlag::FaceGroups) {
            model.face_groups = self.read_face_groups(codec, pos + header.faces_offset as usize)?;
        }

        (model.mesh_faces, _) =
            codec.decode_array(self.data, block(header.faces_offset), header.face_count as usize)?;

        let vertex_count = vertex_count_from_faces(&model.mesh_faces);
        model.mesh_verts = self.read_compressed_verts(codec, block(header.verts_offset), vertex_count)?;

        if let Some(shadow) = shadow.filter(|_| model.has_shadow_mesh()) {
            let vertex_count = shadow.faces_offset.saturating_sub(shadow.verts_offset) as usize
                / COMPRESSED_VERTEX_SIZE;
            model.shadow_verts =
                self.read_compressed_verts(codec, block(shadow.verts_offset), vertex_count)?;
            (model.shadow_faces, _) = codec.decode_array::<Face>(
                self.data,
                block(shadow.faces_offset),
                shadow.face_count as usize,
            )?;
        }

        Ok(())
    }

    fn read_compressed_verts(
        &self,
        codec: &SectionCodec,
        offset: usize,
        count: usize,
    ) -> Result<Vec<glam::Vec3>> {
        let (verts, _) = codec.decode_array::<Vertex>(self.data, offset, count)?;
        Ok(verts.into_iter().map(Vertex::decompress).collect())
    }

    /// Face groups sit directly before the faces, with their count in the word at
    /// `count_at` that otherwise holds the face count.
    fn read_face_groups(&self, codec: &SectionCodec, count_at: usize) -> Result<Vec<FaceGroup>> {
        let count = self.read_count(count_at, FaceGroup::NAME)?;
        let size = count.saturating_mul(codec.size_of::<FaceGroup>());
        let start = count_at
            .checked_sub(size)
            .ok_or(ColError::MalformedRecord {
                record: FaceGroup::NAME,
                offset: count_at,
                needed: size,
                available: count_at,
            })?;

        let (groups, _) = codec.decode_array(self.data, start, count)?;
        Ok(groups)
    }

    fn truncated_header<T>(&self, offset: usize) -> ColError {
        ColError::MalformedRecord {
            record: "model header",
            offset,
            needed: mem::size_of::<T>(),
            available: self.data.len().saturating_sub(offset),
        }
    }
}
