use std::mem;

use glam::Vec3;

use crate::{
    consts::{ColVersion, FRAME_OVERHEAD},
    error::{ColError, Result},
    header::{modern_header_size, ColHeader, ModernHeader, ShadowHeader, COL_HEADER_SIZE},
    model::{validate_faces, vertex_count_from_faces, ColModel},
    sections::{Face, Section, SectionCodec, Vertex},
};

/// Encode one model, recomputing every size, count and offset from its lists.
pub fn write_model(model: &ColModel) -> Result<Vec<u8>> {
    let version = model.version();
    let codec = SectionCodec::for_version(version);

    // Header is filled in once the size is known.
    let mut out = vec![0; COL_HEADER_SIZE];
    codec.encode_into(&model.bounds, &mut out)?;

    match version {
        ColVersion::Coll => write_legacy_body(&codec, model, &mut out)?,
        ColVersion::Col2 | ColVersion::Col3 | ColVersion::Col4 => {
            write_modern_body(&codec, model, &mut out)?
        }
    }

    let size = to_u32(out.len() - FRAME_OVERHEAD, "model")?;
    let header = ColHeader::new(version, &model.model_name, model.model_id, size);
    out[..COL_HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));

    Ok(out)
}

fn to_u32(value: usize, record: &'static str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ColError::invalid(record, format!("{value} does not fit in 32 bits")))
}

fn to_u16(value: usize, record: &'static str) -> Result<u16> {
    u16::try_from(value).map_err(|_| {
        ColError::invalid(record, format!("a count of {value} does not fit in 16 bits"))
    })
}

fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Write a `u32` count followed by the records.
fn write_counted_block<T: Section>(
    codec: &SectionCodec,
    records: &[T],
    out: &mut Vec<u8>,
) -> Result<()> {
    write_u32(out, to_u32(records.len(), T::NAME)?);
    codec.encode_array(records, out)
}

fn write_legacy_body(codec: &SectionCodec, model: &ColModel, out: &mut Vec<u8>) -> Result<()> {
    validate_faces(&model.mesh_faces, model.mesh_verts.len(), "mesh")?;

    if !model.face_groups.is_empty() {
        log::warn!("{}: version 1 has no face groups, skipping them", model.model_name);
    }
    if !(model.shadow_verts.is_empty() && model.shadow_faces.is_empty()) {
        log::warn!("{}: version 1 has no shadow mesh, skipping it", model.model_name);
    }

    let verts: Vec<Vertex> = model.mesh_verts.iter().copied().map(Vertex).collect();

    write_counted_block(codec, &model.spheres, out)?;
    write_u32(out, 0);
    write_counted_block(codec, &model.boxes, out)?;
    write_counted_block(codec, &verts, out)?;
    write_counted_block(codec, &model.mesh_faces, out)
}

/// Offset of the next block, relative to the model's header.
fn block_offset(out: &[u8]) -> Result<u32> {
    to_u32(out.len(), "block offset")
}

fn compress(verts: &[Vec3]) -> Vec<Vertex> {
    verts.iter().copied().map(Vertex::compress).collect()
}

fn write_modern_body(codec: &SectionCodec, model: &ColModel, out: &mut Vec<u8>) -> Result<()> {
    let version = model.version();
    validate_faces(&model.mesh_faces, model.mesh_verts.len(), "mesh")?;

    let header_at = out.len();
    out.resize(header_at + modern_header_size(version), 0);

    let mut header = ModernHeader {
        sphere_count: to_u16(model.spheres.len(), "sphere")?,
        box_count: to_u16(model.boxes.len(), "box")?,
        face_count: to_u16(model.mesh_faces.len(), "face")?,
        flags: model.computed_flags(),
        ..Default::default()
    };

    header.spheres_offset = block_offset(out)?;
    write_counted_block(codec, &model.spheres, out)?;

    header.boxes_offset = block_offset(out)?;
    write_counted_block(codec, &model.boxes, out)?;

    header.lines_offset = block_offset(out)?;
    write_u32(out, 0);

    // Readers only see as many vertices as the faces reference.
    let vertex_count = vertex_count_from_faces(&model.mesh_faces);
    if model.mesh_verts.len() > vertex_count {
        log::warn!(
            "{}: {} mesh vertices are not referenced by any face and will not be written",
            model.model_name,
            model.mesh_verts.len() - vertex_count
        );
    }
    header.verts_offset = block_offset(out)?;
    write_counted_block(codec, &compress(&model.mesh_verts[..vertex_count]), out)?;

    if model.face_groups.is_empty() {
        header.faces_offset = block_offset(out)?;
        write_counted_block(codec, &model.mesh_faces, out)?;
    } else {
        // Groups go in front of the faces, their count takes the face count's slot.
        codec.encode_array(&model.face_groups, out)?;
        header.faces_offset = block_offset(out)?;
        write_u32(out, to_u32(model.face_groups.len(), "face group")?);
        codec.encode_array(&model.mesh_faces, out)?;
    }

    let shadow = if version.supports_shadow_mesh() {
        Some(write_shadow_mesh(codec, model, out)?)
    } else {
        None
    };

    let header_bytes = bytemuck::bytes_of(&header.swap_le()).to_vec();
    let mut at = header_at;
    out[at..at + header_bytes.len()].copy_from_slice(&header_bytes);
    at += header_bytes.len();

    if let Some(shadow) = shadow {
        out[at..at + mem::size_of::<ShadowHeader>()]
            .copy_from_slice(bytemuck::bytes_of(&shadow.swap_le()));
    }

    Ok(())
}

fn write_shadow_mesh(
    codec: &SectionCodec,
    model: &ColModel,
    out: &mut Vec<u8>,
) -> Result<ShadowHeader> {
    if model.shadow_verts.is_empty() && model.shadow_faces.is_empty() {
        return Ok(ShadowHeader::default());
    }
    validate_faces(&model.shadow_faces, model.shadow_verts.len(), "shadow mesh")?;

    // The vertex count is read back from the distance between the two blocks.
    let verts_offset = block_offset(out)?;
    write_counted_block(codec, &compress(&model.shadow_verts), out)?;

    let faces_offset = block_offset(out)?;
    write_counted_block::<Face>(codec, &model.shadow_faces, out)?;

    Ok(ShadowHeader {
        face_count: to_u32(model.shadow_faces.len(), "shadow face")?,
        verts_offset,
        faces_offset,
    })
}
