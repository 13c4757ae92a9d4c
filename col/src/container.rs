use std::{fs, path::Path};

use crate::{
    config::ColConfig,
    error::Result,
    model::ColModel,
    reader::ColReader,
    writer::write_model,
};

/// An ordered list of collision models, as stored back to back in a `.col` file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColFile {
    pub models: Vec<ColModel>,
}

impl ColFile {
    pub fn from_models(models: Vec<ColModel>) -> Self {
        Self { models }
    }

    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        Self::load_bytes_with(data, &ColConfig::default())
    }

    /// Decode models until the buffer runs out.
    ///
    /// A header that is cut short or has an unknown magic ends the read, keeping the
    /// models decoded before it. Damage inside a model's body is an error.
    pub fn load_bytes_with(data: &[u8], config: &ColConfig) -> Result<Self> {
        let mut reader = ColReader::with_config(data, config);
        let mut models = Vec::new();

        while !reader.is_exhausted() {
            let at = reader.position();
            match reader.read_model() {
                Ok(model) => models.push(model),
                Err(e) if e.is_end_of_stream() => {
                    log::warn!("stopping at offset {at:#x} after {} models: {e}", models.len());
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        log::info!("decoded {} collision models from {} bytes", models.len(), data.len());
        Ok(Self { models })
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        Self::load_file_with(path, &ColConfig::default())
    }

    pub fn load_file_with(path: &Path, config: &ColConfig) -> Result<Self> {
        let data = fs::read(path)?;
        Self::load_bytes_with(&data, config)
    }

    pub fn write_bytes(&self) -> Result<Vec<u8>> {
        self.write_bytes_with(&ColConfig::default())
    }

    /// Encode every model in order. With an export version set, models are converted
    /// to it first.
    pub fn write_bytes_with(&self, config: &ColConfig) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for model in &self.models {
            let bytes = match config.export_version {
                Some(version) if version != model.version() => {
                    write_model(&model.to_version(version))?
                }
                _ => write_model(model)?,
            };
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }

    pub fn write_file(&self, path: &Path) -> Result<()> {
        self.write_file_with(path, &ColConfig::default())
    }

    pub fn write_file_with(&self, path: &Path, config: &ColConfig) -> Result<()> {
        fs::write(path, self.write_bytes_with(config)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod container_tests {
    use glam::{vec3, Vec3};

    use super::*;
    use crate::{
        consts::ColVersion,
        error::ColError,
        sections::{Bounds, ColBox, Face, FaceGroup, Sphere, Surface},
    };

    fn push_u32(out: &mut Vec<u8>, value: u32) {
        out.extend_from_slice(&value.to_le_bytes());
    }

    fn push_f32s(out: &mut Vec<u8>, values: &[f32]) {
        for v in values {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }

    /// A hand-built version 1 file holding one box model with an empty body, followed
    /// by four bytes of trailing junk.
    fn legacy_box_file(declared_size: u32) -> Vec<u8> {
        let mut data = b"COLL".to_vec();
        push_u32(&mut data, declared_size);
        let mut name = [0u8; 22];
        name[..3].copy_from_slice(b"box");
        data.extend_from_slice(&name);
        data.extend_from_slice(&7u16.to_le_bytes());

        push_f32s(&mut data, &[1.0, 0.0, 0.0, 0.0, -1.0, -1.0, -1.0, 1.0, 1.0, 1.0]);
        for _ in 0..5 {
            push_u32(&mut data, 0);
        }
        data.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        data
    }

    fn surface(material: u8) -> Surface {
        Surface {
            material,
            flags: 0,
            brightness: 0,
            light: 9,
        }
    }

    fn face(a: u32, b: u32, c: u32) -> Face {
        Face {
            a,
            b,
            c,
            surface: surface(2),
        }
    }

    fn sample_model(version: ColVersion, name: &str) -> ColModel {
        let mut model = ColModel::new(version, name, 42);
        model.spheres.push(Sphere {
            radius: 1.5,
            center: vec3(0.0, 0.0, 2.0),
            surface: surface(1),
        });
        model.boxes.push(ColBox {
            min: vec3(-1.0, -2.0, -3.0),
            max: vec3(1.0, 2.0, 3.0),
            surface: surface(4),
        });
        model.mesh_verts = vec![
            vec3(0.0, 0.0, 0.0),
            vec3(1.25, 0.0, 0.0),
            vec3(0.0, -3.5, 0.0),
            vec3(0.0, 0.0, 10.0),
        ];
        model.mesh_faces = vec![face(0, 1, 2), face(0, 2, 3)];
        model.bounds = model.compute_bounds();
        model.flags = model.computed_flags();
        model
    }

    fn assert_close(a: &[Vec3], b: &[Vec3]) {
        assert_eq!(a.len(), b.len());
        for (a, b) in a.iter().zip(b) {
            assert!(a.abs_diff_eq(*b, 1.0 / 128.0), "{a} != {b}");
        }
    }

    #[test]
    fn reads_legacy_box() {
        let file = ColFile::load_bytes(&legacy_box_file(0x30)).unwrap();
        assert_eq!(file.models.len(), 1);

        let model = &file.models[0];
        assert_eq!(model.version(), ColVersion::Coll);
        assert_eq!(model.model_name, "box");
        assert_eq!(model.model_id, 7);
        assert_eq!(model.bounds.radius, 1.0);
        assert_eq!(model.bounds.min, Vec3::NEG_ONE);
        assert_eq!(model.bounds.max, Vec3::ONE);
        assert!(model.is_empty());
        assert!(model.mesh_verts.is_empty());
    }

    #[test]
    fn legacy_box_with_size_40() {
        // The frame ends inside the bounds, where no valid magic follows.
        let file = ColFile::load_bytes(&legacy_box_file(40)).unwrap();
        assert_eq!(file.models.len(), 1);

        let model = &file.models[0];
        assert_eq!(model.version(), ColVersion::Coll);
        assert_eq!(model.model_name, "box");
        assert_eq!(model.model_id, 7);
        assert!(model.spheres.is_empty());
        assert!(model.boxes.is_empty());
        assert!(model.mesh_verts.is_empty());
        assert!(model.mesh_faces.is_empty());
    }

    #[test]
    fn declared_size_skips_unused_frame_bytes() {
        let mut data = write_model(&sample_model(ColVersion::Col3, "a")).unwrap();
        let size = u32::from_le_bytes(data[4..8].try_into().unwrap());
        data[4..8].copy_from_slice(&(size + 16).to_le_bytes());
        data.extend_from_slice(&[0xEE; 16]);
        data.extend_from_slice(&write_model(&sample_model(ColVersion::Coll, "b")).unwrap());

        let file = ColFile::load_bytes(&data).unwrap();
        let names: Vec<_> = file.models.iter().map(|m| m.model_name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(file.models[0].mesh_faces, sample_model(ColVersion::Col3, "a").mesh_faces);
    }

    #[test]
    fn truncated_header_after_model_keeps_it() {
        let mut data = write_model(&sample_model(ColVersion::Col2, "kept")).unwrap();
        data.extend_from_slice(&[0; 10]);

        let file = ColFile::load_bytes(&data).unwrap();
        assert_eq!(file.models.len(), 1);
        assert_eq!(file.models[0].model_name, "kept");
    }

    #[test]
    fn truncated_header_gives_no_models() {
        let mut data = b"COLL".to_vec();
        data.extend_from_slice(&[0; 10]);
        assert!(ColFile::load_bytes(&data).unwrap().models.is_empty());
    }

    #[test]
    fn unknown_magic_stops_reading() {
        let mut data = write_model(&sample_model(ColVersion::Col2, "first")).unwrap();
        data.extend_from_slice(b"XXXX");
        data.extend_from_slice(&[0; 60]);

        let file = ColFile::load_bytes(&data).unwrap();
        assert_eq!(file.models.len(), 1);
        assert_eq!(file.models[0].model_name, "first");
    }

    #[test]
    fn headerless_buffer_is_one_legacy_model() {
        let mut data = Vec::new();
        push_f32s(&mut data, &[2.0, 0.0, 0.0, 0.0, -2.0, -2.0, -2.0, 2.0, 2.0, 2.0]);
        push_u32(&mut data, 1);
        push_f32s(&mut data, &[0.5, 1.0, 2.0, 3.0]);
        data.extend_from_slice(&[5, 0, 0, 0]);
        for _ in 0..4 {
            push_u32(&mut data, 0);
        }

        let file = ColFile::load_bytes(&data).unwrap();
        assert_eq!(file.models.len(), 1);
        let model = &file.models[0];
        assert_eq!(model.model_name, "col");
        assert_eq!(model.model_id, 0);
        assert_eq!(model.bounds.radius, 2.0);
        assert_eq!(model.spheres.len(), 1);
        assert_eq!(model.spheres[0].center, vec3(1.0, 2.0, 3.0));
        assert_eq!(model.spheres[0].surface.material, 5);

        let config = ColConfig {
            headerless_fallback: false,
            ..Default::default()
        };
        assert!(ColFile::load_bytes_with(&data, &config).unwrap().models.is_empty());
    }

    #[test]
    fn headerless_buffer_too_short_for_bounds() {
        assert!(ColFile::load_bytes(&[1, 2, 3, 4, 5]).unwrap().models.is_empty());
    }

    #[test]
    fn empty_buffer() {
        assert!(ColFile::load_bytes(&[]).unwrap().models.is_empty());
    }

    #[test]
    fn damaged_body_is_an_error() {
        let mut data = write_model(&sample_model(ColVersion::Coll, "m")).unwrap();
        // sphere count at 72 now claims far more records than exist
        data[72..76].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(
            ColFile::load_bytes(&data),
            Err(ColError::MalformedRecord { record: "sphere", .. })
        ));
    }

    #[test]
    fn legacy_round_trip_is_exact() {
        let file = ColFile::from_models(vec![
            sample_model(ColVersion::Coll, "one"),
            sample_model(ColVersion::Coll, "two"),
        ]);
        let data = file.write_bytes().unwrap();
        let read = ColFile::load_bytes(&data).unwrap();
        assert_eq!(read, file);
        assert_eq!(read.write_bytes().unwrap(), data);
    }

    #[test]
    fn modern_round_trip() {
        for version in [ColVersion::Col2, ColVersion::Col3, ColVersion::Col4] {
            let model = sample_model(version, "modern");
            let data = write_model(&model).unwrap();
            assert_eq!(&data[0..4], &version.magic());

            let read = ColFile::load_bytes(&data).unwrap();
            assert_eq!(read.models.len(), 1);
            let back = &read.models[0];

            assert_eq!(back.version(), version);
            assert_eq!(back.model_name, model.model_name);
            assert_eq!(back.model_id, model.model_id);
            assert_eq!(back.bounds, model.bounds);
            assert_eq!(back.spheres, model.spheres);
            assert_eq!(back.boxes, model.boxes);
            assert_eq!(back.mesh_faces, model.mesh_faces);
            assert_eq!(back.flags, model.flags);
            assert_close(&back.mesh_verts, &model.mesh_verts);
        }
    }

    #[test]
    fn vertex_count_follows_face_indices() {
        let mut model = sample_model(ColVersion::Col2, "m");
        model.mesh_verts.push(vec3(5.0, 5.0, 5.0));

        let read = ColFile::load_bytes(&write_model(&model).unwrap()).unwrap();
        assert_eq!(read.models[0].mesh_verts.len(), 4);
    }

    #[test]
    fn shadow_mesh_only_with_flag() {
        let mut model = sample_model(ColVersion::Col3, "shadow");
        model.shadow_verts = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        model.shadow_faces = vec![face(0, 1, 2)];

        let data = write_model(&model).unwrap();
        let read = ColFile::load_bytes(&data).unwrap();
        let back = &read.models[0];
        assert!(back.has_shadow_mesh());
        assert_close(&back.shadow_verts, &model.shadow_verts);
        assert_eq!(back.shadow_faces, model.shadow_faces);

        // Clear the shadow flag in the flags word at bounds end + 8.
        let mut data = data;
        let flags_at = 32 + 40 + 8;
        let flags = u32::from_le_bytes(data[flags_at..flags_at + 4].try_into().unwrap());
        data[flags_at..flags_at + 4].copy_from_slice(&(flags & !0x10).to_le_bytes());

        let read = ColFile::load_bytes(&data).unwrap();
        assert!(read.models[0].shadow_verts.is_empty());
        assert!(read.models[0].shadow_faces.is_empty());
    }

    #[test]
    fn face_groups_round_trip() {
        let mut model = sample_model(ColVersion::Col2, "groups");
        model.face_groups = vec![
            FaceGroup {
                min: Vec3::ZERO,
                max: Vec3::ONE,
                start: 0,
                end: 0,
            },
            FaceGroup {
                min: Vec3::NEG_ONE,
                max: Vec3::splat(10.0),
                start: 1,
                end: 1,
            },
        ];

        let read = ColFile::load_bytes(&write_model(&model).unwrap()).unwrap();
        let back = &read.models[0];
        assert_eq!(back.face_groups, model.face_groups);
        assert_eq!(back.mesh_faces, model.mesh_faces);
        assert_eq!(back.flags & 0x08, 0x08);
    }

    #[test]
    fn mixed_versions_in_one_file() {
        let file = ColFile::from_models(vec![
            sample_model(ColVersion::Coll, "a"),
            sample_model(ColVersion::Col3, "b"),
            sample_model(ColVersion::Col2, "c"),
        ]);
        let read = ColFile::load_bytes(&file.write_bytes().unwrap()).unwrap();

        let versions: Vec<_> = read.models.iter().map(ColModel::version).collect();
        assert_eq!(versions, [ColVersion::Coll, ColVersion::Col3, ColVersion::Col2]);
        let names: Vec<_> = read.models.iter().map(|m| m.model_name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn export_version_converts_models() {
        let file = ColFile::from_models(vec![sample_model(ColVersion::Coll, "a")]);
        let config = ColConfig {
            export_version: Some(ColVersion::Col3),
            ..Default::default()
        };

        let data = file.write_bytes_with(&config).unwrap();
        assert_eq!(&data[0..4], b"COL3");

        let read = ColFile::load_bytes(&data).unwrap();
        assert_eq!(read.models[0].version(), ColVersion::Col3);
        assert_eq!(read.models[0].mesh_faces[0].surface, surface(2));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.col");

        let file = ColFile::from_models(vec![
            sample_model(ColVersion::Coll, "a"),
            sample_model(ColVersion::Col4, "b"),
        ]);
        file.write_file(&path).unwrap();

        let read = ColFile::load_file(&path).unwrap();
        assert_eq!(read.models.len(), 2);
        assert_eq!(read.models[0], file.models[0]);
        assert_eq!(read.models[1].bounds, file.models[1].bounds);

        assert!(matches!(
            ColFile::load_file(&dir.path().join("missing.col")),
            Err(ColError::Io(_))
        ));
    }

    #[test]
    fn bounds_are_not_recomputed() {
        let mut model = sample_model(ColVersion::Col2, "m");
        model.bounds = Bounds {
            radius: 123.0,
            ..Default::default()
        };
        let read = ColFile::load_bytes(&write_model(&model).unwrap()).unwrap();
        assert_eq!(read.models[0].bounds.radius, 123.0);
    }
}
