use flagset::FlagSet;
use glam::Vec3;

use crate::{
    consts::{col_flags, ColFlag, ColVersion},
    error::{ColError, Result},
    sections::{Bounds, ColBox, Face, FaceGroup, Sphere, Surface},
};

/// A single collision model.
///
/// The version is fixed when the model is created; it selects every on-disk layout
/// used to read or write the model. Use [`ColModel::to_version`] to get a converted
/// copy for another version.
#[derive(Clone, Debug, PartialEq)]
pub struct ColModel {
    version: ColVersion,
    pub model_name: String,
    pub model_id: u16,
    pub bounds: Bounds,
    pub spheres: Vec<Sphere>,
    pub boxes: Vec<ColBox>,
    /// Decompressed positions, whatever the on-disk representation.
    pub mesh_verts: Vec<Vec3>,
    pub mesh_faces: Vec<Face>,
    pub face_groups: Vec<FaceGroup>,
    /// Raw flags word. Version 1 models have no flags.
    pub flags: u32,
    pub shadow_verts: Vec<Vec3>,
    pub shadow_faces: Vec<Face>,
}

impl ColModel {
    pub fn new(version: ColVersion, model_name: impl Into<String>, model_id: u16) -> Self {
        Self {
            version,
            model_name: model_name.into(),
            model_id,
            bounds: Bounds::default(),
            spheres: Vec::new(),
            boxes: Vec::new(),
            mesh_verts: Vec::new(),
            mesh_faces: Vec::new(),
            face_groups: Vec::new(),
            flags: 0,
            shadow_verts: Vec::new(),
            shadow_faces: Vec::new(),
        }
    }

    pub fn version(&self) -> ColVersion {
        self.version
    }

    pub fn col_flags(&self) -> FlagSet<ColFlag> {
        col_flags(self.flags)
    }

    /// Whether a reader would look for a shadow mesh in this model.
    pub fn has_shadow_mesh(&self) -> bool {
        self.version.supports_shadow_mesh() && self.col_flags().contains(ColFlag::ShadowMesh)
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty() && self.boxes.is_empty() && self.mesh_faces.is_empty()
    }

    /// The flags word a writer stores for this model: the structural bits follow the
    /// lists, any other bits are kept as they are.
    pub fn computed_flags(&self) -> u32 {
        if self.version == ColVersion::Coll {
            return 0;
        }

        let structural = ColFlag::NotEmpty | ColFlag::FaceGroups | ColFlag::ShadowMesh;
        let mut flags = col_flags(self.flags) - structural;

        if !self.is_empty() {
            flags |= ColFlag::NotEmpty;
        }
        if !self.face_groups.is_empty() {
            flags |= ColFlag::FaceGroups;
        }
        if self.version.supports_shadow_mesh()
            && !(self.shadow_verts.is_empty() && self.shadow_faces.is_empty())
        {
            flags |= ColFlag::ShadowMesh;
        }

        (self.flags & !structural.bits()) | flags.bits()
    }

    /// Bounds enclosing every sphere, box and mesh vertex of the model.
    pub fn compute_bounds(&self) -> Bounds {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for sphere in &self.spheres {
            min = min.min(sphere.center - sphere.radius);
            max = max.max(sphere.center + sphere.radius);
        }
        for b in &self.boxes {
            min = min.min(b.min.min(b.max));
            max = max.max(b.min.max(b.max));
        }
        for &v in &self.mesh_verts {
            min = min.min(v);
            max = max.max(v);
        }

        if min.cmpgt(max).any() {
            return Bounds::default();
        }

        let center = (min + max) * 0.5;

        let mut radius: f32 = 0.0;
        for sphere in &self.spheres {
            radius = radius.max(center.distance(sphere.center) + sphere.radius);
        }
        for b in &self.boxes {
            for corner in box_corners(b.min, b.max) {
                radius = radius.max(center.distance(corner));
            }
        }
        for &v in &self.mesh_verts {
            radius = radius.max(center.distance(v));
        }

        Bounds {
            radius,
            center,
            min,
            max,
        }
    }

    /// Check that every face indexes an existing vertex.
    pub fn validate(&self) -> Result<()> {
        validate_faces(&self.mesh_faces, self.mesh_verts.len(), "mesh")?;
        validate_faces(&self.shadow_faces, self.shadow_verts.len(), "shadow mesh")
    }

    /// A copy of this model converted to another version.
    ///
    /// Anything the target cannot store is dropped: face groups and flags going to
    /// version 1, the shadow mesh going below version 3, and the face surface bytes
    /// other than material and light going to a modern version.
    pub fn to_version(&self, version: ColVersion) -> ColModel {
        let mut model = ColModel {
            version,
            ..self.clone()
        };

        if version == ColVersion::Coll {
            if !model.face_groups.is_empty() {
                log::warn!("{}: version 1 has no face groups, dropping them", self.model_name);
            }
            model.face_groups.clear();
            model.flags = 0;
        } else if self.version == ColVersion::Coll {
            for face in &mut model.mesh_faces {
                face.surface = Surface {
                    material: face.surface.material,
                    light: face.surface.light,
                    ..Default::default()
                };
            }
        }

        if !version.supports_shadow_mesh() {
            if !(model.shadow_verts.is_empty() && model.shadow_faces.is_empty()) {
                log::warn!(
                    "{}: version {} has no shadow mesh, dropping it",
                    self.model_name,
                    version.number()
                );
            }
            model.shadow_verts.clear();
            model.shadow_faces.clear();
        }

        model.flags = model.computed_flags();
        model
    }
}

/// Number of vertices a set of faces refers to: one past the highest index.
pub fn vertex_count_from_faces(faces: &[Face]) -> usize {
    faces
        .iter()
        .map(|f| f.max_index() as usize + 1)
        .max()
        .unwrap_or(0)
}

pub(crate) fn validate_faces(faces: &[Face], vertex_count: usize, mesh: &str) -> Result<()> {
    match faces
        .iter()
        .enumerate()
        .find(|(_, f)| f.max_index() as usize >= vertex_count)
    {
        Some((i, face)) => Err(ColError::invalid(
            "face",
            format!(
                "{mesh} face {i} references vertex {} but there are only {vertex_count}",
                face.max_index()
            ),
        )),
        None => Ok(()),
    }
}

fn box_corners(min: Vec3, max: Vec3) -> [Vec3; 8] {
    [
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
        Vec3::new(max.x, max.y, max.z),
    ]
}
