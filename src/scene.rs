//! Loaded scenes: objects, their materials and their curved surfaces.

use nalgebra::{Matrix4, Point3};

use crate::mesh::PolyMesh;
use crate::patch::PatchSurface;
use crate::texture::TexelSize;

/// A named material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Name as given by the source file.
    pub name: String,
    /// Size of the first assigned image, if one could be resolved.
    pub texel: Option<TexelSize>,
}

impl Material {
    /// A material without an image.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            texel: None,
        }
    }

    /// Attach the texel size of the material's image.
    pub fn with_texel(mut self, texel: TexelSize) -> Self {
        self.texel = Some(texel);
        self
    }
}

/// One source object.
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Object name.
    pub name: String,
    /// Geometry in object space.
    pub mesh: PolyMesh,
    /// Material table indexed by [`crate::mesh::Face::material`].
    pub materials: Vec<Material>,
    /// Object-to-world transform.
    pub transform: Matrix4<f64>,
}

impl SceneObject {
    /// Create an object with an identity transform and no materials.
    pub fn new(name: impl Into<String>, mesh: PolyMesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            materials: Vec::new(),
            transform: Matrix4::identity(),
        }
    }

    /// Set the material table.
    pub fn with_materials(mut self, materials: Vec<Material>) -> Self {
        self.materials = materials;
        self
    }

    /// Set the object-to-world transform.
    pub fn with_transform(mut self, transform: Matrix4<f64>) -> Self {
        self.transform = transform;
        self
    }

    /// World-space origin of the object.
    pub fn origin(&self) -> Point3<f64> {
        self.transform.transform_point(&Point3::origin())
    }
}

/// A curved surface exported as a patch.
#[derive(Debug, Clone)]
pub struct SceneSurface {
    /// Surface name.
    pub name: String,
    /// Control grid.
    pub surface: PatchSurface,
    /// Material table indexed by [`PatchSurface::material`].
    pub materials: Vec<Material>,
    /// Object-to-world transform.
    pub transform: Matrix4<f64>,
}

/// Everything loaded from one input file.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Mesh objects.
    pub objects: Vec<SceneObject>,
    /// Patch surfaces.
    pub surfaces: Vec<SceneSurface>,
}

impl Scene {
    /// An empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of faces over all objects.
    pub fn num_faces(&self) -> usize {
        self.objects.iter().map(|o| o.mesh.num_faces()).sum()
    }

    /// Total number of vertices over all objects.
    pub fn num_vertices(&self) -> usize {
        self.objects.iter().map(|o| o.mesh.num_vertices()).sum()
    }

    /// Apply `matrix` after every object's and surface's own transform.
    pub fn apply_world_transform(&mut self, matrix: &Matrix4<f64>) {
        for object in &mut self.objects {
            object.transform = matrix * object.transform;
        }
        for surface in &mut self.surfaces {
            surface.transform = matrix * surface.transform;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_origin_follows_transform() {
        let object = SceneObject::new("crate", PolyMesh::new())
            .with_transform(Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0)));
        assert_eq!(object.origin(), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_world_transform_applies_last() {
        let mut scene = Scene::new();
        scene.objects.push(
            SceneObject::new("a", PolyMesh::new())
                .with_transform(Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0))),
        );
        scene.apply_world_transform(&Matrix4::new_scaling(2.0));
        assert_eq!(scene.objects[0].origin(), Point3::new(2.0, 0.0, 0.0));
    }
}
