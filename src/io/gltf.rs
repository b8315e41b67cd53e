//! glTF format support.
//!
//! Every node that carries a mesh becomes one object, placed by the node's
//! world transform. Primitives keep their material and their first texture
//! coordinate set.

use std::collections::HashMap;
use std::path::Path;

use nalgebra::{Matrix4, Point2, Point3};

use crate::error::{MapError, Result};
use crate::mesh::{build_mesh, PolygonInput};
use crate::scene::{Material, Scene, SceneObject};
use crate::texture::TexelSize;

/// Load a glTF or GLB file.
///
/// # Example
///
/// ```no_run
/// use brushsmith::io::gltf;
///
/// let scene = gltf::load("level.glb").unwrap();
/// println!("{} objects", scene.objects.len());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Scene> {
    let path = path.as_ref();

    let (document, buffers, images) = ::gltf::import(path).map_err(|e| MapError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut scene = Scene::new();
    let roots: Vec<::gltf::Node> = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(s) => s.nodes().collect(),
        None => document.nodes().collect(),
    };
    let mut stack: Vec<(::gltf::Node, Matrix4<f64>)> =
        roots.into_iter().map(|n| (n, Matrix4::identity())).collect();

    while let Some((node, parent)) = stack.pop() {
        let world = parent * node_matrix(&node);
        if let Some(mesh) = node.mesh() {
            let name = node
                .name()
                .or_else(|| mesh.name())
                .map(str::to_string)
                .unwrap_or_else(|| format!("mesh{}", mesh.index()));
            match read_mesh(&mesh, &buffers, &images) {
                Ok(Some((poly, materials))) => scene.objects.push(
                    SceneObject::new(name, poly)
                        .with_materials(materials)
                        .with_transform(world),
                ),
                Ok(None) => log::debug!("{}: no triangle primitives", name),
                Err(e) => {
                    return Err(MapError::LoadError {
                        path: path.to_path_buf(),
                        message: format!("{}: {}", name, e),
                    })
                }
            }
        }
        for child in node.children() {
            stack.push((child, world));
        }
    }

    if scene.objects.is_empty() {
        return Err(MapError::LoadError {
            path: path.to_path_buf(),
            message: "glTF file contains no triangle meshes".to_string(),
        });
    }
    Ok(scene)
}

fn node_matrix(node: &::gltf::Node) -> Matrix4<f64> {
    let m = node.transform().matrix();
    Matrix4::from_fn(|row, col| m[col][row] as f64)
}

type MeshData = (crate::mesh::PolyMesh, Vec<Material>);

fn read_mesh(
    mesh: &::gltf::Mesh,
    buffers: &[::gltf::buffer::Data],
    images: &[::gltf::image::Data],
) -> Result<Option<MeshData>> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut polygons: Vec<PolygonInput> = Vec::new();
    let mut materials: Vec<Material> = Vec::new();
    let mut material_slots: HashMap<Option<usize>, usize> = HashMap::new();

    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let vertex_offset = vertices.len();

        let Some(positions) = reader.read_positions() else {
            continue;
        };
        vertices.extend(positions.map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64)));
        let count = vertices.len() - vertex_offset;

        // glTF counts V downward from the top of the image.
        let uvs: Option<Vec<Point2<f64>>> = reader.read_tex_coords(0).map(|t| {
            t.into_f32()
                .map(|uv| Point2::new(uv[0] as f64, 1.0 - uv[1] as f64))
                .collect()
        });

        let indices: Vec<usize> = match reader.read_indices() {
            Some(indices) => indices.into_u32().map(|i| i as usize).collect(),
            None => (0..count).collect(),
        };
        let triangles = match primitive.mode() {
            ::gltf::mesh::Mode::Triangles => indices
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
            ::gltf::mesh::Mode::TriangleStrip => (0..indices.len().saturating_sub(2))
                .map(|i| {
                    if i % 2 == 0 {
                        [indices[i], indices[i + 1], indices[i + 2]]
                    } else {
                        [indices[i], indices[i + 2], indices[i + 1]]
                    }
                })
                .collect(),
            ::gltf::mesh::Mode::TriangleFan => (1..indices.len().saturating_sub(1))
                .map(|i| [indices[0], indices[i], indices[i + 1]])
                .collect(),
            _ => Vec::<[usize; 3]>::new(),
        };

        let gltf_material = primitive.material();
        let slot = *material_slots
            .entry(gltf_material.index())
            .or_insert_with(|| {
                materials.push(material(&gltf_material, images));
                materials.len() - 1
            });

        for tri in triangles {
            // Skip triangles that repeat a vertex; they carry no surface.
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                continue;
            }
            let mut polygon =
                PolygonInput::new(tri.iter().map(|&i| i + vertex_offset).collect()).with_material(slot);
            if let Some(uvs) = &uvs {
                if tri.iter().all(|&i| i < uvs.len()) {
                    polygon = polygon.with_uvs(tri.iter().map(|&i| uvs[i]).collect());
                }
            }
            polygons.push(polygon);
        }
    }

    if polygons.is_empty() {
        return Ok(None);
    }
    let poly = build_mesh(&vertices, &polygons)?;
    Ok(Some((poly, materials)))
}

fn material(material: &::gltf::Material, images: &[::gltf::image::Data]) -> Material {
    let name = material
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| match material.index() {
            Some(i) => format!("material{}", i),
            None => String::new(),
        });
    let texel = material
        .pbr_metallic_roughness()
        .base_color_texture()
        .and_then(|info| images.get(info.texture().source().index()))
        .map(|image| TexelSize::new(image.width as f64, image.height as f64));
    Material { name, texel }
}
