//! Wavefront OBJ support.
//!
//! Files are read with `tobj`, keeping polygons as they are (no
//! triangulation) and positions and UVs on separate index streams. Consecutive
//! `o`/`g` groups with the same name become one object. A material's `map_Kd`
//! image is opened only to read its size.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use nalgebra::{Point2, Point3};

use crate::error::{MapError, Result};
use crate::mesh::{build_mesh, PolygonInput};
use crate::scene::{Material, Scene, SceneObject};
use crate::texture::TexelSize;

/// Library name under which every `usemtl` name is declared, so that names
/// without an MTL entry still reach the map.
const USEMTL_NAMES: &str = "<usemtl>";

/// Name `tobj` gives to faces before the first `o` or `g`.
const UNNAMED: &str = "unnamed_object";

/// Load every object of an OBJ file.
///
/// # Example
///
/// ```no_run
/// use brushsmith::io::obj;
///
/// let scene = obj::load("level.obj").unwrap();
/// println!("{} objects", scene.objects.len());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Scene> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| MapError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    parse(&text, path, &base)
}

/// Parse OBJ text. `base` is the directory `mtllib` paths are relative to.
pub fn parse(text: &str, path: &Path, base: &Path) -> Result<Scene> {
    let options = tobj::LoadOptions {
        single_index: false,
        triangulate: false,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let names = usemtl_library(text);
    let source = format!("mtllib {}\n{}", USEMTL_NAMES, text);

    let (models, materials) = tobj::load_obj_buf(&mut source.as_bytes(), &options, |mtl| {
        if mtl == Path::new(USEMTL_NAMES) {
            return tobj::load_mtl_buf(&mut names.as_bytes());
        }
        let mtl_path = base.join(mtl);
        match tobj::load_mtl(&mtl_path) {
            Ok((mut materials, index)) => {
                let dir = mtl_path.parent().map(Path::to_path_buf).unwrap_or_default();
                for material in &mut materials {
                    if let Some(map) = material.diffuse_texture.as_mut() {
                        *map = texture_path(&dir, map).to_string_lossy().into_owned();
                    }
                }
                Ok((materials, index))
            }
            Err(e) => {
                log::warn!("skipping material library {}: {}", mtl_path.display(), e);
                tobj::load_mtl_buf(&mut &b""[..])
            }
        }
    })
    .map_err(|e| MapError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let materials = materials.unwrap_or_else(|e| {
        log::warn!("{}: materials unavailable: {}", path.display(), e);
        Vec::new()
    });

    // Consecutive models share a name when `usemtl` splits an object.
    let mut groups: Vec<(String, Vec<&tobj::Model>)> = Vec::new();
    for model in &models {
        let name = if model.name.is_empty() || model.name == UNNAMED {
            default_name(path)
        } else {
            model.name.clone()
        };
        match groups.last_mut() {
            Some((last, members)) if *last == name => members.push(model),
            _ => groups.push((name, vec![model])),
        }
    }

    let mut scene = Scene::new();
    for (name, members) in groups {
        if let Some(object) = build_object(name, &members, &materials)? {
            scene.objects.push(object);
        }
    }
    log::debug!(
        "{}: {} objects, {} faces",
        path.display(),
        scene.objects.len(),
        scene.num_faces()
    );
    Ok(scene)
}

/// An MTL library declaring one empty material per distinct `usemtl` name.
fn usemtl_library(text: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut library = String::new();
    for line in text.lines() {
        let mut tokens = line.split_whitespace();
        if tokens.next() != Some("usemtl") {
            continue;
        }
        let name = tokens.collect::<Vec<_>>().join(" ");
        if !name.is_empty() && seen.insert(name.clone()) {
            library.push_str("newmtl ");
            library.push_str(&name);
            library.push('\n');
        }
    }
    library
}

fn default_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("object")
        .to_string()
}

/// Image file of a `map_Kd` statement; options such as `-s 1 1 1` precede
/// the file name.
fn texture_path(dir: &Path, map: &str) -> PathBuf {
    dir.join(map.split_whitespace().last().unwrap_or(""))
}

/// One polygon corner: model-local position index and optional UV.
type Corner = (usize, Option<Point2<f64>>);

/// Drop repeated consecutive corners. Loops that still repeat a vertex, or
/// that are left with fewer than 3 corners, carry no surface.
fn clean_loop(mut corners: Vec<Corner>) -> Option<Vec<Corner>> {
    corners.dedup_by_key(|c| c.0);
    while corners.len() > 1 && corners.first().map(|c| c.0) == corners.last().map(|c| c.0) {
        corners.pop();
    }
    let mut indices: Vec<usize> = corners.iter().map(|c| c.0).collect();
    indices.sort_unstable();
    if corners.len() < 3 || indices.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }
    Some(corners)
}

fn build_object(
    name: String,
    models: &[&tobj::Model],
    library: &[tobj::Material],
) -> Result<Option<SceneObject>> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut materials: Vec<Material> = Vec::new();
    let mut material_index: HashMap<usize, usize> = HashMap::new();
    let mut polygons = Vec::new();
    let mut dropped = 0;

    for model in models {
        let mesh = &model.mesh;
        let offset = vertices.len();
        vertices.extend(
            mesh.positions
                .chunks_exact(3)
                .map(|p| Point3::new(p[0] as f64, p[1] as f64, p[2] as f64)),
        );
        let has_uvs = !mesh.texcoord_indices.is_empty()
            && mesh.texcoord_indices.len() == mesh.indices.len();
        let uv = |i: usize| {
            let t = mesh.texcoord_indices[i] as usize;
            Point2::new(
                mesh.texcoords.get(2 * t).copied().unwrap_or_default() as f64,
                mesh.texcoords.get(2 * t + 1).copied().unwrap_or_default() as f64,
            )
        };

        let slot = mesh.material_id.and_then(|id| {
            let source = library.get(id)?;
            Some(*material_index.entry(id).or_insert_with(|| {
                materials.push(material(source));
                materials.len() - 1
            }))
        });

        let arities: Vec<usize> = if mesh.face_arities.is_empty() {
            vec![3; mesh.indices.len() / 3]
        } else {
            mesh.face_arities.iter().map(|&n| n as usize).collect()
        };
        let mut start = 0;
        for arity in arities {
            let corners: Vec<Corner> = (start..start + arity)
                .map(|i| {
                    let position = mesh.indices[i] as usize + offset;
                    (position, has_uvs.then(|| uv(i)))
                })
                .collect();
            start += arity;

            let Some(corners) = clean_loop(corners) else {
                dropped += 1;
                continue;
            };
            let mut polygon = PolygonInput::new(corners.iter().map(|c| c.0).collect());
            if has_uvs {
                polygon = polygon.with_uvs(corners.iter().filter_map(|c| c.1).collect());
            }
            if let Some(slot) = slot {
                polygon = polygon.with_material(slot);
            }
            polygons.push(polygon);
        }
    }

    if dropped > 0 {
        log::debug!("{}: dropped {} degenerate faces", name, dropped);
    }
    if polygons.is_empty() {
        log::debug!("{}: no usable faces", name);
        return Ok(None);
    }
    let mesh = build_mesh(&vertices, &polygons)?;
    Ok(Some(SceneObject::new(name, mesh).with_materials(materials)))
}

fn material(source: &tobj::Material) -> Material {
    Material {
        name: source.name.clone(),
        texel: source
            .diffuse_texture
            .as_deref()
            .and_then(|map| texel_size(Path::new(map))),
    }
}

/// Size of an image file, if it can be read.
pub(crate) fn texel_size(path: &Path) -> Option<TexelSize> {
    match image::image_dimensions(path) {
        Ok((width, height)) => Some(TexelSize::new(width as f64, height as f64)),
        Err(e) => {
            log::warn!("cannot read texture {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(text: &str) -> Result<Scene> {
        parse(text, Path::new("test.obj"), Path::new("."))
    }

    #[test]
    fn test_single_quad_with_uvs() {
        let scene = parse_str(
            "o quad\n\
             v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             usemtl brick_wall\n\
             f 1/1 2/2 3/3 4/4\n",
        )
        .unwrap();
        assert_eq!(scene.objects.len(), 1);
        let object = &scene.objects[0];
        assert_eq!(object.name, "quad");
        assert!(object.mesh.has_uvs());
        assert_eq!(object.materials, vec![Material::new("brick_wall")]);
        let face = object.mesh.face(crate::mesh::FaceId::new(0));
        assert_eq!(face.len(), 4);
        assert_eq!(face.material, Some(0));
        assert_eq!(face.uvs[2], Point2::new(1.0, 1.0));
    }

    #[test]
    fn test_objects_split_and_remap() {
        let scene = parse_str(
            "o first\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n\
             o second\nv 0 0 1\nv 1 0 1\nv 0 1 1\nf -3 -2 -1\n",
        )
        .unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert_eq!(scene.objects[0].name, "first");
        assert_eq!(scene.objects[1].name, "second");
        assert_eq!(scene.objects[1].mesh.num_vertices(), 3);
        assert_eq!(scene.objects[1].mesh.position(crate::mesh::VertexId::new(0)).z, 1.0);
        assert!(!scene.objects[1].mesh.has_uvs());
    }

    #[test]
    fn test_material_change_keeps_one_object() {
        let scene = parse_str(
            "o wall\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             usemtl brick\nf 1 2 3\nusemtl stone\nf 1 3 4\n",
        )
        .unwrap();
        assert_eq!(scene.objects.len(), 1);
        let object = &scene.objects[0];
        assert_eq!(object.mesh.num_faces(), 2);
        let names: Vec<&str> = object.materials.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["brick", "stone"]);
    }

    #[test]
    fn test_normals_ignored() {
        let scene = parse_str("o t\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n").unwrap();
        assert_eq!(scene.num_faces(), 1);
    }

    #[test]
    fn test_repeated_corners_are_dropped() {
        let scene = parse_str(
            "o floor\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             f 1 2 3 4\nf 1 2 2 3\nf 1 1 2\nf 1 2 1 3\n",
        )
        .unwrap();
        assert_eq!(scene.objects.len(), 1);
        let mesh = &scene.objects[0].mesh;
        // The doubled corner collapses into a triangle; the other two carry no surface.
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.face(crate::mesh::FaceId::new(0)).len(), 4);
        assert_eq!(mesh.face(crate::mesh::FaceId::new(1)).len(), 3);
    }

    #[test]
    fn test_clean_loop() {
        let c = |i: usize| (i, None);
        assert_eq!(clean_loop(vec![c(0), c(1), c(1), c(2)]), Some(vec![c(0), c(1), c(2)]));
        assert_eq!(clean_loop(vec![c(0), c(1), c(2), c(0)]), Some(vec![c(0), c(1), c(2)]));
        assert_eq!(clean_loop(vec![c(0), c(0), c(1)]), None);
        assert_eq!(clean_loop(vec![c(0), c(1), c(0), c(2)]), None);
    }

    #[test]
    fn test_bad_index_is_a_load_error() {
        let err = parse_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n").unwrap_err();
        assert!(matches!(err, MapError::LoadError { .. }), "{}", err);
    }

    #[test]
    fn test_usemtl_library() {
        let library = usemtl_library("usemtl a\nf 1 2 3\nusemtl b\nusemtl a\n  usemtl  \n");
        assert_eq!(library, "newmtl a\nnewmtl b\n");
    }

    #[test]
    fn test_texture_path_skips_options() {
        assert_eq!(
            texture_path(Path::new("textures"), "-s 1 1 1 stone.png"),
            Path::new("textures").join("stone.png")
        );
    }

    #[test]
    fn test_missing_image_leaves_size_unresolved() {
        assert_eq!(texel_size(Path::new("missing.png")), None);
    }
}
