//! Map text writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use super::naming::{sanitize, NameRegistry};
use super::report::{ExportReport, ExportWarning};
use crate::brush::{try_build, Brush, BrushFace, BuildParams, Strategy};
use crate::error::{MapError, Result};
use crate::numeric::Precision;
use crate::patch::{self, PatchGrid};
use crate::plane::{PlaneEncoding, PlaneFormat};
use crate::progress::Progress;
use crate::scene::{Material, Scene, SceneObject, SceneSurface};
use crate::texture::{TexelSize, TextureBasis, TextureFormat};

/// Material written on faces without an assigned material.
pub const DEFAULT_FALLBACK: &str = "skip";

/// Everything that controls how a scene becomes map text.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// How meshes become brushes.
    pub strategy: Strategy,
    /// Grid, scale and clean-up settings. Origin and transform are filled in
    /// per object.
    pub build: BuildParams,
    /// Texture-axis encoding.
    pub texture_format: TextureFormat,
    /// Plane encoding.
    pub plane_format: PlaneFormat,
    /// Rendering of every numeric field.
    pub precision: Precision,
    /// Material for new and unassigned faces.
    pub fallback_material: String,
    /// Texel size of materials without a resolvable image.
    pub default_texel: TexelSize,
    /// Append `0 0 0` content/surface flags to Standard and Valve faces.
    pub surface_flags: bool,
    /// Apply object transforms; otherwise geometry stays in object space.
    pub apply_transform: bool,
    /// Shared apex of [`Strategy::Blob`] in world space; each object's own
    /// origin when unset.
    pub apex: Option<Point3<f64>>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            build: BuildParams::default().with_grid(4.0),
            texture_format: TextureFormat::default(),
            plane_format: PlaneFormat::default(),
            precision: Precision::default(),
            fallback_material: DEFAULT_FALLBACK.to_string(),
            default_texel: TexelSize::default(),
            surface_flags: false,
            apply_transform: true,
            apex: None,
        }
    }
}

impl ExportOptions {
    /// Set the strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the build parameters.
    pub fn with_build(mut self, build: BuildParams) -> Self {
        self.build = build;
        self
    }

    /// Set the texture format.
    pub fn with_texture_format(mut self, format: TextureFormat) -> Self {
        self.texture_format = format;
        self
    }

    /// Set the plane format.
    pub fn with_plane_format(mut self, format: PlaneFormat) -> Self {
        self.plane_format = format;
        self
    }

    /// Set the numeric precision.
    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    /// Set the fallback material.
    pub fn with_fallback_material(mut self, name: impl Into<String>) -> Self {
        self.fallback_material = name.into();
        self
    }

    /// Set the default texel size.
    pub fn with_default_texel(mut self, texel: TexelSize) -> Self {
        self.default_texel = texel;
        self
    }

    /// Enable or disable trailing surface flags.
    pub fn with_surface_flags(mut self, enabled: bool) -> Self {
        self.surface_flags = enabled;
        self
    }

    /// Enable or disable object transforms.
    pub fn with_apply_transform(mut self, enabled: bool) -> Self {
        self.apply_transform = enabled;
        self
    }

    /// Override the shared apex of the blob strategy.
    pub fn with_apex(mut self, apex: Point3<f64>) -> Self {
        self.apex = Some(apex);
        self
    }

    /// Check that the options can be exported.
    pub fn validate(&self) -> Result<()> {
        self.strategy.validate()?;
        self.build.validate()?;
        if self.plane_format == PlaneFormat::NormalDistance
            && self.texture_format != TextureFormat::BrushPrimitives
        {
            return Err(MapError::invalid_param(
                "plane_format",
                "normal-distance",
                "plane equations require brush primitives texturing",
            ));
        }
        if self.fallback_material.is_empty()
            || sanitize(&self.fallback_material) != self.fallback_material
        {
            return Err(MapError::invalid_param(
                "fallback_material",
                &self.fallback_material,
                "must be a non-empty name without spaces or quotes",
            ));
        }
        let texel = self.default_texel;
        if !texel.is_usable() {
            return Err(MapError::invalid_param(
                "default_texel",
                format!("{}x{}", texel.width, texel.height),
                "must be finite and positive",
            ));
        }
        Ok(())
    }

    /// The block layout these options produce.
    fn dialect(&self) -> Dialect {
        match (self.texture_format, self.plane_format) {
            (TextureFormat::BrushPrimitives, PlaneFormat::NormalDistance) => Dialect::Doom3,
            (TextureFormat::BrushPrimitives, PlaneFormat::ThreePoint) => Dialect::Quake3,
            (TextureFormat::Valve, _) => Dialect::Valve,
            (TextureFormat::Standard, _) => Dialect::Quake,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Quake,
    Valve,
    Quake3,
    Doom3,
}

/// Writes scenes as map files.
///
/// Every call to [`MapWriter::write`] is one export run with its own
/// [`NameRegistry`].
///
/// # Example
///
/// ```
/// use brushsmith::map::{ExportOptions, MapWriter};
/// use brushsmith::mesh::build_from_polygons;
/// use brushsmith::scene::{Scene, SceneObject};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(64.0, 0.0, 0.0),
///     Point3::new(64.0, 64.0, 0.0),
///     Point3::new(0.0, 64.0, 0.0),
/// ];
/// let mesh = build_from_polygons(&vertices, &[vec![0, 1, 2, 3]]).unwrap();
/// let mut scene = Scene::new();
/// scene.objects.push(SceneObject::new("floor", mesh));
///
/// let writer = MapWriter::new(ExportOptions::default()).unwrap();
/// let (text, report) = writer.write_string(&scene);
/// assert!(text.starts_with("{\n\"classname\" \"worldspawn\"\n\"mapversion\" \"220\"\n"));
/// assert_eq!(report.brushes, 1);
/// ```
#[derive(Debug)]
pub struct MapWriter {
    options: ExportOptions,
    progress: Progress,
}

impl MapWriter {
    /// Create a writer; fails if the options cannot be exported.
    pub fn new(options: ExportOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            options,
            progress: Progress::none(),
        })
    }

    /// Report progress once per object and surface.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// The writer's options.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Render a scene to map text.
    pub fn write_string(&self, scene: &Scene) -> (String, ExportReport) {
        let mut run = Run::new(&self.options);
        run.header();
        let total = scene.objects.len() + scene.surfaces.len();
        for (i, object) in scene.objects.iter().enumerate() {
            run.object(object);
            self.progress.report(i + 1, total, &object.name);
        }
        for (i, surface) in scene.surfaces.iter().enumerate() {
            run.surface(surface);
            self.progress
                .report(scene.objects.len() + i + 1, total, &surface.name);
        }
        run.out.push_str("}\n");
        log::info!("{}", run.report);
        (run.out, run.report)
    }

    /// Write a scene to `out`.
    pub fn write<W: Write>(&self, scene: &Scene, out: &mut W) -> Result<ExportReport> {
        let (text, report) = self.write_string(scene);
        out.write_all(text.as_bytes())?;
        out.flush()?;
        Ok(report)
    }

    /// Write a scene to a file.
    pub fn save<P: AsRef<Path>>(&self, scene: &Scene, path: P) -> Result<ExportReport> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| MapError::SaveError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut writer = BufWriter::new(file);
        self.write(scene, &mut writer)
    }
}

/// State of one export run.
struct Run<'a> {
    options: &'a ExportOptions,
    dialect: Dialect,
    names: NameRegistry,
    out: String,
    report: ExportReport,
}

impl<'a> Run<'a> {
    fn new(options: &'a ExportOptions) -> Self {
        let mut names = NameRegistry::new();
        names.reserve(&options.fallback_material);
        Self {
            options,
            dialect: options.dialect(),
            names,
            out: String::new(),
            report: ExportReport::default(),
        }
    }

    fn header(&mut self) {
        if self.dialect == Dialect::Doom3 {
            self.out.push_str("Version 2\n");
        }
        self.out.push_str("{\n\"classname\" \"worldspawn\"\n");
        if self.dialect == Dialect::Valve {
            self.out.push_str("\"mapversion\" \"220\"\n");
        }
    }

    fn object(&mut self, object: &SceneObject) {
        self.report.objects += 1;
        let mut params = self.options.build.clone();
        if self.options.apply_transform {
            params.transform = Some(object.transform);
            params.origin = object.origin();
        } else {
            params.transform = None;
            params.origin = Point3::origin();
        }
        if let Some(apex) = self.options.apex {
            params.origin = apex;
        }

        match try_build(object.mesh.clone(), &self.options.strategy, &params) {
            Ok(brushes) => {
                log::debug!("{}: {} brushes", object.name, brushes.len());
                for brush in &brushes {
                    self.brush(brush, &object.materials);
                }
            }
            Err(e) => self.report.warnings.push(ExportWarning::new(&object.name, e)),
        }
    }

    fn surface(&mut self, surface: &SceneSurface) {
        let transform = self.options.apply_transform.then_some(&surface.transform);
        match patch::sample(&surface.surface, transform, self.options.build.scale) {
            Ok(grid) => {
                let (name, _) = self.material(&surface.materials, surface.surface.material);
                self.patch(&grid, &name);
            }
            Err(e) => self.report.warnings.push(ExportWarning::new(&surface.name, e)),
        }
    }

    /// Output name and texel size of a face's material.
    fn material(&mut self, materials: &[Material], index: Option<usize>) -> (String, TexelSize) {
        let material = index.and_then(|i| materials.get(i)).filter(|m| !m.name.trim().is_empty());
        match material {
            Some(m) => (
                self.names.resolve(&m.name).to_string(),
                m.texel.unwrap_or(self.options.default_texel),
            ),
            None => (
                self.options.fallback_material.clone(),
                self.options.default_texel,
            ),
        }
    }

    fn brush(&mut self, brush: &Brush, materials: &[Material]) {
        self.report.brushes += 1;
        self.out.push_str("{\n");
        match self.dialect {
            Dialect::Quake3 => self.out.push_str("brushDef\n{\n"),
            Dialect::Doom3 => self.out.push_str("brushDef3\n{\n"),
            Dialect::Quake | Dialect::Valve => {}
        }
        for face in &brush.faces {
            self.face(face, materials);
        }
        if matches!(self.dialect, Dialect::Quake3 | Dialect::Doom3) {
            self.out.push_str("}\n");
        }
        self.out.push_str("}\n");
    }

    fn face(&mut self, face: &BrushFace, materials: &[Material]) {
        self.report.faces += 1;
        let (name, texel) = self.material(materials, face.material);
        let format = self.options.texture_format;
        let projection = face.texture(texel, format);
        if projection.is_degenerate() {
            self.report.degenerate_textures += 1;
        }
        let basis = projection.or_identity(format);
        let precision = self.options.precision;
        let plane = plane_text(&face.plane(self.options.plane_format), precision);
        let texture = texture_text(&basis, precision);

        let line = match self.dialect {
            Dialect::Quake | Dialect::Valve => {
                let flags = if self.options.surface_flags { " 0 0 0" } else { "" };
                format!("{} {} {}{}", plane, name, texture, flags)
            }
            Dialect::Quake3 => format!("{} {} {} 0 0 0", plane, texture, name),
            Dialect::Doom3 => format!("{} {} \"{}\" 0 0 0", plane, texture, name),
        };
        self.out.push_str(&line);
        self.out.push('\n');
    }

    fn patch(&mut self, grid: &PatchGrid, material: &str) {
        self.report.patches += 1;
        let name = if self.dialect == Dialect::Doom3 {
            format!("\"{}\"", material)
        } else {
            material.to_string()
        };
        self.out.push_str("{\n");
        self.out.push_str(&grid.to_patch_def(&name, self.options.precision));
        self.out.push_str("}\n");
    }
}

/// Render a plane encoding.
pub fn plane_text(plane: &PlaneEncoding, precision: Precision) -> String {
    match plane {
        PlaneEncoding::Points(points) => points
            .iter()
            .map(|p| format!("( {} )", precision.format_point(p)))
            .collect::<Vec<_>>()
            .join(" "),
        PlaneEncoding::Equation { normal, distance } => format!(
            "( {} {} )",
            precision.format_vector(normal),
            precision.format(*distance)
        ),
    }
}

/// Render a texture basis.
pub fn texture_text(basis: &TextureBasis, precision: Precision) -> String {
    match basis {
        TextureBasis::Standard {
            offset,
            rotation,
            scale,
        } => precision.format_all(&[offset[0], offset[1], *rotation, scale[0], scale[1]]),
        TextureBasis::Valve {
            u_axis,
            u_offset,
            v_axis,
            v_offset,
            scale,
        } => format!(
            "[ {} {} ] [ {} {} ] 0 {}",
            precision.format_vector(u_axis),
            precision.format(*u_offset),
            precision.format_vector(v_axis),
            precision.format(*v_offset),
            precision.format_all(scale)
        ),
        TextureBasis::Primitives { matrix } => format!(
            "( ( {} ) ( {} ) )",
            precision.format_all(&[matrix[(0, 0)], matrix[(0, 1)], matrix[(0, 2)]]),
            precision.format_all(&[matrix[(1, 0)], matrix[(1, 1)], matrix[(1, 2)]])
        ),
    }
}
