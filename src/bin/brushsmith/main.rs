//! Brushsmith CLI - mesh to .map brush exporter.
//!
//! Usage: brushsmith <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `brushsmith --help` for available commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::Point3;

use brushsmith::brush::{BuildParams, Strategy};
use brushsmith::io::{self, LoadOptions, UpAxis};
use brushsmith::map::{ExportOptions, MapWriter};
use brushsmith::numeric::Precision;
use brushsmith::plane::PlaneFormat;
use brushsmith::progress::Progress;
use brushsmith::scene::Scene;
use brushsmith::texture::{TexelSize, TextureFormat};

#[derive(Parser)]
#[command(name = "brushsmith")]
#[command(author, version, about = "Convert meshes into .map brushes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display scene information
    Info {
        /// Input scene file (.obj, .gltf, .glb)
        input: PathBuf,

        /// Up axis of the input file
        #[arg(long, value_enum, default_value = "y")]
        up: Up,
    },

    /// Export a scene as a .map file
    Export {
        /// Input scene file (.obj, .gltf, .glb)
        input: PathBuf,

        /// Output .map file, or `-` for standard output
        output: PathBuf,

        /// How meshes become brushes
        #[arg(short, long, value_enum, default_value = "faces")]
        geo: Geo,

        /// Texture projection format
        #[arg(short, long, value_enum, default_value = "valve")]
        format: Format,

        /// Plane encoding
        #[arg(long, value_enum, default_value = "three-point")]
        planes: Planes,

        /// Snap to grid (0 for off-grid)
        #[arg(long, default_value = "4")]
        grid: f64,

        /// Extrusion or poke depth
        #[arg(short, long, default_value = "8")]
        depth: f64,

        /// Uniform scale applied after object transforms
        #[arg(short, long, default_value = "1")]
        scale: f64,

        /// Number of significant digits
        #[arg(long, default_value = "5", conflicts_with = "decimals")]
        precision: u32,

        /// Number of decimal places (instead of significant digits)
        #[arg(long)]
        decimals: Option<u32>,

        /// Texture for new and unassigned faces
        #[arg(long, default_value = "skip")]
        fallback: String,

        /// Texture size used when a material has no image
        #[arg(long, default_value = "64")]
        texel: f64,

        /// Shared apex for the blob strategy, as `x,y,z` (default: object origin)
        #[arg(long, value_parser = parse_point)]
        origin: Option<Point3<f64>>,

        /// Keep faces with straight corners as they are
        #[arg(long)]
        no_tjunctions: bool,

        /// Keep geometry in object space
        #[arg(long)]
        no_transform: bool,

        /// Append content/surface flags to Standard and Valve faces
        #[arg(long)]
        flags: bool,

        /// Up axis of the input file
        #[arg(long, value_enum, default_value = "y")]
        up: Up,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Geo {
    /// One convex hull brush per object
    Brush,
    /// One pyramid per face
    Faces,
    /// One prism per face
    Prisms,
    /// One prism per upward face, down to a common floor
    Soup,
    /// One pyramid per face, all sharing the object origin
    Blob,
    /// One prism per face along vertex normals (may be non-planar)
    Miter,
}

impl Geo {
    fn strategy(self, depth: f64) -> Strategy {
        match self {
            Geo::Brush => Strategy::Brush,
            Geo::Faces => Strategy::Faces { depth },
            Geo::Prisms => Strategy::Prisms { depth },
            Geo::Soup => Strategy::Soup { depth },
            Geo::Blob => Strategy::Blob,
            Geo::Miter => Strategy::Miter { depth },
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Axis-aligned projection (Quake, Quake 2)
    Standard,
    /// Valve 220 projection (Half-Life)
    Valve,
    /// Brush primitives (Quake 3, Doom 3)
    Primitives,
}

impl From<Format> for TextureFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Standard => TextureFormat::Standard,
            Format::Valve => TextureFormat::Valve,
            Format::Primitives => TextureFormat::BrushPrimitives,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Planes {
    /// Three points on each plane
    ThreePoint,
    /// Normal and distance (Doom 3; requires primitives)
    NormalDistance,
}

impl From<Planes> for PlaneFormat {
    fn from(planes: Planes) -> Self {
        match planes {
            Planes::ThreePoint => PlaneFormat::ThreePoint,
            Planes::NormalDistance => PlaneFormat::NormalDistance,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Up {
    /// Y up (rotate to Z up)
    Y,
    /// Z up
    Z,
}

impl From<Up> for UpAxis {
    fn from(up: Up) -> Self {
        match up {
            Up::Y => UpAxis::Y,
            Up::Z => UpAxis::Z,
        }
    }
}

fn parse_point(s: &str) -> Result<Point3<f64>, String> {
    let coords = s
        .split(',')
        .map(|c| c.trim().parse::<f64>().map_err(|e| format!("{}: {}", c, e)))
        .collect::<Result<Vec<_>, _>>()?;
    match coords.as_slice() {
        [x, y, z] => Ok(Point3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got {} values", coords.len())),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, up } => {
            cmd_info(&input, up)?;
        }

        Commands::Export {
            input,
            output,
            geo,
            format,
            planes,
            grid,
            depth,
            scale,
            precision,
            decimals,
            fallback,
            texel,
            origin,
            no_tjunctions,
            no_transform,
            flags,
            up,
        } => {
            let precision = match decimals {
                Some(places) => Precision::Decimals(places),
                None => Precision::Significant(precision),
            };
            let build = BuildParams::default()
                .with_grid(grid)
                .with_scale(scale)
                .with_triangulate_tjunctions(!no_tjunctions);
            let options = ExportOptions::default()
                .with_strategy(geo.strategy(depth))
                .with_build(build)
                .with_texture_format(format.into())
                .with_plane_format(planes.into())
                .with_precision(precision)
                .with_fallback_material(fallback)
                .with_default_texel(TexelSize::new(texel, texel))
                .with_surface_flags(flags)
                .with_apply_transform(!no_transform);
            let options = match origin {
                Some(apex) => options.with_apex(apex),
                None => options,
            };
            cmd_export(&input, &output, options, up)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Never move backwards.
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        let percent = previous.max(raw_percent);
        if percent == previous && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {:<32}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn load(input: &Path, up: Up) -> Result<Scene, Box<dyn std::error::Error>> {
    let options = LoadOptions::default().with_up(up.into());
    Ok(io::load_scene(input, &options)?)
}

fn cmd_info(input: &Path, up: Up) -> Result<(), Box<dyn std::error::Error>> {
    let scene = load(input, up)?;

    println!("File: {}", input.display());
    println!("Objects: {}", scene.objects.len());
    println!("Vertices: {}", scene.num_vertices());
    println!("Faces: {}", scene.num_faces());

    for object in &scene.objects {
        let mesh = &object.mesh;
        println!("\n{}", object.name);
        println!("  Vertices: {}", mesh.num_vertices());
        println!("  Faces: {}", mesh.num_faces());
        println!("  Surface area: {:.6}", mesh.surface_area());
        if let Some((min, max)) = mesh.bounding_box() {
            let min = object.transform.transform_point(&min);
            let max = object.transform.transform_point(&max);
            println!(
                "  Bounds: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
                min.x, min.y, min.z, max.x, max.y, max.z
            );
        }
        println!("  UVs: {}", if mesh.has_uvs() { "yes" } else { "no" });
        for material in &object.materials {
            match material.texel {
                Some(t) => println!("  Material: {} ({}x{})", material.name, t.width, t.height),
                None => println!("  Material: {} (no image)", material.name),
            }
        }
    }

    Ok(())
}

fn cmd_export(
    input: &Path,
    output: &Path,
    options: ExportOptions,
    up: Up,
) -> Result<(), Box<dyn std::error::Error>> {
    let scene = load(input, up)?;
    let writer = MapWriter::new(options)?;
    let start = Instant::now();

    let report = if output == Path::new("-") {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        writer.write(&scene, &mut lock)?
    } else {
        let writer = writer.with_progress(create_progress());
        let report = writer.save(&scene, output)?;
        eprintln!("Saved: {} ({:.2?})", output.display(), start.elapsed());
        report
    };

    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
    eprintln!("{}", report);
    Ok(())
}
