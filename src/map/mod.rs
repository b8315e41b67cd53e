//! Map file assembly.
//!
//! A map is one `worldspawn` entity holding every brush and patch of the
//! scene. The block layout depends on the texture and plane formats:
//!
//! | Texture format | Plane format | Layout |
//! |----------------|--------------|--------|
//! | Standard | three points | Quake: plain brushes |
//! | Valve | three points | Half-Life: plain brushes, `"mapversion" "220"` |
//! | BrushPrimitives | three points | Quake 3: `brushDef` blocks |
//! | BrushPrimitives | normal + distance | Doom 3: `Version 2` header, `brushDef3` blocks |
//!
//! Plane equations cannot carry Standard or Valve texturing; that pairing is
//! rejected when the writer is created.

mod naming;
mod report;
mod writer;

pub use naming::{sanitize, NameRegistry};
pub use report::{ExportReport, ExportWarning};
pub use writer::{plane_text, texture_text, ExportOptions, MapWriter, DEFAULT_FALLBACK};
