//! Mesh editing primitives.
//!
//! The operations the brush builder runs on a working mesh before turning its
//! faces into brush faces:
//!
//! - **Triangulation**: ear clipping, straight-corner (T-junction) triangulation
//! - **Splitting**: concave faces into convex pieces, folded faces into planar pieces
//! - **Merging**: adjacent coplanar faces into one polygon
//!
//! Every operation mutates the mesh through a unique borrow and reports how
//! many faces it touched.

pub mod merge;
pub mod split;
pub mod triangulate;

pub use merge::merge_coplanar;
pub use split::{split_concave, split_nonplanar};
pub use triangulate::{ear_clip, triangulate_faces, triangulate_straight_corners};
