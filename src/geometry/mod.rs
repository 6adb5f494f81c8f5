//! Plain geometry values: points, axis-aligned rects, and the closed set of path kinds.

pub mod kind;
pub mod primitives;
