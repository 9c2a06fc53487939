//! Layout module: rectangle geometry shared by clipping, boxes and the
//! widget cache key.

mod rect;

pub use rect::Rect;
