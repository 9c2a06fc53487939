//! Compositor module: frame lifecycle and drawing on top of the buffers.
//!
//! - [`Compositor`]: owns the double buffer and writes one diff per frame
//! - [`StyledText`]: text made of differently colored spans

mod frame;
mod styled;

pub use frame::{Compositor, FrameState, FrameStats, RenderStats, WidgetOutcome};
pub use styled::{Span, StyledText};
