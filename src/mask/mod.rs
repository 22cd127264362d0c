mod brush;
mod buffer;

pub use brush::{BrushMode, BrushStroke};
pub use buffer::MaskBuffer;
