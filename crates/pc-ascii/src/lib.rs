//! ASCII conversion engine for picscii.
//!
//! Converts pixel frames to ramp or braille character grids, optionally
//! colorized for the terminal.

pub mod color;
pub mod compositor;
pub mod dither;
pub mod mapper;
pub mod sampler;

pub use color::{ColorLevel, Colorizer};
pub use compositor::{Compositor, flatten, flatten_plain};
