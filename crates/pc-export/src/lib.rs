//! Raster re-encoding and persistence for picscii: glyph grids to RGBA
//! canvases, PNG and GIF files, plain-text dumps.

pub mod font;
pub mod gif;
pub mod rasterizer;
pub mod save;

pub use font::{FontSource, load_font};
pub use rasterizer::{Ink, RasterLayout, Rasterizer};
