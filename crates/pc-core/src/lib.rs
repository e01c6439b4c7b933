//! Configuration, types, and shared structures for picscii.
//!
//! This crate contains the data model shared by every stage of the
//! conversion pipeline, the strongly typed configuration and the error
//! taxonomy.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;

pub use charset::CharacterTable;
pub use config::{ColorMode, ConvertConfig, SizePolicy};
pub use error::CoreError;
pub use frame::{BrailleCell, Depth, Frame, FrameBuffer, Glyph, Grid, Looping, Rgb, Sample};
