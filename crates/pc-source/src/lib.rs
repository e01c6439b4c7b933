//! Input acquisition for picscii: files, URLs, stdin, GIF decoding,
//! terminal geometry and resampling.

pub mod gif;
pub mod image;
pub mod resize;
pub mod terminal;

pub use crate::image::{Decoded, Origin, SourceBytes};
pub use terminal::{CrosstermTerminal, FixedTerminal, TerminalGeometry};
