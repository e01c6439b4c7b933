use thiserror::Error;

/// Errors originating from the conversion core.
///
/// Variants follow the failure taxonomy of a run: configuration errors are
/// raised before any pixel work, capability errors on the first colored
/// glyph, structural errors while scanning GIF frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Both `width` and `height` were set without `dimensions`.
    #[error("both width and height can't be set, use dimensions instead")]
    ConflictingDimensions,

    /// Terminal comparison disabled but no explicit size given.
    #[error("at least one of width, height or dimensions is required without a terminal")]
    MissingDimensions,

    /// Requested art is at least as wide as the terminal.
    #[error("set width ({width}) must be lower than terminal width ({terminal})")]
    WidthExceedsTerminal {
        /// Requested character width.
        width: u32,
        /// Terminal columns.
        terminal: u32,
    },

    /// Custom character map with fewer than 2 distinct characters.
    #[error("custom map needs at least 2 distinct characters, got {0:?}")]
    InvalidCustomMap(String),

    /// Braille threshold outside 0–255.
    #[error("threshold must be between 0 and 255, got {0}")]
    InvalidThreshold(i64),

    /// Dithering requested outside braille mode.
    #[error("image dithering is only available in braille mode")]
    DitherWithoutBraille,

    /// Terminal supports neither 24-bit nor 8-bit colors.
    #[error("your terminal supports neither 24-bit nor 8-bit colors, coloring options aren't available")]
    ColorUnsupported,

    /// A GIF frame does not share the first frame's bounds.
    #[error(
        "GIF frame {index} has bounds {found:?}, expected {expected:?}: sub-image placement is not supported"
    )]
    FrameBoundsMismatch {
        /// Zero-based frame index.
        index: usize,
        /// Bounds of the first frame (left, top, width, height).
        expected: (u32, u32, u32, u32),
        /// Bounds of the offending frame.
        found: (u32, u32, u32, u32),
    },

    /// Grid rows of unequal width.
    #[error("grid row {row} has {found} cells, expected {expected}")]
    RaggedGrid {
        /// Offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width found.
        found: usize,
    },

    /// Invalid width/height dimensions.
    #[error("invalid dimensions: {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },

    /// Terminal geometry could not be read.
    #[error("can't read terminal size: {0}")]
    Terminal(String),
}

impl CoreError {
    /// True for errors detected before any pixel work starts.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::ConflictingDimensions
                | Self::MissingDimensions
                | Self::WidthExceedsTerminal { .. }
                | Self::InvalidCustomMap(_)
                | Self::InvalidThreshold(_)
                | Self::DitherWithoutBraille
                | Self::InvalidDimensions { .. }
        )
    }
}
