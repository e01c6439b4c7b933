use crate::error::CoreError;

/// RGB triple, 8 bits per channel.
pub type Rgb = (u8, u8, u8);

/// Inverse un triplet RGB (255 − c sur chaque canal).
///
/// # Example
/// ```
/// use pc_core::frame::invert_rgb;
/// assert_eq!(invert_rgb((0, 128, 255)), (255, 127, 0));
/// ```
#[inline]
#[must_use]
pub const fn invert_rgb(c: Rgb) -> Rgb {
    (255 - c.0, 255 - c.1, 255 - c.2)
}

/// Buffer de pixels décodé. Stocke les pixels en RGBA row-major, 4 bytes par pixel.
///
/// # Example
/// ```
/// use pc_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer noir transparent aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wrap raw RGBA bytes, checking the length against the dimensions.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if `data` is not `width * height * 4` bytes.
    ///
    /// # Example
    /// ```
    /// use pc_core::frame::FrameBuffer;
    /// assert!(FrameBuffer::from_rgba(1, 1, vec![1, 2, 3, 255]).is_ok());
    /// assert!(FrameBuffer::from_rgba(2, 1, vec![1, 2, 3, 255]).is_err());
    /// ```
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, CoreError> {
        if data.len() != width as usize * height as usize * 4 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Buffer rempli d'une couleur unie opaque.
    ///
    /// # Example
    /// ```
    /// use pc_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(2, 2, (128, 128, 128));
    /// assert_eq!(fb.pixel(1, 1), (128, 128, 128, 255));
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: Rgb) -> Self {
        let mut fb = Self::new(width, height);
        for px in fb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
        }
        fb
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Écrit un pixel RGBA. Hors limites : ignoré.
    #[inline]
    pub fn put(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.data[idx..idx + 4].copy_from_slice(&rgba);
    }

    /// Luminance perceptuelle BT.601 sur 8 bits.
    ///
    /// Weights sum to 65536, so gray pixels map onto themselves exactly.
    ///
    /// # Example
    /// ```
    /// use pc_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(1, 1, (77, 77, 77));
    /// assert_eq!(fb.luminance(0, 0), 77);
    /// ```
    #[inline]
    #[must_use]
    pub fn luminance(&self, x: u32, y: u32) -> u8 {
        let (r, g, b, _) = self.pixel(x, y);
        luma(r, g, b)
    }
}

/// Integer BT.601 luma, rounded.
#[inline]
#[must_use]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((19595 * u32::from(r) + 38470 * u32::from(g) + 7471 * u32::from(b) + (1 << 15)) >> 16) as u8
}

/// Échelle de la densité d'un [`Sample`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Depth {
    /// 0–65535, luminance non tramée.
    Wide,
    /// 0–255, sortie du tramage (8 bits).
    Narrow,
}

impl Depth {
    /// Largest density representable at this depth.
    #[inline]
    #[must_use]
    pub const fn max(self) -> u16 {
        match self {
            Self::Wide => u16::MAX,
            Self::Narrow => 255,
        }
    }
}

/// Mesures d'un pixel de l'image redimensionnée.
///
/// # Example
/// ```
/// use pc_core::frame::{Depth, Sample};
/// let s = Sample::from_pixel(128, 128, 128);
/// assert_eq!(s.density, 128 * 257);
/// assert_eq!(s.depth, Depth::Wide);
/// assert_eq!(s.level(), 128);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Luminance-derived density, scaled to `depth`.
    pub density: u16,
    /// Scale of `density`.
    pub depth: Depth,
    /// Grayscale rendition of the pixel.
    pub gray: Rgb,
    /// True color of the pixel.
    pub color: Rgb,
}

impl Sample {
    /// Sample an undithered pixel: density is the 16-bit luminance.
    #[must_use]
    pub fn from_pixel(r: u8, g: u8, b: u8) -> Self {
        let y = luma(r, g, b);
        Self {
            density: u16::from(y) * 257,
            depth: Depth::Wide,
            gray: (y, y, y),
            color: (r, g, b),
        }
    }

    /// Density as a fraction of its depth, in `[0.0, 1.0]`.
    #[inline]
    #[must_use]
    pub fn fraction(&self) -> f64 {
        f64::from(self.density) / f64::from(self.depth.max())
    }

    /// Density on the 0–255 scale used by braille thresholds.
    #[inline]
    #[must_use]
    pub fn level(&self) -> u8 {
        match self.depth {
            Depth::Wide => (self.density / 257) as u8,
            Depth::Narrow => self.density.min(255) as u8,
        }
    }
}

/// Supercellule braille : 2 colonnes × 4 lignes de pixels.
///
/// `dots[row * 2 + col]` holds each sub-pixel's density; `representative`
/// is the top-left pixel, which supplies the cell's colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrailleCell {
    /// Top-left sample of the block.
    pub representative: Sample,
    /// Sub-pixel densities, row-major within the 4×2 block.
    pub dots: [Sample; 8],
}

/// Unité de sortie rendue.
///
/// # Example
/// ```
/// use pc_core::frame::Glyph;
/// let g = Glyph::plain('@', (255, 255, 255));
/// assert_eq!(g.display(), "@");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Glyph {
    /// Bare character.
    pub ch: char,
    /// Content-colored escape sequence, when a color mode is active.
    pub styled: Option<String>,
    /// Glyph painted with the explicit font color, when one is set.
    pub font_colored: Option<String>,
    /// Color used when the glyph is rasterised.
    pub source_rgb: Rgb,
    plain: String,
}

impl Glyph {
    /// Glyph without any terminal styling.
    #[must_use]
    pub fn plain(ch: char, source_rgb: Rgb) -> Self {
        Self {
            ch,
            styled: None,
            font_colored: None,
            source_rgb,
            plain: ch.to_string(),
        }
    }

    /// Attach styled renditions.
    #[must_use]
    pub fn with_styles(mut self, styled: Option<String>, font_colored: Option<String>) -> Self {
        self.styled = styled;
        self.font_colored = font_colored;
        self
    }

    /// Terminal rendition: content color, then font color, then bare character.
    #[must_use]
    pub fn display(&self) -> &str {
        self.styled
            .as_deref()
            .or(self.font_colored.as_deref())
            .unwrap_or(&self.plain)
    }
}

/// Grille row-major de largeur uniforme.
///
/// # Example
/// ```
/// use pc_core::frame::Grid;
/// let grid = Grid::from_rows(vec![vec![1, 2], vec![3, 4]]).unwrap();
/// assert_eq!(grid.width(), 2);
/// assert_eq!(*grid.get(1, 1), 4);
/// assert!(Grid::from_rows(vec![vec![1, 2], vec![3]]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid<T> {
    cells: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Grid<T> {
    /// Build a grid from rows, failing fast on ragged input.
    ///
    /// # Errors
    /// Returns [`CoreError::RaggedGrid`] if a row's width differs from the first row.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self, CoreError> {
        let width = rows.first().map_or(0, Vec::len);
        let height = rows.len();
        let mut cells = Vec::with_capacity(width * height);
        for (row, cols) in rows.into_iter().enumerate() {
            if cols.len() != width {
                return Err(CoreError::RaggedGrid {
                    row,
                    expected: width,
                    found: cols.len(),
                });
            }
            cells.extend(cols);
        }
        Ok(Self {
            cells,
            width,
            height,
        })
    }

    /// Build a grid from a flat row-major vector.
    ///
    /// # Errors
    /// Returns [`CoreError::RaggedGrid`] if `cells.len()` isn't `width * height`.
    pub fn from_cells(width: usize, height: usize, cells: Vec<T>) -> Result<Self, CoreError> {
        if cells.len() != width * height {
            return Err(CoreError::RaggedGrid {
                row: height,
                expected: width * height,
                found: cells.len(),
            });
        }
        Ok(Self {
            cells,
            width,
            height,
        })
    }

    /// Width in cells.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get a cell reference at position (x, y).
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.cells[y * self.width + x]
    }

    /// Flat row-major cells.
    #[must_use]
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    /// Mutable flat cells.
    pub fn cells_mut(&mut self) -> &mut [T] {
        &mut self.cells
    }

    /// Rows in display order.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.cells.chunks(self.width.max(1))
    }

    /// Miroir horizontal : chaque ligne est inversée.
    pub fn flip_x(&mut self) {
        if self.width == 0 {
            return;
        }
        for row in self.cells.chunks_mut(self.width) {
            row.reverse();
        }
    }

    /// Miroir vertical : ordre des lignes inversé.
    pub fn flip_y(&mut self) {
        let (w, h) = (self.width, self.height);
        for y in 0..h / 2 {
            let (top, bottom) = self.cells.split_at_mut((h - 1 - y) * w);
            top[y * w..(y + 1) * w].swap_with_slice(&mut bottom[..w]);
        }
    }

    /// Transform every cell, keeping the shape.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Grid<U> {
        Grid {
            cells: self.cells.into_iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Pixel bounds of a GIF frame inside its logical screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bounds {
    /// Left offset.
    pub left: u32,
    /// Top offset.
    pub top: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Bounds {
    /// `(left, top, width, height)`.
    #[must_use]
    pub fn as_tuple(self) -> (u32, u32, u32, u32) {
        (self.left, self.top, self.width, self.height)
    }
}

/// Frame GIF convertie : grille de glyphes + délai en centièmes de seconde.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Converted glyphs.
    pub glyphs: Grid<Glyph>,
    /// Delay in 1/100 s.
    pub delay: u16,
    /// Raster bounds of the source frame.
    pub bounds: Bounds,
}

/// Politique de bouclage d'une animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Looping {
    /// No loop extension: a single pass.
    Once,
    /// Stop after this many full passes.
    Times(u16),
    /// Loop count 0: play forever.
    Forever,
}

impl Looping {
    /// Interpret a NETSCAPE2.0 loop count; `None` when the extension is absent.
    ///
    /// # Example
    /// ```
    /// use pc_core::frame::Looping;
    /// assert_eq!(Looping::from_count(None), Looping::Once);
    /// assert_eq!(Looping::from_count(Some(0)), Looping::Forever);
    /// assert_eq!(Looping::from_count(Some(3)), Looping::Times(3));
    /// ```
    #[must_use]
    pub fn from_count(count: Option<u16>) -> Self {
        match count {
            None => Self::Once,
            Some(0) => Self::Forever,
            Some(n) => Self::Times(n),
        }
    }

    /// Inverse of [`Looping::from_count`]: the loop count to write, if any.
    #[must_use]
    pub fn count(self) -> Option<u16> {
        match self {
            Self::Once => None,
            Self::Times(n) => Some(n),
            Self::Forever => Some(0),
        }
    }

    /// Full passes to play; `None` is endless.
    #[must_use]
    pub fn passes(self) -> Option<u32> {
        match self {
            Self::Once => Some(1),
            Self::Times(n) => Some(u32::from(n.max(1))),
            Self::Forever => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_3x2() -> Grid<u8> {
        Grid::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap()
    }

    #[test]
    fn flip_x_reverses_rows() {
        let mut g = grid_3x2();
        g.flip_x();
        assert_eq!(g.cells(), &[3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn flip_y_reverses_row_order() {
        let mut g = Grid::from_rows(vec![vec![1, 2], vec![3, 4], vec![5, 6]]).unwrap();
        g.flip_y();
        assert_eq!(g.cells(), &[5, 6, 3, 4, 1, 2]);
    }

    #[test]
    fn double_flip_is_identity() {
        let original = grid_3x2();
        let mut g = original.clone();
        g.flip_x();
        g.flip_x();
        g.flip_y();
        g.flip_y();
        assert_eq!(g, original);
    }

    #[test]
    fn ragged_rows_fail_fast() {
        let err = Grid::from_rows(vec![vec![1, 2], vec![3, 4], vec![5]]).unwrap_err();
        assert_eq!(
            err,
            CoreError::RaggedGrid {
                row: 2,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn loop_count_maps_both_ways() {
        for looping in [Looping::Once, Looping::Times(4), Looping::Forever] {
            assert_eq!(Looping::from_count(looping.count()), looping);
        }
    }

    #[test]
    fn passes_per_policy() {
        assert_eq!(Looping::Once.passes(), Some(1));
        assert_eq!(Looping::Times(3).passes(), Some(3));
        assert_eq!(Looping::Forever.passes(), None);
    }

    #[test]
    fn narrow_depth_level_is_identity() {
        let s = Sample {
            density: 200,
            depth: Depth::Narrow,
            gray: (0, 0, 0),
            color: (0, 0, 0),
        };
        assert_eq!(s.level(), 200);
        assert!((s.fraction() - 200.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn glyph_display_prefers_styled() {
        let g = Glyph::plain('#', (1, 2, 3))
            .with_styles(Some("S".into()), Some("F".into()));
        assert_eq!(g.display(), "S");
        let g = Glyph::plain('#', (1, 2, 3)).with_styles(None, Some("F".into()));
        assert_eq!(g.display(), "F");
    }
}
