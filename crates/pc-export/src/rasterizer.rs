use std::collections::HashMap;

use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont, point};
use anyhow::Context;
use pc_core::frame::{FrameBuffer, Glyph, Grid, Rgb};

use crate::font::FontSource;

/// Avance horizontale d'un glyphe dans une image fixe (px).
pub const STILL_ADVANCE_X: f64 = 12.6;
/// Demi-hauteur de ligne d'une image fixe (px); l'avance verticale est le double.
pub const STILL_HALF_LINE: f64 = 13.5;
/// Taille de police d'une image fixe (pt).
pub const STILL_FONT_SIZE: f32 = 21.0;
/// Position du premier glyphe d'une image fixe.
pub const STILL_ORIGIN: (f64, f64) = (5.0, 2.5);
/// Marges ajoutées au canevas d'une image fixe (largeur, hauteur).
pub const STILL_PADDING: (u32, u32) = (10, 5);

/// Marge totale ajoutée à chaque dimension d'une frame GIF.
pub const GIF_PADDING: u32 = 10;
/// Position du premier glyphe d'une frame GIF.
pub const GIF_ORIGIN: (f64, f64) = (5.0, 5.0);
/// Taille de police d'une frame GIF, relative à l'avance horizontale.
pub const GIF_FONT_FACTOR: f64 = 1.5;

/// Géométrie du canevas : taille, pas entre glyphes, police.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterLayout {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Horizontal advance between glyphs.
    pub step_x: f64,
    /// Vertical advance between rows.
    pub step_y: f64,
    /// Top-left of the first glyph.
    pub origin: (f64, f64),
    /// Font size in points.
    pub font_size: f32,
}

impl RasterLayout {
    /// Layout for a still image of `cols × rows` glyphs.
    ///
    /// # Example
    /// ```
    /// use pc_export::rasterizer::RasterLayout;
    /// let l = RasterLayout::still(10, 2);
    /// assert_eq!((l.width, l.height), (136, 59));
    /// ```
    #[must_use]
    pub fn still(cols: usize, rows: usize) -> Self {
        let width = (STILL_ADVANCE_X * cols as f64) as u32 + STILL_PADDING.0;
        let height = (STILL_HALF_LINE * rows as f64) as u32 * 2 + STILL_PADDING.1;
        Self {
            width,
            height,
            step_x: STILL_ADVANCE_X,
            step_y: STILL_HALF_LINE * 2.0,
            origin: STILL_ORIGIN,
            font_size: STILL_FONT_SIZE,
        }
    }

    /// Layout for a GIF frame: keeps the source frame size and shrinks the font.
    ///
    /// Wide art (`cols > 2 * rows`) is anchored on the frame height,
    /// everything else on the frame width.
    ///
    /// # Example
    /// ```
    /// use pc_export::rasterizer::RasterLayout;
    /// let l = RasterLayout::gif_frame(40, 10, 400, 200);
    /// assert_eq!((l.width, l.height), (410, 210));
    /// assert_eq!(l.font_size, 15.0);
    /// ```
    #[must_use]
    pub fn gif_frame(cols: usize, rows: usize, frame_width: u32, frame_height: u32) -> Self {
        let (cols_f, rows_f) = (cols.max(1) as f64, rows.max(1) as f64);
        let (step_x, step_y, width, height) = if cols > rows * 2 {
            let step_y = f64::from(frame_height) / rows_f;
            let step_x = step_y / 2.0;
            (step_x, step_y, (step_x * cols_f) as u32, frame_height)
        } else {
            let step_x = f64::from(frame_width) / cols_f;
            let step_y = step_x * 2.0;
            (step_x, step_y, frame_width, (step_y * rows_f) as u32)
        };
        Self {
            width: width + GIF_PADDING,
            height: height + GIF_PADDING,
            step_x,
            step_y,
            origin: GIF_ORIGIN,
            font_size: (step_x * GIF_FONT_FACTOR) as f32,
        }
    }
}

/// Couleur des glyphes rasterisés.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ink {
    /// Each glyph's own `source_rgb`.
    Content,
    /// One color for every glyph.
    Fixed(Rgb),
}

/// Couverture d'un glyphe, positionnée relativement au coin haut-gauche du stylo.
#[derive(Clone, Debug)]
struct GlyphMask {
    left: i32,
    top: i32,
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

/// Convertit une grille de glyphes en pixels RGBA.
/// Maintien d'un cache atlas pour ne rasteriser chaque caractère qu'une fois.
pub struct Rasterizer {
    font: FontArc,
    scale: PxScale,
    ascent: f32,
    glyph_cache: HashMap<char, GlyphMask>,
}

impl Rasterizer {
    /// Parse the font and pre-rasterise ASCII, Latin-1 and braille.
    ///
    /// # Errors
    /// Retourne une erreur si la police fournie est invalide.
    pub fn new(font: &FontSource, font_size: f32) -> anyhow::Result<Self> {
        let font = FontVec::try_from_vec_and_index(font.data.clone(), font.index)
            .map(FontArc::new)
            .context("Police invalide")?;
        let scale = font
            .pt_to_px_scale(font_size)
            .unwrap_or_else(|| PxScale::from(font_size));
        let ascent = font.as_scaled(scale).ascent();

        let mut rasterizer = Self {
            font,
            scale,
            ascent,
            glyph_cache: HashMap::new(),
        };
        rasterizer.cache_chars((32..=126).filter_map(char::from_u32));
        rasterizer.cache_chars((0x00A0..=0x00FF).filter_map(char::from_u32));
        rasterizer.cache_chars((0x2800..=0x28FF).filter_map(char::from_u32));
        Ok(rasterizer)
    }

    /// Rasterise extra characters (custom maps).
    pub fn cache_chars(&mut self, chars: impl IntoIterator<Item = char>) {
        for ch in chars {
            if self.glyph_cache.contains_key(&ch) {
                continue;
            }
            let gid = self.font.glyph_id(ch);
            // .notdef : pas de boîte de remplacement dans l'export
            if gid.0 == 0 {
                continue;
            }
            let glyph = gid.with_scale_and_position(self.scale, point(0.0, self.ascent));
            let mask = match self.font.outline_glyph(glyph) {
                Some(outline) => {
                    let bounds = outline.px_bounds();
                    let width = bounds.width().ceil() as u32;
                    let height = bounds.height().ceil() as u32;
                    let mut alpha = vec![0u8; width as usize * height as usize];
                    outline.draw(|x, y, v| {
                        if x < width && y < height {
                            alpha[(y * width + x) as usize] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                        }
                    });
                    GlyphMask {
                        left: bounds.min.x.floor() as i32,
                        top: bounds.min.y.floor() as i32,
                        width,
                        height,
                        alpha,
                    }
                }
                None => GlyphMask {
                    left: 0,
                    top: 0,
                    width: 0,
                    height: 0,
                    alpha: Vec::new(),
                },
            };
            self.glyph_cache.insert(ch, mask);
        }
    }

    /// True if `ch` has a cached rendition.
    #[must_use]
    pub fn covers(&self, ch: char) -> bool {
        self.glyph_cache.contains_key(&ch)
    }

    /// Dessine la grille sur un canevas neuf.
    ///
    /// `background` is RGB plus an opacity in 0–100.
    #[must_use]
    pub fn render(
        &self,
        grid: &Grid<Glyph>,
        layout: &RasterLayout,
        ink: Ink,
        background: [u8; 4],
    ) -> FrameBuffer {
        let mut fb = FrameBuffer::new(layout.width, layout.height);
        let bg_alpha = (u32::from(background[3].min(100)) * 255 / 100) as u8;
        for px in fb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[background[0], background[1], background[2], bg_alpha]);
        }

        for (gy, row) in grid.rows().enumerate() {
            let pen_y = (layout.origin.1 + gy as f64 * layout.step_y).round() as i32;
            for (gx, glyph) in row.iter().enumerate() {
                let Some(mask) = self.glyph_cache.get(&glyph.ch) else {
                    continue;
                };
                let pen_x = (layout.origin.0 + gx as f64 * layout.step_x).round() as i32;
                let color = match ink {
                    Ink::Content => glyph.source_rgb,
                    Ink::Fixed(rgb) => rgb,
                };
                blit(&mut fb, mask, pen_x, pen_y, color);
            }
        }
        fb
    }
}

/// Composition « source over » de la couverture du glyphe.
fn blit(fb: &mut FrameBuffer, mask: &GlyphMask, pen_x: i32, pen_y: i32, color: Rgb) {
    let (fw, fh) = (fb.width as i32, fb.height as i32);
    for my in 0..mask.height as i32 {
        let y = pen_y + mask.top + my;
        if y < 0 || y >= fh {
            continue;
        }
        for mx in 0..mask.width as i32 {
            let x = pen_x + mask.left + mx;
            if x < 0 || x >= fw {
                continue;
            }
            let cov = u32::from(mask.alpha[(my * mask.width as i32 + mx) as usize]);
            if cov == 0 {
                continue;
            }
            let idx = (y as usize * fb.width as usize + x as usize) * 4;
            let px = &mut fb.data[idx..idx + 4];
            let inv = 255 - cov;
            px[0] = ((u32::from(color.0) * cov + u32::from(px[0]) * inv) / 255) as u8;
            px[1] = ((u32::from(color.1) * cov + u32::from(px[1]) * inv) / 255) as u8;
            px[2] = ((u32::from(color.2) * cov + u32::from(px[2]) * inv) / 255) as u8;
            px[3] = (cov + u32::from(px[3]) * inv / 255) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::load_font;

    #[test]
    fn tall_gif_anchors_on_width() {
        let l = RasterLayout::gif_frame(20, 20, 100, 100);
        assert!((l.step_x - 5.0).abs() < f64::EPSILON);
        assert!((l.step_y - 10.0).abs() < f64::EPSILON);
        assert_eq!((l.width, l.height), (110, 210));
        assert!((l.font_size - 7.5).abs() < f32::EPSILON);
    }

    #[test]
    fn still_layout_steps() {
        let l = RasterLayout::still(3, 3);
        assert!((l.step_y - 27.0).abs() < f64::EPSILON);
        assert_eq!(l.origin, STILL_ORIGIN);
        assert_eq!(l.width, 37 + 10);
    }

    #[test]
    fn render_paints_background_and_ink() {
        // Pas de police système : rien à vérifier sur cette machine.
        let Ok(font) = load_font(None) else {
            return;
        };
        let r = Rasterizer::new(&font, STILL_FONT_SIZE).unwrap();
        assert!(r.covers('@'));
        let grid = Grid::from_rows(vec![vec![Glyph::plain('@', (255, 0, 0)); 2]]).unwrap();
        let layout = RasterLayout::still(2, 1);
        let fb = r.render(&grid, &layout, Ink::Content, [0, 0, 255, 100]);
        assert_eq!((fb.width, fb.height), (layout.width, layout.height));
        assert_eq!(fb.pixel(0, 0), (0, 0, 255, 255));
        let inked = fb.data.chunks_exact(4).filter(|p| p[0] > 128).count();
        assert!(inked > 0);
    }

    #[test]
    fn transparent_background_opacity() {
        let Ok(font) = load_font(None) else {
            return;
        };
        let r = Rasterizer::new(&font, 10.0).unwrap();
        let grid = Grid::from_rows(vec![vec![Glyph::plain(' ', (0, 0, 0))]]).unwrap();
        let fb = r.render(&grid, &RasterLayout::still(1, 1), Ink::Fixed((255, 255, 255)), [9, 9, 9, 0]);
        assert!(fb.data.chunks_exact(4).all(|p| p == [9, 9, 9, 0]));
    }
}
