use pc_core::error::CoreError;
use pc_core::frame::{BrailleCell, Depth, FrameBuffer, Grid, Sample};
use rayon::prelude::*;

use crate::dither::Bitmap;

/// Mesure chaque pixel de l'image redimensionnée, une ligne par tâche rayon.
///
/// With a dithered bitmap, density comes from the bitmap at 8-bit depth
/// while both color triples still come from `frame`.
///
/// # Example
/// ```
/// use pc_ascii::sampler::sample;
/// use pc_core::frame::FrameBuffer;
/// let grid = sample(&FrameBuffer::filled(3, 2, (0, 0, 0)), None).unwrap();
/// assert_eq!((grid.width(), grid.height()), (3, 2));
/// ```
///
/// # Errors
/// Returns [`CoreError::RaggedGrid`] if the buffer doesn't match its dimensions.
pub fn sample(frame: &FrameBuffer, dithered: Option<&Bitmap>) -> Result<Grid<Sample>, CoreError> {
    let (w, h) = (frame.width as usize, frame.height as usize);
    let mut cells = vec![Sample::from_pixel(0, 0, 0); w * h];

    if w > 0 {
        cells
            .par_chunks_mut(w)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, cell) in row.iter_mut().enumerate() {
                    let (r, g, b, _) = frame.pixel(x as u32, y as u32);
                    let mut s = Sample::from_pixel(r, g, b);
                    if let Some(bm) = dithered {
                        s.density = u16::from(bm.level(x as u32, y as u32));
                        s.depth = Depth::Narrow;
                    }
                    *cell = s;
                }
            });
    }

    Grid::from_cells(w, h, cells)
}

/// Regroupe les pixels en supercellules braille 2×4.
///
/// # Errors
/// Returns [`CoreError::InvalidDimensions`] if the grid isn't a multiple of 2 × 4.
pub fn group_braille(samples: &Grid<Sample>) -> Result<Grid<BrailleCell>, CoreError> {
    let (w, h) = (samples.width(), samples.height());
    if w % 2 != 0 || h % 4 != 0 {
        return Err(CoreError::InvalidDimensions {
            width: w as u32,
            height: h as u32,
        });
    }

    let (cw, ch) = (w / 2, h / 4);
    let mut cells = Vec::with_capacity(cw * ch);
    for cy in 0..ch {
        for cx in 0..cw {
            let (x0, y0) = (cx * 2, cy * 4);
            let dots = std::array::from_fn(|i| *samples.get(x0 + i % 2, y0 + i / 2));
            cells.push(BrailleCell {
                representative: *samples.get(x0, y0),
                dots,
            });
        }
    }
    Grid::from_cells(cw, ch, cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dither::floyd_steinberg;

    #[test]
    fn dither_only_touches_density() {
        let fb = FrameBuffer::filled(4, 4, (200, 30, 90));
        let bm = floyd_steinberg(&fb);
        let plain = sample(&fb, None).unwrap();
        let dithered = sample(&fb, Some(&bm)).unwrap();
        for (a, b) in plain.cells().iter().zip(dithered.cells()) {
            assert_eq!(a.color, b.color);
            assert_eq!(a.gray, b.gray);
            assert_eq!(b.depth, Depth::Narrow);
            assert!(b.density == 0 || b.density == 255);
        }
    }

    #[test]
    fn braille_groups_two_by_four() {
        let mut fb = FrameBuffer::filled(4, 8, (0, 0, 0));
        fb.put(1, 3, [255, 255, 255, 255]);
        let cells = group_braille(&sample(&fb, None).unwrap()).unwrap();
        assert_eq!((cells.width(), cells.height()), (2, 2));
        let first = cells.get(0, 0);
        // ligne 3, colonne 1 → index 7
        assert_eq!(first.dots[7].level(), 255);
        assert!(first.dots[..7].iter().all(|d| d.level() == 0));
    }

    #[test]
    fn braille_rejects_partial_blocks() {
        let grid = sample(&FrameBuffer::new(3, 8), None).unwrap();
        assert!(group_braille(&grid).is_err());
    }
}
