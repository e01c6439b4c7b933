//! Tramage par diffusion d'erreur (Floyd–Steinberg) vers une palette noir/blanc stricte.
//! Le résultat ne sert qu'à la densité des points braille, jamais à la couleur.

use pc_core::frame::FrameBuffer;

/// Image monochrome : chaque pixel vaut 0 ou 255.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// One byte per pixel, row-major.
    pub data: Vec<u8>,
}

impl Bitmap {
    /// Level of pixel (x, y): 0 or 255.
    #[inline]
    #[must_use]
    pub fn level(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }
}

/// Floyd–Steinberg sur la luminance, erreur répartie 7/16, 3/16, 5/16, 1/16.
///
/// # Example
/// ```
/// use pc_ascii::dither::floyd_steinberg;
/// use pc_core::frame::FrameBuffer;
/// let bm = floyd_steinberg(&FrameBuffer::filled(4, 4, (255, 255, 255)));
/// assert!(bm.data.iter().all(|&v| v == 255));
/// ```
#[must_use]
pub fn floyd_steinberg(frame: &FrameBuffer) -> Bitmap {
    let (w, h) = (frame.width as usize, frame.height as usize);
    // Erreur accumulée en 1/16 de niveau.
    let mut work: Vec<i32> = Vec::with_capacity(w * h);
    for y in 0..frame.height {
        for x in 0..frame.width {
            work.push(i32::from(frame.luminance(x, y)) * 16);
        }
    }

    let mut data = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let old = work[idx].clamp(0, 255 * 16);
            let new = if old >= 128 * 16 { 255 * 16 } else { 0 };
            data[idx] = if new == 0 { 0 } else { 255 };
            let err = (old - new) / 16;

            if x + 1 < w {
                work[idx + 1] += err * 7;
            }
            if y + 1 < h {
                if x > 0 {
                    work[idx + w - 1] += err * 3;
                }
                work[idx + w] += err * 5;
                if x + 1 < w {
                    work[idx + w + 1] += err;
                }
            }
        }
    }

    Bitmap {
        width: frame.width,
        height: frame.height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_strictly_two_level() {
        let mut fb = FrameBuffer::new(16, 16);
        for y in 0..16 {
            for x in 0..16 {
                let v = (x * 16) as u8;
                fb.put(x, y, [v, v, v, 255]);
            }
        }
        let bm = floyd_steinberg(&fb);
        assert!(bm.data.iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn black_stays_black() {
        let bm = floyd_steinberg(&FrameBuffer::filled(8, 8, (0, 0, 0)));
        assert!(bm.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn mid_gray_is_roughly_half_lit() {
        let bm = floyd_steinberg(&FrameBuffer::filled(32, 32, (128, 128, 128)));
        let lit = bm.data.iter().filter(|&&v| v == 255).count();
        let total = bm.data.len();
        assert!(lit > total * 2 / 5 && lit < total * 3 / 5, "{lit}/{total}");
    }
}
