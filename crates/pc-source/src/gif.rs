use std::io::Cursor;

use anyhow::{Context, Result, bail};
use pc_core::error::CoreError;
use pc_core::frame::{Bounds, FrameBuffer, Looping};

/// Une frame GIF décodée, pas encore convertie.
#[derive(Clone, Debug)]
pub struct GifFrame {
    /// RGBA pixels of the frame rectangle.
    pub buffer: FrameBuffer,
    /// Delay in 1/100 s.
    pub delay: u16,
    /// Rectangle inside the logical screen.
    pub bounds: Bounds,
}

/// Animation décodée : frames dans l'ordre + politique de bouclage.
#[derive(Clone, Debug)]
pub struct GifSource {
    /// Frames in display order.
    pub frames: Vec<GifFrame>,
    /// Loop policy read from the NETSCAPE extension.
    pub looping: Looping,
}

impl GifSource {
    /// Decode every frame of a GIF as RGBA.
    ///
    /// # Errors
    /// Returns an error on corrupt data or when the GIF holds no frame.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options
            .read_info(Cursor::new(bytes))
            .context("En-tête GIF invalide")?;

        let mut frames = Vec::new();
        while let Some(frame) = decoder
            .read_next_frame()
            .with_context(|| format!("Frame {} illisible", frames.len()))?
        {
            let (w, h) = (u32::from(frame.width), u32::from(frame.height));
            let buffer = FrameBuffer::from_rgba(w, h, frame.buffer.to_vec())?;
            frames.push(GifFrame {
                buffer,
                delay: frame.delay,
                bounds: Bounds {
                    left: u32::from(frame.left),
                    top: u32::from(frame.top),
                    width: w,
                    height: h,
                },
            });
        }
        if frames.is_empty() {
            bail!("GIF sans frame");
        }

        // L'extension NETSCAPE est connue une fois le flux lu ; absente, le
        // décodeur rapporte `Finite(0)`.
        let looping = Looping::from_count(match decoder.repeat() {
            gif::Repeat::Infinite => Some(0),
            gif::Repeat::Finite(0) => None,
            gif::Repeat::Finite(n) => Some(n),
        });
        log::info!("GIF: {} frames, {looping:?}", frames.len());
        Ok(Self { frames, looping })
    }

    /// Every frame must cover exactly the rectangle of frame 0.
    ///
    /// # Errors
    /// Returns [`CoreError::FrameBoundsMismatch`] for the first offending frame.
    pub fn check_bounds(&self) -> Result<(), CoreError> {
        let Some(first) = self.frames.first() else {
            return Ok(());
        };
        let expected = first.bounds;
        for (index, frame) in self.frames.iter().enumerate().skip(1) {
            if frame.bounds != expected {
                return Err(CoreError::FrameBoundsMismatch {
                    index,
                    expected: expected.as_tuple(),
                    found: frame.bounds.as_tuple(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(left: u32, top: u32, w: u32, h: u32) -> GifFrame {
        GifFrame {
            buffer: FrameBuffer::new(w, h),
            delay: 5,
            bounds: Bounds {
                left,
                top,
                width: w,
                height: h,
            },
        }
    }

    fn encode(frames: &[(u16, u16, u16, u16)], repeat: Option<gif::Repeat>) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut enc = gif::Encoder::new(&mut out, 4, 4, &[]).unwrap();
            if let Some(repeat) = repeat {
                enc.set_repeat(repeat).unwrap();
            }
            for &(left, top, w, h) in frames {
                let mut px = vec![200u8; usize::from(w) * usize::from(h) * 4];
                let mut f = gif::Frame::from_rgba_speed(w, h, &mut px, 10);
                f.left = left;
                f.top = top;
                f.delay = 7;
                enc.write_frame(&f).unwrap();
            }
        }
        out
    }

    #[test]
    fn decodes_frames_and_loop_count() {
        let bytes = encode(&[(0, 0, 4, 4), (0, 0, 4, 4)], Some(gif::Repeat::Infinite));
        let src = GifSource::decode(&bytes).unwrap();
        assert_eq!(src.frames.len(), 2);
        assert_eq!(src.frames[1].delay, 7);
        assert_eq!(src.looping, Looping::Forever);
        assert!(src.check_bounds().is_ok());
    }

    #[test]
    fn finite_repeat_is_kept() {
        let bytes = encode(&[(0, 0, 4, 4)], Some(gif::Repeat::Finite(3)));
        assert_eq!(GifSource::decode(&bytes).unwrap().looping, Looping::Times(3));
    }

    #[test]
    fn missing_loop_extension_plays_once() {
        let bytes = encode(&[(0, 0, 4, 4)], None);
        assert_eq!(GifSource::decode(&bytes).unwrap().looping, Looping::Once);
    }

    #[test]
    fn mismatched_third_frame_is_reported() {
        let src = GifSource {
            frames: vec![frame(0, 0, 4, 4), frame(0, 0, 4, 4), frame(1, 0, 3, 4)],
            looping: Looping::Forever,
        };
        assert_eq!(
            src.check_bounds(),
            Err(CoreError::FrameBoundsMismatch {
                index: 2,
                expected: (0, 0, 4, 4),
                found: (1, 0, 3, 4),
            })
        );
    }

    #[test]
    fn decoded_partial_frame_fails_bounds() {
        let bytes = encode(&[(0, 0, 4, 4), (1, 1, 2, 2)], Some(gif::Repeat::Infinite));
        let src = GifSource::decode(&bytes).unwrap();
        assert!(matches!(
            src.check_bounds(),
            Err(CoreError::FrameBoundsMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn truncated_data_fails() {
        assert!(GifSource::decode(b"GIF89a").is_err());
    }
}
