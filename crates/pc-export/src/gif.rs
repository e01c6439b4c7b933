use std::io::Write;

use anyhow::{Context, Result, bail};
use pc_core::frame::{FrameBuffer, Looping};

/// Vitesse de quantification NeuQuant (1 = lent et fidèle, 30 = rapide).
const QUANTIZE_SPEED: i32 = 10;

/// Quantifie un canevas en frame GIF opaque (palette locale 256 couleurs).
///
/// CPU-bound: meant to run inside the raster worker pool.
///
/// # Errors
/// Returns an error if the canvas exceeds 65535 pixels on a side.
pub fn quantize_frame(fb: &FrameBuffer, delay: u16) -> Result<gif::Frame<'static>> {
    let (w, h) = gif_dimensions(fb.width, fb.height)?;
    let mut rgba = fb.data.clone();
    for px in rgba.chunks_exact_mut(4) {
        px[3] = 255;
    }
    let mut frame = gif::Frame::from_rgba_speed(w, h, &mut rgba, QUANTIZE_SPEED);
    frame.delay = delay;
    Ok(frame)
}

fn gif_dimensions(width: u32, height: u32) -> Result<(u16, u16)> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => bail!("GIF trop grand : {width}×{height}"),
    }
}

/// Écrit les frames dans l'ordre, avec la politique de bouclage source.
///
/// # Errors
/// Returns an error if there are no frames or encoding fails.
pub fn write_gif<W: Write>(out: W, frames: &[gif::Frame<'_>], looping: Looping) -> Result<()> {
    let Some(first) = frames.first() else {
        bail!("GIF sans frame");
    };
    let mut encoder =
        gif::Encoder::new(out, first.width, first.height, &[]).context("Encodeur GIF")?;
    // Sans compte de boucles, pas d'extension NETSCAPE : une seule lecture.
    if let Some(count) = looping.count() {
        let repeat = if count == 0 {
            gif::Repeat::Infinite
        } else {
            gif::Repeat::Finite(count)
        };
        encoder.set_repeat(repeat).context("Extension de bouclage")?;
    }
    for (i, frame) in frames.iter().enumerate() {
        encoder
            .write_frame(frame)
            .with_context(|| format!("Écriture de la frame {i}"))?;
    }
    log::debug!("gif: {} frames written", frames.len());
    Ok(())
}
