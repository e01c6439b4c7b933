use anyhow::{Context, Result};
use fast_image_resize::images::{Image, ImageRef};
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use pc_core::config::SizePolicy;
use pc_core::error::CoreError;
use pc_core::frame::FrameBuffer;

/// Character cells are about twice as tall as wide.
const CELL_HEIGHT_FACTOR: f64 = 0.5;
const CELL_WIDTH_FACTOR: f64 = 2.0;

/// One braille glyph encodes 2 columns × 4 rows of dots.
pub const BRAILLE_DOTS_X: u32 = 2;
/// See [`BRAILLE_DOTS_X`].
pub const BRAILLE_DOTS_Y: u32 = 4;

/// Calcule les dimensions de la grille de caractères.
///
/// `terminal` is `None` when the caller opted out of terminal comparison;
/// policies that need the terminal then fail with
/// [`CoreError::MissingDimensions`]. In braille mode the returned pixel
/// dimensions are multiplied by 2 × 4.
///
/// # Errors
/// [`CoreError::WidthExceedsTerminal`] when an explicit width reaches the
/// terminal width, [`CoreError::InvalidDimensions`] for an empty source.
///
/// # Example
/// ```
/// use pc_core::config::SizePolicy;
/// use pc_source::resize::target_dimensions;
/// // 200×100 source, 40 columns wanted: height = 40 / 2.0 * 0.5
/// let dims = target_dimensions(200, 100, SizePolicy::Width(40), false, Some((80, 24))).unwrap();
/// assert_eq!(dims, (40, 10));
/// ```
pub fn target_dimensions(
    src_width: u32,
    src_height: u32,
    policy: SizePolicy,
    braille: bool,
    terminal: Option<(u32, u32)>,
) -> Result<(u32, u32), CoreError> {
    if src_width == 0 || src_height == 0 {
        return Err(CoreError::InvalidDimensions {
            width: src_width,
            height: src_height,
        });
    }
    let aspect = f64::from(src_width) / f64::from(src_height);

    let (w, h) = match policy {
        SizePolicy::Full => {
            let (cols, _) = terminal.ok_or(CoreError::MissingDimensions)?;
            let w = cols.saturating_sub(1);
            (w, height_for(w, aspect))
        }
        SizePolicy::Width(w) => (w, height_for(w, aspect)),
        SizePolicy::Height(h) => (width_for(h, aspect), h),
        SizePolicy::Dimensions(w, h) => (w, h),
        SizePolicy::FitTerminal => {
            let (cols, rows) = terminal.ok_or(CoreError::MissingDimensions)?;
            let h = rows.saturating_sub(1);
            let w = width_for(h, aspect);
            if w >= cols {
                // Ancré sur la hauteur, l'art déborde : on ré-ancre sur la largeur.
                let w = cols.saturating_sub(1);
                (w, height_for(w, aspect))
            } else {
                (w, h)
            }
        }
    };
    let (w, h) = (w.max(1), h.max(1));

    if let Some((cols, _)) = terminal
        && matches!(
            policy,
            SizePolicy::Width(_) | SizePolicy::Height(_) | SizePolicy::Dimensions(..)
        )
        && w >= cols
    {
        return Err(CoreError::WidthExceedsTerminal {
            width: w,
            terminal: cols,
        });
    }

    log::debug!("grid {w}×{h} for {src_width}×{src_height} ({policy:?}, braille={braille})");
    if braille {
        Ok((w * BRAILLE_DOTS_X, h * BRAILLE_DOTS_Y))
    } else {
        Ok((w, h))
    }
}

fn height_for(width: u32, aspect: f64) -> u32 {
    let h = (f64::from(width) / aspect) as u32;
    (CELL_HEIGHT_FACTOR * f64::from(h)) as u32
}

fn width_for(height: u32, aspect: f64) -> u32 {
    let w = (f64::from(height) * aspect) as u32;
    (CELL_WIDTH_FACTOR * f64::from(w)) as u32
}

/// Dimensionne puis rééchantillonne une frame pour la grille de caractères.
///
/// # Errors
/// Sizing errors from [`target_dimensions`] (still downcastable to
/// [`CoreError`]), or a resampling failure.
pub fn fit_frame(
    src: &FrameBuffer,
    policy: SizePolicy,
    braille: bool,
    terminal: Option<(u32, u32)>,
) -> Result<FrameBuffer> {
    let (w, h) = target_dimensions(src.width, src.height, policy, braille, terminal)?;
    log::trace!("fit {}×{} → {w}×{h}", src.width, src.height);
    resize_frame(src, w, h)
}

/// Rééchantillonnage Lanczos3 ; la source est lue sans copie.
///
/// # Errors
/// Returns an error if either buffer doesn't match its dimensions.
///
/// # Example
/// ```
/// use pc_source::resize::resize_frame;
/// use pc_core::frame::FrameBuffer;
/// let src = FrameBuffer::new(100, 100);
/// let dst = resize_frame(&src, 50, 25).unwrap();
/// assert_eq!((dst.width, dst.height), (50, 25));
/// ```
pub fn resize_frame(src: &FrameBuffer, width: u32, height: u32) -> Result<FrameBuffer> {
    if (src.width, src.height) == (width, height) {
        return Ok(src.clone());
    }
    let view = ImageRef::new(src.width, src.height, &src.data, PixelType::U8x4)
        .with_context(|| format!("Frame source incohérente : {}×{}", src.width, src.height))?;

    let mut dst = FrameBuffer::new(width, height);
    {
        let mut out = Image::from_slice_u8(width, height, &mut dst.data, PixelType::U8x4)
            .with_context(|| format!("Grille cible invalide : {width}×{height}"))?;
        let lanczos = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
        Resizer::new()
            .resize(&view, &mut out, &lanczos)
            .context("Rééchantillonnage impossible")?;
    }
    Ok(dst)
}
