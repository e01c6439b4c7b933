use std::io::Write;

use anyhow::{Context, Result, bail};
use pc_ascii::compositor::{Compositor, flatten, flatten_plain};
use pc_core::config::{ColorMode, ConvertConfig};
use pc_core::error::CoreError;
use pc_core::frame::FrameBuffer;
use pc_export::font::FontSource;
use pc_export::rasterizer::{Ink, RasterLayout, Rasterizer, STILL_FONT_SIZE};
use pc_export::save;
use pc_source::gif::GifSource;
use pc_source::image::{Decoded, acquire, decode};

use crate::pipeline::{BoundedPool, convert_gif, rasterize_gif};
use crate::player::{TerminalSink, play};

/// Ressources partagées par toutes les entrées d'une invocation.
pub struct RunContext<'a> {
    /// Validated conversion chain.
    pub compositor: &'a Compositor,
    /// Worker pool for GIF frames.
    pub pool: &'a BoundedPool,
    /// Loaded only when raster output is requested.
    pub font: Option<&'a FontSource>,
}

impl RunContext<'_> {
    fn config(&self) -> &ConvertConfig {
        self.compositor.config()
    }

    fn font(&self) -> Result<&FontSource> {
        self.font.context("Aucune police chargée pour la sortie image")
    }

    fn ink(&self) -> Ink {
        let cfg = self.config();
        if cfg.color_mode == ColorMode::Plain {
            Ink::Fixed(cfg.font_color)
        } else {
            Ink::Content
        }
    }
}

/// Vérifie que chaque répertoire de sauvegarde existe, avant toute conversion.
///
/// # Errors
/// Names the first save directory that is missing or not a directory.
pub fn check_save_dirs(config: &ConvertConfig) -> Result<()> {
    let dirs = [
        ("--save-txt", &config.save_txt),
        ("--save-img", &config.save_img),
        ("--save-gif", &config.save_gif),
    ];
    for (flag, dir) in dirs {
        if let Some(dir) = dir
            && !dir.is_dir()
        {
            bail!("{flag}: le répertoire {} n'existe pas", dir.display());
        }
    }
    Ok(())
}

/// Vrai si l'erreur vaut pour toute l'invocation, pas seulement cette entrée.
///
/// Configuration errors surfacing at conversion time (width wider than the
/// terminal, for instance) would fail every remaining input the same way.
#[must_use]
pub fn aborts_run(err: &anyhow::Error) -> bool {
    err.downcast_ref::<CoreError>().is_some_and(CoreError::is_configuration)
}

/// Traite une entrée de bout en bout : lecture, conversion, affichage, sauvegardes.
///
/// Terminal text goes to `out`.
///
/// # Errors
/// Acquisition, decoding, conversion or save failures for this input.
pub fn process_input(arg: &str, ctx: &RunContext<'_>, out: &mut impl Write) -> Result<()> {
    let source = acquire(arg)?;
    let stem = source.origin.stem();
    match decode(&source)? {
        Decoded::Still(frame) => convert_still(&frame, &stem, ctx, out),
        Decoded::Animation(gif) => convert_animation(&gif, &stem, ctx, out),
    }
}

fn convert_still(
    frame: &FrameBuffer,
    stem: &str,
    ctx: &RunContext<'_>,
    out: &mut impl Write,
) -> Result<()> {
    let cfg = ctx.config();
    if cfg.save_gif.is_some() {
        log::warn!("{stem}: image fixe, --save-gif ignoré");
    }

    let glyphs = ctx.compositor.process(frame)?;
    log::debug!("{stem}: grille {}×{}", glyphs.width(), glyphs.height());

    if !cfg.only_save {
        writeln!(out, "{}", flatten(&glyphs)).context("Écriture terminal")?;
    }
    if let Some(dir) = &cfg.save_txt {
        save::save_txt(dir, stem, &flatten_plain(&glyphs))?;
    }
    if let Some(dir) = &cfg.save_img {
        let mut rasterizer = Rasterizer::new(ctx.font()?, STILL_FONT_SIZE)?;
        rasterizer.cache_chars(ctx.compositor.table().glyphs().iter().copied());
        let layout = RasterLayout::still(glyphs.width(), glyphs.height());
        let canvas = rasterizer.render(&glyphs, &layout, ctx.ink(), cfg.save_bg_color);
        save::save_png(dir, stem, &canvas)?;
    }
    Ok(())
}

fn convert_animation(
    gif: &GifSource,
    stem: &str,
    ctx: &RunContext<'_>,
    out: &mut impl Write,
) -> Result<()> {
    let cfg = ctx.config();
    if cfg.save_txt.is_some() || cfg.save_img.is_some() {
        log::warn!("{stem}: GIF, seul --save-gif est pris en compte");
    }
    log::info!("{stem}: {} frames", gif.frames.len());

    let converted = convert_gif(ctx.pool, ctx.compositor, gif)?;

    if let Some(dir) = &cfg.save_gif {
        let encoded = rasterize_gif(
            ctx.pool,
            ctx.font()?,
            &converted.frames,
            ctx.compositor.table().glyphs(),
            ctx.ink(),
            cfg.save_bg_color,
        )?;
        save::save_gif(dir, stem, &encoded, converted.looping)?;
    }

    if !cfg.only_save {
        let texts: Vec<String> = converted.frames.iter().map(|f| flatten(&f.glyphs)).collect();
        let delays: Vec<u16> = converted.frames.iter().map(|f| f.delay).collect();
        play(&mut TerminalSink::new(out), &texts, &delays, converted.looping)?;
    }
    Ok(())
}

/// Message affiché pour `--formats`.
#[must_use]
pub fn formats_text() -> String {
    format!(
        "Supported input formats: {}",
        pc_source::image::SUPPORTED_FORMATS.join(", ")
    )
}
