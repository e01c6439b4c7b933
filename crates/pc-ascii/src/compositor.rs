use anyhow::Result;
use pc_core::charset::CharacterTable;
use pc_core::config::{ColorMode, ConvertConfig, SizePolicy};
use pc_core::error::CoreError;
use pc_core::frame::{FrameBuffer, Glyph, Grid};
use pc_source::resize::{fit_frame, target_dimensions};
use pc_source::terminal::TerminalGeometry;

use crate::color::{ColorLevel, Colorizer, colorize};
use crate::dither::floyd_steinberg;
use crate::mapper::{map_braille, map_ramp};
use crate::sampler::{group_braille, sample};

/// Compositor orchestre la chaîne pixel→glyphe pour une image.
///
/// Built once per run from a validated configuration; `process` only reads
/// it, so one compositor can be shared by every frame worker.
///
/// # Example
/// ```
/// use pc_ascii::color::ColorLevel;
/// use pc_ascii::compositor::Compositor;
/// use pc_core::{ConvertConfig, FrameBuffer};
/// use pc_source::FixedTerminal;
///
/// let mut config = ConvertConfig::default();
/// config.dimensions = Some((2, 2));
/// let terminal = FixedTerminal { columns: 80, rows: 24 };
/// let compositor = Compositor::new(&config, ColorLevel::None, &terminal).unwrap();
/// let grid = compositor.process(&FrameBuffer::filled(2, 2, (128, 128, 128))).unwrap();
/// assert_eq!(pc_ascii::compositor::flatten_plain(&grid), "++\n++");
/// ```
#[derive(Debug)]
pub struct Compositor {
    config: ConvertConfig,
    policy: SizePolicy,
    table: CharacterTable,
    terminal: Option<(u32, u32)>,
    level: ColorLevel,
}

impl Compositor {
    /// Validate the configuration and snapshot the terminal size.
    ///
    /// # Errors
    /// Any configuration error, or the geometry provider's error when the
    /// terminal size is needed.
    pub fn new(
        config: &ConvertConfig,
        level: ColorLevel,
        terminal: &dyn TerminalGeometry,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let policy = config.size_policy()?;
        let terminal = if config.no_term_size_comparison {
            None
        } else {
            Some(terminal.size()?)
        };
        let table = config.table()?;
        log::debug!(
            "compositor: {policy:?}, table of {} glyphs, terminal {terminal:?}, {level:?}",
            table.len()
        );
        Ok(Self {
            config: config.clone(),
            policy,
            table,
            terminal,
            level,
        })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Ramp in use, for callers that rasterise its glyphs.
    #[must_use]
    pub fn table(&self) -> &CharacterTable {
        &self.table
    }

    /// Character grid dimensions for a source of this size.
    ///
    /// # Errors
    /// Same as [`target_dimensions`].
    pub fn grid_dimensions(&self, width: u32, height: u32) -> Result<(u32, u32), CoreError> {
        target_dimensions(width, height, self.policy, false, self.terminal)
    }

    /// Resize → (dither) → sample → flip → map → colorize.
    ///
    /// # Errors
    /// Sizing errors, resize failures, and [`CoreError::ColorUnsupported`]
    /// when coloring is requested on an incapable terminal.
    pub fn process(&self, frame: &FrameBuffer) -> Result<Grid<Glyph>> {
        let cfg = &self.config;
        let colorizer = if cfg.wants_color() {
            Some(Colorizer::new(self.level, cfg.color_bg)?)
        } else {
            None
        };

        let resized = fit_frame(frame, self.policy, cfg.braille, self.terminal)?;

        let bitmap = (cfg.braille && cfg.dither).then(|| floyd_steinberg(&resized));
        let mut samples = sample(&resized, bitmap.as_ref())?;
        if cfg.flip_x {
            samples.flip_x();
        }
        if cfg.flip_y {
            samples.flip_y();
        }

        let glyphs = if cfg.braille {
            let cells = group_braille(&samples)?;
            map_braille(cells, cfg.threshold, cfg.negative, cfg.color_mode)
        } else {
            map_ramp(samples, &self.table, cfg.negative, cfg.color_mode)
        };

        Ok(match colorizer {
            Some(c) => {
                let content = cfg.color_mode != ColorMode::Plain;
                let font = cfg.has_font_color().then_some(cfg.font_color);
                colorize(glyphs, &c, content, font)
            }
            None => glyphs,
        })
    }
}

/// Texte final : lignes jointes par `\n`, rendu terminal de chaque glyphe.
#[must_use]
pub fn flatten(grid: &Grid<Glyph>) -> String {
    join_rows(grid, |g| g.display().to_string())
}

/// Text without escape codes, as written to `.txt` files.
#[must_use]
pub fn flatten_plain(grid: &Grid<Glyph>) -> String {
    join_rows(grid, |g| g.ch.to_string())
}

fn join_rows(grid: &Grid<Glyph>, render: impl Fn(&Glyph) -> String) -> String {
    grid.rows()
        .map(|row| row.iter().map(&render).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
