use crossterm::style::{Color, Stylize};
use pc_core::error::CoreError;
use pc_core::frame::{Glyph, Grid, Rgb};

/// Profondeur de couleur du terminal, détectée une fois par exécution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorLevel {
    /// 24-bit RGB escape codes.
    TrueColor,
    /// 8-bit palette (xterm 256).
    Ansi256,
    /// 16 colors or fewer: coloring is unavailable.
    None,
}

impl ColorLevel {
    /// Detect from the process environment.
    #[must_use]
    pub fn detect() -> Self {
        Self::detect_from(|key| std::env::var(key).ok())
    }

    /// Detect from an arbitrary variable lookup.
    ///
    /// # Example
    /// ```
    /// use pc_ascii::color::ColorLevel;
    /// let level = ColorLevel::detect_from(|k| (k == "COLORTERM").then(|| "truecolor".to_string()));
    /// assert_eq!(level, ColorLevel::TrueColor);
    /// let level = ColorLevel::detect_from(|k| (k == "TERM").then(|| "xterm-256color".to_string()));
    /// assert_eq!(level, ColorLevel::Ansi256);
    /// assert_eq!(ColorLevel::detect_from(|_| None), ColorLevel::None);
    /// ```
    pub fn detect_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let colorterm = lookup("COLORTERM").unwrap_or_default().to_ascii_lowercase();
        if colorterm == "truecolor" || colorterm == "24bit" || lookup("WT_SESSION").is_some() {
            return Self::TrueColor;
        }
        let term = lookup("TERM").unwrap_or_default().to_ascii_lowercase();
        if term.contains("truecolor") || term.contains("24bit") || term.contains("direct") {
            Self::TrueColor
        } else if term.contains("256") {
            Self::Ansi256
        } else {
            Self::None
        }
    }
}

/// Conversion RGB → palette xterm 256 (cube 6×6×6 + rampe de gris).
///
/// Cube steps are the xterm ones (0, 95, 135, 175, 215, 255); pure grays
/// use the 24-step ramp at `8 + 10 * i`.
///
/// # Example
/// ```
/// use pc_ascii::color::rgb_to_ansi256;
/// assert_eq!(rgb_to_ansi256((255, 0, 0)), 196);
/// assert_eq!(rgb_to_ansi256((0, 0, 0)), 16);
/// assert_eq!(rgb_to_ansi256((255, 255, 255)), 231);
/// ```
#[must_use]
pub fn rgb_to_ansi256((r, g, b): Rgb) -> u8 {
    if r == g && g == b {
        return match r {
            0..8 => 16,
            249.. => 231,
            _ => 232 + ((r - 3) / 10).min(23),
        };
    }
    let step = |c: u8| match c {
        0..48 => 0,
        48..115 => 1,
        _ => (c - 35) / 40,
    };
    16 + 36 * step(r) + 6 * step(g) + step(b)
}

/// Habille les caractères de séquences d'échappement selon le niveau détecté.
#[derive(Clone, Copy, Debug)]
pub struct Colorizer {
    level: ColorLevel,
    background: bool,
}

impl Colorizer {
    /// Build a colorizer for a capable terminal.
    ///
    /// # Errors
    /// Returns [`CoreError::ColorUnsupported`] when the terminal has neither
    /// 24-bit nor 8-bit colors.
    pub fn new(level: ColorLevel, background: bool) -> Result<Self, CoreError> {
        if level == ColorLevel::None {
            return Err(CoreError::ColorUnsupported);
        }
        Ok(Self { level, background })
    }

    fn color(&self, rgb: Rgb) -> Color {
        match self.level {
            ColorLevel::Ansi256 => Color::AnsiValue(rgb_to_ansi256(rgb)),
            ColorLevel::TrueColor | ColorLevel::None => Color::Rgb {
                r: rgb.0,
                g: rgb.1,
                b: rgb.2,
            },
        }
    }

    /// Paint `ch` in `rgb`, behind the glyph when background mode is set.
    #[must_use]
    pub fn paint(&self, ch: char, rgb: Rgb) -> String {
        let color = self.color(rgb);
        if self.background {
            format!("{}", ch.to_string().on(color))
        } else {
            format!("{}", ch.to_string().with(color))
        }
    }
}

/// Ajoute les rendus colorés à chaque glyphe.
///
/// `content` paints the glyph's own color; `font` paints a fixed font color
/// through the same tiers.
#[must_use]
pub fn colorize(
    glyphs: Grid<Glyph>,
    colorizer: &Colorizer,
    content: bool,
    font: Option<Rgb>,
) -> Grid<Glyph> {
    glyphs.map(|g| {
        let styled = content.then(|| colorizer.paint(g.ch, g.source_rgb));
        let font_colored = font.map(|rgb| colorizer.paint(g.ch, rgb));
        g.with_styles(styled, font_colored)
    })
}
