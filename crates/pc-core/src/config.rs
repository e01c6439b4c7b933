use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::CharacterTable;
use crate::error::CoreError;
use crate::frame::Rgb;

/// Default braille threshold.
pub const DEFAULT_THRESHOLD: u8 = 128;

/// Default font color; white means "no explicit font color".
pub const WHITE: Rgb = (255, 255, 255);

/// Configuration complète d'une conversion. Immuable une fois validée.
///
/// Passed by reference through every pipeline stage; nothing is stored in
/// process-wide state, so repeated conversions in one process never see
/// each other's options.
///
/// # Example
/// ```
/// use pc_core::config::ConvertConfig;
/// let config = ConvertConfig::default();
/// assert_eq!(config.threshold, 128);
/// assert!(config.validate().is_ok());
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConvertConfig {
    // === Dimensions ===
    /// Exact (width, height) in characters; no aspect correction.
    pub dimensions: Option<(u32, u32)>,
    /// Width in characters, height derived from the aspect ratio.
    pub width: Option<u32>,
    /// Height in characters, width derived from the aspect ratio.
    pub height: Option<u32>,
    /// Fill the terminal width. Overrides every other sizing option.
    pub full: bool,
    /// Do not compare the art against the terminal (library / server use).
    pub no_term_size_comparison: bool,

    // === Glyphes ===
    /// Use the extended ramp instead of the 10-entry one.
    pub complex: bool,
    /// Custom ramp, darkest → lightest. Overrides `complex`.
    pub custom_map: Option<String>,
    /// Braille mode. Overrides `complex` and `custom_map`.
    pub braille: bool,
    /// Braille dot threshold, 0–255.
    pub threshold: u8,
    /// Floyd–Steinberg dithering before braille conversion.
    pub dither: bool,
    /// Invert glyph selection and colors.
    pub negative: bool,
    /// Mirror horizontally.
    pub flip_x: bool,
    /// Mirror vertically.
    pub flip_y: bool,

    // === Couleur ===
    /// Source of terminal coloring.
    pub color_mode: ColorMode,
    /// Paint colors behind glyphs instead of on them.
    pub color_bg: bool,
    /// Explicit font color (terminal and saved images).
    pub font_color: Rgb,

    // === Sauvegarde ===
    /// Font file used for saved images.
    pub font_path: Option<PathBuf>,
    /// Background of saved images, RGBA with alpha in 0–100.
    pub save_bg_color: [u8; 4],
    /// Directory receiving `<name>-ascii-art.txt`.
    pub save_txt: Option<PathBuf>,
    /// Directory receiving `<name>-ascii-art.png`.
    pub save_img: Option<PathBuf>,
    /// Directory receiving `<name>-ascii-art.gif`.
    pub save_gif: Option<PathBuf>,
    /// Do not print to the terminal.
    pub only_save: bool,
}

/// Color source for terminal output.
///
/// # Example
/// ```
/// use pc_core::config::ColorMode;
/// assert_eq!(ColorMode::default(), ColorMode::Plain);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ColorMode {
    /// No content color.
    #[default]
    Plain,
    /// Gray level of each pixel.
    Grayscale,
    /// Original pixel color. Overrides `Grayscale` and the font color.
    Colored,
}

/// Politique de dimensionnement résolue à partir de la configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizePolicy {
    /// Terminal width − 1, height from the aspect ratio.
    Full,
    /// Fixed width, height from the aspect ratio.
    Width(u32),
    /// Fixed height, width from the aspect ratio.
    Height(u32),
    /// Exact dimensions.
    Dimensions(u32, u32),
    /// Fit the terminal height, falling back to its width.
    FitTerminal,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            dimensions: None,
            width: None,
            height: None,
            full: false,
            no_term_size_comparison: false,
            complex: false,
            custom_map: None,
            braille: false,
            threshold: DEFAULT_THRESHOLD,
            dither: false,
            negative: false,
            flip_x: false,
            flip_y: false,
            color_mode: ColorMode::Plain,
            color_bg: false,
            font_color: WHITE,
            font_path: None,
            save_bg_color: [0, 0, 0, 100],
            save_txt: None,
            save_img: None,
            save_gif: None,
            only_save: false,
        }
    }
}

impl ConvertConfig {
    /// Set the braille threshold from an unchecked integer.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidThreshold`] outside 0–255.
    ///
    /// # Example
    /// ```
    /// use pc_core::config::ConvertConfig;
    /// let mut c = ConvertConfig::default();
    /// assert!(c.set_threshold(170).is_ok());
    /// assert!(c.set_threshold(256).is_err());
    /// assert!(c.set_threshold(-1).is_err());
    /// ```
    pub fn set_threshold(&mut self, value: i64) -> Result<(), CoreError> {
        self.threshold = u8::try_from(value).map_err(|_| CoreError::InvalidThreshold(value))?;
        Ok(())
    }

    /// Vérifie toutes les options avant tout travail sur les pixels.
    ///
    /// # Errors
    /// Returns the first configuration error found.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.width.is_some() && self.height.is_some() {
            return Err(CoreError::ConflictingDimensions);
        }
        if let Some((w, h)) = self.dimensions
            && (w == 0 || h == 0)
        {
            return Err(CoreError::InvalidDimensions {
                width: w,
                height: h,
            });
        }
        if self.width == Some(0) || self.height == Some(0) {
            return Err(CoreError::InvalidDimensions {
                width: self.width.unwrap_or(0),
                height: self.height.unwrap_or(0),
            });
        }
        if let Some(map) = &self.custom_map {
            CharacterTable::custom(map)?;
        }
        if self.dither && !self.braille {
            return Err(CoreError::DitherWithoutBraille);
        }
        if self.save_bg_color[3] > 100 {
            return Err(CoreError::Config(format!(
                "save background opacity must be between 0 and 100, got {}",
                self.save_bg_color[3]
            )));
        }
        if self.only_save && !self.saves_anything() {
            return Err(CoreError::Config(
                "only_save needs one of save_txt, save_img or save_gif".into(),
            ));
        }
        self.size_policy()?;
        Ok(())
    }

    /// Resolve sizing precedence: full > dimensions > width/height > terminal fit.
    ///
    /// # Errors
    /// [`CoreError::ConflictingDimensions`] if width and height are both set;
    /// [`CoreError::MissingDimensions`] if terminal comparison is disabled and
    /// no explicit size remains.
    ///
    /// # Example
    /// ```
    /// use pc_core::config::{ConvertConfig, SizePolicy};
    /// let mut c = ConvertConfig::default();
    /// c.width = Some(60);
    /// assert_eq!(c.size_policy().unwrap(), SizePolicy::Width(60));
    /// ```
    pub fn size_policy(&self) -> Result<SizePolicy, CoreError> {
        let policy = if self.full {
            SizePolicy::Full
        } else if let Some((w, h)) = self.dimensions {
            SizePolicy::Dimensions(w, h)
        } else {
            match (self.width, self.height) {
                (Some(_), Some(_)) => return Err(CoreError::ConflictingDimensions),
                (Some(w), None) => SizePolicy::Width(w),
                (None, Some(h)) => SizePolicy::Height(h),
                (None, None) => SizePolicy::FitTerminal,
            }
        };
        if self.no_term_size_comparison
            && matches!(policy, SizePolicy::Full | SizePolicy::FitTerminal)
        {
            return Err(CoreError::MissingDimensions);
        }
        Ok(policy)
    }

    /// Ramp selected by the options (ignored in braille mode).
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidCustomMap`] for a degenerate custom map.
    pub fn table(&self) -> Result<CharacterTable, CoreError> {
        match &self.custom_map {
            Some(map) => CharacterTable::custom(map),
            None if self.complex => Ok(CharacterTable::detailed()),
            None => Ok(CharacterTable::simple()),
        }
    }

    /// True if any save directory is set.
    #[must_use]
    pub fn saves_anything(&self) -> bool {
        self.save_txt.is_some() || self.save_img.is_some() || self.save_gif.is_some()
    }

    /// True if a font color other than white was requested.
    #[must_use]
    pub fn has_font_color(&self) -> bool {
        self.font_color != WHITE
    }

    /// True if terminal output needs escape sequences.
    #[must_use]
    pub fn wants_color(&self) -> bool {
        self.color_mode != ColorMode::Plain || self.has_font_color()
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize, Default)]
struct ConfigFile {
    convert: Option<ConvertSection>,
}

/// `[convert]` section, all fields optional for partial override.
#[derive(Deserialize, Default)]
struct ConvertSection {
    dimensions: Option<(u32, u32)>,
    width: Option<u32>,
    height: Option<u32>,
    full: Option<bool>,
    no_term_size_comparison: Option<bool>,
    complex: Option<bool>,
    custom_map: Option<String>,
    braille: Option<bool>,
    threshold: Option<i64>,
    dither: Option<bool>,
    negative: Option<bool>,
    flip_x: Option<bool>,
    flip_y: Option<bool>,
    color_mode: Option<ColorMode>,
    color_bg: Option<bool>,
    font_color: Option<Rgb>,
    font_path: Option<PathBuf>,
    save_bg_color: Option<[u8; 4]>,
    save_txt: Option<PathBuf>,
    save_img: Option<PathBuf>,
    save_gif: Option<PathBuf>,
    only_save: Option<bool>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or carries an
/// out-of-range threshold.
pub fn load_config(path: &Path) -> Result<ConvertConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("can't read config {}", path.display()))?;
    parse_config(&content).with_context(|| format!("invalid config in {}", path.display()))
}

/// Parse TOML text over [`ConvertConfig::default`].
///
/// # Errors
/// Returns an error on malformed TOML or an out-of-range threshold.
///
/// # Example
/// ```
/// use pc_core::config::parse_config;
/// let c = parse_config("[convert]\nbraille = true\nthreshold = 90\n").unwrap();
/// assert!(c.braille);
/// assert_eq!(c.threshold, 90);
/// ```
pub fn parse_config(content: &str) -> Result<ConvertConfig> {
    let file: ConfigFile = toml::from_str(content).context("TOML parse error")?;
    let mut config = ConvertConfig::default();
    let Some(s) = file.convert else {
        return Ok(config);
    };

    if let Some(v) = s.dimensions {
        config.dimensions = Some(v);
    }
    if let Some(v) = s.width {
        config.width = Some(v);
    }
    if let Some(v) = s.height {
        config.height = Some(v);
    }
    if let Some(v) = s.full {
        config.full = v;
    }
    if let Some(v) = s.no_term_size_comparison {
        config.no_term_size_comparison = v;
    }
    if let Some(v) = s.complex {
        config.complex = v;
    }
    if let Some(v) = s.custom_map {
        config.custom_map = Some(v);
    }
    if let Some(v) = s.braille {
        config.braille = v;
    }
    if let Some(v) = s.threshold {
        config.set_threshold(v)?;
    }
    if let Some(v) = s.dither {
        config.dither = v;
    }
    if let Some(v) = s.negative {
        config.negative = v;
    }
    if let Some(v) = s.flip_x {
        config.flip_x = v;
    }
    if let Some(v) = s.flip_y {
        config.flip_y = v;
    }
    if let Some(v) = s.color_mode {
        config.color_mode = v;
    }
    if let Some(v) = s.color_bg {
        config.color_bg = v;
    }
    if let Some(v) = s.font_color {
        config.font_color = v;
    }
    if let Some(v) = s.font_path {
        config.font_path = Some(v);
    }
    if let Some(v) = s.save_bg_color {
        config.save_bg_color = v;
    }
    if let Some(v) = s.save_txt {
        config.save_txt = Some(v);
    }
    if let Some(v) = s.save_img {
        config.save_img = Some(v);
    }
    if let Some(v) = s.save_gif {
        config.save_gif = Some(v);
    }
    if let Some(v) = s.only_save {
        config.only_save = v;
    }

    log::debug!("config loaded: {config:?}");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_and_height_conflict() {
        let c = ConvertConfig {
            width: Some(40),
            height: Some(20),
            ..ConvertConfig::default()
        };
        assert_eq!(c.validate(), Err(CoreError::ConflictingDimensions));
    }

    #[test]
    fn dither_requires_braille() {
        let c = ConvertConfig {
            dither: true,
            ..ConvertConfig::default()
        };
        assert_eq!(c.validate(), Err(CoreError::DitherWithoutBraille));
        let c = ConvertConfig {
            dither: true,
            braille: true,
            ..ConvertConfig::default()
        };
        assert!(c.validate().is_ok());
    }

    #[test]
    fn short_custom_map_rejected_up_front() {
        let c = ConvertConfig {
            custom_map: Some("#".into()),
            ..ConvertConfig::default()
        };
        assert!(matches!(c.validate(), Err(CoreError::InvalidCustomMap(_))));
    }

    #[test]
    fn full_overrides_explicit_sizes() {
        let c = ConvertConfig {
            full: true,
            dimensions: Some((10, 10)),
            ..ConvertConfig::default()
        };
        assert_eq!(c.size_policy().unwrap(), SizePolicy::Full);
    }

    #[test]
    fn dimensions_override_width() {
        let c = ConvertConfig {
            dimensions: Some((30, 12)),
            width: Some(50),
            ..ConvertConfig::default()
        };
        assert_eq!(c.size_policy().unwrap(), SizePolicy::Dimensions(30, 12));
    }

    #[test]
    fn no_terminal_needs_explicit_size() {
        let mut c = ConvertConfig {
            no_term_size_comparison: true,
            ..ConvertConfig::default()
        };
        assert_eq!(c.size_policy(), Err(CoreError::MissingDimensions));
        c.height = Some(20);
        assert_eq!(c.size_policy().unwrap(), SizePolicy::Height(20));
    }

    #[test]
    fn only_save_needs_target() {
        let c = ConvertConfig {
            only_save: true,
            ..ConvertConfig::default()
        };
        assert!(matches!(c.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn table_precedence() {
        let c = ConvertConfig {
            complex: true,
            custom_map: Some(" .#".into()),
            ..ConvertConfig::default()
        };
        assert_eq!(c.table().unwrap().len(), 3);
        let c = ConvertConfig {
            complex: true,
            ..ConvertConfig::default()
        };
        assert_eq!(c.table().unwrap(), CharacterTable::detailed());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = parse_config(
            "[convert]\ncolor_mode = \"Colored\"\nfont_color = [255, 0, 0]\nflip_x = true\n",
        )
        .unwrap();
        assert_eq!(c.color_mode, ColorMode::Colored);
        assert_eq!(c.font_color, (255, 0, 0));
        assert!(c.flip_x);
        assert_eq!(c.threshold, DEFAULT_THRESHOLD);
        assert_eq!(c.save_bg_color, [0, 0, 0, 100]);
    }

    #[test]
    fn toml_threshold_out_of_range_is_rejected() {
        assert!(parse_config("[convert]\nthreshold = 300\n").is_err());
    }

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(parse_config("").unwrap(), ConvertConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picscii.toml");
        std::fs::write(&path, "[convert]\nwidth = 64\n").unwrap();
        let c = load_config(&path).unwrap();
        assert_eq!(c.width, Some(64));
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
