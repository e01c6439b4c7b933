use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use pc_core::config::{ColorMode, ConvertConfig};
use pc_source::image::Origin;

/// picscii: convert images and GIFs into ASCII or braille art.
#[derive(Parser, Debug)]
#[command(name = "picscii", version, about, long_about = None)]
pub struct Cli {
    /// Images ou GIF : chemins, URLs http(s), ou `-` pour stdin.
    pub inputs: Vec<String>,

    /// Couleurs d'origine (24 bits, sinon 256). Prime sur --grayscale et --font-color.
    #[arg(short = 'C', long = "color")]
    pub color: bool,

    /// Peindre la couleur en fond de caractère plutôt qu'en avant-plan.
    #[arg(long)]
    pub color_bg: bool,

    /// Largeur et hauteur en caractères, ex. `-d 60,30`. Prime sur --width et --height.
    #[arg(short = 'd', long, value_delimiter = ',', allow_negative_numbers = true)]
    pub dimensions: Option<Vec<i64>>,

    /// Largeur en caractères, hauteur selon le ratio.
    #[arg(short = 'W', long)]
    pub width: Option<u32>,

    /// Hauteur en caractères, largeur selon le ratio.
    #[arg(short = 'H', long)]
    pub height: Option<u32>,

    /// Table de caractères personnalisée, du plus sombre au plus clair.
    #[arg(short = 'm', long = "map")]
    pub map: Option<String>,

    /// Caractères braille au lieu de l'ASCII. Prime sur --complex et --map.
    #[arg(short = 'b', long)]
    pub braille: bool,

    /// Seuil braille, 0–255 (défaut 128).
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<i64>,

    /// Tramage Floyd–Steinberg (braille uniquement).
    #[arg(long)]
    pub dither: bool,

    /// Niveaux de gris. Prime sur --font-color.
    #[arg(short = 'g', long)]
    pub grayscale: bool,

    /// Table étendue de caractères.
    #[arg(short = 'c', long)]
    pub complex: bool,

    /// Largeur maximale du terminal. Prime sur --dimensions, --width et --height.
    #[arg(short = 'f', long)]
    pub full: bool,

    /// Couleurs et caractères inversés.
    #[arg(short = 'n', long)]
    pub negative: bool,

    /// Miroir horizontal.
    #[arg(short = 'x', long = "flipX")]
    pub flip_x: bool,

    /// Miroir vertical.
    #[arg(short = 'y', long = "flipY")]
    pub flip_y: bool,

    /// Sauver en `<nom>-ascii-art.png` dans ce répertoire.
    #[arg(short = 's', long)]
    pub save_img: Option<PathBuf>,

    /// Sauver en `<nom>-ascii-art.txt` dans ce répertoire.
    #[arg(long)]
    pub save_txt: Option<PathBuf>,

    /// Sauver un GIF en `<nom>-ascii-art.gif` dans ce répertoire.
    #[arg(long)]
    pub save_gif: Option<PathBuf>,

    /// Fond RGBA des images sauvées, opacité 0–100, ex. `255,255,255,100`.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub save_bg: Option<Vec<i64>>,

    /// Police TTF/OTF des images sauvées.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Couleur RGB de la police, ex. `0,255,0`.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub font_color: Option<Vec<i64>>,

    /// Ne rien afficher dans le terminal, seulement sauver.
    #[arg(long)]
    pub only_save: bool,

    /// Ne pas comparer la taille demandée à celle du terminal.
    #[arg(long)]
    pub no_term_size_comparison: bool,

    /// Afficher les formats d'entrée supportés.
    #[arg(long)]
    pub formats: bool,

    /// Fichier de configuration TOML. Défaut : ~/.picscii.toml s'il existe.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn", value_parser = parse_log_level)]
    pub log_level: log::LevelFilter,
}

impl Cli {
    /// Vérifie la combinaison d'entrées.
    ///
    /// # Errors
    /// No input, stdin mixed with other inputs, or, without `--only-save`,
    /// several GIFs or a GIF alongside still images.
    pub fn validate_inputs(&self) -> Result<()> {
        if self.inputs.is_empty() {
            bail!("Need at least 1 input path/url or piped input");
        }
        let origins: Vec<Origin> = self.inputs.iter().map(|i| Origin::parse(i)).collect();
        if origins.len() > 1 && origins.contains(&Origin::Stdin) {
            bail!("You cannot pass in piped input alongside other inputs");
        }
        // Rien n'est joué au terminal avec --only-save : les GIF peuvent s'enchaîner.
        if self.only_save {
            return Ok(());
        }
        let gifs = origins.iter().filter(|o| o.looks_like_gif()).count();
        if gifs > 1 {
            bail!("There are multiple GIFs supplied, only one GIF per command is supported");
        }
        if gifs == 1 && origins.len() > 1 {
            bail!("There are other inputs along with a GIF, non-GIFs must not be supplied alongside");
        }
        Ok(())
    }

    /// Applique les flags par-dessus la configuration fichier.
    ///
    /// # Errors
    /// Malformed vectors (dimensions, colors) and out-of-range values.
    pub fn apply(&self, config: &mut ConvertConfig) -> Result<()> {
        if let Some(dims) = &self.dimensions {
            let [w, h] = dims.as_slice() else {
                bail!("requires 2 dimensions, got {}", dims.len());
            };
            match (u32::try_from(*w), u32::try_from(*h)) {
                (Ok(w), Ok(h)) if w > 0 && h > 0 => config.dimensions = Some((w, h)),
                _ => bail!("invalid values for dimensions: {w},{h}"),
            }
        }
        if self.width.is_some() {
            config.width = self.width;
        }
        if self.height.is_some() {
            config.height = self.height;
        }
        if let Some(map) = &self.map {
            config.custom_map = Some(map.clone());
        }
        if let Some(t) = self.threshold {
            config.set_threshold(t)?;
        }
        if let Some(bg) = &self.save_bg {
            let [r, g, b, a] = bg.as_slice() else {
                bail!("--save-bg requires 4 values for RGBA, got {}", bg.len());
            };
            let [r, g, b] = rgb_triple(*r, *g, *b)?;
            let a = u8::try_from(*a)
                .ok()
                .filter(|a| *a <= 100)
                .ok_or_else(|| anyhow::anyhow!("Opacity value must be between 0 and 100"))?;
            config.save_bg_color = [r, g, b, a];
        }
        if let Some(fc) = &self.font_color {
            let [r, g, b] = fc.as_slice() else {
                bail!("--font-color requires 3 values for RGB, got {}", fc.len());
            };
            let [r, g, b] = rgb_triple(*r, *g, *b)?;
            config.font_color = (r, g, b);
        }
        if self.font.is_some() {
            config.font_path.clone_from(&self.font);
        }
        if self.save_img.is_some() {
            config.save_img.clone_from(&self.save_img);
        }
        if self.save_txt.is_some() {
            config.save_txt.clone_from(&self.save_txt);
        }
        if self.save_gif.is_some() {
            config.save_gif.clone_from(&self.save_gif);
        }

        if self.color {
            config.color_mode = ColorMode::Colored;
        } else if self.grayscale {
            config.color_mode = ColorMode::Grayscale;
        }
        config.color_bg |= self.color_bg;
        config.braille |= self.braille;
        config.dither |= self.dither;
        config.complex |= self.complex;
        config.full |= self.full;
        config.negative |= self.negative;
        config.flip_x |= self.flip_x;
        config.flip_y |= self.flip_y;
        config.only_save |= self.only_save;
        config.no_term_size_comparison |= self.no_term_size_comparison;
        Ok(())
    }
}

fn parse_log_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("niveau inconnu '{s}' (off, error, warn, info, debug, trace)"))
}

fn rgb_triple(r: i64, g: i64, b: i64) -> Result<[u8; 3]> {
    match (u8::try_from(r), u8::try_from(g), u8::try_from(b)) {
        (Ok(r), Ok(g), Ok(b)) => Ok([r, g, b]),
        _ => bail!("RGB values must be between 0 and 255"),
    }
}
