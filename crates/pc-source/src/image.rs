use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use pc_core::frame::FrameBuffer;

use crate::gif::GifSource;

/// Nom de base des fichiers sauvegardés depuis stdin.
pub const STDIN_STEM: &str = "piped-img";

/// Extensions acceptées pour les chemins locaux.
pub const SUPPORTED_FORMATS: &[&str] = &[
    "jpeg", "jpg", "png", "bmp", "tiff", "tif", "webp", "gif",
];

/// Provenance d'une entrée.
///
/// # Example
/// ```
/// use pc_source::image::Origin;
/// assert_eq!(Origin::parse("-"), Origin::Stdin);
/// assert_eq!(Origin::parse("https://x.org/a/cat.png?s=1").stem(), "cat");
/// assert_eq!(Origin::parse("pics/dog.jpeg").stem(), "dog");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Local file.
    Path(PathBuf),
    /// `http://` or `https://` address.
    Url(String),
    /// Piped bytes, selected with `-`.
    Stdin,
}

impl Origin {
    /// Classify a command-line argument.
    #[must_use]
    pub fn parse(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else if arg.starts_with("http://") || arg.starts_with("https://") {
            Self::Url(arg.to_string())
        } else {
            Self::Path(PathBuf::from(arg))
        }
    }

    /// Base name used for saved artifacts, without extension.
    #[must_use]
    pub fn stem(&self) -> String {
        match self {
            Self::Path(p) => p
                .file_stem()
                .map_or_else(|| STDIN_STEM.to_string(), |s| s.to_string_lossy().into_owned()),
            Self::Url(u) => {
                let path = u.split(['?', '#']).next().unwrap_or(u);
                let last = path.rsplit('/').next().unwrap_or(path);
                let stem = Path::new(last)
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if stem.is_empty() {
                    STDIN_STEM.to_string()
                } else {
                    stem
                }
            }
            Self::Stdin => STDIN_STEM.to_string(),
        }
    }

    /// True when the argument names an animated GIF by extension.
    #[must_use]
    pub fn looks_like_gif(&self) -> bool {
        let name = match self {
            Self::Path(p) => p.to_string_lossy().into_owned(),
            Self::Url(u) => u.split(['?', '#']).next().unwrap_or(u).to_string(),
            Self::Stdin => return false,
        };
        name.to_ascii_lowercase().ends_with(".gif")
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::Url(u) => f.write_str(u),
            Self::Stdin => f.write_str("<stdin>"),
        }
    }
}

/// Octets bruts d'une entrée, avec leur provenance.
#[derive(Clone, Debug)]
pub struct SourceBytes {
    /// Where the bytes came from.
    pub origin: Origin,
    /// Encoded image or GIF.
    pub bytes: Vec<u8>,
}

/// Contenu décodé : image fixe ou animation.
#[derive(Clone, Debug)]
pub enum Decoded {
    /// Single image.
    Still(FrameBuffer),
    /// Multi-frame GIF.
    Animation(GifSource),
}

/// Lit une entrée : fichier, URL (client HTTP bloquant) ou stdin.
///
/// # Errors
/// Returns an error if the file can't be read, the request fails or
/// returns a non-success status, or stdin can't be read.
pub fn acquire(arg: &str) -> Result<SourceBytes> {
    let origin = Origin::parse(arg);
    let bytes = match &origin {
        Origin::Path(p) => {
            std::fs::read(p).with_context(|| format!("Impossible de lire {}", p.display()))?
        }
        Origin::Url(u) => fetch(u)?,
        Origin::Stdin => {
            let mut buf = Vec::new();
            std::io::stdin()
                .lock()
                .read_to_end(&mut buf)
                .context("Impossible de lire stdin")?;
            buf
        }
    };
    if bytes.is_empty() {
        bail!("{origin}: entrée vide");
    }
    log::info!("{origin}: {} octets lus", bytes.len());
    Ok(SourceBytes { origin, bytes })
}

fn fetch(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::blocking::get(url)
        .with_context(|| format!("Échec de la requête {url}"))?
        .error_for_status()
        .with_context(|| format!("Réponse invalide pour {url}"))?;
    let bytes = response
        .bytes()
        .with_context(|| format!("Impossible de lire le corps de {url}"))?;
    Ok(bytes.to_vec())
}

/// GIF magic (`GIF87a` / `GIF89a`).
///
/// # Example
/// ```
/// use pc_source::image::is_gif;
/// assert!(is_gif(b"GIF89a...."));
/// assert!(!is_gif(b"\x89PNG"));
/// ```
#[must_use]
pub fn is_gif(bytes: &[u8]) -> bool {
    bytes.starts_with(b"GIF8")
}

/// Décode une image fixe en RGBA.
///
/// # Errors
/// Returns an error if the format is unsupported or the data is corrupt.
pub fn decode_still(bytes: &[u8]) -> Result<FrameBuffer> {
    let img = image::load_from_memory(bytes).context("Impossible de décoder l'image")?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(FrameBuffer::from_rgba(width, height, rgba.into_raw())?)
}

/// Dispatch on the content: GIF magic selects the animation decoder.
///
/// # Errors
/// Returns the decoder's error, prefixed with the input's origin.
pub fn decode(source: &SourceBytes) -> Result<Decoded> {
    if is_gif(&source.bytes) {
        let gif = GifSource::decode(&source.bytes)
            .with_context(|| format!("{}: GIF illisible", source.origin))?;
        Ok(Decoded::Animation(gif))
    } else {
        let fb = decode_still(&source.bytes)
            .with_context(|| format!("{}: image illisible", source.origin))?;
        log::debug!("{}: {}×{}", source.origin, fb.width, fb.height);
        Ok(Decoded::Still(fb))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn png_bytes(w: u32, h: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba(rgba));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn origin_classification() {
        assert_eq!(Origin::parse("-"), Origin::Stdin);
        assert!(matches!(Origin::parse("http://a/b.png"), Origin::Url(_)));
        assert!(matches!(Origin::parse("./b.png"), Origin::Path(_)));
        assert_eq!(Origin::Stdin.stem(), STDIN_STEM);
    }

    #[test]
    fn gif_extension_detection() {
        assert!(Origin::parse("a/B.GIF").looks_like_gif());
        assert!(Origin::parse("https://h/x.gif?v=2").looks_like_gif());
        assert!(!Origin::parse("x.png").looks_like_gif());
        assert!(!Origin::Stdin.looks_like_gif());
    }

    #[test]
    fn decode_png_from_memory() {
        let fb = decode_still(&png_bytes(3, 2, [10, 20, 30, 255])).unwrap();
        assert_eq!((fb.width, fb.height), (3, 2));
        assert_eq!(fb.pixel(2, 1), (10, 20, 30, 255));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_still(b"definitely not an image").is_err());
    }

    #[test]
    fn acquire_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sq.png");
        std::fs::write(&path, png_bytes(4, 4, [0, 0, 0, 255])).unwrap();

        let src = acquire(path.to_str().unwrap()).unwrap();
        assert_eq!(src.origin.stem(), "sq");
        assert!(matches!(decode(&src).unwrap(), Decoded::Still(_)));
    }

    #[test]
    fn acquire_missing_file_fails() {
        assert!(acquire("/nonexistent/picscii/none.png").is_err());
    }
}
