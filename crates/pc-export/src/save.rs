use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use pc_core::frame::{FrameBuffer, Looping};

use crate::gif::write_gif;

/// Suffixe commun à tous les fichiers produits.
pub const SAVE_SUFFIX: &str = "-ascii-art";

/// `<stem>-ascii-art.<ext>`.
///
/// # Example
/// ```
/// use pc_export::save::save_name;
/// assert_eq!(save_name("cat", "png"), "cat-ascii-art.png");
/// ```
#[must_use]
pub fn save_name(stem: &str, ext: &str) -> String {
    format!("{stem}{SAVE_SUFFIX}.{ext}")
}

/// Chemin complet dans un répertoire qui doit déjà exister.
///
/// # Errors
/// Returns an error if `dir` doesn't exist or isn't a directory.
pub fn full_save_path(dir: &Path, stem: &str, ext: &str) -> Result<PathBuf> {
    if !dir.is_dir() {
        bail!("Répertoire de sauvegarde introuvable : {}", dir.display());
    }
    Ok(dir.join(save_name(stem, ext)))
}

/// Écrit le texte brut (sans séquences d'échappement).
///
/// # Errors
/// Returns an error if the directory is missing or the write fails.
pub fn save_txt(dir: &Path, stem: &str, text: &str) -> Result<PathBuf> {
    let path = full_save_path(dir, stem, "txt")?;
    std::fs::write(&path, text).with_context(|| format!("Écriture de {}", path.display()))?;
    log::info!("saved {}", path.display());
    Ok(path)
}

/// Écrit un canevas RGBA en PNG.
///
/// # Errors
/// Returns an error if the directory is missing or encoding fails.
pub fn save_png(dir: &Path, stem: &str, fb: &FrameBuffer) -> Result<PathBuf> {
    let path = full_save_path(dir, stem, "png")?;
    let Some(img) = image::RgbaImage::from_raw(fb.width, fb.height, fb.data.clone()) else {
        bail!("Canevas incohérent : {}×{}", fb.width, fb.height);
    };
    img.save_with_format(&path, image::ImageFormat::Png)
        .with_context(|| format!("Écriture de {}", path.display()))?;
    log::info!("saved {}", path.display());
    Ok(path)
}

/// Écrit une animation déjà quantifiée.
///
/// # Errors
/// Returns an error if the directory is missing or encoding fails.
pub fn save_gif(
    dir: &Path,
    stem: &str,
    frames: &[gif::Frame<'_>],
    looping: Looping,
) -> Result<PathBuf> {
    let path = full_save_path(dir, stem, "gif")?;
    let file = File::create(&path).with_context(|| format!("Création de {}", path.display()))?;
    write_gif(BufWriter::new(file), frames, looping)
        .with_context(|| format!("Écriture de {}", path.display()))?;
    log::info!("saved {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gif::quantize_frame;

    #[test]
    fn missing_directory_is_rejected() {
        assert!(full_save_path(Path::new("/nonexistent/picscii"), "a", "txt").is_err());
    }

    #[test]
    fn file_is_not_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(full_save_path(file.path(), "a", "txt").is_err());
    }

    #[test]
    fn txt_png_gif_land_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let txt = save_txt(dir.path(), "cat", "+@\n@+").unwrap();
        assert_eq!(std::fs::read_to_string(&txt).unwrap(), "+@\n@+");
        assert!(txt.ends_with("cat-ascii-art.txt"));

        let fb = FrameBuffer::filled(3, 3, (1, 2, 3));
        let png = save_png(dir.path(), "cat", &fb).unwrap();
        let back = image::open(&png).unwrap().to_rgba8();
        assert_eq!(back.dimensions(), (3, 3));
        assert_eq!(back.get_pixel(1, 1).0, [1, 2, 3, 255]);

        let frames = vec![quantize_frame(&fb, 5).unwrap()];
        let gif = save_gif(dir.path(), "cat", &frames, Looping::Forever).unwrap();
        assert!(gif.ends_with("cat-ascii-art.gif"));
        assert!(std::fs::metadata(gif).unwrap().len() > 0);
    }
}
