use std::path::Path;

use anyhow::{Context, Result, bail};

/// Police chargée en mémoire, avec l'index de la face dans une collection.
#[derive(Clone, Debug)]
pub struct FontSource {
    /// Raw TTF/OTF/TTC bytes.
    pub data: Vec<u8>,
    /// Face index within a collection, 0 otherwise.
    pub index: u32,
}

/// Charge la police utilisateur, sinon la première face monospace du système.
///
/// # Errors
/// Returns an error if the given file can't be read, or if no path is given
/// and no monospace system font is installed.
///
/// # Example
/// ```no_run
/// use pc_export::font::load_font;
/// let font = load_font(Some(std::path::Path::new("Hack-Regular.ttf"))).unwrap();
/// ```
pub fn load_font(path: Option<&Path>) -> Result<FontSource> {
    if let Some(path) = path {
        let data = std::fs::read(path)
            .with_context(|| format!("Impossible de charger la police {}", path.display()))?;
        log::debug!("font: {}", path.display());
        return Ok(FontSource { data, index: 0 });
    }

    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    log::debug!("fontdb: {} system faces", db.len());

    let query = fontdb::Query {
        families: &[fontdb::Family::Monospace],
        ..fontdb::Query::default()
    };
    let id = db
        .query(&query)
        .or_else(|| db.faces().find(|face| face.monospaced).map(|face| face.id));
    let Some(id) = id else {
        bail!("Aucune police monospace trouvée, utilisez --font");
    };

    if let Some(face) = db.face(id) {
        let family = face.families.first().map_or("?", |(name, _)| name.as_str());
        log::warn!("no --font given, using system font {family}");
    }
    db.with_face_data(id, |data, index| FontSource {
        data: data.to_vec(),
        index,
    })
    .context("Police système illisible")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_font_file_is_an_error() {
        let err = load_font(Some(Path::new("/nonexistent/picscii.ttf"))).unwrap_err();
        assert!(err.to_string().contains("picscii.ttf"));
    }

    #[test]
    fn explicit_file_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.ttf");
        std::fs::write(&path, b"not really a font").unwrap();
        let font = load_font(Some(&path)).unwrap();
        assert_eq!(font.data, b"not really a font");
        assert_eq!(font.index, 0);
    }
}
