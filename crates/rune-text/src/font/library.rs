use std::path::Path;
use std::sync::Arc;

use fontdb::{Database, Family, Query};
use hashbrown::HashMap;
use parking_lot::Mutex;

use crate::error::{Result, TextError};
use crate::font::FontFace;

/// Resolves format font names to loaded faces.
///
/// Names are matched against the `fontdb` database as family names, with
/// the CSS generic families (`sans-serif`, `serif`, `monospace`, `cursive`,
/// `fantasy`) mapped to their fontdb counterparts. A name that points at an
/// existing font file is loaded directly. Resolved faces are cached by name.
#[derive(Debug, Default)]
pub struct FontLibrary {
    db: Database,
    faces: Mutex<HashMap<String, Arc<FontFace>>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// A library populated with the fonts installed on the system.
    pub fn with_system_fonts() -> Self {
        let mut library = Self::new();
        library.db.load_system_fonts();
        tracing::debug!(faces = library.db.len(), "loaded system fonts");
        library
    }

    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.db.load_font_file(path.as_ref())?;
        Ok(())
    }

    pub fn load_fonts_dir(&mut self, dir: impl AsRef<Path>) {
        self.db.load_fonts_dir(dir);
    }

    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
    }

    /// Number of faces known to the database.
    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Resolve a font name to a face, loading it on first use.
    pub fn resolve(&self, name: &str) -> Result<Arc<FontFace>> {
        let mut faces = self.faces.lock();
        if let Some(face) = faces.get(name) {
            return Ok(face.clone());
        }

        let face = Arc::new(self.load(name)?);
        faces.insert(name.to_string(), face.clone());
        Ok(face)
    }

    fn load(&self, name: &str) -> Result<FontFace> {
        let path = Path::new(name);
        if path.is_file() {
            return FontFace::from_path(path, 0);
        }

        let family = match name {
            "sans-serif" => Family::SansSerif,
            "serif" => Family::Serif,
            "monospace" => Family::Monospace,
            "cursive" => Family::Cursive,
            "fantasy" => Family::Fantasy,
            other => Family::Name(other),
        };
        let query = Query {
            families: &[family],
            ..Query::default()
        };
        let id = self
            .db
            .query(&query)
            .ok_or_else(|| TextError::MissingFont(name.to_string()))?;

        self.db
            .with_face_data(id, |data, index| FontFace::from_vec(data.to_vec(), index as usize))
            .ok_or_else(|| TextError::MissingFont(name.to_string()))?
    }
}
