//! Font discovery and text measurement

use std::path::{Path, PathBuf};
use std::sync::Arc;

use printpdf::{BuiltinFont, IndirectFontRef, PdfDocumentReference};

use crate::config::FontConfig;
use crate::error::{Result, SheetslipError};

/// The font used for every piece of text in a report
#[derive(Debug, Clone)]
pub enum FontSource {
    /// PDF standard Helvetica (no Persian glyphs)
    Builtin,
    /// A TrueType font embedded into each document
    External {
        /// Where the font was loaded from
        path: PathBuf,
        /// Raw font file
        bytes: Arc<Vec<u8>>,
    },
}

impl FontSource {
    /// Load a TrueType font file, checking that it parses
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SheetslipError::file_not_found(path));
        }

        let bytes = std::fs::read(path)?;
        ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| SheetslipError::font(format!("{}: {}", path.display(), e)))?;

        Ok(Self::External {
            path: path.to_path_buf(),
            bytes: Arc::new(bytes),
        })
    }

    /// Human-readable description for status output
    pub fn describe(&self) -> String {
        match self {
            Self::Builtin => "Helvetica (built-in)".to_string(),
            Self::External { path, .. } => path.display().to_string(),
        }
    }

    /// Whether the font is the built-in fallback
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Builtin)
    }

    /// Register the font with a document
    pub fn register(&self, doc: &PdfDocumentReference) -> Result<IndirectFontRef> {
        let font = match self {
            Self::Builtin => doc.add_builtin_font(BuiltinFont::Helvetica)?,
            Self::External { bytes, .. } => doc.add_external_font(bytes.as_slice())?,
        };
        Ok(font)
    }

    /// Width of `text` in points when set at `size` points
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        match self {
            Self::Builtin => helvetica_width(text, size),
            Self::External { bytes, .. } => match ttf_parser::Face::parse(bytes, 0) {
                Ok(face) => {
                    let units_per_em = f32::from(face.units_per_em());
                    let fallback = units_per_em / 2.0;
                    let units: f32 = text
                        .chars()
                        .map(|c| {
                            face.glyph_index(c)
                                .and_then(|glyph| face.glyph_hor_advance(glyph))
                                .map(f32::from)
                                .unwrap_or(fallback)
                        })
                        .sum();
                    units * size / units_per_em
                }
                Err(_) => helvetica_width(text, size),
            },
        }
    }
}

/// Approximate Helvetica advance widths (per 1000 em units)
fn helvetica_width(text: &str, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' ' | ',' | '.' | ':' | ';' | '!' | '|' | 'i' | 'j' | 'l' | '\'' => 278,
            '-' | '(' | ')' | '[' | ']' | 'f' | 't' | 'r' => 333,
            'I' => 278,
            'm' | 'M' => 833,
            'w' | 'W' => 944,
            '0'..='9' | 'a'..='z' => 556,
            'A'..='Z' => 667,
            _ => 600,
        })
        .sum();
    units as f32 * size / 1000.0
}

/// Finds a font able to display Persian text
pub struct FontLocator<'a> {
    config: &'a FontConfig,
}

impl<'a> FontLocator<'a> {
    /// Create a locator over the configured names and directories
    pub fn new(config: &'a FontConfig) -> Self {
        Self { config }
    }

    /// Candidate paths in search order: each name across all directories
    pub fn candidates(&self) -> Vec<PathBuf> {
        self.config
            .names
            .iter()
            .flat_map(|name| self.config.search_dirs.iter().map(move |dir| dir.join(name)))
            .collect()
    }

    /// Resolve the font to use.
    ///
    /// An explicit path must load; otherwise the first candidate that loads
    /// wins and the built-in font is the last resort.
    pub fn locate(&self, explicit: Option<&Path>) -> Result<FontSource> {
        if let Some(path) = explicit.or(self.config.path.as_deref()) {
            let font = FontSource::from_file(path)?;
            tracing::info!("Using font {}", path.display());
            return Ok(font);
        }

        for candidate in self.candidates() {
            if !candidate.is_file() {
                continue;
            }
            match FontSource::from_file(&candidate) {
                Ok(font) => {
                    tracing::info!("Persian font loaded: {}", candidate.display());
                    return Ok(font);
                }
                Err(e) => tracing::debug!("Skipping font {}: {}", candidate.display(), e),
            }
        }

        tracing::warn!(
            "Persian font not found, using Helvetica. Persian text will not display correctly"
        );
        Ok(FontSource::Builtin)
    }
}

/// First TrueType font installed on the machine, if any
#[cfg(test)]
pub(crate) fn system_ttf() -> Option<PathBuf> {
    ["/usr/share/fonts", "/Library/Fonts", "C:/Windows/Fonts"]
        .iter()
        .flat_map(|dir| walkdir::WalkDir::new(dir).into_iter().filter_map(|e| e.ok()))
        .map(walkdir::DirEntry::into_path)
        .find(|path| {
            path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ttf"))
                && FontSource::from_file(path).is_ok()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_order_names_first() {
        let config = FontConfig {
            path: None,
            names: vec!["A.ttf".into(), "B.ttf".into()],
            search_dirs: vec![PathBuf::new(), PathBuf::from("fonts")],
        };
        let locator = FontLocator::new(&config);
        assert_eq!(
            locator.candidates(),
            vec![
                PathBuf::from("A.ttf"),
                PathBuf::from("fonts/A.ttf"),
                PathBuf::from("B.ttf"),
                PathBuf::from("fonts/B.ttf"),
            ]
        );
    }

    #[test]
    fn test_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let config = FontConfig {
            path: None,
            names: vec!["Missing.ttf".into()],
            search_dirs: vec![dir.path().to_path_buf()],
        };
        let font = FontLocator::new(&config).locate(None).unwrap();
        assert!(font.is_builtin());
    }

    #[test]
    fn test_invalid_font_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Broken.ttf"), b"not a font").unwrap();
        let config = FontConfig {
            path: None,
            names: vec!["Broken.ttf".into()],
            search_dirs: vec![dir.path().to_path_buf()],
        };
        let font = FontLocator::new(&config).locate(None).unwrap();
        assert!(font.is_builtin());
    }

    #[test]
    fn test_explicit_font_must_exist() {
        let config = FontConfig::default();
        let result = FontLocator::new(&config).locate(Some(Path::new("/nonexistent/font.ttf")));
        assert!(result.is_err());
    }

    #[test]
    fn test_helvetica_width_scales_with_size() {
        let font = FontSource::Builtin;
        let small = font.text_width("1500", 10.0);
        let large = font.text_width("1500", 20.0);
        assert!((small - 22.24).abs() < 0.01);
        assert!((large - 2.0 * small).abs() < 0.01);
    }

    #[test]
    fn test_external_font_measures_with_its_own_advances() {
        let Some(path) = system_ttf() else {
            eprintln!("no TrueType font installed, skipping");
            return;
        };
        let font = FontSource::from_file(&path).unwrap();
        assert!(!font.is_builtin());
        assert_eq!(font.describe(), path.display().to_string());

        let text = "Salary 1500 WWW iii";
        let width = font.text_width(text, 10.0);
        assert!(width > 0.0);
        assert!((width - helvetica_width(text, 10.0)).abs() > 0.01);
        assert!((font.text_width(text, 20.0) - 2.0 * width).abs() < 0.01);
    }

    #[test]
    fn test_external_font_is_located_and_embedded() {
        let Some(path) = system_ttf() else {
            eprintln!("no TrueType font installed, skipping");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        std::fs::copy(&path, dir.path().join(&name)).unwrap();
        let config = FontConfig {
            path: None,
            names: vec!["Missing.ttf".into(), name],
            search_dirs: vec![dir.path().to_path_buf()],
        };

        let font = FontLocator::new(&config).locate(None).unwrap();
        assert!(!font.is_builtin());

        let (doc, _, _) = printpdf::PdfDocument::new(
            "fonts",
            printpdf::Mm(100.0),
            printpdf::Mm(100.0),
            "Layer 1",
        );
        font.register(&doc).unwrap();
        FontSource::Builtin.register(&doc).unwrap();
    }
}
