//! Payslip rendering

mod fonts;
mod pdf;

pub use fonts::*;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDateTime;

use crate::config::ReportConfig;
use crate::error::Result;
use crate::models::PersonRecord;
use crate::shaping::TextShaper;

/// Fixed texts and thresholds of a report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStyle {
    /// Title printed before the person's name
    pub title: String,
    /// Label of the generation timestamp
    pub date_label: String,
    /// chrono format of the generation timestamp
    pub timestamp_format: String,
    /// Text printed for empty cells
    pub missing_value: String,
    /// More columns than this switch to the vertical layout
    pub vertical_threshold: usize,
}

impl ReportStyle {
    /// Format the generation time, falling back to `%Y-%m-%d %H:%M` on a bad pattern
    pub fn timestamp(&self, at: NaiveDateTime) -> String {
        let valid = !StrftimeItems::new(&self.timestamp_format)
            .any(|item| matches!(item, Item::Error));
        if valid {
            at.format(&self.timestamp_format).to_string()
        } else {
            tracing::warn!("Invalid timestamp format '{}'", self.timestamp_format);
            at.format("%Y-%m-%d %H:%M").to_string()
        }
    }
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self::from(&ReportConfig::default())
    }
}

impl From<&ReportConfig> for ReportStyle {
    fn from(config: &ReportConfig) -> Self {
        Self {
            title: config.title.clone(),
            date_label: config.date_label.clone(),
            timestamp_format: config.timestamp_format.clone(),
            missing_value: config.missing_value.clone(),
            vertical_threshold: config.vertical_threshold,
        }
    }
}

/// Renders one PDF per person
#[derive(Debug, Clone)]
pub struct PayslipRenderer {
    font: FontSource,
    shaper: TextShaper,
    style: ReportStyle,
}

impl PayslipRenderer {
    /// Create a renderer
    pub fn new(font: FontSource, shaper: TextShaper, style: ReportStyle) -> Self {
        Self { font, shaper, style }
    }

    /// Font in use
    pub fn font(&self) -> &FontSource {
        &self.font
    }

    /// Report style in use
    pub fn style(&self) -> &ReportStyle {
        &self.style
    }

    /// Text shaper in use
    pub fn shaper(&self) -> &TextShaper {
        &self.shaper
    }

    /// Render a record to `path`
    pub fn render(
        &self,
        record: &PersonRecord,
        generated_at: NaiveDateTime,
        path: &Path,
    ) -> Result<()> {
        tracing::debug!("Rendering {} -> {}", record.name, path.display());
        pdf::write_payslip(record, &self.style, &self.shaper, &self.font, generated_at, path)
    }
}

/// File name stem for a person: letters, digits, space, `-` and `_` survive
pub fn safe_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let stem = stem.trim_end();
    if stem.is_empty() {
        "unnamed".to_string()
    } else {
        stem.to_string()
    }
}

/// Hands out unique PDF paths inside one directory
#[derive(Debug, Default)]
pub struct OutputNamer {
    used: HashSet<String>,
}

impl OutputNamer {
    /// Create an empty namer
    pub fn new() -> Self {
        Self::default()
    }

    /// Next free path for `name`; repeats get ` (2)`, ` (3)`, ...
    pub fn path_for(&mut self, dir: &Path, name: &str) -> PathBuf {
        let stem = safe_file_stem(name);
        let mut candidate = stem.clone();
        let mut counter = 1;
        while !self.used.insert(candidate.to_lowercase()) {
            counter += 1;
            candidate = format!("{} ({})", stem, counter);
        }
        dir.join(format!("{}.pdf", candidate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    #[case("علی رضایی", "علی رضایی")]
    #[case("John/Doe: Jr.", "JohnDoe Jr")]
    #[case("a_b-c  ", "a_b-c")]
    #[case("???", "unnamed")]
    fn test_safe_file_stem(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(safe_file_stem(name), expected);
    }

    #[test]
    fn test_output_namer_deduplicates() {
        let dir = Path::new("/out");
        let mut namer = OutputNamer::new();
        assert_eq!(namer.path_for(dir, "A/B"), PathBuf::from("/out/AB.pdf"));
        assert_eq!(namer.path_for(dir, "AB"), PathBuf::from("/out/AB (2).pdf"));
        assert_eq!(namer.path_for(dir, "ab"), PathBuf::from("/out/ab (3).pdf"));
    }

    #[test]
    fn test_timestamp_formatting() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(7, 8, 0).unwrap();
        let mut style = ReportStyle::default();
        assert_eq!(style.timestamp(at), "2024-05-06 07:08");

        style.timestamp_format = "%Q bad".into();
        assert_eq!(style.timestamp(at), "2024-05-06 07:08");
    }

    #[test]
    fn test_render_writes_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("علی.pdf");
        let renderer = PayslipRenderer::new(
            FontSource::Builtin,
            TextShaper::default(),
            ReportStyle::default(),
        );
        let record = PersonRecord {
            name: "علی".into(),
            fields: vec![
                ("نام".into(), Cell::Text("علی".into())),
                ("حقوق".into(), Cell::Float(1500.0)),
            ],
        };
        let at = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(7, 8, 0).unwrap();
        renderer.render(&record, at, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_embeds_external_font() {
        let Some(font_path) = super::fonts::system_ttf() else {
            eprintln!("no TrueType font installed, skipping");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let record = PersonRecord {
            name: "Ali".into(),
            fields: vec![("Name".into(), Cell::Text("Ali".into()))],
        };
        let at = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(7, 8, 0).unwrap();

        let builtin = dir.path().join("builtin.pdf");
        PayslipRenderer::new(FontSource::Builtin, TextShaper::default(), ReportStyle::default())
            .render(&record, at, &builtin)
            .unwrap();

        let embedded = dir.path().join("embedded.pdf");
        PayslipRenderer::new(
            FontSource::from_file(&font_path).unwrap(),
            TextShaper::default(),
            ReportStyle::default(),
        )
        .render(&record, at, &embedded)
        .unwrap();

        let builtin_len = std::fs::metadata(&builtin).unwrap().len();
        let embedded_len = std::fs::metadata(&embedded).unwrap().len();
        assert!(embedded_len > builtin_len);
    }
}
