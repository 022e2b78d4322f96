//! Tabular outputs of the normalized subjects
//!
//! Both formats share one flat schema ([`FlatRow`]). List-valued fields
//! are stored as text in the form `['a', 'b']` so that either file can be
//! loaded into the relational store and decoded there the same way.

mod csv_format;
mod parquet_format;

use crate::subject::{NormalizedRow, SubjectDetail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

pub type Result<T> = std::result::Result<T, TabularError>;

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("No rows to write")]
    EmptyInput,

    #[error("Unsupported tabular format: {0}")]
    UnsupportedFormat(String),

    #[error("Column '{column}': {reason}")]
    Schema { column: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk tabular format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabularFormat {
    /// Comma separated, header row first; opens in any spreadsheet tool
    Csv,
    /// Columnar, Snappy compressed
    Parquet,
}

impl TabularFormat {
    pub const ALL: [TabularFormat; 2] = [TabularFormat::Csv, TabularFormat::Parquet];

    pub fn extension(self) -> &'static str {
        match self {
            TabularFormat::Csv => "csv",
            TabularFormat::Parquet => "parquet",
        }
    }

    /// Infer the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| TabularError::UnsupportedFormat(path.display().to_string()))?;
        ext.parse()
    }
}

impl FromStr for TabularFormat {
    type Err = TabularError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(TabularFormat::Csv),
            "parquet" => Ok(TabularFormat::Parquet),
            other => Err(TabularError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for TabularFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Column names in file order
pub const COLUMNS: [&str; 27] = [
    "id",
    "object",
    "url",
    "data_updated_at",
    "created_at",
    "level",
    "slug",
    "hidden_at",
    "document_url",
    "characters",
    "meanings",
    "auxiliary_meanings",
    "lesson_position",
    "spaced_repetition_system_id",
    "onyomi_readings",
    "kunyomi_readings",
    "primary_reading",
    "readings",
    "component_subject_ids",
    "amalgamation_subject_ids",
    "visually_similar_subject_ids",
    "meaning_mnemonic",
    "reading_mnemonic",
    "character_images",
    "parts_of_speech",
    "context_sentences",
    "pronunciation_audios",
];

/// One row of the flat table
///
/// Columns that do not apply to a subject's type are `None`, so a radical
/// row has no readings and a vocabulary row has no character images.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRow {
    pub id: i64,
    pub object: String,
    pub url: Option<String>,
    pub data_updated_at: Option<String>,
    pub created_at: Option<String>,
    pub level: Option<i32>,
    pub slug: Option<String>,
    pub hidden_at: Option<String>,
    pub document_url: Option<String>,
    pub characters: Option<String>,
    pub meanings: String,
    pub auxiliary_meanings: String,
    pub lesson_position: Option<i32>,
    pub spaced_repetition_system_id: Option<i64>,
    pub onyomi_readings: Option<String>,
    pub kunyomi_readings: Option<String>,
    pub primary_reading: Option<String>,
    pub readings: Option<String>,
    pub component_subject_ids: Option<String>,
    pub amalgamation_subject_ids: Option<String>,
    pub visually_similar_subject_ids: Option<String>,
    pub meaning_mnemonic: Option<String>,
    pub reading_mnemonic: Option<String>,
    pub character_images: Option<String>,
    pub parts_of_speech: Option<String>,
    pub context_sentences: Option<String>,
    pub pronunciation_audios: Option<String>,
}

impl FlatRow {
    pub fn from_normalized(row: &NormalizedRow) -> Result<Self> {
        let c = &row.common;
        let mut flat = FlatRow {
            id: c.id,
            object: c.object.clone(),
            url: c.url.clone(),
            data_updated_at: c.data_updated_at.clone(),
            created_at: c.created_at.clone(),
            level: c.level,
            slug: c.slug.clone(),
            hidden_at: c.hidden_at.clone(),
            document_url: c.document_url.clone(),
            characters: c.characters.clone(),
            meanings: encode_list(&c.meanings),
            auxiliary_meanings: encode_list(&c.auxiliary_meanings),
            lesson_position: c.lesson_position,
            spaced_repetition_system_id: c.spaced_repetition_system_id,
            ..Default::default()
        };

        match &row.detail {
            SubjectDetail::Radical(r) => {
                flat.meaning_mnemonic = r.meaning_mnemonic.clone();
                flat.character_images = Some(encode_list(&r.character_images));
                flat.amalgamation_subject_ids = Some(encode_ids(&r.amalgamation_subject_ids));
            },
            SubjectDetail::Kanji(k) => {
                flat.readings = Some(encode_list(&k.readings));
                flat.onyomi_readings = Some(encode_list(&k.onyomi_readings));
                flat.kunyomi_readings = Some(encode_list(&k.kunyomi_readings));
                flat.primary_reading = k.primary_reading.clone();
                flat.meaning_mnemonic = k.meaning_mnemonic.clone();
                flat.reading_mnemonic = k.reading_mnemonic.clone();
                flat.component_subject_ids = Some(encode_ids(&k.component_subject_ids));
                flat.amalgamation_subject_ids = Some(encode_ids(&k.amalgamation_subject_ids));
                flat.visually_similar_subject_ids =
                    Some(encode_ids(&k.visually_similar_subject_ids));
            },
            SubjectDetail::Vocabulary(v) => {
                flat.readings = Some(encode_list(&v.readings));
                flat.meaning_mnemonic = v.meaning_mnemonic.clone();
                flat.reading_mnemonic = v.reading_mnemonic.clone();
                flat.parts_of_speech = Some(encode_list(&v.parts_of_speech));
                flat.context_sentences = Some(serde_json::to_string(&v.context_sentences)?);
                flat.pronunciation_audios = Some(encode_list(&v.pronunciation_audios));
                flat.component_subject_ids = Some(encode_ids(&v.component_subject_ids));
            },
            SubjectDetail::Other => {},
        }

        Ok(flat)
    }
}

// ============================================================================
// List encoding
// ============================================================================

/// Encode a string list as `['a', 'b']`
pub fn encode_list<S: AsRef<str>>(items: &[S]) -> String {
    let quoted: Vec<String> = items.iter().map(|s| quote_item(s.as_ref())).collect();
    format!("[{}]", quoted.join(", "))
}

/// Encode an id list as `[1, 2]`
pub fn encode_ids(ids: &[i64]) -> String {
    let parts: Vec<String> = ids.iter().map(i64::to_string).collect();
    format!("[{}]", parts.join(", "))
}

/// Single quotes unless the item itself contains one and no double quote
fn quote_item(item: &str) -> String {
    if item.contains('\'') && !item.contains('"') {
        format!("\"{}\"", item.replace('\\', "\\\\"))
    } else {
        format!("'{}'", item.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

/// Split an encoded list the way the store's views do
///
/// Strips every leading and trailing bracket, then splits on commas.
/// Items keep their quotes and surrounding whitespace; see
/// [`clean_list_item`].
pub fn decode_list(encoded: &str) -> Vec<String> {
    let inner = encoded.trim_matches(|c| c == '[' || c == ']');
    if inner.is_empty() {
        return Vec::new();
    }
    inner.split(',').map(str::to_string).collect()
}

/// Strip whitespace and one layer of matching quotes
///
/// Backslash escapes written by [`encode_list`] are undone inside the
/// stripped quotes; unquoted items are returned as they are.
pub fn clean_list_item(item: &str) -> String {
    let trimmed = item.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return unescape(&trimmed[1..trimmed.len() - 1]);
        }
    }
    trimmed.to_string()
}

fn unescape(quoted: &str) -> String {
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push(chars.next().unwrap_or('\\')),
            other => out.push(other),
        }
    }
    out
}

// ============================================================================
// Read / write
// ============================================================================

/// Write normalized rows, replacing any existing file at `path`
pub fn write_rows(rows: &[NormalizedRow], path: &Path, format: TabularFormat) -> Result<usize> {
    if rows.is_empty() {
        return Err(TabularError::EmptyInput);
    }

    let flat = rows
        .iter()
        .map(FlatRow::from_normalized)
        .collect::<Result<Vec<_>>>()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    match format {
        TabularFormat::Csv => csv_format::write(&flat, path)?,
        TabularFormat::Parquet => parquet_format::write(&flat, path)?,
    }

    info!(path = %path.display(), rows = flat.len(), "Saved {} file", format);
    Ok(flat.len())
}

/// Read a tabular file back, format chosen by extension
pub fn read_rows(path: &Path) -> Result<Vec<FlatRow>> {
    match TabularFormat::from_path(path)? {
        TabularFormat::Csv => csv_format::read(path),
        TabularFormat::Parquet => parquet_format::read(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::{CommonFields, KanjiFields, RadicalFields, VocabularyFields};
    use crate::subject::ContextSentence;
    use proptest::prelude::*;
    use tempfile::TempDir;

    pub(super) fn sample_rows() -> Vec<NormalizedRow> {
        vec![
            NormalizedRow {
                common: CommonFields {
                    id: 1,
                    object: "radical".to_string(),
                    level: Some(1),
                    slug: Some("ground".to_string()),
                    characters: None,
                    meanings: vec!["Ground".to_string()],
                    ..Default::default()
                },
                detail: SubjectDetail::Radical(RadicalFields {
                    meaning_mnemonic: Some("A <radical>line</radical>".to_string()),
                    character_images: vec!["https://cdn/1.svg".to_string()],
                    amalgamation_subject_ids: vec![440],
                }),
            },
            NormalizedRow {
                common: CommonFields {
                    id: 440,
                    object: "kanji".to_string(),
                    level: Some(1),
                    slug: Some("一".to_string()),
                    characters: Some("一".to_string()),
                    meanings: vec!["One".to_string()],
                    auxiliary_meanings: vec!["1".to_string()],
                    lesson_position: Some(26),
                    spaced_repetition_system_id: Some(2),
                    ..Default::default()
                },
                detail: SubjectDetail::Kanji(KanjiFields {
                    readings: vec!["いち".to_string(), "ひと".to_string()],
                    onyomi_readings: vec!["いち".to_string()],
                    kunyomi_readings: vec!["ひと".to_string()],
                    primary_reading: Some("いち".to_string()),
                    meaning_mnemonic: Some("Lying on the ground, it's one".to_string()),
                    reading_mnemonic: Some("<reading>いち</reading>".to_string()),
                    component_subject_ids: vec![1],
                    amalgamation_subject_ids: vec![2467],
                    visually_similar_subject_ids: vec![],
                }),
            },
            NormalizedRow {
                common: CommonFields {
                    id: 2467,
                    object: "vocabulary".to_string(),
                    level: Some(1),
                    characters: Some("一".to_string()),
                    meanings: vec!["One".to_string()],
                    ..Default::default()
                },
                detail: SubjectDetail::Vocabulary(VocabularyFields {
                    readings: vec!["いち".to_string()],
                    parts_of_speech: vec!["numeral".to_string()],
                    context_sentences: vec![ContextSentence {
                        en: "One, please.".to_string(),
                        ja: "一つ、ください。".to_string(),
                    }],
                    ..Default::default()
                }),
            },
        ]
    }

    #[test]
    fn test_format_from_str_and_path() {
        assert_eq!("CSV".parse::<TabularFormat>().unwrap(), TabularFormat::Csv);
        assert_eq!(
            TabularFormat::from_path(Path::new("out/subjects.parquet")).unwrap(),
            TabularFormat::Parquet
        );
        assert!(matches!(
            "xlsx".parse::<TabularFormat>(),
            Err(TabularError::UnsupportedFormat(_))
        ));
        assert!(TabularFormat::from_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_encode_list_matches_expected_text() {
        assert_eq!(encode_list(&["a", "b"]), "['a', 'b']");
        assert_eq!(encode_list::<&str>(&[]), "[]");
        assert_eq!(encode_list(&["it's"]), "[\"it's\"]");
        assert_eq!(encode_ids(&[1, 22]), "[1, 22]");
    }

    #[test]
    fn test_decode_list_keeps_raw_items() {
        assert_eq!(decode_list("['a', 'b']"), vec!["'a'", " 'b'"]);
        assert_eq!(decode_list("[]"), Vec::<String>::new());
        assert_eq!(decode_list("[1, 22]"), vec!["1", " 22"]);
    }

    #[test]
    fn test_clean_list_item() {
        assert_eq!(clean_list_item(" 'ground' "), "ground");
        assert_eq!(clean_list_item("\"it's\""), "it's");
        assert_eq!(clean_list_item("''x''"), "'x'");
        assert_eq!(clean_list_item("'"), "'");
        assert_eq!(clean_list_item("plain"), "plain");
    }

    #[test]
    fn test_escaped_items_come_back_clean() {
        for item in [r#"say "it's""#, r"back\slash", r#"both ' and \ and ""#] {
            let encoded = encode_list(&[item]);
            let decoded: Vec<String> = decode_list(&encoded)
                .iter()
                .map(|raw| clean_list_item(raw))
                .collect();
            assert_eq!(decoded, vec![item.to_string()], "encoded as {encoded}");
        }
        assert_eq!(clean_list_item(r"'it\'s'"), "it's");
        assert_eq!(clean_list_item(r"plain\"), r"plain\");
    }

    #[test]
    fn test_flat_row_leaves_inapplicable_columns_empty() {
        let rows = sample_rows();
        let radical = FlatRow::from_normalized(&rows[0]).unwrap();
        assert_eq!(radical.readings, None);
        assert_eq!(radical.character_images.as_deref(), Some("['https://cdn/1.svg']"));

        let kanji = FlatRow::from_normalized(&rows[1]).unwrap();
        assert_eq!(kanji.onyomi_readings.as_deref(), Some("['いち']"));
        assert_eq!(kanji.visually_similar_subject_ids.as_deref(), Some("[]"));
        assert_eq!(kanji.character_images, None);

        let vocab = FlatRow::from_normalized(&rows[2]).unwrap();
        let sentences: Vec<ContextSentence> =
            serde_json::from_str(vocab.context_sentences.as_deref().unwrap()).unwrap();
        assert_eq!(sentences[0].en, "One, please.");
    }

    #[test]
    fn test_write_rejects_empty_input() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        assert!(matches!(
            write_rows(&[], &path, TabularFormat::Csv),
            Err(TabularError::EmptyInput)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_both_formats_read_back_identical_rows() {
        let dir = TempDir::new().unwrap();
        let rows = sample_rows();
        let expected: Vec<FlatRow> = rows.iter().map(|r| FlatRow::from_normalized(r).unwrap()).collect();

        for format in TabularFormat::ALL {
            let path = dir.path().join(format!("nested/subjects.{}", format.extension()));
            assert_eq!(write_rows(&rows, &path, format).unwrap(), 3);
            assert_eq!(read_rows(&path).unwrap(), expected, "format {format}");
        }
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subjects.csv");
        let rows = sample_rows();
        write_rows(&rows, &path, TabularFormat::Csv).unwrap();
        write_rows(&rows[..1], &path, TabularFormat::Csv).unwrap();
        assert_eq!(read_rows(&path).unwrap().len(), 1);
    }

    proptest! {
        #[test]
        fn prop_list_round_trips_through_view_decoding(
            items in prop::collection::vec("[A-Za-z0-9ぁ-ん一-龥][A-Za-z0-9ぁ-ん一-龥 ]{0,6}[A-Za-z0-9ぁ-ん一-龥]", 0..6)
        ) {
            let decoded: Vec<String> = decode_list(&encode_list(&items))
                .iter()
                .map(|item| clean_list_item(item))
                .collect();
            prop_assert_eq!(decoded, items);
        }
    }
}
