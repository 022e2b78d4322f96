//! Rows read from the per-category views

use sqlx::FromRow;

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct RadicalItem {
    pub id: i64,
    pub level: Option<i32>,
    /// Upstream slug
    pub meaning: Option<String>,
    /// Display characters, `N/A` for image-only radicals
    pub radical: Option<String>,
    pub meanings: Option<Vec<String>>,
    pub meaning_mnemonic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct KanjiItem {
    pub id: i64,
    pub level: Option<i32>,
    pub kanji: Option<String>,
    pub primary_reading: Option<String>,
    pub meanings: Option<Vec<String>>,
    pub onyomi_readings: Option<Vec<String>>,
    pub kunyomi_readings: Option<Vec<String>>,
    pub meaning_mnemonic: Option<String>,
    pub reading_mnemonic: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct VocabularyItem {
    pub id: i64,
    pub level: Option<i32>,
    pub word: Option<String>,
    pub readings: Option<Vec<String>>,
    pub meanings: Option<Vec<String>>,
    pub auxiliary_meanings: Option<Vec<String>>,
    pub meaning_mnemonic: Option<String>,
    pub reading_mnemonic: Option<String>,
}

pub(super) const RADICALS_QUERY: &str = "SELECT id, level, meaning, radical, meanings, meaning_mnemonic \
     FROM wanikani_radicals ORDER BY level, id";

pub(super) const KANJI_QUERY: &str = "SELECT id, level, kanji, primary_reading, meanings, \
     onyomi_readings, kunyomi_readings, meaning_mnemonic, reading_mnemonic \
     FROM wanikani_kanji ORDER BY level, id";

pub(super) const VOCABULARY_QUERY: &str = "SELECT id, level, word, readings, meanings, \
     auxiliary_meanings, meaning_mnemonic, reading_mnemonic \
     FROM wanikani_vocab ORDER BY level, id";
