//! Flattened subject rows produced by the normalizer

use super::raw::ContextSentence;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subject category derived from the upstream type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectKind {
    Radical,
    Kanji,
    Vocabulary,
    /// Any tag this pipeline has no dedicated fields for (e.g. "kana_vocabulary")
    Other(String),
}

impl SubjectKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "radical" => Self::Radical,
            "kanji" => Self::Kanji,
            "vocabulary" => Self::Vocabulary,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Radical => "radical",
            Self::Kanji => "kanji",
            Self::Vocabulary => "vocabulary",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields every subject carries regardless of type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonFields {
    pub id: i64,
    pub object: String,
    pub url: Option<String>,
    pub data_updated_at: Option<String>,
    pub created_at: Option<String>,
    pub level: Option<i32>,
    pub slug: Option<String>,
    pub hidden_at: Option<String>,
    pub document_url: Option<String>,
    /// Display text; radicals drawn as images have none
    pub characters: Option<String>,
    pub meanings: Vec<String>,
    pub auxiliary_meanings: Vec<String>,
    pub lesson_position: Option<i32>,
    pub spaced_repetition_system_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadicalFields {
    pub meaning_mnemonic: Option<String>,
    pub character_images: Vec<String>,
    pub amalgamation_subject_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KanjiFields {
    pub readings: Vec<String>,
    pub onyomi_readings: Vec<String>,
    pub kunyomi_readings: Vec<String>,
    pub primary_reading: Option<String>,
    pub meaning_mnemonic: Option<String>,
    pub reading_mnemonic: Option<String>,
    pub component_subject_ids: Vec<i64>,
    pub amalgamation_subject_ids: Vec<i64>,
    pub visually_similar_subject_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularyFields {
    pub readings: Vec<String>,
    pub meaning_mnemonic: Option<String>,
    pub reading_mnemonic: Option<String>,
    pub parts_of_speech: Vec<String>,
    pub context_sentences: Vec<ContextSentence>,
    pub pronunciation_audios: Vec<String>,
    pub component_subject_ids: Vec<i64>,
}

/// Type-specific payload; exactly one variant per row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubjectDetail {
    Radical(RadicalFields),
    Kanji(KanjiFields),
    Vocabulary(VocabularyFields),
    Other,
}

/// One normalized subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub common: CommonFields,
    pub detail: SubjectDetail,
}

impl NormalizedRow {
    pub fn id(&self) -> i64 {
        self.common.id
    }

    pub fn kind(&self) -> SubjectKind {
        SubjectKind::from_tag(&self.common.object)
    }

    pub fn as_kanji(&self) -> Option<&KanjiFields> {
        match &self.detail {
            SubjectDetail::Kanji(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_radical(&self) -> Option<&RadicalFields> {
        match &self.detail {
            SubjectDetail::Radical(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_vocabulary(&self) -> Option<&VocabularyFields> {
        match &self.detail {
            SubjectDetail::Vocabulary(fields) => Some(fields),
            _ => None,
        }
    }
}
