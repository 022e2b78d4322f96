//! Upstream subject records as returned by the WaniKani `/subjects` endpoint

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One upstream record
///
/// `data` stays untyped JSON until normalization so that a single odd
/// record cannot poison a page decode or a snapshot load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSubject {
    pub id: i64,

    /// Type tag: "radical", "kanji", "vocabulary", ...
    pub object: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_updated_at: Option<String>,

    #[serde(default)]
    pub data: Value,

    /// Anything else the API sent, kept so snapshots round-trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of the paginated collection response
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectPage {
    #[serde(default)]
    pub data: Vec<RawSubject>,

    #[serde(default)]
    pub pages: Pagination,

    #[serde(default)]
    pub total_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pagination {
    /// Opaque cursor for the next page, absent on the last one
    #[serde(default)]
    pub next_url: Option<String>,
}

/// Typed view over [`RawSubject::data`]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubjectData {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub level: Option<i32>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub hidden_at: Option<String>,
    #[serde(default)]
    pub document_url: Option<String>,
    #[serde(default)]
    pub characters: Option<String>,
    #[serde(default)]
    pub meanings: Vec<Meaning>,
    #[serde(default)]
    pub auxiliary_meanings: Vec<AuxiliaryMeaning>,
    #[serde(default)]
    pub readings: Vec<Reading>,
    #[serde(default)]
    pub lesson_position: Option<i32>,
    #[serde(default)]
    pub spaced_repetition_system_id: Option<i64>,
    #[serde(default)]
    pub component_subject_ids: Vec<i64>,
    #[serde(default)]
    pub amalgamation_subject_ids: Vec<i64>,
    #[serde(default)]
    pub visually_similar_subject_ids: Vec<i64>,
    #[serde(default)]
    pub meaning_mnemonic: Option<String>,
    #[serde(default)]
    pub reading_mnemonic: Option<String>,
    #[serde(default)]
    pub character_images: Vec<CharacterImage>,
    #[serde(default)]
    pub parts_of_speech: Vec<String>,
    #[serde(default)]
    pub context_sentences: Vec<ContextSentence>,
    #[serde(default)]
    pub pronunciation_audios: Vec<PronunciationAudio>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Meaning {
    pub meaning: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub accepted_answer: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuxiliaryMeaning {
    pub meaning: String,
    /// "whitelist" or "blacklist"
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reading {
    pub reading: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default, rename = "type")]
    pub kind: Option<ReadingKind>,
    #[serde(default)]
    pub accepted_answer: bool,
}

/// Kanji reading class; vocabulary readings carry none
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingKind {
    Onyomi,
    Kunyomi,
    Nanori,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CharacterImage {
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSentence {
    pub en: String,
    pub ja: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PronunciationAudio {
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
}
