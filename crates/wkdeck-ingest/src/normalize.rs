//! Subject normalization
//!
//! Maps each raw record onto a [`NormalizedRow`], choosing the
//! type-specific payload from the record's type tag. A record that cannot
//! be mapped is logged with its id and skipped; the batch carries on.

use crate::subject::{
    CommonFields, KanjiFields, NormalizedRow, RadicalFields, RawSubject, ReadingKind, SubjectData,
    SubjectDetail, SubjectKind, VocabularyFields,
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("No subjects to normalize")]
    EmptyInput,

    #[error("Malformed subject record: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Subject {id}: malformed attribute data: {source}")]
    MalformedData {
        id: i64,
        #[source]
        source: serde_json::Error,
    },
}

/// A record the normalizer had to drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Upstream id when the record had a readable one
    pub id: Option<i64>,
    pub reason: String,
}

/// Rows produced from one batch plus what was dropped
#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    pub rows: Vec<NormalizedRow>,
    pub total: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl NormalizeOutcome {
    pub fn mapped(&self) -> usize {
        self.rows.len()
    }
}

/// Normalize a batch of untyped records (as loaded from a snapshot)
pub fn normalize_records(records: &[Value]) -> Result<NormalizeOutcome, NormalizeError> {
    if records.is_empty() {
        return Err(NormalizeError::EmptyInput);
    }

    let mut rows = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for record in records {
        let mapped = RawSubject::deserialize(record)
            .map_err(NormalizeError::Malformed)
            .and_then(|subject| normalize_subject(&subject));

        match mapped {
            Ok(row) => rows.push(row),
            Err(e) => {
                let id = record.get("id").and_then(Value::as_i64);
                match id {
                    Some(id) => warn!(subject_id = id, "Skipping subject: {}", e),
                    None => warn!(subject_id = "<unknown>", "Skipping subject: {}", e),
                }
                skipped.push(SkippedRecord {
                    id,
                    reason: e.to_string(),
                });
            },
        }
    }

    info!(
        "Normalized {} of {} subjects ({} skipped)",
        rows.len(),
        records.len(),
        skipped.len()
    );

    Ok(NormalizeOutcome {
        rows,
        total: records.len(),
        skipped,
    })
}

/// Normalize already-typed subjects (straight from the fetcher)
pub fn normalize_subjects(subjects: &[RawSubject]) -> Result<NormalizeOutcome, NormalizeError> {
    let records = subjects
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(NormalizeError::Malformed)?;
    normalize_records(&records)
}

/// Map one subject onto a flat row
pub fn normalize_subject(subject: &RawSubject) -> Result<NormalizedRow, NormalizeError> {
    let data = parse_data(subject)?;
    let kind = SubjectKind::from_tag(&subject.object);

    let common = CommonFields {
        id: subject.id,
        object: subject.object.clone(),
        url: subject.url.clone(),
        data_updated_at: subject.data_updated_at.clone(),
        created_at: data.created_at.clone(),
        level: data.level,
        slug: data.slug.clone(),
        hidden_at: data.hidden_at.clone(),
        document_url: data.document_url.clone(),
        characters: data.characters.clone(),
        meanings: data.meanings.iter().map(|m| m.meaning.clone()).collect(),
        auxiliary_meanings: data
            .auxiliary_meanings
            .iter()
            .map(|m| m.meaning.clone())
            .collect(),
        lesson_position: data.lesson_position,
        spaced_repetition_system_id: data.spaced_repetition_system_id,
    };

    let detail = match kind {
        SubjectKind::Radical => SubjectDetail::Radical(radical_fields(data)),
        SubjectKind::Kanji => SubjectDetail::Kanji(kanji_fields(data)),
        SubjectKind::Vocabulary => SubjectDetail::Vocabulary(vocabulary_fields(data)),
        SubjectKind::Other(_) => SubjectDetail::Other,
    };

    Ok(NormalizedRow { common, detail })
}

fn parse_data(subject: &RawSubject) -> Result<SubjectData, NormalizeError> {
    if subject.data.is_null() {
        return Ok(SubjectData::default());
    }
    SubjectData::deserialize(&subject.data).map_err(|source| NormalizeError::MalformedData {
        id: subject.id,
        source,
    })
}

fn radical_fields(data: SubjectData) -> RadicalFields {
    RadicalFields {
        meaning_mnemonic: data.meaning_mnemonic,
        character_images: data.character_images.into_iter().map(|i| i.url).collect(),
        amalgamation_subject_ids: data.amalgamation_subject_ids,
    }
}

fn kanji_fields(data: SubjectData) -> KanjiFields {
    let readings_of = |kind: ReadingKind| -> Vec<String> {
        data.readings
            .iter()
            .filter(|r| r.kind == Some(kind))
            .map(|r| r.reading.clone())
            .collect()
    };

    let onyomi_readings = readings_of(ReadingKind::Onyomi);
    let kunyomi_readings = readings_of(ReadingKind::Kunyomi);
    let primary_reading = data
        .readings
        .iter()
        .find(|r| r.primary)
        .map(|r| r.reading.clone());

    KanjiFields {
        readings: data.readings.iter().map(|r| r.reading.clone()).collect(),
        onyomi_readings,
        kunyomi_readings,
        primary_reading,
        meaning_mnemonic: data.meaning_mnemonic,
        reading_mnemonic: data.reading_mnemonic,
        component_subject_ids: data.component_subject_ids,
        amalgamation_subject_ids: data.amalgamation_subject_ids,
        visually_similar_subject_ids: data.visually_similar_subject_ids,
    }
}

fn vocabulary_fields(data: SubjectData) -> VocabularyFields {
    VocabularyFields {
        readings: data.readings.into_iter().map(|r| r.reading).collect(),
        meaning_mnemonic: data.meaning_mnemonic,
        reading_mnemonic: data.reading_mnemonic,
        parts_of_speech: data.parts_of_speech,
        context_sentences: data.context_sentences,
        pronunciation_audios: data.pronunciation_audios.into_iter().map(|a| a.url).collect(),
        component_subject_ids: data.component_subject_ids,
    }
}
