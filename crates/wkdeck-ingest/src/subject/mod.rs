//! Subject data model
//!
//! [`RawSubject`] is what the API hands us; [`NormalizedRow`] is the flat
//! projection every later stage works with.

pub mod raw;
pub mod row;

pub use raw::{
    AuxiliaryMeaning, CharacterImage, ContextSentence, Meaning, Pagination, PronunciationAudio,
    RawSubject, Reading, ReadingKind, SubjectData, SubjectPage,
};
pub use row::{
    CommonFields, KanjiFields, NormalizedRow, RadicalFields, SubjectDetail, SubjectKind,
    VocabularyFields,
};
