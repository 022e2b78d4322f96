//! Flashcard deck builder
//!
//! Reads the three per-category views and writes one Anki package per
//! category plus a complete bundle holding all three decks. Notes are keyed
//! by the upstream subject id, so re-importing updates cards in place.

pub mod items;
pub mod models;
pub mod style;

pub use items::{KanjiItem, RadicalItem, VocabularyItem};
pub use style::{bolden_primary_reading, clean_list_items, join_list, Styler};

use genanki_rs::{Deck, Model, Note, Package};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub type Result<T> = std::result::Result<T, DeckError>;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Package error: {0}")]
    Package(#[from] genanki_rs::Error),

    #[error("Invalid markup pattern: {0}")]
    Styling(#[from] regex::Error),

    #[error("Output path is not valid UTF-8: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Which package a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckKind {
    Radical,
    Kanji,
    Vocabulary,
    /// All three decks in one package
    Complete,
}

impl DeckKind {
    pub const ALL: [DeckKind; 4] = [
        DeckKind::Radical,
        DeckKind::Kanji,
        DeckKind::Vocabulary,
        DeckKind::Complete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeckKind::Radical => "radical",
            DeckKind::Kanji => "kanji",
            DeckKind::Vocabulary => "vocabulary",
            DeckKind::Complete => "complete",
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            DeckKind::Radical => "WaniKani_Radical_Deck.apkg",
            DeckKind::Kanji => "WaniKani_Kanji_Deck.apkg",
            DeckKind::Vocabulary => "WaniKani_Vocabulary_Deck.apkg",
            DeckKind::Complete => "WaniKani_Complete_Deck.apkg",
        }
    }
}

impl fmt::Display for DeckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Note fields
// ============================================================================

fn level_text(level: Option<i32>) -> String {
    level.map(|l| l.to_string()).unwrap_or_default()
}

fn list_text(items: &Option<Vec<String>>) -> String {
    join_list(&clean_list_items(items.as_deref().unwrap_or_default()))
}

pub fn radical_note_fields(styler: &Styler, item: &RadicalItem) -> Vec<String> {
    vec![
        item.radical.clone().unwrap_or_default(),
        list_text(&item.meanings),
        styler.apply_text_styling(item.meaning_mnemonic.as_deref()),
        level_text(item.level),
        item.id.to_string(),
    ]
}

pub fn kanji_note_fields(styler: &Styler, item: &KanjiItem) -> Vec<String> {
    let primary = item.primary_reading.as_deref();
    let onyomi = bolden_primary_reading(item.onyomi_readings.as_deref().unwrap_or_default(), primary);
    let kunyomi = bolden_primary_reading(item.kunyomi_readings.as_deref().unwrap_or_default(), primary);

    vec![
        item.kanji.clone().unwrap_or_default(),
        list_text(&item.meanings),
        join_list(&onyomi),
        join_list(&kunyomi),
        styler.apply_text_styling(item.meaning_mnemonic.as_deref()),
        styler.apply_text_styling(item.reading_mnemonic.as_deref()),
        level_text(item.level),
        item.id.to_string(),
    ]
}

pub fn vocabulary_note_fields(styler: &Styler, item: &VocabularyItem) -> Vec<String> {
    vec![
        item.word.clone().unwrap_or_default(),
        list_text(&item.meanings),
        list_text(&item.readings),
        list_text(&item.auxiliary_meanings),
        styler.apply_text_styling(item.meaning_mnemonic.as_deref()),
        styler.apply_text_styling(item.reading_mnemonic.as_deref()),
        level_text(item.level),
        item.id.to_string(),
    ]
}

fn note(model: &Model, fields: &[String], id: i64) -> Result<Note> {
    let guid = id.to_string();
    let note = Note::new_with_options(
        model.clone(),
        fields.iter().map(String::as_str).collect(),
        None,
        None,
        Some(guid.as_str()),
    )?;
    Ok(note)
}

// ============================================================================
// Package writing
// ============================================================================

/// Builds decks from view rows and writes packages; no database access
pub struct DeckWriter {
    output_dir: PathBuf,
    styler: Styler,
}

impl DeckWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            output_dir: output_dir.into(),
            styler: Styler::new()?,
        })
    }

    pub fn path_for(&self, kind: DeckKind) -> PathBuf {
        self.output_dir.join(kind.file_name())
    }

    pub fn radical_deck(&self, items: &[RadicalItem]) -> Result<Deck> {
        let model = models::radical_model();
        let mut deck = Deck::new(models::RADICAL_DECK_ID, models::RADICAL_DECK_NAME, "");
        for item in items {
            deck.add_note(note(&model, &radical_note_fields(&self.styler, item), item.id)?);
        }
        Ok(deck)
    }

    pub fn kanji_deck(&self, items: &[KanjiItem]) -> Result<Deck> {
        let model = models::kanji_model();
        let mut deck = Deck::new(models::KANJI_DECK_ID, models::KANJI_DECK_NAME, "");
        for item in items {
            deck.add_note(note(&model, &kanji_note_fields(&self.styler, item), item.id)?);
        }
        Ok(deck)
    }

    pub fn vocabulary_deck(&self, items: &[VocabularyItem]) -> Result<Deck> {
        let model = models::vocabulary_model();
        let mut deck = Deck::new(models::VOCABULARY_DECK_ID, models::VOCABULARY_DECK_NAME, "");
        for item in items {
            deck.add_note(note(&model, &vocabulary_note_fields(&self.styler, item), item.id)?);
        }
        Ok(deck)
    }

    /// Write `decks` as one package for `kind`, replacing any previous file
    pub fn write(&self, kind: DeckKind, decks: Vec<Deck>) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(kind);
        write_package(decks, &path)?;

        let size_kb = fs::metadata(&path)?.len() as f64 / 1024.0;
        info!(deck = %kind, "Saved deck to {} ({:.1} KB)", path.display(), size_kb);
        Ok(path)
    }

    /// Write all four packages from already-fetched view rows
    pub fn write_all(
        &self,
        radicals: &[RadicalItem],
        kanji: &[KanjiItem],
        vocabulary: &[VocabularyItem],
    ) -> Result<BTreeMap<DeckKind, PathBuf>> {
        let radical = self.write(DeckKind::Radical, vec![self.radical_deck(radicals)?])?;
        let kanji_path = self.write(DeckKind::Kanji, vec![self.kanji_deck(kanji)?])?;
        let vocabulary_path =
            self.write(DeckKind::Vocabulary, vec![self.vocabulary_deck(vocabulary)?])?;
        let complete = self.write_complete(radicals, kanji, vocabulary)?;

        Ok(BTreeMap::from([
            (DeckKind::Radical, radical),
            (DeckKind::Kanji, kanji_path),
            (DeckKind::Vocabulary, vocabulary_path),
            (DeckKind::Complete, complete),
        ]))
    }

    fn write_complete(
        &self,
        radicals: &[RadicalItem],
        kanji: &[KanjiItem],
        vocabulary: &[VocabularyItem],
    ) -> Result<PathBuf> {
        let decks = vec![
            self.radical_deck(radicals)?,
            self.kanji_deck(kanji)?,
            self.vocabulary_deck(vocabulary)?,
        ];
        self.write(DeckKind::Complete, decks)
    }
}

fn write_package(decks: Vec<Deck>, path: &Path) -> Result<()> {
    let file = path
        .to_str()
        .ok_or_else(|| DeckError::InvalidPath(path.to_path_buf()))?;
    let mut package = Package::new(decks, vec![])?;
    package.write_to_file(file)?;
    Ok(())
}

// ============================================================================
// Database-backed builder
// ============================================================================

/// Reads the views and writes every package
pub struct DeckBuilder {
    db: PgPool,
    writer: DeckWriter,
}

impl DeckBuilder {
    pub fn new(db: PgPool, output_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            db,
            writer: DeckWriter::new(output_dir)?,
        })
    }

    async fn fetch<T>(&self, view: &str, sql: &str) -> Result<Vec<T>>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let rows = sqlx::query_as::<_, T>(sql).fetch_all(&self.db).await?;
        info!("Fetched {} records from view '{}'", rows.len(), view);
        if rows.is_empty() {
            warn!("View '{}' is empty; its deck will have no notes", view);
        }
        Ok(rows)
    }

    pub async fn radical_items(&self) -> Result<Vec<RadicalItem>> {
        self.fetch("wanikani_radicals", items::RADICALS_QUERY).await
    }

    pub async fn kanji_items(&self) -> Result<Vec<KanjiItem>> {
        self.fetch("wanikani_kanji", items::KANJI_QUERY).await
    }

    pub async fn vocabulary_items(&self) -> Result<Vec<VocabularyItem>> {
        self.fetch("wanikani_vocab", items::VOCABULARY_QUERY).await
    }

    /// Styling shared by every note this builder writes
    pub fn styler(&self) -> &Styler {
        &self.writer.styler
    }

    /// Generate the radical, kanji, vocabulary and complete packages
    ///
    /// Each category's package is written only after its view has been read
    /// in full and every note built.
    pub async fn build_all(&self) -> Result<BTreeMap<DeckKind, PathBuf>> {
        let mut written = BTreeMap::new();

        info!("Generating Radical deck...");
        let radicals = self.radical_items().await?;
        let deck = self.writer.radical_deck(&radicals)?;
        written.insert(DeckKind::Radical, self.writer.write(DeckKind::Radical, vec![deck])?);

        info!("Generating Kanji deck...");
        let kanji = self.kanji_items().await?;
        let deck = self.writer.kanji_deck(&kanji)?;
        written.insert(DeckKind::Kanji, self.writer.write(DeckKind::Kanji, vec![deck])?);

        info!("Generating Vocabulary deck...");
        let vocabulary = self.vocabulary_items().await?;
        let deck = self.writer.vocabulary_deck(&vocabulary)?;
        written.insert(
            DeckKind::Vocabulary,
            self.writer.write(DeckKind::Vocabulary, vec![deck])?,
        );

        info!("Generating complete bundle...");
        written.insert(
            DeckKind::Complete,
            self.writer.write_complete(&radicals, &kanji, &vocabulary)?,
        );

        info!("All {} decks generated", written.len());
        Ok(written)
    }
}
