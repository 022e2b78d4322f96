//! Parquet rendition of the flat table

use super::{FlatRow, Result, TabularError, COLUMNS};
use arrow_array::{Array, ArrayRef, Int32Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

fn column_type(name: &str) -> (DataType, bool) {
    match name {
        "id" => (DataType::Int64, false),
        "object" | "meanings" | "auxiliary_meanings" => (DataType::Utf8, false),
        "level" | "lesson_position" => (DataType::Int32, true),
        "spaced_repetition_system_id" => (DataType::Int64, true),
        _ => (DataType::Utf8, true),
    }
}

fn schema() -> Schema {
    Schema::new(
        COLUMNS
            .iter()
            .map(|name| {
                let (data_type, nullable) = column_type(name);
                Field::new(*name, data_type, nullable)
            })
            .collect::<Vec<_>>(),
    )
}

fn text<'a>(rows: &'a [FlatRow], get: impl Fn(&'a FlatRow) -> Option<&'a str>) -> ArrayRef {
    Arc::new(StringArray::from(rows.iter().map(get).collect::<Vec<_>>()))
}

fn to_batch(rows: &[FlatRow]) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(rows.iter().map(|r| r.id).collect::<Vec<_>>())),
        text(rows, |r| Some(r.object.as_str())),
        text(rows, |r| r.url.as_deref()),
        text(rows, |r| r.data_updated_at.as_deref()),
        text(rows, |r| r.created_at.as_deref()),
        Arc::new(Int32Array::from(rows.iter().map(|r| r.level).collect::<Vec<_>>())),
        text(rows, |r| r.slug.as_deref()),
        text(rows, |r| r.hidden_at.as_deref()),
        text(rows, |r| r.document_url.as_deref()),
        text(rows, |r| r.characters.as_deref()),
        text(rows, |r| Some(r.meanings.as_str())),
        text(rows, |r| Some(r.auxiliary_meanings.as_str())),
        Arc::new(Int32Array::from(rows.iter().map(|r| r.lesson_position).collect::<Vec<_>>())),
        Arc::new(Int64Array::from(
            rows.iter().map(|r| r.spaced_repetition_system_id).collect::<Vec<_>>(),
        )),
        text(rows, |r| r.onyomi_readings.as_deref()),
        text(rows, |r| r.kunyomi_readings.as_deref()),
        text(rows, |r| r.primary_reading.as_deref()),
        text(rows, |r| r.readings.as_deref()),
        text(rows, |r| r.component_subject_ids.as_deref()),
        text(rows, |r| r.amalgamation_subject_ids.as_deref()),
        text(rows, |r| r.visually_similar_subject_ids.as_deref()),
        text(rows, |r| r.meaning_mnemonic.as_deref()),
        text(rows, |r| r.reading_mnemonic.as_deref()),
        text(rows, |r| r.character_images.as_deref()),
        text(rows, |r| r.parts_of_speech.as_deref()),
        text(rows, |r| r.context_sentences.as_deref()),
        text(rows, |r| r.pronunciation_audios.as_deref()),
    ];

    Ok(RecordBatch::try_new(Arc::new(schema()), columns)?)
}

pub(super) fn write(rows: &[FlatRow], path: &Path) -> Result<()> {
    let batch = to_batch(rows)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Typed access to the columns of one record batch
struct Columns<'b> {
    batch: &'b RecordBatch,
}

impl<'b> Columns<'b> {
    fn get<T: 'static>(&self, name: &str) -> Result<&'b T> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| TabularError::Schema {
                column: name.to_string(),
                reason: "missing".to_string(),
            })?
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| TabularError::Schema {
                column: name.to_string(),
                reason: "unexpected type".to_string(),
            })
    }

    fn text(&self, name: &str, row: usize) -> Result<Option<String>> {
        let array = self.get::<StringArray>(name)?;
        Ok((!array.is_null(row)).then(|| array.value(row).to_string()))
    }

    fn required_text(&self, name: &str, row: usize) -> Result<String> {
        self.text(name, row)?.ok_or_else(|| TabularError::Schema {
            column: name.to_string(),
            reason: format!("null in row {row}"),
        })
    }

    fn int32(&self, name: &str, row: usize) -> Result<Option<i32>> {
        let array = self.get::<Int32Array>(name)?;
        Ok((!array.is_null(row)).then(|| array.value(row)))
    }

    fn int64(&self, name: &str, row: usize) -> Result<Option<i64>> {
        let array = self.get::<Int64Array>(name)?;
        Ok((!array.is_null(row)).then(|| array.value(row)))
    }

    fn row(&self, i: usize) -> Result<FlatRow> {
        Ok(FlatRow {
            id: self.int64("id", i)?.ok_or_else(|| TabularError::Schema {
                column: "id".to_string(),
                reason: format!("null in row {i}"),
            })?,
            object: self.required_text("object", i)?,
            url: self.text("url", i)?,
            data_updated_at: self.text("data_updated_at", i)?,
            created_at: self.text("created_at", i)?,
            level: self.int32("level", i)?,
            slug: self.text("slug", i)?,
            hidden_at: self.text("hidden_at", i)?,
            document_url: self.text("document_url", i)?,
            characters: self.text("characters", i)?,
            meanings: self.required_text("meanings", i)?,
            auxiliary_meanings: self.required_text("auxiliary_meanings", i)?,
            lesson_position: self.int32("lesson_position", i)?,
            spaced_repetition_system_id: self.int64("spaced_repetition_system_id", i)?,
            onyomi_readings: self.text("onyomi_readings", i)?,
            kunyomi_readings: self.text("kunyomi_readings", i)?,
            primary_reading: self.text("primary_reading", i)?,
            readings: self.text("readings", i)?,
            component_subject_ids: self.text("component_subject_ids", i)?,
            amalgamation_subject_ids: self.text("amalgamation_subject_ids", i)?,
            visually_similar_subject_ids: self.text("visually_similar_subject_ids", i)?,
            meaning_mnemonic: self.text("meaning_mnemonic", i)?,
            reading_mnemonic: self.text("reading_mnemonic", i)?,
            character_images: self.text("character_images", i)?,
            parts_of_speech: self.text("parts_of_speech", i)?,
            context_sentences: self.text("context_sentences", i)?,
            pronunciation_audios: self.text("pronunciation_audios", i)?,
        })
    }
}

pub(super) fn read(path: &Path) -> Result<Vec<FlatRow>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let columns = Columns { batch: &batch };
        for i in 0..batch.num_rows() {
            rows.push(columns.row(i)?);
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_schema_nullability() {
        let schema = schema();
        assert_eq!(schema.fields().len(), COLUMNS.len());
        assert!(!schema.field_with_name("id").unwrap().is_nullable());
        assert!(schema.field_with_name("primary_reading").unwrap().is_nullable());
        assert_eq!(
            schema.field_with_name("level").unwrap().data_type(),
            &DataType::Int32
        );
    }

    #[test]
    fn test_nulls_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.parquet");
        let rows = vec![
            FlatRow {
                id: 1,
                object: "radical".to_string(),
                meanings: "['Ground']".to_string(),
                auxiliary_meanings: "[]".to_string(),
                characters: Some(String::new()),
                ..Default::default()
            },
            FlatRow {
                id: 2,
                object: "kanji".to_string(),
                level: Some(60),
                primary_reading: Some("いち".to_string()),
                ..Default::default()
            },
        ];
        write(&rows, &path).unwrap();
        assert_eq!(read(&path).unwrap(), rows);
    }

    #[test]
    fn test_read_rejects_foreign_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.parquet");
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![Arc::new(StringArray::from(vec!["not a number"])) as ArrayRef],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        assert!(matches!(read(&path), Err(TabularError::Schema { .. })));
    }
}
