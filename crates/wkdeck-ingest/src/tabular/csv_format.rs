//! CSV rendition of the flat table

use super::{FlatRow, Result};
use std::path::Path;

pub(super) fn write(rows: &[FlatRow], path: &Path) -> Result<()> {
    let mut writer = ::csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub(super) fn read(path: &Path) -> Result<Vec<FlatRow>> {
    let mut reader = ::csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<std::result::Result<Vec<FlatRow>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_header_follows_column_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.csv");
        write(&[FlatRow { id: 7, object: "kanji".to_string(), ..Default::default() }], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(header, super::super::COLUMNS.join(","));
    }

    #[test]
    fn test_quotes_and_commas_survive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rows.csv");
        let row = FlatRow {
            id: 1,
            object: "vocabulary".to_string(),
            meanings: "['One', \"it's\"]".to_string(),
            meaning_mnemonic: Some("Line one,\nline two".to_string()),
            ..Default::default()
        };
        write(std::slice::from_ref(&row), &path).unwrap();
        assert_eq!(read(&path).unwrap(), vec![row]);
    }
}
