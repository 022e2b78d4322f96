//! Per-category views over the subjects table
//!
//! List columns are stored as `['a', 'b']` text; the views expose them as
//! `text[]` by trimming the brackets and splitting on commas. Elements keep
//! their quotes, which the deck builder strips.

/// View names in creation order
pub const VIEW_NAMES: [&str; 3] = ["wanikani_radicals", "wanikani_kanji", "wanikani_vocab"];

fn list(column: &str) -> String {
    format!("string_to_array(trim('[]' from {column}), ',') AS {column}")
}

/// `DROP VIEW IF EXISTS` for every view
pub fn drop_statements() -> Vec<String> {
    VIEW_NAMES
        .iter()
        .map(|view| format!("DROP VIEW IF EXISTS {view}"))
        .collect()
}

/// `CREATE VIEW` statements over `table`
///
/// `table` must already be validated; it is interpolated as is.
pub fn create_statements(table: &str) -> Vec<String> {
    vec![
        format!(
            "CREATE VIEW wanikani_radicals AS \
             SELECT id, level, slug AS meaning, COALESCE(characters, 'N/A') AS radical, \
             {meanings}, meaning_mnemonic \
             FROM {table} WHERE object = 'radical' ORDER BY level, id",
            meanings = list("meanings"),
        ),
        format!(
            "CREATE VIEW wanikani_kanji AS \
             SELECT id, level, slug AS kanji, primary_reading, \
             {meanings}, {onyomi}, {kunyomi}, meaning_mnemonic, reading_mnemonic \
             FROM {table} WHERE object = 'kanji' ORDER BY level, id",
            meanings = list("meanings"),
            onyomi = list("onyomi_readings"),
            kunyomi = list("kunyomi_readings"),
        ),
        format!(
            "CREATE VIEW wanikani_vocab AS \
             SELECT id, level, slug AS word, \
             {readings}, {meanings}, {auxiliary}, meaning_mnemonic, reading_mnemonic \
             FROM {table} WHERE object = 'vocabulary' ORDER BY level, id",
            readings = list("readings"),
            meanings = list("meanings"),
            auxiliary = list("auxiliary_meanings"),
        ),
    ]
}
