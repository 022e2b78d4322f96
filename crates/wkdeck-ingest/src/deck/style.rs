//! Card text formatting
//!
//! Mnemonics use WaniKani's inline markup (`<kanji>`, `<radical>`,
//! `<vocabulary>`, `<reading>`). Cards render it as coloured bold spans.

use crate::tabular::clean_list_item;
use regex::Regex;

pub const RADICAL_COLOR: &str = "#4193F1";
pub const KANJI_COLOR: &str = "#EB417D";
pub const VOCABULARY_COLOR: &str = "#9F5FBF";

/// Compiled markup patterns
#[derive(Debug, Clone)]
pub struct Styler {
    rules: Vec<(Regex, String)>,
}

impl Styler {
    pub fn new() -> Result<Self, regex::Error> {
        let span = |color: &str| format!(r#"<span style="color: {color};font-weight: bold;">$1</span>"#);

        let rules = vec![
            (Regex::new(r"<kanji>(.*?)</kanji>")?, span(KANJI_COLOR)),
            (Regex::new(r"<radical>(.*?)</radical>")?, span(RADICAL_COLOR)),
            (Regex::new(r"<vocabulary>(.*?)</vocabulary>")?, span(VOCABULARY_COLOR)),
            (Regex::new(r"<reading>(.*?)</reading>")?, "<b>$1</b>".to_string()),
        ];
        Ok(Self { rules })
    }

    /// Replace markup tags with styled HTML; `None` becomes empty text
    pub fn apply_text_styling(&self, text: Option<&str>) -> String {
        let mut styled = text.unwrap_or_default().to_string();
        for (pattern, replacement) in &self.rules {
            styled = pattern.replace_all(&styled, replacement.as_str()).into_owned();
        }
        styled
    }
}

/// Clean every element of a view list column
pub fn clean_list_items(items: &[String]) -> Vec<String> {
    items.iter().map(|item| clean_list_item(item)).collect()
}

/// Clean the readings and wrap the primary one in `<b>`
///
/// Already-bolded entries no longer equal the primary reading, so applying
/// this twice gives the same result as once.
pub fn bolden_primary_reading(readings: &[String], primary: Option<&str>) -> Vec<String> {
    clean_list_items(readings)
        .into_iter()
        .map(|reading| match primary {
            Some(p) if reading == p => format!("<b>{reading}</b>"),
            _ => reading,
        })
        .collect()
}

pub fn join_list(items: &[String]) -> String {
    items.join(", ")
}
