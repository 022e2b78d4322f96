//! Note models: field lists, card templates and styling per category
//!
//! Model and deck ids are fixed so that re-importing a regenerated package
//! updates the existing cards instead of creating a second copy.

use genanki_rs::{Field, Model, Template};

pub const RADICAL_MODEL_ID: i64 = 1;
pub const KANJI_MODEL_ID: i64 = 2;
pub const VOCABULARY_MODEL_ID: i64 = 3;

pub const RADICAL_DECK_ID: i64 = 1_902_418_301;
pub const KANJI_DECK_ID: i64 = 1_902_418_302;
pub const VOCABULARY_DECK_ID: i64 = 1_902_418_303;

pub const RADICAL_DECK_NAME: &str = "WaniKani Japanese::Radicals";
pub const KANJI_DECK_NAME: &str = "WaniKani Japanese::Kanji";
pub const VOCABULARY_DECK_NAME: &str = "WaniKani Japanese::Vocabulary";

pub const RADICAL_FIELDS: [&str; 5] = ["Radical", "Meanings", "Meaning_Mnemonic", "Level", "ID"];

pub const KANJI_FIELDS: [&str; 8] = [
    "Kanji",
    "Meanings",
    "Onyomi_Readings",
    "Kunyomi_Readings",
    "Meaning_Mnemonic",
    "Reading_Mnemonic",
    "Level",
    "ID",
];

pub const VOCABULARY_FIELDS: [&str; 8] = [
    "Word",
    "Meanings",
    "Readings",
    "Auxiliary_Meanings",
    "Meaning_Mnemonic",
    "Reading_Mnemonic",
    "Level",
    "ID",
];

const CARD_CSS: &str = r#"
.card {
    font-family: "Segoe UI", "Roboto", sans-serif;
    font-size: 16px;
    text-align: center;
    color: #969696;
    background-color: #202020;
}
.title {
    font-family: "Segoe UI", "Roboto", sans-serif;
    font-size: 26px;
}
.text {
    font-family: "Segoe UI", "Roboto", sans-serif;
}
"#;

const RADICAL_CSS: &str = r#"
.radical {
    font-family: "Meiryo", "Hiragino Kaku Gothic ProN", "Noto Sans JP", sans-serif;
    font-size: 40px;
    color: #FFFFFF;
    line-height: 60px;
    background-color: #4193F1;
}
"#;

const KANJI_CSS: &str = r#"
.kanji {
    font-family: "Meiryo", "Hiragino Kaku Gothic ProN", "Noto Sans JP", sans-serif;
    font-size: 70px;
    color: #FFFFFF;
    line-height: 100px;
    background-color: #EB417D;
}
.hiragana {
    font-family: "Meiryo", "Hiragino Kaku Gothic ProN", "Noto Sans JP", sans-serif;
    font-size: 20px;
}
"#;

const VOCABULARY_CSS: &str = r#"
.word {
    font-family: "Meiryo", "Hiragino Kaku Gothic ProN", "Noto Sans JP", sans-serif;
    font-size: 40px;
    color: #FFFFFF;
    line-height: 60px;
    background-color: #833EA8;
}
"#;

const RADICAL_FRONT: &str = r#"<div class="radical"><br>{{Radical}}<br><br></div>"#;

const RADICAL_BACK: &str = r##"{{FrontSide}}<br>
<span class="title"><font color="#4193F1"><b>{{Meanings}}</b></font></span><p>
<span class="text"><b>Meaning Mnemonic:</b><br>{{Meaning_Mnemonic}}</span><br>
<br>
<span class="text">Wanikani Level: {{Level}}</span><br>"##;

const KANJI_FRONT: &str = r#"<div class="kanji"><br>{{Kanji}}<br><br></div>"#;

const KANJI_BACK: &str = r##"{{FrontSide}}<br>
<span class="title"><font color="#EB417D"><b>{{Meanings}}</b></font></span><p>
<span class="text"><b>On'yomi: </b></span>
<span class="hiragana">{{Onyomi_Readings}}</span><br>
<span class="text"><b>Kun'yomi: </b></span>
<span class="hiragana">{{Kunyomi_Readings}}</span><p>
<span class="text"><b>Meaning Mnemonic:</b></span><br>
<span class="text">{{Meaning_Mnemonic}}</span><p>
<span class="text"><b>Reading Mnemonic:</b></span><br>
<span class="text">{{Reading_Mnemonic}}</span><br>
<br>
<span class="text">Wanikani Level: {{Level}}</span><br>"##;

const VOCABULARY_FRONT: &str = r#"<div class="word"><br>{{Word}}<br><br></div>"#;

const VOCABULARY_BACK: &str = r##"{{FrontSide}}<br>
<span class="title"><font color="#9F5FBF"><b>{{Meanings}}</b></font></span><p>
<span class="title"><b>{{Readings}}</b></span><br>
<span class="text"><b>Auxiliary Meanings:</b> {{Auxiliary_Meanings}}</span><p>
<span class="text"><b>Meaning Mnemonic:</b><br>{{Meaning_Mnemonic}}</span><p>
<span class="text"><b>Reading Mnemonic:</b><br>{{Reading_Mnemonic}}</span><br>
<br>
<span class="text">Wanikani Level: <b>{{Level}}</b></span><br>"##;

fn build_model(
    id: i64,
    name: &str,
    fields: &[&str],
    template: &str,
    front: &str,
    back: &str,
    css: &str,
) -> Model {
    Model::new(
        id,
        name,
        fields.iter().map(|f| Field::new(f)).collect(),
        vec![Template::new(template).qfmt(front).afmt(back)],
    )
    .css(&format!("{CARD_CSS}{css}"))
}

pub fn radical_model() -> Model {
    build_model(
        RADICAL_MODEL_ID,
        "WaniKani Radical Model",
        &RADICAL_FIELDS,
        "Radical Card",
        RADICAL_FRONT,
        RADICAL_BACK,
        RADICAL_CSS,
    )
}

pub fn kanji_model() -> Model {
    build_model(
        KANJI_MODEL_ID,
        "WaniKani Kanji Model",
        &KANJI_FIELDS,
        "Kanji Card",
        KANJI_FRONT,
        KANJI_BACK,
        KANJI_CSS,
    )
}

pub fn vocabulary_model() -> Model {
    build_model(
        VOCABULARY_MODEL_ID,
        "WaniKani Vocabulary Model",
        &VOCABULARY_FIELDS,
        "Vocabulary Card",
        VOCABULARY_FRONT,
        VOCABULARY_BACK,
        VOCABULARY_CSS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_reference_every_field() {
        let cases: [(&[&str], String); 3] = [
            (&RADICAL_FIELDS, format!("{RADICAL_FRONT}{RADICAL_BACK}")),
            (&KANJI_FIELDS, format!("{KANJI_FRONT}{KANJI_BACK}")),
            (&VOCABULARY_FIELDS, format!("{VOCABULARY_FRONT}{VOCABULARY_BACK}")),
        ];
        for (fields, templates) in cases {
            for field in fields.iter().filter(|f| **f != "ID") {
                assert!(templates.contains(&format!("{{{{{field}}}}}")), "{field} unused");
            }
        }
    }

    #[test]
    fn test_header_colours_match_categories() {
        assert!(RADICAL_CSS.contains("background-color: #4193F1"));
        assert!(KANJI_CSS.contains("background-color: #EB417D"));
        assert!(VOCABULARY_CSS.contains("background-color: #833EA8"));
        assert!(CARD_CSS.contains("background-color: #202020"));
    }
}
