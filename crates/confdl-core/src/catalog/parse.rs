//! Lenient JSON decoding for catalog documents.
//!
//! The catalog API is loose about types: list fields arrive as a single
//! string, an array or `null`, and `level` as a number or a label such as
//! `"Advanced (300)"`. Everything is normalized here so the rest of the
//! crate sees plain strings, vectors and `Option<u32>`.

use serde::{Deserialize, Deserializer};

use super::{CatalogError, SessionRecord};

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<Option<String>>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Number(u64),
    Float(f64),
    Text(String),
}

/// `null` or missing becomes an empty string.
pub(super) fn null_as_empty<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Blank or `null` links become `None`.
pub(super) fn optional_link<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// A string, a list of strings or `null`, normalized to a list without blanks.
pub(super) fn string_or_list<'de, D>(d: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = match Option::<OneOrMany>::deserialize(d)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(items)) => items.into_iter().flatten().collect(),
    };
    Ok(values
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// A number, a string holding a number, or `null`. Unparseable labels become `None`.
pub(super) fn level<'de, D>(d: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LevelRepr>::deserialize(d)? {
        None => None,
        Some(LevelRepr::Number(n)) => u32::try_from(n).ok(),
        Some(LevelRepr::Float(f)) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
            Some(f as u32)
        }
        Some(LevelRepr::Float(_)) => None,
        Some(LevelRepr::Text(s)) => level_from_label(&s),
    })
}

/// First run of ASCII digits in `label`: `"300"` and `"Advanced (300)"` both give 300.
fn level_from_label(label: &str) -> Option<u32> {
    let start = label.find(|c: char| c.is_ascii_digit())?;
    let digits: String = label[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<SessionRecord>),
    Wrapped {
        #[serde(alias = "data", alias = "value")]
        sessions: Vec<SessionRecord>,
    },
}

/// Decode a catalog body: a JSON array of sessions, or an object wrapping the
/// array under `sessions`, `data` or `value`.
pub fn decode_sessions(body: &[u8]) -> Result<Vec<SessionRecord>, CatalogError> {
    let doc: CatalogDocument = serde_json::from_slice(body).map_err(CatalogError::Decode)?;
    Ok(match doc {
        CatalogDocument::List(sessions) | CatalogDocument::Wrapped { sessions } => sessions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_array_with_loose_types() {
        let body = br#"[
            {
                "sessionCode": "THR2120",
                "title": "Deploying Windows at scale",
                "topic": "Modern Workplace",
                "level": 300,
                "products": "Windows",
                "speakerNames": ["Ada Byron", "Grace Hopper"],
                "speakerCompanies": null,
                "downloadVideoLink": "https://media.example.com/THR2120.mp4",
                "slideDeck": "",
                "somethingElse": {"ignored": true}
            }
        ]"#;
        let sessions = decode_sessions(body).unwrap();
        assert_eq!(sessions.len(), 1);
        let s = &sessions[0];
        assert_eq!(s.session_code, "THR2120");
        assert_eq!(s.level, Some(300));
        assert_eq!(s.products, vec!["Windows"]);
        assert_eq!(s.speaker_names, vec!["Ada Byron", "Grace Hopper"]);
        assert!(s.speaker_companies.is_empty());
        assert_eq!(
            s.download_video_link.as_deref(),
            Some("https://media.example.com/THR2120.mp4")
        );
        assert!(s.slide_deck.is_none());
    }

    #[test]
    fn missing_fields_default() {
        let sessions = decode_sessions(br#"[{"title": "Keynote"}]"#).unwrap();
        let s = &sessions[0];
        assert!(s.session_code.is_empty());
        assert_eq!(s.title, "Keynote");
        assert!(s.level.is_none());
        assert!(s.products.is_empty());
        assert!(s.download_video_link.is_none());
    }

    #[test]
    fn level_labels() {
        assert_eq!(level_from_label("300"), Some(300));
        assert_eq!(level_from_label("Advanced (300)"), Some(300));
        assert_eq!(level_from_label("Foundational"), None);
        let sessions =
            decode_sessions(br#"[{"level": "Intermediate (200)"}, {"level": null}]"#).unwrap();
        assert_eq!(sessions[0].level, Some(200));
        assert_eq!(sessions[1].level, None);
    }

    #[test]
    fn wrapped_documents() {
        let body = br#"{"data": [{"sessionCode": "BRK1001"}]}"#;
        assert_eq!(decode_sessions(body).unwrap()[0].session_code, "BRK1001");
        let body = br#"{"sessions": []}"#;
        assert!(decode_sessions(body).unwrap().is_empty());
    }

    #[test]
    fn list_with_null_entries() {
        let body = br#"[{"products": ["Azure", null, " ", "Teams"]}]"#;
        assert_eq!(decode_sessions(body).unwrap()[0].products, vec!["Azure", "Teams"]);
    }

    #[test]
    fn not_json_is_decode_error() {
        let err = decode_sessions(b"<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));
    }
}
