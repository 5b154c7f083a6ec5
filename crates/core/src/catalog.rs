//! Catalog document model.
//!
//! The catalog is stored as one pretty-printed JSON file, `manhwas.json`,
//! shaped `{ "manhwas": [Entry, ...] }` because that is what the static
//! renderer reads. Writes always replace the whole document.
//!
//! Fields the model does not know about are kept in `extra` maps so a
//! round-trip through the service never drops editor data.

use std::collections::HashSet;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::{self, Deserializer, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Store path of the catalog document.
pub const CATALOG_PATH: &str = "manhwas.json";

/// Commit message used for every catalog write.
pub const CATALOG_COMMIT_MESSAGE: &str = "Update manhwas.json";

/// A chapter reference: editors type either a number or free text ("12.5", "S2 E4").
///
/// Numbers keep their exact textual form, so `-3` stays `-3` and integers
/// beyond 64 bits are not rounded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChapterRef {
    Number(Number),
    Text(String),
}

impl ChapterRef {
    pub fn number(value: impl Into<Number>) -> Self {
        ChapterRef::Number(value.into())
    }
}

impl<'de> Deserialize<'de> for ChapterRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => Ok(ChapterRef::Number(n)),
            Value::String(s) => Ok(ChapterRef::Text(s)),
            other => Err(de::Error::invalid_type(
                unexpected(&other),
                &"a chapter number or text",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debut_chapter: Option<ChapterRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action_chapters: Vec<ChapterRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One catalog entry (a single title).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Caller-supplied id. The renderer resolves detail views by id, so ids
    /// should be unique within a document.
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<ChapterRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub characters: Vec<Character>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `null` reads as the field's default, same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

/// The full catalog, in editor order.
///
/// Deserializes from `{ "manhwas": [...] }`, `{ "entries": [...] }` or a
/// bare array. Always serializes as `{ "manhwas": [...] }`. An entry that
/// fails to parse is reported by its position (`manhwas[3]: ...`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogDocument {
    #[serde(rename = "manhwas")]
    pub entries: Vec<Entry>,
}

impl<'de> Deserialize<'de> for CatalogDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = match Value::deserialize(deserializer)? {
            Value::Object(mut map) => match map.remove("manhwas").or_else(|| map.remove("entries")) {
                Some(list) => list,
                None => return Err(de::Error::missing_field("manhwas")),
            },
            other => other,
        };
        let items = match list {
            Value::Array(items) => items,
            other => {
                return Err(de::Error::invalid_type(
                    unexpected(&other),
                    &"an array of catalog entries",
                ))
            }
        };

        let entries = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Entry::deserialize(item)
                    .map_err(|e| de::Error::custom(format!("manhwas[{index}]: {e}")))
            })
            .collect::<Result<Vec<_>, D::Error>>()?;
        Ok(Self { entries })
    }
}

impl CatalogDocument {
    /// Pretty-printed JSON bytes, as committed to the store.
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Base64 of [`Self::to_pretty_json`], ready for the contents API.
    pub fn to_content_base64(&self) -> Result<String, serde_json::Error> {
        Ok(STANDARD.encode(self.to_pretty_json()?))
    }

    /// Ids that occur more than once, in first-repeat order.
    pub fn duplicate_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for entry in &self.entries {
            if !seen.insert(entry.id.as_str()) && !dupes.contains(&entry.id.as_str()) {
                dupes.push(entry.id.as_str());
            }
        }
        dupes
    }
}
