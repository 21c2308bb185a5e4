use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A recording as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordingSummary {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_datetime: Option<String>,
}

impl RecordingSummary {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }
}

/// One participant entry. Known fields are typed; everything else the API
/// sends is kept verbatim so artifacts stay faithful to the source.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Full recording, fetched by ID with transcript included.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordingDetail {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub start_datetime: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub participants: Vec<Participant>,
    /// The API returns the structured transcript as `transcript_json` when
    /// `transcript_format=json` is requested.
    #[serde(default = "empty_object", rename = "transcript_json", alias = "transcript")]
    pub transcript: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Some recordings come back with `"participants": null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of the recordings listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordingPage {
    #[serde(default)]
    pub recordings: Vec<RecordingSummary>,
    /// Continuation token; `None` means there are no further pages.
    #[serde(default, rename = "cursor", deserialize_with = "non_empty_cursor")]
    pub next_cursor: Option<String>,
}

/// The API has been seen to send `""` instead of `null` on the last page.
fn non_empty_cursor<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|c| !c.is_empty()))
}
