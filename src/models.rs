use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::portable_text::PortableBlock;

/// An event document as returned by the event query, with `headline` and
/// `venue` references already resolved.
///
/// Every field other than `_id` is decoded leniently: a value of the wrong
/// shape is dropped (and logged) instead of failing the whole record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub slug: Option<Slug>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// ISO-8601 timestamp, kept raw so a malformed value doesn't fail the page.
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub format: Option<String>,
    /// Minutes; any JSON number, fractional included.
    #[serde(rename = "doorsOpen", default, deserialize_with = "lenient")]
    pub doors_open: Option<f64>,
    #[serde(default, deserialize_with = "lenient_vec")]
    pub details: Vec<PortableBlock>,
    #[serde(default, deserialize_with = "lenient")]
    pub image: Option<ImageSource>,
    #[serde(default, deserialize_with = "lenient")]
    pub tickets: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub headline: Option<Headline>,
    #[serde(default, deserialize_with = "lenient")]
    pub venue: Option<Venue>,
}

impl Event {
    pub fn starts_at(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.date.as_deref()?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Some(dt),
            Err(e) => {
                tracing::warn!(event = %self.id, date = %raw, error = %e, "unparseable event date");
                None
            }
        }
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_ref().map(|s| s.current.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slug {
    pub current: String,
}

/// Resolved `headline->` reference: the primary performing artist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Headline {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: Option<String>,
}

/// Resolved `venue->` reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Venue {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: Option<String>,
}

/// An image field: an asset reference plus optional editor crop and hotspot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSource {
    #[serde(default, deserialize_with = "lenient")]
    pub asset: Option<AssetRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub crop: Option<ImageCrop>,
    #[serde(default, deserialize_with = "lenient")]
    pub hotspot: Option<ImageHotspot>,
}

impl ImageSource {
    pub fn asset_id(&self) -> Option<&str> {
        let asset = self.asset.as_ref()?;
        asset.reference.as_deref().or(asset.id.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref")]
    pub reference: Option<String>,
    /// Present instead of `_ref` when the asset was dereferenced.
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

/// Fractions of the asset trimmed from each edge; missing edges are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageCrop {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

/// Focus area, as fractions of the asset size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageHotspot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for ImageHotspot {
    fn default() -> Self {
        Self { x: 0.5, y: 0.5, width: 1.0, height: 1.0 }
    }
}

/// `None` for null or for a value that doesn't decode as `T`.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring malformed field");
            Ok(None)
        }
    }
}

/// Keeps the elements that decode; anything that isn't an array is empty.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            tracing::warn!(value = %other, "expected an array, ignoring field");
            return Ok(Vec::new());
        }
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed element");
                None
            }
        })
        .collect())
}
