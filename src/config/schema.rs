//! On-disk document types for deck profiles.
//!
//! A profile is a tree of pages. Each page maps key positions to bindings,
//! and folder bindings keep their child page under `children` at the same
//! position:
//!
//! ```json
//! {
//!   "id": "5eedeb1b-cc0e-42ac-8dbb-9c0cd3f38b15",
//!   "name": "Streaming",
//!   "brightness": 70,
//!   "root": {
//!     "bindings": {
//!       "3": { "kind": "navigation" },
//!       "4": { "kind": "brightness", "settings": { "mode": 1, "value": 10 } },
//!       "7": { "custom-icon": { "background-color": "#ff0000ff", "text": "Live" } }
//!     },
//!     "children": {
//!       "3": { "bindings": { "0": { "kind": "navigation" } } }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Rgba, Settings};

/// One page of bindings plus the pages of its folder keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    #[serde(default)]
    pub bindings: BTreeMap<u8, BindingDocument>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<u8, PageDocument>,
}

impl PageDocument {
    /// Number of pages in this subtree, this one included.
    #[must_use]
    pub fn page_count(&self) -> usize {
        1 + self.children.values().map(Self::page_count).sum::<usize>()
    }

    /// Follow a list of folder positions down the tree.
    #[must_use]
    pub fn descend(&self, path: &[u8]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |page, position| page.children.get(position))
    }
}

/// The persisted association of a key position with an action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BindingDocument {
    /// Action kind id. Absent for keys that only carry a custom icon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub settings: Settings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_icon: Option<IconDocument>,
}

impl BindingDocument {
    #[must_use]
    pub fn action(kind: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.custom_icon.is_none()
    }
}

/// Serialized icon contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IconDocument {
    #[serde(default = "transparent")]
    pub background_color: Rgba,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Inline image bytes, base64 encoded on disk.
    #[serde(default, skip_serializing_if = "Option::is_none", with = "base64_bytes")]
    pub data: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

const fn transparent() -> Rgba {
    Rgba::TRANSPARENT
}

/// A whole profile: metadata plus the root page tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_brightness")]
    pub brightness: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub root: PageDocument,
}

const fn default_brightness() -> u8 {
    70
}

impl ProfileDocument {
    /// A fresh profile with an empty root page.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            brightness: default_brightness(),
            modified: None,
            root: PageDocument::default(),
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)] // serde's `with` passes `&Option<T>`
    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
