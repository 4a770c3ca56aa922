//! Typed view of catalog listing entries.
//!
//! Catalog items come in several DCAT-like shapes. Every field the engine
//! cares about is decoded into a concrete type; an item whose fields have
//! the wrong type fails to decode and is skipped by the caller.

use std::collections::BTreeMap;

use serde::Deserialize;

/// A field that may hold one value or a list of values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(v) => std::slice::from_ref(v).iter(),
            OneOrMany::Many(v) => v.iter(),
        }
    }
}

/// Theme/tag/keyword values: a string, a list, or a map of labels.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextValues {
    One(String),
    Many(Vec<Option<Label>>),
    Map(BTreeMap<String, Option<Label>>),
}

/// One label inside a list or map; non-string labels are kept but ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Text(String),
    Other(serde_json::Value),
}

impl TextValues {
    pub fn strings(&self) -> Vec<&str> {
        fn label(l: &Option<Label>) -> Option<&str> {
            match l {
                Some(Label::Text(s)) => Some(s.as_str()),
                _ => None,
            }
        }
        match self {
            TextValues::One(s) => vec![s.as_str()],
            TextValues::Many(v) => v.iter().filter_map(label).collect(),
            TextValues::Map(m) => m.values().filter_map(label).collect(),
        }
    }
}

/// Dataset identifier as sent by the catalog (string or number).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Text(String),
    Number(serde_json::Number),
}

impl IdValue {
    pub fn to_text(&self) -> String {
        match self {
            IdValue::Text(s) => s.clone(),
            IdValue::Number(n) => n.to_string(),
        }
    }
}

/// One downloadable file of a dataset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Distribution {
    #[serde(rename = "downloadURL")]
    pub download_url: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "accessURL")]
    pub access_url: Option<String>,
    pub endpoint: Option<String>,
    pub filename: Option<String>,
    pub title: Option<String>,
}

impl Distribution {
    pub fn link(&self) -> Option<&str> {
        [&self.download_url, &self.url, &self.access_url, &self.endpoint]
            .into_iter()
            .find_map(|v| v.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

/// One entry of the catalog listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatasetItem {
    pub id: Option<IdValue>,
    pub dataset_id: Option<IdValue>,
    pub identifier: Option<IdValue>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "abstract")]
    pub summary: Option<String>,

    pub theme: Option<TextValues>,
    pub themes: Option<TextValues>,
    pub topic: Option<TextValues>,
    pub topics: Option<TextValues>,
    pub tags: Option<TextValues>,
    pub keyword: Option<TextValues>,
    pub keywords: Option<TextValues>,

    pub distribution: Option<OneOrMany<Distribution>>,
    pub distributions: Option<OneOrMany<Distribution>>,
    pub resources: Option<OneOrMany<Distribution>>,
    pub files: Option<OneOrMany<Distribution>>,
    pub assets: Option<OneOrMany<Distribution>>,

    #[serde(rename = "downloadURL")]
    pub download_url: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "accessURL")]
    pub access_url: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "landingPage")]
    pub landing_page: Option<String>,

    /// Some catalogs nest the descriptive fields one level down.
    pub metadata: Option<Box<DatasetItem>>,
}
