//! Theme matching and CSV distribution extraction for dataset items.

use super::model::{DatasetItem, Distribution, OneOrMany, TextValues};

/// True if `url` points at a CSV file (`.csv` suffix or `.csv?query`).
pub fn is_csv_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.ends_with(".csv") || lower.contains(".csv?")
}

impl DatasetItem {
    /// Raw dataset identifier, first non-empty of id, dataset_id, identifier, name, title.
    pub fn raw_id(&self) -> Option<String> {
        let ids = [&self.id, &self.dataset_id, &self.identifier]
            .into_iter()
            .flatten()
            .map(|v| v.to_text());
        let names = [&self.name, &self.title].into_iter().flatten().cloned();
        ids.chain(names).find(|s| !s.trim().is_empty())
    }

    fn theme_fields(&self) -> [&Option<TextValues>; 7] {
        [
            &self.theme,
            &self.themes,
            &self.topic,
            &self.topics,
            &self.tags,
            &self.keyword,
            &self.keywords,
        ]
    }

    fn distribution_fields(&self) -> [&Option<OneOrMany<Distribution>>; 5] {
        [
            &self.distribution,
            &self.distributions,
            &self.resources,
            &self.files,
            &self.assets,
        ]
    }

    /// Theme-like labels; each field falls back to the nested `metadata` copy when absent.
    pub fn theme_values(&self) -> Vec<&str> {
        let nested = self.metadata.as_deref().map(|m| m.theme_fields());
        let mut out = Vec::new();
        for (i, field) in self.theme_fields().into_iter().enumerate() {
            let field = field.as_ref().or_else(|| nested.and_then(|n| n[i].as_ref()));
            if let Some(values) = field {
                out.extend(values.strings());
            }
        }
        out
    }

    /// True if any theme label, or failing that the title/name/description, mentions `theme`.
    pub fn matches_theme(&self, theme: &str) -> bool {
        let needle = theme.to_lowercase();
        let hit = |s: &str| s.to_lowercase().contains(&needle);
        if self.theme_values().into_iter().any(hit) {
            return true;
        }
        let nested = self.metadata.as_deref();
        let texts = [
            (&self.title, nested.map(|m| &m.title)),
            (&self.name, nested.map(|m| &m.name)),
            (&self.description, nested.map(|m| &m.description)),
            (&self.summary, nested.map(|m| &m.summary)),
        ];
        texts.into_iter().any(|(own, fallback)| {
            own.as_deref()
                .or_else(|| fallback.and_then(|f| f.as_deref()))
                .is_some_and(hit)
        })
    }

    /// CSV distributions as `(url, filename hint)`. Falls back to the item's own
    /// link fields when no distribution entry points at a CSV.
    pub fn csv_distributions(&self) -> Vec<(&str, Option<&str>)> {
        let nested = self.metadata.as_deref().map(|m| m.distribution_fields());
        let mut out = Vec::new();
        for (i, field) in self.distribution_fields().into_iter().enumerate() {
            let field = field.as_ref().or_else(|| nested.and_then(|n| n[i].as_ref()));
            let Some(entries) = field else { continue };
            for dist in entries.iter() {
                if let Some(url) = dist.link().filter(|u| is_csv_url(u)) {
                    out.push((url, dist.filename.as_deref()));
                }
            }
        }
        if out.is_empty() {
            out.extend(
                [
                    &self.download_url,
                    &self.url,
                    &self.link,
                    &self.access_url,
                    &self.landing_page,
                ]
                .into_iter()
                .filter_map(|v| v.as_deref())
                .filter(|u| is_csv_url(u))
                .map(|u| (u, None)),
            );
        }
        out
    }
}
