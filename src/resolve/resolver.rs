//! Entity Resolver
//! Maps a free-text country name onto a dataset key.

use crate::data::{CountryDataset, YearValues};
use crate::resolve::aliases::AliasTable;
use serde::Serialize;
use std::cmp::Ordering;

/// Which rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Alias,
    Normalized,
    Substring,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'a> {
    pub key: &'a str,
    pub kind: MatchKind,
    pub values: &'a YearValues,
}

/// Lower-case, drop punctuation, collapse whitespace, trim.
pub fn normalize_name(name: &str) -> String {
    let kept: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shorter keys first, then lexicographic.
fn candidate_order(a: &str, b: &str) -> Ordering {
    a.chars()
        .count()
        .cmp(&b.chars().count())
        .then_with(|| a.cmp(b))
}

/// Layered lookup: exact key, alias (one hop), normalized equality,
/// normalized substring. First hit wins.
pub struct EntityResolver<'a> {
    dataset: &'a CountryDataset,
    aliases: &'a AliasTable,
    // (normalized, key), pre-sorted so the first fuzzy hit is the tie-break winner.
    candidates: Vec<(String, &'a str)>,
}

impl<'a> EntityResolver<'a> {
    pub fn new(dataset: &'a CountryDataset, aliases: &'a AliasTable) -> Self {
        let mut candidates: Vec<(String, &'a str)> = dataset
            .keys()
            .map(|k| (normalize_name(k), k.as_str()))
            .filter(|(n, _)| !n.is_empty())
            .collect();
        candidates.sort_by(|a, b| candidate_order(a.1, b.1));
        Self {
            dataset,
            aliases,
            candidates,
        }
    }

    pub fn resolve(&self, query: &str) -> Option<Resolution<'a>> {
        let dataset: &'a CountryDataset = self.dataset;

        if let Some((key, values)) = dataset.get_key_value(query) {
            return Some(Resolution {
                key,
                kind: MatchKind::Exact,
                values,
            });
        }

        if let Some((key, values)) = self
            .aliases
            .canonical(query)
            .and_then(|target| dataset.get_key_value(target))
        {
            return Some(Resolution {
                key,
                kind: MatchKind::Alias,
                values,
            });
        }

        let needle = normalize_name(query);
        if needle.is_empty() {
            return None;
        }

        let fuzzy = self
            .candidates
            .iter()
            .find(|(n, _)| *n == needle)
            .map(|(_, key)| (*key, MatchKind::Normalized))
            .or_else(|| {
                self.candidates
                    .iter()
                    .find(|(n, _)| n.contains(needle.as_str()) || needle.contains(n.as_str()))
                    .map(|(_, key)| (*key, MatchKind::Substring))
            })?;

        dataset.get_key_value(fuzzy.0).map(|(key, values)| Resolution {
            key,
            kind: fuzzy.1,
            values,
        })
    }

    pub fn dataset(&self) -> &'a CountryDataset {
        self.dataset
    }
}
