//! Alternate country spellings and the canonical names they stand for.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Boundary-file and indicator-export spellings -> dataset spelling.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("United States of America", "United States"),
    ("Russian Federation", "Russia"),
    ("Czechia", "Czech Republic"),
    ("Syrian Arab Republic", "Syria"),
    ("Iran, Islamic Rep.", "Iran"),
    ("Korea, Rep.", "South Korea"),
    ("Republic of Korea", "South Korea"),
    ("Korea, Dem. People's Rep.", "North Korea"),
    ("Lao People's Democratic Republic", "Laos"),
    ("Viet Nam", "Vietnam"),
    ("Myanmar", "Burma"),
    ("Macedonia", "North Macedonia"),
    ("Congo", "Republic of the Congo"),
    ("Dem. Rep. Congo", "Congo, Democratic Republic of the"),
    ("Tanzania", "Tanzania, United Republic of"),
    ("Egypt, Arab Rep.", "Egypt"),
    ("Venezuela, RB", "Venezuela"),
    ("Yemen, Rep.", "Yemen"),
    ("Slovakia", "Slovak Republic"),
    ("Bolivia", "Bolivia, Plurinational State of"),
    ("Brunei", "Brunei Darussalam"),
    ("East Timor", "Timor-Leste"),
    ("Ivory Coast", "Cote d'Ivoire"),
    ("Côte d'Ivoire", "Cote d'Ivoire"),
    ("Swaziland", "Eswatini"),
    ("The Bahamas", "Bahamas, The"),
    ("Bahamas", "Bahamas, The"),
    ("Gambia", "Gambia, The"),
    ("The Gambia", "Gambia, The"),
    ("Kyrgyz Republic", "Kyrgyzstan"),
    ("Libya", "Libyan Arab Jamahiriya"),
    ("Moldova", "Moldova, Republic of"),
    ("St. Kitts and Nevis", "Saint Kitts and Nevis"),
    ("St. Lucia", "Saint Lucia"),
    ("St. Vincent and the Grenadines", "Saint Vincent and the Grenadines"),
    ("Turkiye", "Turkey"),
    ("Türkiye", "Turkey"),
    ("Hong Kong SAR, China", "Hong Kong"),
    ("Macao SAR, China", "Macao"),
    ("West Bank and Gaza", "Palestine"),
];

static BUILTIN: Lazy<AliasTable> = Lazy::new(|| AliasTable::new(BUILTIN_ALIASES.iter().copied()));

/// Static alias -> canonical name mapping. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    pub fn new<I, A, C>(entries: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(a, c)| (a.into(), c.into()))
                .collect(),
        }
    }

    /// The table shipped with the crate.
    pub fn builtin() -> &'static AliasTable {
        &BUILTIN
    }

    /// A copy with extra entries; extras win over existing ones.
    pub fn extended(&self, extra: &IndexMap<String, String>) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(extra.iter().map(|(a, c)| (a.clone(), c.clone())));
        Self { entries }
    }

    pub fn canonical(&self, alias: &str) -> Option<&str> {
        self.entries.get(alias).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_every_entry() {
        assert_eq!(AliasTable::builtin().len(), BUILTIN_ALIASES.len());
        assert_eq!(AliasTable::builtin().canonical("Czechia"), Some("Czech Republic"));
        assert_eq!(AliasTable::builtin().canonical("Vietnam"), None);
    }

    #[test]
    fn extension_overrides() {
        let mut extra = IndexMap::new();
        extra.insert("Myanmar".to_string(), "Myanmar (Burma)".to_string());
        let table = AliasTable::builtin().extended(&extra);
        assert_eq!(table.canonical("Myanmar"), Some("Myanmar (Burma)"));
        assert_eq!(AliasTable::builtin().canonical("Myanmar"), Some("Burma"));
    }
}
