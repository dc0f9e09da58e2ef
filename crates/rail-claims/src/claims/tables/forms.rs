use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDefaults {
    #[serde(default)]
    pub prefer_national: bool,
    #[serde(default)]
    pub filenames: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NationalFormEntry {
    #[serde(default)]
    pub prefer_national: Option<bool>,
    #[serde(default)]
    pub filenames: Option<Vec<String>>,
    /// First template found on disk, set when the table is loaded.
    #[serde(skip)]
    pub available: Option<String>,
}

/// Per-country preference for national claim templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NationalForms {
    #[serde(default)]
    pub defaults: FormDefaults,
    #[serde(default)]
    pub countries: BTreeMap<String, NationalFormEntry>,
}

impl NationalForms {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let mut forms: NationalForms = serde_json::from_str(raw)?;
        forms.countries = std::mem::take(&mut forms.countries)
            .into_iter()
            .map(|(country, entry)| (country.trim().to_ascii_uppercase(), entry))
            .collect();
        Ok(forms)
    }

    /// Record which listed templates exist below `root`.
    pub fn resolve_templates(&mut self, root: &Path) {
        let defaults = self.defaults.filenames.clone();
        for entry in self.countries.values_mut() {
            let candidates = entry.filenames.as_ref().unwrap_or(&defaults);
            entry.available = candidates
                .iter()
                .find(|relative| root.join(relative.as_str()).is_file())
                .cloned();
        }
    }

    pub fn prefers_national(&self, iso: &str) -> bool {
        self.countries
            .get(iso)
            .and_then(|entry| entry.prefer_national)
            .unwrap_or(self.defaults.prefer_national)
    }

    pub fn template_for(&self, iso: &str) -> Option<&str> {
        self.countries
            .get(iso)
            .and_then(|entry| entry.available.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_preference_overrides_defaults() {
        let forms = NationalForms::from_json(
            r#"{
                "defaults": {"prefer_national": false},
                "countries": {"fr": {"prefer_national": true, "filenames": ["forms/fr_g30.pdf"]}}
            }"#,
        )
        .expect("forms parse");

        assert!(forms.prefers_national("FR"));
        assert!(!forms.prefers_national("DE"));
        assert!(forms.template_for("FR").is_none());
    }
}
