//! ISO 3166-1 alpha-2 codes, English names and EU membership.

const COUNTRY_NAMES: [(&str, &str); 30] = [
    ("AT", "Austria"),
    ("BE", "Belgium"),
    ("BG", "Bulgaria"),
    ("BY", "Belarus"),
    ("CH", "Switzerland"),
    ("CY", "Cyprus"),
    ("CZ", "Czechia"),
    ("DE", "Germany"),
    ("DK", "Denmark"),
    ("EE", "Estonia"),
    ("ES", "Spain"),
    ("FI", "Finland"),
    ("FR", "France"),
    ("GB", "United Kingdom"),
    ("GR", "Greece"),
    ("HR", "Croatia"),
    ("HU", "Hungary"),
    ("IE", "Ireland"),
    ("IT", "Italy"),
    ("LT", "Lithuania"),
    ("LU", "Luxembourg"),
    ("LV", "Latvia"),
    ("NL", "Netherlands"),
    ("NO", "Norway"),
    ("PL", "Poland"),
    ("PT", "Portugal"),
    ("RO", "Romania"),
    ("RU", "Russia"),
    ("SE", "Sweden"),
    ("SK", "Slovakia"),
];

const EXTRA_NAMES: [(&str, &str); 4] = [
    ("CZ", "czech republic"),
    ("GB", "great britain"),
    ("SI", "slovenia"),
    ("MT", "malta"),
];

const EU_MEMBERS: [&str; 27] = [
    "AT", "BE", "BG", "HR", "CY", "CZ", "DK", "EE", "FI", "FR", "DE", "GR", "HU", "IE", "IT",
    "LV", "LT", "LU", "MT", "NL", "PL", "PT", "RO", "SK", "SI", "ES", "SE",
];

/// English name for an ISO code, if known.
pub fn name_for(iso: &str) -> Option<&'static str> {
    let iso = iso.trim();
    COUNTRY_NAMES
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(iso))
        .map(|(_, name)| *name)
}

/// Accepts an ISO code or an English name and returns the upper-case ISO code.
pub fn to_iso(country: &str) -> Option<String> {
    let trimmed = country.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.len() == 2 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(trimmed.to_ascii_uppercase());
    }
    COUNTRY_NAMES
        .iter()
        .chain(EXTRA_NAMES.iter())
        .find(|(_, name)| name.eq_ignore_ascii_case(trimmed))
        .map(|(code, _)| code.to_string())
}

/// Lower-cased spellings a table row may use for the given country.
pub fn lookup_forms(country: &str) -> Vec<String> {
    let trimmed = country.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut forms = vec![trimmed.to_ascii_lowercase()];
    if let Some(iso) = to_iso(trimmed) {
        let iso_lower = iso.to_ascii_lowercase();
        if !forms.contains(&iso_lower) {
            forms.push(iso_lower);
        }
        if let Some(name) = name_for(&iso) {
            let name_lower = name.to_ascii_lowercase();
            if !forms.contains(&name_lower) {
                forms.push(name_lower);
            }
        }
    }
    forms
}

pub fn same_country(left: &str, right: &str) -> bool {
    match (to_iso(left), to_iso(right)) {
        (Some(a), Some(b)) => a == b,
        _ => left.trim().eq_ignore_ascii_case(right.trim()),
    }
}

pub fn is_eu(iso: &str) -> bool {
    let iso = iso.trim();
    EU_MEMBERS.iter().any(|code| code.eq_ignore_ascii_case(iso))
}
