use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Operator-wide downgrade refund policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DowngradeRule {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub fixed_amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    /// First-class price uplift over second class, e.g. 0.5 for 150%.
    #[serde(default)]
    pub uplift_ratio: Option<f64>,
}

impl DowngradeRule {
    pub fn fixed_refund(&self) -> Option<f64> {
        let is_fixed = self
            .method
            .as_deref()
            .is_some_and(|method| method.eq_ignore_ascii_case("fixed"));
        self.fixed_amount.filter(|amount| is_fixed && *amount > 0.0)
    }

    pub fn uplift(&self) -> Option<f64> {
        self.uplift_ratio.filter(|ratio| *ratio > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplement {
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorEntry {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub downgrade_rules: Option<DowngradeRule>,
    #[serde(default)]
    pub supplement_map: BTreeMap<String, Supplement>,
}

impl OperatorEntry {
    fn answers_to(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.aliases.iter().any(|alias| alias.trim().eq_ignore_ascii_case(name))
    }

    /// Supplement for an amenity type such as `seat` or `couchette`.
    pub fn supplement(&self, amenity: &str) -> Option<&Supplement> {
        let key = amenity.trim().to_ascii_lowercase();
        self.supplement_map
            .iter()
            .find(|(name, _)| name.to_ascii_lowercase() == key)
            .map(|(_, supplement)| supplement)
            .filter(|supplement| supplement.amount > 0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorCatalog {
    #[serde(default)]
    operators: Vec<OperatorEntry>,
    #[serde(default)]
    product_aliases: BTreeMap<String, String>,
}

impl OperatorCatalog {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn operator(&self, name: &str) -> Option<&OperatorEntry> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.operators.iter().find(|entry| entry.answers_to(name))
    }

    /// Owning operator of a product, resolving product aliases first.
    pub fn operator_for_product(&self, product: &str) -> Option<&OperatorEntry> {
        let product = self.canonical_product(product)?;
        self.operators.iter().find(|entry| {
            entry
                .products
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(&product))
        })
    }

    pub fn canonical_product(&self, product: &str) -> Option<String> {
        let product = product.trim();
        if product.is_empty() {
            return None;
        }
        let alias = self
            .product_aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(product))
            .map(|(_, canonical)| canonical.clone());
        Some(alias.unwrap_or_else(|| product.to_string()))
    }

    pub fn operators(&self) -> &[OperatorEntry] {
        &self.operators
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> OperatorCatalog {
        OperatorCatalog::from_json(
            r#"{
                "operators": [
                    {"name": "DB", "aliases": ["Deutsche Bahn"], "country": "DE", "products": ["ICE", "IC"],
                     "downgrade_rules": {"method": "fixed", "fixedAmount": 20, "currency": "EUR"}},
                    {"name": "SJ", "country": "SE", "products": ["SJ Snabbtåg"],
                     "downgrade_rules": {"upliftRatio": 0.5},
                     "supplement_map": {"Seat": {"amount": 5.5, "currency": "SEK"}}}
                ],
                "product_aliases": {"X2000": "SJ Snabbtåg"}
            }"#,
        )
        .expect("catalog parses")
    }

    #[test]
    fn finds_operator_by_alias_and_product_alias() {
        let catalog = catalog();
        assert_eq!(
            catalog.operator("deutsche bahn").map(|entry| entry.name.as_str()),
            Some("DB")
        );
        assert_eq!(
            catalog
                .operator_for_product("x2000")
                .map(|entry| entry.name.as_str()),
            Some("SJ")
        );
        assert!(catalog.operator("").is_none());
    }

    #[test]
    fn exposes_downgrade_policies() {
        let catalog = catalog();
        let db = catalog.operator("DB").expect("db present");
        let rule = db.downgrade_rules.as_ref().expect("db rule");
        assert_eq!(rule.fixed_refund(), Some(20.0));
        assert!(rule.uplift().is_none());

        let sj = catalog.operator("SJ").expect("sj present");
        assert_eq!(
            sj.downgrade_rules.as_ref().and_then(DowngradeRule::uplift),
            Some(0.5)
        );
        assert_eq!(sj.supplement("seat").map(|s| s.amount), Some(5.5));
        assert!(sj.supplement("couchette").is_none());
    }
}
