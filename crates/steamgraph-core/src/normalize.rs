//! # Record Normalizer
//!
//! Converts one raw dataset row into a [`NormalizedRecord`]: the Game's
//! identity and scalar attributes plus the publisher, genre and tag names it
//! links to.
//!
//! Malformed numeric fields never abort ingestion: they are replaced by
//! defaults (`0` / `0.0`) here and never surface as errors.

use crate::owners::estimate_owners;
use crate::primitives::{
    LIST_SEPARATOR, PROP_ESTIMATED_OWNERS, PROP_NAME, PROP_PRICE, PROP_RELEASE_DATE,
    PROP_REQUIRED_AGE,
};
use crate::{Properties, PropertyValue};
use serde::Deserialize;

// =============================================================================
// RAW RECORD
// =============================================================================

/// One row of the games dataset, exactly as read from the CSV file.
///
/// Every column is optional: absent columns deserialize to `None` and are
/// handled by the normalizer's defaults. Columns not listed here are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "AppID", default)]
    pub app_id: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Release date", default)]
    pub release_date: Option<String>,
    #[serde(rename = "Estimated owners", default)]
    pub estimated_owners: Option<String>,
    #[serde(rename = "Required age", default)]
    pub required_age: Option<String>,
    #[serde(rename = "Price", default)]
    pub price: Option<String>,
    #[serde(rename = "Publishers", default)]
    pub publishers: Option<String>,
    #[serde(rename = "Genres", default)]
    pub genres: Option<String>,
    #[serde(rename = "Tags", default)]
    pub tags: Option<String>,
}

impl RawRecord {
    /// Ownership estimate of this row, the ranking key of the pipeline.
    #[must_use]
    pub fn owners(&self) -> u64 {
        estimate_owners(self.estimated_owners.as_deref().unwrap_or_default())
    }
}

// =============================================================================
// NORMALIZED RECORD
// =============================================================================

/// A row reduced to the graph's vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    /// External identifier (AppID). Identity of the Game node.
    pub identity: String,
    pub name: String,
    pub release_date: String,
    pub estimated_owners: u64,
    pub required_age: u64,
    pub price: f64,
    pub publishers: Vec<String>,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
}

impl NormalizedRecord {
    /// Scalar attributes as they are stored on the Game node.
    #[must_use]
    pub fn properties(&self) -> Properties {
        let mut props = Properties::new();
        props.insert(PROP_NAME.into(), PropertyValue::Text(self.name.clone()));
        props.insert(
            PROP_RELEASE_DATE.into(),
            PropertyValue::Text(self.release_date.clone()),
        );
        props.insert(
            PROP_ESTIMATED_OWNERS.into(),
            PropertyValue::Integer(self.estimated_owners),
        );
        props.insert(
            PROP_REQUIRED_AGE.into(),
            PropertyValue::Integer(self.required_age),
        );
        props.insert(PROP_PRICE.into(), PropertyValue::Float(self.price));
        props
    }
}

/// Normalize a raw row.
///
/// Returns `None` only when the row has no identifier: such a row cannot be
/// merged onto a stable Game identity and is skipped by the pipeline.
#[must_use]
pub fn normalize(raw: &RawRecord) -> Option<NormalizedRecord> {
    let identity = raw.app_id.as_deref().map(str::trim).unwrap_or_default();
    if identity.is_empty() {
        return None;
    }

    Some(NormalizedRecord {
        identity: identity.to_string(),
        name: text(raw.name.as_deref()),
        release_date: text(raw.release_date.as_deref()),
        estimated_owners: raw.owners(),
        required_age: parse_age(raw.required_age.as_deref()),
        price: parse_price(raw.price.as_deref()),
        publishers: split_list(raw.publishers.as_deref()),
        genres: split_list(raw.genres.as_deref()),
        tags: split_list(raw.tags.as_deref()),
    })
}

fn text(field: Option<&str>) -> String {
    field.map(str::trim).unwrap_or_default().to_string()
}

/// Split a comma-separated field, trimming each element and dropping empty
/// ones. Duplicates are removed, first occurrence wins.
fn split_list(field: Option<&str>) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in field.unwrap_or_default().split(LIST_SEPARATOR) {
        let item = item.trim();
        if !item.is_empty() && !items.iter().any(|seen| seen == item) {
            items.push(item.to_string());
        }
    }
    items
}

/// Whole years; a decimal such as `"17.0"` is truncated. Anything else,
/// including negative values, is `0`.
fn parse_age(field: Option<&str>) -> u64 {
    let trimmed = field.map(str::trim).unwrap_or_default();
    if let Ok(age) = trimmed.parse::<u64>() {
        return age;
    }
    match trimmed.parse::<f64>() {
        Ok(age) if age.is_finite() && age >= 0.0 => age.trunc() as u64,
        _ => 0,
    }
}

/// Non-negative finite decimal, otherwise `0.0`.
fn parse_price(field: Option<&str>) -> f64 {
    match field.map(str::trim).unwrap_or_default().parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => price,
        _ => 0.0,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(app_id: &str) -> RawRecord {
        RawRecord {
            app_id: Some(app_id.to_string()),
            name: Some("Counter-Strike".to_string()),
            release_date: Some("Nov 1, 2000".to_string()),
            estimated_owners: Some("10000000 - 20000000".to_string()),
            required_age: Some("0".to_string()),
            price: Some("9.99".to_string()),
            publishers: Some("Valve".to_string()),
            genres: Some("Action".to_string()),
            tags: Some("FPS, Shooter,Multiplayer ".to_string()),
        }
    }

    #[test]
    fn normalizes_complete_row() {
        let record = normalize(&raw("10")).expect("identity present");

        assert_eq!(record.identity, "10");
        assert_eq!(record.name, "Counter-Strike");
        assert_eq!(record.estimated_owners, 20_000_000);
        assert_eq!(record.required_age, 0);
        assert_eq!(record.price, 9.99);
        assert_eq!(record.publishers, vec!["Valve"]);
        assert_eq!(record.tags, vec!["FPS", "Shooter", "Multiplayer"]);
    }

    #[test]
    fn missing_identity_is_skipped() {
        assert!(normalize(&raw("   ")).is_none());
        assert!(normalize(&RawRecord::default()).is_none());
    }

    #[test]
    fn absent_or_empty_lists_are_empty() {
        let mut row = raw("10");
        row.publishers = None;
        row.genres = Some(String::new());
        row.tags = Some(" , ,".to_string());

        let record = normalize(&row).expect("identity present");
        assert!(record.publishers.is_empty());
        assert!(record.genres.is_empty());
        assert!(record.tags.is_empty());
    }

    #[test]
    fn list_elements_are_deduplicated() {
        let mut row = raw("10");
        row.tags = Some("Indie, Indie ,RPG".to_string());
        let record = normalize(&row).expect("identity present");
        assert_eq!(record.tags, vec!["Indie", "RPG"]);
    }

    #[test]
    fn malformed_numbers_default() {
        let mut row = raw("10");
        row.required_age = Some("eighteen".to_string());
        row.price = Some("free".to_string());
        row.estimated_owners = Some("N/A".to_string());

        let record = normalize(&row).expect("identity present");
        assert_eq!(record.required_age, 0);
        assert_eq!(record.price, 0.0);
        assert_eq!(record.estimated_owners, 0);
    }

    #[test]
    fn missing_numbers_default() {
        let mut row = raw("10");
        row.required_age = None;
        row.price = Some(String::new());

        let record = normalize(&row).expect("identity present");
        assert_eq!(record.required_age, 0);
        assert_eq!(record.price, 0.0);
    }

    #[test]
    fn negative_values_default() {
        let mut row = raw("10");
        row.required_age = Some("-3".to_string());
        row.price = Some("-1.5".to_string());

        let record = normalize(&row).expect("identity present");
        assert_eq!(record.required_age, 0);
        assert_eq!(record.price, 0.0);
    }

    #[test]
    fn decimal_age_is_truncated() {
        let mut row = raw("10");
        row.required_age = Some("17.0".to_string());
        assert_eq!(normalize(&row).expect("identity").required_age, 17);
    }

    #[test]
    fn properties_cover_all_scalars() {
        let props = normalize(&raw("10")).expect("identity").properties();
        assert_eq!(props.len(), 5);
        assert_eq!(
            props.get(PROP_ESTIMATED_OWNERS),
            Some(&PropertyValue::Integer(20_000_000))
        );
    }
}
