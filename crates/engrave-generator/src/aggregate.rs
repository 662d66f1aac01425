//! The aggregate listing consumed by the browser-side search.

use engrave_core::PersonRecord;
use serde::{Serialize, Serializer, ser::SerializeMap};
use tracing::debug;

/// Structured info as an ordered string map.
///
/// Serialized as a JSON object whose keys keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoMap(Vec<(String, String)>);

impl InfoMap {
    /// Build from a record, with the derived age applied.
    #[must_use]
    pub fn from_record(record: &PersonRecord) -> Self {
        Self(record.info_entries())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for InfoMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One person in the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingEntry {
    pub id: String,
    pub name: String,
    /// Empty when the document has none.
    pub description: String,
    /// Relative to the site root.
    pub avatar_path: String,
    pub structured_info: InfoMap,
}

impl ListingEntry {
    /// Project a record through its default-locale document.
    ///
    /// Returns `None` for records that are not published.
    #[must_use]
    pub fn from_record(record: &PersonRecord) -> Option<Self> {
        let content = record.default_content()?;
        Some(Self {
            id: record.id.to_string(),
            name: record.display_name(content),
            description: content.front_matter.description.clone().unwrap_or_default(),
            avatar_path: record.derived.avatar.root_relative(),
            structured_info: InfoMap::from_record(record),
        })
    }
}

/// All published people, newest death date first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AggregateListing {
    entries: Vec<ListingEntry>,
}

impl AggregateListing {
    #[must_use]
    pub fn entries(&self) -> &[ListingEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Build the listing from derived records.
///
/// Records without default-locale content are left out. The rest are sorted
/// descending by sort key as plain strings; equal keys keep input order.
#[must_use]
pub fn aggregate(records: &[PersonRecord]) -> AggregateListing {
    let mut keyed: Vec<(&str, ListingEntry)> = records
        .iter()
        .filter_map(|record| {
            ListingEntry::from_record(record).map(|entry| (record.derived.sort_key.as_str(), entry))
        })
        .collect();

    // sort_by is stable
    keyed.sort_by(|(a, _), (b, _)| b.cmp(a));

    debug!(
        total = records.len(),
        listed = keyed.len(),
        "aggregated listing"
    );

    AggregateListing {
        entries: keyed.into_iter().map(|(_, entry)| entry).collect(),
    }
}

#[cfg(test)]
mod tests {
    use engrave_core::{
        FrontMatter, Locale, LocalizedContent, PersonId, PersonMeta, StructuredInfo,
        derive_fields,
    };

    use super::*;

    fn record(id: &str, died: Option<&str>, with_default: bool) -> PersonRecord {
        let meta = PersonMeta {
            info: StructuredInfo {
                died: died.map(str::to_string),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut record = PersonRecord::new(PersonId::new(id).unwrap(), meta);
        let locale = if with_default {
            Locale::default_locale()
        } else {
            Locale::variant("en")
        };
        record.content.push(LocalizedContent {
            locale,
            front_matter: FrontMatter {
                name: Some(format!("Name {id}")),
                ..Default::default()
            },
            body: String::new(),
        });
        derive_fields(record, "css/default-avatar.svg")
    }

    fn ids(listing: &AggregateListing) -> Vec<&str> {
        listing.entries().iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_sorted_descending_unknown_last() {
        let records = vec![
            record("a", Some("2021-05-01"), true),
            record("b", None, true),
            record("c", Some("2023-01-01"), true),
        ];

        let listing = aggregate(&records);
        assert_eq!(ids(&listing), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_ties_keep_load_order() {
        let records = vec![
            record("x", Some("2020-01-01"), true),
            record("y", None, true),
            record("z", Some("2020-01-01"), true),
            record("w", None, true),
        ];

        assert_eq!(ids(&aggregate(&records)), vec!["x", "z", "y", "w"]);
    }

    #[test]
    fn test_missing_default_locale_excluded() {
        let records = vec![
            record("listed", None, true),
            record("english-only", Some("2024-01-01"), false),
        ];

        let listing = aggregate(&records);
        assert_eq!(ids(&listing), vec!["listed"]);
    }

    #[test]
    fn test_entry_json_shape() {
        let mut rec = record("lin", Some("2020-06-10"), true);
        rec.meta.info.born = Some("1990-06-15".to_string());
        let rec = derive_fields(rec, "css/default-avatar.svg");

        let json = aggregate(&[rec]).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entry = &value[0];

        assert_eq!(entry["id"], "lin");
        assert_eq!(entry["name"], "Name lin");
        assert_eq!(entry["description"], "");
        assert_eq!(entry["avatarPath"], "css/default-avatar.svg");
        assert_eq!(entry["structuredInfo"]["age"], "29");
        assert_eq!(entry["structuredInfo"]["died"], "2020-06-10");
    }

    #[test]
    fn test_info_map_keeps_order() {
        let mut rec = record("p", Some("2020-06-10"), true);
        rec.meta.info.location = Some("上海".to_string());
        rec.meta
            .info
            .extra
            .insert("alpha".to_string(), serde_yaml::Value::from("a"));

        let json = serde_json::to_string(&InfoMap::from_record(&rec)).unwrap();
        assert_eq!(json, r#"{"location":"上海","died":"2020-06-10","alpha":"a"}"#);
    }

    #[test]
    fn test_empty_listing() {
        let listing = aggregate(&[]);
        assert!(listing.is_empty());
        assert_eq!(listing.to_json().unwrap(), "[]");
    }
}
