//! Field derivation: age at death, sort key and avatar path.

use chrono::{DateTime, Datelike, NaiveDate};

use crate::record::{AvatarPath, PersonRecord, RecordIssue, UNKNOWN_SORT_KEY};

/// Populate `record.derived` from its raw fields.
///
/// Malformed dates never fail the record; they are noted in `record.issues`
/// and leave the age absent. An explicit age that is not a positive integer
/// is noted too, and the age is computed from the dates instead.
#[must_use]
pub fn derive_fields(mut record: PersonRecord, placeholder_avatar: &str) -> PersonRecord {
    let info = &record.meta.info;

    let born = parse_field("born", info.born.as_deref(), &mut record.issues);
    let died = parse_field("died", info.died.as_deref(), &mut record.issues);

    let explicit = match info.age.as_deref() {
        Some(raw) => {
            let parsed = raw.trim().parse::<u32>().ok().filter(|age| *age > 0);
            if parsed.is_none() {
                record.issues.push(RecordIssue::InvalidAge {
                    value: raw.to_string(),
                });
            }
            parsed
        }
        None => None,
    };

    record.derived.age = explicit.or_else(|| match (born, died) {
        (Some(born), Some(died)) => age_at(born, died),
        _ => None,
    });

    record.derived.sort_key = sort_key(info.died.as_deref());
    record.derived.avatar =
        AvatarPath::for_person(&record.id, record.meta.avatar.as_ref(), placeholder_avatar);

    record
}

/// Sort key for a death date: the value itself, or `"0"` when unknown.
///
/// Keys are compared as strings, which matches chronological order only for
/// `YYYY-MM-DD` dates.
#[must_use]
pub fn sort_key(died: Option<&str>) -> String {
    died.map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(UNKNOWN_SORT_KEY)
        .to_string()
}

/// Whole years between two dates, or `None` when not positive.
#[must_use]
pub fn age_at(born: NaiveDate, died: NaiveDate) -> Option<u32> {
    let mut years = died.year() - born.year();
    if (died.month(), died.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    u32::try_from(years).ok().filter(|age| *age > 0)
}

/// Parse an ISO-like date: `YYYY-MM-DD` or an RFC 3339 timestamp.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

fn parse_field(
    field: &'static str,
    value: Option<&str>,
    issues: &mut Vec<RecordIssue>,
) -> Option<NaiveDate> {
    let value = value?;
    let parsed = parse_date(value);
    if parsed.is_none() {
        issues.push(RecordIssue::MalformedDate {
            field,
            value: value.to_string(),
        });
    }
    parsed
}
