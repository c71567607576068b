//! Tagged-record encoding of filters.
//!
//! A filter is stored as a flat JSON object: the `filterType` discriminator
//! sits next to the variant's own fields. Readers ignore fields they do not
//! know, so records written by newer versions still load.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::filter::{Filter, FilterKind, Selection};

pub const DISCRIMINATOR: &str = "filterType";

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "filterType")]
enum FilterRecord {
    #[serde(rename = "DATE", rename_all = "camelCase")]
    Date {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_date: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end_date: Option<NaiveDate>,
    },
    #[serde(rename = "MEMBER_RANGE")]
    MemberRange { start: u32, end: u32 },
    #[serde(rename = "SEX")]
    Sex(SelectionRecord),
    #[serde(rename = "TEAM")]
    Team(SelectionRecord),
    #[serde(rename = "AGE")]
    Age(SelectionRecord),
    #[serde(rename = "CALENDAR_SPORT")]
    Sport(SelectionRecord),
    #[serde(rename = "CALENDAR_SPORT_TYPE")]
    SportType(SelectionRecord),
    #[serde(rename = "DISCIPLINE")]
    Discipline(SelectionRecord),
    #[serde(rename = "PROGRAM")]
    Program(SelectionRecord),
}

#[derive(Debug, Serialize, Deserialize)]
struct SelectionRecord {
    id: i64,
    name: String,
}

impl From<&Selection> for SelectionRecord {
    fn from(selection: &Selection) -> Self {
        SelectionRecord {
            id: selection.id,
            name: selection.name.clone(),
        }
    }
}

impl From<SelectionRecord> for Selection {
    fn from(record: SelectionRecord) -> Self {
        Selection::new(record.id, record.name)
    }
}

impl From<&Filter> for FilterRecord {
    fn from(filter: &Filter) -> Self {
        match filter {
            Filter::DateRange { start, end } => FilterRecord::Date {
                start_date: *start,
                end_date: *end,
            },
            Filter::MemberCountRange { start, end } => FilterRecord::MemberRange {
                start: *start,
                end: *end,
            },
            Filter::SexCategory(s) => FilterRecord::Sex(s.into()),
            Filter::TeamInfo(s) => FilterRecord::Team(s.into()),
            Filter::AgeCategory(s) => FilterRecord::Age(s.into()),
            Filter::SportCategory(s) => FilterRecord::Sport(s.into()),
            Filter::SportTypeCategory(s) => FilterRecord::SportType(s.into()),
            Filter::DisciplineInfo(s) => FilterRecord::Discipline(s.into()),
            Filter::ProgramInfo(s) => FilterRecord::Program(s.into()),
        }
    }
}

impl From<FilterRecord> for Filter {
    fn from(record: FilterRecord) -> Self {
        match record {
            FilterRecord::Date {
                start_date,
                end_date,
            } => Filter::DateRange {
                start: start_date,
                end: end_date,
            },
            FilterRecord::MemberRange { start, end } => Filter::MemberCountRange { start, end },
            FilterRecord::Sex(s) => Filter::SexCategory(s.into()),
            FilterRecord::Team(s) => Filter::TeamInfo(s.into()),
            FilterRecord::Age(s) => Filter::AgeCategory(s.into()),
            FilterRecord::Sport(s) => Filter::SportCategory(s.into()),
            FilterRecord::SportType(s) => Filter::SportTypeCategory(s.into()),
            FilterRecord::Discipline(s) => Filter::DisciplineInfo(s.into()),
            FilterRecord::Program(s) => Filter::ProgramInfo(s.into()),
        }
    }
}

impl Serialize for Filter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        FilterRecord::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        FilterRecord::deserialize(deserializer).map(Filter::from)
    }
}

/// Encode a single filter as a tagged record
pub fn encode(filter: &Filter) -> Result<Value> {
    serde_json::to_value(FilterRecord::from(filter)).map_err(Error::from)
}

/// Decode a tagged record. The discriminator is checked before any variant field is read.
pub fn decode(record: &Value) -> Result<Filter> {
    let tag = record
        .get(DISCRIMINATOR)
        .ok_or_else(|| Error::MalformedFilter(format!("missing '{}' field", DISCRIMINATOR)))?;

    let tag = tag.as_str().ok_or_else(|| {
        Error::MalformedFilter(format!("'{}' must be a string, got {}", DISCRIMINATOR, tag))
    })?;

    let kind = FilterKind::from_tag(tag)
        .ok_or_else(|| Error::MalformedFilter(format!("unknown filter type '{}'", tag)))?;

    FilterRecord::deserialize(record)
        .map(Filter::from)
        .map_err(|e| Error::MalformedFilter(format!("invalid {} record: {}", kind.tag(), e)))
}

/// Encode a filter list into the opaque string kept in a preset's remote `value` field
pub fn encode_list(filters: &[Filter]) -> Result<String> {
    let records = filters
        .iter()
        .map(FilterRecord::from)
        .collect::<Vec<_>>();

    serde_json::to_string(&records).map_err(Error::from)
}

/// Decode a list produced by [`encode_list`].
///
/// One malformed element fails the whole list: a partially loaded preset is
/// worse than an explicit load failure.
pub fn decode_list(encoded: &str) -> Result<Vec<Filter>> {
    let records: Vec<Value> = serde_json::from_str(encoded)
        .map_err(|e| Error::MalformedFilter(format!("expected an array of filters: {}", e)))?;

    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            decode(record).map_err(|e| match e {
                Error::MalformedFilter(msg) => {
                    Error::MalformedFilter(format!("element {}: {}", index, msg))
                }
                other => other,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct CandidateRecord {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sex: Option<String>,
    #[serde(default)]
    age: Option<String>,
}

/// Decode a reference lookup result into filter candidates of `kind`.
///
/// Accepts either the `{"data": [...]}` envelope or a bare array. Sex and age
/// categories carry their label in `sex`/`age` rather than `name`.
pub fn decode_reference_candidates(kind: FilterKind, payload: &Value) -> Result<Vec<Filter>> {
    if !kind.is_reference() {
        return Err(Error::MalformedFilter(format!(
            "{} is not a reference-data kind",
            kind
        )));
    }

    let items = match payload {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::MalformedFilter(
                    "lookup response has no 'data' array".to_string(),
                ))
            }
        },
        other => {
            return Err(Error::MalformedFilter(format!(
                "unexpected lookup response: {}",
                other
            )))
        }
    };

    let mut candidates = Vec::with_capacity(items.len());
    for item in items {
        let record = CandidateRecord::deserialize(item)
            .map_err(|e| Error::MalformedFilter(format!("invalid {} candidate: {}", kind, e)))?;

        let label = match kind {
            FilterKind::SexCategory => record.sex.or(record.name),
            FilterKind::AgeCategory => record.age.or(record.name),
            _ => record.name,
        }
        .ok_or_else(|| {
            Error::MalformedFilter(format!("{} candidate {} has no name", kind, record.id))
        })?;

        if let Some(filter) = Filter::reference(kind, record.id, label) {
            candidates.push(filter);
        }
    }

    Ok(candidates)
}
