use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::filter::{Filter, MEMBER_SLIDER_MAX};

/// Number of events requested per page
pub const PAGE_SIZE: u32 = 10;

/// Value sent as `maxCount` when the slider is at its maximum
pub const DEFAULT_MEMBER_COUNT_OPEN_END: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub page_size: u32,
    /// Upper bound transmitted for "100 and above". Backend convention, hence configurable.
    pub member_count_open_end: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            page_size: PAGE_SIZE,
            member_count_open_end: DEFAULT_MEMBER_COUNT_OPEN_END,
        }
    }
}

/// Body of the event search call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub calendar_sport_id: Vec<i64>,
    pub calendar_sport_type_id: Vec<i64>,
    pub discipline_id: Vec<i64>,
    pub program_id: Vec<i64>,
    pub age_id: Vec<i64>,
    pub sex_id: Vec<i64>,
    pub team_id: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,
    /// Inclusive lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
    pub page: u32,
    pub size: u32,
}

#[derive(Default)]
struct IdBuckets {
    sport: BTreeSet<i64>,
    sport_type: BTreeSet<i64>,
    discipline: BTreeSet<i64>,
    program: BTreeSet<i64>,
    age: BTreeSet<i64>,
    sex: BTreeSet<i64>,
    team: BTreeSet<i64>,
}

/// Translate a filter list into the request for `page`.
///
/// Identity arrays are deduplicated and sorted, so the same logical set
/// always yields the same request whatever order the filters were added in.
pub fn translate(filters: &[Filter], page: u32, options: &QueryOptions) -> SearchRequest {
    let mut ids = IdBuckets::default();
    let mut date_range = None;
    let mut member_range = None;

    for filter in filters {
        match filter {
            Filter::DateRange { start, end } if date_range.is_none() => {
                date_range = Some((*start, *end));
            }
            Filter::MemberCountRange { start, end } if member_range.is_none() => {
                member_range = Some((*start, *end));
            }
            Filter::DateRange { .. } | Filter::MemberCountRange { .. } => {}
            Filter::SportCategory(s) => {
                ids.sport.insert(s.id);
            }
            Filter::SportTypeCategory(s) => {
                ids.sport_type.insert(s.id);
            }
            Filter::DisciplineInfo(s) => {
                ids.discipline.insert(s.id);
            }
            Filter::ProgramInfo(s) => {
                ids.program.insert(s.id);
            }
            Filter::AgeCategory(s) => {
                ids.age.insert(s.id);
            }
            Filter::SexCategory(s) => {
                ids.sex.insert(s.id);
            }
            Filter::TeamInfo(s) => {
                ids.team.insert(s.id);
            }
        }
    }

    let (date_from, date_to) = date_range.unwrap_or((None, None));

    let (min_count, max_count) = match member_range {
        Some((start, end)) => {
            let end = if end >= MEMBER_SLIDER_MAX {
                options.member_count_open_end.max(end)
            } else {
                end
            };
            (Some(start), Some(end))
        }
        None => (None, None),
    };

    SearchRequest {
        calendar_sport_id: ids.sport.into_iter().collect(),
        calendar_sport_type_id: ids.sport_type.into_iter().collect(),
        discipline_id: ids.discipline.into_iter().collect(),
        program_id: ids.program.into_iter().collect(),
        age_id: ids.age.into_iter().collect(),
        sex_id: ids.sex.into_iter().collect(),
        team_id: ids.team.into_iter().collect(),
        location: None,
        min_count,
        max_count,
        date_from,
        date_to,
        page,
        size: options.page_size,
    }
}
