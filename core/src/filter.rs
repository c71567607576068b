use std::{fmt, str::FromStr};

use chrono::NaiveDate;

/// Upper end of the member count slider. An upper bound at or above it means "and above".
pub const MEMBER_SLIDER_MAX: u32 = 100;

/// Discriminates the filter variants, both in memory and on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKind {
    DateRange,
    MemberCountRange,
    SexCategory,
    TeamInfo,
    AgeCategory,
    SportCategory,
    SportTypeCategory,
    DisciplineInfo,
    ProgramInfo,
}

impl FilterKind {
    pub const ALL: [FilterKind; 9] = [
        FilterKind::DateRange,
        FilterKind::MemberCountRange,
        FilterKind::SexCategory,
        FilterKind::TeamInfo,
        FilterKind::AgeCategory,
        FilterKind::SportCategory,
        FilterKind::SportTypeCategory,
        FilterKind::DisciplineInfo,
        FilterKind::ProgramInfo,
    ];

    /// Value filters hold at most one instance per set
    pub fn is_singleton(self) -> bool {
        matches!(self, FilterKind::DateRange | FilterKind::MemberCountRange)
    }

    pub fn is_reference(self) -> bool {
        !self.is_singleton()
    }

    /// Discriminator written into the `filterType` field of a tagged record
    pub fn tag(self) -> &'static str {
        match self {
            FilterKind::DateRange => "DATE",
            FilterKind::MemberCountRange => "MEMBER_RANGE",
            FilterKind::SexCategory => "SEX",
            FilterKind::TeamInfo => "TEAM",
            FilterKind::AgeCategory => "AGE",
            FilterKind::SportCategory => "CALENDAR_SPORT",
            FilterKind::SportTypeCategory => "CALENDAR_SPORT_TYPE",
            FilterKind::DisciplineInfo => "DISCIPLINE",
            FilterKind::ProgramInfo => "PROGRAM",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Short human-facing name, used on the command line
    pub fn slug(self) -> &'static str {
        match self {
            FilterKind::DateRange => "date",
            FilterKind::MemberCountRange => "members",
            FilterKind::SexCategory => "sex",
            FilterKind::TeamInfo => "team",
            FilterKind::AgeCategory => "age",
            FilterKind::SportCategory => "sport",
            FilterKind::SportTypeCategory => "sport-type",
            FilterKind::DisciplineInfo => "discipline",
            FilterKind::ProgramInfo => "program",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for FilterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.slug() == s || kind.tag() == s)
            .ok_or_else(|| format!("unknown filter kind '{}'", s))
    }
}

/// A reference-data entity picked by the user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub id: i64,
    pub name: String,
}

impl Selection {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Selection {
            id,
            name: name.into(),
        }
    }
}

/// One atomic search constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Filter {
    DateRange {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    MemberCountRange {
        start: u32,
        end: u32,
    },
    SexCategory(Selection),
    TeamInfo(Selection),
    AgeCategory(Selection),
    SportCategory(Selection),
    SportTypeCategory(Selection),
    DisciplineInfo(Selection),
    ProgramInfo(Selection),
}

/// Identity of a filter within a set: reference kinds by id, value kinds by kind alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterKey {
    pub kind: FilterKind,
    pub id: Option<i64>,
}

impl Filter {
    /// Builds a reference-kind filter. Returns `None` for value kinds.
    pub fn reference(kind: FilterKind, id: i64, name: impl Into<String>) -> Option<Self> {
        let selection = Selection::new(id, name);
        let filter = match kind {
            FilterKind::SexCategory => Filter::SexCategory(selection),
            FilterKind::TeamInfo => Filter::TeamInfo(selection),
            FilterKind::AgeCategory => Filter::AgeCategory(selection),
            FilterKind::SportCategory => Filter::SportCategory(selection),
            FilterKind::SportTypeCategory => Filter::SportTypeCategory(selection),
            FilterKind::DisciplineInfo => Filter::DisciplineInfo(selection),
            FilterKind::ProgramInfo => Filter::ProgramInfo(selection),
            FilterKind::DateRange | FilterKind::MemberCountRange => return None,
        };
        Some(filter)
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::DateRange { .. } => FilterKind::DateRange,
            Filter::MemberCountRange { .. } => FilterKind::MemberCountRange,
            Filter::SexCategory(_) => FilterKind::SexCategory,
            Filter::TeamInfo(_) => FilterKind::TeamInfo,
            Filter::AgeCategory(_) => FilterKind::AgeCategory,
            Filter::SportCategory(_) => FilterKind::SportCategory,
            Filter::SportTypeCategory(_) => FilterKind::SportTypeCategory,
            Filter::DisciplineInfo(_) => FilterKind::DisciplineInfo,
            Filter::ProgramInfo(_) => FilterKind::ProgramInfo,
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        match self {
            Filter::DateRange { .. } | Filter::MemberCountRange { .. } => None,
            Filter::SexCategory(s)
            | Filter::TeamInfo(s)
            | Filter::AgeCategory(s)
            | Filter::SportCategory(s)
            | Filter::SportTypeCategory(s)
            | Filter::DisciplineInfo(s)
            | Filter::ProgramInfo(s) => Some(s),
        }
    }

    /// Reference-data id; `None` for date and member count ranges
    pub fn identity(&self) -> Option<i64> {
        self.selection().map(|s| s.id)
    }

    pub fn key(&self) -> FilterKey {
        FilterKey {
            kind: self.kind(),
            id: self.identity(),
        }
    }

    /// Text shown on the filter chip. Derived from the payload, never stored.
    pub fn display_text(&self) -> String {
        match self {
            Filter::DateRange { start, end } => match (start, end) {
                (Some(start), Some(end)) => {
                    format!("{}-{}", start.format("%d.%m"), end.format("%d.%m"))
                }
                (Some(start), None) => format!("от {}", start.format("%d.%m")),
                (None, Some(end)) => format!("до {}", end.format("%d.%m")),
                (None, None) => String::new(),
            },
            Filter::MemberCountRange { start, end } => {
                if *end >= MEMBER_SLIDER_MAX {
                    format!("{}-{}+ участников", start, MEMBER_SLIDER_MAX)
                } else {
                    format!("{}-{} участников", start, end)
                }
            }
            other => other
                .selection()
                .map(|s| s.name.clone())
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}
