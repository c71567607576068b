use serde::{Deserialize, Serialize};

use crate::filter::{Filter, FilterKind};

/// One reference-data entity. Sex and age categories label themselves with
/// `sex`/`age`, which win over `name` when an item carries both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EntryRecord")]
pub struct ReferenceEntry {
    pub id: i64,
    pub name: String,
    /// Program a discipline belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryRecord {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sex: Option<String>,
    #[serde(default)]
    age: Option<String>,
    #[serde(default)]
    parent_id: Option<i64>,
}

impl TryFrom<EntryRecord> for ReferenceEntry {
    type Error = String;

    fn try_from(record: EntryRecord) -> Result<Self, Self::Error> {
        let name = record
            .sex
            .or(record.age)
            .or(record.name)
            .ok_or_else(|| format!("reference entry {} has no name", record.id))?;

        Ok(ReferenceEntry {
            id: record.id,
            name,
            parent_id: record.parent_id,
        })
    }
}

/// Every selectable reference entity, as returned by the directory endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReferenceDirectory {
    pub age_category: Vec<ReferenceEntry>,
    pub calendar_sport: Vec<ReferenceEntry>,
    pub calendar_sport_type: Vec<ReferenceEntry>,
    pub discipline_info: Vec<ReferenceEntry>,
    pub program_info: Vec<ReferenceEntry>,
    pub sex_category: Vec<ReferenceEntry>,
    pub team_info: Vec<ReferenceEntry>,
}

/// A program with the disciplines nested under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramNode<'a> {
    pub program: &'a ReferenceEntry,
    pub disciplines: Vec<&'a ReferenceEntry>,
}

impl ReferenceDirectory {
    pub fn entries(&self, kind: FilterKind) -> &[ReferenceEntry] {
        match kind {
            FilterKind::AgeCategory => &self.age_category,
            FilterKind::SportCategory => &self.calendar_sport,
            FilterKind::SportTypeCategory => &self.calendar_sport_type,
            FilterKind::DisciplineInfo => &self.discipline_info,
            FilterKind::ProgramInfo => &self.program_info,
            FilterKind::SexCategory => &self.sex_category,
            FilterKind::TeamInfo => &self.team_info,
            FilterKind::DateRange | FilterKind::MemberCountRange => &[],
        }
    }

    /// All entities of `kind` as selectable filters
    pub fn candidates(&self, kind: FilterKind) -> Vec<Filter> {
        self.entries(kind)
            .iter()
            .filter_map(|e| Filter::reference(kind, e.id, e.name.clone()))
            .collect()
    }

    pub fn find(&self, kind: FilterKind, id: i64) -> Option<Filter> {
        self.entries(kind)
            .iter()
            .find(|e| e.id == id)
            .and_then(|e| Filter::reference(kind, e.id, e.name.clone()))
    }

    /// Programs in directory order, each with the disciplines whose parent it is.
    /// Disciplines without a parent are top-level entries and are left out.
    pub fn program_tree(&self) -> Vec<ProgramNode<'_>> {
        self.program_info
            .iter()
            .map(|program| ProgramNode {
                program,
                disciplines: self
                    .discipline_info
                    .iter()
                    .filter(|d| d.parent_id == Some(program.id))
                    .collect(),
            })
            .collect()
    }
}
