use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use sportcal_core::FilterKind;

use crate::utils::date_target::DateTarget;

#[derive(Parser, Debug)]
#[command(
    name = "sportcal",
    version,
    about,
    long_about = "Browse the regional sports calendar from the command line"
)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Args, Serialize)]
pub struct ConfigArgs {
    /// Profile name
    #[arg(long, short, global = true, env = "SPORTCAL_PROFILE")]
    pub profile: Option<String>,

    /// Path to the preferences database (overrides the profile)
    #[arg(long, global = true, env = "SPORTCAL_DB")]
    pub db_path: Option<String>,

    /// Base URL of the calendar API (overrides the profile)
    #[arg(long, global = true, env = "SPORTCAL_API_URL")]
    pub api_url: Option<String>,

    /// Base URL of the notification service (overrides the profile)
    #[arg(long, global = true, env = "SPORTCAL_NOTIFICATIONS_URL")]
    pub notifications_url: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prints out current configuration
    Config,
    /// Writes the current configuration into a new profile
    Init(InitArgs),
    /// Signs in, or creates an account with --register
    Login(LoginArgs),
    /// Continues without an account; presets can't be saved
    Guest,
    /// Forgets the stored session
    Logout,
    /// Saved filter combinations
    #[clap(subcommand)]
    Preset(PresetCommand),
    /// Searches events with the default preset and any filter flags
    Search(SearchArgs),
    /// Finds reference entities by name, e.g. `lookup sport футбол`
    Lookup(LookupArgs),
    /// Prints every selectable reference entity
    Directory(DirectoryArgs),
    /// Events marked with `search --star`
    #[clap(subcommand)]
    Favourites(FavouritesCommand),
    /// Turns event notifications on or off
    Notifications {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Generates shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Overwrite an existing profile
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    pub login: String,
    pub password: String,
    /// Create the account first
    #[arg(long)]
    pub register: bool,
}

#[derive(Debug, Subcommand)]
pub enum PresetCommand {
    /// Lists saved presets
    List(OutputArgs),
    /// Shows the filters of one preset
    Show {
        id: i64,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Saves the given filters as a new preset
    Create {
        name: String,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Changes a preset; filter flags apply on top of its current filters
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Deletes a preset
    Delete { id: i64 },
    /// Marks a preset as the default used by `search`
    Default {
        #[arg(required_unless_present = "clear")]
        id: Option<i64>,
        /// Clear the default instead
        #[arg(long, conflicts_with = "id")]
        clear: bool,
    },
    /// Replaces local presets with the ones stored on the server
    Sync,
}

#[derive(Debug, Subcommand)]
pub enum FavouritesCommand {
    List(OutputArgs),
    Remove { event_id: i64 },
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum Toggle {
    On,
    Off,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    #[default]
    Pretty,
    Plain,
    Json,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format (pretty, plain, or json)
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Start from this preset instead of the default one
    #[arg(long, value_name = "ID")]
    pub preset: Option<i64>,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Number of pages to load
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Save the resulting filters as a new preset
    #[arg(long, value_name = "NAME", conflicts_with = "save")]
    pub save_as: Option<String>,

    /// Save the resulting filters into the preset they came from
    #[arg(long)]
    pub save: bool,

    /// Add a found event to favourites (repeatable)
    #[arg(long, value_name = "EVENT_ID")]
    pub star: Vec<i64>,

    /// Output format (pretty, plain, or json)
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct LookupArgs {
    /// sport, sport-type, discipline, program, age, sex or team
    #[arg(value_parser = parse_reference_kind)]
    pub kind: FilterKind,
    /// Part of the name
    pub name: String,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct DirectoryArgs {
    /// Only this kind
    #[arg(long, value_parser = parse_reference_kind)]
    pub kind: Option<FilterKind>,
    #[command(flatten)]
    pub output: OutputArgs,
}

/// Flags that edit the active filter set
#[derive(Debug, Args, Default, Clone, PartialEq)]
pub struct FilterArgs {
    /// Date range shortcut (e.g., "today", "next week", "2024-06-01")
    #[arg(long, value_name = "DATE", value_parser = parse_date_target, conflicts_with_all = ["from", "to"])]
    pub date: Option<DateTarget>,

    /// Events ending on or after this day
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: Option<NaiveDate>,

    /// Events starting on or before this day
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub to: Option<NaiveDate>,

    /// Member count range, e.g. 10-50; an upper bound of 100 means "100 and more"
    #[arg(long, value_name = "MIN-MAX", value_parser = parse_member_range)]
    pub members: Option<MemberRange>,

    /// Sport (repeatable)
    #[arg(long, value_name = "ID[:NAME]", value_parser = parse_pick)]
    pub sport: Vec<Pick>,

    #[arg(long, value_name = "ID[:NAME]", value_parser = parse_pick)]
    pub sport_type: Vec<Pick>,

    #[arg(long, value_name = "ID[:NAME]", value_parser = parse_pick)]
    pub discipline: Vec<Pick>,

    #[arg(long, value_name = "ID[:NAME]", value_parser = parse_pick)]
    pub program: Vec<Pick>,

    #[arg(long, value_name = "ID[:NAME]", value_parser = parse_pick)]
    pub age: Vec<Pick>,

    #[arg(long, value_name = "ID[:NAME]", value_parser = parse_pick)]
    pub sex: Vec<Pick>,

    #[arg(long, value_name = "ID[:NAME]", value_parser = parse_pick)]
    pub team: Vec<Pick>,

    /// Remove filters of a kind, or one entity with KIND:ID (repeatable)
    #[arg(long, value_name = "KIND[:ID]", value_parser = parse_removal)]
    pub remove: Vec<Removal>,

    /// Drop every filter before applying the others
    #[arg(long)]
    pub clear: bool,
}

impl FilterArgs {
    /// Picks per reference kind, in a fixed order
    pub fn picks(&self) -> Vec<(FilterKind, &Pick)> {
        [
            (FilterKind::SportCategory, &self.sport),
            (FilterKind::SportTypeCategory, &self.sport_type),
            (FilterKind::DisciplineInfo, &self.discipline),
            (FilterKind::ProgramInfo, &self.program),
            (FilterKind::AgeCategory, &self.age),
            (FilterKind::SexCategory, &self.sex),
            (FilterKind::TeamInfo, &self.team),
        ]
        .into_iter()
        .flat_map(|(kind, picks)| picks.iter().map(move |pick| (kind, pick)))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberRange {
    pub start: u32,
    pub end: u32,
}

/// A reference entity named on the command line. The name is looked up when omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    pub kind: FilterKind,
    pub id: Option<i64>,
}

pub fn parse_date_target(s: &str) -> anyhow::Result<DateTarget> {
    s.parse()
}

pub fn parse_member_range(s: &str) -> anyhow::Result<MemberRange> {
    let (start, end) = s
        .split_once('-')
        .ok_or_else(|| anyhow::anyhow!("expected MIN-MAX, got '{}'", s))?;

    let start: u32 = start.trim().parse()?;
    let end: u32 = end.trim().trim_end_matches('+').parse()?;

    if start > end {
        anyhow::bail!("lower bound {} is above upper bound {}", start, end);
    }

    Ok(MemberRange { start, end })
}

pub fn parse_pick(s: &str) -> anyhow::Result<Pick> {
    let (id, name) = match s.split_once(':') {
        Some((id, name)) => (id, Some(name.trim().to_string())),
        None => (s, None),
    };

    Ok(Pick {
        id: id.trim().parse()?,
        name: name.filter(|n| !n.is_empty()),
    })
}

pub fn parse_removal(s: &str) -> anyhow::Result<Removal> {
    let (kind, id) = match s.split_once(':') {
        Some((kind, id)) => (kind, Some(id.trim().parse()?)),
        None => (s, None),
    };

    Ok(Removal {
        kind: kind.parse().map_err(anyhow::Error::msg)?,
        id,
    })
}

pub fn parse_reference_kind(s: &str) -> anyhow::Result<FilterKind> {
    let kind: FilterKind = s.parse().map_err(anyhow::Error::msg)?;
    if !kind.is_reference() {
        anyhow::bail!("'{}' is not looked up by name", s);
    }
    Ok(kind)
}
