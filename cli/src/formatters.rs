use std::io::{self, Write};

use serde::Serialize;
use sportcal_core::{
    reference::ReferenceEntry, store::Editing, ComposedFilter, Filter, FilterKind,
    ReferenceDirectory, SportEvent,
};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::args::OutputFormat;

const DATE_FORMAT: &str = "%d.%m.%Y";

/// Renders command results as pretty (colored), plain (tab separated) or JSON output
pub struct Printer<W> {
    format: OutputFormat,
    out: W,
}

impl Printer<StandardStream> {
    pub fn stdout(format: OutputFormat) -> Self {
        let choice = match format {
            OutputFormat::Pretty => ColorChoice::Auto,
            OutputFormat::Plain | OutputFormat::Json => ColorChoice::Never,
        };
        Printer::new(format, StandardStream::stdout(choice))
    }
}

impl<W: WriteColor> Printer<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Printer { format, out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        writeln!(self.out, "{}", json)
    }

    fn colored(&mut self, color: Color, bold: bool, text: &str) -> io::Result<()> {
        self.out
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
        write!(self.out, "{}", text)?;
        self.out.reset()
    }

    /// Summary of what a search ran with. Not printed for JSON output.
    pub fn print_active(&mut self, editing: &Editing, filters: &[Filter]) -> io::Result<()> {
        if self.format != OutputFormat::Pretty {
            return Ok(());
        }

        let name = match editing.id {
            Some(id) => format!("{} (#{})", editing.name, id),
            None => editing.name.clone(),
        };
        self.colored(Color::Cyan, true, &name)?;

        let chips: Vec<String> = filters.iter().map(Filter::display_text).collect();
        if chips.is_empty() {
            writeln!(self.out, ": no filters")?;
        } else {
            writeln!(self.out, ": {}", chips.join(" · "))?;
        }
        writeln!(self.out)
    }

    pub fn print_events(&mut self, events: &[SportEvent]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.json(events),
            OutputFormat::Plain => {
                for event in events {
                    writeln!(
                        self.out,
                        "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                        event.id,
                        event.date_from,
                        event.date_to,
                        event.sport_name,
                        event.event_name,
                        event.location,
                        event.member_count
                    )?;
                }
                Ok(())
            }
            OutputFormat::Pretty => {
                if events.is_empty() {
                    return writeln!(self.out, "No events found");
                }
                for event in events {
                    self.print_event(event)?;
                }
                Ok(())
            }
        }
    }

    fn print_event(&mut self, event: &SportEvent) -> io::Result<()> {
        self.colored(Color::Yellow, false, &format!("#{:<6}", event.id))?;
        self.colored(Color::White, true, &event.sport_name)?;
        writeln!(self.out, " · {}", event.event_name)?;

        let dates = if event.date_from == event.date_to {
            event.date_from.format(DATE_FORMAT).to_string()
        } else {
            format!(
                "{}-{}",
                event.date_from.format(DATE_FORMAT),
                event.date_to.format(DATE_FORMAT)
            )
        };
        writeln!(
            self.out,
            "        {} · {} · {} участников",
            dates, event.location, event.member_count
        )?;

        if let Some(team) = &event.team_name {
            writeln!(self.out, "        {}", team)?;
        }
        if !event.disciplines.is_empty() {
            writeln!(self.out, "        {}", event.disciplines.join(", "))?;
        }
        Ok(())
    }

    pub fn print_presets(
        &mut self,
        presets: &[ComposedFilter],
        default_id: Option<i64>,
    ) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.json(presets),
            OutputFormat::Plain => {
                for preset in presets {
                    let marker = if preset.id.is_some() && preset.id == default_id {
                        "*"
                    } else {
                        ""
                    };
                    writeln!(
                        self.out,
                        "{}\t{}\t{}\t{}",
                        preset.id.map(|id| id.to_string()).unwrap_or_default(),
                        preset.name,
                        preset.filters.len(),
                        marker
                    )?;
                }
                Ok(())
            }
            OutputFormat::Pretty => {
                if presets.is_empty() {
                    return writeln!(self.out, "No saved presets");
                }
                for preset in presets {
                    let is_default = preset.id.is_some() && preset.id == default_id;
                    let id = preset.id.map(|id| format!("#{}", id)).unwrap_or_default();

                    self.colored(Color::Yellow, false, &format!("{:<7}", id))?;
                    self.colored(Color::White, true, &preset.name)?;
                    if is_default {
                        self.colored(Color::Green, false, " (default)")?;
                    }
                    writeln!(self.out, "  {} filters", preset.filters.len())?;
                }
                Ok(())
            }
        }
    }

    pub fn print_preset(&mut self, preset: &ComposedFilter) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.json(preset),
            OutputFormat::Plain | OutputFormat::Pretty => {
                if self.format == OutputFormat::Pretty {
                    self.colored(Color::White, true, &preset.name)?;
                    writeln!(self.out)?;
                }
                self.print_filters(&preset.filters)
            }
        }
    }

    /// One line per filter: kind, id and label
    pub fn print_filters(&mut self, filters: &[Filter]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.json(filters),
            OutputFormat::Plain => {
                for filter in filters {
                    writeln!(
                        self.out,
                        "{}\t{}\t{}",
                        filter.kind(),
                        filter.identity().map(|id| id.to_string()).unwrap_or_default(),
                        filter.display_text()
                    )?;
                }
                Ok(())
            }
            OutputFormat::Pretty => {
                for filter in filters {
                    self.colored(Color::Cyan, false, &format!("{:<11}", filter.kind().slug()))?;
                    match filter.identity() {
                        Some(id) => writeln!(self.out, "{:<6} {}", id, filter.display_text())?,
                        None => writeln!(self.out, "{:<6} {}", "", filter.display_text())?,
                    }
                }
                Ok(())
            }
        }
    }

    pub fn print_directory(
        &mut self,
        directory: &ReferenceDirectory,
        only: Option<FilterKind>,
    ) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return match only {
                Some(kind) => self.json(directory.entries(kind)),
                None => self.json(directory),
            };
        }

        let kinds: Vec<FilterKind> = match only {
            Some(kind) => vec![kind],
            None => FilterKind::ALL
                .into_iter()
                .filter(|k| k.is_reference() && *k != FilterKind::DisciplineInfo)
                .collect(),
        };

        for kind in kinds {
            if kind == FilterKind::ProgramInfo {
                self.print_program_tree(directory)?;
                continue;
            }
            self.print_section(kind, directory.entries(kind), 0)?;
        }
        Ok(())
    }

    fn print_program_tree(&mut self, directory: &ReferenceDirectory) -> io::Result<()> {
        self.section_header(FilterKind::ProgramInfo)?;
        for node in directory.program_tree() {
            self.print_entry(FilterKind::ProgramInfo, node.program, 1)?;
            for discipline in node.disciplines {
                self.print_entry(FilterKind::DisciplineInfo, discipline, 2)?;
            }
        }
        Ok(())
    }

    fn print_section(
        &mut self,
        kind: FilterKind,
        entries: &[ReferenceEntry],
        depth: usize,
    ) -> io::Result<()> {
        self.section_header(kind)?;
        for entry in entries {
            self.print_entry(kind, entry, depth + 1)?;
        }
        Ok(())
    }

    fn section_header(&mut self, kind: FilterKind) -> io::Result<()> {
        if self.format == OutputFormat::Pretty {
            self.colored(Color::Cyan, true, kind.slug())?;
            writeln!(self.out)?;
        }
        Ok(())
    }

    fn print_entry(&mut self, kind: FilterKind, entry: &ReferenceEntry, depth: usize) -> io::Result<()> {
        match self.format {
            OutputFormat::Plain => writeln!(self.out, "{}\t{}\t{}", kind, entry.id, entry.name),
            _ => writeln!(
                self.out,
                "{}{:<6} {}",
                "  ".repeat(depth),
                entry.id,
                entry.name
            ),
        }
    }
}
