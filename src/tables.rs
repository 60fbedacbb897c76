use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::core::{
    reading::Reading,
    synchronizer::{Outcome, Report},
    window::Target,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

/// Readings in chronological order, with the difference from the previous one.
pub fn build_readings_table(readings: &[Reading]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Date", "Reading", "Delta"]);
    let mut previous: Option<Reading> = None;
    for reading in readings.iter().copied().sorted_by_key(|reading| reading.date) {
        let delta_cell = match previous {
            Some(previous) => {
                #[allow(clippy::cast_possible_wrap)]
                let delta = reading.value as i64 - previous.value as i64;
                Cell::new(delta).set_alignment(CellAlignment::Right).fg(if delta < 0 {
                    Color::Red
                } else {
                    Color::Reset
                })
            }
            None => Cell::new("").add_attribute(Attribute::Dim),
        };
        table.add_row(vec![
            Cell::new(reading.date),
            Cell::new(reading.value).set_alignment(CellAlignment::Right),
            delta_cell,
        ]);
        previous = Some(reading);
    }
    table
}

pub fn build_report_table(report: &Report) -> Table {
    let mut table = new_table();
    table.set_header(vec!["", "Date", "Reading"]);
    table.add_row(vec![
        Cell::new("Anchor"),
        Cell::new(report.history.earliest_eligible.date),
        Cell::new(report.history.earliest_eligible.value).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Latest"),
        Cell::new(report.history.latest.date),
        Cell::new(report.history.latest.value).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new(match report.target {
            Target::OneMonthAfter(_) => "Target (catch-up)",
            Target::Today(_) => "Target (today)",
        }),
        Cell::new(report.target.date()),
        Cell::new(""),
    ]);
    if let Some(consumption) = report.consumption {
        table.add_row(vec![
            Cell::new("Consumption"),
            Cell::new("").add_attribute(Attribute::Dim),
            Cell::new(format!("{consumption:.3}")).set_alignment(CellAlignment::Right),
        ]);
    }
    let (label, color, value) = match report.outcome {
        Outcome::Submitted(reading) => ("Submitted", Color::Green, Some(reading)),
        Outcome::DryRun(reading) => ("Dry run", Color::DarkYellow, Some(reading)),
        Outcome::UpToDate => ("Up to date", Color::Reset, None),
    };
    table.add_row(vec![
        Cell::new(label).fg(color),
        Cell::new(value.map(|reading| reading.date.to_string()).unwrap_or_default()),
        Cell::new(value.map(|reading| reading.value.to_string()).unwrap_or_default())
            .set_alignment(CellAlignment::Right)
            .fg(color),
    ]);
    table
}
