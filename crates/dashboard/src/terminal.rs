//! Text rendering of the dashboard for the `watch` and `list` commands.

use std::io::{self, Write};

use colored::{ColoredString, Colorize};
use crossterm::{QueueableCommand, cursor, style, terminal};
use tabled::{builder::Builder, settings::Style};
use tracing::warn;

use application::monitor::ViewSink;
use application::view::{DashboardView, DeviceListItem, HistoryRow, StatusCard};
use domain::status::StatusLevel;

/// Redraws the whole dashboard on stdout on every applied tick
pub struct TerminalSink {
    clear_screen: bool,
}

impl TerminalSink {
    pub fn new(clear_screen: bool) -> Self {
        Self { clear_screen }
    }

    fn redraw(&self, view: &DashboardView) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        if self.clear_screen {
            stdout.queue(cursor::MoveTo(0, 0))?;
            stdout.queue(terminal::Clear(terminal::ClearType::All))?;
        }
        stdout.queue(style::Print(render_dashboard(view)))?;
        stdout.flush()
    }
}

impl ViewSink for TerminalSink {
    fn present(&self, view: &DashboardView) {
        if let Err(e) = self.redraw(view) {
            warn!(seq = view.seq, error = %e, "Failed to draw dashboard");
        }
    }
}

fn colored_label(level: StatusLevel, label: &str) -> ColoredString {
    match level {
        StatusLevel::Alert => label.red().bold(),
        StatusLevel::Normal => label.green(),
        StatusLevel::Unknown => label.yellow(),
    }
}

pub fn cards_table(cards: &[StatusCard]) -> String {
    if cards.is_empty() {
        return "No devices found".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(vec!["Location", "Kind", "State", "Updated"]);
    for card in cards {
        builder.push_record(vec![
            card.title.clone(),
            card.kind.clone(),
            colored_label(card.level, &card.label).to_string(),
            card.updated_at.clone(),
        ]);
    }

    builder.build().with(Style::modern()).to_string()
}

pub fn history_table(rows: &[HistoryRow]) -> String {
    if rows.is_empty() {
        return "No history yet".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(vec!["", "Location", "Kind", "State", "Time", "IP"]);
    for row in rows {
        builder.push_record(vec![
            if row.highlighted { ">" } else { "" }.to_string(),
            row.location.clone(),
            row.kind.clone(),
            colored_label(row.level, &row.label).to_string(),
            row.time.clone(),
            row.ip.clone(),
        ]);
    }

    builder.build().with(Style::modern()).to_string()
}

pub fn render_dashboard(view: &DashboardView) -> String {
    format!(
        "{}\n\n{}\n\n{}\n{}\n",
        format!("Fleet status (tick {}, {} records)", view.seq, view.records).bold(),
        cards_table(&view.cards),
        "Recent history".bold(),
        history_table(&view.history),
    )
}

pub fn render_device_list(items: &[DeviceListItem]) -> String {
    if items.is_empty() {
        return "No devices registered".to_string();
    }

    let mut builder = Builder::default();
    builder.push_record(vec!["ID", "Name", "Kind and location"]);
    for item in items {
        builder.push_record(vec![
            item.id.clone().unwrap_or_else(|| "-".dimmed().to_string()),
            item.title.clone(),
            item.subtitle.clone(),
        ]);
    }

    builder.build().with(Style::modern()).to_string()
}
