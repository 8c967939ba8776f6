// Output formatting utilities

use crate::board::ColumnView;
use crate::models::{Lead, Stage};
use crate::repo::short_id;
use crate::utils::format_brl;
use chrono::{Local, TimeZone};
use std::collections::HashMap;
use std::io::IsTerminal;

// ANSI escape codes for terminal formatting
const ANSI_BOLD: &str = "\x1b[1m";
const ANSI_RESET: &str = "\x1b[0m";

// ANSI foreground colors (standard 16-color palette)
const ANSI_FG_BLACK: &str = "\x1b[30m";
const ANSI_FG_RED: &str = "\x1b[31m";
const ANSI_FG_GREEN: &str = "\x1b[32m";
const ANSI_FG_YELLOW: &str = "\x1b[33m";
const ANSI_FG_BLUE: &str = "\x1b[34m";
const ANSI_FG_MAGENTA: &str = "\x1b[35m";
const ANSI_FG_CYAN: &str = "\x1b[36m";
const ANSI_FG_WHITE: &str = "\x1b[37m";
const ANSI_FG_BRIGHT_BLACK: &str = "\x1b[90m";
const ANSI_FG_BRIGHT_GREEN: &str = "\x1b[92m";
const ANSI_FG_BRIGHT_YELLOW: &str = "\x1b[93m";
const ANSI_FG_BRIGHT_BLUE: &str = "\x1b[94m";
const ANSI_FG_BRIGHT_MAGENTA: &str = "\x1b[95m";
const ANSI_FG_BRIGHT_CYAN: &str = "\x1b[96m";

/// Board columns never get narrower than this; below it the board is stacked
const MIN_COLUMN_WIDTH: usize = 18;
const MAX_COLUMN_WIDTH: usize = 32;
const COLUMN_GAP: &str = "  ";

/// Map a color name string to its ANSI foreground constant
fn color_name_to_fg(name: &str) -> Option<&'static str> {
    match name {
        "black" => Some(ANSI_FG_BLACK),
        "red" => Some(ANSI_FG_RED),
        "green" => Some(ANSI_FG_GREEN),
        "yellow" => Some(ANSI_FG_YELLOW),
        "blue" => Some(ANSI_FG_BLUE),
        "magenta" => Some(ANSI_FG_MAGENTA),
        "cyan" => Some(ANSI_FG_CYAN),
        "white" => Some(ANSI_FG_WHITE),
        "bright_black" => Some(ANSI_FG_BRIGHT_BLACK),
        "bright_red" => Some("\x1b[91m"),
        "bright_green" => Some(ANSI_FG_BRIGHT_GREEN),
        "bright_yellow" => Some(ANSI_FG_BRIGHT_YELLOW),
        "bright_blue" => Some(ANSI_FG_BRIGHT_BLUE),
        "bright_magenta" => Some(ANSI_FG_BRIGHT_MAGENTA),
        "bright_cyan" => Some(ANSI_FG_BRIGHT_CYAN),
        "bright_white" => Some("\x1b[97m"),
        _ => None,
    }
}

/// Foreground escape for a stage color tag: a color name or "#rrggbb"
pub fn stage_fg(color: &str) -> Option<String> {
    if let Some(code) = color_name_to_fg(color) {
        return Some(code.to_string());
    }
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
    Some(format!("\x1b[38;2;{};{};{}m", r, g, b))
}

/// Whether a stage color tag is understood
pub fn is_valid_color(color: &str) -> bool {
    stage_fg(color).is_some()
}

/// Check if stdout is a terminal (TTY)
pub fn is_tty() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width dynamically
///
/// Uses the `terminal_size` crate for reliable detection, with fallback to
/// COLUMNS environment variable and a sensible default.
pub fn get_terminal_width() -> usize {
    if let Some((terminal_size::Width(w), _)) = terminal_size::terminal_size() {
        if w > 0 {
            return w as usize;
        }
    }

    if let Ok(cols) = std::env::var("COLUMNS") {
        if let Ok(width) = cols.parse::<usize>() {
            if width > 0 && width < 10000 {
                return width;
            }
        }
    }

    120
}

fn paint(text: &str, code: Option<&str>, use_color: bool) -> String {
    match code {
        Some(code) if use_color => format!("{}{}{}", code, text, ANSI_RESET),
        _ => text.to_string(),
    }
}

/// Truncate to `width` characters (with an ellipsis) and pad with spaces
fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len > width {
        let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    } else {
        format!("{}{}", text, " ".repeat(width - len))
    }
}

/// Format timestamp for display
pub fn format_timestamp(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => ts.to_string(),
    }
}

/// Format date for display (date only, no time)
pub fn format_date(ts: i64) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => ts.to_string(),
    }
}

/// One rendered board line: padded text plus the escape used to paint it
type BoardLine = (String, Option<String>);

fn column_lines(column: &ColumnView, width: usize) -> Vec<BoardLine> {
    let header_code = column
        .stage
        .color
        .as_deref()
        .and_then(stage_fg)
        .map(|fg| format!("{}{}", ANSI_BOLD, fg))
        .unwrap_or_else(|| ANSI_BOLD.to_string());

    let marker = if column.is_over { "▶ " } else { "" };
    let mut lines: Vec<BoardLine> = vec![
        (
            fit(&format!("{}{} ({})", marker, column.stage.name.to_uppercase(), column.count), width),
            Some(header_code),
        ),
        ("─".repeat(width), Some(ANSI_FG_BRIGHT_BLACK.to_string())),
    ];

    if column.is_empty() {
        lines.push((fit("  Vazio", width), Some(ANSI_FG_BRIGHT_BLACK.to_string())));
        return lines;
    }

    for card in &column.cards {
        let grip = if card.is_dragging { "» " } else { "• " };
        lines.push((fit(&format!("{}{}", grip, card.lead.name), width), Some(ANSI_BOLD.to_string())));
        lines.push((fit(&format!("  {}", card.phone_label), width), None));
        if let Some(value) = &card.value_label {
            lines.push((fit(&format!("  {}", value), width), Some(ANSI_FG_GREEN.to_string())));
        }
    }
    lines
}

/// Render the board: columns side by side when they fit, stacked otherwise
pub fn format_board(columns: &[ColumnView], terminal_width: usize, use_color: bool) -> String {
    if columns.is_empty() {
        return "No stages.\n".to_string();
    }

    let n = columns.len();
    let gaps = COLUMN_GAP.len() * (n - 1);
    let available = terminal_width.saturating_sub(gaps) / n;
    let mut output = String::new();

    if available < MIN_COLUMN_WIDTH && n > 1 {
        // Stacked layout
        let width = terminal_width.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH * 2);
        for (idx, column) in columns.iter().enumerate() {
            if idx > 0 {
                output.push('\n');
            }
            for (text, code) in column_lines(column, width) {
                output.push_str(paint(text.trim_end(), code.as_deref(), use_color).as_str());
                output.push('\n');
            }
        }
        return output;
    }

    let width = available.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
    let rendered: Vec<Vec<BoardLine>> = columns.iter().map(|c| column_lines(c, width)).collect();
    let height = rendered.iter().map(Vec::len).max().unwrap_or(0);
    let blank = " ".repeat(width);

    for row in 0..height {
        let mut line = String::new();
        for (idx, lines) in rendered.iter().enumerate() {
            if idx > 0 {
                line.push_str(COLUMN_GAP);
            }
            match lines.get(row) {
                Some((text, code)) => line.push_str(&paint(text, code.as_deref(), use_color)),
                None => line.push_str(&blank),
            }
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }
    output
}

/// Lead listing table
pub fn format_lead_table(leads: &[Lead], stages: &[Stage]) -> String {
    if leads.is_empty() {
        return "No leads.\n".to_string();
    }

    let stage_names: HashMap<&str, &str> = stages.iter().map(|s| (s.id.as_str(), s.name.as_str())).collect();
    let rows: Vec<[String; 6]> = leads
        .iter()
        .map(|lead| {
            [
                short_id(&lead.id).to_string(),
                lead.name.clone(),
                match &lead.stage_id {
                    Some(id) => stage_names.get(id.as_str()).map(|s| s.to_string()).unwrap_or_else(|| "?".to_string()),
                    None => "-".to_string(),
                },
                lead.phone.clone().unwrap_or_default(),
                lead.interest_value.map(format_brl).unwrap_or_default(),
                format_date(lead.created_ts),
            ]
        })
        .collect();

    format_table(["ID", "Name", "Stage", "Phone", "Value", "Created"], &rows)
}

/// Stage listing table with lead counts
pub fn format_stage_table(stages: &[Stage], lead_counts: &HashMap<String, usize>) -> String {
    if stages.is_empty() {
        return "No stages.\n".to_string();
    }

    let rows: Vec<[String; 5]> = stages
        .iter()
        .map(|stage| {
            [
                stage.position.to_string(),
                stage.name.clone(),
                stage.color.clone().unwrap_or_default(),
                lead_counts.get(&stage.id).copied().unwrap_or(0).to_string(),
                short_id(&stage.id).to_string(),
            ]
        })
        .collect();

    format_table(["Pos", "Name", "Color", "Leads", "ID"], &rows)
}

fn format_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(|h| h.chars().count());
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(cell.chars().count());
        }
    }

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut output = table_row(&headers, &widths);
    output.push_str(&table_row(&rule[..], &widths));
    for row in rows {
        output.push_str(&table_row(row, &widths));
    }
    output
}

fn table_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| fit(cell.as_ref(), *width))
        .collect();
    format!("{}\n", line.join(" ").trim_end())
}

/// Detailed view of one lead
pub fn format_lead_details(lead: &Lead, stage: Option<&Stage>) -> String {
    let mut output = String::new();

    let header = format!("Lead {}: {}", short_id(&lead.id), lead.name);
    output.push_str(&header);
    output.push('\n');
    output.push_str(&"=".repeat(header.chars().count().max(40)));
    output.push_str("\n\n");

    let none = || "(none)".to_string();
    let stage_label = match (&lead.stage_id, stage) {
        (None, _) => "(unassigned)".to_string(),
        (Some(_), Some(stage)) => stage.name.clone(),
        (Some(id), None) => format!("[{}]", id),
    };

    output.push_str(&format!("  ID:          {}\n", lead.id));
    output.push_str(&format!("  Stage:       {}\n", stage_label));
    output.push_str(&format!("  Phone:       {}\n", lead.phone.clone().unwrap_or_else(none)));
    output.push_str(&format!("  Email:       {}\n", lead.email.clone().unwrap_or_else(none)));
    output.push_str(&format!(
        "  Value:       {}\n",
        lead.interest_value.map(format_brl).unwrap_or_else(none)
    ));
    output.push_str(&format!("  Source:      {}\n", lead.source.clone().unwrap_or_else(none)));
    output.push_str(&format!("  Created:     {}\n", format_timestamp(lead.created_ts)));
    output.push_str(&format!("  Modified:    {}\n", format_timestamp(lead.modified_ts)));

    if let Some(notes) = lead.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        output.push_str("\nNotes:\n");
        for line in notes.lines() {
            output.push_str(&format!("  {}\n", line));
        }
    }

    output
}
