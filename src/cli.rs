/*
 * Copyright (C) 2026 Mark Wells Dev
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! CLI utilities for terminal output formatting and colors.

use crossterm::tty::IsTty;
use std::io::stdout;

use crate::catalog::{Entity, EntityKind};

/// Configuration for color output
#[derive(Debug, Clone)]
pub struct ColorConfig {
    /// Whether ANSI colors are emitted
    pub enabled: bool,
}

impl ColorConfig {
    /// Create a new `ColorConfig`, auto-detecting TTY unless nocolor is true
    #[must_use]
    pub fn new(nocolor: bool) -> Self {
        Self {
            enabled: !nocolor && stdout().is_tty(),
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    /// Green (servers)
    #[must_use]
    pub fn green(&self, s: &str) -> String {
        self.paint("32", s)
    }

    /// Blue (clients)
    #[must_use]
    pub fn blue(&self, s: &str) -> String {
        self.paint("34", s)
    }

    /// Cyan (agents)
    #[must_use]
    pub fn cyan(&self, s: &str) -> String {
        self.paint("36", s)
    }

    /// Dim text (placeholders)
    #[must_use]
    pub fn dim(&self, s: &str) -> String {
        self.paint("2", s)
    }

    /// Kind label colored by kind.
    #[must_use]
    pub fn kind(&self, kind: EntityKind, s: &str) -> String {
        match kind {
            EntityKind::Server => self.green(s),
            EntityKind::Client => self.blue(s),
            EntityKind::Agent => self.cyan(s),
            EntityKind::Category => s.to_string(),
        }
    }
}

/// Get the terminal width, defaulting to 80 if unable to detect
#[must_use]
pub fn terminal_width() -> usize {
    crossterm::terminal::size()
        .map(|(w, _)| usize::from(w))
        .unwrap_or(80)
}

/// Truncate a string to `max_len` characters, adding "..." if truncated
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if max_len <= 3 {
        return ".".repeat(max_len.min(3));
    }
    match s.char_indices().nth(max_len - 3) {
        Some((cut, _)) if s.chars().count() > max_len => format!("{}...", &s[..cut]),
        _ => s.to_string(),
    }
}

/// Column width configuration for the list command
#[derive(Debug)]
pub struct ColumnWidths {
    /// Row number column
    pub row_num: usize,
    /// Kind column
    pub kind: usize,
    /// Id column
    pub id: usize,
    /// Name column
    pub name: usize,
    /// Category column (last, not padded)
    pub category: usize,
}

impl ColumnWidths {
    /// Calculate column widths based on terminal width
    /// Columns: # | KIND | ID | NAME | CATEGORY
    #[must_use]
    pub fn calculate(term_width: usize) -> Self {
        // Fixed widths
        let row_num = 4;
        let kind = 7; // "server", "client", "agent"

        // Reserve space for separators (4 spaces between columns)
        let fixed_space = row_num + kind + 4;
        let flexible_space = term_width.saturating_sub(fixed_space);

        let min_id = 20;
        let min_name = 20;
        let min_category = 16;
        let total_min_flex = min_id + min_name + min_category;

        if flexible_space <= total_min_flex {
            Self {
                row_num,
                kind,
                id: min_id,
                name: min_name,
                category: min_category,
            }
        } else {
            // Split extra space between id and name
            let extra = flexible_space - total_min_flex;
            Self {
                row_num,
                kind,
                id: min_id + extra / 2,
                name: min_name + extra - extra / 2,
                category: min_category,
            }
        }
    }

    /// Header line for the entity table.
    #[must_use]
    pub fn header(&self) -> String {
        format!(
            "{:>w_num$} {:<w_kind$} {:<w_id$} {:<w_name$} CATEGORY",
            "#",
            "KIND",
            "ID",
            "NAME",
            w_num = self.row_num,
            w_kind = self.kind,
            w_id = self.id,
            w_name = self.name,
        )
    }

    /// One table row. Placeholders are dimmed.
    #[must_use]
    pub fn row(&self, index: usize, entity: &Entity, colors: &ColorConfig) -> String {
        // Pad before coloring so escape codes don't count toward width
        let kind = format!("{:<w$}", entity.kind.as_str(), w = self.kind);
        let kind = colors.kind(entity.kind, &kind);
        let category = entity.category.as_deref().unwrap_or("-");

        let line = format!(
            "{:>w_num$} {kind} {:<w_id$} {:<w_name$} {}",
            index,
            truncate(&entity.id, self.id),
            truncate(&entity.name, self.name),
            truncate(category, self.category),
            w_num = self.row_num,
            w_id = self.id,
            w_name = self.name,
        );
        if entity.synthesized {
            colors.dim(&line)
        } else {
            line
        }
    }
}
