//! In-document occurrence search with context windows.
//!
//! The extracted text is split on `'\n'` and each line is tested with a
//! case-insensitive substring match. Every matching line yields one snippet:
//! the line plus up to `context_lines` lines on each side. Snippets are kept
//! in document order, are not merged when they overlap, and are capped at
//! `max_snippets`; [`Occurrences::total_count`] always reports every match.
//!
//! Matching is per line, so a term whose characters are split by a line
//! break in the extracted text is not found.

use serde::Serialize;

use crate::config::ToolsConfig;

/// Context window and snippet cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetWindow {
    pub context_lines: usize,
    pub max_snippets: usize,
}

impl Default for SnippetWindow {
    fn default() -> Self {
        Self {
            context_lines: 10,
            max_snippets: 5,
        }
    }
}

impl From<&ToolsConfig> for SnippetWindow {
    fn from(cfg: &ToolsConfig) -> Self {
        Self {
            context_lines: cfg.context_lines,
            max_snippets: cfg.max_snippets,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Occurrences {
    /// Number of matching lines, including those past the snippet cap.
    pub total_count: usize,
    /// First `max_snippets` context windows, in line order.
    pub snippets: Vec<String>,
}

impl Occurrences {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    pub fn is_truncated(&self) -> bool {
        self.total_count > self.snippets.len()
    }
}

/// Find every line of `text` containing `term`, ignoring case.
pub fn find_occurrences(text: &str, term: &str, window: &SnippetWindow) -> Occurrences {
    let needle = term.to_lowercase();
    let lines: Vec<&str> = text.split('\n').collect();

    let mut result = Occurrences::default();
    for (index, line) in lines.iter().enumerate() {
        if !line.to_lowercase().contains(&needle) {
            continue;
        }
        result.total_count += 1;
        if result.snippets.len() < window.max_snippets {
            let (start, end) = context_bounds(index, lines.len(), window.context_lines);
            result.snippets.push(lines[start..end].join("\n"));
        }
    }
    result
}

/// Half-open line range `[max(0, i - ctx), min(len, i + ctx + 1))`.
fn context_bounds(index: usize, len: usize, context_lines: usize) -> (usize, usize) {
    let start = index.saturating_sub(context_lines);
    let end = len.min(index + context_lines + 1);
    (start, end)
}
