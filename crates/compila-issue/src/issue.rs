use std::fmt;

use owo_colors::OwoColorize;

use crate::location::Location;

/// Severity of a reported `Issue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Error = 0,
    Warning = 1,
    Note = 2,
    Debug = 5,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
            Level::Debug => "debug",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.tag();
        match self {
            Level::Error => write!(f, "{}", tag.red().bold()),
            Level::Warning => write!(f, "{}", tag.yellow().bold()),
            Level::Note => write!(f, "{}", tag.cyan().bold()),
            Level::Debug => write!(f, "{}", tag.dimmed()),
        }
    }
}

/// A single diagnostic record produced anywhere in the toolkit.
///
/// `stack` carries an optional chain of causes, innermost first, the way a
/// preprocessor `#include` failure wants to report every file on the include
/// stack that led to it.
#[derive(Debug, Clone)]
pub struct Issue {
    pub location: Option<Location>,
    pub source: Option<String>,
    pub message: Option<String>,
    pub level: Level,
    pub stack: Option<Vec<Issue>>,
}

impl Issue {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            location: None,
            source: None,
            message: Some(message.into()),
            level,
            stack: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn note(message: impl Into<String>) -> Self {
        Self::new(Level::Note, message)
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn caused_by(mut self, stack: Vec<Issue>) -> Self {
        self.stack = Some(stack);
        self
    }
}

/// Width of the excerpt window used when formatting an issue whose source
/// line is longer than 80 columns.
const EXCERPT_WIDTH: usize = 80;

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => {
                let unit = loc.unit.as_deref().unwrap_or("<unknown>");
                writeln!(
                    f,
                    "{}:{}:{}: {}: {}",
                    unit,
                    loc.line,
                    loc.column,
                    self.level,
                    self.message.as_deref().unwrap_or("")
                )?;
                if let Some(source) = &self.source {
                    if let Some(line_text) = source.lines().nth(loc.line.saturating_sub(1) as usize)
                    {
                        let (excerpt, caret_col) = window(line_text, loc.column as usize);
                        writeln!(f, "{excerpt}")?;
                        writeln!(f, "{}{}", " ".repeat(caret_col.saturating_sub(1)), "^")?;
                    }
                }
            }
            None => {
                writeln!(
                    f,
                    "{}: {}",
                    self.level,
                    self.message.as_deref().unwrap_or("")
                )?;
            }
        }
        if let Some(stack) = &self.stack {
            for cause in stack {
                write!(f, "{cause}")?;
            }
        }
        Ok(())
    }
}

/// Window `line` to `EXCERPT_WIDTH` columns centered on `column` when it is
/// longer than that; returns the excerpt and the column within the excerpt
/// that the caret should point at. Operates on chars so multi-byte UTF-8
/// never falls on a slice boundary.
fn window(line: &str, column: usize) -> (std::borrow::Cow<'_, str>, usize) {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() <= EXCERPT_WIDTH {
        return (std::borrow::Cow::Borrowed(line), column);
    }
    let half = EXCERPT_WIDTH / 2;
    let center = column.saturating_sub(1).min(chars.len());
    let start = center.saturating_sub(half);
    let end = (start + EXCERPT_WIDTH).min(chars.len());
    let start = end.saturating_sub(EXCERPT_WIDTH);
    let excerpt: String = chars[start..end].iter().collect();
    (std::borrow::Cow::Owned(excerpt), column - start)
}
