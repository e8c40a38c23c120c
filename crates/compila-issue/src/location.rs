/// A position in some source text.
///
/// `position` is the byte offset from the start of the unit; `line`/`column`
/// are 1-based. Along any single linear scan of one source, `position` is
/// monotonically non-decreasing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub line: u32,
    pub column: u32,
    pub position: u32,
    /// The file or logical origin this location belongs to, if known.
    pub unit: Option<String>,
}

impl Location {
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            position: 0,
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Advance this location past `text`, updating line/column by counting
    /// newlines within it (column resets to the length of the final segment
    /// after the last newline).
    pub fn advance(&self, text: &str) -> Self {
        let mut line = self.line;
        let mut column = self.column;
        for c in text.chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self {
            line,
            column,
            position: self.position + text.len() as u32,
            unit: self.unit.clone(),
        }
    }
}
