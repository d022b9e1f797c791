// ABOUTME: Error types for parse failures and runtime evaluation failures

use thiserror::Error;

/// A single accumulated parser diagnostic. The parser collects one or more
/// of these per statement rather than stopping at the first failure.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("[Ln {line}:{column}] {message}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        ParseError {
            line,
            column,
            message: message.into(),
        }
    }
}

/// A runtime error value. Carries everything spec.md's diagnostic format
/// needs to render a `[Ln L:C] Runtime::Error -> <message>` line plus a
/// source snippet and optional hint.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("[Ln {line}:{column}] Runtime::Error -> {message}")]
pub struct RuntimeError {
    pub line: u32,
    pub column: u32,
    pub message: String,
    pub hint: Option<String>,
    pub node_repr: String,
}

impl RuntimeError {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        RuntimeError {
            line,
            column,
            message: message.into(),
            hint: None,
            node_repr: String::new(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_node(mut self, node_repr: impl Into<String>) -> Self {
        self.node_repr = node_repr.into();
        self
    }

    /// The full diagnostic: the one-line summary, a two-line source
    /// snippet (offending line, then a caret under the column), and an
    /// optional `Hint:` line. `source` is the whole program text.
    pub fn render(&self, source: &str) -> String {
        let mut out = self.to_string();
        if let Some(line_text) = source.lines().nth(self.line.saturating_sub(1) as usize) {
            out.push('\n');
            out.push_str(line_text);
            out.push('\n');
            let col = self.column.saturating_sub(1) as usize;
            out.push_str(&" ".repeat(col));
            out.push('^');
        }
        if let Some(hint) = &self.hint {
            out.push_str(&format!("\nHint: {}", hint));
        }
        out
    }
}
