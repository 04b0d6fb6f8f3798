// Errors for the two ways an analysis can fail:
// the text does not parse, or the tree holds something the collectors cannot walk.

use crate::node::NodeKind;
use colored::*;
use std::cell::RefCell;
use std::fmt;
use strsim::jaro_winkler;
use thiserror::Error;

/// Keywords offered as "did you mean" suggestions.
const SUGGESTED_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "WITH", "RECURSIVE", "INSERT", "UPDATE", "DELETE", "UNION", "ALL",
    "AND", "OR", "AS", "JOIN", "LEFT", "RIGHT", "INNER", "OUTER", "ON", "GROUP", "ORDER", "BY",
    "HAVING", "LIMIT", "OFFSET",
];

/// Minimum Jaro-Winkler similarity for a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// Keeps the furthest position the parser failed at and every alternative
/// it tried there. Failures are recorded through `&self` so read-only
/// lookahead helpers can report too.
#[derive(Debug, Default)]
pub struct Backtrace {
    furthest: RefCell<Option<Failure>>,
}

#[derive(Debug)]
struct Failure {
    pos: usize,
    expected: Vec<String>,
    found: Option<String>,
}

impl Backtrace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `expected` was wanted at byte `pos`. Earlier positions
    /// are ignored, the same position adds an alternative.
    pub fn track_error(&self, pos: usize, expected: &str, found: Option<&str>) {
        let mut slot = self.furthest.borrow_mut();
        match slot.as_mut() {
            Some(failure) if pos < failure.pos => {}
            Some(failure) if pos == failure.pos => {
                if !failure.expected.iter().any(|e| e == expected) {
                    failure.expected.push(expected.to_string());
                }
            }
            _ => {
                *slot = Some(Failure {
                    pos,
                    expected: vec![expected.to_string()],
                    found: found.map(str::to_string),
                })
            }
        }
    }

    /// Build the error for the furthest failure seen so far.
    pub fn get_error(&self, input: &str) -> ParseError {
        let slot = self.furthest.borrow();
        let Some(failure) = slot.as_ref() else {
            return ParseError::at(input, 0, "Unexpected error");
        };

        let expected = match failure.expected.as_slice() {
            [only] => only.clone(),
            many => format!("one of: {}", many.join(", ")),
        };
        let message = match &failure.found {
            Some(found) => format!("Expected {}, found '{}'", expected, found),
            None => format!("Expected {}, reached end of input", expected),
        };

        let mut error = ParseError::at(input, failure.pos, message);
        error.suggestion = failure.found.as_deref().and_then(suggest_keyword);
        error
    }
}

/// A syntax error with position and a keyword suggestion when one is close.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub suggestion: Option<String>,
    /// The offending source line with a caret under the column.
    pub context: Option<String>,
}

impl ParseError {
    /// An error pointing at byte offset `pos` of `input`.
    pub fn at(input: &str, pos: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_and_column(input, pos);
        ParseError {
            message: message.into(),
            line,
            column,
            suggestion: None,
            context: caret_context(input, line, column),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let heading = format!("Parse error at line {}:{}", self.line, self.column);
        writeln!(f, "{}", heading.red().bold())?;
        writeln!(f, "  {}", self.message)?;

        if let Some(suggestion) = &self.suggestion {
            writeln!(f, "  {} {}", "Did you mean:".yellow(), suggestion.green())?;
        }
        if let Some(context) = &self.context {
            write!(f, "\n{}\n", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Why an analysis produced no result.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The query text could not be parsed into a statement tree.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// The tree holds a construct the collectors have no rule for.
    /// Skipping it would silently drop tables or columns, so the whole
    /// analysis is refused.
    #[error("unsupported SQL construct `{kind}` at recursion depth {depth}")]
    Unsupported { kind: NodeKind, depth: usize },
}

impl AnalyzeError {
    pub fn unsupported(kind: NodeKind, depth: usize) -> Self {
        AnalyzeError::Unsupported { kind, depth }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, AnalyzeError::Parse(_))
    }
}

/// The keyword `word` most likely misspells, if any is close enough.
pub(crate) fn suggest_keyword(word: &str) -> Option<String> {
    let word = word.to_uppercase();

    SUGGESTED_KEYWORDS
        .iter()
        .map(|&keyword| (keyword, jaro_winkler(&word, keyword)))
        .filter(|&(_, score)| score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(keyword, _)| keyword.to_string())
}

/// 1-based line and column (in characters) of byte offset `pos`.
fn line_and_column(input: &str, pos: usize) -> (usize, usize) {
    let before = input.get(..pos).unwrap_or(input);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rsplit('\n')
        .next()
        .map_or(0, |current| current.chars().count())
        + 1;
    (line, column)
}

fn caret_context(input: &str, line: usize, column: usize) -> Option<String> {
    let source = input.lines().nth(line.checked_sub(1)?)?;
    let gutter = line.to_string();

    Some(format!(
        "  {} | {}\n  {} | {}{}",
        gutter,
        source,
        " ".repeat(gutter.len()),
        " ".repeat(column - 1),
        "^".red()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_failure_replaces_earlier_one() {
        let backtrace = Backtrace::new();
        let input = "SELECT * FORM users";

        backtrace.track_error(9, "FROM", Some("FORM"));
        backtrace.track_error(0, "INSERT", Some("SELECT"));

        let error = backtrace.get_error(input);
        assert_eq!(error.message, "Expected FROM, found 'FORM'");
        assert_eq!(error.suggestion.as_deref(), Some("FROM"));
        assert_eq!((error.line, error.column), (1, 10));
    }

    #[test]
    fn same_position_merges_alternatives_once() {
        let backtrace = Backtrace::new();

        backtrace.track_error(0, "SELECT", Some("FOO"));
        backtrace.track_error(0, "INSERT", Some("FOO"));
        backtrace.track_error(0, "SELECT", Some("FOO"));

        let error = backtrace.get_error("FOO");
        assert_eq!(error.message, "Expected one of: SELECT, INSERT, found 'FOO'");
        assert_eq!(error.suggestion, None);
    }

    #[test]
    fn end_of_input_failure() {
        let backtrace = Backtrace::new();
        backtrace.track_error(6, "expression", None);

        let error = backtrace.get_error("SELECT");
        assert_eq!(error.message, "Expected expression, reached end of input");
        assert_eq!(error.column, 7);
    }

    #[test]
    fn position_counts_lines_and_characters() {
        let input = "SELECT a,\n  café FROM t WHEER x = 1";
        let pos = input.find("WHEER").unwrap();
        let error = ParseError::at(input, pos, "bad");

        assert_eq!(error.line, 2);
        // "  café FROM t " is 14 characters, though 15 bytes
        assert_eq!(error.column, 15);
        let context = error.context.unwrap();
        assert!(context.starts_with("  2 |   café FROM t WHEER x = 1\n"));
    }

    #[test]
    fn suggestions_need_a_close_keyword() {
        assert_eq!(suggest_keyword("SELCT").as_deref(), Some("SELECT"));
        assert_eq!(suggest_keyword("form").as_deref(), Some("FROM"));
        assert_eq!(suggest_keyword("WHEER").as_deref(), Some("WHERE"));
        assert_eq!(suggest_keyword("xyz"), None);
    }

    #[test]
    fn unsupported_message_names_kind_and_depth() {
        let err = AnalyzeError::unsupported(NodeKind::Subquery, 3);
        assert_eq!(
            err.to_string(),
            "unsupported SQL construct `Subquery` at recursion depth 3"
        );
        assert!(!err.is_parse());
    }
}
