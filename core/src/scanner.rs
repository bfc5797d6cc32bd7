//! Locates directive lines in query script text.
//!
//! A directive is a line whose trimmed content starts with
//! [`DIRECTIVE_MARKER`] followed by whitespace or end of line. Every other
//! line is query body and is ignored.

/// Literal that opens a directive line.
pub const DIRECTIVE_MARKER: &str = "#pl:set";

/// A whitespace-delimited token inside a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token text, never empty and never containing whitespace.
    pub text: &'a str,
    /// 1-based character column of the token within its source line.
    pub column: usize,
}

/// One directive line found in a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    /// 1-based line number within the script.
    pub line: usize,
    /// Original line content, without the line terminator.
    pub source: &'a str,
    /// Tokens following the marker, in source order.
    pub tokens: Vec<Token<'a>>,
}

/// Returns every directive line in `text`, in source order.
///
/// # Examples
///
/// ```
/// use query_flags_core::scan_directives;
///
/// let script = "#pl:set analyze=true\nt1 = dataframe(table='http_events')\n";
/// let directives = scan_directives(script);
/// assert_eq!(directives.len(), 1);
/// assert_eq!(directives[0].line, 1);
/// assert_eq!(directives[0].tokens[0].text, "analyze=true");
/// ```
pub fn scan_directives(text: &str) -> Vec<Directive<'_>> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| scan_line(idx + 1, line))
        .collect()
}

fn scan_line(line_no: usize, line: &str) -> Option<Directive<'_>> {
    let indent = line.len() - line.trim_start().len();
    let rest = line[indent..].strip_prefix(DIRECTIVE_MARKER)?;
    if rest.chars().next().is_some_and(|ch| !ch.is_whitespace()) {
        return None;
    }

    let body_start = indent + DIRECTIVE_MARKER.len();
    Some(Directive {
        line: line_no,
        source: line,
        tokens: split_tokens(line, body_start),
    })
}

fn split_tokens(line: &str, body_start: usize) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (idx, ch) in line[body_start..].char_indices() {
        let idx = body_start + idx;
        match (ch.is_whitespace(), start) {
            (true, Some(begin)) => {
                tokens.push(token_at(line, begin, idx));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(begin) = start {
        tokens.push(token_at(line, begin, line.len()));
    }

    tokens
}

fn token_at(line: &str, begin: usize, end: usize) -> Token<'_> {
    Token {
        text: &line[begin..end],
        column: line[..begin].chars().count() + 1,
    }
}
