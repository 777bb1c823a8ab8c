//! Documentation text handling.
//!
//! Commands and modules carry free-form documentation. The first line becomes
//! the one-line help shown in command listings, the whole cleaned text becomes
//! the long description.

/// Help line and description derived from a documentation string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocText {
    /// First line of the cleaned text.
    pub help: String,
    /// Full cleaned text.
    pub description: String,
}

impl DocText {
    /// Cleans `doc` and splits off the help line.
    ///
    /// Returns `None` when there is no documentation or it is blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use skal_core::DocText;
    ///
    /// let doc = DocText::parse(Some("main help string\n\n    more help here\n    ")).unwrap();
    /// assert_eq!(doc.help, "main help string");
    /// assert_eq!(doc.description, "main help string\n\nmore help here");
    ///
    /// assert!(DocText::parse(Some("   \n")).is_none());
    /// assert!(DocText::parse(None).is_none());
    /// ```
    pub fn parse(doc: Option<&str>) -> Option<Self> {
        let description = clean_doc(doc?);
        if description.is_empty() {
            return None;
        }
        let help = description.lines().next().unwrap_or_default().to_string();
        Some(Self { help, description })
    }
}

/// Normalizes indentation of a documentation string.
///
/// Tabs are expanded, leading whitespace of the first line is removed, the
/// common indentation of the remaining lines is removed, and blank lines at
/// either end are dropped.
///
/// # Examples
///
/// ```
/// use skal_core::clean_doc;
///
/// let raw = "first command\n\n        Longer text\n          indented\n    ";
/// assert_eq!(clean_doc(raw), "first command\n\nLonger text\n  indented");
/// ```
pub fn clean_doc(doc: &str) -> String {
    let expanded: Vec<String> = doc.lines().map(expand_tabs).collect();

    let margin = expanded
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| indent_width(line))
        .min()
        .unwrap_or(0);

    let mut lines: Vec<&str> = Vec::with_capacity(expanded.len());
    for (i, line) in expanded.iter().enumerate() {
        if i == 0 {
            lines.push(line.trim_start());
        } else if line.trim().is_empty() {
            lines.push("");
        } else {
            lines.push(strip_indent(line, margin));
        }
    }

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let start = lines
        .iter()
        .position(|l| !l.trim().is_empty())
        .unwrap_or(lines.len());

    lines[start..]
        .iter()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn strip_indent(line: &str, width: usize) -> &str {
    let offset = line
        .char_indices()
        .take(width)
        .take_while(|(_, c)| c.is_whitespace())
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    &line[offset..]
}

fn expand_tabs(line: &str) -> String {
    const TAB_WIDTH: usize = 8;
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(ch);
            column += 1;
        }
    }
    out
}
