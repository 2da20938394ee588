//! Word-pair line parser: `source - target1; target2; ...`

use std::collections::BTreeSet;

use crate::error::{MalformedLine, MalformedReason};
use crate::model::normalize;

/// Characters accepted as the pair separator. Word processors tend to turn
/// ` - ` into an en or em dash.
const SEPARATORS: [char; 3] = ['-', '\u{2013}', '\u{2014}'];

/// A successfully parsed upload line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPair {
    pub source_text: String,
    pub translations: BTreeSet<String>,
}

/// Byte ranges of every dash with whitespace on both sides
fn separator_spans(line: &str) -> Vec<(usize, usize)> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut spans = Vec::new();
    for (i, &(offset, c)) in chars.iter().enumerate() {
        if !SEPARATORS.contains(&c) || i == 0 || i + 1 >= chars.len() {
            continue;
        }
        if chars[i - 1].1.is_whitespace() && chars[i + 1].1.is_whitespace() {
            spans.push((offset, offset + c.len_utf8()));
        }
    }
    spans
}

/// Parse one line. `line_number` is only used for error reporting.
pub fn parse_line(line: &str, line_number: usize) -> Result<WordPair, MalformedLine> {
    let reject = |reason| MalformedLine {
        line_number,
        line: line.to_string(),
        reason,
    };

    let spans = separator_spans(line);
    let (start, end) = match spans.as_slice() {
        [] => return Err(reject(MalformedReason::NoSeparator)),
        [span] => *span,
        _ => return Err(reject(MalformedReason::AmbiguousSeparator)),
    };

    let source_text = line[..start].trim();
    if source_text.is_empty() {
        return Err(reject(MalformedReason::EmptySource));
    }

    let translations: BTreeSet<String> = line[end..]
        .split(';')
        .map(normalize)
        .filter(|t| !t.is_empty())
        .collect();
    if translations.is_empty() {
        return Err(reject(MalformedReason::EmptyTranslations));
    }

    Ok(WordPair {
        source_text: source_text.to_string(),
        translations,
    })
}
