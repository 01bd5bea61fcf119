//! YAML parse diagnostics.
//!
//! `serde-saphyr` reports a line and column; [`map_yaml_error`] turns that
//! into a byte span over the manifest text and attaches a hint for the
//! usual mistakes (tabs, missing `-`, stray `:`).

#![allow(clippy::allow_attributes, clippy::allow_attributes_without_reason)]

use super::ManifestName;
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_saphyr::{Error as YamlError, Location};
use thiserror::Error;

const HINTS: [(&str, &str); 4] = [
    (
        "did not find expected '-'",
        "Start list items such as build file items with '-'.",
    ),
    (
        "expected ':'",
        "Follow each key with ':' before its value.",
    ),
    (
        "mapping values are not allowed",
        "Quote labels containing ':' such as \"//base:net\".",
    ),
    (
        "found character that cannot start any token",
        "Remove stray characters and indent with spaces.",
    ),
];

#[allow(unused_assignments)]
#[derive(Debug, Error, Diagnostic)]
#[error("YAML parse error at line {line}, column {column}: {source}")]
#[diagnostic(code(musubi::yaml::parse))]
struct YamlDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("parse error here")]
    span: Option<SourceSpan>,
    #[help]
    help: Option<String>,
    #[source]
    source: YamlError,
    line: u64,
    column: u64,
}

/// Byte offset of a 1-based `line`/`column` (in characters) within `src`,
/// clamped to the end of the line and of the input.
fn byte_offset(src: &str, line: u64, column: u64) -> usize {
    let line_idx = usize::try_from(line.saturating_sub(1)).unwrap_or(usize::MAX);
    let column_idx = usize::try_from(column.saturating_sub(1)).unwrap_or(usize::MAX);
    let mut start = 0usize;
    for (idx, segment) in src.split_inclusive('\n').enumerate() {
        if idx == line_idx {
            let text = segment.trim_end_matches(['\n', '\r']);
            return start
                + text
                    .char_indices()
                    .nth(column_idx)
                    .map_or(text.len(), |(offset, _)| offset);
        }
        start += segment.len();
    }
    src.len()
}

/// One-character span at `offset`, or the preceding character when the
/// offset sits on a line break or past the end.
fn span_at(src: &str, offset: usize) -> SourceSpan {
    let bytes = src.as_bytes();
    let breaks = |b: &u8| *b == b'\n' || *b == b'\r';
    let (start, len) = match bytes.get(offset) {
        Some(b) if !breaks(b) => (offset, 1),
        _ if offset > 0 && bytes.get(offset - 1).is_some_and(|b| !breaks(b)) => (offset - 1, 1),
        _ => (offset, 0),
    };
    SourceSpan::new(start.into(), len)
}

fn tab_indented(src: &str, line: u64) -> bool {
    let idx = usize::try_from(line.saturating_sub(1)).unwrap_or(usize::MAX);
    src.lines().nth(idx).is_some_and(|text| {
        text.chars()
            .take_while(|c| c.is_whitespace())
            .any(|c| c == '\t')
    })
}

fn hint_for(message: &str, src: &str, location: Option<Location>) -> Option<String> {
    if location.is_some_and(|loc| tab_indented(src, loc.line())) {
        return Some("Indent with spaces; YAML does not allow tabs.".to_owned());
    }
    let lower = message.to_lowercase();
    HINTS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, hint)| (*hint).to_owned())
}

/// Map a `serde-saphyr` parse error into a [`miette`] diagnostic carrying
/// the source, a span and an optional hint.
#[must_use]
pub fn map_yaml_error(
    err: YamlError,
    src: &str,
    name: &ManifestName,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    let location = err.location();
    let (line, column) = location.map_or((1, 1), |loc| (loc.line(), loc.column()));
    let span = location.map(|loc| span_at(src, byte_offset(src, loc.line(), loc.column())));
    let help = hint_for(&err.to_string(), src, location);
    Box::new(YamlDiagnostic {
        src: NamedSource::new(name.as_str(), src.to_owned()),
        span,
        help,
        source: err,
        line,
        column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("one\ntwo\nthree", 3, 3, 10)]
    #[case("one\r\ntwo", 2, 2, 6)]
    #[case("short", 1, 42, 5)]
    #[case("short", 9, 1, 5)]
    fn byte_offset_walks_lines_and_clamps(
        #[case] src: &str,
        #[case] line: u64,
        #[case] column: u64,
        #[case] expected: usize,
    ) {
        assert_eq!(byte_offset(src, line, column), expected);
    }

    #[test]
    fn byte_offset_counts_characters_not_bytes() {
        let src = "café: x";
        let offset = byte_offset(src, 1, 5);
        assert!(src.is_char_boundary(offset));
        assert_eq!(src.get(offset..), Some(": x"));
    }

    #[test]
    fn tab_indentation_gets_a_hint() {
        let src = "\tkey: \"unterminated";
        let err = serde_saphyr::from_str::<serde_json::Value>(src)
            .expect_err("expected YAML parse error");
        let diag = map_yaml_error(err, src, &ManifestName::new("test"));
        let help = diag.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("Indent with spaces"), "help was {help:?}");
    }

    #[test]
    fn missing_location_defaults_to_first_line() {
        let err = serde_saphyr::Error::Eof {
            location: serde_saphyr::Location::UNKNOWN,
        };
        let diag = map_yaml_error(err, "foo: [1", &ManifestName::new("test"));
        assert!(diag.to_string().contains("line 1, column 1"));
    }
}
