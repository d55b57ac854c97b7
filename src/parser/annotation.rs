#![forbid(unsafe_code)]

//! Extraction of the leading invocation group from raw text
//!
//! Only the stacked group at the top of the text is recognized: lines whose
//! first non-whitespace characters are the marker, optionally separated by
//! blank lines. The first line of ordinary text ends the group; markers after
//! it, or in the middle of a sentence, stay literal text.

use crate::parser::MARKER;
use crate::parser::args::parse_parameter_list;
use crate::parser::invocation::Invocation;
use crate::types::{Identifier, SourcePosition};
use crate::version::VersionReq;
use serde::Serialize;

/// A marker line that could not be parsed as an invocation
///
/// Non-fatal: the invocation is skipped and scanning continues with the
/// next line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub position: SourcePosition,
    pub message: String,
    /// The offending source line, without its newline
    pub raw: String,
}

/// Result of parsing one input text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedText {
    /// Invocations in top-to-bottom order
    pub invocations: Vec<Invocation>,
    /// Input with the invocation group removed
    pub clean_text: String,
    /// One entry per malformed marker line, in source order
    pub warnings: Vec<ParseWarning>,
}

impl ParsedText {
    pub fn has_invocations(&self) -> bool {
        !self.invocations.is_empty()
    }
}

/// Parser for decorator annotations
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationParser;

impl AnnotationParser {
    pub fn new() -> Self {
        AnnotationParser
    }

    /// Parse raw text into invocations and clean text
    ///
    /// Never fails: malformed invocations become [`ParseWarning`]s. Text
    /// without any marker line comes back unchanged.
    pub fn parse(&self, input: &str) -> ParsedText {
        let mut parsed = ParsedText::default();
        let mut offset = 0;
        let mut group_end = None;

        for (index, line) in input.split_inclusive('\n').enumerate() {
            let body = line.trim_end_matches(['\n', '\r']);
            let trimmed = body.trim_start();

            if trimmed.is_empty() {
                offset += line.len();
                continue;
            }
            if !trimmed.starts_with(MARKER) {
                break;
            }

            let indent = body.len() - trimmed.len();
            let column = body[..indent].chars().count() + 1;
            let position = SourcePosition::new(index as u32 + 1, column as u32, offset + indent);

            match parse_invocation(trimmed, position) {
                Ok(mut invocation) => {
                    invocation.raw = body.to_string();
                    parsed.invocations.push(invocation);
                }
                Err(message) => {
                    tracing::debug!(%position, %message, "Skipping malformed invocation");
                    parsed.warnings.push(ParseWarning {
                        position,
                        message,
                        raw: body.to_string(),
                    });
                }
            }

            offset += line.len();
            group_end = Some(offset);
        }

        parsed.clean_text = match group_end {
            Some(end) => skip_blank_lines(&input[end..]).to_string(),
            None => input.to_string(),
        };

        parsed
    }
}

/// Drop whole whitespace-only lines from the front of `text`
fn skip_blank_lines(text: &str) -> &str {
    let mut rest = text;
    loop {
        match rest.split_once('\n') {
            Some((line, tail)) if line.trim().is_empty() => rest = tail,
            Some(_) => return rest,
            None if rest.trim().is_empty() => return "",
            None => return rest,
        }
    }
}

/// Parse one marker line (leading whitespace already removed)
fn parse_invocation(line: &str, position: SourcePosition) -> Result<Invocation, String> {
    let rest = &line[MARKER.len()..];

    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(rest.len());
    let name_text = &rest[..name_len];
    let name = Identifier::new(name_text).ok_or_else(|| {
        if name_text.is_empty() {
            format!("expected a decorator name after '{}'", MARKER)
        } else {
            format!("invalid decorator name '{}'", name_text)
        }
    })?;
    let mut rest = &rest[name_len..];

    let mut version = None;
    if let Some(after_colon) = rest.strip_prefix(':') {
        let selector_src = after_colon
            .strip_prefix('v')
            .ok_or_else(|| "expected ':v' before a version selector".to_string())?;
        let selector_len = selector_src.find('(').unwrap_or(selector_src.len());
        let selector = VersionReq::parse(selector_src[..selector_len].trim())
            .map_err(|e| e.to_string())?;
        version = Some(selector);
        rest = &selector_src[selector_len..];
    }

    let mut params = Vec::new();
    if let Some(list) = rest.strip_prefix('(') {
        let (parsed, consumed) = parse_parameter_list(list)?;
        params = parsed;
        rest = &list[consumed..];
    }

    let trailing = rest.trim();
    if !trailing.is_empty() {
        return Err(format!("unexpected text '{}' after invocation", trailing));
    }

    Ok(Invocation {
        name,
        version,
        params,
        position,
        raw: line.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::args::RawValue;

    fn parse(input: &str) -> ParsedText {
        AnnotationParser::new().parse(input)
    }

    fn names(parsed: &ParsedText) -> Vec<&str> {
        parsed.invocations.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_text_without_invocations_is_unchanged() {
        for input in ["", "Explain X.", "\n\nTwo\nlines\n", "a +++Reasoning b", "  indented\n"] {
            let parsed = parse(input);
            assert_eq!(parsed.clean_text, input);
            assert!(parsed.invocations.is_empty());
            assert!(parsed.warnings.is_empty());
        }
    }

    #[test]
    fn test_stacked_group() {
        let parsed = parse("+++Reasoning(depth=comprehensive)\n+++StepByStep(numbered=true)\nExplain X.");
        assert_eq!(names(&parsed), vec!["Reasoning", "StepByStep"]);
        assert_eq!(parsed.clean_text, "Explain X.");
        assert!(parsed.warnings.is_empty());

        let reasoning = &parsed.invocations[0];
        assert_eq!(
            reasoning.param("depth"),
            Some(&RawValue::Text("comprehensive".to_string()))
        );
        assert_eq!(reasoning.raw, "+++Reasoning(depth=comprehensive)");
    }

    #[test]
    fn test_raw_keeps_source_indentation() {
        let parsed = parse("  +++Concise\r\nText");
        let concise = &parsed.invocations[0];
        assert_eq!(concise.raw, "  +++Concise");
        assert_eq!(concise.position.column, 3);
    }

    #[test]
    fn test_positions() {
        let parsed = parse("+++A\n  +++B\nText");
        assert_eq!(parsed.invocations[0].position, SourcePosition::new(1, 1, 0));
        assert_eq!(parsed.invocations[1].position, SourcePosition::new(2, 3, 7));
    }

    #[test]
    fn test_blank_lines_inside_and_after_group() {
        let parsed = parse("\n+++A\n\n   \n+++B\n\n\nBody line\n\nSecond paragraph\n");
        assert_eq!(names(&parsed), vec!["A", "B"]);
        assert_eq!(parsed.clean_text, "Body line\n\nSecond paragraph\n");
    }

    #[test]
    fn test_invocations_after_text_are_literal() {
        let input = "+++A\nIntro\n+++B\nMore";
        let parsed = parse(input);
        assert_eq!(names(&parsed), vec!["A"]);
        assert_eq!(parsed.clean_text, "Intro\n+++B\nMore");
    }

    #[test]
    fn test_mid_sentence_marker_is_literal() {
        let parsed = parse("Please use +++Reasoning here.");
        assert!(parsed.invocations.is_empty());
        assert_eq!(parsed.clean_text, "Please use +++Reasoning here.");
    }

    #[test]
    fn test_malformed_invocation_warns_and_continues() {
        let parsed = parse("+++Unknown123(bad syntax\n+++StepByStep\nExplain X.");
        assert_eq!(names(&parsed), vec!["StepByStep"]);
        assert_eq!(parsed.clean_text, "Explain X.");
        assert_eq!(parsed.warnings.len(), 1);

        let warning = &parsed.warnings[0];
        assert_eq!(warning.position.line, 1);
        assert_eq!(warning.raw, "+++Unknown123(bad syntax");
    }

    #[test]
    fn test_malformed_variants() {
        for line in [
            "+++",
            "++++Plus",
            "+++ Spaced",
            "+++Name(a=1",
            "+++Name trailing words",
            "+++Name:1.0",
            "+++Name:vnext",
            "+++Name(a=1) extra",
            "+++9Lives",
        ] {
            let parsed = parse(&format!("{}\nBody", line));
            assert!(parsed.invocations.is_empty(), "'{}' should not parse", line);
            assert_eq!(parsed.warnings.len(), 1, "'{}' should warn", line);
            assert_eq!(parsed.clean_text, "Body");
        }
    }

    #[test]
    fn test_version_selector() {
        let parsed = parse("+++Reasoning:v1(depth=basic)\n+++Tone:v>=1.2, <2\nText");
        let reasoning = &parsed.invocations[0];
        assert_eq!(reasoning.version, Some(VersionReq::parse("1").unwrap()));
        assert_eq!(reasoning.params.len(), 1);

        let tone = &parsed.invocations[1];
        assert_eq!(tone.version, Some(VersionReq::parse(">=1.2,<2").unwrap()));
        assert!(tone.params.is_empty());
    }

    #[test]
    fn test_empty_parens_and_crlf() {
        let parsed = parse("+++Concise()\r\nShort answer please.\r\n");
        assert_eq!(names(&parsed), vec!["Concise"]);
        assert_eq!(parsed.clean_text, "Short answer please.\r\n");
    }

    #[test]
    fn test_only_invocations() {
        let parsed = parse("+++A\n+++B\n\n");
        assert_eq!(names(&parsed), vec!["A", "B"]);
        assert_eq!(parsed.clean_text, "");
    }

    #[test]
    fn test_canonical_round_trip_for_bare_invocation() {
        let parsed = parse("+++StepByStep\nText");
        assert_eq!(parsed.invocations[0].to_canonical(), "+++StepByStep");
    }

    #[test]
    fn test_canonical_round_trip_reparses() {
        let parsed = parse("+++Focus:v^1.2( aspects = [cost , 'risk, impact'] , depth=\"very deep\")\nText");
        let canonical = parsed.invocations[0].to_canonical();
        let reparsed = parse(&format!("{}\nText", canonical));
        assert_eq!(reparsed.invocations[0].params, parsed.invocations[0].params);
        assert_eq!(reparsed.invocations[0].version, parsed.invocations[0].version);
    }
}
