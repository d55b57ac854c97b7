#![forbid(unsafe_code)]

//! Human-readable diagnostics, colored with termcolor

use crate::engine::{Diagnostic, Transformation};
use crate::parser::ParsedText;
use crate::types::Severity;
use std::io::{self, Write};
use termcolor::{Buffer, Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Human-readable formatter for transformation diagnostics
pub struct HumanFormatter {
    color: ColorChoice,
}

impl HumanFormatter {
    pub fn new(color: ColorChoice) -> Self {
        Self { color }
    }

    /// Color-free formatter, used when output is captured
    pub fn plain() -> Self {
        Self::new(ColorChoice::Never)
    }

    /// Write one line per diagnostic
    pub fn write_diagnostics<W: WriteColor>(
        &self,
        out: &mut W,
        diagnostics: &[Diagnostic],
    ) -> io::Result<()> {
        for diagnostic in diagnostics {
            if let Some(position) = &diagnostic.position {
                write!(out, "{}: ", position)?;
            }
            out.set_color(&severity_color(diagnostic.severity))?;
            write!(out, "{}", diagnostic.severity)?;
            out.reset()?;
            write!(out, " [{}]", diagnostic.code)?;
            if let Some(name) = &diagnostic.decorator {
                write!(out, " {}", name)?;
            }
            writeln!(out, ": {}", diagnostic.message)?;
        }
        Ok(())
    }

    /// Write a one-line count of diagnostics by severity, if there are any
    pub fn write_summary<W: WriteColor>(
        &self,
        out: &mut W,
        transformation: &Transformation,
    ) -> io::Result<()> {
        let count = |severity: Severity| {
            transformation
                .diagnostics
                .iter()
                .filter(|d| d.severity == severity)
                .count()
        };
        let (errors, warnings) = (count(Severity::Error), count(Severity::Warning));
        if errors == 0 && warnings == 0 {
            return Ok(());
        }

        let mut spec = ColorSpec::new();
        spec.set_bold(true);
        out.set_color(&spec)?;
        write!(
            out,
            "{} directive(s) applied, {} error(s), {} warning(s)",
            transformation.directives.len(),
            errors,
            warnings
        )?;
        out.reset()?;
        writeln!(out)
    }

    /// Write the invocations of a parse in canonical form, then the clean text
    pub fn write_extraction<W: WriteColor>(&self, out: &mut W, parsed: &ParsedText) -> io::Result<()> {
        let mut heading = ColorSpec::new();
        heading.set_bold(true);

        out.set_color(&heading)?;
        writeln!(out, "Invocations ({}):", parsed.invocations.len())?;
        out.reset()?;
        for invocation in &parsed.invocations {
            writeln!(out, "  {}  {}", invocation.position, invocation.to_canonical())?;
        }
        for warning in &parsed.warnings {
            write!(out, "  {}  ", warning.position)?;
            out.set_color(&severity_color(Severity::Warning))?;
            write!(out, "malformed")?;
            out.reset()?;
            writeln!(out, ": {} ({})", warning.raw.trim(), warning.message)?;
        }

        writeln!(out)?;
        out.set_color(&heading)?;
        writeln!(out, "Clean text:")?;
        out.reset()?;
        write!(out, "{}", parsed.clean_text)?;
        if !parsed.clean_text.is_empty() && !parsed.clean_text.ends_with('\n') {
            writeln!(out)?;
        }
        Ok(())
    }

    /// Diagnostics rendered without color
    pub fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        let mut buffer = Buffer::no_color();
        // Writing to an in-memory buffer cannot fail
        self.write_diagnostics(&mut buffer, diagnostics).ok();
        String::from_utf8_lossy(buffer.as_slice()).into_owned()
    }

    /// Write diagnostics and the summary to stderr
    pub fn report_to_stderr(&self, transformation: &Transformation) -> io::Result<()> {
        let mut stderr = StandardStream::stderr(self.color);
        self.write_diagnostics(&mut stderr, &transformation.diagnostics)?;
        self.write_summary(&mut stderr, transformation)?;
        stderr.flush()
    }

    /// Stream for stdout using this formatter's color choice
    pub fn stdout(&self) -> StandardStream {
        StandardStream::stdout(self.color)
    }

    pub fn stderr(&self) -> StandardStream {
        StandardStream::stderr(self.color)
    }
}

impl Default for HumanFormatter {
    fn default() -> Self {
        Self::new(ColorChoice::Auto)
    }
}

fn severity_color(severity: Severity) -> ColorSpec {
    let mut spec = ColorSpec::new();
    match severity {
        Severity::Error => spec.set_fg(Some(Color::Red)).set_bold(true),
        Severity::Warning => spec.set_fg(Some(Color::Yellow)).set_bold(true),
        Severity::Info => spec.set_fg(Some(Color::Cyan)),
    };
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DiagnosticCode;
    use crate::parser::AnnotationParser;
    use crate::types::SourcePosition;

    #[test]
    fn test_format_diagnostics_plain() {
        let diagnostics = vec![
            Diagnostic::new(Severity::Warning, DiagnosticCode::UnknownDecorator, "Unknown decorator 'X'")
                .for_decorator("X")
                .at(SourcePosition::new(1, 1, 0)),
            Diagnostic::new(Severity::Error, DiagnosticCode::Conflict, "A conflicts with B")
                .for_decorator("A"),
        ];
        let output = HumanFormatter::plain().format_diagnostics(&diagnostics);
        assert_eq!(
            output,
            "1:1: warning [unknown_decorator] X: Unknown decorator 'X'\n\
             error [conflict] A: A conflicts with B\n"
        );
    }

    #[test]
    fn test_extraction_lists_canonical_forms() {
        let parsed = AnnotationParser::new().parse("+++Tone( style = formal )\n+++Broken(\nBody");
        let mut buffer = Buffer::no_color();
        HumanFormatter::plain()
            .write_extraction(&mut buffer, &parsed)
            .unwrap();
        let output = String::from_utf8(buffer.into_inner()).unwrap();

        assert!(output.contains("Invocations (1):"));
        assert!(output.contains("1:1  +++Tone(style=formal)"));
        assert!(output.contains("2:1  malformed: +++Broken("));
        assert!(output.ends_with("Clean text:\nBody\n"));
    }
}
