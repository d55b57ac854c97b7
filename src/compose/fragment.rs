#![forbid(unsafe_code)]

//! Rendering of one resolved directive into an instruction fragment

use crate::registry::ParameterEffect;
use crate::validator::ResolvedDirective;

/// Render a directive's instruction with its parameter effects
///
/// Starts from the template's base instruction, then visits parameters in
/// declaration order. A value map contributes the entry keyed by the
/// resolved value (nothing when there is no entry); a format template is
/// rendered with the value. Absent parameters contribute nothing. Parts are
/// joined with single spaces.
pub fn render_fragment(directive: &ResolvedDirective) -> String {
    let template = &directive.record.template;
    let mut parts: Vec<String> = Vec::new();

    let base = template.instruction.trim();
    if !base.is_empty() {
        parts.push(base.to_string());
    }

    for spec in &directive.record.parameters {
        let Some(effect) = template.parameter_mapping.get(&spec.name) else {
            continue;
        };
        let Some(value) = directive.get(spec.name.as_str()) else {
            continue;
        };

        let part = match effect {
            ParameterEffect::ValueMap(map) => map.get(&value.key()).cloned(),
            ParameterEffect::Format(format) => Some(format.render(&value.render())),
        };
        if let Some(part) = part {
            let part = part.trim();
            if !part.is_empty() {
                parts.push(part.to_string());
            }
        }
    }

    parts.join(" ")
}
