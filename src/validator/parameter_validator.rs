#![forbid(unsafe_code)]

//! Type-checking and coercion of invocation arguments
//!
//! A [`ParameterValidator`] turns an invocation's raw parameters into a
//! [`ResolvedDirective`] against one [`DecoratorRecord`]. Every offending
//! parameter is collected before failing, never just the first.

use crate::error::{ParameterViolation, ValidationError, ViolationKind};
use crate::parser::{RawParam, RawValue};
use crate::parser::args::parse_list_literal;
use crate::registry::{DecoratorRecord, ParameterSpec, ParameterType};
use crate::types::Identifier;
use crate::validator::value::TypedValue;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How parameters not declared on the record are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Undeclared parameters are violations
    #[default]
    Strict,
    /// Undeclared parameters are dropped and reported
    Lenient,
}

/// A parameter value after validation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedValue {
    pub name: Identifier,
    pub value: TypedValue,
    /// True when the value came from the record's default
    pub defaulted: bool,
}

/// An invocation matched to a record, with typed parameter values
///
/// `values` holds only parameters that were supplied or defaulted, in the
/// record's declaration order.
#[derive(Debug, Clone)]
pub struct ResolvedDirective {
    pub record: Arc<DecoratorRecord>,
    pub values: Vec<ResolvedValue>,
}

impl ResolvedDirective {
    pub fn name(&self) -> &str {
        self.record.name.as_str()
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.values
            .iter()
            .find(|v| v.name.as_str() == name)
            .map(|v| &v.value)
    }
}

/// Outcome of a successful validation
#[derive(Debug, Clone)]
pub struct Validated {
    pub directive: ResolvedDirective,
    /// Undeclared parameters dropped in lenient mode
    pub dropped: Vec<Identifier>,
}

/// Validates raw parameters against a record's parameter schema
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterValidator {
    mode: ValidationMode,
}

impl ParameterValidator {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Validate `params` against `record`
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] listing every unknown (in strict mode),
    /// missing, or ill-typed parameter.
    pub fn validate(
        &self,
        record: &Arc<DecoratorRecord>,
        params: &[RawParam],
    ) -> Result<Validated, ValidationError> {
        let mut violations = Vec::new();
        let mut dropped = Vec::new();

        for param in params {
            if record.parameter(param.name.as_str()).is_none() {
                match self.mode {
                    ValidationMode::Strict => {
                        violations.push(ParameterViolation::new(
                            param.name.as_str(),
                            ViolationKind::Unknown,
                        ));
                    }
                    ValidationMode::Lenient => {
                        tracing::warn!(
                            decorator = %record.name,
                            parameter = %param.name,
                            "Dropping undeclared parameter"
                        );
                        dropped.push(param.name.clone());
                    }
                }
            }
        }

        let mut values = Vec::new();
        for spec in &record.parameters {
            let supplied = params.iter().find(|p| p.name == spec.name);

            let (raw, defaulted) = match (supplied, &spec.default) {
                (Some(param), _) => (param.value.clone(), false),
                (None, Some(default)) => (RawValue::Text(default.clone()), true),
                (None, None) => {
                    if spec.required {
                        violations.push(ParameterViolation::new(
                            spec.name.as_str(),
                            ViolationKind::Missing,
                        ));
                    }
                    continue;
                }
            };

            match coerce(spec, &raw) {
                Ok(value) => values.push(ResolvedValue {
                    name: spec.name.clone(),
                    value,
                    defaulted,
                }),
                Err(kind) => violations.push(ParameterViolation::new(spec.name.as_str(), kind)),
            }
        }

        if !violations.is_empty() {
            return Err(ValidationError {
                decorator: record.name.to_string(),
                violations,
            });
        }

        Ok(Validated {
            directive: ResolvedDirective {
                record: Arc::clone(record),
                values,
            },
            dropped,
        })
    }
}

/// Coerce one raw value to the parameter's declared type, enforcing bounds
pub fn coerce(spec: &ParameterSpec, raw: &RawValue) -> Result<TypedValue, ViolationKind> {
    match spec.kind {
        ParameterType::Array => {
            let items = match raw {
                RawValue::List(items) => items.clone(),
                RawValue::Text(text) => {
                    parse_list_literal(text).map_err(|reason| ViolationKind::MalformedArray {
                        value: text.clone(),
                        reason,
                    })?
                }
            };
            check_length(spec, items.len())?;
            Ok(TypedValue::Array(items))
        }
        ParameterType::String => {
            let text = scalar(spec, raw)?;
            check_length(spec, text.chars().count())?;
            Ok(TypedValue::Text(text.to_string()))
        }
        ParameterType::Number => {
            let text = scalar(spec, raw)?;
            let value = text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| ViolationKind::NotANumber {
                    value: text.to_string(),
                })?;
            let bounds = &spec.bounds;
            if bounds.min.is_some_and(|min| value < min) || bounds.max.is_some_and(|max| value > max) {
                return Err(ViolationKind::OutOfRange {
                    value,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
            Ok(TypedValue::Number(value))
        }
        ParameterType::Boolean => {
            let text = scalar(spec, raw)?;
            match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(TypedValue::Boolean(true)),
                "false" => Ok(TypedValue::Boolean(false)),
                _ => Err(ViolationKind::NotABoolean {
                    value: text.to_string(),
                }),
            }
        }
        ParameterType::Enum => {
            let text = scalar(spec, raw)?;
            if spec.enum_values.iter().any(|v| v == text) {
                Ok(TypedValue::Enum(text.to_string()))
            } else {
                Err(ViolationKind::NotInEnum {
                    value: text.to_string(),
                    allowed: spec.enum_values.clone(),
                })
            }
        }
    }
}

/// The text of a scalar value; lists are a type mismatch
fn scalar<'a>(spec: &ParameterSpec, raw: &'a RawValue) -> Result<&'a str, ViolationKind> {
    match raw {
        RawValue::Text(text) => Ok(text),
        RawValue::List(_) => Err(ViolationKind::TypeMismatch {
            expected: spec.kind.describe().to_string(),
            value: raw.to_syntax(),
        }),
    }
}

fn check_length(spec: &ParameterSpec, length: usize) -> Result<(), ViolationKind> {
    let bounds = &spec.bounds;
    if bounds.min_length.is_some_and(|min| length < min)
        || bounds.max_length.is_some_and(|max| length > max)
    {
        return Err(ViolationKind::InvalidLength {
            length,
            min: bounds.min_length,
            max: bounds.max_length,
        });
    }
    Ok(())
}
