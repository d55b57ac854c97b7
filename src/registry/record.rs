#![forbid(unsafe_code)]

//! Declarative decorator records
//!
//! A record is deserialized from a TOML or JSON definition (one per file), or
//! assembled at runtime with [`RecordBuilder`]. Both paths go through the same
//! structural validation before a [`DecoratorRecord`] exists.

use crate::error::RegistryError;
use crate::parser::RawValue;
use crate::parser::args::quote_if_needed;
use crate::types::{CompositionBehavior, Identifier, Placement};
use crate::validator::{coerce, format_number};
use crate::version::{Version, VersionRange};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Declared type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Number,
    Boolean,
    Enum,
    Array,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterType::String => "string",
            ParameterType::Number => "number",
            ParameterType::Boolean => "boolean",
            ParameterType::Enum => "enum",
            ParameterType::Array => "array",
        }
    }

    /// Phrase used in validation messages
    pub fn describe(&self) -> &'static str {
        match self {
            ParameterType::String => "a string",
            ParameterType::Number => "a number",
            ParameterType::Boolean => "true or false",
            ParameterType::Enum => "one of the declared values",
            ParameterType::Array => "an array",
        }
    }
}

/// Optional numeric and length bounds
///
/// `min`/`max` apply to numbers; `min_length`/`max_length` apply to string
/// length in characters and to array item counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl Bounds {
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            ..Self::default()
        }
    }

    pub fn length(min_length: Option<usize>, max_length: Option<usize>) -> Self {
        Self {
            min_length,
            max_length,
            ..Self::default()
        }
    }

    fn has_range(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    fn has_length(&self) -> bool {
        self.min_length.is_some() || self.max_length.is_some()
    }
}

/// A parameter declared on a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: Identifier,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(rename = "values", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    /// Default in invocation syntax; validated against the type at load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub required: bool,
    #[serde(flatten)]
    pub bounds: Bounds,
}

/// A format string with exactly one `{value}` substitution point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormatTemplate(String);

impl FormatTemplate {
    pub const PLACEHOLDER: &'static str = "{value}";

    pub fn new(template: impl Into<String>) -> Option<Self> {
        let template = template.into();
        (template.matches(Self::PLACEHOLDER).count() == 1).then_some(FormatTemplate(template))
    }

    pub fn render(&self, value: &str) -> String {
        self.0.replacen(Self::PLACEHOLDER, value, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How a parameter's resolved value contributes to the instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterEffect {
    /// Extra instruction text keyed by the concrete value
    ValueMap(BTreeMap<String, String>),
    /// Template rendered with the value
    Format(FormatTemplate),
}

/// Instruction text plus how it is rendered and merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformationTemplate {
    pub instruction: String,
    pub parameter_mapping: BTreeMap<Identifier, ParameterEffect>,
    pub placement: Placement,
    pub composition: CompositionBehavior,
}

/// Compatibility metadata used for resolution and advisory checks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Compatibility {
    pub requires: BTreeSet<Identifier>,
    pub conflicts: BTreeSet<Identifier>,
    /// Inclusive window of supported standard versions
    pub standard: VersionRange,
    pub targets: BTreeSet<String>,
}

impl Compatibility {
    pub fn conflicts_with(&self, name: &str) -> bool {
        self.conflicts.iter().any(|c| c.as_str() == name)
    }

    /// An empty target set applies everywhere
    pub fn applies_to(&self, target: &str) -> bool {
        self.targets.is_empty() || self.targets.contains(target)
    }
}

/// Where a record came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOrigin {
    File(PathBuf),
    Runtime,
}

impl Serialize for RecordOrigin {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for RecordOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordOrigin::File(path) => write!(f, "{}", path.display()),
            RecordOrigin::Runtime => write!(f, "<runtime>"),
        }
    }
}

/// The declarative rule definition for a named, versioned decorator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecoratorRecord {
    pub name: Identifier,
    pub version: Version,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Declaration order controls rendering order
    pub parameters: Vec<ParameterSpec>,
    pub template: TransformationTemplate,
    pub compatibility: Compatibility,
    pub origin: RecordOrigin,
}

impl DecoratorRecord {
    /// Parse a record from TOML content
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidDefinition` if the TOML is malformed or
    /// the record fails structural validation.
    pub fn from_toml(content: &str, origin: RecordOrigin) -> Result<Self, RegistryError> {
        let def: RecordDefinition = toml::from_str(content)
            .map_err(|e| RegistryError::invalid(&origin, format!("Failed to parse TOML: {}", e)))?;
        Self::from_definition(def, origin)
    }

    /// Parse a record from JSON content
    pub fn from_json(content: &str, origin: RecordOrigin) -> Result<Self, RegistryError> {
        let def: RecordDefinition = serde_json::from_str(content)
            .map_err(|e| RegistryError::invalid(&origin, format!("Failed to parse JSON: {}", e)))?;
        Self::from_definition(def, origin)
    }

    /// Parse a record from a `.toml` or `.json` file
    pub fn from_path(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = RecordOrigin::File(path.to_path_buf());
        match RecordFormat::from_path(path) {
            Some(RecordFormat::Toml) => Self::from_toml(&content, origin),
            Some(RecordFormat::Json) => Self::from_json(&content, origin),
            None => Err(RegistryError::invalid(
                origin,
                "Unsupported file extension (expected .toml or .json)",
            )),
        }
    }

    /// Look up a declared parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name.as_str() == name)
    }

    /// True when this record's window includes `standard`
    pub fn supports_standard(&self, standard: &Version) -> bool {
        self.compatibility.standard.contains(standard)
    }

    /// `Name v1.2.3`
    pub fn label(&self) -> String {
        format!("{} v{}", self.name, self.version)
    }

    fn from_definition(def: RecordDefinition, origin: RecordOrigin) -> Result<Self, RegistryError> {
        let invalid = |message: String| RegistryError::invalid(&origin, message);

        let name = Identifier::new(def.decorator.name.clone())
            .ok_or_else(|| invalid(format!("Invalid decorator name '{}'", def.decorator.name)))?;
        let version = Version::parse(&def.decorator.version).map_err(|e| invalid(e.to_string()))?;

        let mut parameters = Vec::with_capacity(def.parameters.len());
        let mut seen = HashSet::new();
        for decl in def.parameters {
            let spec = decl.into_spec().map_err(&invalid)?;
            if !seen.insert(spec.name.clone()) {
                return Err(invalid(format!("Parameter '{}' declared more than once", spec.name)));
            }
            parameters.push(spec);
        }

        let mut parameter_mapping = BTreeMap::new();
        for (param_name, effect) in def.template.parameters {
            let spec = parameters
                .iter()
                .find(|p| p.name.as_str() == param_name)
                .ok_or_else(|| {
                    invalid(format!(
                        "Template maps undeclared parameter '{}'",
                        param_name
                    ))
                })?;
            let effect = effect.into_effect(spec).map_err(&invalid)?;
            parameter_mapping.insert(spec.name.clone(), effect);
        }

        let compatibility = def.compatibility.into_compatibility(&name).map_err(&invalid)?;

        Ok(DecoratorRecord {
            name,
            version,
            description: def.decorator.description,
            category: def.decorator.category.filter(|c| !c.trim().is_empty()),
            parameters,
            template: TransformationTemplate {
                instruction: def.template.instruction,
                parameter_mapping,
                placement: def.template.placement,
                composition: def.template.composition,
            },
            compatibility,
            origin,
        })
    }
}

/// File formats a record can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Toml,
    Json,
}

impl RecordFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Some(RecordFormat::Toml),
            Some("json") => Some(RecordFormat::Json),
            _ => None,
        }
    }
}

/// On-disk structure of a record definition
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordDefinition {
    decorator: DecoratorSection,
    #[serde(default)]
    parameters: Vec<ParameterDecl>,
    template: TemplateSection,
    #[serde(default)]
    compatibility: CompatibilitySection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct DecoratorSection {
    name: String,
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateSection {
    instruction: String,
    #[serde(default)]
    placement: Placement,
    #[serde(default)]
    composition: CompositionBehavior,
    #[serde(default)]
    parameters: BTreeMap<String, EffectDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
enum EffectDecl {
    ValueMap(BTreeMap<String, String>),
    Format(String),
}

impl EffectDecl {
    fn into_effect(self, spec: &ParameterSpec) -> Result<ParameterEffect, String> {
        match self {
            EffectDecl::Format(template) => FormatTemplate::new(template.clone())
                .map(ParameterEffect::Format)
                .ok_or_else(|| {
                    format!(
                        "Format for '{}' must contain exactly one {} placeholder: '{}'",
                        spec.name,
                        FormatTemplate::PLACEHOLDER,
                        template
                    )
                }),
            EffectDecl::ValueMap(map) => {
                for key in map.keys() {
                    let known = match spec.kind {
                        ParameterType::Enum => spec.enum_values.iter().any(|v| v == key),
                        ParameterType::Boolean => key == "true" || key == "false",
                        _ => true,
                    };
                    if !known {
                        return Err(format!(
                            "Value map for '{}' has key '{}' that the parameter can never take",
                            spec.name, key
                        ));
                    }
                }
                Ok(ParameterEffect::ValueMap(map))
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CompatibilitySection {
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    conflicts: Vec<String>,
    #[serde(default)]
    min_standard_version: Option<String>,
    #[serde(default)]
    max_standard_version: Option<String>,
    #[serde(default)]
    targets: Vec<String>,
}

impl CompatibilitySection {
    fn into_compatibility(self, own_name: &Identifier) -> Result<Compatibility, String> {
        let names = |list: Vec<String>, field: &str| -> Result<BTreeSet<Identifier>, String> {
            list.into_iter()
                .map(|n| {
                    let id = Identifier::new(n.clone())
                        .ok_or_else(|| format!("Invalid decorator name '{}' in {}", n, field))?;
                    if &id == own_name {
                        return Err(format!("A decorator cannot list itself in {}", field));
                    }
                    Ok(id)
                })
                .collect()
        };

        let version = |v: Option<String>| -> Result<Option<Version>, String> {
            v.map(|s| Version::parse(&s).map_err(|e| e.to_string()))
                .transpose()
        };

        let standard = VersionRange::new(
            version(self.min_standard_version)?,
            version(self.max_standard_version)?,
        );
        if !standard.is_ordered() {
            return Err(format!("Standard version window {} is empty", standard));
        }

        Ok(Compatibility {
            requires: names(self.requires, "requires")?,
            conflicts: names(self.conflicts, "conflicts")?,
            standard,
            targets: self.targets.into_iter().collect(),
        })
    }
}

/// A literal default value as written in a definition
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Literal>),
}

impl Literal {
    /// Convert to invocation syntax so defaults share the validator's coercion
    fn to_raw(&self) -> Result<String, String> {
        match self {
            Literal::Bool(b) => Ok(b.to_string()),
            Literal::Number(n) => Ok(format_number(*n)),
            Literal::Text(s) => Ok(s.clone()),
            Literal::List(items) => {
                let items = items
                    .iter()
                    .map(|item| match item {
                        Literal::List(_) => Err("nested lists are not supported".to_string()),
                        Literal::Text(s) => Ok(quote_if_needed(s)),
                        other => other.to_raw(),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("[{}]", items.join(", ")))
            }
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Text(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Text(s)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Number(f64::from(n))
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(items: Vec<T>) -> Self {
        Literal::List(items.into_iter().map(Into::into).collect())
    }
}

/// A parameter declaration, as written in a definition or built in code
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterDecl {
    name: String,
    #[serde(rename = "type")]
    kind: ParameterType,
    #[serde(default)]
    description: String,
    #[serde(default)]
    values: Vec<String>,
    #[serde(default)]
    default: Option<Literal>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
    #[serde(default)]
    min_length: Option<usize>,
    #[serde(default)]
    max_length: Option<usize>,
}

impl ParameterDecl {
    pub fn new(name: impl Into<String>, kind: ParameterType) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            values: Vec::new(),
            default: None,
            required: false,
            min: None,
            max: None,
            min_length: None,
            max_length: None,
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn default(mut self, value: impl Into<Literal>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn bounds(mut self, bounds: Bounds) -> Self {
        self.min = bounds.min;
        self.max = bounds.max;
        self.min_length = bounds.min_length;
        self.max_length = bounds.max_length;
        self
    }

    fn into_spec(self) -> Result<ParameterSpec, String> {
        let name = Identifier::new(self.name.clone())
            .ok_or_else(|| format!("Invalid parameter name '{}'", self.name))?;

        match self.kind {
            ParameterType::Enum => {
                if self.values.is_empty() {
                    return Err(format!("Enum parameter '{}' declares no values", name));
                }
                let unique: HashSet<&String> = self.values.iter().collect();
                if unique.len() != self.values.len() {
                    return Err(format!("Enum parameter '{}' repeats a value", name));
                }
            }
            _ if !self.values.is_empty() => {
                return Err(format!(
                    "Parameter '{}' declares values but is not an enum",
                    name
                ));
            }
            _ => {}
        }

        let bounds = Bounds {
            min: self.min,
            max: self.max,
            min_length: self.min_length,
            max_length: self.max_length,
        };
        if bounds.has_range() && self.kind != ParameterType::Number {
            return Err(format!("min/max only apply to number parameters ('{}')", name));
        }
        if bounds.has_length() && !matches!(self.kind, ParameterType::String | ParameterType::Array)
        {
            return Err(format!(
                "min_length/max_length only apply to string and array parameters ('{}')",
                name
            ));
        }
        if let (Some(min), Some(max)) = (bounds.min, bounds.max)
            && min > max
        {
            return Err(format!("Parameter '{}' has min {} above max {}", name, min, max));
        }
        if let (Some(min), Some(max)) = (bounds.min_length, bounds.max_length)
            && min > max
        {
            return Err(format!(
                "Parameter '{}' has min_length {} above max_length {}",
                name, min, max
            ));
        }

        let default = self
            .default
            .as_ref()
            .map(Literal::to_raw)
            .transpose()
            .map_err(|e| format!("Default for '{}': {}", name, e))?;

        let spec = ParameterSpec {
            name,
            kind: self.kind,
            description: self.description,
            enum_values: self.values,
            default,
            required: self.required,
            bounds,
        };

        if let Some(default) = &spec.default
            && let Err(kind) = coerce(&spec, &RawValue::Text(default.clone()))
        {
            let violation = crate::error::ParameterViolation::new(spec.name.as_str(), kind);
            return Err(format!("Invalid default: {}", violation));
        }

        Ok(spec)
    }
}

/// Assembles a record in code, validated exactly like a loaded one
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    def: RecordDefinition,
}

impl RecordBuilder {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            def: RecordDefinition {
                decorator: DecoratorSection {
                    name: name.into(),
                    version: version.into(),
                    description: String::new(),
                    category: None,
                },
                parameters: Vec::new(),
                template: TemplateSection {
                    instruction: String::new(),
                    placement: Placement::default(),
                    composition: CompositionBehavior::default(),
                    parameters: BTreeMap::new(),
                },
                compatibility: CompatibilitySection::default(),
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.def.decorator.description = description.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.def.decorator.category = Some(category.into());
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.def.template.instruction = instruction.into();
        self
    }

    pub fn placement(mut self, placement: Placement) -> Self {
        self.def.template.placement = placement;
        self
    }

    pub fn composition(mut self, composition: CompositionBehavior) -> Self {
        self.def.template.composition = composition;
        self
    }

    pub fn parameter(mut self, decl: ParameterDecl) -> Self {
        self.def.parameters.push(decl);
        self
    }

    pub fn value_map<I, K, V>(mut self, parameter: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.def
            .template
            .parameters
            .insert(parameter.into(), EffectDecl::ValueMap(map));
        self
    }

    pub fn format(mut self, parameter: impl Into<String>, template: impl Into<String>) -> Self {
        self.def
            .template
            .parameters
            .insert(parameter.into(), EffectDecl::Format(template.into()));
        self
    }

    pub fn requires(mut self, name: impl Into<String>) -> Self {
        self.def.compatibility.requires.push(name.into());
        self
    }

    pub fn conflicts(mut self, name: impl Into<String>) -> Self {
        self.def.compatibility.conflicts.push(name.into());
        self
    }

    pub fn standard_window(mut self, min: Option<&str>, max: Option<&str>) -> Self {
        self.def.compatibility.min_standard_version = min.map(str::to_string);
        self.def.compatibility.max_standard_version = max.map(str::to_string);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.def.compatibility.targets.push(target.into());
        self
    }

    /// Validate and produce the record
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidDefinition` for the same structural
    /// problems a loaded definition would be rejected for.
    pub fn build(self) -> Result<DecoratorRecord, RegistryError> {
        DecoratorRecord::from_definition(self.def, RecordOrigin::Runtime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REASONING: &str = r#"
[decorator]
name = "Reasoning"
version = "1.0.0"
description = "Shows the reasoning process"
category = "reasoning"

[[parameters]]
name = "depth"
type = "enum"
values = ["basic", "moderate", "comprehensive"]
default = "moderate"

[[parameters]]
name = "steps"
type = "number"
min = 1
max = 10

[template]
instruction = "Explain your reasoning before answering."
placement = "prepend"
composition = "accumulate"

[template.parameters.depth.value_map]
basic = "Keep it brief."
comprehensive = "Cover every consideration."

[template.parameters.steps]
format = "Use {value} steps."

[compatibility]
conflicts = ["Concise"]
min_standard_version = "1.0.0"
targets = ["text"]
"#;

    fn origin() -> RecordOrigin {
        RecordOrigin::File(PathBuf::from("reasoning.toml"))
    }

    #[test]
    fn test_from_toml_full() {
        let record = DecoratorRecord::from_toml(REASONING, origin()).unwrap();
        assert_eq!(record.name.as_str(), "Reasoning");
        assert_eq!(record.version, Version::new(1, 0, 0));
        assert_eq!(record.category.as_deref(), Some("reasoning"));
        assert_eq!(record.parameters.len(), 2);
        assert_eq!(record.parameters[0].default.as_deref(), Some("moderate"));
        assert_eq!(record.parameters[1].bounds.max, Some(10.0));
        assert_eq!(record.template.placement, Placement::Prepend);
        assert_eq!(record.template.composition, CompositionBehavior::Accumulate);
        assert!(matches!(
            record.template.parameter_mapping.get(&Identifier::new("steps").unwrap()),
            Some(ParameterEffect::Format(_))
        ));
        assert!(record.compatibility.conflicts_with("Concise"));
        assert!(record.compatibility.applies_to("text"));
        assert!(!record.compatibility.applies_to("code"));
        assert!(record.supports_standard(&Version::new(1, 0, 0)));
        assert!(!record.supports_standard(&Version::new(0, 9, 0)));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "decorator": {"name": "StepByStep", "version": "1.0.0"},
            "parameters": [{"name": "numbered", "type": "boolean", "default": true}],
            "template": {
                "instruction": "Work step by step.",
                "parameters": {"numbered": {"value_map": {"true": "Number each step."}}}
            }
        }"#;
        let record = DecoratorRecord::from_json(json, RecordOrigin::Runtime).unwrap();
        assert_eq!(record.parameters[0].default.as_deref(), Some("true"));
        assert_eq!(record.template.placement, Placement::Prepend);
        assert!(record.compatibility.targets.is_empty());
    }

    #[test]
    fn test_defaults_for_placement_and_composition() {
        let record = RecordBuilder::new("Plain", "0.1.0")
            .instruction("Be plain.")
            .build()
            .unwrap();
        assert_eq!(record.template.placement, Placement::Prepend);
        assert_eq!(record.template.composition, CompositionBehavior::Accumulate);
        assert_eq!(record.origin, RecordOrigin::Runtime);
    }

    fn build_err(builder: RecordBuilder) -> String {
        builder.build().unwrap_err().to_string()
    }

    #[test]
    fn test_rejects_structural_problems() {
        let base = || RecordBuilder::new("Tone", "1.0.0").instruction("Adjust tone.");

        assert!(build_err(RecordBuilder::new("bad name", "1.0.0")).contains("Invalid decorator name"));
        assert!(build_err(RecordBuilder::new("Tone", "1.0")).contains("Invalid version"));
        assert!(
            build_err(base().parameter(ParameterDecl::new("style", ParameterType::Enum)))
                .contains("declares no values")
        );
        assert!(
            build_err(
                base()
                    .parameter(ParameterDecl::new("a", ParameterType::String))
                    .parameter(ParameterDecl::new("a", ParameterType::Number))
            )
            .contains("more than once")
        );
        assert!(build_err(base().format("ghost", "{value}")).contains("undeclared parameter"));
        assert!(
            build_err(
                base()
                    .parameter(ParameterDecl::new("n", ParameterType::Number))
                    .format("n", "no placeholder")
            )
            .contains("exactly one")
        );
        assert!(
            build_err(
                base()
                    .parameter(ParameterDecl::new("n", ParameterType::Number))
                    .format("n", "{value} and {value}")
            )
            .contains("exactly one")
        );
        assert!(build_err(base().conflicts("Tone")).contains("itself"));
        assert!(
            build_err(base().standard_window(Some("2.0.0"), Some("1.0.0"))).contains("is empty")
        );
    }

    #[test]
    fn test_rejects_invalid_defaults_and_bounds() {
        let base = || RecordBuilder::new("Limits", "1.0.0").instruction("Limit.");

        let err = build_err(
            base().parameter(
                ParameterDecl::new("style", ParameterType::Enum)
                    .values(["formal", "casual"])
                    .default("pirate"),
            ),
        );
        assert!(err.contains("Invalid default"));
        assert!(err.contains("formal, casual"));

        assert!(
            build_err(
                base().parameter(
                    ParameterDecl::new("n", ParameterType::Number)
                        .bounds(Bounds::range(Some(1.0), Some(5.0)))
                        .default(9)
                )
            )
            .contains("Invalid default")
        );
        assert!(
            build_err(
                base().parameter(
                    ParameterDecl::new("n", ParameterType::Number)
                        .bounds(Bounds::range(Some(5.0), Some(1.0)))
                )
            )
            .contains("above max")
        );
        assert!(
            build_err(
                base().parameter(
                    ParameterDecl::new("flag", ParameterType::Boolean)
                        .bounds(Bounds::length(Some(1), None))
                )
            )
            .contains("only apply")
        );
        assert!(
            build_err(
                base().parameter(ParameterDecl::new("s", ParameterType::String).values(["x"]))
            )
            .contains("not an enum")
        );
    }

    #[test]
    fn test_value_map_keys_checked_against_parameter() {
        let err = build_err(
            RecordBuilder::new("Tone", "1.0.0")
                .parameter(
                    ParameterDecl::new("style", ParameterType::Enum).values(["formal", "casual"]),
                )
                .value_map("style", [("formall", "Typo")]),
        );
        assert!(err.contains("'formall'"));

        let err = build_err(
            RecordBuilder::new("Flag", "1.0.0")
                .parameter(ParameterDecl::new("on", ParameterType::Boolean))
                .value_map("on", [("yes", "...")]),
        );
        assert!(err.contains("'yes'"));
    }

    #[test]
    fn test_array_default_literal() {
        let record = RecordBuilder::new("Focus", "1.0.0")
            .parameter(
                ParameterDecl::new("aspects", ParameterType::Array)
                    .default(vec!["cost", "risk, impact"]),
            )
            .build()
            .unwrap();
        assert_eq!(
            record.parameters[0].default.as_deref(),
            Some("[cost, \"risk, impact\"]")
        );
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let toml = r#"
[decorator]
name = "X"
version = "1.0.0"
colour = "blue"

[template]
instruction = "x"
"#;
        let err = DecoratorRecord::from_toml(toml, origin()).unwrap_err();
        assert!(err.to_string().contains("reasoning.toml"));
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn test_format_template() {
        let template = FormatTemplate::new("Limit to {value} words.").unwrap();
        assert_eq!(template.render("50"), "Limit to 50 words.");
        assert!(FormatTemplate::new("none").is_none());
    }

    #[test]
    fn test_record_format_from_path() {
        assert_eq!(RecordFormat::from_path(Path::new("a/b.toml")), Some(RecordFormat::Toml));
        assert_eq!(RecordFormat::from_path(Path::new("b.json")), Some(RecordFormat::Json));
        assert_eq!(RecordFormat::from_path(Path::new("README.md")), None);
    }
}
