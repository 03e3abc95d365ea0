// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Static self-description of a region implementation type.
//!
//! A [`Spec`] lists the parameters, inputs and outputs a region type exposes.
//! It is built once per type, validated, and then shared read-only between
//! every region of that type.

use neurograph_structures::{BasicType, ParameterMap, ParameterValue};
use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, NetworkResult};

/// When a parameter may be supplied or changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    /// Reported by the implementation, never supplied by callers
    ReadOnly,
    /// Supplied at creation and changeable at runtime
    ReadWrite,
    /// Supplied at creation only
    CreateOnly,
}

/// Declared parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub description: String,
    pub data_type: BasicType,
    /// Number of elements; 0 = variable length (a string when `data_type` is Byte)
    pub count: usize,
    /// Human readable constraints, e.g. "1..=1024"
    pub constraints: String,
    pub access: AccessMode,
    pub default: Option<ParameterValue>,
}

impl ParameterSpec {
    pub fn new(data_type: BasicType, access: AccessMode) -> Self {
        Self {
            description: String::new(),
            data_type,
            count: 1,
            constraints: String::new(),
            access,
            default: None,
        }
    }

    /// A variable length Byte parameter, read as a string
    pub fn string(access: AccessMode) -> Self {
        Self::new(BasicType::Byte, access).count(0)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = constraints.into();
        self
    }

    pub fn default_value(mut self, value: impl Into<ParameterValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn is_string(&self) -> bool {
        self.data_type == BasicType::Byte && self.count == 0
    }

    fn expected(&self) -> String {
        match self.count {
            _ if self.is_string() => "string".to_string(),
            0 => format!("sequence of {}", self.data_type),
            1 => self.data_type.to_string(),
            n => format!("{} x {}", n, self.data_type),
        }
    }

    /// Convert `value` to the declared type and shape
    pub fn check_value(&self, name: &str, value: &ParameterValue) -> NetworkResult<ParameterValue> {
        let mismatch = || NetworkError::ParameterTypeMismatch {
            name: name.to_string(),
            expected: self.expected(),
            actual: describe_value(value),
        };

        if self.is_string() {
            return match value {
                ParameterValue::String(_) => Ok(value.clone()),
                _ => Err(mismatch()),
            };
        }

        let shape_ok = match (value, self.count) {
            (ParameterValue::String(_), _) => false,
            (ParameterValue::Scalar(_), count) => count <= 1,
            (ParameterValue::Sequence(_), 0) => true,
            (ParameterValue::Sequence(items), count) => items.len() == count && count > 1,
        };
        if !shape_ok {
            return Err(mismatch());
        }
        value.convert_to(self.data_type).ok_or_else(mismatch)
    }
}

fn describe_value(value: &ParameterValue) -> String {
    match value {
        ParameterValue::Scalar(s) => s.basic_type().to_string(),
        ParameterValue::String(_) => "string".to_string(),
        ParameterValue::Sequence(items) => match items.first() {
            Some(first) => format!("{} x {}", items.len(), first.basic_type()),
            None => "empty sequence".to_string(),
        },
    }
}

/// Declared input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub description: String,
    pub data_type: BasicType,
    /// Expected element count; 0 = whatever the links deliver
    pub count: usize,
    pub required: bool,
    pub is_default: bool,
    /// Input is shared by the whole region rather than per node
    pub region_level: bool,
}

impl InputSpec {
    pub fn new(data_type: BasicType) -> Self {
        Self {
            description: String::new(),
            data_type,
            count: 0,
            required: false,
            is_default: false,
            region_level: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_input(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// Declared output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub description: String,
    pub data_type: BasicType,
    /// Element count; 0 = reported by the implementation at initialisation
    pub count: usize,
    pub is_default: bool,
}

impl OutputSpec {
    pub fn new(data_type: BasicType) -> Self {
        Self {
            description: String::new(),
            data_type,
            count: 0,
            is_default: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn default_output(mut self) -> Self {
        self.is_default = true;
        self
    }
}

/// Immutable description of a region type.
///
/// Entries keep their declaration order.
///
/// # Example
/// ```
/// use neurograph_engine::spec::{AccessMode, OutputSpec, ParameterSpec, Spec};
/// use neurograph_structures::BasicType;
///
/// let spec = Spec::builder("Emits a constant")
///     .parameter(
///         "value",
///         ParameterSpec::new(BasicType::Int32, AccessMode::ReadWrite).default_value(0i32),
///     )
///     .output("out", OutputSpec::new(BasicType::Int32).count(4).default_output())
///     .build();
///
/// assert!(spec.validate("Constant").is_ok());
/// assert_eq!(spec.default_output().map(|(name, _)| name), Some("out"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spec {
    pub description: String,
    parameters: Vec<(String, ParameterSpec)>,
    inputs: Vec<(String, InputSpec)>,
    outputs: Vec<(String, OutputSpec)>,
}

impl Spec {
    pub fn builder(description: impl Into<String>) -> SpecBuilder {
        SpecBuilder {
            spec: Spec {
                description: description.into(),
                ..Spec::default()
            },
        }
    }

    pub fn parameters(&self) -> impl Iterator<Item = (&str, &ParameterSpec)> {
        self.parameters.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn inputs(&self) -> impl Iterator<Item = (&str, &InputSpec)> {
        self.inputs.iter().map(|(n, i)| (n.as_str(), i))
    }

    pub fn outputs(&self) -> impl Iterator<Item = (&str, &OutputSpec)> {
        self.outputs.iter().map(|(n, o)| (n.as_str(), o))
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn input(&self, name: &str) -> Option<&InputSpec> {
        self.inputs.iter().find(|(n, _)| n == name).map(|(_, i)| i)
    }

    pub fn output(&self, name: &str) -> Option<&OutputSpec> {
        self.outputs.iter().find(|(n, _)| n == name).map(|(_, o)| o)
    }

    pub fn default_input(&self) -> Option<(&str, &InputSpec)> {
        self.inputs().find(|(_, i)| i.is_default)
    }

    pub fn default_output(&self) -> Option<(&str, &OutputSpec)> {
        self.outputs().find(|(_, o)| o.is_default)
    }

    /// Structural checks: unique names, at most one default input and output,
    /// and defaults that fit their parameter declaration.
    pub fn validate(&self, region_type: &str) -> NetworkResult<()> {
        let invalid = |reason: String| NetworkError::InvalidSpec {
            region_type: region_type.to_string(),
            reason,
        };

        check_unique(self.parameters.iter().map(|(n, _)| n), "parameter").map_err(invalid)?;
        check_unique(self.inputs.iter().map(|(n, _)| n), "input").map_err(invalid)?;
        check_unique(self.outputs.iter().map(|(n, _)| n), "output").map_err(invalid)?;

        if self.inputs.iter().filter(|(_, i)| i.is_default).count() > 1 {
            return Err(invalid("more than one default input".to_string()));
        }
        if self.outputs.iter().filter(|(_, o)| o.is_default).count() > 1 {
            return Err(invalid("more than one default output".to_string()));
        }

        for (name, param) in &self.parameters {
            if let Some(default) = &param.default {
                param
                    .check_value(name, default)
                    .map_err(|e| invalid(format!("bad default for '{}': {}", name, e)))?;
            }
        }
        Ok(())
    }

    /// Validate caller supplied parameters and fill in defaults.
    ///
    /// Unknown names and read-only parameters are rejected, values are
    /// converted to their declared type, and every non read-only parameter
    /// without a default must be present.
    pub fn normalize_parameters(&self, supplied: &ParameterMap) -> NetworkResult<ParameterMap> {
        let mut normalized = ParameterMap::new();

        for (name, value) in supplied.iter() {
            let param = self.parameter(name).ok_or_else(|| NetworkError::InvalidParameter {
                name: name.to_string(),
                reason: "not declared by the region type".to_string(),
            })?;
            if param.access == AccessMode::ReadOnly {
                return Err(NetworkError::InvalidParameter {
                    name: name.to_string(),
                    reason: "read-only parameters cannot be supplied".to_string(),
                });
            }
            normalized.insert(name, param.check_value(name, value)?);
        }

        for (name, param) in self.parameters() {
            if normalized.contains(name) || param.access == AccessMode::ReadOnly {
                continue;
            }
            match &param.default {
                Some(default) => {
                    normalized.insert(name, default.clone());
                }
                None => return Err(NetworkError::MissingParameter(name.to_string())),
            }
        }

        Ok(normalized)
    }
}

fn check_unique<'a>(names: impl Iterator<Item = &'a String>, kind: &str) -> Result<(), String> {
    let mut seen = std::collections::BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(format!("duplicate {} '{}'", kind, name));
        }
    }
    Ok(())
}

/// Builder returned by [`Spec::builder`]
#[derive(Debug, Clone)]
pub struct SpecBuilder {
    spec: Spec,
}

impl SpecBuilder {
    pub fn parameter(mut self, name: impl Into<String>, parameter: ParameterSpec) -> Self {
        self.spec.parameters.push((name.into(), parameter));
        self
    }

    pub fn input(mut self, name: impl Into<String>, input: InputSpec) -> Self {
        self.spec.inputs.push((name.into(), input));
        self
    }

    pub fn output(mut self, name: impl Into<String>, output: OutputSpec) -> Self {
        self.spec.outputs.push((name.into(), output));
        self
    }

    pub fn build(self) -> Spec {
        self.spec
    }
}
