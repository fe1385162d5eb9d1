//! Worker capability descriptors.
//!
//! A [`WorkerDescriptor`] is the static contract of a worker: which value
//! kinds it consumes and produces, how invasive it is, how many invocations
//! may run at once and which parameters it understands. Descriptors are
//! read-only once registered.

use crate::error::{Result, WorkerError};
use crate::params::{ParameterSpec, Parameters};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use surveyor_core::{Intensity, ParameterValue, ValueKind, WorkerId};

fn default_concurrency() -> u32 {
    1
}

/// Capability metadata for one worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerDescriptor {
    /// Unique worker ID
    pub id: WorkerId,
    /// Short human-readable summary
    #[serde(default)]
    pub description: String,
    /// Kinds this worker may be invoked with
    pub accepts: BTreeSet<ValueKind>,
    /// Kinds this worker may produce (advisory)
    #[serde(default)]
    pub outputs: BTreeSet<ValueKind>,
    /// Invasiveness, consulted by scan policy
    #[serde(default)]
    pub intensity: Intensity,
    /// Maximum simultaneous invocations
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    /// Parameter schema
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

impl WorkerDescriptor {
    /// Create a descriptor accepting the given kinds, with normal intensity and
    /// a concurrency of 1.
    #[must_use]
    pub fn new(id: WorkerId, accepts: impl IntoIterator<Item = ValueKind>) -> Self {
        Self {
            id,
            description: String::new(),
            accepts: accepts.into_iter().collect(),
            outputs: BTreeSet::new(),
            intensity: Intensity::default(),
            concurrency: default_concurrency(),
            parameters: Vec::new(),
        }
    }

    /// Declare the kinds this worker produces.
    #[must_use]
    pub fn produces(mut self, outputs: impl IntoIterator<Item = ValueKind>) -> Self {
        self.outputs.extend(outputs);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the intensity.
    #[must_use]
    pub fn with_intensity(mut self, intensity: Intensity) -> Self {
        self.intensity = intensity;
        self
    }

    /// Set the concurrency limit.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: u32) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Add a parameter to the schema.
    #[must_use]
    pub fn with_parameter(mut self, spec: ParameterSpec) -> Self {
        self.parameters.push(spec);
        self
    }

    /// Whether this worker may be invoked with `kind`.
    #[must_use]
    pub fn accepts_kind(&self, kind: ValueKind) -> bool {
        self.accepts.contains(&kind)
    }

    /// Whether this worker declares `kind` as an output.
    #[must_use]
    pub fn produces_kind(&self, kind: ValueKind) -> bool {
        self.outputs.contains(&kind)
    }

    /// Validate the descriptor.
    ///
    /// # Errors
    /// Returns [`WorkerError::InvalidDescriptor`] if the descriptor accepts no
    /// kinds, has a zero concurrency, repeats a parameter name, or declares a
    /// default whose type does not match the parameter.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| WorkerError::InvalidDescriptor {
            worker_id: self.id.clone(),
            reason,
        };

        if self.accepts.is_empty() {
            return Err(invalid("worker must accept at least one value kind".to_string()));
        }

        if self.concurrency == 0 {
            return Err(invalid("concurrency must be at least 1".to_string()));
        }

        let mut seen = HashSet::new();
        for spec in &self.parameters {
            if spec.name.trim().is_empty() {
                return Err(invalid("parameter names cannot be empty".to_string()));
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(invalid(format!("duplicate parameter '{}'", spec.name)));
            }
            if let Some(default) = &spec.default {
                if spec.kind.coerce(default).is_none() {
                    return Err(invalid(format!(
                        "default for '{}' is a {}, expected {}",
                        spec.name,
                        default.type_name(),
                        spec.kind
                    )));
                }
            }
        }

        Ok(())
    }

    /// Merge configuration overrides with the schema defaults.
    ///
    /// # Errors
    /// - [`WorkerError::UnknownParameter`] if an override is not in the schema
    /// - [`WorkerError::InvalidParameter`] if an override has the wrong type
    /// - [`WorkerError::MissingParameter`] if a required parameter has no value
    pub fn resolve_parameters(
        &self,
        overrides: &BTreeMap<String, ParameterValue>,
    ) -> Result<Parameters> {
        if let Some(unknown) = overrides
            .keys()
            .find(|name| !self.parameters.iter().any(|spec| &spec.name == *name))
        {
            return Err(WorkerError::UnknownParameter {
                worker_id: self.id.clone(),
                parameter: unknown.clone(),
            });
        }

        let mut resolved = BTreeMap::new();
        for spec in &self.parameters {
            let value = match overrides.get(&spec.name) {
                Some(value) => Some(spec.kind.coerce(value).ok_or_else(|| {
                    WorkerError::InvalidParameter {
                        worker_id: self.id.clone(),
                        parameter: spec.name.clone(),
                        reason: format!("expected {}, got {}", spec.kind, value.type_name()),
                    }
                })?),
                None => spec.default.as_ref().and_then(|d| spec.kind.coerce(d)),
            };

            match value {
                Some(value) => {
                    resolved.insert(spec.name.clone(), value);
                }
                None if spec.required => {
                    return Err(WorkerError::MissingParameter {
                        worker_id: self.id.clone(),
                        parameter: spec.name.clone(),
                    });
                }
                None => {}
            }
        }

        Ok(Parameters::from_map(resolved))
    }
}
