//! Hyperparameter search space

use serde::{Deserialize, Serialize};

use crate::optim::hpo::error::{HPOError, Result};

use super::parameter::ParameterDomain;

/// A named parameter in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterSpec {
    /// Parameter name
    pub name: String,
    /// Domain of the encoded coordinate
    pub domain: ParameterDomain,
}

/// Hyperparameter search space
///
/// Parameters keep their declaration order: coordinate `i` of every encoded
/// vector belongs to the `i`-th parameter added.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterSpace {
    specs: Vec<HyperparameterSpec>,
}

impl HyperparameterSpace {
    /// Create an empty search space
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter to the search space
    ///
    /// Re-adding an existing name replaces its domain in place.
    pub fn add(&mut self, name: &str, domain: ParameterDomain) -> Result<()> {
        domain.validate(name)?;
        match self.specs.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.domain = domain,
            None => self.specs.push(HyperparameterSpec { name: name.to_string(), domain }),
        }
        Ok(())
    }

    /// Get a parameter domain
    pub fn get(&self, name: &str) -> Option<&ParameterDomain> {
        self.specs.iter().find(|s| s.name == name).map(|s| &s.domain)
    }

    /// Position of a parameter in the encoded vector
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }

    /// Check if space is empty
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Get number of parameters (the encoded dimension)
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Iterate over parameters in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &HyperparameterSpec> {
        self.specs.iter()
    }

    /// Parameter names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    /// Re-check every domain (for spaces built through deserialization)
    pub fn validate(&self) -> Result<()> {
        if self.specs.is_empty() {
            return Err(HPOError::EmptySpace);
        }
        for spec in &self.specs {
            spec.domain.validate(&spec.name)?;
        }
        Ok(())
    }
}
