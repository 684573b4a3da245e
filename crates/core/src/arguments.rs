use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::Field;

/// A value that can be passed to a model by name.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A discretized field.
    Field(Field),

    /// A scalar constant.
    Scalar(f64),
}

impl From<Field> for Arg {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

/// Errors that can occur when looking up a named argument.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("missing argument `{name}`")]
    Missing { name: String },

    #[error("argument `{name}` is not a {expected}")]
    WrongKind { name: String, expected: &'static str },
}

/// Named arguments for a single model call.
///
/// Solvers bind the current state and parameter under the names declared by
/// the [`InverseProblem`](crate::InverseProblem), next to any extra model
/// arguments, the Dirichlet boundary ids, and the quadrature degree chosen at
/// setup. Models look their inputs up by the names they expect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: BTreeMap<String, Arg>,
    dirichlet_ids: BTreeSet<usize>,
    quadrature_degree: Option<usize>,
}

impl Arguments {
    /// Creates an empty argument set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the arguments with `value` bound to `name`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.insert(name, value);
        self
    }

    /// Binds `value` to `name`, returning the previous binding if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Arg>) -> Option<Arg> {
        self.values.insert(name.into(), value.into())
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arg> {
        self.values.get(name)
    }

    /// Returns the field bound to `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is bound to `name` or the value is a scalar.
    pub fn field(&self, name: &str) -> Result<&Field, ArgumentError> {
        match self.values.get(name) {
            Some(Arg::Field(field)) => Ok(field),
            Some(Arg::Scalar(_)) => Err(ArgumentError::WrongKind {
                name: name.to_owned(),
                expected: "field",
            }),
            None => Err(ArgumentError::Missing {
                name: name.to_owned(),
            }),
        }
    }

    /// Returns the scalar bound to `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is bound to `name` or the value is a field.
    pub fn scalar(&self, name: &str) -> Result<f64, ArgumentError> {
        match self.values.get(name) {
            Some(Arg::Scalar(value)) => Ok(*value),
            Some(Arg::Field(_)) => Err(ArgumentError::WrongKind {
                name: name.to_owned(),
                expected: "scalar",
            }),
            None => Err(ArgumentError::Missing {
                name: name.to_owned(),
            }),
        }
    }

    /// Returns the arguments with the given Dirichlet boundary ids.
    #[must_use]
    pub fn with_dirichlet_ids(mut self, ids: BTreeSet<usize>) -> Self {
        self.dirichlet_ids = ids;
        self
    }

    /// Boundary ids where the forward problem imposes Dirichlet conditions.
    #[must_use]
    pub fn dirichlet_ids(&self) -> &BTreeSet<usize> {
        &self.dirichlet_ids
    }

    /// Returns the arguments with a quadrature degree for form assembly.
    #[must_use]
    pub fn with_quadrature_degree(mut self, degree: usize) -> Self {
        self.quadrature_degree = Some(degree);
        self
    }

    /// Quadrature degree requested by the solver, if one has been chosen.
    #[must_use]
    pub fn quadrature_degree(&self) -> Option<usize> {
        self.quadrature_degree
    }
}
