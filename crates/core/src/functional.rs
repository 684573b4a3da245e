use thiserror::Error;

use crate::{Field, Operator};

/// Errors that can occur when constructing a functional.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum FunctionalError {
    #[error("{operator} is {found:?}, expected {expected:?}")]
    Shape {
        operator: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("regularization strength must be finite and non-negative, got {0}")]
    Strength(f64),
}

fn check_square(operator: &'static str, matrix: &Operator, n: usize) -> Result<(), FunctionalError> {
    let found = matrix.shape();
    if found == (n, n) {
        Ok(())
    } else {
        Err(FunctionalError::Shape {
            operator,
            expected: (n, n),
            found,
        })
    }
}

/// A twice-differentiable scalar functional of a single field.
///
/// The objective of an inverse problem is a functional of the state and the
/// regularization is a functional of the parameter. Gradients are returned as
/// assembled covectors (the derivative applied to each basis function), and
/// Hessians as assembled bilinear forms.
pub trait Functional {
    /// Evaluates the functional.
    fn value(&self, field: &Field) -> f64;

    /// Assembles the first derivative.
    fn gradient(&self, field: &Field) -> Field;

    /// Assembles the second derivative.
    fn hessian(&self, field: &Field) -> Operator;
}

impl<F: Functional + ?Sized> Functional for &F {
    fn value(&self, field: &Field) -> f64 {
        (**self).value(field)
    }

    fn gradient(&self, field: &Field) -> Field {
        (**self).gradient(field)
    }

    fn hessian(&self, field: &Field) -> Operator {
        (**self).hessian(field)
    }
}

impl<F: Functional + ?Sized> Functional for Box<F> {
    fn value(&self, field: &Field) -> f64 {
        (**self).value(field)
    }

    fn gradient(&self, field: &Field) -> Field {
        (**self).gradient(field)
    }

    fn hessian(&self, field: &Field) -> Operator {
        (**self).hessian(field)
    }
}

/// Weighted least-squares misfit against observed data.
///
/// `E(u) = ½ (u − u_obs)ᵀ W (u − u_obs)` with a symmetric weight `W`, which
/// usually combines the mass matrix of the state space with the inverse
/// variance of the measurements.
#[derive(Debug, Clone, PartialEq)]
pub struct Misfit {
    observed: Field,
    weight: Operator,
}

impl Misfit {
    /// Creates a misfit with identity weight.
    #[must_use]
    pub fn new(observed: Field) -> Self {
        let n = observed.len();
        Self {
            observed,
            weight: Operator::identity(n, n),
        }
    }

    /// Returns the misfit with the given symmetric weight.
    ///
    /// # Errors
    ///
    /// Returns an error if `weight` is not square with the dimension of the
    /// observations.
    pub fn with_weight(mut self, weight: Operator) -> Result<Self, FunctionalError> {
        check_square("misfit weight", &weight, self.observed.len())?;
        self.weight = weight;
        Ok(self)
    }

    /// The observed data.
    #[must_use]
    pub fn observed(&self) -> &Field {
        &self.observed
    }
}

impl Functional for Misfit {
    fn value(&self, field: &Field) -> f64 {
        let r = field - &self.observed;
        0.5 * r.dot(&(&self.weight * &r))
    }

    fn gradient(&self, field: &Field) -> Field {
        &self.weight * (field - &self.observed)
    }

    fn hessian(&self, _field: &Field) -> Operator {
        self.weight.clone()
    }
}

/// Tikhonov regularization about a reference field.
///
/// `R(p) = ½ α (p − p₀)ᵀ K (p − p₀)`, where `K` is a symmetric positive
/// semi-definite operator: the mass matrix penalizes magnitude, a stiffness
/// matrix penalizes roughness.
#[derive(Debug, Clone, PartialEq)]
pub struct Tikhonov {
    strength: f64,
    reference: Field,
    operator: Operator,
}

impl Tikhonov {
    /// Creates a regularization of the given strength about `reference`.
    ///
    /// # Errors
    ///
    /// Returns an error if `strength` is negative or not finite, or if
    /// `operator` is not square with the dimension of `reference`.
    pub fn new(strength: f64, reference: Field, operator: Operator) -> Result<Self, FunctionalError> {
        if !strength.is_finite() || strength < 0.0 {
            return Err(FunctionalError::Strength(strength));
        }
        check_square("regularization operator", &operator, reference.len())?;
        Ok(Self {
            strength,
            reference,
            operator,
        })
    }

    /// The penalty strength `α`.
    #[must_use]
    pub fn strength(&self) -> f64 {
        self.strength
    }
}

impl Functional for Tikhonov {
    fn value(&self, field: &Field) -> f64 {
        let d = field - &self.reference;
        0.5 * self.strength * d.dot(&(&self.operator * &d))
    }

    fn gradient(&self, field: &Field) -> Field {
        (&self.operator * (field - &self.reference)) * self.strength
    }

    fn hessian(&self, _field: &Field) -> Operator {
        &self.operator * self.strength
    }
}

/// The zero functional, for problems without regularization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zero;

impl Functional for Zero {
    fn value(&self, _field: &Field) -> f64 {
        0.0
    }

    fn gradient(&self, field: &Field) -> Field {
        Field::zeros(field.len())
    }

    fn hessian(&self, field: &Field) -> Operator {
        Operator::zeros(field.len(), field.len())
    }
}
