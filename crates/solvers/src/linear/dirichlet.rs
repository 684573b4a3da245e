use invert_core::{Field, Operator};

use super::Error;

/// Homogeneous Dirichlet conditions on a set of degrees of freedom.
///
/// Constrained rows and columns are replaced by the identity and the matching
/// right-hand side entries are zeroed. Eliminating columns as well as rows
/// keeps the constrained system of `Aᵀ` equal to the transpose of the
/// constrained system of `A`, which the adjoint computations rely on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirichletBc {
    dofs: Vec<usize>,
}

impl DirichletBc {
    /// Creates conditions on the given degrees of freedom.
    ///
    /// Duplicates are removed.
    pub fn new(dofs: impl IntoIterator<Item = usize>) -> Self {
        let mut dofs: Vec<usize> = dofs.into_iter().collect();
        dofs.sort_unstable();
        dofs.dedup();
        Self { dofs }
    }

    /// The constrained degrees of freedom in ascending order.
    #[must_use]
    pub fn dofs(&self) -> &[usize] {
        &self.dofs
    }

    /// Returns true if no degree of freedom is constrained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dofs.is_empty()
    }

    /// Returns a constrained copy of the system `matrix · x = rhs`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDof`] if a constrained dof is out of range.
    pub fn apply(&self, matrix: &Operator, rhs: &Field) -> Result<(Operator, Field), Error> {
        let n = rhs.len();
        if let Some(&dof) = self.dofs.iter().find(|&&dof| dof >= n) {
            return Err(Error::InvalidDof { dof, len: n });
        }

        let mut matrix = matrix.clone();
        let mut rhs = rhs.clone();
        for &dof in &self.dofs {
            matrix.row_mut(dof).fill(0.0);
            matrix.column_mut(dof).fill(0.0);
            matrix[(dof, dof)] = 1.0;
            rhs[dof] = 0.0;
        }
        Ok((matrix, rhs))
    }
}
