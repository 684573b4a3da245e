//! Shared models and fixtures for the invert integration tests.

pub mod diffusion {
    //! Steady 1-D diffusion `−(k u′)′ = f` on the unit interval.
    //!
    //! The domain is split into equal cells. The state `u` holds one value per
    //! node and the parameter `m` one log-coefficient per cell, so that
    //! `k = exp(m)` stays positive for any parameter value. Both end nodes
    //! carry homogeneous Dirichlet conditions.

    use invert_core::{ArgumentError, Arguments, Field, ForwardModel, Operator, Outcome};
    use invert_solvers::linear::{self, DirichletBc, SolverParameters};
    use thiserror::Error;

    /// Name the state is bound under.
    pub const STATE: &str = "u";

    /// Name the parameter is bound under.
    pub const PARAMETER: &str = "m";

    /// Name of the scalar source argument.
    pub const SOURCE: &str = "source";

    #[derive(Debug, Error)]
    pub enum DiffusionError {
        #[error(transparent)]
        Argument(#[from] ArgumentError),

        #[error("expected {expected} nodes for {cells} cells, found {found}")]
        Nodes {
            cells: usize,
            expected: usize,
            found: usize,
        },

        #[error("linear solve failed: {0}")]
        Linear(#[from] linear::Error),
    }

    /// Linear finite elements for `−(exp(m) u′)′ = f`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct Diffusion;

    impl Diffusion {
        /// Assembles the stiffness matrix for the log-coefficients `m`.
        #[must_use]
        pub fn stiffness(m: &Field) -> Operator {
            let cells = m.len();
            let h = 1.0 / cells as f64;
            let mut k = Operator::zeros(cells + 1, cells + 1);
            for (e, &log_k) in m.iter().enumerate() {
                let c = log_k.exp() / h;
                k[(e, e)] += c;
                k[(e + 1, e + 1)] += c;
                k[(e, e + 1)] -= c;
                k[(e + 1, e)] -= c;
            }
            k
        }

        fn load(cells: usize, source: f64) -> Field {
            let h = 1.0 / cells as f64;
            let mut b = Field::from_element(cells + 1, source * h);
            b[0] *= 0.5;
            b[cells] *= 0.5;
            b
        }

        fn bc(&self, args: &Arguments) -> DirichletBc {
            DirichletBc::new(self.dirichlet_dofs(args))
        }
    }

    impl ForwardModel for Diffusion {
        type Error = DiffusionError;

        fn solve(&self, args: &Arguments) -> Result<Outcome<Field>, Self::Error> {
            let m = args.field(PARAMETER)?;
            if let Some(bad) = m.iter().find(|log_k| !log_k.exp().is_normal()) {
                return Ok(Outcome::Diverged {
                    reason: format!("coefficient exp({bad}) is not a positive finite number"),
                });
            }

            let k = Self::stiffness(m);
            let b = Self::load(m.len(), args.scalar(SOURCE)?);
            match linear::solve(&k, &b, Some(&self.bc(args)), &SolverParameters::direct()) {
                Ok(u) => Ok(Outcome::Converged(u)),
                Err(linear::Error::Singular) => Ok(Outcome::Diverged {
                    reason: "stiffness matrix is singular".into(),
                }),
                Err(err) => Err(err.into()),
            }
        }

        fn state_jacobian(&self, args: &Arguments) -> Result<Operator, Self::Error> {
            Ok(Self::stiffness(args.field(PARAMETER)?))
        }

        fn parameter_jacobian(&self, args: &Arguments) -> Result<Operator, Self::Error> {
            let m = args.field(PARAMETER)?;
            let u = args.field(STATE)?;
            let cells = m.len();
            if u.len() != cells + 1 {
                return Err(DiffusionError::Nodes {
                    cells,
                    expected: cells + 1,
                    found: u.len(),
                });
            }

            let h = 1.0 / cells as f64;
            let mut jac = Operator::zeros(cells + 1, cells);
            for (e, &log_k) in m.iter().enumerate() {
                let flux = log_k.exp() / h * (u[e] - u[e + 1]);
                jac[(e, e)] = flux;
                jac[(e + 1, e)] = -flux;
            }
            Ok(jac)
        }

        fn quadrature_degree(&self, _args: &Arguments) -> usize {
            1
        }

        fn parameter_mass(&self, parameter: &Field, _args: &Arguments) -> Result<Operator, Self::Error> {
            let cells = parameter.len();
            Ok(Operator::identity(cells, cells) / cells as f64)
        }
    }
}

pub mod fixtures {
    //! Synthetic coefficient recovery problems.

    use std::f64::consts::PI;

    use invert_core::{Arguments, Field, ForwardModel, InverseProblem, Misfit, Operator, Tikhonov};

    use crate::diffusion::{Diffusion, PARAMETER, SOURCE, STATE};

    /// Unit source used by every fixture.
    pub const SOURCE_STRENGTH: f64 = 1.0;

    /// The log-coefficient the synthetic data was generated from.
    #[must_use]
    pub fn true_parameter(cells: usize) -> Field {
        Field::from_fn(cells, |e, _| {
            let x = (e as f64 + 0.5) / cells as f64;
            0.5 * (2.0 * PI * x).sin()
        })
    }

    /// Solves the forward problem for `m` directly, without a solver.
    ///
    /// # Panics
    ///
    /// Panics if the forward solve fails.
    #[must_use]
    pub fn forward(m: &Field) -> Field {
        let cells = m.len();
        let args = Arguments::new()
            .with_dirichlet_ids([0, cells].into())
            .with(PARAMETER, m.clone())
            .with(STATE, Field::zeros(cells + 1))
            .with(SOURCE, SOURCE_STRENGTH);
        Diffusion
            .solve(&args)
            .expect("forward solve runs")
            .converged()
            .expect("forward solve converges")
    }

    /// Recovers [`true_parameter`] from noise-free nodal data, starting at `m = 0`.
    ///
    /// # Panics
    ///
    /// Panics if the problem cannot be assembled.
    #[must_use]
    pub fn coefficient_recovery(cells: usize, strength: f64) -> InverseProblem<Diffusion, Misfit, Tikhonov> {
        starting_at(cells, strength, Field::zeros(cells))
    }

    /// Same as [`coefficient_recovery`], starting from `m0`.
    ///
    /// # Panics
    ///
    /// Panics if the problem cannot be assembled, e.g. for a negative `strength`.
    #[must_use]
    pub fn starting_at(
        cells: usize,
        strength: f64,
        m0: Field,
    ) -> InverseProblem<Diffusion, Misfit, Tikhonov> {
        let h = 1.0 / cells as f64;
        let observed = forward(&true_parameter(cells));
        let misfit = Misfit::new(observed)
            .with_weight(Operator::identity(cells + 1, cells + 1) * h)
            .expect("weight matches the nodes");
        let regularization = Tikhonov::new(
            strength,
            Field::zeros(cells),
            Operator::identity(cells, cells) * h,
        )
        .expect("strength is valid");

        InverseProblem::new(
            Diffusion,
            misfit,
            regularization,
            (STATE, Field::zeros(cells + 1)),
            (PARAMETER, m0),
        )
        .expect("state and parameter names differ")
        .with_model_arg(SOURCE, SOURCE_STRENGTH)
        .expect("source name is free")
        .with_dirichlet_ids([0, cells])
    }
}
