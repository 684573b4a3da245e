/// A step length with its merit value.
///
/// Infeasible trials carry a value of `+∞`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// The step length.
    pub x: f64,

    /// The merit value at `x`.
    pub value: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub fn new(x: f64, value: f64) -> Self {
        Self { x, value }
    }
}
