use super::Point;

/// A step length that strictly decreases the merit function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Descent {
    /// The step length.
    pub step: f64,

    /// The merit value at `step`, strictly less than `initial`.
    pub value: f64,

    /// The merit value at zero.
    pub initial: f64,
}

impl Descent {
    /// The point at zero.
    #[must_use]
    pub fn start(&self) -> Point {
        Point::new(0.0, self.initial)
    }

    /// The point at the descent step.
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.step, self.value)
    }
}

/// Three points with the middle no worse than either end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triple {
    pub a: Point,
    pub b: Point,
    pub c: Point,
}
