use super::{Config, Error, Point, Solution, Status, Triple};

/// The inverse golden ratio: 1/φ
///
/// This equals φ - 1 due to the golden ratio's unique property.
const INV_PHI: f64 = super::PHI - 1.0;

/// Golden section interval.
///
/// Maintains the outer interval [left, right] and two interior points
/// positioned according to the golden ratio.
#[derive(Debug, Clone, Copy)]
struct Interval {
    left: f64,
    right: f64,
    inner_left: f64,
    inner_right: f64,
}

impl Interval {
    fn new(a: f64, b: f64) -> Self {
        let (left, right) = if a <= b { (a, b) } else { (b, a) };
        let width = right - left;
        Self {
            left,
            right,
            inner_left: left + (1.0 - INV_PHI) * width,
            inner_right: left + INV_PHI * width,
        }
    }

    fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Shrinks to `[left, inner_right]`; the old `inner_left` becomes `inner_right`.
    fn shrink_right(&mut self) {
        self.right = self.inner_right;
        self.inner_right = self.inner_left;
        self.inner_left = self.left + (1.0 - INV_PHI) * self.width();
    }

    /// Shrinks to `[inner_left, right]`; the old `inner_right` becomes `inner_left`.
    fn shrink_left(&mut self) {
        self.left = self.inner_left;
        self.inner_left = self.inner_right;
        self.inner_right = self.left + INV_PHI * self.width();
    }
}

/// Golden section search state over a bracketing triple.
pub(super) struct Search {
    interval: Interval,
    left: Point,
    right: Point,
    best: Point,
}

impl Search {
    /// Evaluates both interior points of the triple's outer interval.
    ///
    /// The best point is seeded with the triple's middle point.
    pub(super) fn new<F>(triple: &Triple, eval: &mut F) -> Result<Self, Error>
    where
        F: FnMut(f64) -> Result<Point, Error>,
    {
        let interval = Interval::new(triple.a.x, triple.c.x);
        let left = eval(interval.inner_left)?;
        let right = eval(interval.inner_right)?;

        let mut search = Self {
            interval,
            left,
            right,
            best: triple.b,
        };
        search.track(left);
        search.track(right);
        Ok(search)
    }

    /// Shrinks toward the better interior point and evaluates the new one.
    pub(super) fn shrink<F>(&mut self, eval: &mut F) -> Result<(), Error>
    where
        F: FnMut(f64) -> Result<Point, Error>,
    {
        let point = if self.left.value <= self.right.value {
            self.interval.shrink_right();
            let point = eval(self.interval.inner_left)?;
            self.right = self.left;
            self.left = point;
            point
        } else {
            self.interval.shrink_left();
            let point = eval(self.interval.inner_right)?;
            self.left = self.right;
            self.right = point;
            point
        };
        self.track(point);
        Ok(())
    }

    fn track(&mut self, point: Point) {
        if point.value < self.best.value {
            self.best = point;
        }
    }

    pub(super) fn is_converged(&self, config: &Config) -> bool {
        let gap = (self.interval.inner_right - self.interval.inner_left).abs();
        let mid = 0.5 * (self.interval.inner_left + self.interval.inner_right);
        gap <= config.x_abs_tol + config.x_rel_tol * mid.abs()
    }

    pub(super) fn into_solution(self, status: Status, iters: usize) -> Solution {
        Solution {
            status,
            x: self.best.x,
            objective: self.best.value,
            iters,
        }
    }
}
