use invert_core::Observer;

use crate::traits::{HasIteration, HasObjective};

/// One observed iterate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub iteration: usize,
    pub objective: f64,
    pub step_length: Option<f64>,
}

/// Records the objective at every observed event.
///
/// Read the records back through the solver's `observer()` accessor, or
/// recover the history with `into_parts()` once the solver is done.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: Vec<Record>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The objective values in the order they were observed.
    pub fn objectives(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|record| record.objective)
    }

    /// The most recently observed record.
    #[must_use]
    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }

    /// Returns `true` if no observed objective exceeded the one before it.
    #[must_use]
    pub fn is_monotone(&self) -> bool {
        self.records
            .windows(2)
            .all(|pair| pair[1].objective <= pair[0].objective)
    }
}

impl<E, A> Observer<E, A> for History
where
    E: HasObjective + HasIteration,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self.records.push(Record {
            iteration: event.iteration(),
            objective: event.objective(),
            step_length: event.step_length(),
        });
        None
    }
}
