use crate::geometry::BoundingBox;
use crate::raster::Raster;
use crate::statistics::{average_spread_rate, infection_boundary, spread_rate};

/// Snapshots the infection bounding box at each scheduled step and derives
/// a per-direction spread rate against the previous snapshot.
pub struct SpreadRateAction {
    ew_res: f64,
    ns_res: f64,
    years_per_step: f64,
    previous: Option<BoundingBox>,
    history: Vec<(f64, f64, f64, f64)>,
}

impl SpreadRateAction {
    pub fn new(ew_res: f64, ns_res: f64, years_per_step: f64) -> Self {
        Self {
            ew_res,
            ns_res,
            years_per_step,
            previous: None,
            history: Vec::new(),
        }
    }

    /// Returns NaN in every direction on the first call (no previous
    /// snapshot to compare against).
    pub fn snapshot(&mut self, infected: &Raster<i64>) -> (f64, f64, f64, f64) {
        let current = infection_boundary(infected);
        let rate = match self.previous {
            Some(previous) => spread_rate(previous, current, self.ew_res, self.ns_res, self.years_per_step),
            None => (f64::NAN, f64::NAN, f64::NAN, f64::NAN),
        };
        self.previous = Some(current);
        self.history.push(rate);
        rate
    }

    pub fn history(&self) -> &[(f64, f64, f64, f64)] {
        &self.history
    }

    pub fn average(&self) -> (f64, f64, f64, f64) {
        average_spread_rate(&self.history)
    }
}
