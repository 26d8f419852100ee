use rand::distr::Distribution as _;
use rand::{Rng, RngCore};
use statrs::distribution::Binomial;

use crate::config::ModelType;
use crate::error::{PopsError, Result};
use crate::geometry::SuitableCellSet;
use crate::raster::Raster;
use crate::ring::RasterRing;

/// Per-species host state: susceptible/exposed-cohort/infected/resistant/
/// mortality-cohort/died rasters plus the suitable-cell index.
///
/// All mutations preserve `total_hosts = susceptible + infected + sum(exposed)
/// + resistant` except [`HostPool::apply_mortality_at`], which transfers to
/// `died`.
#[derive(Debug, Clone)]
pub struct HostPool {
    model_type: ModelType,
    rows: usize,
    cols: usize,
    susceptible: Raster<i64>,
    infected: Raster<i64>,
    resistant: Raster<i64>,
    died: Raster<i64>,
    exposed: RasterRing<i64>,
    mortality_tracker: RasterRing<i64>,
    suitable_cells: SuitableCellSet,
    /// Relative weight used by `MultiHostPool` when routing dispersers
    /// between co-located host species.
    pub susceptibility: f64,
}

impl HostPool {
    pub fn new(
        model_type: ModelType,
        total_hosts: Raster<i64>,
        infected: Raster<i64>,
        mortality_time_lag: usize,
        susceptibility: f64,
    ) -> Result<Self> {
        if !total_hosts.same_shape(&infected) {
            return Err(PopsError::ShapeMismatch(
                "total_hosts and infected rasters must share shape".to_string(),
            ));
        }
        let rows = total_hosts.rows();
        let cols = total_hosts.cols();
        let mut susceptible = Raster::new(rows, cols, 0i64);
        for row in 0..rows {
            for col in 0..cols {
                susceptible.set(row, col, total_hosts.get(row, col) - infected.get(row, col));
            }
        }
        let suitable_cells =
            SuitableCellSet::from_predicate(rows, cols, |r, c| total_hosts.get(r, c) > 0);

        Ok(Self {
            model_type,
            rows,
            cols,
            susceptible,
            infected,
            resistant: Raster::new(rows, cols, 0i64),
            died: Raster::new(rows, cols, 0i64),
            exposed: RasterRing::new(model_type.exposed_ring_length(), rows, cols),
            mortality_tracker: RasterRing::new(mortality_time_lag + 1, rows, cols),
            suitable_cells,
            susceptibility,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }
    pub fn suitable_cells(&self) -> &SuitableCellSet {
        &self.suitable_cells
    }
    pub fn susceptible_at(&self, row: usize, col: usize) -> i64 {
        self.susceptible.get(row, col)
    }
    pub fn infected_at(&self, row: usize, col: usize) -> i64 {
        self.infected.get(row, col)
    }
    pub fn resistant_at(&self, row: usize, col: usize) -> i64 {
        self.resistant.get(row, col)
    }
    pub fn died_at(&self, row: usize, col: usize) -> i64 {
        self.died.get(row, col)
    }

    pub fn exposed_at(&self, row: usize, col: usize) -> i64 {
        self.exposed.iter().map(|cohort| cohort.get(row, col)).sum()
    }

    /// Clone of the full `infected` raster, for callers that need to
    /// combine counts across host species (e.g. spread-rate and
    /// quarantine-escape snapshots).
    pub fn infected_raster(&self) -> Raster<i64> {
        self.infected.clone()
    }

    pub fn total_hosts_at(&self, row: usize, col: usize) -> i64 {
        self.susceptible_at(row, col) + self.infected_at(row, col) + self.exposed_at(row, col) + self.resistant_at(row, col)
    }

    /// `susceptible / total_population`, optionally scaled by a weather
    /// coefficient.
    pub fn establishment_probability_at(&self, row: usize, col: usize, total_population: f64, weather_coefficient: Option<f64>) -> f64 {
        if total_population <= 0.0 {
            return 0.0;
        }
        let base = self.susceptible_at(row, col) as f64 / total_population;
        match weather_coefficient {
            Some(w) => base * w,
            None => base,
        }
    }

    /// SI: increments `infected` and the newest mortality-tracker cohort.
    /// SEI: increments the newest exposed cohort (mortality tracking starts
    /// later, when [`HostPool::step_forward`] promotes the cohort into
    /// `infected`).
    pub fn add_disperser_at(&mut self, row: usize, col: usize) {
        match self.model_type {
            ModelType::Si => {
                let v = self.infected.get(row, col);
                self.infected.set(row, col, v + 1);
                let tracker = self.mortality_tracker.newest_mut();
                let t = tracker.get(row, col);
                tracker.set(row, col, t + 1);
            }
            ModelType::Sei { .. } => {
                let cohort = self.exposed.newest_mut();
                let v = cohort.get(row, col);
                cohort.set(row, col, v + 1);
            }
        }
    }

    /// Draws a uniform and compares it to `establishment_probability`
    /// (stochastic mode) or to `1 - deterministic_probability`
    /// (deterministic mode); on success, transitions one susceptible host
    /// the same way [`HostPool::add_disperser_at`] would and decrements
    /// `susceptible`. Returns 1 on success, 0 otherwise.
    pub fn disperser_to(
        &mut self,
        row: usize,
        col: usize,
        establishment_probability: f64,
        stochastic: bool,
        deterministic_probability: f64,
        rng: &mut dyn RngCore,
    ) -> i64 {
        if self.susceptible_at(row, col) <= 0 {
            return 0;
        }
        let success = if stochastic {
            let u: f64 = rng.random_range(0.0..1.0);
            u < establishment_probability
        } else {
            establishment_probability >= 1.0 - deterministic_probability
        };
        if !success {
            return 0;
        }
        let s = self.susceptible.get(row, col);
        self.susceptible.set(row, col, s - 1);
        self.add_disperser_at(row, col);
        1
    }

    /// Unconditionally establishes one disperser at the cell (no
    /// establishment-probability draw — the caller already ran its own
    /// acceptance test), decrementing `susceptible`. Returns 1 on success,
    /// 0 if no susceptible hosts remain.
    pub fn establish_unconditionally_at(&mut self, row: usize, col: usize) -> i64 {
        if self.susceptible_at(row, col) <= 0 {
            return 0;
        }
        let s = self.susceptible.get(row, col);
        self.susceptible.set(row, col, s - 1);
        self.add_disperser_at(row, col);
        1
    }

    /// Promotes the oldest exposed cohort into `infected` (newly promoted
    /// hosts also enter the newest mortality-tracker cohort), rotates the
    /// exposed ring, and rotates the mortality-tracker ring.
    pub fn step_forward(&mut self) {
        if matches!(self.model_type, ModelType::Sei { .. }) {
            let promoted = self.exposed.rotate();
            self.infected = &self.infected + &promoted;
            let tracker = self.mortality_tracker.newest_mut();
            *tracker = &*tracker + &promoted;
        }
        self.mortality_tracker.rotate();
    }

    /// Mutable access to the newest mortality-tracker cohort, incremented
    /// by actions that add newly-infected hosts to the age-tracking ring.
    pub fn mortality_tracker_newest_mut(&mut self) -> &mut Raster<i64> {
        self.mortality_tracker.newest_mut()
    }

    /// Sums across every mortality-tracker cohort: the oldest cohort (which
    /// has aged the full tracked lag) transfers in full, every younger
    /// cohort transfers `mortality_rate` of its count. The remainder stays
    /// in its cohort to continue aging. Returns the total moved to `died`.
    pub fn apply_mortality_at(&mut self, row: usize, col: usize, mortality_rate: f64) -> i64 {
        let mut total_removed = 0i64;
        for age in 0..self.mortality_tracker.len() {
            let raw = self.mortality_tracker.at(age).get(row, col);
            if raw == 0 {
                continue;
            }
            let removed = if age == 0 {
                raw
            } else {
                (mortality_rate * raw as f64).round() as i64
            };
            if removed == 0 {
                continue;
            }
            let remaining = raw - removed;
            self.mortality_tracker.at_mut(age).set(row, col, remaining);
            total_removed += removed;
        }
        if total_removed > 0 {
            let infected = self.infected.get(row, col);
            self.infected.set(row, col, (infected - total_removed).max(0));
            let died = self.died.get(row, col);
            self.died.set(row, col, died + total_removed);
        }
        total_removed
    }

    /// Moves `intensity * susceptible` into `resistant`; infected and
    /// exposed cohorts are split into resistant/remaining via a binomial
    /// draw with `p = intensity`.
    pub fn apply_treatment_at(&mut self, row: usize, col: usize, intensity: f64, rng: &mut dyn RngCore) -> Result<()> {
        let intensity = intensity.clamp(0.0, 1.0);

        let s = self.susceptible.get(row, col);
        let s_moved = (intensity * s as f64).round() as i64;
        self.susceptible.set(row, col, s - s_moved);

        let inf = self.infected.get(row, col);
        let inf_moved = binomial_draw(inf, intensity, rng)?;
        self.infected.set(row, col, inf - inf_moved);

        let mut exposed_moved_total = 0i64;
        for age in 0..self.exposed.len() {
            let raw = self.exposed.at(age).get(row, col);
            let moved = binomial_draw(raw, intensity, rng)?;
            self.exposed.at_mut(age).set(row, col, raw - moved);
            exposed_moved_total += moved;
        }

        let r = self.resistant.get(row, col);
        self.resistant.set(row, col, r + s_moved + inf_moved + exposed_moved_total);
        Ok(())
    }

    /// Returns all resistant hosts at the cell back to susceptible.
    pub fn end_treatment_at(&mut self, row: usize, col: usize) {
        let r = self.resistant.get(row, col);
        if r == 0 {
            return;
        }
        self.resistant.set(row, col, 0);
        let s = self.susceptible.get(row, col);
        self.susceptible.set(row, col, s + r);
    }

    /// Clears infected and every exposed cohort at the cell back into
    /// susceptible (used by the lethal-temperature action).
    pub fn remove_all_infected_at(&mut self, row: usize, col: usize) {
        let mut returned = self.infected.get(row, col);
        self.infected.set(row, col, 0);
        for age in 0..self.exposed.len() {
            let raw = self.exposed.at(age).get(row, col);
            if raw > 0 {
                returned += raw;
                self.exposed.at_mut(age).set(row, col, 0);
            }
        }
        let s = self.susceptible.get(row, col);
        self.susceptible.set(row, col, s + returned);
    }

    /// Moves `count` hosts from infected to susceptible (clamped to the
    /// cell's current infected count), the source-side half of the
    /// overpopulation-movement transfer.
    pub fn move_infected_to_susceptible_at(&mut self, row: usize, col: usize, count: i64) {
        let count = count.clamp(0, self.infected.get(row, col));
        if count == 0 {
            return;
        }
        let inf = self.infected.get(row, col);
        self.infected.set(row, col, inf - count);
        let s = self.susceptible.get(row, col);
        self.susceptible.set(row, col, s + count);
    }

    /// Moves `count` hosts from susceptible to infected (clamped to the
    /// cell's current susceptible count), the target-side half of the
    /// overpopulation-movement transfer.
    pub fn move_susceptible_to_infected_at(&mut self, row: usize, col: usize, count: i64) {
        let count = count.clamp(0, self.susceptible.get(row, col));
        if count == 0 {
            return;
        }
        let s = self.susceptible.get(row, col);
        self.susceptible.set(row, col, s - count);
        let inf = self.infected.get(row, col);
        self.infected.set(row, col, inf + count);
    }

    /// Keeps `survival_rate * infected` infected, moving the rest back to
    /// susceptible; exposed and mortality-tracker cohorts are split with a
    /// binomial draw at `p = survival_rate`.
    pub fn remove_percentage_at(&mut self, row: usize, col: usize, survival_rate: f64, rng: &mut dyn RngCore) -> Result<()> {
        let survival_rate = survival_rate.clamp(0.0, 1.0);

        let inf = self.infected.get(row, col);
        let surviving_inf = binomial_draw(inf, survival_rate, rng)?;
        let returned = inf - surviving_inf;
        self.infected.set(row, col, surviving_inf);

        let mut total_returned = returned;
        for age in 0..self.exposed.len() {
            let raw = self.exposed.at(age).get(row, col);
            let surviving = binomial_draw(raw, survival_rate, rng)?;
            self.exposed.at_mut(age).set(row, col, surviving);
            total_returned += raw - surviving;
        }
        for age in 0..self.mortality_tracker.len() {
            let raw = self.mortality_tracker.at(age).get(row, col);
            let surviving = binomial_draw(raw, survival_rate, rng)?;
            self.mortality_tracker.at_mut(age).set(row, col, surviving);
        }

        let s = self.susceptible.get(row, col);
        self.susceptible.set(row, col, s + total_returned);
        Ok(())
    }
}

/// Draws a `Binomial(n, p)` sample. `n <= 0` always returns 0 without
/// drawing; `p` is clamped to `[0, 1]` to tolerate float drift at the
/// boundary.
fn binomial_draw(n: i64, p: f64, rng: &mut dyn RngCore) -> Result<i64> {
    if n <= 0 {
        return Ok(0);
    }
    let p = p.clamp(0.0, 1.0);
    let dist = Binomial::new(p, n as u64)
        .map_err(|e| PopsError::InvalidArgument(format!("invalid binomial parameters: {e}")))?;
    Ok(dist.sample(rng) as i64)
}
