use std::collections::HashMap;

use crate::error::{PopsError, Result};
use crate::geometry::EMPTY_BBOX;
use crate::kernel::Direction;
use crate::raster::Raster;
use crate::statistics::infection_boundary;

/// Tracks, per tracked direction, the shortest distance from the
/// infection's current boundary to the quarantine region's boundary, and
/// the first step that distance reaches zero (escape). Only the four
/// cardinal directions are supported.
pub struct QuarantineEscapeAction {
    boundary: (i32, i32, i32, i32),
    directions: Vec<Direction>,
    escaped_at: HashMap<Direction, Option<usize>>,
}

impl QuarantineEscapeAction {
    pub fn new(quarantine: &Raster<i64>, directions: Vec<Direction>) -> Result<Self> {
        for d in &directions {
            if !matches!(d, Direction::N | Direction::S | Direction::E | Direction::W) {
                return Err(PopsError::InvalidArgument(
                    "quarantine directions must be among N, S, E, W".to_string(),
                ));
            }
        }
        let boundary = infection_boundary(quarantine);
        let mut escaped_at = HashMap::new();
        for d in &directions {
            escaped_at.insert(*d, None);
        }
        Ok(Self {
            boundary,
            directions,
            escaped_at,
        })
    }

    /// Per-direction distance to the quarantine boundary this step; NaN for
    /// any direction that has already escaped (or if the infection is
    /// currently empty).
    pub fn snapshot(&mut self, step: usize, infected: &Raster<i64>) -> HashMap<Direction, f64> {
        let infection = infection_boundary(infected);
        let mut result = HashMap::new();
        if infection == EMPTY_BBOX {
            for d in &self.directions {
                result.insert(*d, f64::NAN);
            }
            return result;
        }
        let (q_n, q_s, q_e, q_w) = self.boundary;
        let (i_n, i_s, i_e, i_w) = infection;
        for d in &self.directions {
            if self.escaped_at[d].is_some() {
                result.insert(*d, f64::NAN);
                continue;
            }
            let distance = match d {
                Direction::N => (i_n - q_n) as f64,
                Direction::S => (q_s - i_s) as f64,
                Direction::E => (q_e - i_e) as f64,
                Direction::W => (i_w - q_w) as f64,
                _ => unreachable!("validated to cardinal directions in new()"),
            };
            if distance <= 0.0 {
                self.escaped_at.insert(*d, Some(step));
                result.insert(*d, f64::NAN);
            } else {
                result.insert(*d, distance);
            }
        }
        result
    }

    pub fn escaped_at(&self, direction: Direction) -> Option<usize> {
        self.escaped_at.get(&direction).copied().flatten()
    }

    pub fn has_escaped_by(&self, direction: Direction, step: usize) -> bool {
        self.escaped_at(direction).is_some_and(|s| s <= step)
    }
}

/// Fraction of `escape_steps` (one entry per independent run — the step it
/// escaped, or `None` if it never did within the observed horizon) that
/// have escaped by `step`.
pub fn escape_probability_at_step(escape_steps: &[Option<usize>], step: usize) -> f64 {
    if escape_steps.is_empty() {
        return 0.0;
    }
    let escaped = escape_steps.iter().filter(|s| s.is_some_and(|e| e <= step)).count();
    escaped as f64 / escape_steps.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_diagonal_directions() {
        let region = Raster::from_rows(vec![vec![1, 1], vec![1, 1]]);
        assert!(QuarantineEscapeAction::new(&region, vec![Direction::Ne]).is_err());
    }

    fn square_region() -> Raster<i64> {
        // 5x5 grid, quarantine region occupying rows/cols 1..=3.
        let mut region = Raster::new(5, 5, 0i64);
        for row in 1..=3 {
            for col in 1..=3 {
                region.set(row, col, 1);
            }
        }
        region
    }

    #[test]
    fn records_first_escape_step_and_then_reports_nan() {
        let region = square_region();
        let mut action = QuarantineEscapeAction::new(&region, vec![Direction::N, Direction::S, Direction::E, Direction::W]).unwrap();

        let mut inside = Raster::new(5, 5, 0i64);
        inside.set(2, 2, 1);
        let distances = action.snapshot(0, &inside);
        assert!(distances[&Direction::N] > 0.0);
        assert!(action.escaped_at(Direction::N).is_none());

        let mut escaped_north = Raster::new(5, 5, 0i64);
        escaped_north.set(0, 2, 1);
        let distances = action.snapshot(1, &escaped_north);
        assert!(distances[&Direction::N].is_nan());
        assert_eq!(action.escaped_at(Direction::N), Some(1));
        assert!(!distances[&Direction::S].is_nan());

        let distances = action.snapshot(2, &escaped_north);
        assert!(distances[&Direction::N].is_nan(), "stays escaped once crossed");
    }

    #[test]
    fn escape_probability_rises_after_first_escape() {
        let runs = vec![None, Some(2)];
        assert_eq!(escape_probability_at_step(&runs, 0), 0.0);
        assert_eq!(escape_probability_at_step(&runs, 1), 0.0);
        assert_eq!(escape_probability_at_step(&runs, 2), 0.5);
    }
}
