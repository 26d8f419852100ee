use crate::date::{CalendarUnit, Date};
use crate::error::{PopsError, Result};

/// Which action kind a cadence governs. Each has its own schedule; a step
/// may be active for several action kinds at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    LethalTemperature,
    SurvivalRate,
    TreatmentApply,
    TreatmentEnd,
    Spread,
    Overpopulation,
    Mortality,
    HostStepForward,
    SpreadRateSnapshot,
    QuarantineSnapshot,
}

/// A cadence: fire every `count` calendar `unit`s, starting from the
/// schedule's start date.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    pub unit: CalendarUnit,
    pub count: u32,
}

impl Cadence {
    pub fn new(unit: CalendarUnit, count: u32) -> Result<Self> {
        if count == 0 {
            return Err(PopsError::InvalidArgument(
                "cadence count must be >= 1".to_string(),
            ));
        }
        Ok(Self { unit, count })
    }
}

/// Builds the ordered step list from a start/end date, and answers whether
/// a given action kind is active at a given step.
///
/// Grounded in the fixed tick-frequency dispatch the rest of this crate's
/// scheduler lineage uses: each action kind has its own cadence, and
/// `scheduled` is purely a membership test against the precomputed step
/// dates for that cadence.
#[derive(Debug, Clone)]
pub struct Schedule {
    steps: Vec<Date>,
    cadences: Vec<(ActionKind, Cadence)>,
}

impl Schedule {
    /// `steps` is every day from `start` to `end` inclusive; a cadence is
    /// "scheduled" on a step date that is an exact multiple of its `count`
    /// `unit`s past `start`.
    pub fn new(start: Date, end: Date) -> Result<Self> {
        if end < start {
            return Err(PopsError::InvalidArgument(format!(
                "schedule end {end} precedes start {start}"
            )));
        }
        let mut steps = Vec::new();
        let mut current = start;
        loop {
            steps.push(current);
            if current == end {
                break;
            }
            current = current.increased_by_days(1);
        }
        Ok(Self {
            steps,
            cadences: Vec::new(),
        })
    }

    pub fn start(&self) -> Date {
        self.steps[0]
    }

    pub fn end(&self) -> Date {
        *self.steps.last().expect("schedule always has at least one step")
    }

    pub fn steps(&self) -> &[Date] {
        &self.steps
    }

    pub fn set_cadence(&mut self, kind: ActionKind, cadence: Cadence) {
        self.cadences.retain(|(k, _)| *k != kind);
        self.cadences.push((kind, cadence));
    }

    /// Whether `kind` is active on `step`. An action with no registered
    /// cadence is never scheduled.
    pub fn scheduled(&self, step: Date, kind: ActionKind) -> bool {
        let Some((_, cadence)) = self.cadences.iter().find(|(k, _)| *k == kind) else {
            return false;
        };
        self.is_on_cadence(step, *cadence)
    }

    fn is_on_cadence(&self, step: Date, cadence: Cadence) -> bool {
        let start = self.start();
        if step < start {
            return false;
        }
        let mut current = start;
        loop {
            if current == step {
                return true;
            }
            if current > step {
                return false;
            }
            current = current.increased_by(cadence.unit, cadence.count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::new(y, m, d).unwrap()
    }

    #[test]
    fn rejects_end_before_start() {
        assert!(Schedule::new(date(2020, 6, 1), date(2020, 1, 1)).is_err());
    }

    #[test]
    fn steps_span_start_to_end_inclusive() {
        let schedule = Schedule::new(date(2020, 1, 1), date(2020, 1, 5)).unwrap();
        assert_eq!(schedule.steps().len(), 5);
        assert_eq!(schedule.start(), date(2020, 1, 1));
        assert_eq!(schedule.end(), date(2020, 1, 5));
    }

    #[test]
    fn daily_cadence_fires_every_step() {
        let mut schedule = Schedule::new(date(2020, 1, 1), date(2020, 1, 10)).unwrap();
        schedule.set_cadence(ActionKind::Spread, Cadence::new(CalendarUnit::Day, 1).unwrap());
        assert!(schedule.scheduled(date(2020, 1, 3), ActionKind::Spread));
        assert!(schedule.scheduled(date(2020, 1, 10), ActionKind::Spread));
    }

    #[test]
    fn weekly_cadence_skips_intermediate_days() {
        let mut schedule = Schedule::new(date(2020, 1, 1), date(2020, 2, 1)).unwrap();
        schedule.set_cadence(
            ActionKind::SpreadRateSnapshot,
            Cadence::new(CalendarUnit::Week, 1).unwrap(),
        );
        assert!(schedule.scheduled(date(2020, 1, 1), ActionKind::SpreadRateSnapshot));
        assert!(schedule.scheduled(date(2020, 1, 8), ActionKind::SpreadRateSnapshot));
        assert!(!schedule.scheduled(date(2020, 1, 4), ActionKind::SpreadRateSnapshot));
    }

    #[test]
    fn monthly_cadence_respects_month_boundaries() {
        let mut schedule = Schedule::new(date(2020, 1, 15), date(2020, 6, 15)).unwrap();
        schedule.set_cadence(
            ActionKind::TreatmentApply,
            Cadence::new(CalendarUnit::Month, 1).unwrap(),
        );
        assert!(schedule.scheduled(date(2020, 3, 15), ActionKind::TreatmentApply));
        assert!(!schedule.scheduled(date(2020, 3, 16), ActionKind::TreatmentApply));
    }

    #[test]
    fn unregistered_action_is_never_scheduled() {
        let schedule = Schedule::new(date(2020, 1, 1), date(2020, 1, 2)).unwrap();
        assert!(!schedule.scheduled(date(2020, 1, 1), ActionKind::Mortality));
    }

    #[test]
    fn zero_count_cadence_is_rejected() {
        assert!(Cadence::new(CalendarUnit::Day, 0).is_err());
    }
}
