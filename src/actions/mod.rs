pub mod lethal_temperature;
pub mod mortality;
pub mod overpopulation;
pub mod quarantine;
pub mod spread;
pub mod spread_rate;
pub mod survival_rate;
pub mod treatment;

pub use lethal_temperature::LethalTemperatureAction;
pub use mortality::MortalityAction;
pub use overpopulation::OverpopulationMovementAction;
pub use quarantine::{escape_probability_at_step, QuarantineEscapeAction};
pub use spread::SpreadAction;
pub use spread_rate::SpreadRateAction;
pub use survival_rate::SurvivalRateAction;
pub use treatment::PesticideTreatmentAction;
