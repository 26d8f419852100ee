use crate::error::{PopsError, Result};
use crate::kernel::Direction;

/// Disease progression model. `Sei`'s `latency_period` is how many
/// scheduled steps a disperser spends in the exposed ring before becoming
/// infectious.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    Si,
    Sei { latency_period: usize },
}

impl ModelType {
    pub fn parse(text: &str, latency_period: usize) -> Result<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "si" => Ok(ModelType::Si),
            "sei" => Ok(ModelType::Sei { latency_period }),
            other => Err(PopsError::InvalidArgument(format!("unknown model type: {other}"))),
        }
    }

    /// Ring length for the exposed cohort buffer: `latency_period + 1` for
    /// SEI, `1` (unused) for SI.
    pub fn exposed_ring_length(self) -> usize {
        match self {
            ModelType::Si => 1,
            ModelType::Sei { latency_period } => latency_period + 1,
        }
    }
}

/// Named dispersal kernel family, as configured by `natural_kernel_type` /
/// `anthro_kernel_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelTypeName {
    Cauchy,
    Exponential,
    Weibull,
    LogNormal,
    Normal,
    PowerLaw,
    HyperbolicSecant,
    Logistic,
    ExponentialPower,
    Gamma,
    DeterministicNeighbor,
    Deterministic,
    Network,
    UniformRandom,
}

impl KernelTypeName {
    pub fn parse(text: &str) -> Result<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "cauchy" => Ok(KernelTypeName::Cauchy),
            "exponential" => Ok(KernelTypeName::Exponential),
            "weibull" => Ok(KernelTypeName::Weibull),
            "lognormal" | "log_normal" => Ok(KernelTypeName::LogNormal),
            "normal" => Ok(KernelTypeName::Normal),
            "powerlaw" | "power_law" => Ok(KernelTypeName::PowerLaw),
            "hyperbolicsecant" | "hyperbolic_secant" => Ok(KernelTypeName::HyperbolicSecant),
            "logistic" => Ok(KernelTypeName::Logistic),
            "exponentialpower" | "exponential_power" => Ok(KernelTypeName::ExponentialPower),
            "gamma" => Ok(KernelTypeName::Gamma),
            "deterministicneighbor" | "deterministic_neighbor" => Ok(KernelTypeName::DeterministicNeighbor),
            "deterministic" => Ok(KernelTypeName::Deterministic),
            "network" => Ok(KernelTypeName::Network),
            "uniformrandom" | "uniform_random" => Ok(KernelTypeName::UniformRandom),
            other => Err(PopsError::InvalidArgument(format!("unknown kernel type: {other}"))),
        }
    }
}

/// Parses a comma-separated, case-insensitive direction list such as
/// `"N,S,E,W"` for quarantine-escape monitoring.
pub fn parse_directions(text: &str) -> Result<Vec<Direction>> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.to_ascii_uppercase().as_str() {
            "N" => Ok(Direction::N),
            "S" => Ok(Direction::S),
            "E" => Ok(Direction::E),
            "W" => Ok(Direction::W),
            "NE" => Ok(Direction::Ne),
            "NW" => Ok(Direction::Nw),
            "SE" => Ok(Direction::Se),
            "SW" => Ok(Direction::Sw),
            other => Err(PopsError::InvalidArgument(format!("unknown direction: {other}"))),
        })
        .collect()
}
