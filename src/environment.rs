use crate::error::{PopsError, Result};
use crate::raster::Raster;

/// How the weather coefficient is interpreted when combined with
/// establishment probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherType {
    Deterministic,
    Probabilistic,
    None,
}

impl WeatherType {
    /// Case-insensitive on `"deterministic"` / `"probabilistic"` / `"none"`;
    /// an empty string also means `None`. Anything else is invalid.
    pub fn parse(text: &str) -> Result<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "deterministic" => Ok(WeatherType::Deterministic),
            "probabilistic" => Ok(WeatherType::Probabilistic),
            "none" | "" => Ok(WeatherType::None),
            other => Err(PopsError::InvalidArgument(format!(
                "unknown weather type: {other}"
            ))),
        }
    }
}

/// Owns the weather/temperature fields and the registration order of host
/// pools sharing this grid. Host pools themselves live in the arena the
/// [`crate::simulation::Model`] owns; `Environment` only carries their stable
/// indices, never the pools themselves.
#[derive(Debug, Clone)]
pub struct Environment {
    rows: usize,
    cols: usize,
    weather_type: WeatherType,
    weather_coefficient: Option<Raster<f64>>,
    temperature: Option<Raster<f64>>,
    lethal_temperature_threshold: Option<f64>,
    other_individuals: Option<Raster<f64>>,
    registered_hosts: Vec<usize>,
}

impl Environment {
    pub fn new(rows: usize, cols: usize, weather_type: WeatherType) -> Self {
        Self {
            rows,
            cols,
            weather_type,
            weather_coefficient: None,
            temperature: None,
            lethal_temperature_threshold: None,
            other_individuals: None,
            registered_hosts: Vec::new(),
        }
    }

    pub fn weather_type(&self) -> WeatherType {
        self.weather_type
    }

    /// Replace the current weather field wholesale.
    pub fn update_weather(&mut self, raster: Raster<f64>) -> Result<()> {
        self.check_shape(&raster)?;
        self.weather_coefficient = Some(raster);
        Ok(())
    }

    /// Fails with a logic condition if the weather field has never been set.
    pub fn weather_coefficient_at(&self, row: usize, col: usize) -> Result<f64> {
        self.weather_coefficient
            .as_ref()
            .map(|r| r.get(row, col))
            .ok_or_else(|| PopsError::LogicState("weather_coefficient was never set".to_string()))
    }

    pub fn update_temperature(&mut self, raster: Raster<f64>) -> Result<()> {
        self.check_shape(&raster)?;
        self.temperature = Some(raster);
        Ok(())
    }

    pub fn temperature_at(&self, row: usize, col: usize) -> Result<f64> {
        self.temperature
            .as_ref()
            .map(|r| r.get(row, col))
            .ok_or_else(|| PopsError::LogicState("temperature was never set".to_string()))
    }

    pub fn set_lethal_temperature_threshold(&mut self, threshold: f64) {
        self.lethal_temperature_threshold = Some(threshold);
    }

    pub fn lethal_temperature_threshold(&self) -> Result<f64> {
        self.lethal_temperature_threshold
            .ok_or_else(|| PopsError::LogicState("lethal_temperature_threshold was never set".to_string()))
    }

    pub fn update_other_individuals(&mut self, raster: Raster<f64>) -> Result<()> {
        self.check_shape(&raster)?;
        self.other_individuals = Some(raster);
        Ok(())
    }

    /// Registers a host pool (identified by its stable arena index) and
    /// returns its position in registration order.
    pub fn register_host(&mut self, host_index: usize) -> usize {
        self.registered_hosts.push(host_index);
        self.registered_hosts.len() - 1
    }

    /// Position of `host_index` in registration order, identity by index
    /// equality into the registered order.
    pub fn host_index(&self, host_index: usize) -> Option<usize> {
        self.registered_hosts.iter().position(|&h| h == host_index)
    }

    pub fn registered_hosts(&self) -> &[usize] {
        &self.registered_hosts
    }

    /// `other_individuals(i,j) + sum of each registered host's total_hosts_at(i,j)`.
    /// `total_hosts_at` is supplied per registered host index via `host_totals`
    /// (the caller looks these up from the Model's host arena).
    pub fn total_population_at(&self, row: usize, col: usize, host_totals: impl Iterator<Item = f64>) -> f64 {
        let other = self
            .other_individuals
            .as_ref()
            .map_or(0.0, |r| r.get(row, col));
        other + host_totals.sum::<f64>()
    }

    fn check_shape(&self, raster: &Raster<f64>) -> Result<()> {
        if raster.rows() != self.rows || raster.cols() != self.cols {
            Err(PopsError::ShapeMismatch(format!(
                "expected {}x{}, got {}x{}",
                self.rows,
                self.cols,
                raster.rows(),
                raster.cols()
            )))
        } else {
            Ok(())
        }
    }
}
