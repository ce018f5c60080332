//! ODE-integrating fitness evaluation.
//!
//! A genome is read as the right-hand side of `dx/dt = f(...)`,
//! where `x = y / y₀` is the observed quantity normalized by its
//! initial value, and the arguments of `f` are [`Covariate`]s
//! recomputed at every integration step. The integrated
//! trajectory is compared against the observations.
mod errors;
mod integrator;
mod series;

pub use errors::FitnessError;
pub use integrator::{IntegrationFailure, IntegrationMethod};
pub use series::TimeSeries;

use crate::genomics::{ExprGenome, GeneticConfig, UnaryOp};
use crate::networks::ExpressionNetwork;

use neatgp::Evaluation;
use serde::{Deserialize, Serialize};

/// A genome input, computed from the elapsed time
/// `t - t₀` and the current normalized state `x`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Covariate {
    /// The normalized state `x`.
    State,
    /// Elapsed time multiplied by `scale`.
    Time { scale: f64 },
    /// First-order approach of crystallinity from `initial`
    /// to `plateau`: `plateau - (plateau - initial)·exp(-rate·Δt)`.
    Crystallinity {
        initial: f64,
        plateau: f64,
        rate: f64,
    },
    /// Accumulated acid proxy, proportional to the number of
    /// chain scissions: `yield_per_scission·(1/x - 1)`.
    AcidConcentration { yield_per_scission: f64 },
}

impl Covariate {
    /// Returns the covariate's value after `elapsed`
    /// time units, at normalized state `x`.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::fitness::Covariate;
    ///
    /// assert_eq!(Covariate::State.value(10.0, 0.5), 0.5);
    /// assert_eq!(Covariate::Time { scale: 0.01 }.value(50.0, 0.5), 0.5);
    ///
    /// let acid = Covariate::AcidConcentration { yield_per_scission: 2.0 };
    /// assert_eq!(acid.value(0.0, 0.5), 2.0);
    ///
    /// let crystallinity = Covariate::Crystallinity { initial: 0.3, plateau: 0.5, rate: 0.1 };
    /// assert_eq!(crystallinity.value(0.0, 1.0), 0.3);
    /// ```
    pub fn value(&self, elapsed: f64, x: f64) -> f64 {
        match *self {
            Covariate::State => x,
            Covariate::Time { scale } => elapsed * scale,
            Covariate::Crystallinity {
                initial,
                plateau,
                rate,
            } => plateau - (plateau - initial) * (-rate * elapsed).exp(),
            Covariate::AcidConcentration { yield_per_scission } => {
                yield_per_scission * (UnaryOp::Reciprocal.apply(x) - 1.0)
            }
        }
    }

    fn parameters(&self) -> Vec<(&'static str, f64)> {
        match *self {
            Covariate::State => vec![],
            Covariate::Time { scale } => vec![("time scale", scale)],
            Covariate::Crystallinity {
                initial,
                plateau,
                rate,
            } => vec![
                ("initial crystallinity", initial),
                ("crystallinity plateau", plateau),
                ("crystallization rate", rate),
            ],
            Covariate::AcidConcentration { yield_per_scission } => {
                vec![("acid yield per scission", yield_per_scission)]
            }
        }
    }
}

/// Configuration data for fitness evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    /// Fitness penalty per unit of genome complexity.
    pub complexity_weight: f64,
    /// Maximum integration sub-step length, in time units.
    pub step_size: f64,
    /// Maximum number of sub-steps over a whole integration.
    pub max_steps: usize,
    /// The normalized state is clamped into this range
    /// after every sub-step.
    pub admissible_range: (f64, f64),
    pub method: IntegrationMethod,
    /// Weight of each observation after the first in the
    /// weighted mean squared error. All 1 if absent.
    pub point_weights: Option<Vec<f64>>,
}

impl Default for FitnessConfig {
    fn default() -> FitnessConfig {
        FitnessConfig {
            complexity_weight: 0.001,
            step_size: 0.5,
            max_steps: 100_000,
            admissible_range: (0.0, 10.0),
            method: IntegrationMethod::Euler,
            point_weights: None,
        }
    }
}

impl FitnessConfig {
    /// Checks that the configuration is usable with
    /// a series of `points` observations.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self, points: usize) -> Result<(), FitnessError> {
        if !(self.complexity_weight.is_finite() && self.complexity_weight >= 0.0) {
            return Err(FitnessError::InvalidParameter {
                name: "complexity_weight",
                value: self.complexity_weight,
            });
        }
        if !(self.step_size.is_finite() && self.step_size > 0.0) {
            return Err(FitnessError::InvalidParameter {
                name: "step_size",
                value: self.step_size,
            });
        }
        if self.max_steps == 0 {
            return Err(FitnessError::InvalidParameter {
                name: "max_steps",
                value: 0.0,
            });
        }
        let (lower, upper) = self.admissible_range;
        if !(lower.is_finite() && upper.is_finite() && lower < upper && lower <= 1.0 && 1.0 <= upper)
        {
            return Err(FitnessError::InvalidParameter {
                name: "admissible_range",
                value: if lower < upper { lower } else { upper },
            });
        }
        if let Some(weights) = &self.point_weights {
            let expected = points.saturating_sub(1);
            if weights.len() != expected {
                return Err(FitnessError::WeightCount {
                    expected,
                    found: weights.len(),
                });
            }
            if let Some(i) = weights.iter().position(|w| !(w.is_finite() && *w >= 0.0)) {
                return Err(FitnessError::InvalidWeight(i));
            }
            if weights.iter().sum::<f64>() <= 0.0 {
                return Err(FitnessError::ZeroWeights);
            }
        }
        Ok(())
    }
}

/// Scores genomes by integrating them as ODEs
/// against a time series.
///
/// Fitness is `1 / (1 + weighted_mse + complexity_weight·complexity)`,
/// in (0, 1]; a genome whose integration fails scores exactly 0.
#[derive(Clone, Debug)]
pub struct FitnessEvaluator {
    series: TimeSeries,
    covariates: Vec<Covariate>,
    config: FitnessConfig,
}

impl FitnessEvaluator {
    /// Creates a new evaluator. Genomes are fed one
    /// input per covariate, in order.
    ///
    /// # Errors
    /// Returns an error if no covariates are given, a covariate
    /// parameter is not finite, or the configuration is invalid.
    pub fn new(
        series: TimeSeries,
        covariates: Vec<Covariate>,
        config: FitnessConfig,
    ) -> Result<FitnessEvaluator, FitnessError> {
        if covariates.is_empty() {
            return Err(FitnessError::NoCovariates);
        }
        for (name, value) in covariates.iter().flat_map(Covariate::parameters) {
            if !value.is_finite() {
                return Err(FitnessError::InvalidParameter { name, value });
            }
        }
        config.validate(series.len())?;
        Ok(FitnessEvaluator {
            series,
            covariates,
            config,
        })
    }

    /// Checks that genomes generated from `config`
    /// take one input per covariate.
    ///
    /// # Errors
    /// Returns an error if the input counts differ.
    pub fn ensure_inputs(&self, config: &GeneticConfig) -> Result<(), FitnessError> {
        if config.input_names.len() == self.covariates.len() {
            Ok(())
        } else {
            Err(FitnessError::InputMismatch {
                covariates: self.covariates.len(),
                inputs: config.input_names.len(),
            })
        }
    }

    /// Predicts the observed quantity at every observation
    /// time, in observation units.
    ///
    /// # Errors
    /// Returns an error if the integration fails.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::fitness::{Covariate, FitnessConfig, FitnessEvaluator, TimeSeries};
    /// use neatgp_expr::genomics::{ExprGenome, GeneticConfig};
    /// use rand::SeedableRng;
    ///
    /// let series = TimeSeries::new(vec![0.0, 1.0], vec![20.0, 10.0]).unwrap();
    /// let evaluator =
    ///     FitnessEvaluator::new(series, vec![Covariate::State], FitnessConfig::default()).unwrap();
    ///
    /// // A genome with no connections: dx/dt = 0.
    /// let config = GeneticConfig {
    ///     initial_expression_chance: 0.0,
    ///     ..GeneticConfig::default()
    /// };
    /// let genome = ExprGenome::new(&config, &mut rand::rngs::StdRng::seed_from_u64(0));
    /// assert_eq!(evaluator.predict(&genome).unwrap(), vec![20.0, 20.0]);
    /// ```
    pub fn predict(&self, genome: &ExprGenome) -> Result<Vec<f64>, IntegrationFailure> {
        let mut network = ExpressionNetwork::from(genome);
        let states =
            integrator::integrate(&mut network, &self.covariates, &self.series, &self.config)?;
        let initial = self.series.initial_value();
        Ok(states.into_iter().map(|x| x * initial).collect())
    }

    /// Evaluates the genome.
    pub fn evaluate(&self, genome: &ExprGenome) -> Evaluation {
        let complexity = genome.complexity();
        let mut network = ExpressionNetwork::from(genome);
        let states =
            match integrator::integrate(&mut network, &self.covariates, &self.series, &self.config)
            {
                Ok(states) => states,
                Err(failure) => {
                    log::trace!("genome evaluation failed: {}", failure);
                    return Evaluation::failed(complexity);
                }
            };

        let initial = self.series.initial_value();
        let mut weighted_error = 0.0;
        let mut weight_sum = 0.0;
        let mut squared_error = 0.0;
        for (i, (x, target)) in states
            .iter()
            .zip(self.series.normalized())
            .enumerate()
            .skip(1)
        {
            let weight = self
                .config
                .point_weights
                .as_ref()
                .map_or(1.0, |weights| weights[i - 1]);
            weighted_error += weight * (x - target).powi(2);
            weight_sum += weight;
            squared_error += ((x - target) * initial).powi(2);
        }
        let points = (states.len() - 1) as f64;
        let weighted_mse = weighted_error / weight_sum;

        let fitness =
            1.0 / (1.0 + weighted_mse + self.config.complexity_weight * complexity as f64);
        if !fitness.is_finite() {
            return Evaluation::failed(complexity);
        }
        Evaluation {
            fitness,
            mse: squared_error / points,
            complexity,
        }
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn covariates(&self) -> &[Covariate] {
        &self.covariates
    }

    pub fn config(&self) -> &FitnessConfig {
        &self.config
    }
}
