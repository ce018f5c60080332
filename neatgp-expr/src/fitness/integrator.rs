use crate::fitness::{Covariate, FitnessConfig, TimeSeries};
use crate::networks::ExpressionNetwork;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Explicit integration schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrationMethod {
    /// Forward Euler.
    Euler,
    /// Heun's method (explicit trapezoidal rule).
    Heun,
}

/// Why an integration was abandoned.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum IntegrationFailure {
    #[error("non-finite derivative or state at t = {time}")]
    NonFinite { time: f64 },
    #[error("more than {limit} integration steps required")]
    StepLimit { limit: usize },
}

/// Integrates `dx/dt = network(covariates(t, x))` in normalized
/// form, from `x = 1` at the first observation time. Returns the
/// normalized state at every observation time.
pub(super) fn integrate(
    network: &mut ExpressionNetwork,
    covariates: &[Covariate],
    series: &TimeSeries,
    config: &FitnessConfig,
) -> Result<Vec<f64>, IntegrationFailure> {
    let t0 = series.initial_time();
    let (lower, upper) = config.admissible_range;
    let mut inputs = vec![0.0; covariates.len()];
    let mut derivative = |t: f64, x: f64| -> Result<f64, IntegrationFailure> {
        for (input, covariate) in inputs.iter_mut().zip(covariates) {
            *input = covariate.value(t - t0, x);
        }
        let dx = network.evaluate_at(&inputs);
        if dx.is_finite() {
            Ok(dx)
        } else {
            Err(IntegrationFailure::NonFinite { time: t })
        }
    };

    let mut x = 1.0;
    let mut states = Vec::with_capacity(series.len());
    states.push(x);
    let mut total_steps = 0usize;

    for window in series.times().windows(2) {
        let (start, end) = (window[0], window[1]);
        let span = end - start;
        let required = (span / config.step_size).ceil();
        // Compared before the cast, which saturates.
        if required > config.max_steps.saturating_sub(total_steps) as f64 {
            return Err(IntegrationFailure::StepLimit {
                limit: config.max_steps,
            });
        }
        let steps = (required as usize).max(1);
        total_steps += steps;

        let h = span / steps as f64;
        for step in 0..steps {
            let t = start + step as f64 * h;
            let k1 = derivative(t, x)?;
            let next = match config.method {
                IntegrationMethod::Euler => x + h * k1,
                IntegrationMethod::Heun => {
                    let k2 = derivative(t + h, x + h * k1)?;
                    x + 0.5 * h * (k1 + k2)
                }
            };
            if !next.is_finite() {
                return Err(IntegrationFailure::NonFinite { time: t + h });
            }
            x = next.clamp(lower, upper);
        }
        states.push(x);
    }
    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{BinaryOp, Connection, ExprGenome, GraphDescription, Operation};

    /// dx/dt = w * x
    fn linear(weight: f64) -> ExpressionNetwork {
        let genome = ExprGenome::from_description(&GraphDescription {
            inputs: vec!["x".into()],
            output: 1,
            nodes: vec![
                (0, Operation::Variable(0)),
                (1, Operation::Binary(BinaryOp::Add)),
            ],
            connections: vec![Connection::new(0, 0, 1, 0, weight)],
        })
        .unwrap();
        ExpressionNetwork::from(&genome)
    }

    fn series(times: Vec<f64>) -> TimeSeries {
        let values = vec![1.0; times.len()];
        TimeSeries::new(times, values).unwrap()
    }

    #[test]
    fn euler_matches_closed_form() {
        let config = FitnessConfig {
            step_size: 0.5,
            ..FitnessConfig::default()
        };
        let states = integrate(
            &mut linear(-0.1),
            &[Covariate::State],
            &series(vec![0.0, 1.0, 2.0]),
            &config,
        )
        .unwrap();
        let factor: f64 = 1.0 - 0.5 * 0.1;
        assert_eq!(states.len(), 3);
        assert!((states[1] - factor.powi(2)).abs() < 1e-15);
        assert!((states[2] - factor.powi(4)).abs() < 1e-15);
    }

    #[test]
    fn heun_is_more_accurate() {
        let times = vec![0.0, 10.0];
        let exact = (-1.0f64).exp();
        let euler = integrate(
            &mut linear(-0.1),
            &[Covariate::State],
            &series(times.clone()),
            &FitnessConfig::default(),
        )
        .unwrap();
        let heun = integrate(
            &mut linear(-0.1),
            &[Covariate::State],
            &series(times),
            &FitnessConfig {
                method: IntegrationMethod::Heun,
                ..FitnessConfig::default()
            },
        )
        .unwrap();
        assert!((heun[1] - exact).abs() < (euler[1] - exact).abs());
    }

    #[test]
    fn uneven_spans_use_whole_steps() {
        // 0.7 time units with step size 0.5 take 2 steps of 0.35.
        let states = integrate(
            &mut linear(-1.0),
            &[Covariate::State],
            &series(vec![0.0, 0.7]),
            &FitnessConfig::default(),
        )
        .unwrap();
        assert!((states[1] - 0.65 * 0.65).abs() < 1e-15);
    }

    #[test]
    fn state_is_clamped() {
        let states = integrate(
            &mut linear(5.0),
            &[Covariate::State],
            &series(vec![0.0, 10.0]),
            &FitnessConfig::default(),
        )
        .unwrap();
        assert_eq!(states[1], 10.0);
    }

    #[test]
    fn step_limit() {
        let config = FitnessConfig {
            max_steps: 10,
            ..FitnessConfig::default()
        };
        assert_eq!(
            integrate(
                &mut linear(-0.1),
                &[Covariate::State],
                &series(vec![0.0, 3.0, 6.0]),
                &config,
            ),
            Err(IntegrationFailure::StepLimit { limit: 10 })
        );
    }

    #[test]
    fn huge_windows_hit_the_step_limit() {
        assert_eq!(
            integrate(
                &mut linear(-0.1),
                &[Covariate::State],
                &series(vec![0.0, 1.0, 1e300]),
                &FitnessConfig::default(),
            ),
            Err(IntegrationFailure::StepLimit { limit: 100_000 })
        );
    }
}
