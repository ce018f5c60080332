use crate::fitness::FitnessError;

use serde::{Deserialize, Serialize};

/// Observations of a decaying quantity, `values[i]`
/// measured at `times[i]`. The first observation is
/// the initial condition of the integration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeSeries")]
pub struct TimeSeries {
    times: Vec<f64>,
    values: Vec<f64>,
}

#[derive(Deserialize)]
struct RawTimeSeries {
    times: Vec<f64>,
    values: Vec<f64>,
}

impl TryFrom<RawTimeSeries> for TimeSeries {
    type Error = FitnessError;

    fn try_from(raw: RawTimeSeries) -> Result<TimeSeries, FitnessError> {
        TimeSeries::new(raw.times, raw.values)
    }
}

impl TimeSeries {
    /// Creates a new time series.
    ///
    /// # Errors
    /// Returns an error if there are fewer than 2 points,
    /// the lengths differ, any number is non-finite, times
    /// are not strictly increasing, or the first value is 0.
    ///
    /// # Examples
    /// ```
    /// use neatgp_expr::fitness::TimeSeries;
    ///
    /// let series = TimeSeries::new(vec![0.0, 30.0], vec![51.285, 25.447]).unwrap();
    /// assert_eq!(series.len(), 2);
    /// assert_eq!(series.initial_value(), 51.285);
    ///
    /// assert!(TimeSeries::new(vec![0.0, 0.0], vec![1.0, 1.0]).is_err());
    /// ```
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> Result<TimeSeries, FitnessError> {
        if times.len() != values.len() {
            return Err(FitnessError::LengthMismatch {
                times: times.len(),
                values: values.len(),
            });
        }
        if times.len() < 2 {
            return Err(FitnessError::TooFewPoints(times.len()));
        }
        if let Some(i) = times.iter().position(|t| !t.is_finite()) {
            return Err(FitnessError::NonFiniteTime(i));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(FitnessError::NonFiniteValue(i));
        }
        if let Some(i) = (1..times.len()).find(|&i| times[i] <= times[i - 1]) {
            return Err(FitnessError::NonIncreasingTime(i));
        }
        if values[0] == 0.0 {
            return Err(FitnessError::ZeroInitialValue);
        }
        Ok(TimeSeries { times, values })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Returns the number of observations.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn initial_time(&self) -> f64 {
        self.times[0]
    }

    pub fn initial_value(&self) -> f64 {
        self.values[0]
    }

    /// Returns the values divided by the initial value.
    pub fn normalized(&self) -> impl Iterator<Item = f64> + '_ {
        let initial = self.initial_value();
        self.values.iter().map(move |v| v / initial)
    }
}
