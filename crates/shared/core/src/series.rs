//! Feature time series
//!
//! An ordered `(date, value-or-missing)` sequence for one feature of one
//! instrument. Series are never shared across instruments — all baseline
//! statistics are computed against an instrument's own history only.
//!
//! Missing data stays missing through the whole pipeline. NaN from upstream
//! converts to `None` here, at the I/O boundary, so "missing" can never be
//! confused with a legitimate 0.0 or a computed NaN.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single dated observation; `None` means the value was missing upstream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }

    /// Convert a raw upstream float, mapping NaN/infinite to missing
    pub fn from_raw(date: NaiveDate, raw: f64) -> Self {
        let value = raw.is_finite().then_some(raw);
        Self { date, value }
    }
}

/// Ordered daily series for one feature of one instrument
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSeries {
    observations: Vec<Observation>,
}

impl FeatureSeries {
    /// Create an empty series
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from observations, sorting by date ascending
    pub fn from_observations(mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.date);
        Self { observations }
    }

    /// Build consecutive calendar-day observations starting at `start`.
    ///
    /// Convenience for tests and synthetic data; production callers build
    /// from real trading-day observations.
    pub fn from_daily(start: NaiveDate, values: &[Option<f64>]) -> Self {
        let observations = values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation::new(start + chrono::Days::new(i as u64), *v))
            .collect();
        Self { observations }
    }

    /// Append an observation; must be strictly after the last date
    pub fn push(&mut self, observation: Observation) {
        debug_assert!(
            self.observations
                .last()
                .is_none_or(|last| observation.date > last.date),
            "observations must be appended in date order"
        );
        self.observations.push(observation);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Count of non-missing observations in the whole series
    pub fn valid_count(&self) -> usize {
        self.observations.iter().filter(|o| o.value.is_some()).count()
    }

    /// Value at index (None if out of range or missing)
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.observations.get(index).and_then(|o| o.value)
    }

    /// Value on an exact date
    pub fn value_on(&self, date: NaiveDate) -> Option<f64> {
        self.observations
            .iter()
            .find(|o| o.date == date)
            .and_then(|o| o.value)
    }

    /// Most recent value in the series (None if empty or missing)
    pub fn last_value(&self) -> Option<f64> {
        self.observations.last().and_then(|o| o.value)
    }

    /// Most recent observation date
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Values in date order, missing as `None`
    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.observations.iter().map(|o| o.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(n)
    }

    #[test]
    fn test_from_raw_maps_nan_to_missing() {
        assert_eq!(Observation::from_raw(day(0), f64::NAN).value, None);
        assert_eq!(Observation::from_raw(day(0), f64::INFINITY).value, None);
        assert_eq!(Observation::from_raw(day(0), 1.5).value, Some(1.5));
        assert_eq!(Observation::from_raw(day(0), 0.0).value, Some(0.0));
    }

    #[test]
    fn test_from_observations_sorts_by_date() {
        let series = FeatureSeries::from_observations(vec![
            Observation::new(day(2), Some(3.0)),
            Observation::new(day(0), Some(1.0)),
            Observation::new(day(1), None),
        ]);
        let values: Vec<_> = series.values().collect();
        assert_eq!(values, vec![Some(1.0), None, Some(3.0)]);
        assert_eq!(series.valid_count(), 2);
    }

    #[test]
    fn test_lookups() {
        let series = FeatureSeries::from_daily(day(0), &[Some(1.0), None, Some(3.0)]);
        assert_eq!(series.value_on(day(0)), Some(1.0));
        assert_eq!(series.value_on(day(1)), None);
        assert_eq!(series.value_at(2), Some(3.0));
        assert_eq!(series.last_value(), Some(3.0));
        assert_eq!(series.last_date(), Some(day(2)));
    }
}
