// wavechain -- a generator for composite periodic test signals
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! This is the namespace for all parts dealing with how signals are sampled.

use snafu::Snafu;

/// Number of samples rendered when nothing else is configured.
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;
/// Samples per second used when nothing else is configured.
pub const DEFAULT_SAMPLE_FREQUENCY: f64 = 48000.0;

/// Information about how a signal is sampled.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SampleGrid {
    /// Number of samples in the rendered signal.
    sample_count: usize,
    /// Number of samples per second.
    sample_frequency: f64,
}

#[derive(Debug, PartialEq, Snafu)]
pub enum GridError {
    #[snafu(display("The sample count must be positive"))]
    NoSamples,
    #[snafu(display("Invalid sample frequency {} Hz", frequency))]
    InvalidFrequency { frequency: f64 },
}

impl SampleGrid {
    /// ```
    /// # use wavechain::wave::*;
    /// let grid = SampleGrid::new(4, 8.0).unwrap();
    /// assert_eq!(grid.times().collect::<Vec<_>>(), vec![0.0, 0.125, 0.25, 0.375]);
    /// assert_eq!(grid.duration(), 0.5);
    ///
    /// assert_eq!(SampleGrid::new(0, 8.0), Err(GridError::NoSamples));
    /// assert!(SampleGrid::new(4, -1.0).is_err());
    /// ```
    pub fn new(sample_count: usize, sample_frequency: f64) -> Result<Self, GridError> {
        if sample_count == 0 {
            Err(GridError::NoSamples)
        } else if !(sample_frequency.is_finite() && sample_frequency > 0.0) {
            Err(GridError::InvalidFrequency {
                frequency: sample_frequency,
            })
        } else {
            Ok(Self {
                sample_count,
                sample_frequency,
            })
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    pub fn sample_frequency(&self) -> f64 {
        self.sample_frequency
    }

    /// Time in seconds of the sample with the given index.
    ///
    /// Computed from the index directly, so that rounding errors do not
    /// accumulate over long signals.
    pub fn time(&self, index: usize) -> f64 {
        index as f64 / self.sample_frequency
    }

    /// Times of all samples, in order.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.sample_count).map(move |i| self.time(i))
    }

    /// Length of the sampled signal in seconds.
    pub fn duration(&self) -> f64 {
        self.sample_count as f64 / self.sample_frequency
    }
}

impl Default for SampleGrid {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            sample_frequency: DEFAULT_SAMPLE_FREQUENCY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_frequencies() {
        for frequency in [0.0, -48000.0, f64::NAN, f64::INFINITY].iter() {
            assert!(SampleGrid::new(10, *frequency).is_err());
        }
    }

    #[test]
    fn whole_seconds_land_on_exact_times() {
        // summing up 1/48000 would be off by now
        let grid = SampleGrid::new(1_000_000, 48000.0).unwrap();
        for second in 0..=20 {
            assert_eq!(grid.time(48000 * second), second as f64);
        }
        assert_eq!(grid.times().count(), 1_000_000);

        let mut accumulated = 0.0;
        for _ in 0..48000 * 20 {
            accumulated += 1.0 / 48000.0;
        }
        assert_ne!(accumulated, 20.0);
    }
}
