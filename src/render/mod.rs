// wavechain -- a generator for composite periodic test signals
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! The glue responsible for turning a wave chain into an actual sampled signal.
//!
//! The chain is folded from the tail upward: the last stage seeds the signal,
//! then every stage above it merges its wave into the signal according to its mode.
//! The head of the chain is therefore applied last.

use log::{debug, warn};
use snafu::Snafu;

use crate::chain::WaveChain;
use crate::wave::SampleGrid;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum RenderError {
    #[snafu(display("The wave chain is empty, there is nothing to render"))]
    EmptyChain,
}

/// Render the chain on its own sample grid.
pub fn render(chain: &WaveChain) -> Result<Vec<f64>, RenderError> {
    render_grid(chain, &chain.grid())
}

/// Render the chain with `grid.sample_count()` samples taken at `grid.sample_frequency()`.
///
/// Non-finite samples (e.g. from dividing by a wave crossing zero) are kept as they are.
pub fn render_grid(chain: &WaveChain, grid: &SampleGrid) -> Result<Vec<f64>, RenderError> {
    let mut stages = chain.iter().rev();
    let (_, seed) = stages.next().ok_or(RenderError::EmptyChain)?;

    debug!(
        "rendering {} stages, {} samples at {} Hz",
        chain.len(),
        grid.sample_count(),
        grid.sample_frequency()
    );

    let mut signal: Vec<f64> = grid.times().map(|t| seed.generate(t)).collect();

    for (id, stage) in stages {
        debug!(
            "applying {} of {} stage {:?}",
            stage.mode.name(),
            stage.shape.name(),
            id
        );
        for (i, sample) in signal.iter_mut().enumerate() {
            *sample = stage.mode.combine(*sample, grid.time(i), stage);
        }
    }

    let non_finite = signal.iter().filter(|x| !x.is_finite()).count();
    if non_finite > 0 {
        warn!("{} of {} samples are not finite", non_finite, signal.len());
    }

    Ok(signal)
}
