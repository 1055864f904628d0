// wavechain -- a generator for composite periodic test signals
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Pure generator functions for the basic periodic wave shapes.
//!
//! All generators map a point in time (in seconds) and the parameters of a stage
//! to the instantaneous amplitude of the wave. They have no state of their own.
//!
//! The ramp shapes (sawtooth, triangle) rely on `%`, which keeps the sign of the
//! dividend. For negative times (e.g. due to a negative phase) the result therefore
//! needs to be wrapped back by one period.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::stage::WaveStage;

/// The shape of a single wave stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveShape {
    Sine,
    Cosine,
    Sawtooth,
    Triangle,
    Square,
}

impl WaveShape {
    pub const ALL: [WaveShape; 5] = [
        WaveShape::Sine,
        WaveShape::Cosine,
        WaveShape::Sawtooth,
        WaveShape::Triangle,
        WaveShape::Square,
    ];

    /// Evaluate the wave of this shape with the parameters of `stage` at time `t`.
    ///
    /// ```
    /// # use wavechain::shape::WaveShape;
    /// # use wavechain::stage::WaveStage;
    /// let stage = WaveStage { frequency: 1.0, ..WaveStage::default() };
    /// assert_eq!(WaveShape::Square.generate(0.25, &stage), -1.0);
    /// assert_eq!(WaveShape::Sawtooth.generate(0.25, &stage), 0.5);
    /// ```
    pub fn generate(self, t: f64, stage: &WaveStage) -> f64 {
        match self {
            WaveShape::Sine => sine(t, stage),
            WaveShape::Cosine => cosine(t, stage),
            WaveShape::Sawtooth => sawtooth(t, stage),
            WaveShape::Triangle => triangle(t, stage),
            WaveShape::Square => square(t, stage),
        }
    }

    /// Human readable name, as shown in listings.
    pub fn name(self) -> &'static str {
        match self {
            WaveShape::Sine => "Sine",
            WaveShape::Cosine => "Cosine",
            WaveShape::Sawtooth => "Sawtooth",
            WaveShape::Triangle => "Triangle",
            WaveShape::Square => "Square",
        }
    }
}

impl Default for WaveShape {
    fn default() -> Self {
        WaveShape::Sine
    }
}

/// Angle of the sine and cosine generators. The phase is given in degrees.
fn angle(t: f64, stage: &WaveStage) -> f64 {
    PI * (2.0 * stage.frequency * t + stage.phase / 180.0)
}

/// Time by which the modulo based shapes are shifted for the configured phase.
fn delay(stage: &WaveStage) -> f64 {
    stage.phase / (stage.frequency * 360.0)
}

pub fn sine(t: f64, stage: &WaveStage) -> f64 {
    stage.amplitude * angle(t, stage).sin() + stage.dc_offset
}

pub fn cosine(t: f64, stage: &WaveStage) -> f64 {
    stage.amplitude * angle(t, stage).cos() + stage.dc_offset
}

/// Rising ramp from `-amplitude` to `amplitude` once per period.
///
/// A zero amplitude or frequency makes the ramp degenerate and yields NaN,
/// which is passed on like any other sample.
pub fn sawtooth(t: f64, stage: &WaveStage) -> f64 {
    let a = stage.amplitude;
    let ramp = 2.0 * a * stage.frequency * (t + delay(stage)) + a;
    let mut output = ramp % (2.0 * a) - a;
    if output < -a {
        output += 2.0 * a;
    }
    output + stage.dc_offset
}

/// The ramp spans four amplitudes per period and is folded back twice to form the triangle.
///
/// Like the sawtooth, a zero amplitude or frequency yields NaN.
pub fn triangle(t: f64, stage: &WaveStage) -> f64 {
    let a = stage.amplitude;
    let mut output = (4.0 * a * stage.frequency * (t + delay(stage))) % (4.0 * a);
    if output < 0.0 {
        output += 4.0 * a;
    }
    if output > a {
        output = 2.0 * a - output;
    }
    if output < -a {
        output = -output - 2.0 * a;
    }
    output + stage.dc_offset
}

/// Positive level for the first `duty` fraction of each period, negative level for the rest.
///
/// The position within the period is measured in cycles rather than seconds, so the
/// level changes land on the same samples in every period. A zero frequency holds
/// the level of the configured phase.
pub fn square(t: f64, stage: &WaveStage) -> f64 {
    let mut cycle = (stage.frequency * t + stage.phase / 360.0).rem_euclid(1.0);
    // tiny negative arguments round up to a full cycle
    if cycle >= 1.0 {
        cycle = 0.0;
    }

    let level = if cycle < stage.duty {
        stage.amplitude
    } else {
        -stage.amplitude
    };
    level + stage.dc_offset
}
