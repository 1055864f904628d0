// wavechain -- a generator for composite periodic test signals
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! A single link of a wave chain: the wave parameters and how the wave is combined
//! with the signal accumulated from the stages below it.

use serde::{Deserialize, Serialize};

use crate::shape::WaveShape;

/// How a stage merges its wave into the signal accumulated so far.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveMode {
    Add,
    Subtract,
    /// Amplitude modulation, i.e. multiplication of the two signals.
    #[serde(alias = "am")]
    Multiply,
    /// Division by the generated wave. Zero crossings of the divisor yield
    /// infinite or NaN samples, which are passed on unchanged.
    Divide,
    /// Frequency modulation. The accumulated value scales the frequency of
    /// this stage and the generated wave replaces the accumulator.
    #[serde(alias = "fm")]
    FrequencyModulate,
}

impl WaveMode {
    pub const ALL: [WaveMode; 5] = [
        WaveMode::Add,
        WaveMode::Subtract,
        WaveMode::Multiply,
        WaveMode::Divide,
        WaveMode::FrequencyModulate,
    ];

    /// Combine the wave of `stage` at time `t` with the accumulated value `acc`.
    ///
    /// ```
    /// # use wavechain::stage::{WaveMode, WaveStage};
    /// # use wavechain::shape::WaveShape;
    /// let stage = WaveStage { shape: WaveShape::Cosine, amplitude: 2.0, ..WaveStage::default() };
    /// assert_eq!(WaveMode::Add.combine(1.0, 0.0, &stage), 3.0);
    /// assert_eq!(WaveMode::Subtract.combine(1.0, 0.0, &stage), -1.0);
    /// assert_eq!(WaveMode::Multiply.combine(1.5, 0.0, &stage), 3.0);
    /// assert_eq!(WaveMode::Divide.combine(1.0, 0.0, &stage), 0.5);
    /// ```
    pub fn combine(self, acc: f64, t: f64, stage: &WaveStage) -> f64 {
        match self {
            WaveMode::Add => acc + stage.generate(t),
            WaveMode::Subtract => acc - stage.generate(t),
            WaveMode::Multiply => acc * stage.generate(t),
            WaveMode::Divide => acc / stage.generate(t),
            WaveMode::FrequencyModulate => {
                let modulated = WaveStage {
                    frequency: stage.frequency * acc,
                    ..stage.clone()
                };
                modulated.generate(t)
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WaveMode::Add => "Add",
            WaveMode::Subtract => "Subtract",
            WaveMode::Multiply => "AM",
            WaveMode::Divide => "Divide",
            WaveMode::FrequencyModulate => "FM",
        }
    }
}

impl Default for WaveMode {
    fn default() -> Self {
        WaveMode::Add
    }
}

/// Parameters of a single wave.
///
/// The default is a 1 kHz sine of unit amplitude that is added to the signal below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveStage {
    pub shape: WaveShape,
    pub amplitude: f64,
    /// Frequency in Hz.
    pub frequency: f64,
    /// Phase in degrees.
    pub phase: f64,
    /// Fraction of the period spent at the positive level, only used by square waves.
    pub duty: f64,
    /// Ignored for the stage at the tail of a chain, which seeds the signal.
    pub mode: WaveMode,
    pub dc_offset: f64,
}

impl WaveStage {
    pub fn new(shape: WaveShape) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    /// Evaluate the wave of this stage on its own.
    pub fn generate(&self, t: f64) -> f64 {
        self.shape.generate(t, self)
    }
}

impl Default for WaveStage {
    fn default() -> Self {
        Self {
            shape: WaveShape::Sine,
            amplitude: 1.0,
            frequency: 1000.0,
            phase: 0.0,
            duty: 0.0,
            mode: WaveMode::Add,
            dc_offset: 0.0,
        }
    }
}
