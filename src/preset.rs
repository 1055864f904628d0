// wavechain -- a generator for composite periodic test signals
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Saving and loading wave chains.
//!
//! A chain file is a YAML document listing the stages from head to tail,
//! together with the sampling settings:
//!
//! ```yaml
//! sample_count: 1000
//! sample_frequency: 48000.0
//! export_path: Test Data.csv
//! selected: 0
//! stages:
//!   - shape: sine
//!     frequency: 1.0
//!     mode: fm
//!   - shape: sine
//!     frequency: 1000.0
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

use crate::chain::WaveChain;
use crate::stage::WaveStage;
use crate::wave::{GridError, SampleGrid, DEFAULT_SAMPLE_COUNT, DEFAULT_SAMPLE_FREQUENCY};

/// Where the signal is exported when nothing else is configured.
pub const DEFAULT_EXPORT_PATH: &str = "Test Data.csv";

/// Serialized form of a wave chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainFile {
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
    #[serde(default = "default_sample_frequency")]
    pub sample_frequency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_path: Option<PathBuf>,
    /// Position of the selected stage, counted from the head.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<usize>,
    #[serde(default)]
    pub stages: Vec<WaveStage>,
}

fn default_sample_count() -> usize {
    DEFAULT_SAMPLE_COUNT
}

fn default_sample_frequency() -> f64 {
    DEFAULT_SAMPLE_FREQUENCY
}

impl Default for ChainFile {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            sample_frequency: DEFAULT_SAMPLE_FREQUENCY,
            export_path: None,
            selected: None,
            stages: Vec::new(),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum PresetError {
    #[snafu(display("Could not access {}: {}", path.display(), source))]
    Io { path: PathBuf, source: io::Error },
    #[snafu(display("Malformed chain description: {}", source))]
    Format { source: serde_yaml::Error },
    #[snafu(display("Invalid sampling settings: {}", source))]
    Grid { source: GridError },
}

impl ChainFile {
    /// Capture the state of a chain.
    pub fn from_chain(chain: &WaveChain, export_path: Option<PathBuf>) -> Self {
        let grid = chain.grid();
        let selected_id = chain.selected_id();
        Self {
            sample_count: grid.sample_count(),
            sample_frequency: grid.sample_frequency(),
            export_path,
            selected: chain
                .iter()
                .position(|(id, _)| Some(id) == selected_id),
            stages: chain.iter().map(|(_, stage)| stage.clone()).collect(),
        }
    }

    /// Rebuild the chain by adding the stages one after another.
    pub fn to_chain(&self) -> Result<WaveChain, PresetError> {
        let grid = SampleGrid::new(self.sample_count, self.sample_frequency).context(Grid)?;
        let mut chain = WaveChain::new(grid);
        let mut ids = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            ids.push(chain.insert(stage.clone()));
        }
        // an out of range selection keeps the tail selected
        if let Some(id) = self.selected.and_then(|i| ids.get(i)) {
            chain.select(*id);
        }
        Ok(chain)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, PresetError> {
        serde_yaml::from_str(yaml).context(Format)
    }

    pub fn to_yaml(&self) -> Result<String, PresetError> {
        serde_yaml::to_string(self).context(Format)
    }

    pub fn load(path: &Path) -> Result<Self, PresetError> {
        debug!("loading chain from {}", path.display());
        let yaml = fs::read_to_string(path).context(Io { path })?;
        Self::from_yaml(&yaml)
    }

    pub fn save(&self, path: &Path) -> Result<(), PresetError> {
        debug!("saving chain to {}", path.display());
        let yaml = self.to_yaml()?;
        fs::write(path, yaml).context(Io { path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::WaveShape;
    use crate::stage::WaveMode;

    const EXAMPLE: &str = "
sample_count: 200
sample_frequency: 8000.0
selected: 0
stages:
  - shape: sine
    frequency: 1.0
    mode: fm
  - shape: square
    duty: 0.25
    amplitude: 2.5
";

    #[test]
    fn parses_partial_stages() {
        let file = ChainFile::from_yaml(EXAMPLE).unwrap();
        assert_eq!(file.sample_count, 200);
        assert_eq!(file.export_path, None);
        assert_eq!(file.stages.len(), 2);
        assert_eq!(file.stages[0].mode, WaveMode::FrequencyModulate);
        assert_eq!(file.stages[0].amplitude, 1.0);
        assert_eq!(file.stages[1].shape, WaveShape::Square);
        assert_eq!(file.stages[1].frequency, 1000.0);
        assert_eq!(file.stages[1].mode, WaveMode::Add);

        let chain = file.to_chain().unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.head(), chain.selected_id());
        assert_eq!(chain.grid(), SampleGrid::new(200, 8000.0).unwrap());
        chain.check_links().unwrap();
    }

    #[test]
    fn defaults_for_empty_document() {
        let file = ChainFile::from_yaml("{}").unwrap();
        assert_eq!(file, ChainFile::default());
        let chain = file.to_chain().unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.grid(), SampleGrid::default());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            ChainFile::from_yaml("stages: [{shape: hexagon}]"),
            Err(PresetError::Format { .. })
        ));
        let file = ChainFile {
            sample_count: 0,
            ..ChainFile::default()
        };
        assert!(matches!(
            file.to_chain(),
            Err(PresetError::Grid {
                source: GridError::NoSamples
            })
        ));
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.yaml");

        let mut chain = WaveChain::new(SampleGrid::new(321, 1234.5).unwrap());
        chain.add();
        chain.add();
        if let Some(stage) = chain.selected_mut() {
            stage.shape = WaveShape::Triangle;
            stage.mode = WaveMode::Divide;
            stage.phase = -45.0;
            stage.dc_offset = 0.125;
        }
        chain.add();
        chain.select_previous();

        let saved = ChainFile::from_chain(&chain, Some("signal.csv".into()));
        assert_eq!(saved.selected, Some(1));
        saved.save(&path).unwrap();

        let loaded = ChainFile::load(&path).unwrap();
        assert_eq!(loaded, saved);

        let restored = loaded.to_chain().unwrap();
        let stages: Vec<&WaveStage> = restored.iter().map(|(_, s)| s).collect();
        let original: Vec<&WaveStage> = chain.iter().map(|(_, s)| s).collect();
        assert_eq!(stages, original);
        assert_eq!(restored.selected(), chain.selected());
        assert_eq!(restored.grid(), chain.grid());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ChainFile::load(&dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(PresetError::Io { .. })));
    }
}
