// wavechain -- a generator for composite periodic test signals
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Writing rendered signals to their destination.

pub mod sox;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use snafu::{ResultExt, Snafu};

use crate::chain::WaveChain;
use crate::render::{self, RenderError};
use crate::wave::SampleGrid;

/// Receives one record per sample, in time order.
pub trait RecordSink {
    /// Called once before the first record.
    fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn record(&mut self, time: f64, value: f64) -> io::Result<()>;

    /// Called once after the last record.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Comma separated time and signal columns with a header row.
///
/// ```
/// # use wavechain::output::*;
/// let mut sink = CsvSink::new(Vec::new());
/// sink.begin().unwrap();
/// sink.record(0.5, -0.25).unwrap();
/// sink.finish().unwrap();
/// assert_eq!(
///     String::from_utf8(sink.into_inner()).unwrap(),
///     "Time (s), Combined Signal\n0.500000, -0.250000\n"
/// );
/// ```
pub struct CsvSink<W> {
    writer: W,
}

impl<W: Write> CsvSink<W> {
    pub const HEADER: &'static str = "Time (s), Combined Signal";

    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn begin(&mut self) -> io::Result<()> {
        writeln!(self.writer, "{}", Self::HEADER)
    }

    fn record(&mut self, time: f64, value: f64) -> io::Result<()> {
        writeln!(self.writer, "{:.6}, {:.6}", time, value)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Keeps all records in memory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MemorySink {
    pub records: Vec<(f64, f64)>,
}

impl RecordSink for MemorySink {
    fn record(&mut self, time: f64, value: f64) -> io::Result<()> {
        self.records.push((time, value));
        Ok(())
    }
}

#[derive(Debug, Snafu)]
pub enum ExportError {
    #[snafu(display("Failed to render the signal: {}", source))]
    Render { source: RenderError },
    #[snafu(display("Could not write to {}: {}", path.display(), source))]
    SinkUnavailable { path: PathBuf, source: io::Error },
}

/// Hand a rendered signal to a sink, one `(time, value)` record per sample.
pub fn write_signal(grid: &SampleGrid, signal: &[f64], sink: &mut dyn RecordSink) -> io::Result<()> {
    sink.begin()?;
    for (t, x) in grid.times().zip(signal) {
        sink.record(t, *x)?;
    }
    sink.finish()
}

/// Render the chain on its sample grid and write the result to `sink`.
///
/// `name` only identifies the sink in error messages.
pub fn export(chain: &WaveChain, sink: &mut dyn RecordSink, name: &Path) -> Result<(), ExportError> {
    let grid = chain.grid();
    let signal = render::render(chain).context(Render)?;
    write_signal(&grid, &signal, sink).context(SinkUnavailable { path: name })
}

/// Render the chain and store it in a file.
///
/// Files ending in `.csv` are written as text, everything else is converted by sox.
/// The data is written to a temporary file next to the target first, which is only
/// moved into place once it is complete.
pub fn export_to_path(chain: &WaveChain, path: &Path) -> Result<(), ExportError> {
    let grid = chain.grid();
    let signal = render::render(chain).context(Render)?;

    let partial = partial_path(path);
    let written = if is_csv(path) {
        write_csv(&grid, &signal, &partial)
    } else {
        sox::write_with_sox(&grid, &signal, &partial, path)
    };

    match written.and_then(|_| fs::rename(&partial, path)) {
        Ok(()) => {
            info!(
                "exported {} samples ({:.4} seconds) to {}",
                signal.len(),
                grid.duration(),
                path.display()
            );
            Ok(())
        }
        Err(source) => {
            if let Err(err) = fs::remove_file(&partial) {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!("failed to remove {}: {}", partial.display(), err);
                }
            }
            Err(ExportError::SinkUnavailable {
                path: path.to_owned(),
                source,
            })
        }
    }
}

fn write_csv(grid: &SampleGrid, signal: &[f64], path: &Path) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut sink = CsvSink::new(io::BufWriter::new(file));
    write_signal(grid, signal, &mut sink)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
}

/// Sibling of `path` that receives the data until it is complete.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_owned();
    name.push(".partial");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::WaveStage;

    fn test_chain() -> WaveChain {
        let mut chain = WaveChain::new(SampleGrid::new(5, 4.0).unwrap());
        chain.insert(WaveStage {
            frequency: 1.0,
            ..WaveStage::default()
        });
        chain
    }

    #[test]
    fn memory_sink_gets_one_record_per_sample() {
        let mut sink = MemorySink::default();
        export(&test_chain(), &mut sink, Path::new("memory")).unwrap();

        let times: Vec<f64> = sink.records.iter().map(|(t, _)| *t).collect();
        assert_eq!(times, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(sink.records[1].1, 1.0);
    }

    #[test]
    fn empty_chain_is_reported() {
        let mut sink = MemorySink::default();
        let result = export(&WaveChain::default(), &mut sink, Path::new("memory"));
        assert!(matches!(
            result,
            Err(ExportError::Render {
                source: RenderError::EmptyChain
            })
        ));
        assert!(sink.records.is_empty());
    }

    #[test]
    fn csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Test Data.csv");
        export_to_path(&test_chain(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Time (s), Combined Signal");
        assert_eq!(lines[1], "0.000000, 0.000000");
        assert_eq!(lines[2], "0.250000, 1.000000");
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn failed_export_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");
        let result = export_to_path(&test_chain(), &path);
        assert!(matches!(result, Err(ExportError::SinkUnavailable { .. })));
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());

        // render errors are reported before anything is created
        let path = dir.path().join("empty.csv");
        let result = export_to_path(&WaveChain::default(), &path);
        assert!(matches!(result, Err(ExportError::Render { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn failed_audio_export_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let mut chain = test_chain();
        // rounds to a sample rate of zero, which sox cannot write
        chain.set_grid(SampleGrid::new(4, 0.4).unwrap());

        let result = export_to_path(&chain, &path);
        assert!(matches!(result, Err(ExportError::SinkUnavailable { .. })));
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }

    #[test]
    fn partial_names() {
        assert_eq!(
            partial_path(Path::new("/tmp/out.csv")),
            Path::new("/tmp/out.csv.partial")
        );
        assert!(is_csv(Path::new("a/b.CSV")));
        assert!(!is_csv(Path::new("a/b.wav")));
    }
}
