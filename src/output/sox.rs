// wavechain -- a generator for composite periodic test signals
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Converting signals into audio files using a sox subprocess.

use std::ffi::OsStr;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use super::{write_signal, RecordSink};
use crate::wave::SampleGrid;

/// Streams the signal as raw mono `f64` samples into sox.
/// The time of each record is implied by the sample rate.
pub struct SoxSink {
    player: Child,
    audio_stream: Option<BufWriter<ChildStdin>>,
}

impl SoxSink {
    /// Spawn sox writing to `outfile`. The output format is derived from `type_hint`
    /// (a file name whose extension sox understands), which allows writing to a
    /// temporary file name.
    pub fn new(sample_rate: u32, outfile: &Path, type_hint: &Path) -> io::Result<Self> {
        let sample_rate_str = format!("{}", sample_rate);
        let mut command = Command::new(sox_binary());
        command.args(&[
            "-R", // make the output reproducible
            "--channels",
            "1",
            "--rate",
            &sample_rate_str,
            "--type",
            "f64",
            "/dev/stdin",
        ]);
        if let Some(ext) = type_hint.extension() {
            command.arg("--type").arg(ext);
        }
        let mut player = command.arg(outfile).stdin(Stdio::piped()).spawn()?;

        let audio_stream = player.stdin.take().map(BufWriter::new);
        Ok(Self {
            player,
            audio_stream,
        })
    }
}

impl RecordSink for SoxSink {
    fn record(&mut self, _time: f64, value: f64) -> io::Result<()> {
        match self.audio_stream.as_mut() {
            Some(stream) => stream.write_all(&value.to_le_bytes()),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "sox input already closed",
            )),
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        // sox exits once its input is closed
        if let Some(mut stream) = self.audio_stream.take() {
            stream.flush()?;
        }
        let status = self.player.wait()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("sox failed with {}", status),
            ))
        }
    }
}

/// Write `signal` to `outfile` in the audio format indicated by the extension of `target`.
pub fn write_with_sox(
    grid: &SampleGrid,
    signal: &[f64],
    outfile: &Path,
    target: &Path,
) -> io::Result<()> {
    let sample_rate = audio_sample_rate(grid)?;
    let mut sink = SoxSink::new(sample_rate, outfile, target)?;
    let result = write_signal(grid, signal, &mut sink);
    if result.is_err() {
        // make sure the subprocess does not linger
        sink.audio_stream.take();
        let _ = sink.player.wait();
    }
    result
}

/// Sox only accepts whole sample rates.
fn audio_sample_rate(grid: &SampleGrid) -> io::Result<u32> {
    let sample_rate = grid.sample_frequency().round();
    if sample_rate < 1.0 || sample_rate > u32::MAX as f64 {
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("sample rate {} Hz cannot be written as audio", sample_rate),
        ))
    } else {
        Ok(sample_rate as u32)
    }
}

fn sox_binary() -> PathBuf {
    // For properly recording the sox dependency on nix:
    if let Some(sox_bin) = option_env!("NIX_SOX_BIN") {
        log::debug!("using sox from nix store {}", sox_bin);
        Path::new(sox_bin).join("sox")
    } else {
        PathBuf::from(OsStr::new("sox"))
    }
}
