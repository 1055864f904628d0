// wavechain -- a generator for composite periodic test signals
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! Command line front end: load a chain file, render it and export the signal.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;
use snafu::{ResultExt, Snafu};
use structopt::StructOpt;

use crate::chain::WaveChain;
use crate::output::{self, ExportError};
use crate::preset::{ChainFile, PresetError, DEFAULT_EXPORT_PATH};
use crate::wave::{GridError, SampleGrid};

#[derive(Debug, StructOpt)]
#[structopt(name = "wavechain", about = "Rendering composite test signals")]
pub struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    pub verbose: usize,

    /// The chain file describing the signal.
    #[structopt(parse(from_os_str))]
    pub chain: PathBuf,

    /// Output file (`.csv`, or any sox-supported audio format).
    /// Defaults to the export path of the chain file.
    #[structopt(short, long, parse(from_os_str))]
    pub output: Option<PathBuf>,

    /// Number of samples, overriding the chain file.
    #[structopt(short = "n", long)]
    pub samples: Option<usize>,

    /// Sample frequency in Hz, overriding the chain file.
    #[structopt(short, long)]
    pub rate: Option<f64>,

    /// Dump the chain after applying the overrides.
    #[structopt(long)]
    #[allow(clippy::option_option)]
    pub dump_chain: Option<Option<PathBuf>>,
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{}", source))]
    Preset { source: PresetError },
    #[snafu(display("Invalid sampling settings: {}", source))]
    Settings { source: GridError },
    #[snafu(display("{}", source))]
    Export { source: ExportError },
    #[snafu(display("Could not dump the chain to {}: {}", path.display(), source))]
    Dump { path: PathBuf, source: io::Error },
}

pub fn main() -> Result<(), Error> {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    if let Err(err) = simple_logger::init_with_level(level) {
        eprintln!("failed to initialize logging: {}", err);
    }

    run(&opt)
}

/// Execute the options that were given on the command line.
pub fn run(opt: &Opt) -> Result<(), Error> {
    let file = ChainFile::load(&opt.chain).context(Preset)?;
    let mut chain = file.to_chain().context(Preset)?;
    resample(&mut chain, opt.samples, opt.rate)?;
    info!(
        "loaded {} stages from {}",
        chain.len(),
        opt.chain.display()
    );

    if let Some(dump) = &opt.dump_chain {
        let path = dump.clone().unwrap_or_else(|| "/dev/stdout".into());
        let current = ChainFile::from_chain(&chain, file.export_path.clone());
        dump_chain(&current, &path)?;
    }

    let output = output_path(opt, &file);
    output::export_to_path(&chain, &output).context(Export)
}

/// Command line output, then the path from the chain file, then the default.
fn output_path(opt: &Opt, file: &ChainFile) -> PathBuf {
    opt.output
        .clone()
        .or_else(|| file.export_path.clone())
        .unwrap_or_else(|| DEFAULT_EXPORT_PATH.into())
}

fn dump_chain(file: &ChainFile, path: &Path) -> Result<(), Error> {
    let yaml = file.to_yaml().context(Preset)?;
    let mut out = std::fs::File::create(path).context(Dump { path })?;
    out.write_all(yaml.as_bytes()).context(Dump { path })
}

/// Replace the sampling settings of a chain, as done by the command line overrides.
pub fn resample(chain: &mut WaveChain, samples: Option<usize>, rate: Option<f64>) -> Result<(), Error> {
    let grid = chain.grid();
    let grid = SampleGrid::new(
        samples.unwrap_or(grid.sample_count()),
        rate.unwrap_or(grid.sample_frequency()),
    )
    .context(Settings)?;
    chain.set_grid(grid);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn opt(chain: PathBuf) -> Opt {
        Opt {
            verbose: 0,
            chain,
            output: None,
            samples: None,
            rate: None,
            dump_chain: None,
        }
    }

    #[test]
    fn parses_arguments() {
        let opt = Opt::from_iter(&[
            "wavechain", "-vv", "chain.yaml", "-o", "out.wav", "-n", "64", "--rate", "8000",
            "--dump-chain",
        ]);
        assert_eq!(opt.verbose, 2);
        assert_eq!(opt.chain, PathBuf::from("chain.yaml"));
        assert_eq!(opt.output, Some(PathBuf::from("out.wav")));
        assert_eq!(opt.samples, Some(64));
        assert_eq!(opt.rate, Some(8000.0));
        assert_eq!(opt.dump_chain, Some(None));
    }

    #[test]
    fn renders_chain_file_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let chain_path = dir.path().join("chain.yaml");
        let csv_path = dir.path().join("signal.csv");
        let dump_path = dir.path().join("dump.yaml");

        let file = ChainFile {
            export_path: Some(csv_path.clone()),
            stages: vec![Default::default(), Default::default()],
            ..ChainFile::default()
        };
        file.save(&chain_path).unwrap();

        let mut opt = opt(chain_path);
        opt.samples = Some(10);
        opt.dump_chain = Some(Some(dump_path.clone()));
        run(&opt).unwrap();

        let csv = fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv.lines().count(), 11);

        let dumped = ChainFile::load(&dump_path).unwrap();
        assert_eq!(dumped.sample_count, 10);
        assert_eq!(dumped.stages, file.stages);
    }

    #[test]
    fn empty_chain_fails() {
        let dir = tempfile::tempdir().unwrap();
        let chain_path = dir.path().join("chain.yaml");
        ChainFile::default().save(&chain_path).unwrap();

        let mut opt = opt(chain_path);
        opt.output = Some(dir.path().join("out.csv"));
        assert!(matches!(run(&opt), Err(Error::Export { .. })));
        assert!(!dir.path().join("out.csv").exists());
    }

    #[test]
    fn output_precedence() {
        let mut file = ChainFile::default();
        let mut opt = opt("chain.yaml".into());
        assert_eq!(output_path(&opt, &file), PathBuf::from(DEFAULT_EXPORT_PATH));
        file.export_path = Some("from_file.csv".into());
        assert_eq!(output_path(&opt, &file), PathBuf::from("from_file.csv"));
        opt.output = Some("from_args.csv".into());
        assert_eq!(output_path(&opt, &file), PathBuf::from("from_args.csv"));
    }

    #[test]
    fn resampling() {
        let mut chain = WaveChain::default();
        resample(&mut chain, Some(16), None).unwrap();
        assert_eq!(chain.grid().sample_count(), 16);
        assert_eq!(chain.grid().sample_frequency(), 48000.0);
        assert!(matches!(
            resample(&mut chain, None, Some(0.0)),
            Err(Error::Settings { .. })
        ));
        assert_eq!(chain.grid().sample_count(), 16);
    }
}
