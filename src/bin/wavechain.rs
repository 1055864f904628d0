// wavechain -- a generator for composite periodic test signals
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `wavechain` renders a chain file into a sampled test signal.

fn main() {
    if let Err(err) = wavechain::app::main() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
