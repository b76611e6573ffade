// Copyright 2021 Locha Mesh Developers <contact@locha.io>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Status messages printed while programming.

use std::fmt::Display;

#[cfg(unix)]
use ansi_term::Colour::{Green, Red};

pub fn step<D: Display>(msg: D) {
    println!("{} ...", msg);
}

#[cfg(unix)]
pub fn success<D: Display>(msg: D) {
    println!("{} {}.", Green.bold().paint("SUCCESS:"), msg);
}

#[cfg(not(unix))]
pub fn success<D: Display>(msg: D) {
    println!("SUCCESS: {}.", msg);
}

#[cfg(unix)]
pub fn error<D: Display>(msg: D) {
    eprintln!("{} {}!", Red.bold().paint("ERROR:"), msg);
}

#[cfg(not(unix))]
pub fn error<D: Display>(msg: D) {
    eprintln!("ERROR: {}!", msg);
}
