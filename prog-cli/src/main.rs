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

use std::{path::PathBuf, process, time::Duration};

use stc_isp::{
    config::{DEFAULT_BAUD, DEFAULT_PORT},
    util, Config, PortSelector, Programmer,
};

use anyhow::{Context, Result};
use clap::{
    crate_authors, crate_version, App, AppSettings, Arg, ArgMatches,
    SubCommand,
};

mod console;
mod flash;
mod list;

const LOG_ENV: &str = "STC_ISP_PROG_LOG";

fn main() {
    if let Err(e) = run() {
        console::error(format!("{:#}", e));
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli().get_matches();

    init_logger(args.occurrences_of("verbose"));

    if args.subcommand_matches("list").is_some() {
        return list::list();
    }

    let global_args = GlobalArgs::from_matches(&args)?;

    if !global_args.erase && global_args.flash.is_none() {
        println!("No arguments - no action!");
        return Ok(());
    }

    // Load the image first, no need to wait for the MCU if it's unusable.
    let binary = match global_args.flash {
        Some(ref path) => Some(flash::load_image(path)?),
        None => None,
    };

    console::step(format!(
        "Connecting via {}, waiting for MCU power cycle",
        global_args.config.port
    ));
    let mut isp = Programmer::connect(global_args.config)?;
    let chip = isp.chip();
    console::success(format!("Found {} version {}", chip.name, chip.version));
    log::info!("Flash size: {} K", chip.flash_size / 1024);

    console::step("Setting BAUD rate");
    isp.set_baud().context("Failed to set BAUD rate")?;
    isp.check_baud().context("BAUD rate check failed")?;
    console::success(format!("BAUD rate set to {}", isp.baud()));

    console::step("Performing chip erase");
    isp.erase().context("Failed to erase flash")?;
    console::success("Chip is erased");

    if let (Some(binary), Some(path)) = (binary, global_args.flash) {
        console::step(format!("Flashing {} to MCU", path.display()));
        flash::flash(&binary, global_args.chunk_size, &mut isp)?;
        console::success(format!("{} bytes written", binary.len()));
    }

    println!("DONE.");

    Ok(())
}

struct GlobalArgs {
    config: Config,
    erase: bool,
    flash: Option<PathBuf>,
    chunk_size: usize,
}

impl GlobalArgs {
    fn from_matches(args: &ArgMatches<'_>) -> Result<GlobalArgs> {
        let port = match (args.value_of("vid"), args.value_of("pid")) {
            (Some(vid), Some(pid)) => PortSelector::ByVendorProduct(
                parse_hex(vid).context("Invalid USB vendor ID")?,
                parse_hex(pid).context("Invalid USB product ID")?,
            ),
            _ => PortSelector::ByPath(
                args.value_of("port").unwrap_or(DEFAULT_PORT).to_owned(),
            ),
        };

        let baud = match args.value_of("baudrate") {
            Some(b) => b.parse().context("Invalid baud rate")?,
            None => DEFAULT_BAUD,
        };

        let handshake_baud = match args.value_of("handshake-baudrate") {
            Some(b) => b.parse().context("Invalid handshake baud rate")?,
            None => baud,
        };

        let wait: u64 = args
            .value_of("wait")
            .unwrap_or("10")
            .parse()
            .context("Invalid power cycle wait time")?;

        let chunk_size = match args.value_of("chunk-size") {
            Some(n) => match n.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => anyhow::bail!("Invalid chunk size `{}`", n),
            },
            None => util::DEFAULT_CHUNK_SIZE,
        };

        Ok(GlobalArgs {
            config: Config {
                port,
                baud,
                handshake_baud,
                power_cycle_wait: Duration::from_secs(wait),
            },
            // Erase is implied when flashing.
            erase: args.is_present("erase") || args.is_present("flash"),
            flash: args.value_of("flash").map(PathBuf::from),
            chunk_size,
        })
    }
}

fn parse_hex(s: &str) -> Result<u16> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    Ok(u16::from_str_radix(digits, 16)?)
}

fn init_logger(verbosity: u64) {
    #[cfg(feature = "pretty-env-logger")]
    let mut builder = pretty_env_logger::formatted_builder();
    #[cfg(not(feature = "pretty-env-logger"))]
    let mut builder = env_logger::Builder::new();

    builder.parse_filters(match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    });
    if let Ok(filters) = std::env::var(LOG_ENV) {
        builder.parse_filters(&filters);
    }

    builder.init();
}

fn cli() -> App<'static, 'static> {
    App::new("STC8 ISP Programmer")
        .usage("stc-isp-prog [OPTIONS] [SUBCOMMAND]")
        .setting(AppSettings::ColoredHelp)
        .version(crate_version!())
        .author(crate_authors!())
        .about("Programmer for STC8G/STC8H microcontrollers using the factory UART bootloader.\nPower cycle the MCU when prompted.")
        .arg(
            opt("port", "Serial port to use")
                .short("p")
                .takes_value(true)
                .default_value(DEFAULT_PORT)
        )
        .arg(
            opt("vid", "USB vendor ID of the USB-to-serial converter, e.g. 1A86. Together with --pid, searches all ports instead of using --port")
                .takes_value(true)
                .requires("pid")
        )
        .arg(
            opt("pid", "USB product ID of the USB-to-serial converter, e.g. 7523")
                .takes_value(true)
                .requires("vid")
        )
        .arg(
            opt("baudrate", "Baud rate used for programming, 2400 - 115200")
                .short("b")
                .takes_value(true)
                .default_value("115200")
        )
        .arg(
            opt("handshake-baudrate", "Baud rate used while waiting for the MCU, defaults to --baudrate")
                .takes_value(true)
        )
        .arg(
            opt("wait", "Time to wait for the MCU power cycle, in seconds")
                .short("w")
                .takes_value(true)
                .default_value("10")
        )
        .arg(
            opt("erase", "Perform chip erase (implied with --flash)")
                .short("e")
        )
        .arg(
            opt("flash", "Write BIN file to flash")
                .short("f")
                .takes_value(true)
                .value_name("BIN")
        )
        .arg(
            opt("chunk-size", "Maximum number of bytes sent in a single write command, by default the whole file")
                .takes_value(true)
        )
        .arg(
            opt("verbose", "Use verbose output: -v (debug), -vv (trace)")
                .short("v")
                .multiple(true)
        )
        .subcommand(
            SubCommand::with_name("list")
                .about("List the available serial ports")
                .setting(AppSettings::ColoredHelp)
        )
}

fn opt(name: &'static str, help: &'static str) -> Arg<'static, 'static> {
    Arg::with_name(name).long(name).help(help)
}
