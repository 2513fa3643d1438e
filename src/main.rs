// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use clap::{App, Arg, ArgMatches};
use log::info;

use mandelbench::raster;
use mandelbench::{Complex, ImageFormat, PlaneWindow, RenderConfig, RenderError, Strategy};

/// Given a string and a separator, returns the two values
/// separated by the separator.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

/// A specific implementation of parse_pair using a comma and expecting
/// floating point numbers.
fn parse_complex(s: &str) -> Option<Complex> {
    parse_pair(s, ',').map(|(re, im)| Complex::new(re, im))
}

/// Image dimensions, `WIDTHxHEIGHT`.  The validator and the config
/// both go through here so they agree on what a size is.
fn parse_size(s: &str) -> Option<(usize, usize)> {
    parse_pair(s, 'x').filter(|&(w, h)| w > 0 && h > 0)
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const ITERATIONS: &str = "iterations";
const STRATEGY: &str = "strategy";
const THREADS: &str = "threads";
const FORMAT: &str = "format";

const MAX_THREADS: usize = 4096;

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandelbench")
        .version("0.1.0")
        .about("Renders the Mandelbrot set sequentially, per column, and on a worker pool")
        .arg(
            Arg::with_name(OUTPUT)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value(".")
                .help("Directory the images are written to"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1024x1024")
                .validator(|s| match parse_size(&s) {
                    Some(_) => Ok(()),
                    None => Err("Could not parse output image size".to_string()),
                })
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2.0,-1.2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the mandelbrot space"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0.75,1.2")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the mandelbrot space"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("50")
                .validator(|s| {
                    validate_range(
                        &s,
                        1u32,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Maximum escape-time iterations per point"),
        )
        .arg(
            Arg::with_name(STRATEGY)
                .long(STRATEGY)
                .short("m")
                .takes_value(true)
                .multiple(true)
                .use_delimiter(true)
                .possible_values(&["all", "sequential", "parallel", "pool"])
                .default_value("all")
                .help("Execution strategies to run"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        MAX_THREADS,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", MAX_THREADS),
                    )
                })
                .help("Worker pool size (defaults to the number of CPUs)"),
        )
        .arg(
            Arg::with_name(FORMAT)
                .long(FORMAT)
                .short("f")
                .takes_value(true)
                .possible_values(&["png", "pgm"])
                .default_value("png")
                .help("Image encoding"),
        )
        .get_matches()
}

fn value<'m>(matches: &'m ArgMatches, name: &str) -> Result<&'m str, String> {
    matches
        .value_of(name)
        .ok_or_else(|| format!("missing --{}", name))
}

fn config_from(matches: &ArgMatches) -> Result<RenderConfig, String> {
    let (width, height) = parse_size(value(matches, SIZE)?)
        .ok_or_else(|| "Error parsing image dimensions".to_string())?;
    let leftlower = parse_complex(value(matches, LEFTLOWER)?)
        .ok_or_else(|| "Error parsing left lower point".to_string())?;
    let rightupper = parse_complex(value(matches, RIGHTUPPER)?)
        .ok_or_else(|| "Error parsing right upper point".to_string())?;
    let window = PlaneWindow::from_corners(leftlower, rightupper).map_err(|e| e.to_string())?;
    let depth = u32::from_str(value(matches, ITERATIONS)?).map_err(|e| e.to_string())?;
    let threads = match matches.value_of(THREADS) {
        Some(t) => usize::from_str(t).map_err(|e| e.to_string())?,
        None => num_cpus::get(),
    };
    let format = ImageFormat::from_str(value(matches, FORMAT)?)?;

    let mut strategies = vec![];
    for name in matches.values_of(STRATEGY).into_iter().flatten() {
        let chosen = match name {
            "all" => vec![
                Strategy::Sequential,
                Strategy::Unbounded,
                Strategy::Pool(threads),
            ],
            "pool" => vec![Strategy::Pool(threads)],
            other => vec![Strategy::from_str(other)?],
        };
        for strategy in chosen {
            if !strategies.contains(&strategy) {
                strategies.push(strategy);
            }
        }
    }

    Ok(RenderConfig {
        width,
        height,
        window,
        depth,
        strategies,
        output_dir: PathBuf::from(value(matches, OUTPUT)?),
        format,
    })
}

fn run(config: &RenderConfig) -> Result<(), RenderError> {
    let renderer = config.renderer()?;
    fs::create_dir_all(&config.output_dir)?;
    for &strategy in &config.strategies {
        let start = Instant::now();
        let grid = renderer.render(strategy)?;
        info!(
            "{}: {}x{} at depth {} in {:?}",
            strategy,
            config.width,
            config.height,
            config.depth,
            start.elapsed()
        );
        let path = raster::save(
            &grid,
            strategy,
            config.depth,
            &config.output_dir,
            config.format,
        )?;
        println!("{}", path.display());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let matches = args();

    let config = match config_from(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
