#[macro_use]
extern crate clap;
use clap::{App, Arg, ArgMatches, SubCommand};

#[macro_use]
extern crate failure;
use failure::Error;

use log::{error, info};
use std::io;
use std::path::Path;

mod cli_utils;
mod comp_finder;
mod config;
mod file_processor;

use chrono::offset::Local;
use comp_finder::{CompFinder, PropertyCategory, SortMode};
use config::MatchConfig;

#[derive(Debug, Fail)]
pub enum MainError {
    #[fail(display = "Invalid value for --{}: {}", _0, _1)]
    InvalidOption(&'static str, String),
}

fn main() {
    let matches = build_cli().get_matches();

    let verbose = matches
        .subcommand_matches("match")
        .map_or(false, |m| m.is_present("verbose"));
    let level = if verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let local_time = Local::now();
    let time_offset = local_time.offset();
    // Configure logging
    simplelog::TermLogger::init(
        level,
        simplelog::Config {
            offset: time_offset.clone(),
            ..simplelog::Config::default()
        },
        simplelog::TerminalMode::Stderr,
    )
    .ok();

    match do_main(&matches) {
        Ok(_) => info!("Process finished OK"),
        Err(err) => {
            error!("Process finished with an error: {}", err);
            std::process::exit(1);
        }
    };
}

fn build_cli<'a, 'b>() -> App<'a, 'b> {
    App::new("comp_matcher")
        .version("0.1.0")
        .author("Gustavo Ajzenman")
        .about("Find comparable properties for tax assessment protests")
        .subcommand(
            SubCommand::with_name("match")
                .about("Match every subject row against the source pool")
                .arg(Arg::with_name("subjects")
                    .short("s")
                    .long("subjects")
                    .help("CSV with the subject properties.")
                    .takes_value(true)
                    .required(true)
                )
                .arg(Arg::with_name("source")
                    .short("c")
                    .long("source")
                    .help("CSV with the candidate pool.")
                    .takes_value(true)
                    .required(true)
                )
                .arg(Arg::with_name("output")
                    .short("o")
                    .long("output")
                    .help("Sets the output file to create. If omitted, stdout will be used.")
                    .takes_value(true)
                )
                .arg(Arg::with_name("config")
                    .long("config")
                    .help("JSON file with match settings. Flags below override it.")
                    .takes_value(true)
                )
                .arg(Arg::with_name("delimiter")
                    .short("d")
                    .long("delimiter")
                    .help("Delimiter for input and output fields")
                    .takes_value(true)
                    .default_value(",")
                )
                .arg(Arg::with_name("category")
                    .long("category")
                    .help("hotel, apartment, office, warehouse, retail or other")
                    .takes_value(true)
                )
                .arg(Arg::with_name("no-hotel-class-rule")
                    .long("no-hotel-class-rule")
                    .help("Do not screen hotel comps by class.")
                )
                .arg(Arg::with_name("radius")
                    .long("radius")
                    .help("Max radius in miles for the distance tier.")
                    .takes_value(true)
                )
                .arg(Arg::with_name("max-gap-metric")
                    .long("max-gap-metric")
                    .help("Max VPR/VPU gap, as a fraction or a percent.")
                    .takes_value(true)
                )
                .arg(Arg::with_name("max-gap-value")
                    .long("max-gap-value")
                    .help("Max market value gap, as a fraction or a percent.")
                    .takes_value(true)
                )
                .arg(Arg::with_name("max-gap-size")
                    .long("max-gap-size")
                    .help("Max rooms/units/GBA gap, as a fraction or a percent.")
                    .takes_value(true)
                )
                .arg(Arg::with_name("max-comps")
                    .long("max-comps")
                    .help("Number of comps to keep per subject.")
                    .takes_value(true)
                )
                .arg(Arg::with_name("relaxed-distance")
                    .long("relaxed-distance")
                    .help("Skip the radius tier and match by ZIP, city and county only.")
                )
                .arg(Arg::with_name("no-county-match")
                    .long("no-county-match")
                    .help("Do not accept comps that only share the county.")
                )
                .arg(Arg::with_name("sort-mode")
                    .long("sort-mode")
                    .help("distance or gap")
                    .takes_value(true)
                )
                .arg(Arg::with_name("verbose")
                    .short("v")
                    .long("verbose")
                    .help("Debug logging.")
                )
                .arg(Arg::with_name("quiet")
                    .short("q")
                    .long("quiet")
                    .help("Hide the progress bar.")
                )
        )
}

fn fraction_arg(matches: &ArgMatches, name: &'static str) -> Result<Option<f64>, MainError> {
    match matches.value_of(name) {
        None => Ok(None),
        Some(raw) => config::parse_fraction(raw)
            .map(Some)
            .ok_or_else(|| MainError::InvalidOption(name, raw.to_owned())),
    }
}

fn load_config(matches: &ArgMatches) -> Result<MatchConfig, Error> {
    let mut config = match matches.value_of("config") {
        Some(path) => {
            info!("Loading match settings from {}", path);
            MatchConfig::from_json_file(path)?
        }
        None => MatchConfig::default(),
    };

    if let Some(raw) = matches.value_of("category") {
        config.category = raw
            .parse::<PropertyCategory>()
            .map_err(|e| MainError::InvalidOption("category", e))?;
    }
    if matches.is_present("no-hotel-class-rule") {
        config.use_hotel_class_rule = false;
    }
    if matches.is_present("radius") {
        config.max_radius_miles = value_t!(matches, "radius", f64)?;
    }
    if let Some(pct) = fraction_arg(matches, "max-gap-metric")? {
        config.max_gap_pct_main = pct;
    }
    if let Some(pct) = fraction_arg(matches, "max-gap-value")? {
        config.max_gap_pct_value = pct;
    }
    if let Some(pct) = fraction_arg(matches, "max-gap-size")? {
        config.max_gap_pct_size = pct;
    }
    if matches.is_present("max-comps") {
        config.max_comps = value_t!(matches, "max-comps", usize)?;
    }
    if matches.is_present("relaxed-distance") {
        config.use_strict_distance = false;
    }
    if matches.is_present("no-county-match") {
        config.use_county_match = false;
    }
    if let Some(raw) = matches.value_of("sort-mode") {
        config.sort_mode = raw
            .parse::<SortMode>()
            .map_err(|e| MainError::InvalidOption("sort-mode", e))?;
    }

    config.validate()?;
    Ok(config)
}

fn load_dataset_command<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
) -> Result<file_processor::Dataset, Error> {
    info!("Loading {} ...", path.as_ref().display());
    let input_file = std::fs::File::open(&path)?;
    let dataset = file_processor::load_dataset(io::BufReader::new(input_file), delimiter)?;
    info!(
        "Loaded {} rows from {} ({} skipped)",
        dataset.records.len(),
        path.as_ref().display(),
        dataset.skipped_rows
    );
    Ok(dataset)
}

fn match_command(matches: &ArgMatches) -> Result<(), Error> {
    let config = load_config(matches)?;
    info!("Match settings: {:?}", config);

    // Parse the delimiter. Should be exactly one character.
    let delimiter = matches
        .value_of("delimiter")
        .unwrap_or_default()
        .replace("\\t", "\t");
    let char_delimiter: u8 = match delimiter.as_bytes() {
        [c] => *c,
        _ => return Err(MainError::InvalidOption("delimiter", delimiter.clone()).into()),
    };

    let subjects = load_dataset_command(matches.value_of("subjects").unwrap_or_default(), char_delimiter)?;
    let source = load_dataset_command(matches.value_of("source").unwrap_or_default(), char_delimiter)?;

    let stdout = io::stdout();
    let mut output_file: Box<dyn io::Write> = match matches.value_of("output") {
        Some(path) => {
            info!("Writing to file {}.", path);
            Box::new(io::BufWriter::new(std::fs::File::create(path)?))
        }
        None => {
            info!("Writing to stdout");
            Box::new(stdout.lock())
        }
    };

    let finder = CompFinder::new(&config);
    let stats = file_processor::match_comps(
        &finder,
        config.max_comps,
        &subjects,
        &source,
        output_file.as_mut(),
        char_delimiter,
        matches.is_present("quiet"),
    )?;

    info!("Stats: {:?}", stats);
    Ok(())
}

fn do_main(matches: &ArgMatches) -> Result<(), Error> {
    if let Some(match_matches) = matches.subcommand_matches("match") {
        return match_command(match_matches);
    }

    error!("No command given. Try --help.");
    Ok(())
}
