//! Solves a scenario and prints the weekly compartment counts as CSV,
//! one row per sampled week. With no arguments it runs the reference
//! COVID-19 scenario; `--scenario <path>` loads a JSON scenario file
//! and `--verbose` turns on trace logging to stderr.

use std::env;
use std::error::Error;
use std::path::Path;

use seir_core::log::{enable_logging, info};
use seir_core::{COMPARTMENT_LABELS, NUM_COMPARTMENTS, SeirModel, Trajectories, load_scenario};

fn main() {
    let args: Vec<String> = env::args().collect();
    let scenario: Option<String> = parse_flag(&args, "--scenario");
    let verbose = args.iter().any(|arg| arg == "--verbose" || arg == "-v");

    if verbose {
        enable_logging();
    }

    if let Err(error) = run(scenario.as_deref()) {
        eprintln!("weekly_report: {error}");
        std::process::exit(1);
    }
}

fn run(scenario: Option<&str>) -> Result<(), Box<dyn Error>> {
    let model = match scenario {
        Some(path) => load_scenario(Path::new(path))?,
        None => SeirModel::default_covid_scenario(),
    };

    let trajectories = model.solve()?;
    info!(
        "critical-care capacity {:.2} exceeded in {} of {} weeks",
        trajectories.critical_care_capacity(),
        trajectories.weeks_above_critical_capacity(),
        trajectories.len()
    );
    if let Some(average) = trajectories.average_critical_overload() {
        info!("average load in those weeks: {average:.1} beds per 10,000 people");
    }
    write_csv(&trajectories)
}

fn write_csv(trajectories: &Trajectories) -> Result<(), Box<dyn Error>> {
    let columns: [&[f64]; NUM_COMPARTMENTS] = [
        &trajectories.susceptible,
        &trajectories.exposed,
        &trajectories.infectious_mild,
        &trajectories.infectious_pre_hospital,
        &trajectories.infectious_pre_critical,
        &trajectories.recovered_mild,
        &trajectories.hospitalized,
        &trajectories.hospitalized_pre_critical,
        &trajectories.recovered_hospital,
        &trajectories.critical,
        &trajectories.recovered_critical,
    ];
    let days = trajectories.days();
    let total_infected = trajectories.total_infected();
    let total_critical = trajectories.total_critical();

    let mut writer = csv::Writer::from_writer(std::io::stdout());
    let mut header = vec!["week", "day"];
    header.extend(COMPARTMENT_LABELS);
    header.extend(["total_infected", "total_critical"]);
    writer.write_record(&header)?;

    for week in 0..trajectories.len() {
        let mut record = vec![
            trajectories.weeks[week].to_string(),
            days[week].to_string(),
        ];
        record.extend(columns.iter().map(|series| format!("{:.4}", series[week])));
        record.push(format!("{:.4}", total_infected[week]));
        record.push(format!("{:.4}", total_critical[week]));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    for i in 0..args.len() {
        if args[i].starts_with(&format!("{flag}=")) {
            // Split on the first '=' only; the value may contain more.
            return args[i]
                .split_once('=')
                .and_then(|(_, value)| value.parse().ok());
        }
        if args[i] == flag {
            return args.get(i + 1).and_then(|value| value.parse().ok());
        }
    }
    None
}
