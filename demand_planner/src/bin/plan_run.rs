//! Plan a batch from JSON inputs
//!
//! Usage: `plan_run <inputs.json> [config.json] [output.json]`
//!
//! Without an output path the run is printed to stdout.

use demand_planner::{logging, Planner, PlanningConfig, PlanningInputs};
use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(inputs_path) = args.first() else {
        eprintln!("Usage: plan_run <inputs.json> [config.json] [output.json]");
        std::process::exit(2);
    };

    let inputs: PlanningInputs = serde_json::from_str(&fs::read_to_string(inputs_path)?)?;
    let config = match args.get(1) {
        Some(path) => PlanningConfig::from_json_file(path)?,
        None => PlanningConfig::default(),
    };

    let run = Planner::new(config)?.run(&inputs)?;
    let json = run.to_json()?;

    match args.get(2) {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }
        None => println!("{}", json),
    }

    let summary = run.plan_summary();
    eprintln!(
        "{} SKUs planned, {} to order ({} units), {} on default lead time",
        summary.total_skus, summary.skus_to_order, summary.total_units, summary.default_lead_time_skus
    );
    Ok(())
}
