//! Station command implementation

use crate::cli::StationArgs;
use crate::output::OutputWriter;
use crate::output_types::StationOutput;
use anyhow::{Context, Result};
use chainage_core::config::parse_station;
use chainage_core::models::Station;

pub fn execute(args: StationArgs, output: &OutputWriter) -> Result<()> {
    let station: Station = if args.parse {
        args.value
            .parse()
            .with_context(|| format!("'{}' is not an HH+RR label", args.value))?
    } else {
        parse_station(&args.value)
            .with_context(|| format!("'{}' is not a distance or an HH+RR label", args.value))?
    };

    if output.is_json() {
        output.result(StationOutput {
            input: args.value.clone(),
            units: station.units(),
            hundreds: station.hundreds(),
            remainder: station.remainder(),
            label: station.to_string(),
        })?;
    } else if args.parse {
        output.kv("Label", &args.value);
        output.kv("Units", station.units());
        output.success(format!(
            "{} marks {} whole unit(s) along the alignment",
            args.value,
            station.units()
        ));
    } else {
        output.kv("Distance", &args.value);
        output.kv("Station", station);
        output.success(format!("{} stations as {}", args.value, station));
    }

    Ok(())
}
