use chainage_core::config::parse_strategy;
use chainage_core::models::PropagationStrategy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chainage - linear referencing for point assets along routes
#[derive(Parser, Debug)]
#[command(name = "chainage")]
#[command(about = "Station point assets along routes", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Read configuration from a TOML file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show detailed explanation of operations
    #[arg(long, global = true)]
    pub explain: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the stationing pipeline over GeoJSON inputs
    Run(RunArgs),

    /// Render a station label from a distance, or parse one back
    Station(StationArgs),

    /// Copy attributes from one GeoJSON collection onto another
    Transfer(TransferArgs),

    /// Inspect the layered configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// GeoJSON file holding the route line(s)
    #[arg(long, value_name = "FILE")]
    pub routes: PathBuf,

    /// GeoJSON file holding the asset points
    #[arg(long, value_name = "FILE")]
    pub points: PathBuf,

    /// Directory for the output GeoJSON files
    #[arg(long, value_name = "DIR", default_value = "out")]
    pub out: PathBuf,

    /// Corridor buffer radius around the route
    #[arg(long)]
    pub corridor_radius: Option<f64>,

    /// Maximum projection distance for a point to join the run
    #[arg(long)]
    pub projection_threshold: Option<f64>,

    /// Line-to-segment association tolerance (nearest-match strategy)
    #[arg(long)]
    pub snap_tolerance: Option<f64>,

    /// Point-to-line association tolerance (nearest-match strategy)
    #[arg(long)]
    pub point_tolerance: Option<f64>,

    /// Selection tolerance per cascade step
    #[arg(long)]
    pub cascade_tolerance: Option<f64>,

    /// Propagation strategy (nearest-match or cascade)
    #[arg(long, value_parser = parse_strategy)]
    pub strategy: Option<PropagationStrategy>,

    /// Keep the route segment collection after the run
    #[arg(long)]
    pub keep_segments: bool,

    /// Output field name for station labels
    #[arg(long, value_name = "NAME")]
    pub station_field: Option<String>,

    /// Output field name for segment IDs
    #[arg(long, value_name = "NAME")]
    pub segment_field: Option<String>,
}

#[derive(Parser, Debug)]
pub struct StationArgs {
    /// Distance along the alignment (e.g. "124.836"), or an HH+RR label
    pub value: String,

    /// Treat the value as an HH+RR label and report its distance
    #[arg(long)]
    pub parse: bool,
}

#[derive(Parser, Debug)]
pub struct TransferArgs {
    /// GeoJSON file holding the source features (attribute donors)
    #[arg(long, value_name = "FILE")]
    pub source: PathBuf,

    /// GeoJSON file holding the target features
    #[arg(long, value_name = "FILE")]
    pub target: PathBuf,

    /// Output GeoJSON file for the updated targets
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,

    /// Attribute fields to copy (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "STATIONING")]
    pub fields: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration command
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print every key with its value and the layer it came from
    Show,
}
