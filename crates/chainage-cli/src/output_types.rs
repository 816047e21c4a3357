use chainage_core::models::RunReport;
use serde::Serialize;

/// Output for run command
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub report: RunReport,
    pub output_files: Vec<String>,
}

/// Output for station command
#[derive(Debug, Serialize)]
pub struct StationOutput {
    pub input: String,
    pub units: u64,
    pub hundreds: u64,
    pub remainder: u64,
    pub label: String,
}

/// Output for transfer command
#[derive(Debug, Serialize)]
pub struct TransferOutput {
    pub source: String,
    pub target: String,
    pub fields: Vec<String>,
    pub targets_updated: usize,
    pub output_file: String,
}

/// One entry of the layered configuration for config show
#[derive(Debug, Serialize)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub source: String,
}
