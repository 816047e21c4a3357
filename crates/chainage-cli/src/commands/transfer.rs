//! Transfer command implementation

use crate::cli::TransferArgs;
use crate::output::OutputWriter;
use crate::output_types::TransferOutput;
use anyhow::{Context, Result};
use chainage_core::config::LayeredConfig;
use chainage_engine::{AttributePropagator, CollectionNames};
use chainage_store::{geojson, MemoryStore};
use std::path::Path;

const SOURCE_COLLECTION: &str = "transfer_source";
const TARGET_COLLECTION: &str = "transfer_target";

pub fn execute(args: TransferArgs, output: &OutputWriter, config_file: Option<&Path>) -> Result<()> {
    // Station field ordering comes from the layered configuration
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = config_file {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
    }
    let config = config.load_from_env();
    let options = config.resolve();

    let store = MemoryStore::new();
    let sources = geojson::load_into_store(&store, SOURCE_COLLECTION, &args.source)
        .with_context(|| format!("Failed to load sources from {}", args.source.display()))?;
    let targets = geojson::load_into_store(&store, TARGET_COLLECTION, &args.target)
        .with_context(|| format!("Failed to load targets from {}", args.target.display()))?;

    if !output.is_json() {
        output.info(format!(
            "Transferring {:?} from {} source(s) onto {} target(s)",
            args.fields, sources, targets
        ));
    }

    let names = CollectionNames::default();
    let propagator = AttributePropagator::new(&options, &names);
    let targets_updated =
        propagator.transfer(&store, SOURCE_COLLECTION, TARGET_COLLECTION, &args.fields)?;

    geojson::export_from_store(&store, TARGET_COLLECTION, &args.out)
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    if output.is_json() {
        output.result(TransferOutput {
            source: args.source.display().to_string(),
            target: args.target.display().to_string(),
            fields: args.fields.clone(),
            targets_updated,
            output_file: args.out.display().to_string(),
        })?;
    } else {
        output.kv("Targets Updated", targets_updated);
        output.kv("Wrote", args.out.display());
        output.success(format!("Transferred attributes onto {} target(s)", targets_updated));
    }

    Ok(())
}
