//! Run command implementation

use crate::cli::RunArgs;
use crate::output::OutputWriter;
use crate::output_types::RunOutput;
use crate::progress;
use anyhow::{Context, Result};
use chainage_core::config::{CliConfigOverrides, LayeredConfig, PipelineOptions};
use chainage_core::models::RunReport;
use chainage_engine::Pipeline;
use chainage_store::{geojson, MemoryStore};
use std::fs;
use std::path::Path;
use tabled::Tabled;

pub fn execute(
    args: RunArgs,
    output: &OutputWriter,
    config_file: Option<&Path>,
    explain: bool,
) -> Result<()> {
    // Resolve the layered configuration: defaults < file < env < CLI
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = config_file {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
    }
    let mut config = config.load_from_env();
    config.update_from_cli(CliConfigOverrides {
        corridor_radius: args.corridor_radius,
        projection_threshold: args.projection_threshold,
        snap_tolerance: args.snap_tolerance,
        point_tolerance: args.point_tolerance,
        cascade_tolerance: args.cascade_tolerance,
        strategy: args.strategy,
        keep_segments: if args.keep_segments { Some(true) } else { None },
        station_field: args.station_field.clone(),
        segment_field: args.segment_field.clone(),
    });
    let options = config.resolve();

    // Load inputs into a fresh store
    let store = MemoryStore::new();
    let routes_loaded = geojson::load_into_store(&store, "routes", &args.routes)
        .with_context(|| format!("Failed to load routes from {}", args.routes.display()))?;
    let points_loaded = geojson::load_into_store(&store, "asset_points", &args.points)
        .with_context(|| format!("Failed to load points from {}", args.points.display()))?;

    if !output.is_json() {
        output.info(format!(
            "Loaded {} route(s) and {} asset point(s)",
            routes_loaded, points_loaded
        ));
    }

    // Run the pipeline
    let keep_segments = options.keep_segments;
    let pipeline = Pipeline::new(store.clone(), options.clone());
    let report = if output.is_json() {
        pipeline.run()?
    } else {
        let spinner = progress::create_spinner("Running stationing pipeline...");
        match pipeline.run() {
            Ok(report) => {
                progress::finish_success(
                    &spinner,
                    &format!("Stationed {} asset point(s)", report.propagation.points_updated),
                );
                report
            }
            Err(e) => {
                progress::finish_error(&spinner, "Pipeline failed");
                return Err(e.into());
            }
        }
    };

    // Write the output collections
    fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create output directory {}", args.out.display()))?;

    let mut output_files = Vec::new();
    for collection in ["asset_points", "connection_lines"] {
        let path = args.out.join(format!("{}.geojson", collection));
        geojson::export_from_store(&store, collection, &path)?;
        output_files.push(path.display().to_string());
    }
    if keep_segments {
        let path = args.out.join("route_segments.geojson");
        geojson::export_from_store(&store, "route_segments", &path)?;
        output_files.push(path.display().to_string());
    }

    // Display the report
    if output.is_json() {
        output.result(RunOutput { report, output_files })?;
    } else {
        render_report(output, &report, &options, explain);

        for file in &output_files {
            output.kv("Wrote", file);
        }
        output.success(format!(
            "Run complete: route {} ends at station {}",
            report.route_id, report.route_end_station
        ));
    }

    Ok(())
}

/// Render the run report as a stage table, with narration under --explain
fn render_report(
    output: &OutputWriter,
    report: &RunReport,
    options: &PipelineOptions,
    explain: bool,
) {
    output.section("Run Report");
    output.kv("Route", report.route_id);
    output.kv("Route Length", format!("{:.3}", report.route_length));
    output.kv("End Station", report.route_end_station);
    output.kv("Strategy", report.strategy);
    output.kv("Elapsed", format!("{} ms", report.elapsed_ms));

    #[derive(Tabled)]
    struct StageRow {
        #[tabled(rename = "Stage")]
        stage: &'static str,
        #[tabled(rename = "Summary")]
        summary: String,
    }

    let rows = vec![
        StageRow {
            stage: "projection",
            summary: format!(
                "{}/{} projected, {} out of threshold, {} skipped",
                report.projection.points_projected,
                report.projection.points_total,
                report.projection.points_out_of_threshold,
                report.projection.points_skipped
            ),
        },
        StageRow {
            stage: "corridor",
            summary: format!(
                "{} candidates, {} removed",
                report.corridor.candidates, report.corridor.removed
            ),
        },
        StageRow {
            stage: "reference",
            summary: format!(
                "{} segments cut, {} points stationed",
                report.reference.segments_cut, report.reference.points_stationed
            ),
        },
        StageRow {
            stage: "ordering",
            summary: format!(
                "{} segments ranked, {} end points",
                report.ordering.segments_ordered, report.ordering.end_points_created
            ),
        },
        StageRow {
            stage: "propagation",
            summary: format!(
                "{} lines, {} points updated",
                report.propagation.lines_updated, report.propagation.points_updated
            ),
        },
        StageRow {
            stage: "cleanup",
            summary: format!("{} collections deleted", report.cleanup.collections_deleted),
        },
    ];
    output.table(rows);

    if explain {
        output.section("Explanation");
        output.info(format!(
            "Projected each of the {} asset point(s) onto its nearest route; \
             {} landed within the {} unit threshold, {} measured beyond it, \
             and {} had no unambiguous nearest route.",
            report.projection.points_total,
            report.projection.points_projected,
            options.projection_threshold,
            report.projection.points_out_of_threshold,
            report.projection.points_skipped
        ));
        output.info(format!(
            "Buffered the route(s) by {} unit(s) with flat end caps and removed \
             {} of {} derived feature(s) not strictly inside the corridor.",
            options.corridor_radius, report.corridor.removed, report.corridor.candidates
        ));
        output.info(format!(
            "Cut {} start-anchored segment(s) along the owning route and wrote \
             station labels to {} asset point(s).",
            report.reference.segments_cut, report.reference.points_stationed
        ));
        output.info(format!(
            "Ranked the {} telescoping segment(s) by length (shortest first) and \
             derived {} segment end point(s).",
            report.ordering.segments_ordered, report.ordering.end_points_created
        ));
        output.info(format!(
            "Propagated stations by the {} strategy to {} connection line(s) and \
             {} asset point(s).",
            report.strategy, report.propagation.lines_updated, report.propagation.points_updated
        ));
        output.info(format!(
            "Deleted {} scratch collection(s){}.",
            report.cleanup.collections_deleted,
            if options.keep_segments { " (route segments kept)" } else { "" }
        ));
    }
}
