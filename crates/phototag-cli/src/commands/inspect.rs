//! Inspect command implementation

use anyhow::Result;
use serde::Serialize;

use phototag_core::formats::{read_track_file, ParseSummary};
use phototag_core::models::format_timestamp;
use phototag_core::track::TrackIndex;

use crate::batch::BatchSummary;
use crate::cli::InspectArgs;
use crate::output::OutputWriter;
use crate::progress;

#[derive(Debug, Serialize)]
struct InspectReport {
    path: String,
    format: &'static str,
    summary: ParseSummary,
    earliest: Option<i64>,
    latest: Option<i64>,
    /// [min_lon, min_lat, max_lon, max_lat]
    bounds: Option<[f64; 4]>,
}

pub fn execute(args: InspectArgs, output: &OutputWriter) -> Result<()> {
    let mut batch = BatchSummary::new();

    for path in &args.files {
        let spinner = progress::create_spinner(&format!("Reading {}...", path.display()));
        let mut pulse = || spinner.tick();

        let mut index = TrackIndex::new();
        match read_track_file(path, &mut index, Some(&mut pulse)) {
            Ok(loaded) => {
                progress::finish_success(&spinner, &path.display().to_string());
                let report = InspectReport {
                    path: path.display().to_string(),
                    format: loaded.format.name(),
                    summary: loaded.summary,
                    earliest: index.earliest(),
                    latest: index.latest(),
                    bounds: index.bounding_box().map(|rect| {
                        [rect.min().x, rect.min().y, rect.max().x, rect.max().y]
                    }),
                };
                show(&report, output)?;
                batch.add_success(
                    path.clone(),
                    loaded.format.name(),
                    format!("{} points", loaded.summary.points),
                );
            }
            Err(err) => {
                progress::finish_error(&spinner, &path.display().to_string());
                batch.add_failure(path.clone(), "track", err.to_string());
            }
        }
    }

    batch.report_failures(output);
    Ok(())
}

fn show(report: &InspectReport, output: &OutputWriter) -> Result<()> {
    if output.is_json() {
        output.result(report)?;
        return Ok(());
    }

    output.section(&report.path);
    output.kv("Format", report.format);
    output.kv("Points", report.summary.points);
    output.kv("Segments", report.summary.segments);
    if report.summary.skipped > 0 {
        output.kv("Skipped entries", report.summary.skipped);
    }
    if report.summary.unpaired > 0 {
        output.kv("Unpaired entries", report.summary.unpaired);
    }
    if let (Some(earliest), Some(latest)) = (report.earliest, report.latest) {
        output.kv(
            "Time range",
            format!(
                "{} to {} UTC",
                format_timestamp(earliest),
                format_timestamp(latest)
            ),
        );
    }
    if let Some([min_lon, min_lat, max_lon, max_lat]) = report.bounds {
        output.kv(
            "Bounds",
            format!("lat {min_lat:.5} to {max_lat:.5}, lon {min_lon:.5} to {max_lon:.5}"),
        );
    }
    Ok(())
}
