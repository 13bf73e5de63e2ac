//! Tag command implementation

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use tabled::Tabled;
use tracing::info;

use phototag_core::config::{CliConfigOverrides, LayeredConfig};
use phototag_core::formats::read_track_file;
use phototag_core::models::{format_coords, format_timestamp};
use phototag_core::track::TrackIndex;
use phototag_core::{PhotoStore, PhototagError};

use crate::batch::BatchSummary;
use crate::cli::TagArgs;
use crate::exif::ExifSidecar;
use crate::output::OutputWriter;
use crate::progress;

pub fn execute(args: TagArgs, output: &OutputWriter, config_path: Option<&Path>) -> Result<()> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = config_path {
        config = config.load_from_file(path)?;
    }
    let mut config = config.load_from_env();
    config.update_from_cli(CliConfigOverrides {
        clock_offset: args.offset,
        write_elevation: args.no_elevation.then_some(false),
    });

    let source = ExifSidecar::new(config.write_elevation.value);
    let mut index = TrackIndex::new();
    let mut store = PhotoStore::new();
    let mut summary = BatchSummary::new();

    for path in &args.tracks {
        load_track(path, &mut index, output, &mut summary);
    }

    // Each remaining argument is probed as a photo first, then as a
    // track file; only a file that is neither counts as failed.
    for path in &args.files {
        match store.load(path, &source) {
            Ok(_) => {}
            Err(PhototagError::MissingMetadata { reason, .. }) => {
                if !load_track(path, &mut index, output, &mut summary) {
                    let failed = summary.failed.pop();
                    let track_reason = failed
                        .and_then(|item| item.error)
                        .unwrap_or_else(|| "unreadable".to_string());
                    summary.add_failure(
                        path.clone(),
                        "unknown",
                        format!("not a photo ({reason}); not a track ({track_reason})"),
                    );
                }
            }
            Err(err) => summary.add_failure(path.clone(), "photo", err.to_string()),
        }
    }

    if store.is_empty() {
        output.warning("No photos to tag");
        summary.report_failures(output);
        return Ok(());
    }

    if index.len() < 2 {
        output.warning("Not enough track points loaded; photos were left untagged");
    }

    let tagged = store.set_offset(config.clock_offset.value, &index);
    info!(
        tagged,
        photos = store.len(),
        offset = config.clock_offset.value,
        "interpolation complete"
    );

    report_photos(&store, output)?;

    if args.commit {
        commit_all(&mut store, &source, output, &mut summary);
    } else if tagged > 0 {
        output.info("Run again with --commit to save these positions");
    }

    summary.report_failures(output);
    Ok(())
}

/// Load one track file into the shared index. Failures land in the
/// batch summary; the batch keeps going either way.
fn load_track(
    path: &Path,
    index: &mut TrackIndex,
    output: &OutputWriter,
    summary: &mut BatchSummary,
) -> bool {
    let spinner = progress::create_spinner(&format!("Reading {}...", path.display()));
    let mut pulse = || spinner.tick();
    let started = Instant::now();

    match read_track_file(path, index, Some(&mut pulse)) {
        Ok(loaded) => {
            let elapsed = started.elapsed();
            let detail = format!(
                "{} points, {} segments in {:.2?}",
                loaded.summary.points, loaded.summary.segments, elapsed
            );
            progress::finish_success(&spinner, &format!("{}: {detail}", path.display()));
            info!(
                path = %path.display(),
                format = loaded.format.name(),
                points = loaded.summary.points,
                skipped = loaded.summary.skipped,
                unpaired = loaded.summary.unpaired,
                "track loaded"
            );
            if loaded.summary.skipped > 0 {
                output.warning(format!(
                    "{}: {} entries were skipped",
                    path.display(),
                    loaded.summary.skipped
                ));
            }
            if loaded.summary.unpaired > 0 {
                output.warning(format!(
                    "{}: {} timestamps and coordinates could not be paired",
                    path.display(),
                    loaded.summary.unpaired
                ));
            }
            summary.add_success(path.to_path_buf(), loaded.format.name(), detail);
            true
        }
        Err(err) => {
            progress::finish_error(&spinner, &format!("{}", path.display()));
            summary.add_failure(path.to_path_buf(), "track", err.to_string());
            false
        }
    }
}

#[derive(Tabled)]
struct PhotoRow {
    #[tabled(rename = "Photo")]
    photo: String,
    #[tabled(rename = "Captured")]
    captured: String,
    #[tabled(rename = "Position")]
    position: String,
    #[tabled(rename = "State")]
    state: String,
}

fn report_photos(store: &PhotoStore, output: &OutputWriter) -> Result<()> {
    if output.is_json() {
        let records: Vec<_> = store.iter().collect();
        output.result(records)?;
        return Ok(());
    }

    output.section("Photos");
    let rows: Vec<PhotoRow> = store
        .iter()
        .map(|record| PhotoRow {
            photo: record.path.display().to_string(),
            captured: record
                .capture_timestamp
                .map(format_timestamp)
                .unwrap_or_else(|| "unknown".to_string()),
            position: match (record.latitude, record.longitude) {
                (Some(lat), Some(lon)) => format_coords(lat, lon),
                _ => "Not geotagged".to_string(),
            },
            state: if record.manual {
                "manual".to_string()
            } else if record.modified {
                "unsaved".to_string()
            } else {
                "on disk".to_string()
            },
        })
        .collect();
    output.table(rows);
    Ok(())
}

/// Save every modified photo. A failed save is reported and the rest
/// of the batch continues.
fn commit_all(
    store: &mut PhotoStore,
    source: &ExifSidecar,
    output: &OutputWriter,
    summary: &mut BatchSummary,
) {
    let pending: Vec<PathBuf> = store
        .modified()
        .map(|record| record.path.clone())
        .collect();
    if pending.is_empty() {
        output.info("Nothing to save");
        return;
    }

    let bar = progress::create_progress_bar(pending.len() as u64, "Saving photos");
    let mut saved = 0usize;
    for path in pending {
        match store.commit(&path, source) {
            Ok(()) => saved += 1,
            Err(err) => summary.add_failure(path.clone(), "photo", err.to_string()),
        }
        bar.inc(1);
    }
    progress::finish_success(&bar, &format!("Saved {saved} photos"));
    output.success(format!("Saved {saved} photos"));
}
