use crate::models::{Listing, Rejection};
use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Creates the parent directory of `path` if it is missing.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    Ok(())
}

fn write_pretty_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Writes the catalog as a pretty-printed JSON array.
pub fn save_listings_to_json(listings: &[Listing], path: &Path) -> Result<()> {
    write_pretty_json(listings, path)?;
    info!("saved {} listings to {}", listings.len(), path.display());
    Ok(())
}

/// Writes the rejection log as a pretty-printed JSON array.
pub fn save_rejections_to_json(rejections: &[Rejection], path: &Path) -> Result<()> {
    write_pretty_json(rejections, path)?;
    info!("saved {} rejections to {}", rejections.len(), path.display());
    Ok(())
}

/// Writes the catalog as CSV with a `ref,title,url,price,beds,area` header.
pub fn save_listings_to_csv(listings: &[Listing], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;

    for listing in listings {
        writer.serialize(listing)?;
    }
    if listings.is_empty() {
        writer.write_record(["ref", "title", "url", "price", "beds", "area"])?;
    }

    writer.flush()?;
    info!("saved {} listings to {}", listings.len(), path.display());
    Ok(())
}

/// Copies an existing file to `<name>.<timestamp>.bak` next to it.
/// Returns the backup path, or `None` when there was nothing to back up.
pub fn backup_existing(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let backup = path.with_file_name(format!("{}.{}.bak", file_name, timestamp));

    fs::copy(path, &backup).with_context(|| {
        format!("Failed to back up {} to {}", path.display(), backup.display())
    })?;
    info!("backed up {} to {}", path.display(), backup.display());
    Ok(Some(backup))
}
