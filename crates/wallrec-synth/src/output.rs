//! Writers for the rating table and user embeddings, plus pre-write backups.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::assembler::Interaction;
use crate::embedding::UserEmbedding;
use crate::error::Result;

/// Header of the rating table.
pub const RATINGS_HEADER: [&str; 4] = ["userId", "wallpaperId", "rating", "timestamp"];

/// Copies `path` to `<path>.bak_<YYYYmmdd_HHMMSS>` if it exists.
///
/// Existing backups are never overwritten; a counter is appended instead.
///
/// Returns the backup path, or `None` when there was nothing to back up.
pub fn backup_if_exists(path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup = unused_backup_path(path, &stamp);
    fs::copy(path, &backup)?;
    info!("[backup] {} -> {}", path.display(), backup.display());
    Ok(Some(backup))
}

/// `<path>.bak_<stamp>`, or `<path>.bak_<stamp>_<n>` with the smallest `n`
/// that does not collide with an earlier backup from the same second.
fn unused_backup_path(path: &Path, stamp: &str) -> PathBuf {
    let with_suffix = |suffix: &str| {
        let mut name = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    };
    let first = with_suffix(&format!(".bak_{stamp}"));
    if !first.exists() {
        return first;
    }
    (1_u32..)
        .map(|n| with_suffix(&format!(".bak_{stamp}_{n}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Creates the parent directory of `path` when missing.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes the rating table as CSV to any writer.
pub fn write_ratings_to<W: Write>(writer: W, rows: &[Interaction]) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(RATINGS_HEADER)?;
    for row in rows {
        csv.write_record(&[
            row.user_id.to_string(),
            row.item_id.to_string(),
            format!("{:.1}", row.rating),
            row.timestamp.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Writes the rating table to `path`.
pub fn write_ratings(path: &Path, rows: &[Interaction]) -> Result<()> {
    ensure_parent_dir(path)?;
    write_ratings_to(BufWriter::new(File::create(path)?), rows)?;
    info!("Wrote {}: {} ratings", path.display(), rows.len());
    Ok(())
}

/// Formats one embedding line: `userId:v1 v2 ...` with six decimals.
#[must_use]
pub fn format_user_embedding(embedding: &UserEmbedding) -> String {
    let values: Vec<String> = embedding
        .vector
        .iter()
        .map(|v| format!("{v:.6}"))
        .collect();
    format!("{}:{}", embedding.user_id, values.join(" "))
}

/// Writes user embeddings, one line per user, to any writer.
pub fn write_user_embeddings_to<W: Write>(mut writer: W, embeddings: &[UserEmbedding]) -> Result<()> {
    for embedding in embeddings {
        writeln!(writer, "{}", format_user_embedding(embedding))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes user embeddings to `path`.
pub fn write_user_embeddings(path: &Path, embeddings: &[UserEmbedding]) -> Result<()> {
    ensure_parent_dir(path)?;
    write_user_embeddings_to(BufWriter::new(File::create(path)?), embeddings)?;
    info!("Wrote {}: {} user embeddings", path.display(), embeddings.len());
    Ok(())
}
