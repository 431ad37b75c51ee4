//! JSON snapshot of the assembled source bundle.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2026-10-18/
//!     └── sources.json
//! ```
//!
//! A later run on the same date overwrites the snapshot.

use crate::models::SourceBundle;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

const SNAPSHOT_FILE: &str = "sources.json";

/// Write the bundle as pretty-printed JSON under a dated directory.
///
/// # Arguments
///
/// * `bundle` - The ordered source entries of this run
/// * `json_output_dir` - Root directory; created along with the date
///   subdirectory when missing
///
/// # Returns
///
/// The path written, `{json_output_dir}/{local_date}/sources.json`.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_bundle(
    bundle: &SourceBundle,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(bundle)?;

    let dir = PathBuf::from(json_output_dir).join(&bundle.local_date);
    info!(dir = %dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&dir).await {
        error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = dir.join(SNAPSHOT_FILE);
    fs::write(&path, json).await?;
    info!(path = %path.display(), entries = bundle.entries.len(), "Wrote source snapshot");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshot_lands_under_date_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut bundle = SourceBundle::new("2026-10-18".to_string());
        bundle.push("Gazette de l'Ontario", "Avis publiés cette semaine.");

        let path = write_bundle(&bundle, dir.path().to_str().unwrap()).await.unwrap();
        assert_eq!(path, dir.path().join("2026-10-18").join("sources.json"));

        let raw = std::fs::read_to_string(&path).unwrap();
        let back: SourceBundle = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.local_date, "2026-10-18");
        assert_eq!(back.entries[0].name, "Gazette de l'Ontario");
        assert_eq!(back.entries[0].text, "Avis publiés cette semaine.");
    }

    #[tokio::test]
    async fn test_second_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let mut bundle = SourceBundle::new("2026-10-18".to_string());
        bundle.push("A", "first");
        write_bundle(&bundle, root).await.unwrap();

        bundle.entries[0].text = "second".to_string();
        let path = write_bundle(&bundle, root).await.unwrap();
        let back: SourceBundle = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back.entries[0].text, "second");
    }
}
