//! JSON output for analyses.
//!
//! Files are organized by date, one file per analyzed label:
//! ```text
//! output_dir/
//! └── 2025-06-05/
//!     ├── tcs.json
//!     └── adani-green-energy.json
//! ```

use crate::models::StockAnalysis;
use crate::utils::slugify_title;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of the file for `analysis` under `output_dir` on `date` (`YYYY-MM-DD`).
pub fn analysis_path(output_dir: &str, date: &str, analysis: &StockAnalysis, extension: &str) -> PathBuf {
    let mut slug = slugify_title(&analysis.stock_symbol);
    if slug.is_empty() {
        slug = "analysis".to_string();
    }
    PathBuf::from(output_dir)
        .join(date)
        .join(format!("{slug}.{extension}"))
}

/// Write a [`StockAnalysis`] as pretty-printed JSON.
///
/// # Output Path
///
/// The file is written to: `{output_dir}/{date}/{slug}.json`
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_analysis(
    analysis: &StockAnalysis,
    output_dir: &str,
    date: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(analysis)?;
    let path = analysis_path(output_dir, date, analysis, "json");

    if let Some(dir) = path.parent() {
        if let Err(e) = fs::create_dir_all(dir).await {
            error!(dir = %dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote analysis JSON");
    Ok(path)
}
