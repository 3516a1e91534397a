//! Output generation for analyses and news lists.
//!
//! # Submodules
//!
//! - [`json`]: Writes `StockAnalysis` data to JSON files
//! - [`markdown`]: Renders analyses and article lists as Markdown
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── 2025-06-05/
//!     ├── tcs.json
//!     └── tcs.md
//! ```

pub mod json;
pub mod markdown;
