//! The module responsible for writing results to disk.
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The root folder in which analysis-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "lcos_results";

/// The output file name for results
pub const RESULTS_FILE_NAME: &str = "lcos_results.csv";

/// Get the default output directory for the analysis file at the specified path
pub fn get_output_dir(analysis_path: &Path) -> Result<PathBuf> {
    let analysis_name = analysis_path
        .file_stem()
        .context("Analysis file path has no file name")?
        .to_str()
        .context("Invalid chars in analysis file name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, analysis_name].iter().collect())
}

/// Create a new output directory.
///
/// An existing directory which is not empty is only reused if `allow_overwrite` is true, in which
/// case its contents are deleted first.
///
/// # Returns
///
/// Whether an existing directory was overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if output_dir.is_dir() {
        let is_empty = fs::read_dir(output_dir)?.next().is_none();
        if is_empty {
            // Empty directories can be reused as is
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please choose a different folder or use the --overwrite option."
        );
        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// A row of the results file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    /// The name of the quantity
    pub metric: &'static str,
    /// The cost case (`low`, `base` or `high`), for costs
    pub case: Option<&'static str>,
    /// The value, expressed in `unit`
    pub value: f64,
    /// The unit of `value`
    pub unit: String,
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.metric)?;
        if let Some(case) = self.case {
            write!(f, " ({case})")?;
        }
        write!(f, ": {} {}", self.value, self.unit)
    }
}

/// Write results to a CSV file in `output_dir`, returning the path to the file
pub fn write_results(output_dir: &Path, rows: &[ResultRow]) -> Result<PathBuf> {
    let file_path = output_dir.join(RESULTS_FILE_NAME);
    let mut writer = csv::Writer::from_path(&file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(file_path)
}
