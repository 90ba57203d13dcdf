//! JSON export of a crawl result

use crate::report::model::CrawlResult;
use crate::report::ReportError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serializes the crawl result as pretty JSON
pub fn to_json(result: &CrawlResult) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Writes the crawl result to `path` as a JSON array of page records
pub fn write_json(result: &CrawlResult, path: &Path) -> Result<(), ReportError> {
    let io_error = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.write_all(b"\n").map_err(io_error)?;
    writer.flush().map_err(io_error)?;

    tracing::info!("Crawl result written to {}", path.display());
    Ok(())
}
