use anyhow::{Context, Result};
use csv::{Terminator, WriterBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::Builder;

use crate::collect::global_variables::get_output_path;
use crate::collect::wfs::wfs_collect::{FeatureSource, WfsCollect, WfsQuery};
use crate::geo_core::BoundingBox;
use crate::geometric::feature_table::FeatureTable;

/// BC wildfire fuel types
/// Downloads the fuel type polygons from the BC WFS and exports them as CSV,
/// one row per feature with the geometry as WKT in the last column
pub struct FuelTypes {
    /// Where the GeoJSON comes from (the WFS unless overridden)
    source: Box<dyn FeatureSource>,
    /// CSV file to write
    output_path: PathBuf,
    /// Decimal places kept in WKT ordinates, all of them when `None`
    wkt_precision: Option<usize>,
    /// Features loaded by `run()`
    table: Option<FeatureTable>,
}

impl FuelTypes {
    /// Fuel types from the BC WFS, written to `output_path` or `bc_wildfire_fuel_types.csv`
    pub fn new(output_path: Option<String>) -> Self {
        let source = WfsCollect::new(WfsQuery::fuel_types());
        Self::with_source(Box::new(source), output_path)
    }

    pub fn with_source(source: Box<dyn FeatureSource>, output_path: Option<String>) -> Self {
        let output_path = output_path
            .map(PathBuf::from)
            .unwrap_or_else(get_output_path);

        FuelTypes {
            source,
            output_path,
            wkt_precision: None,
            table: None,
        }
    }

    pub fn set_output_path(&mut self, output_path: PathBuf) {
        self.output_path = output_path;
    }

    pub fn set_wkt_precision(&mut self, precision: Option<usize>) {
        self.wkt_precision = precision;
    }

    /// Fetch and parse the feature collection, printing a summary
    pub fn run(mut self) -> Result<Self> {
        self.run_internal()?;
        Ok(self)
    }

    /// Same as `run()` without taking ownership
    pub fn run_internal(&mut self) -> Result<()> {
        println!("Downloading BC wildfire fuel types data...");
        println!("{}: {}", self.source.kind(), self.source.location());

        let content = self
            .source
            .fetch()
            .context("Failed to retrieve fuel types")?;

        let table = FeatureTable::from_slice(&content)?;
        drop(content);

        if let (Some(matched), Some(returned)) = (table.number_matched, table.number_returned) {
            if returned < matched {
                log::warn!(
                    "Service returned {} of {} matching features, the result is truncated",
                    returned,
                    matched
                );
            }
        }

        for line in summary_lines(&table)? {
            println!("{}", line);
        }

        self.table = Some(table);
        Ok(())
    }

    pub fn get_table(&self) -> Option<&FeatureTable> {
        self.table.as_ref()
    }

    /// Write the table as CSV with geometry as WKT
    pub fn to_csv(&self) -> Result<&Path> {
        let table = self
            .table
            .as_ref()
            .context("No feature data available. Call run() first.")?;

        write_csv(table, &self.output_path, self.wkt_precision)?;
        println!(
            "Saved to: {} (CSV format with geometry as WKT)",
            self.output_path.display()
        );
        Ok(&self.output_path)
    }

    pub fn get_output_path(&self) -> &Path {
        &self.output_path
    }
}

/// Feature count, columns, CRS and bounds, as printed after a download
pub fn summary_lines(table: &FeatureTable) -> Result<Vec<String>> {
    let bounds = table.total_bounds()?;
    Ok(vec![
        format!("Downloaded {} features", table.len()),
        format!("Columns: {:?}", table.column_names()),
        format!("CRS: {}", table.crs),
        format!("Bounds: {}", BoundingBox::describe(bounds.as_ref())),
    ])
}

/// Write `table` to `path`, replacing it only once every row has been written
///
/// An existing file keeps its permissions; a new one gets the usual
/// `0o666` less the umask.
pub fn write_csv(table: &FeatureTable, path: &Path, precision: Option<usize>) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let existing = fs::metadata(path).ok().map(|m| m.permissions());

    let mut builder = Builder::new();
    builder.prefix(".bcfuel-").suffix(".csv.tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // open(2) applies the umask to this mode
        builder.permissions(
            existing
                .clone()
                .unwrap_or_else(|| fs::Permissions::from_mode(0o666)),
        );
    }
    let tmp = builder
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    if let Some(permissions) = existing {
        tmp.as_file()
            .set_permissions(permissions)
            .context("Failed to copy permissions of the existing CSV file")?;
    }

    {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(tmp.as_file());

        writer
            .write_record(table.header())
            .context("Failed to write CSV header")?;
        for (i, row) in table.rows.iter().enumerate() {
            let record = table
                .wkt_record(row, precision)
                .with_context(|| format!("Failed to convert feature {} to WKT", i))?;
            writer
                .write_record(&record)
                .with_context(|| format!("Failed to write CSV row {}", i))?;
        }
        writer.flush().context("Failed to flush CSV output")?;
    }

    tmp.as_file()
        .sync_all()
        .context("Failed to sync CSV output")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

    log::debug!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
