use std::fs;
use std::path::Path;

use tracing::info;

use super::schema::NAME_COLUMN;
use super::Roster;
use crate::error::{CoreError, Result};

/// Write the cleaned roster as CSV: `name` then the canonical columns, rows in roster order.
///
/// Values use the shortest representation that parses back to the same `f64`,
/// so loading the output reproduces the roster exactly.
pub fn write_clean_table(roster: &Roster, path: &Path) -> Result<()> {
    let export_err = |source: csv::Error| CoreError::Export {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| export_err(e.into()))?;
        }
    }

    let mut writer = csv::Writer::from_path(path).map_err(export_err)?;

    let mut header = Vec::with_capacity(roster.schema().width() + 1);
    header.push(NAME_COLUMN);
    header.extend(roster.schema().columns().iter().map(String::as_str));
    writer.write_record(&header).map_err(export_err)?;

    for hero in roster.iter() {
        let mut row = Vec::with_capacity(header.len());
        row.push(hero.name.clone());
        row.extend(hero.values().iter().map(|v| v.to_string()));
        writer.write_record(&row).map_err(export_err)?;
    }

    writer.flush().map_err(|e| export_err(e.into()))?;

    info!(
        "Wrote cleaned table with {} heroes to {}",
        roster.len(),
        path.display()
    );
    Ok(())
}
