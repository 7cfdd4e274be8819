use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info, warn};

use super::hero::Hero;
use super::schema::{AttributeSchema, CONTINUOUS_COLUMNS, FLAG_PREFIX, NAME_COLUMN};
use super::Roster;
use crate::error::LoadError;

/// CSV cleaning statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Data rows seen (header excluded)
    pub total_rows: u32,
    /// Heroes in the resulting roster
    pub retained: u32,
    /// Rows dropped for a missing or malformed value
    pub dropped: u32,
    /// Rows that replaced an earlier row with the same name
    pub duplicates: u32,
}

/// Load and clean the hero table at `path`.
///
/// Fails if the file is absent, a required column is missing, or no row
/// survives cleaning.
pub fn load_roster(path: &Path) -> Result<(Roster, LoadStats), LoadError> {
    let label = path.display().to_string();
    if !path.exists() {
        return Err(LoadError::SourceMissing { path: label });
    }

    let file = File::open(path).map_err(|e| LoadError::Read {
        path: label.clone(),
        source: e.into(),
    })?;

    read_roster(file, &label)
}

/// Clean a hero table from any CSV reader; `label` names the source in errors.
pub fn read_roster<R: Read>(input: R, label: &str) -> Result<(Roster, LoadStats), LoadError> {
    let read_err = |source: csv::Error| LoadError::Read {
        path: label.to_string(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .map_err(read_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string()) // Strip BOM
        .collect();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn {
                path: label.to_string(),
                column: name.to_string(),
            })
    };

    let name_idx = column(NAME_COLUMN)?;
    let continuous_idx = CONTINUOUS_COLUMNS
        .iter()
        .map(|c| column(c))
        .collect::<Result<Vec<_>, _>>()?;
    let flag_idx: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.starts_with(FLAG_PREFIX))
        .map(|(idx, _)| idx)
        .collect();

    let schema = AttributeSchema::new(flag_idx.iter().map(|&idx| headers[idx].clone()));
    let mut roster = Roster::new(schema);
    let mut stats = LoadStats::default();

    for result in reader.records() {
        stats.total_rows += 1;
        let line = stats.total_rows + 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                stats.dropped += 1;
                warn!("{label}: line {line} - CSV parse error: {e}");
                continue;
            }
        };

        let name = record.get(name_idx).unwrap_or("").to_string();
        if name.is_empty() {
            stats.dropped += 1;
            debug!("{label}: line {line} - empty name, dropping row");
            continue;
        }

        let mut values = Vec::with_capacity(continuous_idx.len() + flag_idx.len());
        let mut rejected = None;

        for &idx in &continuous_idx {
            match record.get(idx).and_then(parse_score) {
                Some(v) => values.push(v),
                None => {
                    rejected = Some(idx);
                    break;
                }
            }
        }
        if rejected.is_none() {
            for &idx in &flag_idx {
                match record.get(idx).and_then(parse_flag) {
                    Some(v) => values.push(v),
                    None => {
                        rejected = Some(idx);
                        break;
                    }
                }
            }
        }

        if let Some(idx) = rejected {
            stats.dropped += 1;
            debug!(
                "{label}: line {line} - invalid {} value '{}' for {name}, dropping row",
                headers[idx],
                record.get(idx).unwrap_or("")
            );
            continue;
        }

        if roster.insert(Hero::new(name, values)) {
            stats.duplicates += 1;
            warn!(
                "{label}: line {line} - duplicate hero '{}', later row wins",
                record.get(name_idx).unwrap_or("")
            );
        }
    }

    stats.retained = roster.len() as u32;

    if roster.is_empty() {
        return Err(LoadError::NoValidRows {
            path: label.to_string(),
            dropped: stats.dropped,
        });
    }

    info!(
        "Loaded {} heroes from {label} ({} flag columns, {} dropped, {} duplicates, {} rows)",
        stats.retained,
        roster.schema().flag_columns().len(),
        stats.dropped,
        stats.duplicates,
        stats.total_rows
    );

    Ok((roster, stats))
}

fn parse_score(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Flags accept numbers (non-zero → 1) or `true`/`false`.
fn parse_flag(raw: &str) -> Option<f64> {
    if raw.eq_ignore_ascii_case("true") {
        return Some(1.0);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Some(0.0);
    }
    parse_score(raw).map(|v| if v != 0.0 { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "name,intelligence_score,strength_score,speed_score,durability_score,power_score,combat_score,overall_score,has_flight,real_name,has_telepathy";

    fn csv(rows: &[&str]) -> String {
        let mut out = String::from(HEADER);
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_read_roster_detects_flags_and_orders_columns() {
        let data = csv(&[
            "Thor,70,95,80,90,95,85,92,1,Thor Odinson,0",
            "Jean Grey,90,40,60,50,100,60,88,True,Jean Grey,true",
        ]);
        let (roster, stats) = read_roster(data.as_bytes(), "test").unwrap();

        assert_eq!(stats.total_rows, 2);
        assert_eq!(stats.retained, 2);
        assert_eq!(stats.dropped, 0);
        assert_eq!(roster.schema().flag_columns(), ["has_flight", "has_telepathy"]);

        let thor = roster.get("Thor").unwrap();
        assert_eq!(
            thor.values(),
            &[70.0, 95.0, 80.0, 90.0, 95.0, 85.0, 92.0, 1.0, 0.0]
        );
        let jean = roster.get("Jean Grey").unwrap();
        assert_eq!(jean.value(roster.schema(), "has_telepathy"), Some(1.0));
        assert_eq!(jean.value(roster.schema(), "has_flight"), Some(1.0));
    }

    #[test]
    fn test_read_roster_drops_bad_rows() {
        let data = csv(&[
            "Thor,70,95,80,90,95,85,92,1,Thor Odinson,0",
            "Missing,70,,80,90,95,85,92,1,,0",
            "Garbage,70,strong,80,90,95,85,92,1,,0",
            ",70,95,80,90,95,85,92,1,,0",
            "BadFlag,70,95,80,90,95,85,92,maybe,,0",
            "Infinite,70,95,80,90,95,85,inf,1,,0",
        ]);
        let (roster, stats) = read_roster(data.as_bytes(), "test").unwrap();

        assert_eq!(roster.len(), 1);
        assert_eq!(stats.total_rows, 6);
        assert_eq!(stats.dropped, 5);
        assert!(roster.get("Missing").is_none());
    }

    #[test]
    fn test_read_roster_duplicates_last_write_wins() {
        let data = csv(&[
            "Thor,70,95,80,90,95,85,92,1,,0",
            "Loki,90,60,70,60,80,70,80,0,,1",
            "Thor,70,95,80,90,95,85,99,1,,0",
        ]);
        let (roster, stats) = read_roster(data.as_bytes(), "test").unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(roster.names().collect::<Vec<_>>(), ["Thor", "Loki"]);
        assert_eq!(roster.get("Thor").unwrap().overall(roster.schema()), 99.0);
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let data = "name,intelligence_score,strength_score\nThor,70,95";
        let err = read_roster(data.as_bytes(), "test").unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingColumn { ref column, .. } if column == "speed_score"
        ));
    }

    #[test]
    fn test_all_rows_dropped_is_fatal() {
        let data = csv(&["Nobody,,,,,,,,,,"]);
        let err = read_roster(data.as_bytes(), "test").unwrap_err();
        assert!(matches!(err, LoadError::NoValidRows { dropped: 1, .. }));
    }

    #[test]
    fn test_missing_source_is_fatal() {
        let err = load_roster(Path::new("/nonexistent/heroes.csv")).unwrap_err();
        assert!(matches!(err, LoadError::SourceMissing { .. }));
    }

    #[test]
    fn test_load_roster_from_file_strips_bom() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "\u{feff}{}",
            csv(&["Thor,70,95,80,90,95,85,92,1,,0"])
        )
        .unwrap();

        let (roster, _) = load_roster(file.path()).unwrap();
        assert!(roster.get("Thor").is_some());
    }
}
