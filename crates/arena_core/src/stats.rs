//! Running win/loss tallies per hero
//!
//! `StatsBook` is the durable collaborator the predictor reports results to.
//! It persists as CSV (`name,battles,wins,losses,win_rate`, sorted by name).

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fs::{rename, File};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::predictor::ResultRecorder;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("IO error on stats file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed stats file {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeroRecord {
    pub battles: u32,
    pub wins: u32,
    pub losses: u32,
    /// Percentage of battles won, rounded to 2 decimals; 0 with no battles
    pub win_rate: f64,
}

impl HeroRecord {
    fn recompute_win_rate(&mut self) {
        self.win_rate = if self.battles == 0 {
            0.0
        } else {
            (self.wins as f64 / self.battles as f64 * 100.0 * 100.0).round() / 100.0
        };
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StatsRow {
    name: String,
    battles: u32,
    wins: u32,
    losses: u32,
    win_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsBook {
    records: BTreeMap<String, HeroRecord>,
}

impl StatsBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one result: both heroes gain a battle, unknown heroes start at zero.
    pub fn record(&mut self, winner: &str, loser: &str) {
        let w = self.records.entry(winner.to_string()).or_default();
        w.battles += 1;
        w.wins += 1;
        w.recompute_win_rate();

        let l = self.records.entry(loser.to_string()).or_default();
        l.battles += 1;
        l.losses += 1;
        l.recompute_win_rate();
    }

    pub fn get(&self, name: &str) -> Option<&HeroRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeroRecord)> {
        self.records.iter().map(|(name, record)| (name.as_str(), record))
    }

    /// Heroes with at least one battle, most wins first, then highest win rate, then name.
    pub fn leaderboard(&self, limit: usize) -> Vec<(&str, &HeroRecord)> {
        let mut ranked: Vec<(&str, &HeroRecord)> =
            self.iter().filter(|(_, record)| record.battles > 0).collect();
        ranked.sort_by(|(name_a, a), (name_b, b)| {
            b.wins
                .cmp(&a.wins)
                .then_with(|| b.win_rate.total_cmp(&a.win_rate))
                .then_with(|| name_a.cmp(name_b))
        });
        ranked.truncate(limit);
        ranked
    }

    /// Load tallies from `path`; a missing file yields an empty book.
    pub fn load(path: &Path) -> Result<Self, StatsError> {
        let label = path.display().to_string();
        if !path.exists() {
            info!("No stats file at {label}, starting fresh");
            return Ok(Self::new());
        }

        let mut reader = csv::Reader::from_path(path).map_err(|source| StatsError::Csv {
            path: label.clone(),
            source,
        })?;

        let mut book = Self::new();
        for row in reader.deserialize::<StatsRow>() {
            let row = row.map_err(|source| StatsError::Csv {
                path: label.clone(),
                source,
            })?;
            let mut record = HeroRecord {
                battles: row.battles,
                wins: row.wins,
                losses: row.losses,
                win_rate: row.win_rate,
            };
            record.recompute_win_rate();
            book.records.insert(row.name, record);
        }

        debug!("Loaded stats for {} heroes from {label}", book.len());
        Ok(book)
    }

    /// Write tallies to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<(), StatsError> {
        let label = path.display().to_string();
        let io_err = |source: std::io::Error| StatsError::Io {
            path: label.clone(),
            source,
        };
        let csv_err = |source: csv::Error| StatsError::Csv {
            path: label.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let temp_path = path.with_extension("tmp");
        let file = File::create(&temp_path).map_err(io_err)?;
        {
            let mut writer = csv::Writer::from_writer(&file);
            for (name, record) in self.iter() {
                writer
                    .serialize(StatsRow {
                        name: name.to_string(),
                        battles: record.battles,
                        wins: record.wins,
                        losses: record.losses,
                        win_rate: record.win_rate,
                    })
                    .map_err(csv_err)?;
            }
            writer.flush().map_err(io_err)?;
        }
        file.sync_all().map_err(io_err)?;
        drop(file);
        rename(&temp_path, path).map_err(io_err)?;

        debug!("Saved stats for {} heroes to {label}", self.len());
        Ok(())
    }
}

impl ResultRecorder for StatsBook {
    type Error = Infallible;

    fn record_result(&mut self, winner: &str, loser: &str) -> Result<(), Self::Error> {
        self.record(winner, loser);
        Ok(())
    }
}
