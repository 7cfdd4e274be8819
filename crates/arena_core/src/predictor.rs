//! Predictor - "given two heroes, who wins?"
//!
//! Looks both heroes up by exact name, runs the shared feature transform and
//! the classifier, explains the result with the winner's largest core
//! attribute advantages, and reports the result to a [`ResultRecorder`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{ForestModel, Prediction};
use crate::error::{CoreError, Result};
use crate::features::{transform, FeatureVector};
use crate::matchup::Outcome;
use crate::roster::{AttributeSchema, CoreAttribute, Roster};

/// Maximum number of attributes in the explanation.
pub const MAX_ADVANTAGES: usize = 3;

/// Consumer of resolved fights (durable win/loss counters).
pub trait ResultRecorder {
    type Error: std::error::Error + Send + Sync + 'static;

    fn record_result(&mut self, winner: &str, loser: &str) -> std::result::Result<(), Self::Error>;
}

impl<R: ResultRecorder + ?Sized> ResultRecorder for &mut R {
    type Error = R::Error;

    fn record_result(&mut self, winner: &str, loser: &str) -> std::result::Result<(), Self::Error> {
        (**self).record_result(winner, loser)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FightOutcome {
    pub winner: String,
    pub loser: String,
    /// Core attributes favouring the winner, largest margin first (at most 3)
    pub advantages: Vec<CoreAttribute>,
    pub prediction: Prediction,
}

pub struct Predictor<'a, R> {
    roster: &'a Roster,
    model: &'a ForestModel,
    recorder: R,
}

impl<'a, R: ResultRecorder> Predictor<'a, R> {
    /// Refuses a model trained on columns other than the roster's schema.
    pub fn new(roster: &'a Roster, model: &'a ForestModel, recorder: R) -> Result<Self> {
        check_columns(model.columns(), roster.schema().columns())?;
        Ok(Self {
            roster,
            model,
            recorder,
        })
    }

    pub fn predict_winner(&mut self, name_a: &str, name_b: &str) -> Result<FightOutcome> {
        if name_a == name_b {
            return Err(CoreError::InvalidParameter(format!(
                "'{name_a}' cannot fight itself"
            )));
        }

        let schema = self.roster.schema();
        let a = self.roster.require(name_a)?;
        let b = self.roster.require(name_b)?;

        let features = transform(schema, a, b)?;
        let prediction = self.model.predict(&features)?;

        let (winner, loser) = match prediction.outcome {
            Outcome::AWins => (&a.name, &b.name),
            Outcome::BWins => (&b.name, &a.name),
        };
        let advantages = rank_advantages(schema, &features, prediction.outcome);

        self.recorder
            .record_result(winner, loser)
            .map_err(|e| CoreError::Recorder(Box::new(e)))?;

        debug!(
            "{name_a} vs {name_b}: {winner} wins ({}/{} votes)",
            prediction.votes_a.max(prediction.votes_b),
            prediction.votes_a + prediction.votes_b
        );

        Ok(FightOutcome {
            winner: winner.clone(),
            loser: loser.clone(),
            advantages,
            prediction,
        })
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }
}

/// Core attributes whose difference favours the predicted winner, sorted by
/// descending margin (ties keep [`CoreAttribute::ALL`] order), at most
/// [`MAX_ADVANTAGES`]. Attributes favouring the loser are left out.
pub fn rank_advantages(
    schema: &AttributeSchema,
    features: &FeatureVector,
    outcome: Outcome,
) -> Vec<CoreAttribute> {
    let sign = match outcome {
        Outcome::AWins => 1.0,
        Outcome::BWins => -1.0,
    };

    let mut favoured: Vec<(CoreAttribute, f64)> = CoreAttribute::ALL
        .iter()
        .filter_map(|&attr| {
            let margin = sign * features[schema.index_of(attr.column())?];
            (margin > 0.0).then_some((attr, margin))
        })
        .collect();

    favoured.sort_by(|(_, x), (_, y)| y.total_cmp(x));
    favoured
        .into_iter()
        .take(MAX_ADVANTAGES)
        .map(|(attr, _)| attr)
        .collect()
}

fn check_columns(model: &[String], roster: &[String]) -> Result<()> {
    let len = model.len().max(roster.len());
    for index in 0..len {
        let m = model.get(index);
        let r = roster.get(index);
        if m != r {
            let missing = || "<missing>".to_string();
            return Err(CoreError::SchemaMismatch {
                index,
                model: m.cloned().unwrap_or_else(missing),
                roster: r.cloned().unwrap_or_else(missing),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{train, ForestConfig};
    use crate::error::ErrorKind;
    use crate::matchup::TrainingSet;
    use crate::roster::Hero;
    use crate::stats::StatsBook;

    fn fighter(
        schema: &AttributeSchema,
        name: &str,
        overall: f64,
        strength: f64,
        speed: f64,
        flight: bool,
    ) -> Hero {
        Hero::from_columns(
            schema,
            name,
            &[
                ("intelligence_score", 50.0),
                ("durability_score", 50.0),
                ("power_score", 50.0),
                ("combat_score", 50.0),
                ("overall_score", overall),
                ("strength_score", strength),
                ("speed_score", speed),
                ("has_flight", flight as u8 as f64),
            ],
        )
        .unwrap()
    }

    /// Roster where only `overall_score` separates every ordered pair.
    /// "Twin High" and "Twin Low" share every other attribute, so no other
    /// column can split the labels cleanly.
    fn roster() -> Roster {
        let schema = AttributeSchema::new(["has_flight"]);
        let heroes = vec![
            fighter(&schema, "A", 90.0, 80.0, 70.0, false),
            fighter(&schema, "B", 85.0, 60.0, 95.0, false),
            fighter(&schema, "C", 70.0, 75.0, 40.0, true),
            fighter(&schema, "D", 60.0, 20.0, 65.0, false),
            fighter(&schema, "Twin High", 80.0, 55.0, 55.0, false),
            fighter(&schema, "Twin Low", 75.0, 55.0, 55.0, false),
            fighter(&schema, "E", 65.0, 90.0, 10.0, true),
        ];
        Roster::from_heroes(schema, heroes).unwrap()
    }

    /// Every ordered pair, labeled by overall score, with all features per
    /// split and no bootstrap: each tree splits on the overall difference.
    fn overall_tracking_model(roster: &Roster) -> ForestModel {
        let schema = roster.schema();
        let mut set = TrainingSet::default();
        for a in roster.iter() {
            for b in roster.iter() {
                if a.name == b.name {
                    continue;
                }
                set.rows.push(transform(schema, a, b).unwrap());
                set.labels.push(Outcome::from_scores(a.overall(schema), b.overall(schema)));
            }
        }

        let config = ForestConfig {
            n_trees: 5,
            max_features: Some(schema.width()),
            bootstrap: false,
            ..ForestConfig::default()
        };
        train(&set, schema, &config).unwrap()
    }

    #[test]
    fn test_predict_winner_end_to_end() {
        let roster = roster();
        let model = overall_tracking_model(&roster);
        let mut stats = StatsBook::new();
        let mut predictor = Predictor::new(&roster, &model, &mut stats).unwrap();

        let outcome = predictor.predict_winner("A", "B").unwrap();
        assert_eq!(outcome.winner, "A");
        assert_eq!(outcome.loser, "B");
        assert_eq!(outcome.advantages, [CoreAttribute::Strength]);
        assert_eq!(outcome.advantages[0].name(), "strength");
        assert_eq!(outcome.prediction.votes_a, 5);

        let reversed = predictor.predict_winner("B", "A").unwrap();
        assert_eq!(reversed.winner, "A");
        assert_eq!(reversed.advantages, [CoreAttribute::Strength]);
    }

    #[test]
    fn test_stats_follow_sequential_wins() {
        let roster = roster();
        let model = overall_tracking_model(&roster);
        let mut stats = StatsBook::new();
        {
            let mut predictor = Predictor::new(&roster, &model, &mut stats).unwrap();
            assert_eq!(predictor.predict_winner("A", "B").unwrap().winner, "A");
            assert_eq!(predictor.predict_winner("A", "C").unwrap().winner, "A");
        }

        let a = stats.get("A").unwrap();
        assert_eq!(a.battles, 2);
        assert_eq!(a.wins, 2);
        assert_eq!(a.losses, 0);
        assert_eq!(a.win_rate, 100.00);
        assert_eq!(stats.get("B").unwrap().losses, 1);
        assert_eq!(stats.get("C").unwrap().losses, 1);
    }

    #[test]
    fn test_unknown_hero_is_lookup_error_and_not_recorded() {
        let roster = roster();
        let model = overall_tracking_model(&roster);
        let mut predictor = Predictor::new(&roster, &model, StatsBook::new()).unwrap();

        let err = predictor.predict_winner("A", "a").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(matches!(err, CoreError::NotFound { ref name } if name == "a"));
        assert!(predictor.recorder().is_empty());

        assert!(matches!(
            predictor.predict_winner("A", "A"),
            Err(CoreError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_schema_mismatch_is_refused() {
        let roster = roster();
        let model = overall_tracking_model(&roster);

        let other_schema = AttributeSchema::new(["has_magic"]);
        let other = Roster::from_heroes(
            other_schema.clone(),
            vec![Hero::from_columns(&other_schema, "X", &[("overall_score", 1.0)]).unwrap()],
        )
        .unwrap();

        let err = Predictor::new(&other, &model, StatsBook::new())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Shape);
        assert!(matches!(
            err,
            CoreError::SchemaMismatch { index: 7, ref model, ref roster }
                if model == "has_flight" && roster == "has_magic"
        ));

        let wider = Roster::new(AttributeSchema::new(["has_flight", "has_magic"]));
        assert!(matches!(
            Predictor::new(&wider, &model, StatsBook::new()),
            Err(CoreError::SchemaMismatch { index: 8, .. })
        ));
    }

    #[test]
    fn test_recorder_failure_is_returned() {
        #[derive(Debug)]
        struct Offline;
        impl std::fmt::Display for Offline {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("stats store offline")
            }
        }
        impl std::error::Error for Offline {}

        struct FailingRecorder;
        impl ResultRecorder for FailingRecorder {
            type Error = Offline;
            fn record_result(&mut self, _: &str, _: &str) -> std::result::Result<(), Offline> {
                Err(Offline)
            }
        }

        let roster = roster();
        let model = overall_tracking_model(&roster);
        let mut predictor = Predictor::new(&roster, &model, FailingRecorder).unwrap();
        assert!(matches!(
            predictor.predict_winner("A", "B"),
            Err(CoreError::Recorder(_))
        ));
    }

    #[test]
    fn test_rank_advantages() {
        let schema = AttributeSchema::continuous_only();
        // intelligence, strength, speed, durability, power, combat, overall
        let features = FeatureVector::new(vec![5.0, 20.0, -25.0, 12.0, 12.0, -1.0, 5.0]);

        assert_eq!(
            rank_advantages(&schema, &features, Outcome::AWins),
            [
                CoreAttribute::Strength,
                CoreAttribute::Durability,
                CoreAttribute::Power
            ]
        );
        assert_eq!(
            rank_advantages(&schema, &features, Outcome::BWins),
            [CoreAttribute::Speed, CoreAttribute::Combat]
        );

        let even = FeatureVector::new(vec![0.0; 7]);
        assert!(rank_advantages(&schema, &even, Outcome::AWins).is_empty());
    }
}
