//! Arena CLI
//!
//! train → evaluate → predict, with win/loss tallies kept between runs.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arena_core::{
    load_artifact, load_roster, save_model, train, write_clean_table, ArenaConfig, FightOutcome,
    ModelEnvelope, Predictor, Roster, StatsBook,
};
use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "arena")]
#[command(version = arena_core::VERSION)]
#[command(about = "Predict hero fight outcomes from attribute profiles", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML config file (overrides ARENA_CONFIG_PATH)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the hero table, synthesize matchups, train and save the model
    Train {
        /// Raw hero CSV
        #[arg(long)]
        source: Option<PathBuf>,

        /// Output model artifact
        #[arg(long)]
        model: Option<PathBuf>,

        /// Number of synthesized matchups
        #[arg(long)]
        matchups: Option<usize>,

        /// Number of trees
        #[arg(long)]
        trees: Option<usize>,

        /// Seed for synthesis, split and training
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Score a saved model on the hold-out matchups of its training run
    Evaluate {
        /// Hero CSV (defaults to the cleaned table)
        #[arg(long)]
        roster: Option<PathBuf>,

        /// Model artifact
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Predict the winner between two heroes (exact names)
    Predict {
        hero_a: String,
        hero_b: String,

        /// Hero CSV (defaults to the cleaned table)
        #[arg(long)]
        roster: Option<PathBuf>,

        /// Model artifact
        #[arg(long)]
        model: Option<PathBuf>,

        /// Print the outcome as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show win/loss records
    Stats {
        /// Only this hero
        hero: Option<String>,
    },

    /// Top heroes by wins, then win rate
    Leaderboard {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => ArenaConfig::load(path)?,
        None => ArenaConfig::from_env()?,
    };

    match cli.command {
        Commands::Train {
            source,
            model,
            matchups,
            trees,
            seed,
        } => {
            if let Some(source) = source {
                config.paths.source = source;
            }
            if let Some(model) = model {
                config.paths.model = model;
            }
            if let Some(matchups) = matchups {
                config.synthesis.matchups = matchups;
            }
            if let Some(trees) = trees {
                config.forest.n_trees = trees;
            }
            if let Some(seed) = seed {
                config.synthesis.seed = seed;
                config.forest.seed = seed;
            }
            config.validate()?;
            run_train(&config)
        }

        Commands::Evaluate { roster, model } => {
            if let Some(model) = model {
                config.paths.model = model;
            }
            let roster = roster.unwrap_or_else(|| config.paths.clean_table.clone());
            run_evaluate(&config, &roster)
        }

        Commands::Predict {
            hero_a,
            hero_b,
            roster,
            model,
            json,
        } => {
            if let Some(model) = model {
                config.paths.model = model;
            }
            let roster = roster.unwrap_or_else(|| config.paths.clean_table.clone());
            run_predict(&config, &roster, &hero_a, &hero_b, json)
        }

        Commands::Stats { hero } => run_stats(&config, hero.as_deref()),

        Commands::Leaderboard { limit } => run_leaderboard(&config, limit),
    }
}

fn run_train(config: &ArenaConfig) -> Result<()> {
    println!("🔨 Training fight model...");
    println!("   Source:   {}", config.paths.source.display());
    println!("   Model:    {}", config.paths.model.display());
    println!("   Matchups: {}", config.synthesis.matchups);
    println!("   Trees:    {}", config.forest.n_trees);

    let (roster, load_stats) = load_roster(&config.paths.source)
        .with_context(|| format!("loading heroes from {}", config.paths.source.display()))?;
    println!(
        "\n   Heroes: {} kept, {} dropped, {} duplicates",
        load_stats.retained, load_stats.dropped, load_stats.duplicates
    );

    write_clean_table(&roster, &config.paths.clean_table)?;
    println!("   Clean table: {}", config.paths.clean_table.display());

    let (train_set, holdout) = config.synthesis.training_split(&roster)?;
    let model = train(&train_set, roster.schema(), &config.forest)?;

    if !holdout.is_empty() {
        let accuracy = model.accuracy(&holdout)?;
        println!(
            "   Hold-out accuracy: {:.2}% ({} matchups)",
            accuracy * 100.0,
            holdout.len()
        );
    }

    let artifact = save_model(&model, &config.synthesis, &config.paths.model)
        .with_context(|| format!("saving model to {}", config.paths.model.display()))?;

    println!("\n✅ Model saved!");
    println!(
        "   Size:     {} bytes ({:.2} KB)",
        artifact.size_bytes,
        artifact.size_bytes as f64 / 1024.0
    );
    println!("   Features: {}", artifact.width);
    println!("   Checksum: {}", artifact.checksum);
    Ok(())
}

fn run_evaluate(config: &ArenaConfig, roster_path: &Path) -> Result<()> {
    let (roster, envelope) = load_roster_and_model(config, roster_path)?;
    let synthesis = &envelope.synthesis;
    if *synthesis != config.synthesis {
        warn!(
            "Config synthesis settings differ from the model's; using the model's \
             ({} matchups, seed {}, hold-out {})",
            synthesis.matchups, synthesis.seed, synthesis.holdout_fraction
        );
    }

    let (_, holdout) = synthesis.training_split(&roster)?;
    if holdout.is_empty() {
        bail!("model was trained with holdout_fraction 0, nothing to evaluate");
    }

    let model = &envelope.model;

    let accuracy = model.accuracy(&holdout)?;
    println!("🔍 Evaluated {} hold-out matchups", holdout.len());
    println!("   Accuracy: {:.2}%", accuracy * 100.0);
    println!(
        "   Model:    {} trees trained on {} matchups",
        model.trees().len(),
        model.trained_rows()
    );
    Ok(())
}

fn run_predict(
    config: &ArenaConfig,
    roster_path: &Path,
    hero_a: &str,
    hero_b: &str,
    json: bool,
) -> Result<()> {
    let (roster, envelope) = load_roster_and_model(config, roster_path)?;
    let mut book = StatsBook::load(&config.paths.stats)?;

    let outcome = Predictor::new(&roster, &envelope.model, &mut book)?.predict_winner(hero_a, hero_b)?;
    book.save(&config.paths.stats)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(hero_a, hero_b, &outcome);
    }

    if let Some(record) = book.get(&outcome.winner) {
        debug!(
            "{} now {}-{} ({:.2}%)",
            outcome.winner, record.wins, record.losses, record.win_rate
        );
    }
    Ok(())
}

fn run_stats(config: &ArenaConfig, hero: Option<&str>) -> Result<()> {
    let book = StatsBook::load(&config.paths.stats)?;

    if let Some(name) = hero {
        match book.get(name) {
            Some(record) => {
                println!("📊 {name}");
                println!("   Battles:  {}", record.battles);
                println!("   Wins:     {}", record.wins);
                println!("   Losses:   {}", record.losses);
                println!("   Win rate: {:.2}%", record.win_rate);
            }
            None => println!("No battles recorded for {name}"),
        }
        return Ok(());
    }

    if book.is_empty() {
        println!("No battles recorded yet");
        return Ok(());
    }

    println!("{:<30} {:>7} {:>5} {:>6} {:>9}", "Hero", "Battles", "Wins", "Losses", "Win rate");
    for (name, record) in book.iter() {
        println!(
            "{:<30} {:>7} {:>5} {:>6} {:>8.2}%",
            name, record.battles, record.wins, record.losses, record.win_rate
        );
    }
    Ok(())
}

fn run_leaderboard(config: &ArenaConfig, limit: usize) -> Result<()> {
    let book = StatsBook::load(&config.paths.stats)?;
    let board = book.leaderboard(limit);

    if board.is_empty() {
        println!("No battles recorded yet");
        return Ok(());
    }

    println!("🏆 Top {} heroes", board.len());
    for (rank, (name, record)) in board.iter().enumerate() {
        println!(
            "{:>3}. {:<30} {} wins / {} battles ({:.2}%)",
            rank + 1,
            name,
            record.wins,
            record.battles,
            record.win_rate
        );
    }
    Ok(())
}

fn load_roster_and_model(
    config: &ArenaConfig,
    roster_path: &Path,
) -> Result<(Roster, ModelEnvelope)> {
    let (roster, _) = load_roster(roster_path)
        .with_context(|| format!("loading heroes from {}", roster_path.display()))?;

    let model_path = &config.paths.model;
    let envelope = load_artifact(model_path).map_err(|err| {
        let context = format!("loading model from {}", model_path.display());
        if err.requires_retrain() {
            anyhow::Error::new(err).context(format!("{context} (run `arena train` to rebuild it)"))
        } else {
            anyhow::Error::new(err).context(context)
        }
    })?;
    Ok((roster, envelope))
}

fn print_outcome(hero_a: &str, hero_b: &str, outcome: &FightOutcome) {
    println!("\n⚔️  {hero_a} vs {hero_b}");
    println!("\n🏆 Winner: {}", outcome.winner);
    println!(
        "   Confidence: {:.0}% ({} / {} trees)",
        outcome.prediction.confidence() * 100.0,
        outcome.prediction.votes_a.max(outcome.prediction.votes_b),
        outcome.prediction.votes_a + outcome.prediction.votes_b
    );

    if outcome.advantages.is_empty() {
        println!("   No single attribute favoured {}", outcome.winner);
    } else {
        let reasons: Vec<&str> = outcome.advantages.iter().map(|a| a.label()).collect();
        println!("   Edge: {}", reasons.join(", "));
    }
}
