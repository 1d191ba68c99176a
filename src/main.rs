use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rostermatch::{
    roster::Roster,
    scenario::ScenarioLoader,
    snapshot::{Snapshot, SnapshotWriter},
    DeferredAcceptance,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Assign players to nearby teams")]
struct Cli {
    /// Log filter, e.g. `info` or `rostermatch=debug` (RUST_LOG wins when set)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a league from a scenario, match it, and write a snapshot
    Simulate {
        /// Path to the scenario YAML file
        #[arg(long, default_value = "scenarios/youth_league.yaml")]
        scenario: PathBuf,

        /// Override the scenario seed
        #[arg(long)]
        seed: Option<u64>,

        /// Snapshot file (defaults to snapshots/<scenario>.json)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Match the unassigned players of a snapshot
    Assign {
        #[arg(long)]
        input: PathBuf,

        /// Where to write the result (defaults to overwriting the input)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Clear every existing assignment first
        #[arg(long)]
        reset: bool,
    },
    /// Print team counts for a snapshot
    Summary {
        #[arg(long)]
        input: PathBuf,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(roster: &Roster) {
    for count in roster.team_counts() {
        let max = count
            .max_roster_size
            .map(|max| max.to_string())
            .unwrap_or_else(|| "-".into());
        println!("{:<16} {:>3} / {:<3} players", count.name, count.members, max);
    }
    println!("{:<16} {:>3}", "Unassigned", roster.unassigned_players().count());
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let engine = DeferredAcceptance::new();

    match cli.command {
        Command::Simulate {
            scenario,
            seed,
            output,
        } => {
            let loader = ScenarioLoader::new(".");
            let scenario = loader.load(&scenario)?;
            init_logging(cli.log_level.as_deref().unwrap_or(&scenario.logging.level));

            let mut roster = scenario.build_roster(seed)?;
            let summary = roster
                .auto_assign(&engine)
                .with_context(|| format!("Matching failed for scenario '{}'", scenario.name))?;
            let path = match output {
                Some(path) => {
                    Snapshot::from_roster(&roster).save(&path)?;
                    path
                }
                None => SnapshotWriter::new("snapshots").write(&scenario.name, &roster)?,
            };
            print_summary(&roster);
            println!(
                "Scenario '{}' matched in {} rounds. Snapshot: {}",
                scenario.name,
                summary.rounds,
                path.display()
            );
        }
        Command::Assign {
            input,
            output,
            reset,
        } => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            let mut roster = Snapshot::load(&input)?.into_roster();
            if reset {
                roster.unassign_all();
            }
            roster.sync_teams();
            let summary = roster
                .auto_assign(&engine)
                .with_context(|| format!("Matching failed for {}", input.display()))?;
            let path = output.unwrap_or(input);
            Snapshot::from_roster(&roster).save(&path)?;
            print_summary(&roster);
            println!(
                "Assigned {} players in {} rounds. Snapshot: {}",
                summary.assigned_this_run,
                summary.rounds,
                path.display()
            );
        }
        Command::Summary { input } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"));
            let mut roster = Snapshot::load(&input)?.into_roster();
            roster.sync_teams();
            print_summary(&roster);
        }
    }
    Ok(())
}
