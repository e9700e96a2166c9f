use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use worldsim::{
    engine::{EngineBuilder, EngineSettings, RunControl, TurnReport},
    scenario::ScenarioLoader,
    systems::{CultureCensusSystem, InvariantCheckSystem},
    world::PopulationView,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Population settlement simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/tiny_continent.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print one JSON frame per tick to stdout
    #[arg(long)]
    json: bool,

    /// Verify world invariants after every tick
    #[arg(long)]
    check_invariants: bool,
}

#[derive(Serialize)]
struct Frame<'a> {
    report: &'a TurnReport,
    populations: Vec<PopulationView>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    let mut world = scenario.build_world()?;
    let ticks = scenario.ticks(cli.ticks);

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
    };
    let mut builder = EngineBuilder::new(settings).with_system(CultureCensusSystem::new());
    if cli.check_invariants {
        builder.push_system(InvariantCheckSystem::new());
    }
    let mut engine = builder.build(&scenario.constants)?;

    let control = RunControl::new().with_stop_after(ticks);
    let mut frame_error = None;
    engine.run_until_paused(&mut world, &control, |report, world| {
        if !cli.json || frame_error.is_some() {
            return;
        }
        let frame = Frame {
            report,
            populations: world.population_views(),
        };
        match serde_json::to_string(&frame) {
            Ok(line) => println!("{line}"),
            Err(err) => frame_error = Some(err),
        }
    })?;
    if let Some(err) = frame_error {
        return Err(err).context("failed to encode frame");
    }

    let census = engine
        .get_system::<CultureCensusSystem>()
        .and_then(|system| system.latest());
    let (cultures, dominant) = match census {
        Some(census) => (
            census.distinct_cultures,
            census
                .dominant
                .map(|(culture, holders)| format!("#{culture} ({holders} populations)"))
                .unwrap_or_else(|| "none".into()),
        ),
        None => (0, "none".into()),
    };
    let summary = format!(
        "Scenario '{}' completed for {} ticks. Populations: {}, deaths: {}, cultures: {}, dominant: {}",
        scenario.name,
        world.turn(),
        world.population_count(),
        world.total_deaths(),
        cultures,
        dominant
    );
    if cli.json {
        eprintln!("{summary}");
    } else {
        println!("{summary}");
    }
    Ok(())
}
