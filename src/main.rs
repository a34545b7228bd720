use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, warn, Subscriber};
use tracing_subscriber::{fmt, fmt::MakeWriter, prelude::*, reload, EnvFilter, Registry};

use ecogrid::{
    snapshot::{render_text, FieldSnapshot},
    Engine, ScenarioLoader,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Predator/prey field runner")]
struct Cli {
    /// Scenario file: YAML, or key=value text for .txt/.properties
    #[arg(long, default_value = "scenarios/default_field.yaml")]
    scenario: PathBuf,

    /// Override tick count (uses scenario default when omitted)
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print one JSON snapshot per tick
    #[arg(long)]
    json: bool,

    /// Print the final field as text
    #[arg(long)]
    render: bool,

    /// Keep stepping after only one species is left
    #[arg(long)]
    keep_going: bool,
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Build the subscriber that gets installed before anything is loaded.
/// `RUST_LOG` wins; without it logging starts at `info` and the returned
/// handle lets the scenario pick its own level afterwards.
fn subscriber<W>(make_writer: W) -> (impl Subscriber + Send + Sync, Option<FilterHandle>)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let from_env = EnvFilter::try_from_default_env().ok();
    let overridable = from_env.is_none();
    let (filter, handle) = reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("info")));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(make_writer));
    (subscriber, overridable.then_some(handle))
}

fn init_tracing() -> Option<FilterHandle> {
    let (subscriber, handle) = subscriber(std::io::stderr);
    let _ = subscriber.try_init();
    handle
}

fn apply_scenario_level(handle: &FilterHandle, level: &str) {
    match EnvFilter::try_new(level) {
        Ok(filter) => {
            if let Err(err) = handle.reload(filter) {
                warn!(%err, "failed to apply scenario log level");
            }
        }
        Err(err) => warn!(%err, level, "invalid scenario log level, keeping info"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = init_tracing();
    let loader = ScenarioLoader::new(".");
    let mut scenario = loader.load(&cli.scenario)?;
    if let Some(handle) = &filter {
        apply_scenario_level(handle, &scenario.logging.level);
    }

    if let Some(seed) = cli.seed {
        scenario.seed = seed;
    }
    let ticks = scenario.ticks(cli.ticks);
    let mut engine = Engine::from_scenario(&scenario)
        .with_context(|| format!("Failed to build field for '{}'", scenario.name))?;

    let json = cli.json;
    let print_snapshot = |snapshot: &FieldSnapshot| {
        if !json {
            return;
        }
        match snapshot.to_json() {
            Ok(line) => println!("{line}"),
            Err(err) => error!(%err, tick = snapshot.tick, "failed to encode snapshot"),
        }
    };
    let summary = if cli.keep_going {
        engine.run_with_hook(ticks, print_snapshot)
    } else {
        engine.run_while_viable_with_hook(ticks, print_snapshot)
    };

    if cli.render {
        print!("{}", render_text(engine.field()));
    }
    println!(
        "Scenario '{}' stopped at tick {} after {} ticks. Population: {} ({}){}",
        scenario.name,
        summary.final_tick,
        summary.ticks_run,
        summary.population,
        engine.counts(),
        if summary.viable { "" } else { ", no longer viable" }
    );
    Ok(())
}
