use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::process;

use signal_actor::config::{RunParams, TlSettings};
use signal_actor::control_system::{Color, ControllerRegistry};
use signal_actor::engine::SignalEnv;
use signal_actor::error::ControllerError;
use signal_actor::monitoring::append_events_to_csv;
use signal_actor::simulation_engine::{SimulatedNetwork, SimulatorConnection};

/// Drives the configured intersections with a random agent against the
/// in-memory simulator.
#[derive(Debug, Parser)]
struct Args {
    /// Run parameters file (Environment / Simulation sections).
    #[arg(long)]
    params: PathBuf,
    /// Agent steps to run; defaults to one full episode.
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Append committed signal changes to this CSV file.
    #[arg(long)]
    events_csv: Option<PathBuf>,
}

fn build_network(registry: &ControllerRegistry, sim_step: f64) -> Result<SimulatedNetwork, ControllerError> {
    let mut network = SimulatedNetwork::new(sim_step)?;
    for controller in registry.iter() {
        // Start every intersection on the green of its first combination.
        let first = controller.current_combination();
        let phase = controller
            .timing_plan()
            .phase_index(first.movements(), Color::Green)?;
        network.add_traffic_light(controller.timing_plan(), phase)?;
    }
    Ok(network)
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let params = RunParams::load(&args.params)?;
    let settings_path = params.tl_settings_path(&args.params);
    let settings = TlSettings::load(&settings_path)?;
    let settings_dir = settings_path.parent().unwrap_or_else(|| Path::new("."));
    let registry = ControllerRegistry::from_settings(&settings, settings_dir)?;
    let network = build_network(&registry, params.simulation.sim_step)?;

    let mut env = SignalEnv::new(params.environment.clone(), registry, network)?;
    let shape = env.action_space_shape();
    info!("action space shape {:?}", shape);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let ticks = args.ticks.unwrap_or(u64::from(params.environment.horizon));
    for tick in 0..ticks {
        let actions: Vec<f64> = shape
            .iter()
            .map(|&len| rng.random_range(0.0..len as f64))
            .collect();
        let outcome = env.step(&actions)?;
        info!(
            "tick {} t={:.1} states={:?} green_for={:?}",
            tick,
            env.connection().sim_time(),
            outcome.observation.states,
            outcome.observation.last_green_durations
        );
        if outcome.done {
            break;
        }
    }

    let (mut registry, _) = env.into_parts();
    let events = registry.drain_events();
    println!("{} signal changes committed", events.len());
    if let Some(path) = &args.events_csv {
        append_events_to_csv(path, &events)?;
        println!("events written to {}", path.display());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Signal controller error: {}", e);
        process::exit(1);
    }
}
