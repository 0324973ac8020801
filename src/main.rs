use mapf_cbs::common::{Path, Solution};
use mapf_cbs::config::{Cli, Config};
use mapf_cbs::map::Map;
use mapf_cbs::scenario::Scenario;
use mapf_cbs::solver::{Solver, CBS};
use mapf_cbs::stat::Stats;

use anyhow::{anyhow, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Output<'a> {
    stats: &'a Stats,
    paths: &'a [Path],
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    let config = if let Some(config_file) = cli.config.as_ref() {
        let config_str = std::fs::read_to_string(config_file)
            .with_context(|| format!("failed to read config file: {config_file}"))?;
        Config::from_yaml_str(&config_str)
            .with_context(|| format!("error with config file: {config_file}"))?
    } else {
        info!("No config file specified, using default config");
        Config::default()
    }
    .override_from_command_line(&cli)?;

    let map = Map::from_file(&config.map_path)?;
    let agents = if let Some(agents_yaml) = &config.agents_yaml {
        Scenario::load_agents_from_yaml(agents_yaml)?
    } else {
        let scenario = Scenario::load_from_scen(&config.scen_path)?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        if config.agents_dist.is_empty() {
            scenario.generate_agents_randomly(config.num_agents, &mut rng)?
        } else {
            scenario.generate_agents_by_buckets(config.num_agents, &config.agents_dist, &mut rng)?
        }
    };

    if let Some(agent) = agents.iter().find(|agent| !agent.verify(&map)) {
        return Err(anyhow!("agent {agent:?} starts or ends on a blocked cell"));
    }

    if config.debug_yaml {
        Scenario::write_agents_to_yaml("debug.yaml", &agents)?;
    }

    let mut solver = CBS::new(agents.clone(), &map);
    match solver.solve(&config) {
        Ok(solution) => {
            if !solution.verify(&map, &agents) {
                return Err(anyhow!("solver returned an invalid solution"));
            }
            write_output(&config.output_path, solver.stats(), &solution)?;
            info!("solution written to {}", config.output_path);
            Ok(())
        }
        Err(err) => {
            error!("cbs solve fails: {err}");
            Err(err.into())
        }
    }
}

fn write_output(path: &str, stats: &Stats, solution: &Solution) -> anyhow::Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("failed to create {path}"))?;
    serde_json::to_writer_pretty(
        BufWriter::new(file),
        &Output {
            stats,
            paths: &solution.paths,
        },
    )?;
    Ok(())
}
