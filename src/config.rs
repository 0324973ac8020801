use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use serde::Deserialize;

/// How a conflict is turned into the two branching constraints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Forbid the conflict for each agent in turn.
    #[default]
    Standard,
    /// Enforce the conflict on one agent, forbid it for the other.
    Disjoint,
}

#[derive(Parser, Debug)]
#[command(
    name = "MAPF CBS",
    about = "Conflict-based search for multi-agent path finding.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the map file")]
    pub map_path: Option<String>,

    #[arg(long, help = "Path to the scenario file")]
    pub scen_path: Option<String>,

    #[arg(long, help = "Path to a YAML agents file, used instead of the scenario")]
    pub agents_yaml: Option<String>,

    #[arg(long, help = "Path to the output file")]
    pub output_path: Option<String>,

    #[arg(long, help = "Number of agents")]
    pub num_agents: Option<usize>,

    #[arg(long, help = "Distribution of agents", use_value_delimiter = true)]
    pub agents_dist: Vec<usize>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,

    #[arg(long, value_enum, help = "Conflict splitting strategy")]
    pub strategy: Option<SplitStrategy>,

    #[arg(long, help = "Stop after expanding this many high level nodes")]
    pub max_expanded_nodes: Option<usize>,

    #[arg(long, help = "Stop after this many milliseconds")]
    pub time_limit_ms: Option<u64>,

    #[arg(long, help = "Dump the generated agents to debug.yaml")]
    pub debug_yaml: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub map_path: String,
    pub scen_path: String,
    pub agents_yaml: Option<String>,
    pub output_path: String,
    pub num_agents: usize,
    pub agents_dist: Vec<usize>,
    pub seed: u64,
    pub strategy: SplitStrategy,
    pub max_expanded_nodes: Option<usize>,
    pub time_limit_ms: Option<u64>,
    pub debug_yaml: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: "map_file/test/cross.map".to_string(),
            scen_path: "map_file/test/cross.scen".to_string(),
            agents_yaml: None,
            output_path: "result/result.json".to_string(),
            num_agents: 2,
            agents_dist: Vec::new(),
            seed: 0,
            strategy: SplitStrategy::Standard,
            max_expanded_nodes: None,
            time_limit_ms: None,
            debug_yaml: false,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map_path) = &cli.map_path {
            self.map_path = map_path.clone();
        }
        if let Some(scen_path) = &cli.scen_path {
            self.scen_path = scen_path.clone();
        }
        if let Some(agents_yaml) = &cli.agents_yaml {
            self.agents_yaml = Some(agents_yaml.clone());
        }
        if let Some(output_path) = &cli.output_path {
            self.output_path = output_path.clone();
        }
        if let Some(num_agents) = cli.num_agents {
            self.num_agents = num_agents;
        }
        if !cli.agents_dist.is_empty() {
            self.agents_dist = cli.agents_dist.clone();
        }
        if let Some(seed) = cli.seed {
            self.seed = seed;
        }
        if let Some(strategy) = cli.strategy {
            self.strategy = strategy;
        }
        if cli.max_expanded_nodes.is_some() {
            self.max_expanded_nodes = cli.max_expanded_nodes;
        }
        if cli.time_limit_ms.is_some() {
            self.time_limit_ms = cli.time_limit_ms;
        }
        self.debug_yaml |= cli.debug_yaml;

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.num_agents == 0 {
            return Err(anyhow!("Number of agents must be positive"));
        }

        if !self.agents_dist.is_empty() && self.agents_dist.len() != self.num_agents {
            return Err(anyhow!(
                "Agents distribution has {} entries, expected {}",
                self.agents_dist.len(),
                self.num_agents
            ));
        }

        if self.max_expanded_nodes == Some(0) {
            return Err(anyhow!("Expanded node budget must be positive"));
        }

        if self.time_limit_ms == Some(0) {
            return Err(anyhow!("Time limit must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_yaml() {
        let config = Config::from_yaml_str(
            "map_path: maps/empty.map\nnum_agents: 3\nstrategy: disjoint\nmax_expanded_nodes: 500\n",
        )
        .unwrap();
        assert_eq!(config.map_path, "maps/empty.map");
        assert_eq!(config.num_agents, 3);
        assert_eq!(config.strategy, SplitStrategy::Disjoint);
        assert_eq!(config.max_expanded_nodes, Some(500));
        assert_eq!(config.seed, 0);
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        assert!(Config::from_yaml_str("num_agent: 3\n").is_err());
    }

    #[test]
    fn test_override_from_command_line() {
        let cli = Cli::parse_from([
            "mapf_cbs",
            "--num-agents",
            "2",
            "--agents-dist",
            "0,1",
            "--strategy",
            "disjoint",
            "--seed",
            "9",
        ]);
        let config = Config::default().override_from_command_line(&cli).unwrap();
        assert_eq!(config.agents_dist, vec![0, 1]);
        assert_eq!(config.strategy, SplitStrategy::Disjoint);
        assert_eq!(config.seed, 9);
        assert_eq!(config.map_path, Config::default().map_path);
    }

    #[test]
    fn test_validate_agents_dist() {
        let config = Config {
            num_agents: 3,
            agents_dist: vec![0, 1],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
