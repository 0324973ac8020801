use anyhow::{anyhow, Context, Result};
use rand::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{self, BufReader, Write};
use tracing::info;

use crate::common::Agent;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Route {
    pub start_x: usize,
    pub start_y: usize,
    pub goal_x: usize,
    pub goal_y: usize,
}

type Bucket = Vec<Route>;

/// Routes of a MovingAI `.scen` file grouped by bucket.
#[derive(Debug, Default)]
pub struct Scenario {
    pub map: String,
    pub map_width: usize,
    pub map_height: usize,
    pub buckets: BTreeMap<usize, Bucket>,
}

impl Scenario {
    pub fn load_from_scen(path: &str) -> Result<Scenario> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {path}"))?;
        Self::parse(&content).with_context(|| format!("malformed scenario file {path}"))
    }

    pub fn parse(content: &str) -> Result<Scenario> {
        let mut lines = content.lines();

        // First line is "version x.x" which we can skip
        let _version = lines.next().ok_or_else(|| anyhow!("empty scenario"))?;

        let mut scenario = Scenario::default();

        for (index, line) in lines.enumerate() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            if parts.len() < 8 {
                return Err(anyhow!("line {} has {} fields", index + 2, parts.len()));
            }
            let field = |i: usize| -> Result<usize> {
                parts[i]
                    .parse()
                    .with_context(|| format!("line {} field {i}: {:?}", index + 2, parts[i]))
            };

            // Scenario columns are x (column) before y (row).
            let route = Route {
                start_x: field(5)?,
                start_y: field(4)?,
                goal_x: field(7)?,
                goal_y: field(6)?,
            };

            if scenario.map.is_empty() {
                // Initialize map details from the first route entry
                scenario.map = parts[1].to_string();
                scenario.map_width = field(2)?;
                scenario.map_height = field(3)?;
            }

            scenario.buckets.entry(field(0)?).or_default().push(route);
        }

        Ok(scenario)
    }

    pub fn generate_agents_by_buckets<R: Rng + ?Sized>(
        &self,
        num_agents: usize,
        agent_buckets: &[usize],
        rng: &mut R,
    ) -> Result<Vec<Agent>> {
        if agent_buckets.len() != num_agents {
            return Err(anyhow!(
                "Number of agents does not match the length of agent_buckets"
            ));
        }

        let mut agents: Vec<Agent> = Vec::new();
        let mut used_routes: HashSet<(usize, usize)> = HashSet::new();

        for (agent_id, &bucket_index) in agent_buckets.iter().enumerate() {
            let bucket = self
                .buckets
                .get(&bucket_index)
                .ok_or_else(|| anyhow!("Bucket {} not found", bucket_index))?;

            // Find unused routes
            let available_routes: Vec<usize> = (0..bucket.len())
                .filter(|idx| !used_routes.contains(&(bucket_index, *idx)))
                .collect();

            // Select a random route from available ones
            let route_index = available_routes
                .choose(rng)
                .ok_or_else(|| anyhow!("No available routes left in bucket {}", bucket_index))?;

            let route = &bucket[*route_index];
            agents.push(Agent {
                id: agent_id,
                start: (route.start_x, route.start_y),
                goal: (route.goal_x, route.goal_y),
            });

            // Mark this route as used
            used_routes.insert((bucket_index, *route_index));
        }

        info!("Generate scen: {agents:?}");
        Ok(agents)
    }

    pub fn generate_agents_randomly<R: Rng + ?Sized>(
        &self,
        num_agents: usize,
        rng: &mut R,
    ) -> Result<Vec<Agent>> {
        let mut available_routes: Vec<Route> = self.buckets.values().flatten().cloned().collect();
        available_routes.sort();
        available_routes.dedup();

        if available_routes.len() < num_agents {
            return Err(anyhow!(
                "Not enough unique routes available to match the number of agents"
            ));
        }

        // Shuffle the available routes to randomize the route selection
        available_routes.shuffle(rng);

        let agents: Vec<Agent> = available_routes
            .into_iter()
            .take(num_agents)
            .enumerate()
            .map(|(agent_id, route)| Agent {
                id: agent_id,
                start: (route.start_x, route.start_y),
                goal: (route.goal_x, route.goal_y),
            })
            .collect();

        info!("Generate scen: {agents:?}");
        Ok(agents)
    }

    pub fn load_agents_from_yaml(path: &str) -> Result<Vec<Agent>> {
        let file = File::open(path).with_context(|| format!("failed to open agents {path}"))?;
        let reader = BufReader::new(file);
        let agents = serde_yaml::from_reader(reader)?;
        Ok(agents)
    }

    pub fn write_agents_to_yaml(path: &str, agents: &[Agent]) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        let yaml_data = serde_yaml::to_string(&agents)?;
        writer.write_all(yaml_data.as_bytes())?;

        Ok(())
    }
}
