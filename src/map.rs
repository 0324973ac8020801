use anyhow::{anyhow, Context, Result};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::common::Position;

/// Distance-to-goal table indexed as `heuristic[x][y]`; `usize::MAX` marks
/// cells that cannot reach the goal.
pub type Heuristic = Vec<Vec<usize>>;

#[derive(Debug, Clone)]
pub struct Tile {
    passable: bool,
    pub neighbors: Vec<Position>, // Stores coordinates of accessible neighbors
}

impl Tile {
    pub fn is_passable(&self) -> bool {
        self.passable
    }
}

#[derive(Debug, Clone)]
pub struct Map {
    pub height: usize,
    pub width: usize,
    pub grid: Vec<Vec<Tile>>,
}

impl Map {
    pub fn from_file(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read map {path}"))?;
        Self::parse(&content).with_context(|| format!("malformed map file {path}"))
    }

    /// Parses the MovingAI `.map` format.
    pub fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines();

        let _type = lines.next().ok_or_else(|| anyhow!("missing type line"))?;
        let height = parse_header(lines.next(), "height")?;
        let width = parse_header(lines.next(), "width")?;
        let _map = lines.next().ok_or_else(|| anyhow!("missing map line"))?;

        let mut grid = Vec::with_capacity(height);
        for line in lines.take(height) {
            let tiles_row: Vec<Tile> = line
                .chars()
                .take(width)
                .map(|ch| Tile {
                    passable: ch == '.',
                    neighbors: Vec::new(),
                })
                .collect();
            if tiles_row.len() != width {
                return Err(anyhow!(
                    "row {} has {} cells, expected {width}",
                    grid.len(),
                    tiles_row.len()
                ));
            }
            grid.push(tiles_row);
        }

        if grid.len() != height {
            return Err(anyhow!("found {} rows, expected {height}", grid.len()));
        }

        let mut map = Map {
            height,
            width,
            grid,
        };
        map.initialize_neighbors();
        Ok(map)
    }

    fn initialize_neighbors(&mut self) {
        for x in 0..self.height {
            for y in 0..self.width {
                if self.grid[x][y].passable {
                    self.grid[x][y].neighbors = self.get_neighbors(x, y, false);
                }
            }
        }
    }

    pub fn get_neighbors(&self, x: usize, y: usize, allow_wait: bool) -> Vec<Position> {
        let directions = [(-1, 0), (1, 0), (0, -1), (0, 1), (0, 0)]; // Up, down, left, right, stay
        let mut neighbors = Vec::new();

        for &(dx, dy) in &directions {
            if !allow_wait && dx == 0 && dy == 0 {
                continue;
            }
            let new_x = x as i64 + dx;
            let new_y = y as i64 + dy;
            if new_x >= 0
                && new_y >= 0
                && new_x < self.height as i64
                && new_y < self.width as i64
                && self.grid[new_x as usize][new_y as usize].passable
            {
                neighbors.push((new_x as usize, new_y as usize));
            }
        }

        neighbors
    }

    pub fn contains(&self, position: Position) -> bool {
        position.0 < self.height && position.1 < self.width
    }

    pub fn is_passable(&self, x: usize, y: usize) -> bool {
        self.grid[x][y].is_passable()
    }

    /// Exact distance from every cell to `goal`, used as the admissible
    /// heuristic of the low-level search.
    pub fn heuristic_dji(&self, goal: Position) -> Heuristic {
        let mut heuristic = vec![vec![usize::MAX; self.width]; self.height];
        if !self.contains(goal) {
            return heuristic;
        }
        let mut heap = BinaryHeap::new();

        heuristic[goal.0][goal.1] = 0;
        heap.push((Reverse(0), goal));

        while let Some((Reverse(cost), (x, y))) = heap.pop() {
            if cost > heuristic[x][y] {
                continue;
            }

            for &(new_x, new_y) in &self.grid[x][y].neighbors {
                let next_cost = cost + 1;
                if next_cost < heuristic[new_x][new_y] {
                    heap.push((Reverse(next_cost), (new_x, new_y)));
                    heuristic[new_x][new_y] = next_cost;
                }
            }
        }

        heuristic
    }
}

fn parse_header(line: Option<&str>, key: &str) -> Result<usize> {
    let line = line.ok_or_else(|| anyhow!("missing {key} line"))?;
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(name), Some(value)) if name == key => value
            .parse::<usize>()
            .with_context(|| format!("invalid {key} value {value:?}")),
        _ => Err(anyhow!("expected `{key} <n>`, got {line:?}")),
    }
}
