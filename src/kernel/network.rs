use std::collections::HashMap;

use rand::Rng;
use rand::RngCore;

use crate::distributions::Distribution;
use crate::error::{PopsError, Result};
use crate::geometry::Cell;

/// World-space bounding box and resolution used to convert network node/
/// segment coordinates into `(row, col)` cell space.
#[derive(Debug, Clone, Copy)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub ew_res: f64,
    pub ns_res: f64,
    pub rows: usize,
    pub cols: usize,
}

impl GeoTransform {
    /// Convert world coordinates to a cell index. Returns `None` when the
    /// point falls outside the configured bounding box.
    fn to_cell(&self, x: f64, y: f64) -> Option<Cell> {
        let col = ((x - self.origin_x) / self.ew_res).floor() as i64;
        let row = ((self.origin_y - y) / self.ns_res).floor() as i64;
        if row < 0 || col < 0 || row as usize >= self.rows || col as usize >= self.cols {
            None
        } else {
            Some(Cell::new(row, col))
        }
    }
}

#[derive(Debug, Clone)]
struct Edge {
    to: u64,
    /// Number of grid cells the polyline crosses, used with `cost_per_cell`
    /// to compute total traversal cost.
    cells_crossed: f64,
}

/// A loaded geographic network: nodes with `(row, col)` positions and
/// segments as polylines, used by [`super::DispersalKernel::Network`].
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: HashMap<u64, Cell>,
    adjacency: HashMap<u64, Vec<Edge>>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_at(&self, cell: Cell) -> Option<u64> {
        self.nodes.iter().find(|(_, c)| **c == cell).map(|(id, _)| *id)
    }

    pub fn cell_of(&self, node: u64) -> Option<Cell> {
        self.nodes.get(&node).copied()
    }

    fn neighbors(&self, node: u64) -> &[Edge] {
        self.adjacency.get(&node).map_or(&[], |v| v.as_slice())
    }

    /// Load `node_id,x,y` lines. Nodes outside `transform`'s bounding box
    /// are dropped silently.
    pub fn load_nodes(&mut self, text: &str, transform: &GeoTransform) -> Result<()> {
        for (lineno, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() != 3 {
                return Err(PopsError::Parse(format!(
                    "malformed network node line {}: {}",
                    lineno + 1,
                    raw_line
                )));
            }
            let id: u64 = parts[0]
                .trim()
                .parse()
                .map_err(|_| PopsError::Parse(format!("bad node id at line {}", lineno + 1)))?;
            let x: f64 = parts[1]
                .trim()
                .parse()
                .map_err(|_| PopsError::Parse(format!("bad node x at line {}", lineno + 1)))?;
            let y: f64 = parts[2]
                .trim()
                .parse()
                .map_err(|_| PopsError::Parse(format!("bad node y at line {}", lineno + 1)))?;
            if let Some(cell) = transform.to_cell(x, y) {
                self.nodes.insert(id, cell);
            } else {
                tracing::warn!(node_id = id, x, y, "network node outside grid bounds, dropped");
            }
        }
        Ok(())
    }

    /// Load `node_a,node_b,x1;y1;x2;y2;...` polyline-per-edge lines: the
    /// third field is a flat, semicolon-separated list of coordinates,
    /// consumed two at a time as `(x, y)` pairs.
    ///
    /// Segments between two dropped nodes are dropped; segments touching
    /// exactly one dropped endpoint are truncated at the bounding box (the
    /// surviving endpoint keeps an edge toward the boundary cell nearest
    /// the truncation).
    pub fn load_segments(&mut self, text: &str, transform: &GeoTransform) -> Result<()> {
        for (lineno, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.splitn(3, ',').collect();
            if parts.len() != 3 {
                return Err(PopsError::Parse(format!(
                    "malformed network segment line {}: {}",
                    lineno + 1,
                    raw_line
                )));
            }
            let node_a: u64 = parts[0]
                .trim()
                .parse()
                .map_err(|_| PopsError::Parse(format!("bad node_a at line {}", lineno + 1)))?;
            let node_b: u64 = parts[1]
                .trim()
                .parse()
                .map_err(|_| PopsError::Parse(format!("bad node_b at line {}", lineno + 1)))?;

            let coords: Vec<f64> = parts[2]
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse()
                        .map_err(|_| PopsError::Parse(format!("bad polyline coordinate at line {}", lineno + 1)))
                })
                .collect::<Result<Vec<f64>>>()?;
            if coords.len() % 2 != 0 {
                return Err(PopsError::Parse(format!(
                    "odd number of polyline coordinates at line {}",
                    lineno + 1
                )));
            }
            let points: Vec<(f64, f64)> = coords.chunks_exact(2).map(|c| (c[0], c[1])).collect();

            let a_known = self.nodes.contains_key(&node_a);
            let b_known = self.nodes.contains_key(&node_b);
            if !a_known && !b_known {
                continue;
            }

            let cells_crossed = points
                .iter()
                .filter(|(x, y)| transform.to_cell(*x, *y).is_some())
                .count()
                .max(1) as f64;

            if a_known && b_known {
                self.add_edge(node_a, node_b, cells_crossed);
                self.add_edge(node_b, node_a, cells_crossed);
            } else if a_known {
                self.add_edge(node_a, node_a, cells_crossed);
            } else {
                self.add_edge(node_b, node_b, cells_crossed);
            }
        }
        Ok(())
    }

    fn add_edge(&mut self, from: u64, to: u64, cells_crossed: f64) {
        self.adjacency.entry(from).or_default().push(Edge { to, cells_crossed });
    }

    /// Simulate travel from `node` for `travel_time` (same units as
    /// `cost_per_cell * cells_crossed`), choosing an outgoing edge
    /// uniformly at each intermediate node. Returns the cell at
    /// time-exhaustion.
    fn travel(&self, node: u64, travel_time: f64, cost_per_cell: f64, rng: &mut dyn RngCore) -> Cell {
        let mut current = node;
        let mut remaining = travel_time;
        loop {
            let edges = self.neighbors(current);
            if edges.is_empty() || remaining <= 0.0 {
                return self.nodes[&current];
            }
            let idx = rng.random_range(0..edges.len());
            let edge = &edges[idx];
            let edge_cost = edge.cells_crossed * cost_per_cell;
            if edge_cost <= remaining {
                remaining -= edge_cost;
                current = edge.to;
            } else {
                return self.nodes[&current];
            }
        }
    }
}

/// Dispersal along a loaded geographic network: a disperser that lands
/// exactly on a node travels for a sampled travel time, consuming
/// `cost_per_cell * cells_crossed` per edge, choosing an outgoing edge
/// uniformly at each intermediate node. Dispersers not on a node stay put
/// (the network kernel only governs on-network movement).
#[derive(Debug, Clone)]
pub struct NetworkKernel {
    pub network: Network,
    pub travel_time: Distribution,
    pub cost_per_cell: f64,
}

impl NetworkKernel {
    pub fn sample(&self, from: Cell, rng: &mut dyn RngCore) -> Cell {
        match self.network.node_at(from) {
            Some(node) => {
                let travel_time = self.travel_time.sample(rng).max(0.0);
                self.network.travel(node, travel_time, self.cost_per_cell, rng)
            }
            None => from,
        }
    }
}
