//! Multi-stop route planning over a fixed location catalog.
//!
//! The planner builds a complete graph over the catalog (edge weight =
//! great-circle distance) at construction and answers multi-stop requests by
//! running Dijkstra between each consecutive pair of stops. On a complete
//! graph the direct edge always wins, but the search stays in place so the
//! planner keeps working if the catalog ever becomes sparse.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use anyhow::Result;
use itertools::Itertools;
use log::info;
use serde::Serialize;
use thiserror::Error;

use crate::{cli::RouteArgs, table};

const EARTH_RADIUS_KM: f64 = 6371.0;
const FUEL_EFFICIENCY_KM_PER_UNIT: f64 = 15.0;
const AVERAGE_SPEED_KMH: f64 = 60.0;

/// Immutable name → (latitude, longitude) mapping, injected into the planner
/// so tests can swap in alternate catalogs.
#[derive(Debug, Clone)]
pub struct LocationCatalog {
    places: BTreeMap<String, (f64, f64)>,
}

impl Default for LocationCatalog {
    fn default() -> Self {
        Self::from_entries([
            ("Mumbai", (19.0760, 72.8777)),
            ("Delhi", (28.6139, 77.2090)),
            ("Jaipur", (26.9124, 75.7873)),
            ("Indore", (22.7196, 75.8577)),
            ("Bengaluru", (12.9716, 77.5946)),
        ])
    }
}

impl LocationCatalog {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, (f64, f64))>,
        S: Into<String>,
    {
        Self {
            places: entries
                .into_iter()
                .map(|(name, coords)| (name.into(), coords))
                .collect(),
        }
    }

    pub fn coordinates(&self, name: &str) -> Option<(f64, f64)> {
        self.places.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.places.keys().map(String::as_str)
    }
}

/// Great-circle distance in kilometres between two (lat, lon) points.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().asin()
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Routing not supported for: {0}")]
    UnsupportedLocation(String),
    #[error("No route between '{from}' and '{to}'")]
    NoRoute { from: String, to: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteResult {
    pub path: Vec<String>,
    pub distance_km: f64,
    pub fuel_cost: f64,
    pub eta_hours: f64,
}

pub struct RoutePlanner {
    names: Vec<String>,
    index: BTreeMap<String, usize>,
    edges: Vec<Vec<(usize, f64)>>,
}

impl RoutePlanner {
    /// Builds the complete weighted graph over the catalog.
    pub fn new(catalog: &LocationCatalog) -> Self {
        let names: Vec<String> = catalog.names().map(str::to_string).collect();
        let coords: Vec<(f64, f64)> = names
            .iter()
            .filter_map(|name| catalog.coordinates(name))
            .collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        let mut edges = vec![Vec::with_capacity(names.len().saturating_sub(1)); names.len()];
        for a in 0..names.len() {
            for b in 0..names.len() {
                if a != b {
                    edges[a].push((b, haversine_km(coords[a], coords[b])));
                }
            }
        }
        Self {
            names,
            index,
            edges,
        }
    }

    /// Plans a route visiting `stops` in order. Every stop is validated
    /// against the catalog before any graph work happens; an unknown stop
    /// aborts the whole call.
    pub fn plan_route(&self, stops: &[String], fuel_price: f64) -> Result<RouteResult, RouteError> {
        for stop in stops {
            if !self.index.contains_key(stop) {
                return Err(RouteError::UnsupportedLocation(stop.clone()));
            }
        }

        let mut path: Vec<String> = Vec::new();
        let mut total_distance = 0.0;
        for (from, to) in stops.iter().tuple_windows() {
            let start = self.index[from];
            let goal = self.index[to];
            let (segment, distance) =
                self.shortest_path(start, goal)
                    .ok_or_else(|| RouteError::NoRoute {
                        from: from.clone(),
                        to: to.clone(),
                    })?;
            total_distance += distance;
            // Drop the junction node; it opens the next segment.
            path.extend(
                segment[..segment.len() - 1]
                    .iter()
                    .map(|&idx| self.names[idx].clone()),
            );
        }
        if let Some(last) = stops.last() {
            path.push(last.clone());
        }

        Ok(RouteResult {
            path,
            distance_km: round2(total_distance),
            fuel_cost: round2(total_distance / FUEL_EFFICIENCY_KM_PER_UNIT * fuel_price),
            eta_hours: round2(total_distance / AVERAGE_SPEED_KMH),
        })
    }

    /// Dijkstra over the node set; returns the node path including both
    /// endpoints and its length.
    fn shortest_path(&self, start: usize, goal: usize) -> Option<(Vec<usize>, f64)> {
        let mut dist = vec![f64::INFINITY; self.names.len()];
        let mut prev: Vec<Option<usize>> = vec![None; self.names.len()];
        let mut heap = BinaryHeap::new();
        dist[start] = 0.0;
        heap.push(HeapEntry {
            cost: 0.0,
            node: start,
        });

        while let Some(HeapEntry { cost, node }) = heap.pop() {
            if node == goal {
                break;
            }
            if cost > dist[node] {
                continue;
            }
            for &(next, weight) in &self.edges[node] {
                let candidate = cost + weight;
                if candidate < dist[next] {
                    dist[next] = candidate;
                    prev[next] = Some(node);
                    heap.push(HeapEntry {
                        cost: candidate,
                        node: next,
                    });
                }
            }
        }

        if dist[goal].is_infinite() {
            return None;
        }
        let mut path = vec![goal];
        let mut cursor = goal;
        while let Some(previous) = prev[cursor] {
            path.push(previous);
            cursor = previous;
        }
        path.reverse();
        Some((path, dist[goal]))
    }
}

/// Min-heap entry ordered by cost; ties broken by node index for
/// deterministic expansion order.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeapEntry {
    cost: f64,
    node: usize,
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn execute(args: &RouteArgs) -> Result<()> {
    let catalog = LocationCatalog::default();
    let planner = RoutePlanner::new(&catalog);
    let result = planner.plan_route(&args.stops, args.fuel_price)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("route: {}", result.path.iter().join(" -> "));
    let headers = vec!["metric".to_string(), "value".to_string()];
    let rows = vec![
        vec!["distance_km".to_string(), format!("{:.2}", result.distance_km)],
        vec!["fuel_cost".to_string(), format!("{:.2}", result.fuel_cost)],
        vec!["eta_hours".to_string(), format!("{:.2}", result.eta_hours)],
    ];
    table::print_table(&headers, &rows);
    info!(
        "Planned {}-stop route covering {:.2} km",
        args.stops.len(),
        result.distance_km
    );
    Ok(())
}
