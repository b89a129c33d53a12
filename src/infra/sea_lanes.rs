//! Coarse ocean waypoint network used as the bundled geometry solver.
//!
//! Lanes through a chokepoint carry the [`Restriction`] that closes them.
//! Ports attach to their nearest waypoints regardless of closures.

use std::collections::HashMap;

use pathfinding::prelude::dijkstra;
use thiserror::Error;
use tracing::trace;

use crate::domain::{
    great_circle_km, Coordinates, GeometryError, GeometrySolver, Restriction, RestrictionSet,
    SolverPath,
};

/// How many waypoints each endpoint connects to.
pub const ATTACHMENT_FANOUT: usize = 2;

#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("lane references unknown waypoint `{0}`")]
    UnknownWaypoint(String),
    #[error("waypoint `{0}` has invalid coordinates")]
    InvalidWaypoint(String),
    #[error("duplicate waypoint `{0}`")]
    DuplicateWaypoint(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Waypoint {
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Lane {
    to: usize,
    meters: u64,
    passage: Option<Restriction>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Node {
    Start,
    Waypoint(usize),
    Goal,
}

#[derive(Clone, Debug)]
pub struct SeaLaneNetwork {
    waypoints: Vec<Waypoint>,
    lanes: Vec<Vec<Lane>>,
}

const WAYPOINTS: &[(&str, f64, f64)] = &[
    // South American coast
    ("Amazon Approaches", -44.0, 1.5),
    ("Cape São Roque", -34.0, -5.5),
    ("Abrolhos Offshore", -37.5, -19.0),
    ("Santos Basin", -45.0, -26.5),
    ("Rio Grande Offshore", -50.5, -33.5),
    // Atlantic
    ("South Atlantic", -15.0, -25.0),
    ("Cape of Good Hope", 19.0, -36.5),
    ("Equatorial Atlantic", -25.0, 0.0),
    ("Cape Verde", -24.0, 15.0),
    ("Canaries", -16.0, 28.0),
    ("Western Approaches", -9.0, 45.0),
    ("English Channel", -2.0, 50.0),
    ("North Sea", 3.5, 53.5),
    ("Norwegian Sea", 8.0, 65.0),
    ("Lesser Antilles", -60.0, 14.0),
    ("Sargasso Sea", -60.0, 30.0),
    ("US East Coast", -71.0, 38.5),
    ("Newfoundland", -50.0, 45.0),
    ("Labrador Sea", -55.0, 58.0),
    // Caribbean and Gulf of Mexico
    ("Caribbean Sea", -75.0, 14.0),
    ("Yucatan Channel", -85.5, 21.5),
    ("Gulf of Mexico", -90.0, 26.0),
    ("Florida Strait", -80.5, 24.3),
    ("Panama Atlantic", -79.9, 9.5),
    ("Panama Pacific", -79.5, 8.0),
    // Mediterranean and Red Sea
    ("Gibraltar West", -7.0, 36.0),
    ("Gibraltar East", -4.0, 36.2),
    ("Balearic Sea", 2.0, 38.5),
    ("Ligurian Sea", 8.5, 43.0),
    ("Sicily Channel", 12.5, 37.0),
    ("Eastern Mediterranean", 25.0, 34.0),
    ("Port Said", 32.3, 31.6),
    ("Suez", 32.6, 29.5),
    ("Red Sea Central", 38.0, 20.0),
    ("Bab-el-Mandeb North", 42.7, 13.5),
    ("Gulf of Aden", 47.0, 12.2),
    // Indian Ocean and Gulf
    ("Arabian Sea", 62.0, 15.0),
    ("Gulf of Oman", 58.8, 23.8),
    ("Strait of Hormuz", 56.5, 26.4),
    ("Persian Gulf", 52.0, 27.0),
    ("Southwest Indian Ocean", 55.0, -28.0),
    ("Central Indian Ocean", 75.0, -5.0),
    ("Eastern Indian Ocean", 100.0, -12.0),
    ("Sri Lanka South", 81.0, 5.0),
    // South-east Asia
    ("Malacca North", 96.5, 6.0),
    ("Singapore Strait", 104.2, 1.2),
    ("Sunda West", 104.5, -7.0),
    ("Java Sea", 107.5, -5.0),
    ("Lombok Strait", 115.8, -9.0),
    ("Makassar Strait", 118.5, -2.0),
    ("Celebes Sea", 122.0, 4.0),
    ("Gulf of Thailand", 101.5, 10.0),
    ("South China Sea", 112.0, 12.0),
    ("Luzon West", 119.5, 15.0),
    ("Luzon Strait", 121.0, 20.5),
    // East Asia and Pacific
    ("East China Sea", 125.0, 29.0),
    ("Yellow Sea", 122.5, 35.0),
    ("Tokyo Approaches", 140.5, 34.0),
    ("Philippine Sea", 130.0, 12.0),
    ("Western Pacific", 150.0, 25.0),
    ("North Pacific", 165.0, 48.0),
    ("Central Pacific", -155.0, 20.0),
    ("Eastern Pacific", -110.0, 15.0),
    // Arctic
    ("Barents Sea", 35.0, 72.5),
    ("Kara Sea", 70.0, 76.0),
    ("East Siberian Sea", 160.0, 73.0),
    ("Chukchi Sea", -170.0, 69.0),
    ("Bering Sea", -175.0, 60.0),
    ("Baffin Bay", -65.0, 73.0),
    ("Beaufort Sea", -135.0, 72.0),
];

const LANES: &[(&str, &str, Option<Restriction>)] = &[
    ("Rio Grande Offshore", "Santos Basin", None),
    ("Santos Basin", "Abrolhos Offshore", None),
    ("Abrolhos Offshore", "Cape São Roque", None),
    ("Cape São Roque", "Amazon Approaches", None),
    ("Santos Basin", "South Atlantic", None),
    ("Rio Grande Offshore", "South Atlantic", None),
    ("Abrolhos Offshore", "South Atlantic", None),
    ("South Atlantic", "Cape of Good Hope", None),
    ("Cape São Roque", "Equatorial Atlantic", None),
    ("Amazon Approaches", "Equatorial Atlantic", None),
    ("Equatorial Atlantic", "Cape Verde", None),
    ("Cape Verde", "Canaries", None),
    ("Canaries", "Gibraltar West", None),
    ("Canaries", "Western Approaches", None),
    ("Gibraltar West", "Western Approaches", None),
    ("Western Approaches", "English Channel", None),
    ("English Channel", "North Sea", None),
    ("North Sea", "Norwegian Sea", None),
    ("Norwegian Sea", "Barents Sea", None),
    ("Amazon Approaches", "Lesser Antilles", None),
    ("Lesser Antilles", "Caribbean Sea", None),
    ("Lesser Antilles", "Sargasso Sea", None),
    ("Sargasso Sea", "US East Coast", None),
    ("Sargasso Sea", "Canaries", None),
    ("US East Coast", "Florida Strait", None),
    ("US East Coast", "Newfoundland", None),
    ("Newfoundland", "Western Approaches", None),
    ("Newfoundland", "Labrador Sea", None),
    ("Labrador Sea", "Baffin Bay", None),
    ("Caribbean Sea", "Yucatan Channel", None),
    ("Caribbean Sea", "Panama Atlantic", None),
    ("Yucatan Channel", "Gulf of Mexico", None),
    ("Gulf of Mexico", "Florida Strait", None),
    ("Panama Atlantic", "Panama Pacific", Some(Restriction::Panama)),
    ("Panama Pacific", "Eastern Pacific", None),
    ("Eastern Pacific", "Central Pacific", None),
    ("Central Pacific", "Western Pacific", None),
    ("Central Pacific", "North Pacific", None),
    ("North Pacific", "Tokyo Approaches", None),
    ("Western Pacific", "Tokyo Approaches", None),
    ("Western Pacific", "Philippine Sea", None),
    ("Gibraltar West", "Gibraltar East", Some(Restriction::Gibraltar)),
    ("Gibraltar East", "Balearic Sea", None),
    ("Balearic Sea", "Ligurian Sea", None),
    ("Balearic Sea", "Sicily Channel", None),
    ("Ligurian Sea", "Sicily Channel", None),
    ("Sicily Channel", "Eastern Mediterranean", None),
    ("Eastern Mediterranean", "Port Said", None),
    ("Port Said", "Suez", Some(Restriction::Suez)),
    ("Suez", "Red Sea Central", None),
    ("Red Sea Central", "Bab-el-Mandeb North", None),
    ("Bab-el-Mandeb North", "Gulf of Aden", Some(Restriction::Babalmandab)),
    ("Gulf of Aden", "Arabian Sea", None),
    ("Arabian Sea", "Gulf of Oman", None),
    ("Gulf of Oman", "Strait of Hormuz", Some(Restriction::Ormuz)),
    ("Strait of Hormuz", "Persian Gulf", None),
    ("Arabian Sea", "Sri Lanka South", None),
    ("Cape of Good Hope", "Southwest Indian Ocean", None),
    ("Southwest Indian Ocean", "Arabian Sea", None),
    ("Southwest Indian Ocean", "Central Indian Ocean", None),
    ("Central Indian Ocean", "Sri Lanka South", None),
    ("Central Indian Ocean", "Eastern Indian Ocean", None),
    ("Central Indian Ocean", "Malacca North", None),
    ("Sri Lanka South", "Malacca North", None),
    ("Malacca North", "Singapore Strait", Some(Restriction::Malacca)),
    ("Eastern Indian Ocean", "Sunda West", None),
    ("Sunda West", "Java Sea", Some(Restriction::Sunda)),
    ("Eastern Indian Ocean", "Lombok Strait", None),
    ("Lombok Strait", "Makassar Strait", None),
    ("Makassar Strait", "Celebes Sea", None),
    ("Celebes Sea", "Philippine Sea", None),
    ("Singapore Strait", "Java Sea", None),
    ("Singapore Strait", "South China Sea", None),
    ("Singapore Strait", "Gulf of Thailand", None),
    ("Gulf of Thailand", "South China Sea", None),
    ("Java Sea", "South China Sea", None),
    ("South China Sea", "Luzon West", None),
    ("South China Sea", "Luzon Strait", None),
    ("Luzon West", "Luzon Strait", None),
    ("Luzon Strait", "East China Sea", None),
    ("Luzon Strait", "Philippine Sea", None),
    ("East China Sea", "Yellow Sea", None),
    ("East China Sea", "Tokyo Approaches", None),
    ("Barents Sea", "Kara Sea", Some(Restriction::Northeast)),
    ("Kara Sea", "East Siberian Sea", Some(Restriction::Northeast)),
    ("East Siberian Sea", "Chukchi Sea", Some(Restriction::Northeast)),
    ("Baffin Bay", "Beaufort Sea", Some(Restriction::Northwest)),
    ("Beaufort Sea", "Chukchi Sea", Some(Restriction::Northwest)),
    ("Chukchi Sea", "Bering Sea", Some(Restriction::Bering)),
    ("Bering Sea", "North Pacific", None),
];

impl SeaLaneNetwork {
    /// The bundled global network.
    pub fn standard() -> Result<Self, NetworkError> {
        Self::from_tables(WAYPOINTS, LANES)
    }

    pub fn from_tables(
        waypoints: &[(&str, f64, f64)],
        lanes: &[(&str, &str, Option<Restriction>)],
    ) -> Result<Self, NetworkError> {
        let mut index = HashMap::with_capacity(waypoints.len());
        let mut nodes = Vec::with_capacity(waypoints.len());
        for (i, &(name, lon, lat)) in waypoints.iter().enumerate() {
            let coordinates = Coordinates::new(lon, lat);
            if !coordinates.is_valid() {
                return Err(NetworkError::InvalidWaypoint(name.to_string()));
            }
            if index.insert(name, i).is_some() {
                return Err(NetworkError::DuplicateWaypoint(name.to_string()));
            }
            nodes.push(Waypoint {
                name: name.to_string(),
                coordinates,
            });
        }

        let mut adjacency = vec![Vec::new(); nodes.len()];
        for &(from, to, passage) in lanes {
            let a = *index
                .get(from)
                .ok_or_else(|| NetworkError::UnknownWaypoint(from.to_string()))?;
            let b = *index
                .get(to)
                .ok_or_else(|| NetworkError::UnknownWaypoint(to.to_string()))?;
            let meters = to_meters(great_circle_km(nodes[a].coordinates, nodes[b].coordinates));
            adjacency[a].push(Lane { to: b, meters, passage });
            adjacency[b].push(Lane { to: a, meters, passage });
        }

        Ok(Self {
            waypoints: nodes,
            lanes: adjacency,
        })
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Nearest waypoints to `point` with their access cost in meters.
    fn attachments(&self, point: Coordinates) -> Vec<(usize, u64)> {
        let mut ranked: Vec<(usize, u64)> = self
            .waypoints
            .iter()
            .enumerate()
            .map(|(i, wp)| (i, to_meters(great_circle_km(point, wp.coordinates))))
            .collect();
        ranked.sort_by_key(|&(i, meters)| (meters, i));
        ranked.truncate(ATTACHMENT_FANOUT);
        ranked
    }

    /// Shortest open path, as (geometry, length in meters).
    pub fn shortest_path(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        restrictions: &RestrictionSet,
    ) -> Option<(Vec<Coordinates>, u64)> {
        let entry = self.attachments(origin);
        let exit: HashMap<usize, u64> = self.attachments(destination).into_iter().collect();

        let successors = |node: &Node| -> Vec<(Node, u64)> {
            match *node {
                Node::Start => entry.iter().map(|&(i, m)| (Node::Waypoint(i), m)).collect(),
                Node::Waypoint(i) => {
                    let mut next: Vec<(Node, u64)> = self.lanes[i]
                        .iter()
                        .filter(|lane| lane.passage.map_or(true, |p| !restrictions.contains(p)))
                        .map(|lane| (Node::Waypoint(lane.to), lane.meters))
                        .collect();
                    if let Some(&m) = exit.get(&i) {
                        next.push((Node::Goal, m));
                    }
                    next
                }
                Node::Goal => Vec::new(),
            }
        };

        let (nodes, meters) = dijkstra(&Node::Start, successors, |node| *node == Node::Goal)?;
        let geometry = nodes
            .iter()
            .map(|node| match *node {
                Node::Start => origin,
                Node::Waypoint(i) => self.waypoints[i].coordinates,
                Node::Goal => destination,
            })
            .collect();
        Some((geometry, meters))
    }
}

impl GeometrySolver for SeaLaneNetwork {
    fn solve(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        restrictions: &RestrictionSet,
    ) -> Result<Option<SolverPath>, GeometryError> {
        if !origin.is_valid() || !destination.is_valid() {
            return Err(GeometryError::Rejected(format!(
                "coordinates out of range: {origin} -> {destination}"
            )));
        }

        let answer = self
            .shortest_path(origin, destination, restrictions)
            .map(|(geometry, meters)| SolverPath {
                geometry,
                length_km: Some(meters as f64 / 1000.0),
            });
        trace!(%origin, %destination, found = answer.is_some(), "sea lane search");
        Ok(answer)
    }
}

fn to_meters(km: f64) -> u64 {
    (km * 1000.0).round() as u64
}
