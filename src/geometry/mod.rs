//! Cluster geometry for phrase scatter plots.
//!
//! Pure functions over a result's `phrase_clusters`: group points by cluster,
//! outline each group with its convex hull, and compute padded axis ranges
//! shared by the whole plot.

mod bounds;
mod hull;

pub use bounds::{axis_bounds, AxisBounds};
pub use hull::convex_hull;

use crate::model::{ClusterId, PhrasePoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl From<&PhrasePoint> for Point {
    fn from(p: &PhrasePoint) -> Self {
        Point { x: p.x, y: p.y }
    }
}

/// How a cluster boundary should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HullKind {
    /// No boundary: a single point, identical points, or noise.
    None,
    /// Two distinct extremes, drawn as a dashed segment.
    Segment,
    /// Closed polygon, first vertex repeated at the end.
    Polygon,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterShape {
    /// Members in input order.
    pub points: Vec<PhrasePoint>,
    pub hull: Vec<Point>,
    pub kind: HullKind,
}

impl ClusterShape {
    fn from_members(id: ClusterId, points: Vec<PhrasePoint>) -> Self {
        if id.is_noise() {
            return Self {
                points,
                hull: Vec::new(),
                kind: HullKind::None,
            };
        }

        let coords: Vec<Point> = points.iter().map(Point::from).collect();
        let (hull, kind) = match coords.len() {
            0 | 1 => (Vec::new(), HullKind::None),
            // A zero-length segment has nothing to draw.
            2 if coords[0] == coords[1] => (coords, HullKind::None),
            2 => (coords, HullKind::Segment),
            _ => {
                let mut hull = convex_hull(&coords);
                match hull.len() {
                    0 | 1 => (Vec::new(), HullKind::None),
                    2 => (hull, HullKind::Segment),
                    _ => {
                        hull.push(hull[0]);
                        (hull, HullKind::Polygon)
                    }
                }
            }
        };

        Self { points, hull, kind }
    }
}

/// Render-ready geometry for one analysis result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterGeometry {
    pub clusters: BTreeMap<ClusterId, ClusterShape>,
    pub bounds: Option<AxisBounds>,
}

impl ClusterGeometry {
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.clusters.values().map(|c| c.points.len()).sum()
    }
}

/// Partition points by cluster id, keeping input order within each group.
/// Points with non-finite coordinates are skipped.
pub fn group_by_cluster(points: &[PhrasePoint]) -> BTreeMap<ClusterId, Vec<PhrasePoint>> {
    let mut groups: BTreeMap<ClusterId, Vec<PhrasePoint>> = BTreeMap::new();
    for p in points.iter().filter(|p| p.x.is_finite() && p.y.is_finite()) {
        groups.entry(p.cluster).or_default().push(p.clone());
    }
    groups
}

/// Group, outline and bound a result's phrase points.
pub fn compute_geometry(points: &[PhrasePoint]) -> ClusterGeometry {
    let clusters = group_by_cluster(points)
        .into_iter()
        .map(|(id, members)| (id, ClusterShape::from_members(id, members)))
        .collect();
    let bounds = axis_bounds(points.iter().map(|p| (p.x, p.y)));
    ClusterGeometry { clusters, bounds }
}
