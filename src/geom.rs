//! Planar geometry primitives.
//!
//! Geometries serialize in GeoJSON shape (`{"type": "Point", "coordinates":
//! [x, y]}`) so loaders and the boundary layer exchange them directly.
//! Coordinates are planar; the only supported coordinate reference systems
//! are EPSG:4326 and EPSG:3857 (spherical Web Mercator).

use crate::error::{invalid_argument, EngineResult};
use serde::{Deserialize, Serialize};

/// Segments used to approximate a circular arc.
const CIRCLE_SEGMENTS: usize = 32;

/// Spherical earth radius in metres, as used by Web Mercator.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude limit beyond which Web Mercator is undefined.
const MAX_MERCATOR_LAT: f64 = 85.05112878;

/// A planar vector geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point([f64; 2]),
    LineString(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
}

/// Coarse classification used in table summaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Point,
    Line,
    Area,
}

/// Axis-aligned bounding rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) => GeometryKind::Point,
            Geometry::LineString(_) => GeometryKind::Line,
            Geometry::Polygon(_) => GeometryKind::Area,
        }
    }

    fn coordinates(&self) -> Vec<[f64; 2]> {
        match self {
            Geometry::Point(p) => vec![*p],
            Geometry::LineString(pts) => pts.clone(),
            Geometry::Polygon(rings) => rings.iter().flatten().copied().collect(),
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let coords = self.coordinates();
        let first = coords.first()?;
        let mut bbox = BoundingBox {
            min_x: first[0],
            min_y: first[1],
            max_x: first[0],
            max_y: first[1],
        };
        for [x, y] in &coords[1..] {
            bbox.min_x = bbox.min_x.min(*x);
            bbox.min_y = bbox.min_y.min(*y);
            bbox.max_x = bbox.max_x.max(*x);
            bbox.max_y = bbox.max_y.max(*y);
        }
        Some(bbox)
    }

    /// Planar buffer of `distance` map units.
    ///
    /// A point buffers to a closed circle ring. Lines and polygons take the
    /// convex hull of per-vertex discs; concave inputs are over-covered.
    pub fn buffer(&self, distance: f64) -> EngineResult<Geometry> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(invalid_argument(format!(
                "buffer distance must be a non-negative number, got {distance}"
            )));
        }
        if distance == 0.0 {
            return Ok(self.clone());
        }
        match self {
            Geometry::Point(p) => Ok(Geometry::Polygon(vec![circle_ring(*p, distance)])),
            _ => {
                let mut cloud = Vec::new();
                for vertex in self.coordinates() {
                    cloud.extend(circle_ring(vertex, distance));
                }
                Ok(Geometry::Polygon(vec![convex_hull(cloud)]))
            }
        }
    }
}

/// Closed ring approximating a circle around `center`.
fn circle_ring(center: [f64; 2], radius: f64) -> Vec<[f64; 2]> {
    let mut ring = Vec::with_capacity(CIRCLE_SEGMENTS + 1);
    for i in 0..CIRCLE_SEGMENTS {
        let theta = std::f64::consts::TAU * (i as f64) / (CIRCLE_SEGMENTS as f64);
        ring.push([
            center[0] + radius * theta.cos(),
            center[1] + radius * theta.sin(),
        ]);
    }
    ring.push(ring[0]);
    ring
}

/// Andrew monotone chain; returns a closed counter-clockwise ring.
fn convex_hull(mut points: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    points.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    points.dedup();

    let cross = |o: [f64; 2], a: [f64; 2], b: [f64; 2]| {
        (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
    };

    if points.len() < 3 {
        let mut ring = points.clone();
        if let Some(first) = points.first() {
            ring.push(*first);
        }
        return ring;
    }

    let mut lower: Vec<[f64; 2]> = Vec::with_capacity(points.len());
    for &p in &points {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<[f64; 2]> = Vec::with_capacity(points.len());
    for &p in points.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    // Each chain ends where the other begins; drop the duplicates and close.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    let first = lower[0];
    lower.push(first);
    lower
}

fn normalize_crs(crs: &str) -> String {
    crs.trim().to_ascii_uppercase()
}

/// Reprojects one coordinate between the supported reference systems.
pub fn reproject_coordinate(coord: [f64; 2], from: &str, to: &str) -> EngineResult<[f64; 2]> {
    let (from, to) = (normalize_crs(from), normalize_crs(to));
    if from == to {
        return Ok(coord);
    }
    match (from.as_str(), to.as_str()) {
        ("EPSG:4326", "EPSG:3857") => {
            let [lon, lat] = coord;
            if lat.abs() > MAX_MERCATOR_LAT {
                return Err(invalid_argument(format!(
                    "latitude {lat} is outside the Web Mercator domain"
                )));
            }
            let x = EARTH_RADIUS_M * lon.to_radians();
            let y = EARTH_RADIUS_M
                * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0)
                    .tan()
                    .ln();
            Ok([x, y])
        }
        ("EPSG:3857", "EPSG:4326") => {
            let [x, y] = coord;
            let lon = (x / EARTH_RADIUS_M).to_degrees();
            let lat =
                (2.0 * (y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
            Ok([lon, lat])
        }
        _ => Err(invalid_argument(format!(
            "reprojection from {from} to {to} is not supported"
        ))),
    }
}

/// Reprojects every coordinate of a geometry.
pub fn reproject(geometry: &Geometry, from: &str, to: &str) -> EngineResult<Geometry> {
    let map_pts = |pts: &[[f64; 2]]| -> EngineResult<Vec<[f64; 2]>> {
        pts.iter()
            .map(|c| reproject_coordinate(*c, from, to))
            .collect()
    };
    match geometry {
        Geometry::Point(p) => Ok(Geometry::Point(reproject_coordinate(*p, from, to)?)),
        Geometry::LineString(pts) => Ok(Geometry::LineString(map_pts(pts)?)),
        Geometry::Polygon(rings) => Ok(Geometry::Polygon(
            rings
                .iter()
                .map(|r| map_pts(r))
                .collect::<EngineResult<Vec<_>>>()?,
        )),
    }
}
