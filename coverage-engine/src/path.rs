//! §4.G Path tracker: an independent geodetic dead-reckoning trail, unrelated
//! to the raster engine proper but part of the same public surface (spec §6
//! "Path surface"). Distances are nautical miles, headings and stored
//! vertices are radians internally; the API boundary works entirely in
//! degrees, with heading expressed as a compass bearing.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use coverage_datatypes::{Point2D, Rectangle};

/// WGS84 semi-major axis, meters.
const WGS84_SEMI_MAJOR_AXIS_M: f64 = 6_378_137.0;
const R_EARTH_NM: f64 = WGS84_SEMI_MAJOR_AXIS_M / 1852.0;
/// Cap on how many extra vertex slots one `append` grows the buffer by
/// (spec §4.G: "amortized doubling capped at +512 entries per grow").
const MAX_GROWTH: usize = 512;

/// An axis-aligned integer bounding rectangle, outward-rounded from
/// [`Path::bounds_deg`] (spec §4.G `bounds_integer`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerRectangle {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

/// A mobile Mercator projection tangent to the globe at one point, used only
/// inside `move_forward`/`move_toward`/`relative_to_geographic` (spec §4.G
/// "Projection").
struct MobileMercator {
    a_k0: f64,
    meridian: f64,
    northing: f64,
}

impl MobileMercator {
    fn centered_at(lon_rad: f64, lat_rad: f64) -> Self {
        let a_k0 = lat_rad.cos() * R_EARTH_NM;
        let northing = -a_k0 * (std::f64::consts::FRAC_PI_4 + lat_rad / 2.0).tan().ln();
        Self {
            a_k0,
            meridian: lon_rad,
            northing,
        }
    }

    fn forward(&self, lon_rad: f64, lat_rad: f64) -> (f64, f64) {
        let x = self.a_k0 * (lon_rad - self.meridian);
        let y = self.a_k0 * (std::f64::consts::FRAC_PI_4 + lat_rad / 2.0).tan().ln() + self.northing;
        (x, y)
    }

    fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = x / self.a_k0 + self.meridian;
        let lat = std::f64::consts::FRAC_PI_2 - 2.0 * ((self.northing - y) / self.a_k0).exp().atan();
        (lon, lat)
    }
}

/// A dead-reckoning trail of geographic positions plus a current heading.
/// Vertices and heading are stored in radians; every public method works in
/// degrees (heading as a compass bearing, clockwise from true north).
#[derive(Debug, Clone)]
pub struct Path {
    /// `(lon_rad, lat_rad)`.
    vertices: Vec<(f64, f64)>,
    /// Arithmetic radians: standard trig convention, not a compass bearing.
    heading: f64,
    min: (f64, f64),
    max: (f64, f64),
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl Path {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            heading: 0.0,
            min: (f64::INFINITY, f64::INFINITY),
            max: (f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Creates a path already seeded with one position (spec §6 Path
    /// surface: `new(optional initial_lon_lat)`).
    pub fn with_initial(lon_deg: f64, lat_deg: f64) -> Self {
        let mut path = Self::new();
        path.append(lon_deg, lat_deg);
        path
    }

    fn grow_if_needed(&mut self) {
        if self.vertices.len() == self.vertices.capacity() {
            let additional = self.vertices.capacity().max(1).min(MAX_GROWTH);
            self.vertices.reserve_exact(additional);
        }
    }

    fn push_radians(&mut self, lon_rad: f64, lat_rad: f64) {
        self.grow_if_needed();
        self.vertices.push((lon_rad, lat_rad));
        self.min.0 = self.min.0.min(lon_rad);
        self.min.1 = self.min.1.min(lat_rad);
        self.max.0 = self.max.0.max(lon_rad);
        self.max.1 = self.max.1.max(lat_rad);
    }

    /// Pushes a point and expands the bounds; heading is unchanged.
    pub fn append(&mut self, lon_deg: f64, lat_deg: f64) {
        self.push_radians(lon_deg.to_radians(), lat_deg.to_radians());
    }

    pub fn position_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn position(&self, index: usize) -> Option<(f64, f64)> {
        self.vertices.get(index).map(|&(lon, lat)| (lon.to_degrees(), lat.to_degrees()))
    }

    pub fn current_position(&self) -> Option<(f64, f64)> {
        self.vertices.last().map(|&(lon, lat)| (lon.to_degrees(), lat.to_degrees()))
    }

    /// Converts the internal arithmetic-radians heading to a geographic
    /// compass bearing in degrees, `[0, 360)`.
    pub fn heading_deg(&self) -> f64 {
        (90.0 - self.heading.to_degrees()).rem_euclid(360.0)
    }

    /// Positive `delta_deg` turns clockwise.
    pub fn rotate(&mut self, delta_deg: f64) {
        self.heading -= delta_deg.to_radians();
    }

    /// Advances by `distance_nm` along the current heading using a mobile
    /// Mercator projection centered on the current position. No-op on an
    /// empty path.
    pub fn move_forward(&mut self, distance_nm: f64) {
        let Some(&(lon, lat)) = self.vertices.last() else {
            return;
        };
        let projection = MobileMercator::centered_at(lon, lat);
        let dx = distance_nm * self.heading.cos();
        let dy = distance_nm * self.heading.sin();
        let (new_lon, new_lat) = projection.inverse(dx, dy);
        self.push_radians(new_lon, new_lat);
    }

    /// Steers toward `(target_lon_deg, target_lat_deg)` by up to
    /// `distance_nm`. Returns `true` if the target was reached (and appended
    /// exactly), `false` if it appended an intermediate point short of it.
    ///
    /// # Panics
    ///
    /// Panics if the path is empty; a heading and a projection both require
    /// a current position.
    pub fn move_toward(&mut self, target_lon_deg: f64, target_lat_deg: f64, distance_nm: f64) -> bool {
        let &(lon, lat) = self.vertices.last().expect("move_toward requires a current position");
        let projection = MobileMercator::centered_at(lon, lat);
        let (dx, dy) = projection.forward(target_lon_deg.to_radians(), target_lat_deg.to_radians());

        let heading = dy.atan2(dx);
        if !heading.is_nan() {
            self.heading = heading;
        }

        let norm = (dx * dx + dy * dy).sqrt();
        let ratio = distance_nm / norm;
        if !ratio.is_finite() || ratio >= 1.0 {
            self.append(target_lon_deg, target_lat_deg);
            true
        } else {
            let (new_lon, new_lat) = projection.inverse(dx * ratio, dy * ratio);
            self.push_radians(new_lon, new_lat);
            false
        }
    }

    /// The axis-aligned bounds of every appended vertex, in degrees.
    /// `None` for an empty path.
    pub fn bounds_deg(&self) -> Option<Rectangle> {
        if self.vertices.is_empty() {
            return None;
        }
        Some(Rectangle::new(
            Point2D {
                x: self.min.0.to_degrees(),
                y: self.min.1.to_degrees(),
            },
            Point2D {
                x: self.max.0.to_degrees(),
                y: self.max.1.to_degrees(),
            },
        ))
    }

    /// [`Self::bounds_deg`] rounded outward to integer degrees.
    pub fn bounds_integer(&self) -> Option<IntegerRectangle> {
        self.bounds_deg().map(|rect| IntegerRectangle {
            min_x: rect.min().x.floor() as i64,
            min_y: rect.min().y.floor() as i64,
            max_x: rect.max().x.ceil() as i64,
            max_y: rect.max().y.ceil() as i64,
        })
    }

    /// Every vertex, in degrees, in append order.
    pub fn iterate(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.vertices.iter().map(|&(lon, lat)| (lon.to_degrees(), lat.to_degrees()))
    }

    /// Transforms a rectangle expressed in nautical miles relative to the
    /// current position through the mobile Mercator projection, returning
    /// the enclosing lon/lat rectangle in degrees. `None` on an empty path.
    pub fn relative_to_geographic(&self, rect_nm: Rectangle) -> Option<Rectangle> {
        let &(lon, lat) = self.vertices.last()?;
        let projection = MobileMercator::centered_at(lon, lat);
        let corners = [
            (rect_nm.min().x, rect_nm.min().y),
            (rect_nm.min().x, rect_nm.max().y),
            (rect_nm.max().x, rect_nm.min().y),
            (rect_nm.max().x, rect_nm.max().y),
        ];

        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            let (corner_lon, corner_lat) = projection.inverse(x, y);
            let (lon_deg, lat_deg) = (corner_lon.to_degrees(), corner_lat.to_degrees());
            min.0 = min.0.min(lon_deg);
            min.1 = min.1.min(lat_deg);
            max.0 = max.0.max(lon_deg);
            max.1 = max.1.max(lat_deg);
        }
        Some(Rectangle::new(
            Point2D { x: min.0, y: min.1 },
            Point2D { x: max.0, y: max.1 },
        ))
    }

    pub fn to_snapshot(&self) -> PathSnapshot {
        PathSnapshot {
            heading: self.heading,
            vertices: self.vertices.clone(),
        }
    }

    pub fn from_snapshot(snapshot: PathSnapshot) -> Self {
        let mut path = Self::new();
        path.heading = snapshot.heading;
        for (lon, lat) in snapshot.vertices {
            path.push_radians(lon, lat);
        }
        path
    }
}

impl PartialEq for Path {
    /// Bit-identical headings and bit-identical vertex sequences (spec
    /// §4.G "Equality/hash"), not floating-point equality.
    fn eq(&self, other: &Self) -> bool {
        self.heading.to_bits() == other.heading.to_bits()
            && self.vertices.len() == other.vertices.len()
            && self
                .vertices
                .iter()
                .zip(&other.vertices)
                .all(|(a, b)| a.0.to_bits() == b.0.to_bits() && a.1.to_bits() == b.1.to_bits())
    }
}

impl Eq for Path {}

impl Hash for Path {
    /// Length, heading, and a strided sample of vertex bits, not the full
    /// sequence (spec §4.G "Hash incorporates length and a strided sample").
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vertices.len().hash(state);
        self.heading.to_bits().hash(state);
        let stride = (self.vertices.len() / 16).max(1);
        for (lon, lat) in self.vertices.iter().step_by(stride) {
            lon.to_bits().hash(state);
            lat.to_bits().hash(state);
        }
    }
}

/// The vertex buffer trimmed to its valid length for persistence; on load,
/// the valid length is simply the deserialized buffer's length (spec §4.G
/// "Serialization").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSnapshot {
    heading: f64,
    vertices: Vec<(f64, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_initial_seeds_a_single_position() {
        let path = Path::with_initial(12.5, -4.0);
        assert_eq!(path.position_count(), 1);
        let (lon, lat) = path.current_position().unwrap();
        assert!((lon - 12.5).abs() < 1e-9);
        assert!((lat - (-4.0)).abs() < 1e-9);
    }

    #[test]
    fn append_expands_bounds_and_preserves_heading() {
        let mut path = Path::new();
        path.append(10.0, 20.0);
        path.append(-5.0, 30.0);
        let bounds = path.bounds_deg().unwrap();
        assert!((bounds.min().x - (-5.0)).abs() < 1e-9);
        assert!((bounds.max().x - 10.0).abs() < 1e-9);
        assert_eq!(path.heading_deg(), 90.0);
    }

    #[test]
    fn rotate_turns_clockwise() {
        let mut path = Path::new();
        path.append(0.0, 0.0);
        let before = path.heading_deg();
        path.rotate(10.0);
        let after = path.heading_deg();
        assert!((after - (before + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn move_forward_advances_along_heading() {
        let mut path = Path::new();
        path.append(0.0, 0.0);
        // Default heading is arithmetic 0 (due east, bearing 90).
        path.move_forward(60.0); // 60 nm ~ 1 degree of longitude at the equator
        let (lon, lat) = path.current_position().unwrap();
        assert!(lon > 0.5 && lon < 1.5);
        assert!(lat.abs() < 1e-6);
    }

    #[test]
    fn move_toward_reaches_target_in_one_step_when_close_enough() {
        let mut path = Path::new();
        path.append(0.0, 0.0);
        let reached = path.move_toward(1.0, 0.0, 1000.0);
        assert!(reached);
        let (lon, lat) = path.current_position().unwrap();
        assert!((lon - 1.0).abs() < 1e-6);
        assert!(lat.abs() < 1e-6);
    }

    #[test]
    fn move_toward_steps_partway_when_distance_is_short() {
        let mut path = Path::new();
        path.append(0.0, 0.0);
        let reached = path.move_toward(10.0, 0.0, 1.0);
        assert!(!reached);
        assert_eq!(path.position_count(), 2);
        let (lon, _) = path.current_position().unwrap();
        assert!(lon > 0.0 && lon < 10.0);
    }

    #[test]
    fn snapshot_round_trips() {
        let mut path = Path::new();
        path.append(1.0, 2.0);
        path.append(3.0, 4.0);
        path.rotate(15.0);
        let snapshot = path.to_snapshot();
        let restored = Path::from_snapshot(snapshot);
        assert_eq!(path, restored);
    }

    #[test]
    fn equality_is_bitwise_on_heading_and_vertices() {
        let mut a = Path::new();
        a.append(1.0, 1.0);
        let mut b = Path::new();
        b.append(1.0, 1.0);
        assert_eq!(a, b);
        b.rotate(1.0);
        assert_ne!(a, b);
    }
}
