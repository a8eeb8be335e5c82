//! Spherical geometry over WGS84-ish latitude/longitude pairs in degrees.

/// Mean earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Mean vectors shorter than this are treated as cancelled out.
const DEGENERATE_MAGNITUDE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryError {
    EmptyInput,
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::EmptyInput => write!(f, "no coordinates to compute from"),
        }
    }
}

impl std::error::Error for GeometryError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Proper spherical centroid
    High,
    /// Arithmetic mean fallback after the unit vectors cancelled out
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub latitude: f64,
    pub longitude: f64,
    pub confidence: Confidence,
}

/// Spherical centroid of `(lat, lon)` pairs.
///
/// Every point becomes a unit vector, the vectors are averaged and the mean
/// is projected back with `atan2`, so points either side of the antimeridian
/// average near ±180 instead of near 0. When the mean vector vanishes
/// (for example two antipodal points) there is no meaningful direction; the
/// arithmetic mean of the raw coordinates is returned instead, flagged
/// `Confidence::Low`.
pub fn centroid(coordinates: &[(f64, f64)]) -> Result<Centroid, GeometryError> {
    if coordinates.is_empty() {
        return Err(GeometryError::EmptyInput);
    }

    let n = coordinates.len() as f64;
    let (mut x, mut y, mut z) = (0.0_f64, 0.0_f64, 0.0_f64);
    for &(lat, lon) in coordinates {
        let (lat, lon) = (lat.to_radians(), lon.to_radians());
        x += lat.cos() * lon.cos();
        y += lat.cos() * lon.sin();
        z += lat.sin();
    }
    let (x, y, z) = (x / n, y / n, z / n);

    let magnitude = (x * x + y * y + z * z).sqrt();
    if magnitude < DEGENERATE_MAGNITUDE {
        let (lat_sum, lon_sum) = coordinates
            .iter()
            .fold((0.0, 0.0), |(la, lo), &(lat, lon)| (la + lat, lo + lon));
        return Ok(Centroid {
            latitude: lat_sum / n,
            longitude: lon_sum / n,
            confidence: Confidence::Low,
        });
    }

    let hyp = (x * x + y * y).sqrt();
    Ok(Centroid {
        latitude: z.atan2(hyp).to_degrees(),
        longitude: y.atan2(x).to_degrees(),
        confidence: Confidence::High,
    })
}

/// Great-circle distance in meters (haversine).
pub fn distance_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = (from.0.to_radians(), from.1.to_radians());
    let (lat2, lon2) = (to.0.to_radians(), to.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}
