//! Geographic types shared by the daemon and the location providers.

use glam::DVec3;
use serde_derive::{Deserialize, Serialize};

/// Mean radius of the Earth, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// An observer position on the globe, in degrees. Constructing one
/// through [`Coordinate::new`] clamps out-of-range values; a slightly
/// wrong observer still has to produce a renderable scene, so we
/// never reject a coordinate outright.

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude: latitude.clamp(-90.0, 90.0),
            longitude: longitude.clamp(-180.0, 180.0),
        }
    }
}

/// The result of resolving the observer's location. `was_fallback`
/// records whether the coordinate came from a real fix or from the
/// built-in default; runtime behavior is identical either way, but
/// callers (and tests) can tell the two apart.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub timezone: String,
    pub was_fallback: bool,
}

impl ResolvedLocation {
    /// The location used whenever a provider can't produce a real
    /// fix. Resolution fails open: downstream logic always receives a
    /// usable coordinate and the failure is surfaced only as a log
    /// warning.

    pub fn fallback() -> Self {
        ResolvedLocation {
            coordinate: Coordinate {
                latitude: 42.3601,
                longitude: -71.0589,
            },
            timezone: String::from("America/New_York"),
            was_fallback: true,
        }
    }
}

/// Converts a lat/lng pair to the renderer's Cartesian frame. The
/// globe model puts +Y through the north pole and seams the texture
/// at longitude -180, hence the angle offsets.

pub fn to_scene(latitude: f64, longitude: f64, radius: f64) -> DVec3 {
    let phi = (90.0 - latitude).to_radians();
    let theta = (longitude + 180.0).to_radians();

    DVec3::new(
        -radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// Great-circle distance between two coordinates, in kilometers
/// (haversine form).

pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lng / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Samples the great-circle path from `a` to `b` as `segments + 1`
/// lat/lng points, using spherical interpolation. Degenerate input
/// (coincident or antipodal endpoints) yields a two-point path since
/// the interpolation is undefined there.

pub fn great_circle_path(
    a: Coordinate,
    b: Coordinate,
    segments: usize,
) -> Vec<(f64, f64)> {
    let lat1 = a.latitude.to_radians();
    let lng1 = a.longitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let lng2 = b.longitude.to_radians();

    let d = 2.0
        * (((lat1 - lat2) / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * ((lng1 - lng2) / 2.0).sin().powi(2))
        .sqrt()
        .asin();

    if segments == 0 || d == 0.0 || d.sin() == 0.0 {
        return vec![
            (a.latitude, a.longitude),
            (b.latitude, b.longitude),
        ];
    }

    let mut path = Vec::with_capacity(segments + 1);

    for ii in 0..=segments {
        let f = ii as f64 / segments as f64;
        let ca = (((1.0 - f) * d).sin()) / d.sin();
        let cb = ((f * d).sin()) / d.sin();

        let x = ca * lat1.cos() * lng1.cos() + cb * lat2.cos() * lng2.cos();
        let y = ca * lat1.cos() * lng1.sin() + cb * lat2.cos() * lng2.sin();
        let z = ca * lat1.sin() + cb * lat2.sin();

        path.push((
            z.atan2((x * x + y * y).sqrt()).to_degrees(),
            y.atan2(x).to_degrees(),
        ));
    }
    path
}
