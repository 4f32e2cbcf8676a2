//! The astronomical model behind the day/night shading pipeline.
//!
//! Two independent formulations live here and are deliberately *not*
//! reconciled:
//!
//! * [`position`] is a low-precision ephemeris (good to roughly 0.2
//!   degrees against the NOAA solar calculator) producing the sun's
//!   azimuth and altitude for an observer. The realistic rendering
//!   mode consumes it.
//!
//! * [`stylized_direction`] is a much cruder day-of-year model that
//!   only knows the subsolar point. The toon-shaded rendering mode
//!   consumes it. Its output was tuned by eye for that mode, so
//!   "fixing" it to agree with the ephemeris would change the visuals.
//!
//! The formulas in [`position`] were obtained from
//!
//!	https://www.sciencedirect.com/science/article/pii/S0960148121004031

use chrono::{DateTime, Datelike, Timelike, Utc};
use glam::DVec3;
use serde_derive::Deserialize;

use crate::types::geo::Coordinate;

/// The sun's position as seen by an observer. All angles are in
/// radians; `altitude` is negative when the sun is below the horizon.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub azimuth: f64,
    pub altitude: f64,
    pub declination: f64,
    pub right_ascension: f64,
}

// The sun's geocentric state at an instant, in degrees. Observer
// independent; the observer transform happens in `position`.

struct Ephemeris {
    right_ascension: f64,
    declination: f64,
    subsolar_longitude: f64,
}

impl Ephemeris {
    fn at(time: &DateTime<Utc>) -> Self {
        // Time-of-day as fractional hours, 0.0 through 23.999.

        let gmtime: f64 = time.hour() as f64
            + ((time.minute() * 60 + time.second()) as f64 / 3600.0);

        // Days since the base date of the formulas (Jan 1st, 2000
        // UTC). The leap-year count is correct until 2100.

        let leap_days = ((time.year() - 2000) / 4 + 1) as f64;
        let n: f64 = leap_days
            + (time.year() - 2000) as f64 * 365.0
            + time.ordinal0() as f64
            + gmtime / 24.0
            - 1.5;

        // Mean longitude and mean anomaly of the sun.

        let l: f64 = (280.466 + 0.9856474 * n).rem_euclid(360.0);
        let g: f64 = (357.528 + 0.9856003 * n).rem_euclid(360.0).to_radians();

        // Ecliptic longitude, corrected for the elliptical orbit.

        let lambda: (f64, f64) =
            (l + 1.915 * f64::sin(g) + 0.020 * f64::sin(2.0 * g))
                .rem_euclid(360.0)
                .to_radians()
                .sin_cos();

        // Obliquity of the ecliptic.

        let epsilon: (f64, f64) = (23.440 - 0.0000004 * n).to_radians().sin_cos();

        let right_ascension: f64 = f64::atan2(epsilon.1 * lambda.0, lambda.1)
            .to_degrees()
            .rem_euclid(360.0);
        let declination: f64 = f64::asin(epsilon.0 * lambda.0).to_degrees();

        // The equation of time gives the longitude where the sun is
        // directly overhead at this instant.

        let eot: f64 = (l - right_ascension + 180.0).rem_euclid(360.0) - 180.0;

        Ephemeris {
            right_ascension,
            declination,
            subsolar_longitude: -15.0 * (gmtime - 12.0 + eot / 15.0),
        }
    }
}

/// Computes the sun's position for an observer at `coord`. Pure and
/// deterministic: the same inputs always produce the same outputs.

pub fn position(coord: Coordinate, time: &DateTime<Utc>) -> Position {
    let eph = Ephemeris::at(time);

    let sun_lat = eph.declination.to_radians().sin_cos();
    let lon_delta =
        (eph.subsolar_longitude - coord.longitude).to_radians().sin_cos();
    let obs_lat = coord.latitude.to_radians().sin_cos();

    // Rotate the subsolar unit vector into the observer's horizon
    // frame.

    let sx: f64 = sun_lat.1 * lon_delta.0;
    let sy: f64 = obs_lat.1 * sun_lat.0 - obs_lat.0 * sun_lat.1 * lon_delta.1;
    let sz: f64 = obs_lat.0 * sun_lat.0 + obs_lat.1 * sun_lat.1 * lon_delta.1;

    Position {
        azimuth: f64::atan2(-sx, -sy) + std::f64::consts::PI,
        altitude: f64::asin(sz.clamp(-1.0, 1.0)),
        declination: eph.declination.to_radians(),
        right_ascension: eph.right_ascension.to_radians(),
    }
}

/// `true` when the sun is above the horizon at `coord`.

pub fn is_daytime(coord: Coordinate, time: &DateTime<Utc>) -> bool {
    position(coord, time).altitude > 0.0
}

/// Normalized lighting intensity in `[0, 1]`: zero at or below the
/// horizon, one with the sun at zenith. Always `max(0, sin(altitude))`
/// of the computed position, never stored independently.

pub fn intensity(coord: Coordinate, time: &DateTime<Utc>) -> f64 {
    position(coord, time).altitude.sin().max(0.0)
}

/// Solar declination of the stylized model, in radians. `day_of_year`
/// is 1-based (Jan 1st is day 1).

pub fn stylized_declination(day_of_year: u32) -> f64 {
    (-23.45
        * (std::f64::consts::TAU * (day_of_year as f64 + 10.0) / 365.25).cos())
    .to_radians()
}

/// Unit vector pointing from the globe's center toward the sun, in
/// the renderer's frame, per the stylized day-of-year model. Only the
/// UTC time-of-day and the date matter; there is no observer.

pub fn stylized_direction(time: &DateTime<Utc>) -> DVec3 {
    let declination = stylized_declination(time.ordinal());

    let hours = time.hour() as f64 + time.minute() as f64 / 60.0;
    let hour_angle = ((hours - 12.0) * 15.0).to_radians();

    // The direction toward the sun, not its position, so the hour
    // angle flips sign.

    let sun_longitude = -hour_angle;

    DVec3::new(
        declination.cos() * sun_longitude.cos(),
        declination.sin(),
        declination.cos() * sun_longitude.sin(),
    )
    .normalize()
}

/// Selects which solar formulation drives the lighting.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Azimuth/altitude ephemeris; observer-dependent day/night.
    Realistic,
    /// Day-of-year subsolar model for the toon-shaded globe.
    Stylized,
}

/// The lighting inputs a rendering mode consumes.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub direction: DVec3,
    pub intensity: f64,
    pub is_day: bool,
}

/// The single entry point the scene layer uses; both formulations
/// stay independently testable pure functions behind it.

pub fn lighting(
    mode: Mode,
    coord: Coordinate,
    time: &DateTime<Utc>,
) -> Lighting {
    match mode {
        Mode::Realistic => {
            let pos = position(coord, time);

            Lighting {
                direction: direction_from_position(&pos),
                intensity: pos.altitude.sin().max(0.0),
                is_day: pos.altitude > 0.0,
            }
        }

        // The stylized model has no observer; the shader derives its
        // banding from the direction alone, so intensity is pegged at
        // full.
        Mode::Stylized => Lighting {
            direction: stylized_direction(time),
            intensity: 1.0,
            is_day: true,
        },
    }
}

/// Maps an azimuth/altitude position onto the renderer's unit sphere
/// (spherical coordinates with the polar angle measured from +Y).

pub fn direction_from_position(pos: &Position) -> DVec3 {
    let phi = std::f64::consts::FRAC_PI_2 - pos.altitude;
    let theta = pos.azimuth;

    DVec3::new(
        phi.sin() * theta.sin(),
        phi.cos(),
        phi.sin() * theta.cos(),
    )
}

/// Samples the day/night terminator as lat/lng points, every 2
/// degrees of longitude. Longitudes where the expression leaves the
/// domain of `asin` (near the poles of the terminator great circle)
/// are skipped.

pub fn terminator(time: &DateTime<Utc>) -> Vec<(f64, f64)> {
    let declination =
        position(Coordinate::new(0.0, 0.0), time).declination;
    let mut points = Vec::with_capacity(181);

    for lng in (-180..=180).step_by(2) {
        let lat = (declination.tan() * (lng as f64).to_radians().tan())
            .asin()
            .to_degrees();

        if lat.is_finite() && (-90.0..=90.0).contains(&lat) {
            points.push((lat, lng as f64));
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn close_enough(a: f64, b: f64, delta: f64) -> bool {
        (a - b).abs() <= delta
    }

    fn utc(
        yr: i32,
        mo: u32,
        da: u32,
        hr: u32,
        mn: u32,
        se: u32,
    ) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(yr, mo, da, hr, mn, se).single().unwrap()
    }

    struct Reference {
        time: (i32, u32, u32, u32),
        lat: f64,
        long: f64,
        elev: f64,
        az: f64,
        decl: f64,
    }

    #[test]
    fn test_against_noaa() {
        // Reference values were obtained from
        // https://gml.noaa.gov/grad/solcalc/ (degrees).

        const REFERENCE: &[Reference] = &[
            Reference {
                time: (2000, 1, 1, 12),
                lat: 45.0,
                long: 0.0,
                elev: 22.0,
                az: 179.18,
                decl: -23.03,
            },
            Reference {
                time: (2000, 1, 1, 12),
                lat: 0.0,
                long: 0.0,
                elev: 66.96,
                az: 178.06,
                decl: -23.03,
            },
            Reference {
                time: (2000, 1, 1, 12),
                lat: -45.0,
                long: 0.0,
                elev: 68.03,
                az: 2.03,
                decl: -23.03,
            },
            Reference {
                time: (2000, 1, 1, 18),
                lat: 45.0,
                long: -90.0,
                elev: 22.02,
                az: 179.15,
                decl: -23.01,
            },
            Reference {
                time: (2000, 1, 1, 6),
                lat: 0.0,
                long: 90.0,
                elev: 66.94,
                az: 178.13,
                decl: -23.05,
            },
            Reference {
                time: (2010, 7, 1, 10),
                lat: 45.0,
                long: 0.0,
                elev: 56.65,
                az: 120.65,
                decl: 23.1,
            },
            Reference {
                time: (2010, 7, 1, 14),
                lat: 0.0,
                long: 0.0,
                elev: 53.55,
                az: 311.29,
                decl: 23.09,
            },
            Reference {
                time: (2010, 7, 1, 14),
                lat: -45.0,
                long: 0.0,
                elev: 17.0,
                az: 332.18,
                decl: 23.09,
            },
        ];

        for data in REFERENCE {
            let (yr, mo, da, hr) = data.time;
            let time = utc(yr, mo, da, hr, 0, 0);
            let pos =
                position(Coordinate::new(data.lat, data.long), &time);

            assert!(
                close_enough(pos.altitude.to_degrees(), data.elev, 0.2),
                "altitude: {} <> {}",
                pos.altitude.to_degrees(),
                data.elev
            );
            assert!(
                close_enough(pos.azimuth.to_degrees(), data.az, 0.2),
                "azimuth: {} <> {}",
                pos.azimuth.to_degrees(),
                data.az
            );
            assert!(
                close_enough(pos.declination.to_degrees(), data.decl, 0.2),
                "declination: {} <> {}",
                pos.declination.to_degrees(),
                data.decl
            );
        }
    }

    #[test]
    fn test_determinism() {
        let time = utc(2024, 6, 1, 15, 30, 0);
        let coord = Coordinate::new(48.1351, 11.582);

        assert_eq!(position(coord, &time), position(coord, &time));
    }

    #[test]
    fn test_intensity_invariant() {
        // intensity == max(0, sin(altitude)) across a coarse grid of
        // places and times.

        for &(yr, mo, da, hr) in &[
            (2024, 1, 1, 0),
            (2024, 3, 20, 12),
            (2024, 6, 21, 18),
            (2024, 10, 5, 6),
        ] {
            for &lat in &[-60.0, -21.5, 0.0, 42.36, 75.0] {
                for &lng in &[-150.0, -71.06, 0.0, 105.85] {
                    let time = utc(yr, mo, da, hr, 0, 0);
                    let coord = Coordinate::new(lat, lng);
                    let pos = position(coord, &time);

                    assert_eq!(
                        intensity(coord, &time),
                        pos.altitude.sin().max(0.0)
                    );
                    assert_eq!(
                        is_daytime(coord, &time),
                        pos.altitude > 0.0
                    );
                }
            }
        }
    }

    #[test]
    fn test_equinox_noon() {
        // Near-equinox solar noon at the equator: the sun is close to
        // zenith and the intensity saturates.

        let time = utc(2024, 3, 20, 12, 0, 0);
        let coord = Coordinate::new(0.0, 0.0);
        let pos = position(coord, &time);

        assert!(
            close_enough(pos.altitude, std::f64::consts::FRAC_PI_2, 0.09),
            "altitude was {}",
            pos.altitude
        );
        assert!(intensity(coord, &time) > 0.99);
        assert!(is_daytime(coord, &time));
    }

    #[test]
    fn test_boston_predawn() {
        // Boston, 6:00 UTC on New Year's Day is 1:00 AM local: well
        // before sunrise.

        let time = utc(2024, 1, 1, 6, 0, 0);
        let coord = Coordinate::new(42.36, -71.06);

        assert!(position(coord, &time).altitude < 0.0);
        assert!(!is_daytime(coord, &time));
        assert_eq!(intensity(coord, &time), 0.0);
    }

    #[test]
    fn test_stylized_declination_reverses() {
        // Deep winter vs. near the summer solstice: the axial tilt
        // flips the declination's sign.

        let winter = stylized_declination(1);
        let summer = stylized_declination(182);

        assert!(winter < 0.0, "winter declination was {}", winter);
        assert!(summer > 0.0, "summer declination was {}", summer);

        // Magnitude never exceeds the axial tilt.

        for doy in 1..=366 {
            assert!(
                stylized_declination(doy).abs()
                    <= 23.45_f64.to_radians() + 1e-12
            );
        }
    }

    #[test]
    fn test_stylized_direction() {
        // Always a unit vector.

        for &(mo, da, hr) in
            &[(1, 1, 0), (3, 20, 12), (6, 21, 6), (12, 31, 23)]
        {
            let d = stylized_direction(&utc(2024, mo, da, hr, 0, 0));

            assert!(close_enough(d.length(), 1.0, 1e-12));
        }

        // At 12:00 UTC the hour angle is zero, so the direction lies
        // in the XY plane.

        let d = stylized_direction(&utc(2024, 3, 20, 12, 0, 0));

        assert!(close_enough(d.z, 0.0, 1e-12));
        assert!(d.x > 0.9);
    }

    #[test]
    fn test_lighting_modes() {
        let time = utc(2024, 3, 20, 12, 0, 0);
        let coord = Coordinate::new(0.0, 0.0);

        // Realistic mode agrees with the ephemeris.

        let lt = lighting(Mode::Realistic, coord, &time);
        let pos = position(coord, &time);

        assert_eq!(lt.intensity, pos.altitude.sin().max(0.0));
        assert_eq!(lt.is_day, pos.altitude > 0.0);
        assert!(close_enough(lt.direction.length(), 1.0, 1e-9));

        // With the sun near zenith the direction points near +Y.

        assert!(lt.direction.y > 0.99);

        // Stylized mode ignores the observer.

        let lt = lighting(
            Mode::Stylized,
            Coordinate::new(-45.0, 100.0),
            &time,
        );

        assert_eq!(lt, lighting(Mode::Stylized, coord, &time));
        assert!(lt.is_day);
    }

    #[test]
    fn test_terminator() {
        let points = terminator(&utc(2024, 1, 1, 12, 0, 0));

        assert!(!points.is_empty());

        for (lat, lng) in &points {
            assert!((-90.0..=90.0).contains(lat));
            assert!((-180.0..=180.0).contains(lng));
        }

        // The terminator passes through the equator where the
        // longitude term vanishes.

        let origin = points
            .iter()
            .find(|(_, lng)| *lng == 0.0)
            .expect("no sample at longitude 0");

        assert!(close_enough(origin.0, 0.0, 1e-9));
    }
}
