// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Geodetic (lat, lon, elevation) <-> Earth-Centered, Earth-Fixed (ECEF)
//! conversions on the WGS-84 ellipsoid.

use crate::constants::{WGS84_A, WGS84_E2};

/// A position in Earth-Centered, Earth-Fixed Cartesian coordinates \[m\].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ecef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Ecef {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

/// Convert geodetic (latitude, longitude in degrees, elevation in metres)
/// into ECEF metres, using the WGS-84 reference ellipsoid.
pub fn geodetic_to_ecef(lat_deg: f64, lon_deg: f64, el_m: f64) -> Ecef {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    let (s_lat, c_lat) = lat.sin_cos();
    let (s_lon, c_lon) = lon.sin_cos();

    let n = WGS84_A / (1.0 - WGS84_E2 * s_lat * s_lat).sqrt();

    Ecef {
        x: (n + el_m) * c_lat * c_lon,
        y: (n + el_m) * c_lat * s_lon,
        z: (n * (1.0 - WGS84_E2) + el_m) * s_lat,
    }
}

/// Convert ECEF metres back into geodetic (latitude, longitude in degrees,
/// elevation in metres), using Bowring's iterative method.
pub fn ecef_to_geodetic(ecef: Ecef) -> (f64, f64, f64) {
    let Ecef { x, y, z } = ecef;
    let lon = y.atan2(x);

    let p = (x * x + y * y).sqrt();
    // Initial guess assuming a sphere, then iterate to convergence.
    let mut lat = (z / (p * (1.0 - WGS84_E2))).atan();
    for _ in 0..8 {
        let s_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * s_lat * s_lat).sqrt();
        let el = p / lat.cos() - n;
        lat = (z / p / (1.0 - WGS84_E2 * n / (n + el))).atan();
    }

    let s_lat = lat.sin();
    let n = WGS84_A / (1.0 - WGS84_E2 * s_lat * s_lat).sqrt();
    let el = p / lat.cos() - n;

    (lat.to_degrees(), lon.to_degrees(), el)
}
