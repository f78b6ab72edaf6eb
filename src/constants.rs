// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All constants *must* be double precision. `vlbi-core` should do as many
calculations as possible in double precision before converting to a lower
precision, if it is ever required.
 */

pub use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Speed of light \[m/s\].
pub const VEL_C: f64 = 299_792_458.0;

/// WGS-84 semi-major axis \[m\].
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS-84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS-84 first eccentricity squared, derived from `WGS84_F`.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Supported magnitudes of `bitspersample`; the sign selects integer
/// (positive) vs IEEE-754 float (negative). Unsupported widths are rejected
/// outright rather than silently ignored.
pub const SUPPORTED_SAMPLE_WIDTHS: [i32; 4] = [8, 16, 32, 64];
