// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Time conversions: UTC <-> J2000 seconds, and apparent local sidereal time.

use hifitime::Epoch;

use crate::error::{Result, VlbiError};

/// Convert a `hifitime` UTC [`Epoch`] into J2000 seconds (seconds since
/// 2000-01-01 12:00:00 UTC).
pub fn utc_to_j2000(ts: Epoch) -> f64 {
    ts.as_tt_seconds() - Epoch::from_gregorian_utc(2000, 1, 1, 12, 0, 0, 0).as_tt_seconds()
}

/// Convert J2000 seconds back into a UTC [`Epoch`].
pub fn j2000_to_utc(t: f64) -> Epoch {
    Epoch::from_tt_seconds(Epoch::from_gregorian_utc(2000, 1, 1, 12, 0, 0, 0).as_tt_seconds() + t)
}

/// Parse an ISO-8601-ish `"YYYY-MM-DDThh:mm:ss.sss"` string into UTC seconds
/// since J2000.
pub fn string_to_utc(s: &str) -> Result<f64> {
    let epoch = Epoch::from_gregorian_str(s)
        .map_err(|e| VlbiError::InvalidInput(format!("bad timestamp '{s}': {e}")))?;
    Ok(utc_to_j2000(epoch))
}

/// Render J2000 seconds `t` back into the same `"YYYY-MM-DDThh:mm:ss.sss"`
/// shape `string_to_utc` accepts, truncated to millisecond precision (spec
/// §8 "utc_string -> j2000 -> utc_string reproduces the input truncated to
/// millisecond precision").
pub fn j2000_to_string(t: f64) -> String {
    let (y, mo, d, h, mi, s, ns) = j2000_to_utc(t).as_gregorian_utc();
    let ms = ns / 1_000_000;
    format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}.{ms:03}")
}

/// Apparent Greenwich Mean Sidereal Time for J2000 seconds `t`, in hours.
///
/// Uses the standard low-precision IAU 1982 GMST polynomial referenced to
/// J2000.0.
fn gmst_hours(t: f64) -> f64 {
    let d = t / 86400.0;
    let t_centuries = d / 36525.0;
    let gmst_deg = 280.460_618_37
        + 360.985_647_366_29 * d
        + 0.000_387_933 * t_centuries * t_centuries
        - t_centuries * t_centuries * t_centuries / 38_710_000.0;
    let wrapped = gmst_deg.rem_euclid(360.0);
    wrapped / 15.0
}

/// Apparent local sidereal time at longitude `lon_deg` (east-positive) for
/// J2000 seconds `t`, in hours, normalized to `[0, 24)`.
pub fn j2000_to_lst(t: f64, lon_deg: f64) -> f64 {
    let lst = gmst_hours(t) + lon_deg / 15.0;
    lst.rem_euclid(24.0)
}
