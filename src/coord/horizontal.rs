// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! RA/Dec <-> Alt/Az (topocentric horizontal) transforms.

use super::normalize_positive;

/// Given an apparent local sidereal time `lst_hours`, a target `(ra, dec)`
/// \[radians\] and an observer's `(lat, lon)` \[radians\], return `(alt, az)`
/// \[radians\].
///
/// `az` is normalized to `[0, 2*pi)`; `alt` is left unclamped so callers can
/// detect below-horizon targets: out-of-range elevations are clamped before
/// projection but flagged in diagnostics by the caller.
pub fn alt_az_from_ra_dec(lst_hours: f64, ra: f64, dec: f64, lat: f64, _lon: f64) -> (f64, f64) {
    let lst_rad = lst_hours * std::f64::consts::PI / 12.0;
    let ha = lst_rad - ra;

    let (s_ha, c_ha) = ha.sin_cos();
    let (s_dec, c_dec) = dec.sin_cos();
    let (s_lat, c_lat) = lat.sin_cos();

    let sin_alt = s_dec * s_lat + c_dec * c_lat * c_ha;
    let alt = sin_alt.clamp(-1.0, 1.0).asin();

    let cos_az_numerator = s_dec - sin_alt * s_lat;
    let cos_az_denominator = alt.cos() * c_lat;
    let az = if cos_az_denominator.abs() < 1e-12 {
        0.0
    } else {
        let cos_az = (cos_az_numerator / cos_az_denominator).clamp(-1.0, 1.0);
        if s_ha > 0.0 {
            std::f64::consts::TAU - cos_az.acos()
        } else {
            cos_az.acos()
        }
    };

    (alt, normalize_positive(az))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn target_at_zenith_has_maximal_altitude() {
        // Observer on the equator, target's hour angle zero, dec == lat.
        let lat = 0.0_f64;
        let dec = 0.0_f64;
        let lst_hours = 0.0;
        let ra = 0.0;
        let (alt, _az) = alt_az_from_ra_dec(lst_hours, ra, dec, lat, 0.0);
        assert_abs_diff_eq!(alt, std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn az_is_normalized() {
        for lst in [0.0, 6.0, 12.0, 18.0, 23.999] {
            let (_alt, az) = alt_az_from_ra_dec(lst, 1.0, 0.3, 0.9, 0.0);
            assert!((0.0..std::f64::consts::TAU).contains(&az));
        }
    }
}
