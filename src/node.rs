// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A single antenna/station: its location, sample stream, and metadata.

use crate::coord::geodetic::{ecef_to_geodetic, geodetic_to_ecef, Ecef};

/// A station location, remembering which frame it was originally supplied
/// in. The other frame is derived on demand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Location {
    Geodetic { lat_deg: f64, lon_deg: f64, el_m: f64 },
    Geocentric(Ecef),
}

impl Location {
    pub fn is_geographic(&self) -> bool {
        matches!(self, Location::Geodetic { .. })
    }

    /// This location as ECEF metres, deriving from geodetic if necessary.
    pub fn ecef(&self) -> Ecef {
        match *self {
            Location::Geodetic {
                lat_deg,
                lon_deg,
                el_m,
            } => geodetic_to_ecef(lat_deg, lon_deg, el_m),
            Location::Geocentric(ecef) => ecef,
        }
    }

    /// This location as (lat_deg, lon_deg, el_m), deriving from ECEF if
    /// necessary.
    pub fn geodetic(&self) -> (f64, f64, f64) {
        match *self {
            Location::Geodetic {
                lat_deg,
                lon_deg,
                el_m,
            } => (lat_deg, lon_deg, el_m),
            Location::Geocentric(ecef) => ecef_to_geodetic(ecef),
        }
    }
}

/// An ordered sequence of real samples plus the metadata needed to
/// correlate and project them.
#[derive(Clone, Debug)]
pub struct SampleStream {
    pub samples: Vec<f64>,
    /// J2000 seconds at which `samples[0]` was taken.
    pub start_time_utc: f64,
    /// Sample rate \[Hz\].
    pub sample_rate: f64,
    /// Observing wavelength \[m\].
    pub wavelength: f64,
    /// Per-sample location, for moving-baseline mode. When present, its
    /// length should match `samples.len()`.
    pub location_track: Option<Vec<Location>>,
    /// Target (RA, Dec) \[radians\], if this stream has its own pointing.
    pub target: Option<(f64, f64)>,
}

impl SampleStream {
    pub fn new(samples: Vec<f64>, start_time_utc: f64, sample_rate: f64, wavelength: f64) -> Self {
        Self {
            samples,
            start_time_utc,
            sample_rate,
            wavelength,
            location_track: None,
            target: None,
        }
    }

    pub fn end_time_utc(&self) -> f64 {
        if self.sample_rate <= 0.0 || self.samples.is_empty() {
            self.start_time_utc
        } else {
            self.start_time_utc + (self.samples.len() as f64) / self.sample_rate
        }
    }

    /// Sample the stream at time `t` (J2000 seconds) using linear
    /// interpolation between the two nearest samples. Returns `0.0` outside
    /// the stream's time range or for an empty stream. The interpolation
    /// choice is not contractual; callers should tolerate either
    /// nearest-neighbour or linear results.
    pub fn sample_at(&self, t: f64) -> f64 {
        if self.samples.is_empty() || self.sample_rate <= 0.0 {
            return 0.0;
        }
        let pos = (t - self.start_time_utc) * self.sample_rate;
        if pos < 0.0 || pos > (self.samples.len() - 1) as f64 {
            return 0.0;
        }
        let lo = pos.floor() as usize;
        let hi = (lo + 1).min(self.samples.len() - 1);
        let frac = pos - lo as f64;
        self.samples[lo] * (1.0 - frac) + self.samples[hi] * frac
    }

    /// The location to use for sample index `l` in moving-baseline mode,
    /// falling back to `static_location` when there's no track or the track
    /// is exhausted.
    pub fn location_at_step(&self, l: usize, static_location: Location) -> Location {
        match &self.location_track {
            Some(track) if !track.is_empty() => track[l.min(track.len() - 1)],
            _ => static_location,
        }
    }
}

/// One antenna/station.
#[derive(Clone, Debug)]
pub struct Node {
    /// Stable index assigned by the owning [`crate::registry::Registry`] at
    /// insertion time.
    pub index: usize,
    pub location: Location,
    pub stream: SampleStream,
}

impl Node {
    pub fn new(index: usize, location: Location, stream: SampleStream) -> Self {
        Self {
            index,
            location,
            stream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sample_at_linearly_interpolates() {
        let stream = SampleStream::new(vec![0.0, 10.0, 20.0], 0.0, 1.0, 1.0);
        assert_abs_diff_eq!(stream.sample_at(0.5), 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(stream.sample_at(1.5), 15.0, epsilon = 1e-9);
    }

    #[test]
    fn sample_at_outside_range_is_zero() {
        let stream = SampleStream::new(vec![1.0, 2.0, 3.0], 10.0, 1.0, 1.0);
        assert_eq!(stream.sample_at(0.0), 0.0);
        assert_eq!(stream.sample_at(100.0), 0.0);
    }

    #[test]
    fn empty_stream_never_panics() {
        let stream = SampleStream::new(vec![], 0.0, 1.0, 1.0);
        assert_eq!(stream.sample_at(0.0), 0.0);
        assert_eq!(stream.end_time_utc(), 0.0);
    }

    #[test]
    fn location_track_falls_back_to_static() {
        let stream = SampleStream::new(vec![1.0], 0.0, 1.0, 1.0);
        let fallback = Location::Geodetic {
            lat_deg: 1.0,
            lon_deg: 2.0,
            el_m: 3.0,
        };
        assert_eq!(stream.location_at_step(0, fallback), fallback);
    }
}
