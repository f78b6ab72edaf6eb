// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Single-pole IIR filters over a sample stream.
//!
//! No DSP crate is in the dependency stack to delegate to, so a minimal
//! single-pole implementation is written out here, following the same
//! "register the result under a new name, leave the source untouched"
//! contract as the rest of `node_registry`.

use crate::error::{Result, VlbiError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum FilterKind {
    Lowpass,
    Highpass,
    Bandpass,
    Bandreject,
}

fn one_pole_lowpass(samples: &[f64], cutoff_rad: f64) -> Vec<f64> {
    // Cutoff is a normalized angular frequency in [0, pi]; the pole position
    // follows the standard exponential-smoothing derivation.
    let alpha = 1.0 - (-cutoff_rad).exp();
    let mut out = Vec::with_capacity(samples.len());
    let mut y_prev = 0.0;
    for &x in samples {
        y_prev += alpha * (x - y_prev);
        out.push(y_prev);
    }
    out
}

fn one_pole_highpass(samples: &[f64], cutoff_rad: f64) -> Vec<f64> {
    let low = one_pole_lowpass(samples, cutoff_rad);
    samples.iter().zip(low).map(|(&x, l)| x - l).collect()
}

/// Validate that a cutoff is a finite angular frequency in `(0, pi]`.
fn validate_cutoff(cutoff_rad: f64) -> Result<()> {
    if !cutoff_rad.is_finite() || cutoff_rad <= 0.0 || cutoff_rad > std::f64::consts::PI {
        return Err(VlbiError::InvalidInput(format!(
            "cutoff {cutoff_rad} radians is out of range (0, pi]"
        )));
    }
    Ok(())
}

/// Apply `kind` to `samples`. `cutoff_rad` is the (low) cutoff for all
/// kinds; `cutoff_rad_hi` is required (and must exceed `cutoff_rad`) for
/// `Bandpass`/`Bandreject`.
pub fn apply(
    kind: FilterKind,
    samples: &[f64],
    cutoff_rad: f64,
    cutoff_rad_hi: Option<f64>,
) -> Result<Vec<f64>> {
    validate_cutoff(cutoff_rad)?;
    match kind {
        FilterKind::Lowpass => Ok(one_pole_lowpass(samples, cutoff_rad)),
        FilterKind::Highpass => Ok(one_pole_highpass(samples, cutoff_rad)),
        FilterKind::Bandpass | FilterKind::Bandreject => {
            let hi = cutoff_rad_hi.ok_or_else(|| {
                VlbiError::InvalidInput(format!("{kind} requires a high cutoff"))
            })?;
            validate_cutoff(hi)?;
            if hi <= cutoff_rad {
                return Err(VlbiError::InvalidInput(format!(
                    "{kind} high cutoff {hi} must exceed low cutoff {cutoff_rad}"
                )));
            }
            // Bandpass: highpass at the low edge, then lowpass at the high
            // edge. Bandreject is the complement of that passband.
            let hp = one_pole_highpass(samples, cutoff_rad);
            let bp = one_pole_lowpass(&hp, hi);
            match kind {
                FilterKind::Bandpass => Ok(bp),
                FilterKind::Bandreject => {
                    Ok(samples.iter().zip(bp).map(|(&x, b)| x - b).collect())
                }
                _ => unreachable!(),
            }
        }
    }
}
