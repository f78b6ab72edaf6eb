// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Decode a raw sample buffer into the canonical real sample type.
//!
//! `bitspersample` is signed: a positive value selects an integer width, a
//! negative value selects an IEEE-754 float width. Widths outside
//! `{±8, ±16, ±32, ±64}` are rejected outright rather than silently ignored.
//!
//! Positive widths decode as *unsigned* integers: the only place a bit
//! width like this ever gets interpreted as a concrete C type is through
//! casts to `unsigned char`/`unsigned short int`/`unsigned int`/`unsigned
//! long int` — there is no signed-integer reading to preserve here, even
//! though "signed/unsigned" is sometimes used loosely to describe these
//! widths.

use byteorder::{ByteOrder, LittleEndian};

use crate::constants::SUPPORTED_SAMPLE_WIDTHS;
use crate::error::{Result, VlbiError};

/// Decode `raw` (little-endian) into `f64` samples according to
/// `bitspersample`.
pub fn decode_raw(raw: &[u8], bitspersample: i32) -> Result<Vec<f64>> {
    let width = bitspersample.unsigned_abs() as i32;
    if !SUPPORTED_SAMPLE_WIDTHS.contains(&width) {
        return Err(VlbiError::InvalidInput(format!(
            "unsupported bitspersample {bitspersample}"
        )));
    }
    let is_float = bitspersample < 0;
    let byte_width = (width / 8) as usize;
    if byte_width == 0 || raw.len() % byte_width != 0 {
        return Err(VlbiError::InvalidInput(format!(
            "raw buffer length {} is not a multiple of the sample width {byte_width}",
            raw.len()
        )));
    }

    let n = raw.len() / byte_width;
    let mut out = Vec::with_capacity(n);
    for chunk in raw.chunks_exact(byte_width) {
        let value = if is_float {
            match width {
                32 => LittleEndian::read_f32(chunk) as f64,
                64 => LittleEndian::read_f64(chunk),
                _ => unreachable!("validated above"),
            }
        } else {
            match width {
                8 => chunk[0] as f64,
                16 => LittleEndian::read_u16(chunk) as f64,
                32 => LittleEndian::read_u32(chunk) as f64,
                64 => LittleEndian::read_u64(chunk) as f64,
                _ => unreachable!("validated above"),
            }
        };
        out.push(value);
    }
    Ok(out)
}
