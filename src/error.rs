// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type for all vlbi-core errors. This should be the *only* error enum
//! that is publicly visible.

use thiserror::Error;

/// The *only* publicly visible error from `vlbi-core`.
#[derive(Error, Debug)]
pub enum VlbiError {
    /// A name was already present in a registry (node, baseline or model).
    #[error("'{0}' is already in use")]
    DuplicateName(String),

    /// A name was looked up but isn't present in a registry.
    #[error("'{0}' is unknown")]
    UnknownName(String),

    /// Two models were combined but their shapes didn't match. Neither model
    /// is mutated when this is returned.
    #[error("dimension mismatch: {lhs:?} vs {rhs:?}")]
    DimensionMismatch {
        lhs: (usize, usize),
        rhs: (usize, usize),
    },

    /// The caller's interrupt flag was set; the returned grid is a partial
    /// result.
    #[error("computation was cancelled")]
    Cancelled,

    /// Malformed input that can't be acted on (e.g. an unsupported
    /// `bitspersample`).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The worker pool could not be created.
    #[error("resource exhaustion: {0}")]
    ResourceExhaustion(String),

    /// A generic, uncategorised error.
    #[error("{0}")]
    Generic(String),
}

impl From<std::io::Error> for VlbiError {
    fn from(e: std::io::Error) -> Self {
        Self::Generic(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VlbiError>;
