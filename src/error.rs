// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Error types.
//!
//! | Type | Raised by | Category |
//! |------|-----------|----------|
//! | [`Iso8601Error`] | [`JulianDate::from_iso8601`](crate::JulianDate::from_iso8601) | data format |
//! | [`EopError`] | Earth orientation loading | data format / transport |
//! | [`XysError`] | XYS chunk requests | data format / transport |
//! | [`FetchError`] | [`JsonFetcher`](crate::JsonFetcher) implementations | transport |
//! | [`FrameError`] | local-frame generator lookup | caller error |
//!
//! Data that simply has not arrived yet is never an error: the compute
//! functions return `None` and the caller polls again later.

use thiserror::Error;

use crate::frames::LocalAxis;

/// A string that is not a valid ISO 8601 date/time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid ISO 8601 date {input:?}: {reason}")]
pub struct Iso8601Error {
    /// The rejected input, verbatim.
    pub input: String,
    /// Which rule rejected it.
    pub reason: &'static str,
}

impl Iso8601Error {
    pub(crate) fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_owned(),
            reason,
        }
    }
}

/// Failure to retrieve a JSON resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to fetch {url}: {message}")]
pub struct FetchError {
    pub url: String,
    pub message: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Errors produced while installing Earth orientation data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EopError {
    #[error("Error in loaded EOP data: The columnNames property is required.")]
    MissingColumnNames,

    #[error("Error in loaded EOP data: The samples property is required.")]
    MissingSamples,

    #[error("Error in loaded EOP data: The columnNames property must include {missing:?}")]
    MissingColumns { missing: Vec<&'static str> },

    #[error("Error in loaded EOP data: {len} samples is not a multiple of the {stride} columns")]
    RaggedSamples { len: usize, stride: usize },

    #[error("Error in loaded EOP data: {0}")]
    Malformed(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Errors produced by XYS chunk requests.
///
/// `Clone` because one in-flight request is shared by every poller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum XysError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("XYS chunk {chunk} is malformed: {message}")]
    Malformed { chunk: usize, message: String },

    #[error("XYS chunk {chunk} has {len} values, which is not a whole number of (x, y, s) triples")]
    SampleCountMismatch { chunk: usize, len: usize },

    #[error("XYS chunk {chunk} holds {samples} samples but its range fits {capacity}")]
    TooManySamples {
        chunk: usize,
        samples: usize,
        capacity: usize,
    },

    #[error("XYS chunk {chunk} is outside the table of {count} chunks")]
    ChunkOutOfRange { chunk: usize, count: usize },

    #[error("could not schedule XYS chunk {chunk}: {message}")]
    Spawn { chunk: usize, message: String },
}

/// Errors produced by the local-frame machinery.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    #[error("{first:?} and {second:?} do not span a local frame; axes must be perpendicular")]
    InvalidAxisPair { first: LocalAxis, second: LocalAxis },
}
