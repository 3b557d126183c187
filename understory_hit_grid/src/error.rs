// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for operations that decline their input.
//!
//! None of these leave partial state behind: an operation that returns an
//! error has not modified the grid.

use thiserror::Error;

/// Why a grid operation declined.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    /// A grid was composed into itself.
    #[error("a grid cannot be composed into itself")]
    SelfComposition,

    /// The grid to compose has no owning widget.
    #[error("only grids with an owner can be composed")]
    MissingOwner,

    /// The grids cover different areas.
    #[error("composed grids must share the same area")]
    AreaMismatch,

    /// Composition would make a grid reachable from itself, or reachable twice.
    #[error("composition would create a cycle or a duplicate path")]
    Cycle,

    /// A grid id no longer refers to a live grid.
    #[error("unknown or removed grid")]
    UnknownGrid,

    /// The widget has no record in the grid.
    #[error("widget is not registered in this grid")]
    UnknownWidget,

    /// A mask bitmap does not match its declared dimensions.
    #[error("mask data has {actual} bytes, expected {expected}")]
    MaskSize {
        /// Bytes required by the dimensions.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
}
