//! Error types for POCKET+ compression/decompression.

use thiserror::Error;

/// Errors that can occur during POCKET+ compression or decompression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PocketError {
    /// Invalid packet size (must be > 0 and divisible by 8).
    #[error("invalid packet size: {0} (must be > 0 and divisible by 8)")]
    InvalidPacketSize(usize),

    /// Invalid robustness parameter (must be 0-7).
    #[error("invalid robustness: {0} (must be 0-7)")]
    InvalidRobustness(usize),

    /// Input data length doesn't match expected packet count.
    #[error("invalid input length: expected {expected}, got {actual}")]
    InvalidInputLength { expected: usize, actual: usize },

    /// Unexpected end of input during decompression.
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,

    /// Invalid compressed data format.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Buffer overflow during compression.
    #[error("buffer overflow")]
    BufferOverflow,

    /// Not enough bits remaining in input (underflow).
    #[error("not enough bits remaining in input")]
    Underflow,

    /// Invalid length parameter.
    #[error("invalid length parameter")]
    InvalidLength,

    /// Effective robustness Vt decoded from the wire exceeds 15.
    #[error("effective robustness {0} exceeds the maximum of 15")]
    InvalidRobustnessWindow(u8),

    /// A flag combination read from the bitstream is self-contradictory
    /// (e.g. ḋₜ = 1 together with an explicit send-mask bit).
    #[error("inconsistent flag combination in packet {packet}: {detail}")]
    UnexpectedFlagCombination { packet: usize, detail: String },
}
