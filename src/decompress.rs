//! POCKET+ decompression algorithm implementation.
//!
//! Implements CCSDS 124.0-B-1 decompression (inverse of Section 5.3):
//! - Decompressor initialization and state management
//! - Packet decompression and mask reconstruction
//! - Output packet decoding: parsing hₜ || qₜ || uₜ
//!
//! The decompressor never recomputes Xₜ/Vₜ itself — both are read
//! directly off the wire, since the compressor already made that
//! windowing decision. This is why `Decompressor` carries no change
//! history: it only ever applies the deltas it is given.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_lines)]

use log::{debug, warn};

use crate::bitreader::BitReader;
use crate::bitvector::BitVector;
use crate::decode::{bit_insert, count_decode, rle_decode};
use crate::error::PocketError;

/// POCKET+ decompressor state.
#[derive(Clone)]
pub struct Decompressor {
    /// Packet length in bits (F).
    f: usize,
    /// Robustness level (R), kept for diagnostics and API symmetry
    /// with `Compressor` — decode correctness never depends on it.
    robustness: u8,
    /// Current mask vector.
    mask: BitVector,
    /// Initial mask (for reset).
    initial_mask: BitVector,
    /// Previous output vector.
    prev_output: BitVector,
    /// Scratch vector recording which Xₜ positions were positive updates.
    xt: BitVector,
    /// Reusable extraction mask buffer.
    extraction_mask: BitVector,
    /// Current time step.
    t: usize,
}

impl Decompressor {
    /// Create a new decompressor.
    ///
    /// # Errors
    /// Returns [`PocketError::InvalidPacketSize`] if `f` is 0 or exceeds
    /// 65535, or [`PocketError::InvalidRobustness`] if `robustness` > 7.
    pub fn new(
        f: usize,
        initial_mask: Option<&BitVector>,
        robustness: u8,
    ) -> Result<Self, PocketError> {
        if f == 0 || f > 65535 {
            return Err(PocketError::InvalidPacketSize(f));
        }
        if robustness > 7 {
            return Err(PocketError::InvalidRobustness(robustness as usize));
        }

        let mask = initial_mask.cloned().unwrap_or_else(|| BitVector::new(f));
        let initial = mask.clone();

        let mut decomp = Self {
            f,
            robustness,
            mask,
            initial_mask: initial,
            prev_output: BitVector::new(f),
            xt: BitVector::new(f),
            extraction_mask: BitVector::new(f),
            t: 0,
        };

        decomp.reset();
        debug!("Decompressor::new f={f} robustness={robustness}");
        Ok(decomp)
    }

    /// Reset decompressor to initial state.
    pub fn reset(&mut self) {
        self.t = 0;
        self.mask.copy_from(&self.initial_mask);
        self.prev_output.zero();
        self.xt.zero();

        debug!("Decompressor::reset f={}", self.f);
    }

    /// Decompress a single packet.
    ///
    /// # Errors
    /// Returns [`PocketError::Underflow`] on premature end of stream,
    /// or other [`PocketError`] variants on malformed COUNT fields or
    /// inconsistent flag combinations.
    pub fn decompress_packet(&mut self, reader: &mut BitReader) -> Result<BitVector, PocketError> {
        let mut output = BitVector::new(self.f);

        // Copy previous output as prediction base.
        output.copy_from(&self.prev_output);

        // Clear positive-changes tracker.
        self.xt.zero();

        // ====================================================================
        // Parse hₜ: Mask change information
        // hₜ = RLE(Xₜ) || BIT₄(Vₜ) || eₜ || kₜ || cₜ || ḋₜ
        // ====================================================================

        let xt = rle_decode(reader, self.f).map_err(|e| self.parse_failure("Xt", e))?;

        let vt = reader
            .read_bits(4)
            .map_err(|e| self.parse_failure("Vt", e))? as u8;
        if vt > 15 {
            let err = PocketError::InvalidRobustnessWindow(vt);
            warn!("packet {}: {err}", self.t);
            return Err(err);
        }

        let mut ct = false;
        let change_count = xt.hamming_weight();

        if vt > 0 && change_count > 0 {
            let et = reader.read_bit().map_err(|e| self.parse_failure("et", e))? != 0;

            if et {
                // kₜ has one bit per change in Xₜ, forward order
                // (low-to-high position), inserted directly with no
                // scratch allocation.
                for i in 0..self.f {
                    if xt.get_bit(i) != 0 {
                        let kt_bit =
                            reader.read_bit().map_err(|e| self.parse_failure("kt", e))? != 0;
                        if kt_bit {
                            self.mask.set_bit(i, 0);
                            self.xt.set_bit(i, 1);
                        } else {
                            self.mask.set_bit(i, 1);
                        }
                    }
                }

                ct = reader.read_bit().map_err(|e| self.parse_failure("ct", e))? != 0;
            } else {
                for i in 0..self.f {
                    if xt.get_bit(i) != 0 {
                        self.mask.set_bit(i, 1);
                    }
                }
            }
        } else if vt == 0 && change_count > 0 {
            for i in 0..self.f {
                if xt.get_bit(i) != 0 {
                    let current_val = self.mask.get_bit(i);
                    let toggled = u8::from(current_val == 0);
                    self.mask.set_bit(i, toggled);
                }
            }
        }

        let dt = reader.read_bit().map_err(|e| self.parse_failure("dt", e))? != 0;

        // ====================================================================
        // Parse qₜ: Optional full mask
        // ====================================================================

        let mut rt = false;

        if !dt {
            let ft = reader.read_bit().map_err(|e| self.parse_failure("ft", e))? != 0;

            if ft {
                let mask_diff = rle_decode(reader, self.f).map_err(|e| self.parse_failure("q_t mask diff", e))?;

                // Inverse of Mₜ XOR leftShift(Mₜ): reconstruct via
                // prefix-XOR starting from the LSB (position F-1).
                let mut current = mask_diff.get_bit(self.f - 1);
                self.mask.set_bit(self.f - 1, current);

                for i in (0..self.f - 1).rev() {
                    let hxor_bit = mask_diff.get_bit(i);
                    current ^= hxor_bit;
                    self.mask.set_bit(i, current);
                }
            }

            rt = reader.read_bit().map_err(|e| self.parse_failure("rt", e))? != 0;
        }

        // ====================================================================
        // Parse uₜ: Data component
        // ====================================================================

        if rt {
            let _packet_length = count_decode(reader).map_err(|e| self.parse_failure("u_t length", e))?;

            for i in 0..self.f {
                let bit = reader.read_bit().map_err(|e| self.parse_failure("u_t literal", e))?;
                output.set_bit(i, bit);
            }
        } else if ct && vt > 0 {
            self.extraction_mask.copy_from(&self.mask);
            self.extraction_mask.or_assign(&self.xt);
            bit_insert(reader, &mut output, &self.extraction_mask)
                .map_err(|e| self.parse_failure("u_t extraction", e))?;
        } else {
            bit_insert(reader, &mut output, &self.mask)
                .map_err(|e| self.parse_failure("u_t extraction", e))?;
        }

        // ====================================================================
        // Update state for next cycle
        // ====================================================================

        self.prev_output.copy_from(&output);
        self.t += 1;

        Ok(output)
    }

    /// Record a `warn!` for a parse failure before propagating it.
    fn parse_failure(&self, field: &str, err: PocketError) -> PocketError {
        warn!("packet {}: failed to parse {field}: {err}", self.t);
        err
    }
}

/// Decompress a whole compressed stream produced with a matching `F`
/// and `R`.
///
/// See [`Decompressor`] for driving the codec one packet at a time on
/// a live stream; unlike compression, no period limits are needed here
/// — all per-packet scheduling is recovered from the bitstream itself.
///
/// # Errors
///
/// Returns `PocketError` if:
/// - `packet_size` is 0 or not divisible by 8
/// - `robustness` is greater than 7
/// - Compressed data is invalid or corrupted
pub fn decompress(
    data: &[u8],
    packet_size: usize,
    robustness: usize,
) -> Result<Vec<u8>, PocketError> {
    if packet_size == 0 || packet_size % 8 != 0 {
        return Err(PocketError::InvalidPacketSize(packet_size));
    }

    if robustness > 7 {
        return Err(PocketError::InvalidRobustness(robustness));
    }

    if data.is_empty() {
        return Err(PocketError::UnexpectedEndOfInput);
    }

    let mut decomp = Decompressor::new(packet_size, None, robustness as u8)?;

    let mut reader = BitReader::new(data, data.len() * 8);

    let packet_bytes = (packet_size + 7) / 8;
    let mut output = Vec::new();

    while reader.remaining() > 0 {
        let packet = decomp.decompress_packet(&mut reader)?;

        let packet_data = packet.to_bytes();
        output.extend_from_slice(&packet_data[..packet_bytes]);

        reader.align_byte();
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::compress;

    #[test]
    fn test_decompress_invalid_packet_size_zero() {
        let data = vec![0u8; 10];
        let result = decompress(&data, 0, 1);
        assert!(matches!(result, Err(PocketError::InvalidPacketSize(0))));
    }

    #[test]
    fn test_decompress_invalid_packet_size_not_byte_aligned() {
        let data = vec![0u8; 10];
        let result = decompress(&data, 721, 1);
        assert!(matches!(result, Err(PocketError::InvalidPacketSize(721))));
    }

    #[test]
    fn test_decompress_invalid_robustness() {
        let data = vec![0u8; 10];
        let result = decompress(&data, 720, 8);
        assert!(matches!(result, Err(PocketError::InvalidRobustness(8))));
    }

    #[test]
    fn test_decompress_empty_input() {
        let data: Vec<u8> = vec![];
        let result = decompress(&data, 720, 1);
        assert!(matches!(result, Err(PocketError::UnexpectedEndOfInput)));
    }

    #[test]
    fn test_decompressor_new() {
        let decomp = Decompressor::new(720, None, 2);
        assert!(decomp.is_ok());
        let decomp = decomp.unwrap();
        assert_eq!(decomp.f, 720);
        assert_eq!(decomp.robustness, 2);
    }

    #[test]
    fn test_decompressor_new_invalid_f() {
        let result = Decompressor::new(0, None, 2);
        assert!(matches!(result, Err(PocketError::InvalidPacketSize(0))));

        let result = Decompressor::new(65536, None, 2);
        assert!(matches!(result, Err(PocketError::InvalidPacketSize(65536))));
    }

    #[test]
    fn test_decompressor_new_invalid_robustness() {
        let result = Decompressor::new(720, None, 8);
        assert!(matches!(result, Err(PocketError::InvalidRobustness(8))));
    }

    #[test]
    fn test_round_trip_single_packet() {
        let original = vec![0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE, 0xBA, 0xBE];

        let compressed = compress(&original, 64, 1, 10, 20, 50).unwrap();
        let decompressed = decompress(&compressed, 64, 1).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_round_trip_multiple_packets() {
        let original = vec![
            0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE, 0xBA, 0xBE, // Packet 1
            0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0, // Packet 2
        ];

        let compressed = compress(&original, 64, 1, 10, 20, 50).unwrap();
        let decompressed = decompress(&compressed, 64, 1).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_round_trip_all_zeros() {
        let original = vec![0u8; 90];

        let compressed = compress(&original, 720, 2, 20, 50, 100).unwrap();
        let decompressed = decompress(&compressed, 720, 2).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_round_trip_all_ones() {
        let original = vec![0xFF; 90];

        let compressed = compress(&original, 720, 2, 20, 50, 100).unwrap();
        let decompressed = decompress(&compressed, 720, 2).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_round_trip_alternating() {
        let original: Vec<u8> = (0..90)
            .map(|i| if i % 2 == 0 { 0xAA } else { 0x55 })
            .collect();

        let compressed = compress(&original, 720, 1, 10, 20, 50).unwrap();
        let decompressed = decompress(&compressed, 720, 1).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_round_trip_many_packets() {
        let original: Vec<u8> = (0..900).map(|i| (i % 256) as u8).collect();

        let compressed = compress(&original, 720, 2, 20, 50, 100).unwrap();
        let decompressed = decompress(&compressed, 720, 2).unwrap();

        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_decompress_truncated_stream_errs() {
        let original = vec![0xAB; 9];
        let compressed = compress(&original, 72, 1, 10, 20, 50).unwrap();

        let truncated = &compressed[..compressed.len() - 1];
        let result = decompress(truncated, 72, 1);
        assert!(result.is_err());
    }
}
