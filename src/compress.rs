//! POCKET+ compression algorithm implementation.
//!
//! Implements CCSDS 124.0-B-1 Section 5.3 (Encoding Step):
//! - Compressor initialization and state management
//! - Main compression algorithm
//! - Output packet encoding: oₜ = hₜ || qₜ || uₜ

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::too_many_lines)]

use log::{debug, trace};

use crate::bitbuffer::BitBuffer;
use crate::bitvector::BitVector;
use crate::encode::{bit_extract, bit_extract_forward, count_encode, rle_encode};
use crate::error::PocketError;
use crate::mask::{self, compute_change, update_build, update_mask, HISTORY_DEPTH};

/// Depth of the new-mask-flag history used by the cₜ two-or-more check.
const MAX_VT_HISTORY: usize = HISTORY_DEPTH;

/// Per-packet scheduling decision, supplied by the caller.
///
/// The free-period scheduling that derives these flags from Lp/Lf/Lr
/// (CCSDS's "countdown to 1, then reset" rule) lives in the [`compress`]
/// convenience wrapper; a caller driving [`Compressor`] directly on a
/// live stream is responsible for computing its own schedule.
#[derive(Clone, Debug, Default)]
pub struct CompressionParams {
    /// New mask flag (ṗₜ).
    pub new_mask_flag: bool,
    /// Send full mask flag (ḟₜ).
    pub send_mask_flag: bool,
    /// Send uncompressed flag (ṙₜ).
    pub uncompressed_flag: bool,
}

/// POCKET+ compressor state.
#[derive(Clone)]
pub struct Compressor {
    /// Packet length in bits (F).
    f: usize,
    /// Robustness level (R).
    robustness: u8,
    /// Current mask vector.
    mask: BitVector,
    /// Previous mask vector.
    prev_mask: BitVector,
    /// Build vector.
    build: BitVector,
    /// Previous input vector.
    prev_input: BitVector,
    /// Initial mask (for reset).
    initial_mask: BitVector,
    /// Change history ring buffer; slot `t % HISTORY_DEPTH` holds Dₜ.
    change_history: Vec<BitVector>,
    /// New-mask-flag history ring buffer, same indexing as `change_history`.
    flag_history: Vec<bool>,
    /// Current time step.
    t: usize,
    /// Pt limit (new mask interval).
    pt_limit: usize,
    /// Ft limit (send mask interval).
    ft_limit: usize,
    /// Rt limit (uncompressed interval).
    rt_limit: usize,
    /// Pt counter.
    pt_counter: usize,
    /// Ft counter.
    ft_counter: usize,
    /// Rt counter.
    rt_counter: usize,
}

impl Compressor {
    /// Create a new compressor.
    ///
    /// # Errors
    /// Returns [`PocketError::InvalidPacketSize`] if `f` is 0 or exceeds
    /// 65535, or [`PocketError::InvalidRobustness`] if `robustness` > 7.
    pub fn new(
        f: usize,
        initial_mask: Option<&BitVector>,
        robustness: u8,
        pt_limit: usize,
        ft_limit: usize,
        rt_limit: usize,
    ) -> Result<Self, PocketError> {
        if f == 0 || f > 65535 {
            return Err(PocketError::InvalidPacketSize(f));
        }
        if robustness > 7 {
            return Err(PocketError::InvalidRobustness(robustness as usize));
        }

        let mask = initial_mask.cloned().unwrap_or_else(|| BitVector::new(f));
        let initial = mask.clone();

        let change_history = (0..HISTORY_DEPTH).map(|_| BitVector::new(f)).collect();

        let mut comp = Self {
            f,
            robustness,
            mask,
            prev_mask: BitVector::new(f),
            build: BitVector::new(f),
            prev_input: BitVector::new(f),
            initial_mask: initial,
            change_history,
            flag_history: vec![false; MAX_VT_HISTORY],
            t: 0,
            pt_limit,
            ft_limit,
            rt_limit,
            pt_counter: pt_limit,
            ft_counter: ft_limit,
            rt_counter: rt_limit,
        };

        comp.reset();
        debug!(
            "Compressor::new f={f} robustness={robustness} pt={pt_limit} ft={ft_limit} rt={rt_limit}"
        );
        Ok(comp)
    }

    /// Reset compressor to initial state.
    pub fn reset(&mut self) {
        self.t = 0;

        self.mask.copy_from(&self.initial_mask);
        self.prev_mask.zero();
        self.build.zero();
        self.prev_input.zero();

        for change in &mut self.change_history {
            change.zero();
        }
        for flag in &mut self.flag_history {
            *flag = false;
        }

        self.pt_counter = self.pt_limit;
        self.ft_counter = self.ft_limit;
        self.rt_counter = self.rt_limit;

        debug!("Compressor::reset f={}", self.f);
    }

    /// Check for positive updates: a position where Xₜ = 1 and Mₜ = 0.
    fn has_positive_updates(&self, xt: &BitVector) -> bool {
        let inverted = self.mask.not();
        let positive = xt.and(&inverted);
        positive.hamming_weight() > 0
    }

    /// Compute cₜ: whether the new-mask flag fired ≥ 2 times in the last
    /// Vₜ+1 scheduling decisions (including the current one).
    fn compute_ct_flag(&self, vt: u8, current_new_mask_flag: bool) -> bool {
        if vt == 0 {
            return false;
        }

        let mut count = i32::from(current_new_mask_flag);
        let iterations = (vt as usize).min(self.t);

        for i in 0..iterations {
            let hist_idx = (self.t + MAX_VT_HISTORY - 1 - i) % MAX_VT_HISTORY;
            if self.flag_history[hist_idx] {
                count += 1;
            }
        }

        count >= 2
    }

    /// Compress a single packet.
    ///
    /// # Errors
    /// Returns [`PocketError::InvalidInputLength`] if `input`'s length
    /// does not equal `F`, or a buffer error if the output would
    /// overflow the internal bit-buffer limit.
    pub fn compress_packet(
        &mut self,
        input: &BitVector,
        params: &CompressionParams,
    ) -> Result<BitBuffer, PocketError> {
        if input.len() != self.f {
            return Err(PocketError::InvalidInputLength {
                expected: self.f,
                actual: input.len(),
            });
        }

        let mut output = BitBuffer::new();

        // Step 1: Update mask and build vectors.
        self.prev_mask.copy_from(&self.mask);
        let prev_build = self.build.clone();

        if self.t > 0 {
            update_build(
                &mut self.build,
                input,
                &self.prev_input,
                params.new_mask_flag,
                self.t,
            );
            update_mask(
                &mut self.mask,
                input,
                &self.prev_input,
                &prev_build,
                params.new_mask_flag,
            );
        }

        let change = compute_change(&self.mask, &self.prev_mask, self.t);
        self.change_history[self.t % HISTORY_DEPTH].copy_from(&change);

        // Step 2: Encode output packet.
        let xt = mask::robustness_window(&self.change_history, self.t, self.robustness as usize);
        let vt = mask::effective_robustness(&self.change_history, self.t, self.robustness as usize);
        let dt = u8::from(!params.send_mask_flag && !params.uncompressed_flag);

        trace!(
            "compress_packet t={} vt={vt} hamming(xt)={} dt={dt}",
            self.t,
            xt.hamming_weight()
        );

        // Component hₜ: RLE(Xₜ) || BIT₄(Vₜ) || eₜ || kₜ || cₜ || ḋₜ
        rle_encode(&mut output, &xt)?;
        output.append_value(u32::from(vt), 4);

        if vt > 0 && xt.hamming_weight() > 0 {
            let et = self.has_positive_updates(&xt);
            output.append_bit(u8::from(et));

            if et {
                let inverted = self.mask.not();
                bit_extract_forward(&mut output, &inverted, &xt)?;

                let ct = self.compute_ct_flag(vt, params.new_mask_flag);
                output.append_bit(u8::from(ct));
            }
        }

        output.append_bit(dt);

        // Component qₜ.
        if dt == 0 {
            if params.send_mask_flag {
                output.append_bit(1);
                let shifted = self.mask.left_shift();
                let diff = self.mask.xor(&shifted);
                rle_encode(&mut output, &diff)?;
            } else {
                output.append_bit(0);
            }
        }

        // Component uₜ.
        if params.uncompressed_flag {
            output.append_bit(1);
            count_encode(&mut output, self.f as u32)?;
            output.append_bitvector(input);
        } else {
            if dt == 0 {
                output.append_bit(0);
            }

            let ct = self.compute_ct_flag(vt, params.new_mask_flag);
            if ct && vt > 0 {
                let extraction_mask = self.mask.or(&xt);
                bit_extract(&mut output, input, &extraction_mask)?;
            } else {
                bit_extract(&mut output, input, &self.mask)?;
            }
        }

        // Step 3: Update state.
        self.prev_input.copy_from(input);
        self.prev_mask.copy_from(&self.mask);
        self.flag_history[self.t % MAX_VT_HISTORY] = params.new_mask_flag;
        self.t += 1;

        Ok(output)
    }
}

/// Compress a whole buffer of fixed-length packets with a fixed
/// Lp/Lf/Lr schedule.
///
/// `data` must be a whole multiple of `packet_size / 8` bytes. See
/// [`Compressor`] for driving the codec one packet at a time on a live
/// stream.
///
/// # Errors
/// Returns [`PocketError::InvalidPacketSize`] if `packet_size` is zero
/// or not a multiple of 8, [`PocketError::InvalidRobustness`] if
/// `robustness` > 7, or [`PocketError::InvalidInputLength`] if `data`'s
/// length is not a whole multiple of the packet size.
pub fn compress(
    data: &[u8],
    packet_size: usize,
    robustness: usize,
    pt_limit: usize,
    ft_limit: usize,
    rt_limit: usize,
) -> Result<Vec<u8>, PocketError> {
    if packet_size == 0 {
        return Err(PocketError::InvalidPacketSize(packet_size));
    }
    if packet_size % 8 != 0 {
        return Err(PocketError::InvalidPacketSize(packet_size));
    }
    if robustness > 7 {
        return Err(PocketError::InvalidRobustness(robustness));
    }

    let packet_bytes = packet_size / 8;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if data.len() % packet_bytes != 0 {
        return Err(PocketError::InvalidInputLength {
            expected: (data.len() / packet_bytes + 1) * packet_bytes,
            actual: data.len(),
        });
    }

    let num_packets = data.len() / packet_bytes;
    let mut comp = Compressor::new(
        packet_size,
        None,
        robustness as u8,
        pt_limit,
        ft_limit,
        rt_limit,
    )?;

    let mut output = Vec::new();

    for i in 0..num_packets {
        let packet_data = &data[i * packet_bytes..(i + 1) * packet_bytes];
        let input = BitVector::from_bytes(packet_data, packet_size);

        let params = if pt_limit > 0 && ft_limit > 0 && rt_limit > 0 {
            if i == 0 {
                CompressionParams {
                    new_mask_flag: false,
                    send_mask_flag: true,
                    uncompressed_flag: true,
                }
            } else {
                let send_mask_flag = if comp.ft_counter == 1 {
                    comp.ft_counter = ft_limit;
                    true
                } else {
                    comp.ft_counter -= 1;
                    false
                };

                let new_mask_flag = if comp.pt_counter == 1 {
                    comp.pt_counter = pt_limit;
                    true
                } else {
                    comp.pt_counter -= 1;
                    false
                };

                let uncompressed_flag = if comp.rt_counter == 1 {
                    comp.rt_counter = rt_limit;
                    true
                } else {
                    comp.rt_counter -= 1;
                    false
                };

                let (send_mask_flag, uncompressed_flag, new_mask_flag) = if i <= robustness {
                    (true, true, false)
                } else {
                    (send_mask_flag, uncompressed_flag, new_mask_flag)
                };

                CompressionParams {
                    new_mask_flag,
                    send_mask_flag,
                    uncompressed_flag,
                }
            }
        } else {
            CompressionParams {
                new_mask_flag: false,
                send_mask_flag: false,
                uncompressed_flag: false,
            }
        };

        let packet_output = comp.compress_packet(&input, &params)?;
        output.extend(packet_output.to_bytes());
    }

    Ok(output)
}
