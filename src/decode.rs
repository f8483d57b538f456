//! POCKET+ decoding functions (COUNT, RLE, Bit Insert).
//!
//! Implements CCSDS 124.0-B-1 decoding (inverse of Section 5.2):
//! - Counter Decoding - inverse of COUNT encoding
//! - Run-Length Decoding - inverse of RLE encoding
//! - Bit Insertion - inverse of BE extraction

use crate::bitreader::BitReader;
use crate::bitvector::BitVector;
use crate::error::PocketError;

/// Counter Decoding - inverse of COUNT encoding.
///
/// Decodes COUNT-encoded values:
/// - '0' → 1
/// - '10' → 0 (terminator)
/// - '110' + 5 bits → value + 2
/// - '111' + variable bits → value + 2
///
/// # Arguments
/// * `reader` - Bit reader to read encoded bits from
///
/// # Returns
/// Decoded value, or error if invalid encoding.
#[inline]
pub fn count_decode(reader: &mut BitReader) -> Result<u32, PocketError> {
    // Read first bit
    let bit0 = reader.read_bit()?;

    if bit0 == 0 {
        // Case 1: '0' → value is 1
        return Ok(1);
    }

    // First bit is 1, read second bit
    let bit1 = reader.read_bit()?;

    if bit1 == 0 {
        // Case 2: '10' → terminator (value 0)
        return Ok(0);
    }

    // First two bits are 11, read third bit
    let bit2 = reader.read_bit()?;

    if bit2 == 0 {
        // Case 3: '110' + 5 bits → value + 2
        let raw = reader.read_bits(5)?;
        return Ok(raw + 2);
    }

    // Case 4: '111' + variable bits
    // Count zeros to determine field size
    let mut size = 0usize;
    loop {
        let next_bit = reader.read_bit()?;
        size += 1;
        if next_bit == 1 {
            break;
        }
    }

    // Size of value field is size + 5
    let value_bits = size + 5;

    // Back up one bit since the '1' is part of the value
    reader.back()?;

    // Read the value field
    let raw = reader.read_bits(value_bits)?;
    Ok(raw + 2)
}

/// Run-Length Decoding - inverse of RLE encoding.
///
/// Decodes RLE-encoded bit vectors by reading COUNT values until terminator.
///
/// # Arguments
/// * `reader` - Bit reader to read encoded bits from
/// * `length` - Expected length of decoded bit vector
///
/// # Returns
/// Decoded bit vector, or error if invalid encoding.
#[inline]
pub fn rle_decode(reader: &mut BitReader, length: usize) -> Result<BitVector, PocketError> {
    // Initialize result to all zeros (BitVector::new already zeroes)
    let mut result = BitVector::new(length);

    // Start from end of vector (matching RLE encoding which processes LSB to MSB)
    let mut bit_position = length;

    // Read COUNT values until terminator
    let mut delta = count_decode(reader)?;

    while delta != 0 {
        // Delta represents (count of zeros + 1)
        if (delta as usize) <= bit_position {
            bit_position -= delta as usize;
            // Set the bit at this position
            result.set_bit(bit_position, 1);
        }

        // Read next delta
        delta = count_decode(reader)?;
    }

    Ok(result)
}

/// Bit Insertion - inverse of BE extraction.
///
/// Inserts bits from reader into data at positions where mask has '1' bits.
/// Bits are inserted in reverse order (matching BE extraction order).
///
/// # Arguments
/// * `reader` - Bit reader to read bits from
/// * `data` - Bit vector to insert bits into
/// * `mask` - Mask indicating where to insert bits
///
/// # Returns
/// `Ok(())` on success, or error if not enough bits.
#[inline]
pub fn bit_insert(
    reader: &mut BitReader,
    data: &mut BitVector,
    mask: &BitVector,
) -> Result<(), PocketError> {
    if data.len() != mask.len() {
        return Err(PocketError::InvalidInputLength {
            expected: mask.len(),
            actual: data.len(),
        });
    }

    // Insert bits in reverse order (matching BE extraction)
    // Iterate backward through mask positions to avoid Vec allocation
    let len = mask.len();
    for i in (0..len).rev() {
        if mask.get_bit(i) != 0 {
            let bit = reader.read_bit()?;
            data.set_bit(i, bit);
        }
    }

    Ok(())
}
