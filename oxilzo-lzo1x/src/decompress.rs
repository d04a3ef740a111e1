//! LZO1X decompressor.
//!
//! Decodes any LZO1X stream (LZO1X-1, LZO1X-1(15) and LZO1X-999 all share
//! the format). The caller supplies the exact decompressed size; producing
//! more or fewer bytes, reaching outside the output produced so far, or
//! leaving input unconsumed after the end marker is a
//! [`LzoError::MalformedInstruction`].

use crate::instruction::{Instruction, InstructionReader, State};
use oxilzo_core::error::{LzoError, Result};

/// Decompress `input`, which must expand to exactly `expected_len` bytes.
pub fn decompress(input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    decompress_into(input, expected_len, &mut out)?;
    Ok(out)
}

/// Decompress into `out`, replacing its contents.
///
/// On error `out` holds whatever was decoded before the failure.
pub fn decompress_into(input: &[u8], expected_len: usize, out: &mut Vec<u8>) -> Result<()> {
    out.clear();
    out.reserve(expected_len);

    let mut reader = InstructionReader::new(input);
    let mut state = State::Initial;

    loop {
        let at = reader.position();
        match reader.next_instruction(state)? {
            Instruction::Literals { len } => {
                copy_literals(&mut reader, out, len, expected_len)?;
                state = State::after_literals(len);
            }
            Instruction::Match {
                distance,
                len,
                trailing,
                ..
            } => {
                copy_match(out, distance, len, expected_len, at)?;
                if trailing == 0 {
                    state = State::Fresh;
                } else {
                    copy_literals(&mut reader, out, trailing, expected_len)?;
                    state = State::ShortLiterals;
                }
            }
            Instruction::End => break,
        }
    }

    if out.len() != expected_len {
        return Err(LzoError::malformed(
            reader.position(),
            format!(
                "stream ended after {} bytes, expected {}",
                out.len(),
                expected_len
            ),
        ));
    }
    if !reader.is_exhausted() {
        return Err(LzoError::malformed(
            reader.position(),
            "input not consumed after end marker",
        ));
    }

    Ok(())
}

fn copy_literals(
    reader: &mut InstructionReader<'_>,
    out: &mut Vec<u8>,
    len: usize,
    expected_len: usize,
) -> Result<()> {
    if out.len() + len > expected_len {
        return Err(LzoError::malformed(reader.position(), "output overrun"));
    }
    out.extend_from_slice(reader.literals(len)?);
    Ok(())
}

/// Copy `len` bytes from `distance` back. Source and destination overlap
/// whenever `distance < len`, so the copy runs forward one byte at a time.
fn copy_match(
    out: &mut Vec<u8>,
    distance: usize,
    len: usize,
    expected_len: usize,
    at: usize,
) -> Result<()> {
    if distance > out.len() {
        return Err(LzoError::malformed(
            at,
            format!(
                "match distance {} reaches before start of output ({} bytes)",
                distance,
                out.len()
            ),
        ));
    }
    if out.len() + len > expected_len {
        return Err(LzoError::malformed(at, "output overrun"));
    }

    let start = out.len() - distance;
    for i in 0..len {
        let byte = out[start + i];
        out.push(byte);
    }
    Ok(())
}
