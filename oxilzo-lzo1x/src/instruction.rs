//! LZO1X instruction stream model.
//!
//! A compressed block is a sequence of opcodes. How an opcode below 16 is
//! read depends on what the previous instruction left behind, so decoding is
//! a small state machine:
//!
//! | Opcode    | Meaning                                                  |
//! |-----------|----------------------------------------------------------|
//! | `18..=255` (first byte only) | literal run of `op - 17` bytes         |
//! | `0..=15`  | literal run, M1 short match, or M1 far match (by state)  |
//! | `16..=31` | M4: distance `0x4000..=0xBFFF`, or end of stream         |
//! | `32..=63` | M3: distance up to `0x4000`                              |
//! | `64..=255`| M2: length 3..=8, distance up to `0x800`                 |
//!
//! Every match carries 0..=3 trailing literals in the low two bits of the
//! byte holding its low distance bits.

use oxilzo_core::error::{LzoError, Result};

/// Largest distance reachable by an M2 match.
pub const M2_MAX_OFFSET: usize = 0x0800;
/// Largest distance reachable by an M3 match.
pub const M3_MAX_OFFSET: usize = 0x4000;
/// Largest distance reachable by an M4 match.
pub const M4_MAX_OFFSET: usize = 0xBFFF;
/// Longest match encoded inline in an M2 opcode.
pub const M2_MAX_LEN: usize = 8;
/// Longest match encoded inline in an M3 opcode.
pub const M3_MAX_LEN: usize = 33;
/// Longest match encoded inline in an M4 opcode.
pub const M4_MAX_LEN: usize = 9;

const M3_MARKER: u8 = 32;
const M4_MARKER: u8 = 16;

/// End-of-stream marker (an M4 opcode with zero distance).
pub const END_MARKER: [u8; 3] = [M4_MARKER | 1, 0, 0];

/// Decoder state: what the previous instruction left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing decoded yet.
    Initial,
    /// After a match without trailing literals. Low opcodes are literal runs.
    Fresh,
    /// After 1..=3 literals. Low opcodes are 2-byte M1 matches.
    ShortLiterals,
    /// After a run of 4 or more literals. Low opcodes are 3-byte M1 matches
    /// reaching just past the M2 window.
    LongLiterals,
}

impl State {
    /// State after copying `count` literal bytes.
    pub fn after_literals(count: usize) -> Self {
        if count < 4 {
            Self::ShortLiterals
        } else {
            Self::LongLiterals
        }
    }
}

/// Match opcode family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Opcodes `0..=15` following literals.
    M1,
    /// Opcodes `64..=255`.
    M2,
    /// Opcodes `32..=63`.
    M3,
    /// Opcodes `16..=31`.
    M4,
}

/// One decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Copy `len` bytes from the instruction stream.
    Literals {
        /// Number of literal bytes that follow.
        len: usize,
    },
    /// Copy `len` bytes starting `distance` bytes back in the output.
    Match {
        /// Opcode family.
        kind: MatchKind,
        /// Back-reference distance (at least 1).
        distance: usize,
        /// Number of bytes to copy.
        len: usize,
        /// Literal bytes (0..=3) that follow the match.
        trailing: usize,
    },
    /// End of stream.
    End,
}

/// Reads instructions from a compressed block.
#[derive(Debug)]
pub struct InstructionReader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> InstructionReader<'a> {
    /// Create a reader positioned at the start of `input`.
    pub fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current offset into the compressed input.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// True when every input byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Decode the next instruction given the current state.
    pub fn next_instruction(&mut self, state: State) -> Result<Instruction> {
        let op = self.byte()?;

        if state == State::Initial && op > 17 {
            return Ok(Instruction::Literals {
                len: usize::from(op - 17),
            });
        }

        if op >= 64 {
            let hi = usize::from(self.byte()?);
            return Ok(Instruction::Match {
                kind: MatchKind::M2,
                distance: 1 + usize::from((op >> 2) & 7) + (hi << 3),
                len: usize::from(op >> 5) + 1,
                trailing: usize::from(op & 3),
            });
        }

        if op >= 32 {
            let len = match op & 31 {
                0 => self.extended_length(31)? + 2,
                n => usize::from(n) + 2,
            };
            let (lo, word) = self.le16()?;
            return Ok(Instruction::Match {
                kind: MatchKind::M3,
                distance: 1 + usize::from(word >> 2),
                len,
                trailing: usize::from(lo & 3),
            });
        }

        if op >= 16 {
            let len = match op & 7 {
                0 => self.extended_length(7)? + 2,
                n => usize::from(n) + 2,
            };
            let (lo, word) = self.le16()?;
            let distance = (usize::from(op & 8) << 11) + usize::from(word >> 2);
            if distance == 0 {
                return Ok(Instruction::End);
            }
            return Ok(Instruction::Match {
                kind: MatchKind::M4,
                distance: distance + M3_MAX_OFFSET,
                len,
                trailing: usize::from(lo & 3),
            });
        }

        match state {
            State::Initial | State::Fresh => {
                let len = match op {
                    0 => self.extended_length(15)? + 3,
                    n => usize::from(n) + 3,
                };
                Ok(Instruction::Literals { len })
            }
            State::ShortLiterals => {
                let hi = usize::from(self.byte()?);
                Ok(Instruction::Match {
                    kind: MatchKind::M1,
                    distance: 1 + usize::from(op >> 2) + (hi << 2),
                    len: 2,
                    trailing: usize::from(op & 3),
                })
            }
            State::LongLiterals => {
                let hi = usize::from(self.byte()?);
                Ok(Instruction::Match {
                    kind: MatchKind::M1,
                    distance: 1 + M2_MAX_OFFSET + usize::from(op >> 2) + (hi << 2),
                    len: 3,
                    trailing: usize::from(op & 3),
                })
            }
        }
    }

    /// Take `len` literal bytes from the stream.
    pub fn literals(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| LzoError::malformed(self.pos, "literal run overruns input"))?;
        let bytes = &self.input[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn byte(&mut self) -> Result<u8> {
        let b = *self
            .input
            .get(self.pos)
            .ok_or_else(|| LzoError::malformed(self.pos, "input overrun"))?;
        self.pos += 1;
        Ok(b)
    }

    fn le16(&mut self) -> Result<(u8, u16)> {
        let lo = self.byte()?;
        let hi = self.byte()?;
        Ok((lo, u16::from_le_bytes([lo, hi])))
    }

    /// Length continuation: each zero byte adds 255, the first non-zero byte
    /// ends the run and is added as-is.
    fn extended_length(&mut self, base: usize) -> Result<usize> {
        let mut len = base;
        loop {
            match self.byte()? {
                0 => len += 255,
                b => return Ok(len + usize::from(b)),
            }
        }
    }
}

/// Write a length continuation: zero bytes for each full 255, then the rest.
fn push_length(out: &mut Vec<u8>, mut len: usize) {
    while len > 255 {
        out.push(0);
        len -= 255;
    }
    out.push(len as u8);
}

/// Emit a literal run.
///
/// `at_start` selects the first-instruction form (`17 + len`) when nothing
/// has been emitted yet. Runs of 1..=3 literals after a match are folded
/// into the low bits of that match's distance byte.
pub(crate) fn push_literals(out: &mut Vec<u8>, literals: &[u8], at_start: bool) {
    let t = literals.len();
    if t == 0 {
        return;
    }

    if at_start && t <= 238 {
        out.push((17 + t) as u8);
    } else if t <= 3 {
        if let Some(slot) = out.len().checked_sub(2).and_then(|i| out.get_mut(i)) {
            *slot |= t as u8;
        }
    } else if t <= 18 {
        out.push((t - 3) as u8);
    } else {
        out.push(0);
        push_length(out, t - 18);
    }
    out.extend_from_slice(literals);
}

/// Emit a match, picking the smallest opcode family that can hold it.
///
/// `len` must be at least 3 (4 for M3/M4 distances) and `distance` in
/// `1..=M4_MAX_OFFSET`.
pub(crate) fn push_match(out: &mut Vec<u8>, len: usize, distance: usize) {
    if len <= M2_MAX_LEN && distance <= M2_MAX_OFFSET {
        let off = distance - 1;
        out.push((((len - 1) << 5) | ((off & 7) << 2)) as u8);
        out.push((off >> 3) as u8);
    } else if distance <= M3_MAX_OFFSET {
        let off = distance - 1;
        if len <= M3_MAX_LEN {
            out.push(M3_MARKER | (len - 2) as u8);
        } else {
            out.push(M3_MARKER);
            push_length(out, len - M3_MAX_LEN);
        }
        out.push((off << 2) as u8);
        out.push((off >> 6) as u8);
    } else {
        let off = distance - M3_MAX_OFFSET;
        let high = ((off >> 11) & 8) as u8;
        if len <= M4_MAX_LEN {
            out.push(M4_MARKER | high | (len - 2) as u8);
        } else {
            out.push(M4_MARKER | high);
            push_length(out, len - M4_MAX_LEN);
        }
        out.push((off << 2) as u8);
        out.push((off >> 6) as u8);
    }
}
