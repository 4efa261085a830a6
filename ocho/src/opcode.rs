//! Instruction words and their operand fields.
use std::fmt::{self, Display, Formatter};

/// A 16-bit instruction word, assembled big-endian from two consecutive
/// memory bytes.
///
/// Operand fields sit at fixed bit positions inside the word:
///
/// ```text
/// .nnn  12-bit address
/// .x..  register index
/// ..y.  register index
/// ...n  4-bit immediate
/// ..nn  8-bit immediate
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(u16);

impl Opcode {
    pub fn from_bytes(hi: u8, lo: u8) -> Self {
        Opcode((hi as u16) << 8 | lo as u16)
    }

    /// The raw instruction word.
    #[inline(always)]
    pub fn word(self) -> u16 {
        self.0
    }

    /// Top nibble, naming the instruction family.
    #[inline(always)]
    pub fn family(self) -> u8 {
        (self.0 >> 12) as u8
    }

    /// Operand `X`, a register index.
    #[inline(always)]
    pub fn x(self) -> usize {
        ((self.0 >> 8) & 0xF) as usize
    }

    /// Operand `Y`, a register index.
    #[inline(always)]
    pub fn y(self) -> usize {
        ((self.0 >> 4) & 0xF) as usize
    }

    /// Operand `N`, a 4-bit immediate.
    #[inline(always)]
    pub fn n(self) -> u8 {
        (self.0 & 0xF) as u8
    }

    /// Operand `NN`, an 8-bit immediate.
    #[inline(always)]
    pub fn nn(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Operand `NNN`, a 12-bit address.
    #[inline(always)]
    pub fn nnn(self) -> u16 {
        self.0 & 0xFFF
    }
}

impl From<u16> for Opcode {
    fn from(word: u16) -> Self {
        Opcode(word)
    }
}

impl Display for Opcode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_operand_fields() {
        let op = Opcode::from(0xABCD);

        assert_eq!(op.word(), 0xABCD);
        assert_eq!(op.family(), 0xA);
        assert_eq!(op.x(), 0xB);
        assert_eq!(op.y(), 0xC);
        assert_eq!(op.n(), 0xD);
        assert_eq!(op.nn(), 0xCD);
        assert_eq!(op.nnn(), 0xBCD);
    }

    #[test]
    fn test_from_bytes_is_big_endian() {
        assert_eq!(Opcode::from_bytes(0xAA, 0xBB), Opcode::from(0xAABB));
    }

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(Opcode::from(0x00E0).to_string(), "00E0");
    }
}
