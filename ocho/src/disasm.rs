//! Disassembler for program byte streams.
use std::fmt::{self, Write};

use crate::{constants::PROG_START, opcode::Opcode};

/// Renders a program as conventional mnemonics, one word per line, with
/// the address each word loads at.
///
/// A program carries no marker separating code from sprite data, so every
/// word is routed with the same classification the interpreter uses and
/// words that map to no operation print as raw data.
pub struct Disassembler<'a> {
    program: &'a [u8],
    cursor: usize,
}

impl<'a> Disassembler<'a> {
    pub fn new(program: &'a [u8]) -> Self {
        Disassembler { program, cursor: 0 }
    }

    /// Write the whole program to the given writer. A trailing odd byte is
    /// left out.
    pub fn disassemble<W: Write>(&mut self, w: &mut W) -> fmt::Result {
        self.cursor = 0;
        while self.cursor + 1 < self.program.len() {
            self.line(w)?;
            self.cursor += 2;
        }
        Ok(())
    }

    /// Print the whole program to stdout.
    pub fn print(&mut self) {
        let mut buf = String::new();
        self.disassemble(&mut buf)
            .expect("failed to format disassembly");
        print!("{buf}");
    }

    fn line<W: Write>(&self, w: &mut W) -> fmt::Result {
        let op = Opcode::from_bytes(self.program[self.cursor], self.program[self.cursor + 1]);
        let (x, y) = (op.x(), op.y());

        write!(w, "{:04X}: ", PROG_START + self.cursor)?;

        match op.family() {
            0x0 => match op.n() {
                0x0 => writeln!(w, "CLS"),
                0xE => writeln!(w, "RET"),
                _ => self.data_word(w, op),
            },
            0x1 => writeln!(w, "JP {:#05X}", op.nnn()),
            0x2 => writeln!(w, "CALL {:#05X}", op.nnn()),
            0x3 => writeln!(w, "SE V{x:X}, {:#04X}", op.nn()),
            0x4 => writeln!(w, "SNE V{x:X}, {:#04X}", op.nn()),
            0x5 => writeln!(w, "SE V{x:X}, V{y:X}"),
            0x6 => writeln!(w, "LD V{x:X}, {:#04X}", op.nn()),
            0x7 => writeln!(w, "ADD V{x:X}, {:#04X}", op.nn()),
            0x8 => match op.n() {
                0x0 => writeln!(w, "LD V{x:X}, V{y:X}"),
                0x1 => writeln!(w, "OR V{x:X}, V{y:X}"),
                0x2 => writeln!(w, "AND V{x:X}, V{y:X}"),
                0x3 => writeln!(w, "XOR V{x:X}, V{y:X}"),
                0x4 => writeln!(w, "ADD V{x:X}, V{y:X}"),
                0x5 => writeln!(w, "SUB V{x:X}, V{y:X}"),
                0x6 => writeln!(w, "SHR V{x:X}"),
                0x7 => writeln!(w, "SUBN V{x:X}, V{y:X}"),
                0xE => writeln!(w, "SHL V{x:X}"),
                _ => self.data_word(w, op),
            },
            0x9 => writeln!(w, "SNE V{x:X}, V{y:X}"),
            0xA => writeln!(w, "LD I, {:#05X}", op.nnn()),
            0xB => writeln!(w, "JP V0, {:#05X}", op.nnn()),
            0xC => writeln!(w, "RND V{x:X}, {:#04X}", op.nn()),
            0xD => writeln!(w, "DRW V{x:X}, V{y:X}, {:X}", op.n()),
            0xE => match op.nn() {
                0x9E => writeln!(w, "SKP V{x:X}"),
                0xA1 => writeln!(w, "SKNP V{x:X}"),
                _ => self.data_word(w, op),
            },
            0xF => match op.nn() {
                0x07 => writeln!(w, "LD V{x:X}, DT"),
                0x0A => writeln!(w, "LD V{x:X}, K"),
                0x15 => writeln!(w, "LD DT, V{x:X}"),
                0x18 => writeln!(w, "LD ST, V{x:X}"),
                0x1E => writeln!(w, "ADD I, V{x:X}"),
                0x29 => writeln!(w, "LD F, V{x:X}"),
                0x33 => writeln!(w, "LD B, V{x:X}"),
                0x55 => writeln!(w, "LD [I], V{x:X}"),
                0x65 => writeln!(w, "LD V{x:X}, [I]"),
                _ => self.data_word(w, op),
            },
            _ => self.data_word(w, op),
        }
    }

    /// Words with no operation are most likely sprite data.
    fn data_word<W: Write>(&self, w: &mut W, op: Opcode) -> fmt::Result {
        writeln!(w, ".word {:#06X}", op.word())
    }
}
