//! Virtual machine: the fetch, classify and dispatch loop.
use std::fmt::{self, Write};

use rand::prelude::*;

use crate::{
    constants::*,
    cpu::OchoCpu,
    error::{OchoError, OchoResult},
    opcode::Opcode,
};

/// Control flow outcome of one interpreted instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// A sequential instruction; the program counter moved past it.
    Continue,
    /// A jump, call or return set the program counter directly.
    Jump,
    /// The frame buffer changed and the redraw flag was raised.
    Draw,
    /// Wait-for-key found no key held. The program counter did not move,
    /// so the instruction runs again next cycle.
    KeyWait,
    /// The word maps to no operation. It was reported and stepped over.
    Unknown(Opcode),
}

/// Outcome of one [`OchoVm::step`] cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cycle {
    pub flow: Flow,
    /// True exactly when the sound timer ran out this cycle. The host
    /// forwards this one-shot to its audio sink; there is no duration and
    /// nothing to poll.
    pub tone: bool,
}

/// A complete machine: state plus the interpreter that drives it.
///
/// The host owns the run loop. It calls [`step`](OchoVm::step) at whatever
/// rate it wants, feeds the keypad through [`set_key`](OchoVm::set_key)
/// between cycles, and redraws from [`framebuffer`](OchoVm::framebuffer)
/// whenever [`redraw`](OchoVm::redraw) reports a change.
pub struct OchoVm {
    cpu: OchoCpu,
}

impl Default for OchoVm {
    fn default() -> Self {
        Self::new()
    }
}

impl OchoVm {
    pub fn new() -> Self {
        OchoVm { cpu: OchoCpu::new() }
    }

    /// Load a program image into the program region.
    ///
    /// The machine is reset first so no trace of the previous program
    /// survives. An image larger than the program region is rejected
    /// before anything is written.
    pub fn load_program(&mut self, program: &[u8]) -> OchoResult<()> {
        if program.len() > PROG_CAPACITY {
            return Err(OchoError::ProgramTooLarge {
                size: program.len(),
            });
        }

        self.cpu.reset();
        self.cpu.ram[PROG_START..PROG_START + program.len()].copy_from_slice(program);

        Ok(())
    }

    /// Return the machine to its power-on state, dropping the loaded
    /// program.
    pub fn reset(&mut self) {
        self.cpu.reset();
    }

    /// Press or release one key of the hexadecimal pad. Ids beyond 0xF are
    /// ignored.
    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.cpu.set_key(key, pressed);
    }

    /// Release every key.
    pub fn clear_keys(&mut self) {
        self.cpu.clear_keys();
    }

    /// The frame buffer, row major, one `bool` per pixel.
    pub fn framebuffer(&self) -> &[bool; DISPLAY_BUFFER_SIZE] {
        &self.cpu.display
    }

    /// Whether the frame buffer changed since the host last acknowledged a
    /// redraw.
    pub fn redraw(&self) -> bool {
        self.cpu.redraw
    }

    /// Acknowledge a redraw. Only the host lowers the flag; the machine
    /// raises it again on the next display write.
    pub fn clear_redraw(&mut self) {
        self.cpu.redraw = false;
    }
}

/// Interpreter
impl OchoVm {
    /// Run one fetch, classify, dispatch cycle.
    ///
    /// Exactly one instruction is interpreted, then both timers tick. A
    /// fault abandons the cycle with the machine untouched by the faulting
    /// instruction; an unknown instruction word is reported, stepped over,
    /// and the cycle completes normally.
    pub fn step(&mut self) -> OchoResult<Cycle> {
        let op = self.cpu.fetch()?;
        let flow = self.exec(op)?;

        self.cpu.tick_delay();
        let tone = self.cpu.tick_sound();

        Ok(Cycle { flow, tone })
    }

    /// Classify one instruction word by its top nibble and dispatch it.
    ///
    /// Families 0x0 and 0x8 route on the bottom nibble, families 0xE and
    /// 0xF route on the bottom byte, every other family is a single
    /// operation.
    fn exec(&mut self, op: Opcode) -> OchoResult<Flow> {
        let mut flow = Flow::Continue;

        match op.family() {
            0x0 => match op.n() {
                // 00E0 (CLS)
                //
                // Blank the frame buffer and tell the host to redraw.
                0x0 => {
                    op_trace("CLS", &self.cpu, op);

                    self.cpu.clear_display();
                    self.cpu.redraw = true;
                    self.cpu.pc += 2;
                    flow = Flow::Draw;
                }
                // 00EE (RET)
                //
                // Pop the caller's address and resume past its call.
                0xE => {
                    op_trace("RET", &self.cpu, op);

                    if self.cpu.sp == 0 {
                        return Err(OchoError::StackUnderflow);
                    }
                    self.cpu.sp -= 1;
                    self.cpu.pc = self.cpu.stack[self.cpu.sp] + 2;
                    flow = Flow::Jump;
                }
                _ => flow = self.skip_unknown(op),
            },
            // 1NNN (JP addr)
            0x1 => {
                op_trace("JP", &self.cpu, op);

                self.cpu.pc = op.nnn();
                flow = Flow::Jump;
            }
            // 2NNN (CALL addr)
            //
            // Remember where to return to, then jump to the subroutine.
            0x2 => {
                op_trace("CALL", &self.cpu, op);

                if self.cpu.sp == STACK_DEPTH {
                    return Err(OchoError::StackOverflow);
                }
                self.cpu.stack[self.cpu.sp] = self.cpu.pc;
                self.cpu.sp += 1;
                self.cpu.pc = op.nnn();
                flow = Flow::Jump;
            }
            // 3XNN (SE Vx, byte)
            //
            // Skip the next instruction when VX equals the immediate.
            0x3 => {
                op_trace("SE", &self.cpu, op);

                if self.cpu.registers[op.x()] == op.nn() {
                    self.cpu.pc += 4;
                } else {
                    self.cpu.pc += 2;
                }
            }
            // 4XNN (SNE Vx, byte)
            0x4 => {
                op_trace("SNE", &self.cpu, op);

                if self.cpu.registers[op.x()] != op.nn() {
                    self.cpu.pc += 4;
                } else {
                    self.cpu.pc += 2;
                }
            }
            // 5XY0 (SE Vx, Vy)
            0x5 => {
                op_trace("SE", &self.cpu, op);

                if self.cpu.registers[op.x()] == self.cpu.registers[op.y()] {
                    self.cpu.pc += 4;
                } else {
                    self.cpu.pc += 2;
                }
            }
            // 6XNN (LD Vx, byte)
            0x6 => {
                op_trace("LD", &self.cpu, op);

                self.cpu.registers[op.x()] = op.nn();
                self.cpu.pc += 2;
            }
            // 7XNN (ADD Vx, byte)
            //
            // Wrapping add. The flag register is left alone.
            0x7 => {
                op_trace("ADD", &self.cpu, op);

                let x = op.x();
                self.cpu.registers[x] = self.cpu.registers[x].wrapping_add(op.nn());
                self.cpu.pc += 2;
            }
            0x8 => flow = self.exec_math(op),
            // 9XY0 (SNE Vx, Vy)
            0x9 => {
                op_trace("SNE", &self.cpu, op);

                if self.cpu.registers[op.x()] != self.cpu.registers[op.y()] {
                    self.cpu.pc += 4;
                } else {
                    self.cpu.pc += 2;
                }
            }
            // ANNN (LD I, addr)
            0xA => {
                op_trace("LD I", &self.cpu, op);

                self.cpu.index = op.nnn();
                self.cpu.pc += 2;
            }
            // BNNN (JP V0, addr)
            //
            // Jump to the address plus V0.
            0xB => {
                op_trace("JP V0", &self.cpu, op);

                self.cpu.pc = op.nnn() + self.cpu.registers[0] as u16;
                flow = Flow::Jump;
            }
            // CXNN (RND Vx, byte)
            //
            // A random byte masked by the immediate.
            0xC => {
                op_trace("RND", &self.cpu, op);

                let byte: u8 = thread_rng().gen();
                self.cpu.registers[op.x()] = byte & op.nn();
                self.cpu.pc += 2;
            }
            // DXYN (DRW Vx, Vy, n)
            //
            // XOR an N row sprite from memory at I onto the display at
            // (VX, VY). Coordinates wrap around the edges. VF reports
            // whether any pixel was erased by the XOR.
            0xD => {
                op_trace("DRW", &self.cpu, op);

                let n = op.n() as usize;
                let base = self.cpu.span(self.cpu.index, n)?;
                let px = self.cpu.registers[op.x()] as usize;
                let py = self.cpu.registers[op.y()] as usize;
                let mut erased = false;

                for row in 0..n {
                    let byte = self.cpu.ram[base + row];
                    // bit 7 of a sprite row is its leftmost pixel
                    for col in 0..8 {
                        let d = ((py + row) & DISPLAY_HEIGHT_MASK) * DISPLAY_WIDTH
                            + ((px + col) & DISPLAY_WIDTH_MASK);
                        let old = self.cpu.display[d];
                        let new = (byte >> (7 - col)) & 1 != 0;

                        erased |= old && new;
                        self.cpu.display[d] = old ^ new;
                    }
                }

                self.cpu.registers[0xF] = erased as u8;
                self.cpu.redraw = true;
                self.cpu.pc += 2;
                flow = Flow::Draw;
            }
            0xE => match op.nn() {
                // EX9E (SKP Vx)
                //
                // Skip the next instruction when the key numbered by VX is
                // held.
                0x9E => {
                    op_trace("SKP", &self.cpu, op);

                    if self.cpu.key_pressed(self.cpu.registers[op.x()]) {
                        self.cpu.pc += 4;
                    } else {
                        self.cpu.pc += 2;
                    }
                }
                // EXA1 (SKNP Vx)
                0xA1 => {
                    op_trace("SKNP", &self.cpu, op);

                    if self.cpu.key_pressed(self.cpu.registers[op.x()]) {
                        self.cpu.pc += 2;
                    } else {
                        self.cpu.pc += 4;
                    }
                }
                _ => flow = self.skip_unknown(op),
            },
            0xF => flow = self.exec_misc(op)?,
            _ => flow = self.skip_unknown(op),
        }

        Ok(flow)
    }

    /// Arithmetic and logic, family 0x8, routed on the bottom nibble.
    ///
    /// Every operation here reads its operands before writing anything, so
    /// the flag is always computed from pre-instruction values. The flag
    /// write lands first; when VF is the destination the result write
    /// overwrites it.
    #[inline]
    fn exec_math(&mut self, op: Opcode) -> Flow {
        let (x, y) = (op.x(), op.y());

        match op.n() {
            // 8XY0 (LD Vx, Vy)
            0x0 => {
                op_trace("LD", &self.cpu, op);

                self.cpu.registers[x] = self.cpu.registers[y];
            }
            // 8XY1 (OR Vx, Vy)
            0x1 => {
                op_trace("OR", &self.cpu, op);

                self.cpu.registers[x] |= self.cpu.registers[y];
            }
            // 8XY2 (AND Vx, Vy)
            0x2 => {
                op_trace("AND", &self.cpu, op);

                self.cpu.registers[x] &= self.cpu.registers[y];
            }
            // 8XY3 (XOR Vx, Vy)
            0x3 => {
                op_trace("XOR", &self.cpu, op);

                self.cpu.registers[x] ^= self.cpu.registers[y];
            }
            // 8XY4 (ADD Vx, Vy)
            //
            // The 16-bit sum decides the carry, the wrapped 8-bit sum is
            // the result.
            0x4 => {
                op_trace("ADD", &self.cpu, op);

                let (a, b) = (self.cpu.registers[x], self.cpu.registers[y]);
                let sum = a as u16 + b as u16;
                self.cpu.registers[0xF] = (sum > 0xFF) as u8;
                self.cpu.registers[x] = sum as u8;
            }
            // 8XY5 (SUB Vx, Vy)
            //
            // VF is 1 when no borrow happens.
            0x5 => {
                op_trace("SUB", &self.cpu, op);

                let (a, b) = (self.cpu.registers[x], self.cpu.registers[y]);
                self.cpu.registers[0xF] = (a >= b) as u8;
                self.cpu.registers[x] = a.wrapping_sub(b);
            }
            // 8XY6 (SHR Vx)
            //
            // The shifted-out low bit lands in VF.
            0x6 => {
                op_trace("SHR", &self.cpu, op);

                let a = self.cpu.registers[x];
                self.cpu.registers[0xF] = a & 1;
                self.cpu.registers[x] = a >> 1;
            }
            // 8XY7 (SUBN Vx, Vy)
            //
            // Reversed subtraction: VY minus VX.
            0x7 => {
                op_trace("SUBN", &self.cpu, op);

                let (a, b) = (self.cpu.registers[x], self.cpu.registers[y]);
                self.cpu.registers[0xF] = (b >= a) as u8;
                self.cpu.registers[x] = b.wrapping_sub(a);
            }
            // 8XYE (SHL Vx)
            //
            // The shifted-out high bit lands in VF.
            0xE => {
                op_trace("SHL", &self.cpu, op);

                let a = self.cpu.registers[x];
                self.cpu.registers[0xF] = a >> 7;
                self.cpu.registers[x] = a << 1;
            }
            _ => return self.skip_unknown(op),
        }

        self.cpu.pc += 2;
        Flow::Continue
    }

    /// Timers, keypad waits and memory transfers, family 0xF, routed on
    /// the bottom byte.
    #[inline]
    fn exec_misc(&mut self, op: Opcode) -> OchoResult<Flow> {
        let x = op.x();

        match op.nn() {
            // FX07 (LD Vx, DT)
            0x07 => {
                op_trace("LD DT", &self.cpu, op);

                self.cpu.registers[x] = self.cpu.delay_timer;
            }
            // FX0A (LD Vx, K)
            //
            // Block until a key is held. With none held the program
            // counter stays put and the instruction re-executes next
            // cycle. The lowest numbered key wins.
            0x0A => {
                op_trace("LD K", &self.cpu, op);

                match self.cpu.first_key() {
                    Some(key) => self.cpu.registers[x] = key,
                    None => return Ok(Flow::KeyWait),
                }
            }
            // FX15 (LD DT, Vx)
            0x15 => {
                op_trace("LD DT", &self.cpu, op);

                self.cpu.delay_timer = self.cpu.registers[x];
            }
            // FX18 (LD ST, Vx)
            0x18 => {
                op_trace("LD ST", &self.cpu, op);

                self.cpu.sound_timer = self.cpu.registers[x];
            }
            // FX1E (ADD I, Vx)
            //
            // 16-bit wrapping add, no carry flag.
            0x1E => {
                op_trace("ADD I", &self.cpu, op);

                self.cpu.index = self.cpu.index.wrapping_add(self.cpu.registers[x] as u16);
            }
            // FX29 (LD F, Vx)
            //
            // Point I at the font glyph for the digit in VX. Glyphs are
            // packed from address 0, five bytes each.
            0x29 => {
                op_trace("LD F", &self.cpu, op);

                self.cpu.index = self.cpu.registers[x] as u16 * GLYPH_SIZE as u16;
            }
            // FX33 (LD B, Vx)
            //
            // Decimal digits of VX into memory at I, most significant
            // first.
            0x33 => {
                op_trace("LD B", &self.cpu, op);

                let base = self.cpu.span(self.cpu.index, 3)?;
                let value = self.cpu.registers[x];
                self.cpu.ram[base] = value / 100;
                self.cpu.ram[base + 1] = value / 10 % 10;
                self.cpu.ram[base + 2] = value % 10;
            }
            // FX55 (LD [I], Vx)
            //
            // Spill V0 through VX to memory at I. I lands one past the
            // written span.
            0x55 => {
                op_trace("LD [I]", &self.cpu, op);

                let base = self.cpu.span(self.cpu.index, x + 1)?;
                let registers = self.cpu.registers;
                self.cpu.ram[base..=base + x].copy_from_slice(&registers[..=x]);
                self.cpu.index += x as u16 + 1;
            }
            // FX65 (LD Vx, [I])
            //
            // Restore V0 through VX from memory at I. I lands one past the
            // read span.
            0x65 => {
                op_trace("LD [I]", &self.cpu, op);

                let base = self.cpu.span(self.cpu.index, x + 1)?;
                for offset in 0..=x {
                    self.cpu.registers[offset] = self.cpu.ram[base + offset];
                }
                self.cpu.index += x as u16 + 1;
            }
            _ => return Ok(self.skip_unknown(op)),
        }

        self.cpu.pc += 2;
        Ok(Flow::Continue)
    }

    /// Report an instruction word that maps to no operation and step over
    /// it, so one bad word cannot wedge the fetch loop.
    fn skip_unknown(&mut self, op: Opcode) -> Flow {
        log::warn!("unknown instruction word {op} at {:#06X}", self.cpu.pc);
        self.cpu.pc += 2;
        Flow::Unknown(op)
    }
}

/// Troubleshooting
#[doc(hidden)]
impl OchoVm {
    /// Render `count` bytes of the program region as hex words.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        let mut buf = String::new();
        let end = (PROG_START + count).min(MEM_SIZE - 1);

        let mut addr = PROG_START;
        while addr < end {
            writeln!(
                buf,
                "{:04X}: {:02X}{:02X}",
                addr,
                self.cpu.ram[addr],
                self.cpu.ram[addr + 1]
            )?;
            addr += 2;
        }

        Ok(buf)
    }

    /// Render the frame buffer as rows of `#` and `.`.
    pub fn dump_display(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                if self.cpu.display[y * DISPLAY_WIDTH + x] {
                    write!(buf, "#")?;
                } else {
                    write!(buf, ".")?;
                }
            }
            writeln!(buf)?;
        }

        Ok(buf)
    }

    /// Render the registers, pointers and timers.
    pub fn dump_registers(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();

        for (i, value) in self.cpu.registers.iter().enumerate() {
            writeln!(buf, "V{i:X}: {value:02X}")?;
        }
        writeln!(buf, "PC: {:04X}", self.cpu.pc)?;
        writeln!(buf, "I:  {:04X}", self.cpu.index)?;
        writeln!(buf, "SP: {}", self.cpu.sp)?;
        writeln!(buf, "DT: {:02X}", self.cpu.delay_timer)?;
        writeln!(buf, "ST: {:02X}", self.cpu.sound_timer)?;

        Ok(buf)
    }
}

/// Log one interpreted instruction when the `op_trace` feature is on.
#[cfg(feature = "op_trace")]
fn op_trace(name: &str, cpu: &OchoCpu, op: Opcode) {
    log::trace!("{:04X}: {name:6} {op}", cpu.pc);
}

#[cfg(not(feature = "op_trace"))]
fn op_trace(_: &str, _: &OchoCpu, _: Opcode) {}
