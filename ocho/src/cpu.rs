//! Machine state: registers, memory, timers, display and keypad.
use crate::{
    constants::*,
    error::{OchoError, OchoResult},
    opcode::Opcode,
};

/// Complete state of one machine.
///
/// The interpreter in [`crate::vm`] is the only writer. Hosts reach the
/// state through the interpreter's API, never directly.
pub(crate) struct OchoCpu {
    /// Program counter, pointing at the next instruction word.
    pub(crate) pc: u16,
    /// Stack pointer, one past the top of the call stack.
    pub(crate) sp: usize,
    /// General purpose registers V0-VF.
    ///
    /// VF is also the flag register. Arithmetic carries, borrows, shifted
    /// bits and sprite collisions land in register 15, clobbering whatever
    /// a program stored there.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// Index register `I`, the memory pointer used by draw, store and load
    /// instructions. Addresses are 12 bits but the register holds a full
    /// 16-bit value; out of range values fault when used, they are never
    /// masked.
    pub(crate) index: Address,
    /// Counts down to zero, one tick per cycle. Programs read it to measure
    /// time.
    pub(crate) delay_timer: u8,
    /// Counts down to zero, one tick per cycle. The tick that takes it from
    /// one to zero asks the host to sound a tone.
    pub(crate) sound_timer: u8,

    /// Main memory. The font lives at the bottom, programs at
    /// [`PROG_START`].
    pub(crate) ram: Box<[u8; MEM_SIZE]>,
    /// Return addresses of active subroutine calls.
    pub(crate) stack: [Address; STACK_DEPTH],
    /// Monochrome frame buffer. Pixel `(x, y)` lives at
    /// `y * DISPLAY_WIDTH + x`.
    pub(crate) display: Box<[bool; DISPLAY_BUFFER_SIZE]>,

    /// Keypad state, written by the host between cycles.
    pub(crate) keys: [bool; KEY_COUNT],
    /// Raised whenever the frame buffer changes, lowered by the host once
    /// it has redrawn.
    pub(crate) redraw: bool,
}

impl Default for OchoCpu {
    fn default() -> Self {
        let mut ram = Box::new([0_u8; MEM_SIZE]);
        ram[..FONT.len()].copy_from_slice(&FONT);

        OchoCpu {
            pc: PROG_START as u16,
            sp: 0,
            registers: [0; REGISTER_COUNT],
            index: 0,
            delay_timer: 0,
            sound_timer: 0,
            ram,
            stack: [0; STACK_DEPTH],
            display: Box::new([false; DISPLAY_BUFFER_SIZE]),
            keys: [false; KEY_COUNT],
            redraw: false,
        }
    }
}

impl OchoCpu {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// Return the machine to its power-on state.
    ///
    /// Memory is cleared and the font reloaded, registers, timers and the
    /// frame buffer are zeroed, and the program counter points at the start
    /// of the program region.
    pub(crate) fn reset(&mut self) {
        self.ram.fill(0);
        self.ram[..FONT.len()].copy_from_slice(&FONT);
        self.registers = [0; REGISTER_COUNT];
        self.stack = [0; STACK_DEPTH];
        self.display.fill(false);
        self.keys = [false; KEY_COUNT];
        self.pc = PROG_START as u16;
        self.sp = 0;
        self.index = 0;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.redraw = false;
    }

    /// Read the instruction word at the program counter.
    ///
    /// A program counter within one byte of the end of memory cannot hold a
    /// whole word and is an address fault.
    pub(crate) fn fetch(&self) -> OchoResult<Opcode> {
        let pc = self.pc as usize;
        if pc + 1 >= MEM_SIZE {
            return Err(OchoError::AddressFault { addr: self.pc });
        }
        Ok(Opcode::from_bytes(self.ram[pc], self.ram[pc + 1]))
    }

    /// Check that `len` bytes starting at `addr` sit inside memory,
    /// returning the span's base as an index.
    ///
    /// Instructions that touch several bytes call this before touching any
    /// of them, so a faulting instruction never leaves a partial write.
    pub(crate) fn span(&self, addr: Address, len: usize) -> OchoResult<usize> {
        let base = addr as usize;
        if base + len > MEM_SIZE {
            return Err(OchoError::AddressFault { addr });
        }
        Ok(base)
    }

    pub(crate) fn clear_display(&mut self) {
        self.display.fill(false);
    }

    /// Press or release one key. Key ids beyond the pad are ignored.
    pub(crate) fn set_key(&mut self, key: u8, pressed: bool) {
        if let Some(cell) = self.keys.get_mut(key as usize) {
            *cell = pressed;
        }
    }

    /// Whether `key` is held. Ids beyond the pad read as released.
    pub(crate) fn key_pressed(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }

    /// The lowest numbered key currently held, if any.
    pub(crate) fn first_key(&self) -> Option<u8> {
        self.keys.iter().position(|&held| held).map(|key| key as u8)
    }

    pub(crate) fn clear_keys(&mut self) {
        self.keys = [false; KEY_COUNT];
    }

    /// Count the delay timer down, stopping at zero.
    pub(crate) fn tick_delay(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
    }

    /// Count the sound timer down, stopping at zero.
    ///
    /// Returns true on the tick that exhausts the timer, which is the
    /// host's cue to sound its tone.
    pub(crate) fn tick_sound(&mut self) -> bool {
        let expiring = self.sound_timer == 1;
        self.sound_timer = self.sound_timer.saturating_sub(1);
        expiring
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_font_resident_from_address_zero() {
        let cpu = OchoCpu::new();

        assert_eq!(&cpu.ram[..FONT.len()], &FONT);
        assert_eq!(cpu.pc, PROG_START as u16);
    }

    #[test]
    fn test_fetch_is_big_endian() {
        let mut cpu = OchoCpu::new();
        cpu.ram[PROG_START] = 0x6A;
        cpu.ram[PROG_START + 1] = 0x02;

        assert_eq!(cpu.fetch(), Ok(Opcode::from(0x6A02)));
    }

    #[test]
    fn test_fetch_at_end_of_memory_faults() {
        let mut cpu = OchoCpu::new();
        cpu.pc = (MEM_SIZE - 1) as u16;

        assert_eq!(cpu.fetch(), Err(OchoError::AddressFault { addr: 0xFFF }));
    }

    #[test]
    fn test_span_bounds() {
        let cpu = OchoCpu::new();

        assert_eq!(cpu.span(0xFFD, 3), Ok(0xFFD));
        assert_eq!(
            cpu.span(0xFFE, 3),
            Err(OchoError::AddressFault { addr: 0xFFE })
        );
        // the index register can carry values past the address space
        assert_eq!(
            cpu.span(0x8000, 1),
            Err(OchoError::AddressFault { addr: 0x8000 })
        );
    }

    #[test]
    fn test_key_state() {
        let mut cpu = OchoCpu::new();

        cpu.set_key(0x5, true);
        assert!(cpu.key_pressed(0x5));
        assert!(!cpu.key_pressed(0x6));
        assert_eq!(cpu.first_key(), Some(0x5));

        cpu.set_key(0x2, true);
        assert_eq!(cpu.first_key(), Some(0x2));

        cpu.set_key(0x2, false);
        assert_eq!(cpu.first_key(), Some(0x5));

        // ids past the pad are ignored rather than wrapped
        cpu.set_key(0xFF, true);
        assert!(!cpu.key_pressed(0xFF));

        cpu.clear_keys();
        assert_eq!(cpu.first_key(), None);
    }

    #[test]
    fn test_timers_stop_at_zero() {
        let mut cpu = OchoCpu::new();
        cpu.delay_timer = 2;
        cpu.sound_timer = 1;

        cpu.tick_delay();
        assert_eq!(cpu.delay_timer, 1);
        assert!(cpu.tick_sound(), "exhausting the sound timer cues the tone");
        assert_eq!(cpu.sound_timer, 0);

        cpu.tick_delay();
        cpu.tick_delay();
        assert_eq!(cpu.delay_timer, 0);
        assert!(!cpu.tick_sound());
        assert_eq!(cpu.sound_timer, 0);
    }

    #[test]
    fn test_reset_reloads_font_and_clears_state() {
        let mut cpu = OchoCpu::new();
        cpu.ram[0] = 0xAA;
        cpu.ram[PROG_START] = 0xBB;
        cpu.registers[3] = 7;
        cpu.display[0] = true;
        cpu.pc = 0x400;
        cpu.sound_timer = 9;

        cpu.reset();

        assert_eq!(&cpu.ram[..FONT.len()], &FONT);
        assert_eq!(cpu.ram[PROG_START], 0);
        assert_eq!(cpu.registers[3], 0);
        assert!(!cpu.display[0]);
        assert_eq!(cpu.pc, PROG_START as u16);
        assert_eq!(cpu.sound_timer, 0);
    }
}
