//! Constant values describing the machine.

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 0x10; // 16

/// Total size of addressable memory.
pub const MEM_SIZE: usize = 0x1000; // 4096

/// First address of the program region. The space below it was reserved
/// for the interpreter on the original hardware; here it holds the font.
pub const PROG_START: usize = 0x200; // 512

/// Largest program image the loader accepts.
pub const PROG_CAPACITY: usize = MEM_SIZE - PROG_START;

/// Nesting levels available in the call stack.
pub const STACK_DEPTH: usize = 16;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const DISPLAY_BUFFER_SIZE: usize = DISPLAY_WIDTH * DISPLAY_HEIGHT;

/// Bit masks that wrap sprite coordinates around the display edges.
pub const DISPLAY_WIDTH_MASK: usize = DISPLAY_WIDTH - 1;
pub const DISPLAY_HEIGHT_MASK: usize = DISPLAY_HEIGHT - 1;

/// Number of keys on the hexadecimal keypad.
pub const KEY_COUNT: usize = 16;

/// Size of one font glyph in bytes.
pub const GLYPH_SIZE: usize = 5;

/// Sprites for the hexadecimal digits, resident in memory from address 0.
///
/// Each glyph is five rows of eight pixels, drawn from the high bits, so
/// only the left half of each row is used.
#[rustfmt::skip]
pub const FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Type for storing the 12-bit memory addresses.
pub type Address = u16;
