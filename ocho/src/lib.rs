//! A CHIP-8 virtual machine.
//!
//! The machine is driven from outside: a host owns the run loop, calls
//! [`prelude::OchoVm::step`] once per cycle at whatever rate it chooses,
//! and wires the keypad, display and tone events to real devices.
pub mod constants;
mod cpu;
mod disasm;
mod error;
mod opcode;
mod vm;

pub mod prelude {
    pub use super::{
        disasm::Disassembler,
        error::{OchoError, OchoResult},
        opcode::Opcode,
        vm::{Cycle, Flow, OchoVm},
    };
}
