//! Result and error types.
use std::fmt::{self, Display, Formatter};

use crate::constants::PROG_CAPACITY;

pub type OchoResult<T> = std::result::Result<T, OchoError>;

/// Faults raised by the interpreter.
///
/// All of them leave the machine in the state it had when the fault was
/// detected; a faulting instruction performs no partial writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OchoError {
    /// A memory access would touch bytes outside the 4 KB address space.
    AddressFault { addr: u16 },
    /// A subroutine call nested deeper than the call stack.
    StackOverflow,
    /// A return executed with no caller on the stack.
    StackUnderflow,
    /// The loaded image does not fit in the program region.
    ProgramTooLarge { size: usize },
}

impl Display for OchoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressFault { addr } => {
                write!(f, "address fault: {addr:#06X} is outside addressable memory")
            }
            Self::StackOverflow => write!(f, "call stack overflow"),
            Self::StackUnderflow => write!(f, "return with no caller on the stack"),
            Self::ProgramTooLarge { size } => write!(
                f,
                "program of {size} bytes does not fit in the {PROG_CAPACITY} byte program region"
            ),
        }
    }
}

impl std::error::Error for OchoError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            OchoError::AddressFault { addr: 0xFFF }.to_string(),
            "address fault: 0x0FFF is outside addressable memory"
        );
        assert_eq!(
            OchoError::ProgramTooLarge { size: 4000 }.to_string(),
            "program of 4000 bytes does not fit in the 3584 byte program region"
        );
    }
}
