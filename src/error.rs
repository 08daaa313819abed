// error.rs
//
// Error types shared by the emulator core and the debug monitor.

use std::io;
use thiserror::Error;

/// Failures while tokenizing or evaluating a debugger expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("no match at position {position} in '{input}'")]
    Lex { position: usize, input: String },
    #[error("malformed expression: {0}")]
    Malformed(String),
    #[error("cannot convert '{0}' to a number")]
    Conversion(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("empty expression")]
    Empty,
}

/// Failures of the watchpoint pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WatchError {
    #[error("no free watchpoint (all {} slots in use)", crate::watchpoint::NR_WP)]
    PoolExhausted,
    #[error("no active watchpoint {0}")]
    NotFound(usize),
}

/// Faults raised while executing guest code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("invalid instruction 0x{inst:08x} at pc = 0x{pc:08x}")]
    InvalidInstruction { pc: u32, inst: u32 },
    #[error("memory fault: addr = 0x{addr:08x} width = {width}")]
    MemoryFault { addr: u32, width: usize },
}

/// Failures while loading a program image into guest memory.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("loading {path}: {source}")]
    Io { path: String, source: io::Error },
    #[error("image of {size} bytes does not fit in {capacity} bytes of guest memory")]
    TooLarge { size: usize, capacity: usize },
    #[error("image is empty")]
    Empty,
}

/// Anything a monitor command can fail with.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error(transparent)]
    Watch(#[from] WatchError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("bad argument: {0}")]
    Argument(String),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl MonitorError {
    /// Errors that end the command loop instead of being reported to the user.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MonitorError::Io(_))
    }
}
