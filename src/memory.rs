// memory.rs
//
// Guest physical memory: a flat little-endian byte array mapped at a fixed base.

use crate::error::ExecError;
use crate::riscv::Word;

/// Start of guest physical memory; also the reset vector.
pub const MEMORY_BASE: Word = 0x8000_0000;

/// Default guest memory size (128 MiB).
pub const DEFAULT_MEMORY_SIZE: u32 = 0x0800_0000;

pub trait GuestMemory {
    fn read(&self, addr: Word, width: usize) -> Result<Word, ExecError>;
    fn write(&mut self, addr: Word, width: usize, value: Word) -> Result<(), ExecError>;
}

pub struct PhysicalMemory {
    data: Vec<u8>,
    base: Word,
}

impl PhysicalMemory {
    pub fn new(base: Word, size: u32) -> Self {
        Self { data: vec![0; size as usize], base }
    }

    pub fn base(&self) -> Word {
        self.base
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Copy `bytes` into memory starting at `addr`.
    pub fn load_bytes(&mut self, addr: Word, bytes: &[u8]) -> Result<(), ExecError> {
        let offset = self.offset(addr, bytes.len())?;
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn offset(&self, addr: Word, width: usize) -> Result<usize, ExecError> {
        let fault = ExecError::MemoryFault { addr, width };
        let offset = addr.checked_sub(self.base).ok_or(fault)? as usize;
        match offset.checked_add(width) {
            Some(end) if end <= self.data.len() => Ok(offset),
            _ => Err(fault),
        }
    }
}

fn check_width(addr: Word, width: usize) -> Result<(), ExecError> {
    match width {
        1 | 2 | 4 => Ok(()),
        _ => Err(ExecError::MemoryFault { addr, width }),
    }
}

impl GuestMemory for PhysicalMemory {
    fn read(&self, addr: Word, width: usize) -> Result<Word, ExecError> {
        check_width(addr, width)?;
        let offset = self.offset(addr, width)?;
        let mut raw = [0u8; 4];
        raw[..width].copy_from_slice(&self.data[offset..offset + width]);
        Ok(Word::from_le_bytes(raw))
    }

    fn write(&mut self, addr: Word, width: usize, value: Word) -> Result<(), ExecError> {
        check_width(addr, width)?;
        let offset = self.offset(addr, width)?;
        self.data[offset..offset + width].copy_from_slice(&value.to_le_bytes()[..width]);
        Ok(())
    }
}
