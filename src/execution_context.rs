use crate::error::ExecError;
use crate::riscv::Word;

/// What an instruction's bound action may touch.
pub trait ExecutionContext {
    fn read_register(&self, reg: usize) -> Word;
    fn write_register(&mut self, reg: usize, value: Word);
    fn read_memory(&mut self, addr: Word, width: usize) -> Result<Word, ExecError>;
    fn write_memory(&mut self, addr: Word, width: usize, value: Word) -> Result<(), ExecError>;
}

#[cfg(test)]
pub struct TestExecutionContext {
    pub registers: [Word; 32],
    pub memory: std::collections::HashMap<Word, u8>,
}

#[cfg(test)]
impl TestExecutionContext {
    pub fn new() -> Self {
        Self { registers: [0; 32], memory: std::collections::HashMap::new() }
    }

    pub fn with_register(mut self, reg: usize, value: Word) -> Self {
        self.registers[reg] = value;
        self
    }

    pub fn with_memory(mut self, addr: Word, data: &[u8]) -> Self {
        for (i, &byte) in data.iter().enumerate() {
            self.memory.insert(addr + i as Word, byte);
        }
        self
    }
}

#[cfg(test)]
impl Default for TestExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl ExecutionContext for TestExecutionContext {
    fn read_register(&self, reg: usize) -> Word {
        self.registers[reg]
    }

    fn write_register(&mut self, reg: usize, value: Word) {
        self.registers[reg] = value;
    }

    fn read_memory(&mut self, addr: Word, width: usize) -> Result<Word, ExecError> {
        let mut value = 0;
        for i in 0..width {
            match self.memory.get(&(addr + i as Word)) {
                Some(&byte) => value |= (byte as Word) << (8 * i),
                None => return Err(ExecError::MemoryFault { addr, width }),
            }
        }
        Ok(value)
    }

    fn write_memory(&mut self, addr: Word, width: usize, value: Word) -> Result<(), ExecError> {
        for (i, byte) in value.to_le_bytes()[..width].iter().enumerate() {
            self.memory.insert(addr + i as Word, *byte);
        }
        Ok(())
    }
}
