use crate::decoder::{Decode, Flow, InstructionDecoder};
use crate::error::ExecError;
use crate::execution_context::ExecutionContext;
use crate::memory::{DEFAULT_MEMORY_SIZE, GuestMemory, MEMORY_BASE, PhysicalMemory};
use crate::riscv::{INST_LEN, R, Word, ZERO};
use std::collections::VecDeque;
use std::fmt;
use tracing::{info, trace, warn};

/// Number of recently executed instructions kept for post-mortem display.
pub const TRACE_RING_SIZE: usize = 16;

pub struct CpuState {
    gpr: [Word; 32],
    pc: Word,
}

impl CpuState {
    pub fn new(pc: Word) -> Self {
        Self { gpr: [0; 32], pc }
    }

    pub fn get_reg(&self, reg: usize) -> Word {
        self.gpr[reg]
    }

    pub fn set_reg(&mut self, reg: usize, value: Word) {
        self.gpr[reg] = value;
    }

    pub fn pc(&self) -> Word {
        self.pc
    }

    pub fn set_pc(&mut self, pc: Word) {
        self.pc = pc;
    }
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in R.iter().zip(self.gpr.iter()) {
            writeln!(f, "{:<4} 0x{:08x}  {}", name, value, *value as i32)?;
        }
        write!(f, "pc   0x{:08x}", self.pc)
    }
}

/// How a guest program stopped at an `ebreak`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Halt {
    pub pc: Word,
    pub code: Word,
}

impl Halt {
    pub fn is_good(&self) -> bool {
        self.code == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Continued,
    Halted(Halt),
    Faulted(ExecError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Ended(Halt),
    Aborted(ExecError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEntry {
    pub pc: Word,
    pub inst: Word,
    pub mnemonic: &'static str,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.inst.to_le_bytes();
        write!(
            f,
            "0x{:08x}: {:02x} {:02x} {:02x} {:02x}  {}",
            self.pc, b[3], b[2], b[1], b[0], self.mnemonic
        )
    }
}

pub struct Engine {
    cpu: CpuState,
    memory: PhysicalMemory,
    reset_vector: Word,
    state: RunState,
    trace: VecDeque<TraceEntry>,
    steps: u64,
}

impl Engine {
    pub fn new(memory: PhysicalMemory, reset_vector: Word) -> Self {
        Self {
            cpu: CpuState::new(reset_vector),
            memory,
            reset_vector,
            state: RunState::Running,
            trace: VecDeque::with_capacity(TRACE_RING_SIZE),
            steps: 0,
        }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Execute one instruction at the current pc.
    ///
    /// Once the program has halted or faulted nothing more is executed and
    /// the terminal status is returned again.
    pub fn step(&mut self) -> StepStatus {
        match self.state {
            RunState::Ended(halt) => return StepStatus::Halted(halt),
            RunState::Aborted(err) => return StepStatus::Faulted(err),
            RunState::Running => {}
        }

        let pc = self.cpu.pc();
        let inst = match self.memory.read(pc, INST_LEN as usize) {
            Ok(inst) => inst,
            Err(err) => return self.abort(err),
        };
        self.record(pc, inst);

        let mut s = Decode::new(pc, inst);
        let flow = match InstructionDecoder::decode(&s, &*self) {
            Ok(decoded) => decoded.execute(&mut s, self),
            Err(err) => Err(err),
        };
        self.steps += 1;

        match flow {
            Ok(Flow::Next) => {
                self.cpu.set_pc(s.dnpc);
                StepStatus::Continued
            }
            Ok(Flow::Halt { code }) => {
                self.cpu.set_pc(s.dnpc);
                let halt = Halt { pc, code };
                info!("guest halted at pc = 0x{:08x} with code {} after {} steps", pc, code, self.steps);
                self.state = RunState::Ended(halt);
                StepStatus::Halted(halt)
            }
            Err(err) => self.abort(err),
        }
    }

    /// Execute up to `n` instructions (`None` for no limit), stopping early on
    /// a halt or fault. Returns the status of the last step taken.
    pub fn run(&mut self, n: Option<u64>) -> StepStatus {
        let mut status = StepStatus::Continued;
        let mut taken = 0;
        while n.is_none_or(|n| taken < n) {
            status = self.step();
            taken += 1;
            if status != StepStatus::Continued {
                break;
            }
        }
        status
    }

    fn abort(&mut self, err: ExecError) -> StepStatus {
        // register zero stays hardwired even when an action fails midway
        self.cpu.set_reg(ZERO, 0);
        warn!(%err, steps = self.steps, "guest aborted");
        self.state = RunState::Aborted(err);
        StepStatus::Faulted(err)
    }

    fn record(&mut self, pc: Word, inst: Word) {
        let entry = TraceEntry { pc, inst, mnemonic: InstructionDecoder::mnemonic(inst) };
        trace!("{}", entry);
        if self.trace.len() == TRACE_RING_SIZE {
            self.trace.pop_front();
        }
        self.trace.push_back(entry);
    }

    pub fn is_finished(&self) -> bool {
        self.state != RunState::Running
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn cpu(&self) -> &CpuState {
        &self.cpu
    }

    pub fn pc(&self) -> Word {
        self.cpu.pc()
    }

    pub fn set_pc(&mut self, pc: Word) {
        self.cpu.set_pc(pc);
    }

    pub fn get_reg(&self, reg: usize) -> Word {
        self.cpu.get_reg(reg)
    }

    pub fn memory(&self) -> &PhysicalMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut PhysicalMemory {
        &mut self.memory
    }

    pub fn reset_vector(&self) -> Word {
        self.reset_vector
    }

    /// Recently executed instructions, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &TraceEntry> {
        self.trace.iter()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl ExecutionContext for Engine {
    fn read_register(&self, reg: usize) -> Word {
        self.cpu.get_reg(reg)
    }

    fn write_register(&mut self, reg: usize, value: Word) {
        self.cpu.set_reg(reg, value);
    }

    fn read_memory(&mut self, addr: Word, width: usize) -> Result<Word, ExecError> {
        self.memory.read(addr, width)
    }

    fn write_memory(&mut self, addr: Word, width: usize, value: Word) -> Result<(), ExecError> {
        self.memory.write(addr, width, value)
    }
}

pub struct EngineBuilder {
    base: Word,
    memory_size: u32,
    image: Vec<u8>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self { base: MEMORY_BASE, memory_size: DEFAULT_MEMORY_SIZE, image: Vec::new() }
    }

    pub fn with_memory_size(mut self, size: u32) -> Self {
        self.memory_size = size;
        self
    }

    pub fn with_image(mut self, image: &[u8]) -> Self {
        self.image = image.to_vec();
        self
    }

    /// Build an image from instruction words laid out from the reset vector.
    pub fn with_program(mut self, words: &[Word]) -> Self {
        self.image = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self
    }

    pub fn build(self) -> Result<Engine, ExecError> {
        let mut memory = PhysicalMemory::new(self.base, self.memory_size);
        memory.load_bytes(self.base, &self.image)?;
        Ok(Engine::new(memory, self.base))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
