// monitor.rs
//
// Interactive debug monitor.
//
// Reads one command per line, dispatches on the first word and hands the
// rest of the line to the command as its argument string. Command failures
// are reported and the loop carries on; only a broken output stream ends it.

use crate::error::MonitorError;
use crate::execution::{Engine, RunState, StepStatus};
use crate::expressions::evaluate;
use crate::io_abstraction::LineSource;
use crate::memory::GuestMemory;
use crate::riscv::{EBREAK, Word};
use crate::watchpoint::{WATCH_WIDTH, WatchpointPool};
use crossterm::style::Stylize;
use std::io::Write;
use tracing::{debug, info};

pub const PROMPT: &str = "(riscmon) ";

/// `si` lists the executed instructions only when asked for fewer steps than this.
pub const SI_LIST_LIMIT: u64 = 10;

const FINISHED_NOTICE: &str =
    "Program execution has ended. To restart the program, exit the monitor and run again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cmd {
    Help,
    Continue,
    Quit,
    Step,
    Info,
    Examine,
    Print,
    Watch,
    Delete,
}

const COMMANDS: [(&str, &str, Cmd); 9] = [
    ("help", "Display information about all supported commands", Cmd::Help),
    ("c", "Continue the execution of the program", Cmd::Continue),
    ("q", "Exit the monitor", Cmd::Quit),
    ("si", "Step N instructions (default 1): si [N]", Cmd::Step),
    ("info", "Print registers or watchpoints: info r | info w", Cmd::Info),
    ("x", "Examine N words of memory: x N 0xADDR", Cmd::Examine),
    ("p", "Evaluate an expression: p EXPR", Cmd::Print),
    ("w", "Stop when the byte at EXPR changes: w EXPR", Cmd::Watch),
    ("d", "Delete watchpoint N: d N", Cmd::Delete),
];

type Result<T> = std::result::Result<T, MonitorError>;

pub struct Monitor<W: Write> {
    engine: Engine,
    pool: WatchpointPool,
    out: W,
    batch: bool,
    max_steps: Option<u64>,
    color: bool,
    quit_early: bool,
}

impl<W: Write> Monitor<W> {
    pub fn new(engine: Engine, out: W) -> Self {
        Self {
            engine,
            pool: WatchpointPool::new(),
            out,
            batch: false,
            max_steps: None,
            color: false,
            quit_early: false,
        }
    }

    pub fn with_batch(mut self, batch: bool) -> Self {
        self.batch = batch;
        self
    }

    /// Bound how many instructions a single `c` may execute.
    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn pool(&self) -> &WatchpointPool {
        &self.pool
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Run the session: a single `c` in batch mode, otherwise the command
    /// loop until `q` or end of input.
    pub fn run(&mut self, input: &mut dyn LineSource) -> Result<()> {
        if self.batch {
            self.cmd_continue()?;
            return Ok(());
        }
        self.main_loop(input)
    }

    pub fn main_loop(&mut self, input: &mut dyn LineSource) -> Result<()> {
        while let Some(line) = input.read_line(PROMPT)? {
            match self.execute_line(&line) {
                Ok(Control::Continue) => {}
                Ok(Control::Quit) => break,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => writeln!(self.out, "error: {}", err)?,
            }
        }
        Ok(())
    }

    /// Whether the process should report success on exit.
    pub fn exit_success(&self) -> bool {
        match self.engine.state() {
            RunState::Running => true,
            RunState::Ended(halt) => halt.is_good() || self.quit_early,
            RunState::Aborted(_) => false,
        }
    }

    pub fn execute_line(&mut self, line: &str) -> Result<Control> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Control::Continue);
        }
        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (line, ""),
        };

        let Some(&(_, _, cmd)) = COMMANDS.iter().find(|(n, _, _)| *n == name) else {
            writeln!(self.out, "Unknown command '{}'", name)?;
            return Ok(Control::Continue);
        };
        debug!(command = name, args, "dispatch");

        match cmd {
            Cmd::Help => self.cmd_help(args),
            Cmd::Continue => self.cmd_continue(),
            Cmd::Quit => self.cmd_quit(),
            Cmd::Step => self.cmd_step(args),
            Cmd::Info => self.cmd_info(args),
            Cmd::Examine => self.cmd_examine(args),
            Cmd::Print => self.cmd_print(args),
            Cmd::Watch => self.cmd_watch(args),
            Cmd::Delete => self.cmd_delete(args),
        }
    }

    fn cmd_help(&mut self, args: &str) -> Result<Control> {
        if args.is_empty() {
            for (name, description, _) in COMMANDS.iter() {
                writeln!(self.out, "{} - {}", name, description)?;
            }
            return Ok(Control::Continue);
        }
        match COMMANDS.iter().find(|(n, _, _)| *n == args) {
            Some((name, description, _)) => writeln!(self.out, "{} - {}", name, description)?,
            None => writeln!(self.out, "Unknown command '{}'", args)?,
        }
        Ok(Control::Continue)
    }

    fn cmd_continue(&mut self) -> Result<Control> {
        if self.engine.is_finished() {
            writeln!(self.out, "{}", FINISHED_NOTICE)?;
            return Ok(Control::Continue);
        }

        let mut taken: u64 = 0;
        loop {
            if self.max_steps.is_some_and(|max| taken >= max) {
                writeln!(self.out, "stopped after {} steps at pc = 0x{:08x}", taken, self.engine.pc())?;
                break;
            }
            let status = self.engine.step();
            taken += 1;
            if status != StepStatus::Continued {
                self.report(status)?;
                break;
            }
            if let Some(trigger) = self.pool.check(self.engine.memory())? {
                writeln!(self.out, "Watchpoint {}: 0x{:08x}", trigger.id, trigger.addr)?;
                writeln!(self.out, "  Old value = 0x{:08x}", trigger.old)?;
                writeln!(self.out, "  New value = 0x{:08x}", trigger.new)?;
                break;
            }
        }
        Ok(Control::Continue)
    }

    fn cmd_quit(&mut self) -> Result<Control> {
        if self.engine.is_finished() {
            return Ok(Control::Quit);
        }
        // stop the guest through a trap planted at the reset vector
        let reset = self.engine.reset_vector();
        self.engine.memory_mut().write(reset, 4, EBREAK)?;
        self.engine.set_pc(reset);
        let status = self.engine.step();
        info!(?status, "guest stopped on quit");
        self.quit_early = true;
        Ok(Control::Quit)
    }

    fn cmd_step(&mut self, args: &str) -> Result<Control> {
        let n = if args.is_empty() {
            1
        } else {
            args.parse::<u64>()
                .map_err(|_| MonitorError::Argument(format!("invalid step count '{}'", args)))?
        };
        if self.engine.is_finished() {
            writeln!(self.out, "{}", FINISHED_NOTICE)?;
            return Ok(Control::Continue);
        }

        let before = self.engine.steps();
        let status = self.engine.run(Some(n));
        let taken = (self.engine.steps() - before) as usize;

        if n < SI_LIST_LIMIT {
            let recent: Vec<_> = self.engine.recent().copied().collect();
            for entry in &recent[recent.len().saturating_sub(taken)..] {
                writeln!(self.out, "{}", entry)?;
            }
        }
        self.report(status)?;
        Ok(Control::Continue)
    }

    fn cmd_info(&mut self, args: &str) -> Result<Control> {
        match args {
            "r" => writeln!(self.out, "{}", self.engine.cpu())?,
            "w" => {
                if self.pool.is_empty() {
                    writeln!(self.out, "No watchpoints.")?;
                } else {
                    writeln!(self.out, "Num  Address     Value       What")?;
                    for wp in self.pool.list() {
                        writeln!(self.out, "{:<4} 0x{:08x}  0x{:08x}  {}", wp.id, wp.addr, wp.value, wp.expr)?;
                    }
                }
            }
            _ => return Err(MonitorError::Argument("usage: info r | info w".to_string())),
        }
        Ok(Control::Continue)
    }

    fn cmd_examine(&mut self, args: &str) -> Result<Control> {
        let usage = || MonitorError::Argument("usage: x N 0xADDR".to_string());
        let mut parts = args.split_whitespace();
        let (Some(count), Some(addr), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(usage());
        };
        let count = count.parse::<u32>().map_err(|_| usage())?;
        let addr = addr
            .strip_prefix("0x")
            .or_else(|| addr.strip_prefix("0X"))
            .and_then(|hex| Word::from_str_radix(hex, 16).ok())
            .ok_or_else(usage)?;

        for i in 0..count {
            let at = addr.wrapping_add(i.wrapping_mul(4));
            let value = self.engine.memory().read(at, 4)?;
            writeln!(self.out, "0x{:08x}: 0x{:08x}", at, value)?;
        }
        Ok(Control::Continue)
    }

    fn cmd_print(&mut self, args: &str) -> Result<Control> {
        let value = evaluate(args)?;
        writeln!(self.out, "{} (0x{:08x})", value as i32, value)?;
        Ok(Control::Continue)
    }

    fn cmd_watch(&mut self, args: &str) -> Result<Control> {
        let addr = evaluate(args)?;
        let value = self.engine.memory().read(addr, WATCH_WIDTH)?;
        let id = self.pool.allocate()?;
        self.pool.arm(id, addr, value, args)?;
        writeln!(self.out, "Watchpoint {}: 0x{:08x} = 0x{:08x}", id, addr, value)?;
        Ok(Control::Continue)
    }

    fn cmd_delete(&mut self, args: &str) -> Result<Control> {
        let id = args
            .parse::<usize>()
            .map_err(|_| MonitorError::Argument(format!("invalid watchpoint number '{}'", args)))?;
        self.pool.release(id)?;
        writeln!(self.out, "Deleted watchpoint {}", id)?;
        Ok(Control::Continue)
    }

    fn report(&mut self, status: StepStatus) -> Result<()> {
        match status {
            StepStatus::Continued => {}
            StepStatus::Halted(halt) => {
                let verdict = if halt.is_good() { "GOOD" } else { "BAD" };
                let msg = format!("riscmon: HIT {} TRAP at pc = 0x{:08x}", verdict, halt.pc);
                let msg = match (self.color, halt.is_good()) {
                    (false, _) => msg,
                    (true, true) => msg.green().to_string(),
                    (true, false) => msg.red().to_string(),
                };
                writeln!(self.out, "{}", msg)?;
            }
            StepStatus::Faulted(err) => {
                let msg = format!("riscmon: ABORT at pc = 0x{:08x}: {}", self.engine.pc(), err);
                let msg = if self.color { msg.red().to_string() } else { msg };
                writeln!(self.out, "{}", msg)?;
                let count = self.engine.recent().count();
                for (i, entry) in self.engine.recent().enumerate() {
                    let marker = if i + 1 == count { "-->" } else { "   " };
                    writeln!(self.out, "{} {}", marker, entry)?;
                }
            }
        }
        Ok(())
    }
}
