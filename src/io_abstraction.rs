use crossterm::tty::IsTty;
use std::io::{self, BufRead, Write};

/// Where the monitor gets its command lines from.
pub trait LineSource {
    /// Next line without its terminator, or `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Lines from standard input. The prompt is only shown when both ends are a
/// terminal so piped sessions produce clean output.
pub struct StdinLines {
    interactive: bool,
}

impl StdinLines {
    pub fn new() -> Self {
        Self { interactive: io::stdin().is_tty() && io::stdout().is_tty() }
    }
}

impl Default for StdinLines {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for StdinLines {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if self.interactive {
            let mut out = io::stdout().lock();
            out.write_all(prompt.as_bytes())?;
            out.flush()?;
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

#[cfg(test)]
pub struct ScriptedLines {
    pub lines: std::collections::VecDeque<String>,
    pub prompts: usize,
}

#[cfg(test)]
impl ScriptedLines {
    pub fn new(lines: &[&str]) -> Self {
        Self { lines: lines.iter().map(|s| s.to_string()).collect(), prompts: 0 }
    }
}

#[cfg(test)]
impl LineSource for ScriptedLines {
    fn read_line(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        self.prompts += 1;
        Ok(self.lines.pop_front())
    }
}
