use clap::Parser;
use crossterm::tty::IsTty;
use riscmon::config::Config;
use riscmon::execution::Engine;
use riscmon::io_abstraction::StdinLines;
use riscmon::loader::image_or_default;
use riscmon::monitor::Monitor;
use std::error::Error;
use std::fs::File;
use std::io;
use std::path::Path;
use std::process;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = Config::parse();

    if let Err(err) = init_logging(config.log.as_deref()) {
        eprintln!("riscmon: {}", err);
        process::exit(1);
    }

    match run(&config) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(err) => {
            eprintln!("riscmon: {}", err);
            process::exit(1);
        }
    }
}

fn init_logging(log: Option<&Path>) -> io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    match log {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init(),
    }
    Ok(())
}

/// Load the image, run the monitor, and report whether the session ended well.
fn run(config: &Config) -> Result<bool, Box<dyn Error>> {
    let image = image_or_default(config.image.as_deref(), config.memory_size as usize)?;
    let engine = Engine::builder().with_memory_size(config.memory_size).with_image(&image).build()?;
    info!(
        "guest memory 0x{:08x}..0x{:08x}, image {} bytes",
        engine.memory().base(),
        engine.memory().base() as u64 + engine.memory().size() as u64,
        image.len()
    );

    let stdout = io::stdout();
    let color = stdout.is_tty();
    let mut monitor = Monitor::new(engine, stdout.lock())
        .with_batch(config.batch)
        .with_max_steps(config.max_steps)
        .with_color(color);
    monitor.run(&mut StdinLines::new())?;
    Ok(monitor.exit_success())
}
