pub mod config;
pub mod decoder;
pub mod error;
pub mod execution;
pub mod execution_context;
pub mod expressions;
pub mod io_abstraction;
pub mod loader;
pub mod memory;
pub mod monitor;
pub mod riscv;
pub mod tokenizer;
pub mod watchpoint;


#[cfg(test)]
mod expressions_tests;
#[cfg(test)]
mod tokenizer_tests;
#[cfg(test)]
mod watchpoint_tests;
