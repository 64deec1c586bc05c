//! Lunatic Brain: a Brainfuck dialect with an auxiliary integer stack.
//!
//! This crate provides a small step-at-a-time interpreter that operates on a
//! fixed memory tape (default 202,000 cells) with a single data pointer.
//!
//! Features and behaviors:
//! - Memory tape of signed 32-bit cells, initialized to 0.
//! - The data pointer may wander off the tape; only opcodes that touch the
//!   current cell fail when it does.
//! - One stack shared by value opcodes (`^` `v`), pointer opcodes (`$` `*`) and
//!   jump opcodes (`i` `!`). Popping an empty stack is an error.
//! - Brackets scan to the first opposite bracket without counting nesting.
//! - Any byte outside the instruction set is ignored.
//! - I/O goes through injectable ports; the defaults use stdin/stdout.
//!
//! Quick start:
//!
//! ```no_run
//! use lunatic_brain::{run, Interpreter, Machine, RunOptions};
//!
//! let mut vm = Interpreter::new();
//! vm.load(b"++++++++[>++++++++<-]>+.");
//! run(&mut vm, &RunOptions::default()).expect("program should run");
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod ports;
pub mod repl;
pub mod runner;
pub mod tape;
pub mod theme;

pub use error::{RunError, RuntimeError, RuntimeErrorKind};
pub use interpreter::{Interpreter, Machine, Status, EOF_CELL, OPCODES};
pub use ports::{InputPort, NullInput, NullOutput, OutputPort, ReaderInput, SharedBuffer, WriterOutput};
pub use runner::{run, RunOptions, RunSummary};
pub use tape::{Tape, DEFAULT_MEMORY_SIZE};

/// Name shown in banners and help.
pub const DISPLAY_NAME: &str = "Lunatic Brain";

/// Crate version, shown by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
