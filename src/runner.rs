//! Driver loop: reset a [`Machine`] and step it until it halts or faults.
//!
//! The interpreter itself has no notion of limits or cancellation. The driver
//! bounds a run by refusing to call `step` again once the step budget is spent
//! or the cancel flag is raised.

use std::io::{self, Write};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc,
};
use std::thread;
use std::time::Duration;

use crate::error::RunError;
use crate::interpreter::{Interpreter, Machine, Status};
use crate::tape::Tape;

/// Controls for a single run.
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Maximum number of instructions to execute.
    pub max_steps: Option<u64>,
    /// Checked before every step; when set the run ends with [`RunError::Cancelled`].
    pub cancel: Option<Arc<AtomicBool>>,
    /// Emit one table row per executed instruction.
    pub trace: bool,
}

impl RunOptions {
    pub fn new(max_steps: Option<u64>, cancel: Option<Arc<AtomicBool>>) -> Self {
        Self { max_steps, cancel, trace: false }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

/// What a clean run looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Instructions executed before `Halt`.
    pub steps: u64,
}

/// Run `machine` from a fresh reset, writing any trace table to stdout.
///
/// Stdout is locked per write only, so a machine blocked on input holds no
/// lock other threads need.
pub fn run<M: Machine>(machine: &mut M, options: &RunOptions) -> Result<RunSummary, RunError> {
    run_with_trace(machine, options, &mut io::stdout())
}

/// Run `machine` from a fresh reset, writing any trace table to `trace`.
///
/// Program output is flushed however the run ends.
pub fn run_with_trace<M, W>(machine: &mut M, options: &RunOptions, trace: &mut W) -> Result<RunSummary, RunError>
where
    M: Machine,
    W: Write,
{
    machine.reset();
    let result = drive(machine, options, trace);
    let flushed = machine.flush();
    let summary = result?;
    flushed.map_err(RunError::Output)?;
    Ok(summary)
}

fn drive<M, W>(machine: &mut M, options: &RunOptions, trace: &mut W) -> Result<RunSummary, RunError>
where
    M: Machine,
    W: Write,
{
    if options.trace {
        write_trace_header(trace).map_err(RunError::Trace)?;
    }

    let mut steps: u64 = 0;
    loop {
        if let Some(cancel) = options.cancel.as_ref() {
            if cancel.load(Ordering::Relaxed) {
                return Err(RunError::Cancelled);
            }
        }

        if let Some(limit) = options.max_steps {
            if steps >= limit && !at_end(machine) {
                return Err(RunError::StepLimitExceeded { limit });
            }
        }

        let before = Snapshot::of(machine);
        let op = current_op(machine);

        match machine.step()? {
            Status::Halt => break,
            Status::Continue => {
                if options.trace {
                    let after = Snapshot::of(machine);
                    write_trace_row(trace, steps, op.unwrap_or(b' '), &before, &after).map_err(RunError::Trace)?;
                }
                steps += 1;
            }
        }
    }

    if options.trace {
        trace.flush().map_err(RunError::Trace)?;
    }
    Ok(RunSummary { steps })
}

/// Run `source` on a fresh interpreter in a worker thread.
///
/// The interpreter uses stdin/stdout, or no I/O at all when `options.trace` is
/// set (the trace table goes to stdout instead). When `timeout` elapses first,
/// the worker's cancel flag is raised and [`RunError::TimedOut`] is returned
/// without waiting for it; a worker blocked on input is left behind.
pub fn run_source(
    source: Vec<u8>,
    memory_size: usize,
    mut options: RunOptions,
    timeout: Option<Duration>,
) -> Result<RunSummary, RunError> {
    let cancel = options.cancel.get_or_insert_with(|| Arc::new(AtomicBool::new(false))).clone();
    let (tx, rx) = mpsc::channel::<Result<RunSummary, RunError>>();

    thread::spawn(move || {
        let tape = match Tape::try_new(memory_size) {
            Ok(tape) => tape,
            Err(source) => {
                let _ = tx.send(Err(RunError::Memory { cells: memory_size, source }));
                return;
            }
        };
        let mut vm = Interpreter::with_tape(tape);
        if options.trace {
            vm = vm.detach();
        }
        vm.load(&source);
        let _ = tx.send(run(&mut vm, &options));
    });

    await_worker(&rx, timeout, &cancel)
}

/// Wait for the worker's result. On timeout the cancel flag is raised and the
/// worker is not waited for.
fn await_worker(
    rx: &mpsc::Receiver<Result<RunSummary, RunError>>,
    timeout: Option<Duration>,
    cancel: &AtomicBool,
) -> Result<RunSummary, RunError> {
    let received = match timeout {
        Some(limit) => rx.recv_timeout(limit).map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => {
                cancel.store(true, Ordering::Relaxed);
                RunError::TimedOut { ms: limit.as_millis() as u64 }
            }
            mpsc::RecvTimeoutError::Disconnected => RunError::WorkerFailed,
        }),
        None => rx.recv().map_err(|_| RunError::WorkerFailed),
    };
    received?
}

/// Whether the next `step` would halt.
fn at_end<M: Machine>(machine: &M) -> bool {
    current_op(machine).is_none()
}

fn current_op<M: Machine>(machine: &M) -> Option<u8> {
    let ip = machine.instruction_pointer();
    if ip < 0 {
        return None;
    }
    machine.source().get(ip as usize).copied()
}

/// Pointer and cell state around one step.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    ip: i32,
    ptr: i32,
    cell: i32,
}

impl Snapshot {
    fn of<M: Machine>(machine: &M) -> Self {
        let ptr = machine.data_pointer();
        Self {
            ip: machine.instruction_pointer(),
            ptr,
            cell: machine.cell(ptr),
        }
    }
}

fn write_trace_header<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "STEP | IP  | PTR | CELL | INSTR | ACTION")?;
    writeln!(out, "-----+-----+-----+------+-------+------------------------------------------------")
}

fn write_trace_row<W: Write>(out: &mut W, step: u64, op: u8, before: &Snapshot, after: &Snapshot) -> io::Result<()> {
    writeln!(
        out,
        "{:<4} | {:<3} | {:<3} | {:<4} |  {:<4} | {}",
        step,
        before.ip,
        before.ptr,
        before.cell,
        (op as char).escape_default().to_string(),
        describe(op, before, after)
    )
}

/// Human readable account of what `op` did, derived from the state around it.
fn describe(op: u8, before: &Snapshot, after: &Snapshot) -> String {
    let p = before.ptr;
    match op {
        b'>' | b'<' => format!("Moved pointer head to index {}", after.ptr),
        b'+' => format!("Increment cell[{p}] from {} to {}", before.cell, after.cell),
        b'-' => format!("Decrement cell[{p}] from {} to {}", before.cell, after.cell),
        b'#' => format!("Shift cell[{p}] left from {} to {}", before.cell, after.cell),
        b'=' => format!("Shift cell[{p}] right from {} to {}", before.cell, after.cell),
        b',' => format!("Read byte from input -> {}", after.cell),
        b'.' => format!("Output byte {:#04x}", before.cell & 0xff),
        b'p' => format!("Print integer {}", before.cell),
        b's' => format!("Read integer from input -> {}", after.cell),
        b'[' if before.cell == 0 => format!("Cell is 0; scan forward to ']', resume at IP {}", after.ip),
        b'[' => "Enter loop (cell != 0)".to_string(),
        b']' if before.cell != 0 => format!("Cell != 0; scan back to '[', resume at IP {}", after.ip),
        b']' => "Exit loop (cell is 0)".to_string(),
        b'^' => format!("Push cell[{p}] value {}", before.cell),
        b'v' => format!("Pop {} into cell[{p}]", after.cell),
        b'$' => format!("Push data pointer {p}"),
        b'*' => format!("Pop {} into data pointer", after.ptr),
        b'i' => format!("Push instruction pointer {}", before.ip),
        b'!' => format!("Pop {} into instruction pointer, resume at IP {}", after.ip.wrapping_sub(1), after.ip),
        _ => "No-op".to_string(),
    }
}
