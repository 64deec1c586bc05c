use std::fmt;

/// Faults raised by a single interpreter step.
///
/// A step that fails leaves both pointers, the tape and the stack exactly as
/// they were before the step.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A cell-touching opcode ran while the data pointer was off the tape.
    #[error("pointer out of bounds at instruction {ip} (ptr={ptr}, op='{op}')")]
    PointerOutOfBounds { ip: i32, ptr: i32, op: char },

    /// A popping opcode (`v`, `*`, `!`) ran with an empty stack.
    #[error("stack underflow at instruction {ip} (op='{op}')")]
    StackUnderflow { ip: i32, op: char },

    /// The host input or output failed.
    #[error("I/O error at instruction {ip} (op='{op}'): {source}")]
    Io {
        ip: i32,
        op: char,
        #[source]
        source: std::io::Error,
    },
}

impl RuntimeError {
    /// Instruction pointer of the faulting opcode.
    pub fn ip(&self) -> i32 {
        match self {
            RuntimeError::PointerOutOfBounds { ip, .. }
            | RuntimeError::StackUnderflow { ip, .. }
            | RuntimeError::Io { ip, .. } => *ip,
        }
    }

    /// The faulting opcode.
    pub fn op(&self) -> char {
        match self {
            RuntimeError::PointerOutOfBounds { op, .. }
            | RuntimeError::StackUnderflow { op, .. }
            | RuntimeError::Io { op, .. } => *op,
        }
    }

    pub fn kind(&self) -> RuntimeErrorKind {
        match self {
            RuntimeError::PointerOutOfBounds { .. } => RuntimeErrorKind::PointerOutOfBounds,
            RuntimeError::StackUnderflow { .. } => RuntimeErrorKind::StackUnderflow,
            RuntimeError::Io { .. } => RuntimeErrorKind::Io,
        }
    }
}

/// Field-less mirror of [`RuntimeError`] for matching and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    PointerOutOfBounds,
    StackUnderflow,
    Io,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeErrorKind::PointerOutOfBounds => write!(f, "pointer out of bounds"),
            RuntimeErrorKind::StackUnderflow => write!(f, "stack underflow"),
            RuntimeErrorKind::Io => write!(f, "I/O failure"),
        }
    }
}

/// Reasons a driver run ended without reaching `Halt`.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: u64 },

    /// The cancel flag was raised, by Ctrl+C or a timed-out caller.
    #[error("Execution aborted: cancelled")]
    Cancelled,

    /// Execution aborted because the wall-clock budget ran out.
    #[error("Execution aborted: wall-clock timeout exceeded ({ms} ms)")]
    TimedOut { ms: u64 },

    /// The interpreter thread ended without reporting a result.
    #[error("Execution aborted: interpreter thread stopped unexpectedly")]
    WorkerFailed,

    /// The tape could not be allocated.
    #[error("cannot allocate a tape of {cells} cells: {source}")]
    Memory {
        cells: usize,
        #[source]
        source: std::collections::TryReserveError,
    },

    /// Program output could not be flushed after the run.
    #[error("failed to flush program output: {0}")]
    Output(#[source] std::io::Error),

    /// The debug trace could not be written.
    #[error("failed to write trace: {0}")]
    Trace(#[source] std::io::Error),
}
