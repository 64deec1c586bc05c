use std::io::{self, IsTerminal, Write};
use crate::config;
use crate::error::{RunError, RuntimeError};

/// Pretty-print a failed run with caret positioning into the program source.
/// If `program` is `Some("lunatic")`, messages are prefixed with "lunatic: ...".
pub fn print_run_error(program: Option<&str>, code: &[u8], err: &RunError) {
    let styled = io::stderr().is_terminal();
    let _ = io::stderr().write_all(render_run_error(program, code, err, styled).as_bytes());
    let _ = io::stderr().flush();
}

/// Text [`print_run_error`] writes, optionally colourised.
pub fn render_run_error(program: Option<&str>, code: &[u8], err: &RunError, styled: bool) -> String {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    match err {
        RunError::Runtime(runtime) => {
            let msg = prefix_program(&runtime_message(runtime));
            render_error_with_context(&msg, code, runtime.ip(), styled)
        }
        RunError::StepLimitExceeded { .. }
        | RunError::Cancelled
        | RunError::TimedOut { .. }
        | RunError::WorkerFailed => format!("{err}\n"),
        RunError::Memory { .. } | RunError::Output(_) | RunError::Trace(_) => format!("{}\n", prefix_program(&err.to_string())),
    }
}

fn runtime_message(err: &RuntimeError) -> String {
    match err {
        RuntimeError::PointerOutOfBounds { ptr, op, .. } => {
            format!("Runtime error: {} (ptr={ptr}, op={op})", err.kind())
        }
        RuntimeError::StackUnderflow { op, .. } => {
            format!("Runtime error: {} (op={op})", err.kind())
        }
        RuntimeError::Io { op, source, .. } => {
            format!("Runtime error: {} (op={op}): {source}", err.kind())
        }
    }
}

/// A concise error line with the instruction index, followed by a window of
/// the source around `pos` and a caret under it.
///
/// `pos` indexes bytes; the window is decoded lossily so a caret under
/// multi-byte text lines up with the decoded characters.
pub fn render_error_with_context(prefix: &str, code: &[u8], pos: i32, styled: bool) -> String {
    let colors = config::colors();
    let paint = |color: nu_ansi_term::Color, text: &str| {
        if styled { color.paint(text).to_string() } else { text.to_string() }
    };

    let mut out = paint(colors.error, &format!("{prefix} at instruction {pos}"));
    out.push('\n');

    if pos < 0 || code.is_empty() {
        return out;
    }

    // Show a short window around the position for context
    const WINDOW_BYTES: usize = 32;

    let pos = (pos as usize).min(code.len() - 1);
    let start = pos.saturating_sub(WINDOW_BYTES);
    let end = (pos + WINDOW_BYTES + 1).min(code.len());

    let head = String::from_utf8_lossy(&code[start..pos]);
    let slice: String = String::from_utf8_lossy(&code[start..end])
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    out.push_str("  ");
    out.push_str(&paint(colors.context, &slice));
    out.push('\n');

    // Caret under the exact position
    let underline = format!("{}^", " ".repeat(head.chars().count()));
    out.push_str("  ");
    out.push_str(&paint(colors.caret, &underline));
    out.push('\n');
    out
}
