use std::io::{self, IsTerminal, Write};
use clap::Args;

use crate::repl::{execute_bare_once, repl_loop, select_mode, ModeFlagOverride, ReplMode, META_HELP};

#[derive(Args, Debug)]
pub struct ReplArgs {
    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor")]
    pub bare: bool,

    /// Force interactive mode (errors if stdin is not a TTY)
    #[arg(long = "editor", conflicts_with = "bare")]
    pub editor: bool,
}

impl ReplArgs {
    pub fn mode_flag(&self) -> ModeFlagOverride {
        match (self.bare, self.editor) {
            (true, _) => ModeFlagOverride::Bare,
            (_, true) => ModeFlagOverride::Editor,
            _ => ModeFlagOverride::None,
        }
    }
}

// Public entry point for the REPL from main.rs
pub fn run(program: &str, args: ReplArgs) -> i32 {
    // Determine mode: flags -> env -> auto-detect via is_terminal()
    let mode = match select_mode(args.mode_flag()) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    // Install SIGINT (ctrl+c) handler to flush and exit(0) immediately
    if let Err(e) = ctrlc::set_handler(|| {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
        std::process::exit(0);
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let result = match mode {
        ReplMode::Editor => {
            // Print banners/prompts only if stderr is a TTY
            if io::stderr().is_terminal() {
                eprintln!("Lunatic Brain REPL (interactive editor mode)");
                eprintln!("Ctrl+d/Ctrl+z Enter (Windows) executes the current buffer. Press ctrl+c to exit");
                let _ = io::stderr().flush();
            }
            repl_loop()
        }
        // Bare mode: read stdin until EOF, execute once, exit 0
        ReplMode::Bare => execute_bare_once(),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{program}: REPL error: {e}");
            let _ = io::stderr().flush();
            1
        }
    }
}

pub fn usage(program: &str) -> String {
    format!(
        r#"Usage:
  {0} repl [--bare|--editor]

Options:
  --help,   -h        Show this help
  --bare              Force non-interactive bare mode
  --editor            Force interactive editor mode (errors if stdin is not a TTY)

Description:
  Starts a REPL where you can enter Lunatic Brain code and execute it live.

{1}
Notes:
    - Enter inserts a newline; Ctrl+D (Ctrl+Z and Enter on Windows) executes the buffer.
    - Ctrl+C exits the REPL immediately.
    - Each execution starts with a fresh tape, pointers and stack.
    - The REPL exits after a single execution if LUNATIC_REPL_ONCE=1.
    - Mode selection:
        * Flags: --bare|--editor override environment and auto-detection.
        * Env: LUNATIC_REPL_MODE=bare|editor overrides auto-detection.
        * Auto-detect: if stdin is a TTY, starts in interactive editor mode; otherwise, bare mode.
"#,
        program, META_HELP
    )
}
