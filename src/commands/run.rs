use clap::Args;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use crate::cli_util::print_run_error;
use crate::config::{self, Overrides};
use crate::runner::{run_source, RunOptions};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Print a step-by-step table of operations instead of doing I/O
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Tape length in cells (fallback LUNATIC_MEMORY_SIZE; default 202000)
    #[arg(long = "memory", value_name = "CELLS")]
    pub memory: Option<usize>,

    /// Maximum interpreter steps before abort (fallback LUNATIC_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<u64>,

    /// Wall-clock timeout in milliseconds (fallback LUNATIC_TIMEOUT_MS; default none)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Program file; only the first one is run
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    let RunArgs {
        debug,
        memory,
        max_steps,
        timeout_ms,
        paths,
    } = args;

    let Some(path) = paths.into_iter().next() else {
        super::print_help(program);
        return 0;
    };

    let source = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("{program}: failed to open program file '{}': {e}", path.display());
            let _ = io::stderr().flush();
            return 1;
        }
    };

    // Resolve limits: flags -> env -> config file -> defaults
    let settings = config::resolve(&Overrides {
        memory_size: memory,
        max_steps,
        timeout_ms,
    });

    // First Ctrl+C asks the run to stop; a second one exits at once
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_handler = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        if cancel_handler.swap(true, Ordering::Relaxed) {
            let _ = io::stdout().flush();
            std::process::exit(130);
        }
    }) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }

    let options = RunOptions::new(settings.max_steps, Some(cancel)).with_trace(debug);
    let timeout = settings.timeout_ms.map(Duration::from_millis);

    let exit_code = match run_source(source.clone(), settings.memory_size, options, timeout) {
        Ok(_) => 0,
        Err(err) => {
            print_run_error(Some(program), &source, &err);
            1
        }
    };

    let _ = io::stdout().flush();
    exit_code
}
