//! Entry points for the `lunatic` binary. Each returns a process exit code.

pub mod repl;
pub mod run;

use std::io::{self, Write};
use crate::{DISPLAY_NAME, VERSION};

const HELP_FLAGS: &[&str] = &["-h", "--help"];
const VERSION_FLAGS: &[&str] = &["-v", "--version"];
const RUN_SWITCHES: &[&str] = &["-d", "--debug"];
const RUN_VALUE_FLAGS: &[&str] = &["--memory", "--max-steps", "--timeout"];
const REPL_SWITCHES: &[&str] = &["--bare", "--editor"];

/// Whether any argument asks for help.
pub fn wants_help(args: &[String]) -> bool {
    args.iter().skip(1).any(|a| HELP_FLAGS.contains(&a.as_str()))
}

/// Whether any argument asks for the version.
pub fn wants_version(args: &[String]) -> bool {
    args.iter().skip(1).any(|a| VERSION_FLAGS.contains(&a.as_str()))
}

/// Drop dash arguments the binary does not recognise, so they are skipped
/// instead of rejected. The first element is the program name and is kept.
///
/// Flags are recognised per context: run flags before a leading `repl`, REPL
/// flags after it. Everything after `--` is kept as is.
pub fn retain_known_args<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut kept: Vec<String> = args.next().into_iter().collect();
    let mut in_repl = false;
    let mut seen_positional = false;

    while let Some(arg) = args.next() {
        if arg == "--" {
            kept.push(arg);
            kept.extend(args.by_ref());
            break;
        }

        if arg == "-" || !arg.starts_with('-') {
            if !seen_positional && arg == "repl" {
                in_repl = true;
            }
            seen_positional = true;
            kept.push(arg);
            continue;
        }

        let (name, inline_value) = match arg.split_once('=') {
            Some((name, _)) => (name, true),
            None => (arg.as_str(), false),
        };
        let switches = if in_repl { REPL_SWITCHES } else { RUN_SWITCHES };
        let takes_value = !in_repl && RUN_VALUE_FLAGS.contains(&name);
        let known = takes_value
            || (!inline_value
                && (HELP_FLAGS.contains(&name)
                    || VERSION_FLAGS.contains(&name)
                    || switches.contains(&name)
                    || is_short_cluster(name, in_repl)));

        if !known {
            continue;
        }
        kept.push(arg);
        if takes_value && !inline_value {
            if let Some(value) = args.next() {
                kept.push(value);
            }
        }
    }
    kept
}

/// `-dh` style bundles of known single-letter switches.
fn is_short_cluster(arg: &str, in_repl: bool) -> bool {
    let Some(letters) = arg.strip_prefix('-') else {
        return false;
    };
    !letters.is_empty()
        && !letters.starts_with('-')
        && letters.chars().all(|c| matches!(c, 'h' | 'v') || (c == 'd' && !in_repl))
}

/// Name and version banner printed by `--help`, `--version`, and a bare invocation.
pub fn banner() -> String {
    format!("{DISPLAY_NAME}\nVersion {VERSION}\n- - - - - - - - -\n")
}

pub fn usage(program: &str) -> String {
    format!(
        r#"Usage:
  {0} [OPTIONS] <PATH>        # Run the Lunatic Brain program in PATH
  {0} repl [--bare|--editor]  # Start a read-eval-print loop

Options:
  --debug,   -d         Print a step-by-step table of operations instead of doing I/O
  --memory <CELLS>      Tape length (fallback LUNATIC_MEMORY_SIZE; default 202000)
  --max-steps <N>       Abort after N instructions (fallback LUNATIC_MAX_STEPS)
  --timeout <MS>        Abort after MS milliseconds (fallback LUNATIC_TIMEOUT_MS)
  --help,    -h         Show this help
  --version, -v         Show the version
Unrecognised options are ignored.

Instructions:
  > <   move the data pointer        + -   increment / decrement the cell
  , .   read / write a byte          [ ]   loop while the cell is nonzero
  # =   shift the cell left / right  ^ v   push / pop the cell
  $ *   push / pop the data pointer  i !   push / pop the instruction pointer
  p s   print / read a decimal       anything else is a comment

Settings are also read from $XDG_CONFIG_HOME/lunatic.toml (or LUNATIC_CONFIG).
"#,
        program
    )
}

/// Print banner and usage to stdout.
pub fn print_help(program: &str) {
    print!("{}\n{}", banner(), usage(program));
    let _ = io::stdout().flush();
}

pub fn print_version() {
    print!("{}", banner());
    let _ = io::stdout().flush();
}
