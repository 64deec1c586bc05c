use clap::{ArgAction, Parser, Subcommand};
use lunatic_brain::commands::{self, repl::ReplArgs, run::RunArgs};
use std::env;
use std::io::{self, Write};

#[derive(Parser, Debug)]
#[command(
    name = "lunatic",
    disable_help_flag = true,
    disable_version_flag = true,
    disable_help_subcommand = true,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", global = true, action = ArgAction::SetTrue)]
    help: bool,

    /// Show the version
    #[arg(short = 'v', long = "version", global = true, action = ArgAction::SetTrue)]
    version: bool,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a read-eval-print loop
    Repl(ReplArgs),
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| String::from("lunatic"));

    let cli = match Cli::try_parse_from(commands::retain_known_args(args.iter().cloned())) {
        Ok(cli) => cli,
        // A malformed flag value does not stop -h or -v from answering
        Err(_) if commands::wants_help(&args) => {
            commands::print_help(&program);
            std::process::exit(0);
        }
        Err(_) if commands::wants_version(&args) => {
            commands::print_version();
            std::process::exit(0);
        }
        Err(e) => e.exit(),
    };

    let code = if cli.help {
        match cli.command {
            Some(Command::Repl(_)) => {
                print!("{}\n{}", commands::banner(), commands::repl::usage(&program));
                let _ = io::stdout().flush();
            }
            None => commands::print_help(&program),
        }
        0
    } else if cli.version {
        commands::print_version();
        0
    } else {
        match cli.command {
            Some(Command::Repl(args)) => commands::repl::run(&program, args),
            None => commands::run::run(&program, cli.run),
        }
    };

    std::process::exit(code);
}
