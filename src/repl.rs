use std::env;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use reedline::{Signal, DefaultPrompt, DefaultPromptSegment, HistoryItem, Highlighter, StyledText};
use crate::config::{self, Overrides};
use crate::runner::{run_source, RunOptions};
use crate::theme::OpClass;
use crate::cli_util;

pub const MODE_ENV: &str = "LUNATIC_REPL_MODE";
pub const ONCE_ENV: &str = "LUNATIC_REPL_ONCE";

/// Help text for the meta commands, shared by `:help` and `repl --help`.
pub const META_HELP: &str = r#"Meta commands (line starts with ":")
  :exit            Exit immediately (code 0)
  :help            Show this help
"#;

/// A REPL submission, split into meta commands and program text.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Submission {
    /// Program text with meta lines removed.
    pub code: String,
    pub help: bool,
    pub exit: bool,
}

/// Separate `:` meta lines from code. Everything after `:exit` is dropped.
pub fn parse_submission(text: &str) -> Submission {
    let mut submission = Submission::default();
    for line in text.split_inclusive('\n') {
        match line.trim() {
            ":exit" => {
                submission.exit = true;
                break;
            }
            ":help" => submission.help = true,
            _ => submission.code.push_str(line),
        }
    }
    submission
}

pub fn repl_loop() -> io::Result<()> {
    // Initialize interactive line editor
    let mut editor = init_line_editor()?;

    loop {
        // Prompt and read a multi-line submission via editor
        let Some(text) = read_submission_interactive(&mut editor)? else {
            // EOF or editor closed. End the session cleanly to avoid hanging when stdin is closed
            println!();
            io::stdout().flush()?;
            return Ok(());
        };

        let submission = parse_submission(&text);
        if submission.help {
            eprint!("{META_HELP}");
            let _ = io::stderr().flush();
        }
        if !submission.code.trim().is_empty() {
            execute_buffer(&submission.code);
        }
        if submission.exit {
            return Ok(());
        }

        // Test hook: if LUNATIC_REPL_ONCE=1, exit after one execution
        if env::var(ONCE_ENV).ok().as_deref() == Some("1") {
            return Ok(());
        }
    }
}

fn init_line_editor() -> io::Result<reedline::Reedline> {
    use reedline::{
        default_emacs_keybindings, EditCommand, Emacs, KeyCode, KeyModifiers, Reedline, ReedlineEvent,
    };

    // Start from default emacs-like bindings and adjust:
    // - Enter -> InsertNewLine (do not submit)
    // - Ctrl+D -> AcceptLine (submit)
    // - Ctrl+Z -> AcceptLine (submit, for Windows)
    let mut keybindings = default_emacs_keybindings();
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Edit(vec![EditCommand::InsertNewline]));
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::Submit);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('z'), ReedlineEvent::Submit);

    // Up/down move within the current multiline buffer; Alt/Ctrl+Up/Down browse history.
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Up, ReedlineEvent::PreviousHistory);
    keybindings.add_binding(KeyModifiers::ALT, KeyCode::Down, ReedlineEvent::NextHistory);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Down, ReedlineEvent::NextHistory);

    let history = reedline::FileBackedHistory::new(1_000)
        .map_err(|e| io::Error::other(e.to_string()))?;

    let editor = Reedline::create()
        .with_highlighter(Box::new(OpcodeHighlighter))
        .with_history(Box::new(history))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    Ok(editor)
}

pub fn read_submission<R: io::BufRead>(stdin: &mut R) -> Option<String> {
    // Collect all lines until EOF
    let mut buffer = String::new();

    loop {
        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => buffer.push_str(&line),
            Err(_) => return None,
        }
    }

    if buffer.is_empty() {
        None
    } else {
        Some(buffer)
    }
}

fn read_submission_interactive(editor: &mut reedline::Reedline) -> io::Result<Option<String>> {
    let prompt = DefaultPrompt::new(DefaultPromptSegment::Basic("lb".to_string()), DefaultPromptSegment::Empty);

    // Enter inserts a newline; Ctrl+D or Ctrl+Z submits the whole buffer
    match editor.read_line(&prompt) {
        Ok(Signal::Success(buffer)) => {
            // One history item per submitted buffer (program-level)
            if !buffer.trim().is_empty() {
                let _ = editor.history_mut().save(HistoryItem::from_command_line(buffer.clone()));
            }
            Ok(Some(buffer))
        }
        Ok(Signal::CtrlC) => Ok(None),
        Ok(Signal::CtrlD) => Ok(None),
        Err(e) => {
            eprintln!("repl: editor error: {e}");
            let _ = io::stderr().flush();
            Ok(None)
        }
    }
}

/// Executes a single program contained in `buffer` on a fresh interpreter.
/// - Program output goes to stdout.
/// - Errors are printed concisely to stderr.
/// - A newline is always written to stdout after execution (success or error)
///   so that the prompt begins at column 0 on the next iteration.
fn execute_buffer(buffer: &str) {
    let settings = config::resolve(&Overrides::default());
    let options = RunOptions::new(settings.max_steps, None);
    let timeout = settings.timeout_ms.map(Duration::from_millis);

    let source = buffer.as_bytes().to_vec();
    if let Err(err) = run_source(source.clone(), settings.memory_size, options, timeout) {
        cli_util::print_run_error(None, &source, &err);
    }
    println!();
    let _ = io::stdout().flush();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    select_mode_with(flag, env::var(MODE_ENV).ok(), io::stdin().is_terminal())
}

fn select_mode_with(flag: ModeFlagOverride, env_mode: Option<String>, stdin_is_tty: bool) -> Result<ReplMode, String> {
    // Flag override
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !stdin_is_tty {
                return Err(format!("cannot start editor: stdin is not a TTY (use --bare or {MODE_ENV}=bare)"));
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    // Environment override
    if let Some(val) = env_mode {
        let v = val.trim().to_ascii_lowercase();
        return match v.as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" => {
                if !stdin_is_tty {
                    return Err(format!("cannot start editor: stdin is not a TTY (use {MODE_ENV}=bare)"));
                }
                Ok(ReplMode::Editor)
            }
            _ => Err(format!("invalid {MODE_ENV} value: {val}, must be 'bare' or 'editor'")),
        };
    }

    // Auto-detect
    if stdin_is_tty {
        Ok(ReplMode::Editor)
    } else {
        Ok(ReplMode::Bare)
    }
}

/// Read stdin to EOF and execute it once.
pub fn execute_bare_once() -> io::Result<()> {
    let mut locked = io::BufReader::new(io::stdin().lock());
    let Some(text) = read_submission(&mut locked) else {
        return Ok(());
    };

    let submission = parse_submission(&text);
    if submission.help {
        eprint!("{META_HELP}");
        io::stderr().flush()?;
    }
    if !submission.code.trim().is_empty() {
        execute_buffer(&submission.code);
    }
    Ok(())
}

/// Colours each opcode by its [`OpClass`].
struct OpcodeHighlighter;

impl Highlighter for OpcodeHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut out: StyledText = StyledText::new();
        let mut current: Option<OpClass> = None;
        let mut buffer = String::new();

        for ch in line.chars() {
            let class = OpClass::of(ch);
            match current {
                Some(c) if c == class => buffer.push(ch),
                Some(c) => {
                    out.push((c.style(), std::mem::take(&mut buffer)));
                    current = Some(class);
                    buffer.push(ch);
                }
                None => {
                    current = Some(class);
                    buffer.push(ch);
                }
            }
        }

        if let Some(c) = current {
            if !buffer.is_empty() {
                out.push((c.style(), buffer));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn read_submission_reads_until_eof_multiple_lines() {
        let input = b"+++\n>+.\n";
        let mut cursor = Cursor::new(&input[..]);
        let got = read_submission(&mut cursor);
        assert_eq!(got.as_deref(), Some("+++\n>+.\n"));
    }

    #[test]
    fn read_submission_empty_returns_none() {
        let mut cursor = Cursor::new(Vec::<u8>::new());
        let got = read_submission(&mut cursor);
        assert!(got.is_none());
    }

    #[test]
    fn meta_lines_are_removed_from_code() {
        let got = parse_submission("+++\n:help\n^v\n");
        assert_eq!(got, Submission { code: "+++\n^v\n".to_string(), help: true, exit: false });
    }

    #[test]
    fn exit_drops_the_rest() {
        let got = parse_submission("+.\n  :exit  \n++.\n");
        assert_eq!(got.code, "+.\n");
        assert!(got.exit);
    }

    #[test]
    fn mode_flags_beat_env() {
        assert_eq!(select_mode_with(ModeFlagOverride::Bare, Some("editor".into()), true), Ok(ReplMode::Bare));
        assert!(select_mode_with(ModeFlagOverride::Editor, None, false).is_err());
    }

    #[test]
    fn mode_env_and_auto_detect() {
        assert_eq!(select_mode_with(ModeFlagOverride::None, Some(" Bare ".into()), true), Ok(ReplMode::Bare));
        assert!(select_mode_with(ModeFlagOverride::None, Some("vim".into()), true).is_err());
        assert_eq!(select_mode_with(ModeFlagOverride::None, None, true), Ok(ReplMode::Editor));
        assert_eq!(select_mode_with(ModeFlagOverride::None, None, false), Ok(ReplMode::Bare));
    }

    #[test]
    fn highlighter_groups_runs_by_class() {
        let styled = OpcodeHighlighter.highlight("++>>x", 0);
        let parts: Vec<&str> = styled.buffer.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(parts, vec!["++", ">>", "x"]);
    }
}
