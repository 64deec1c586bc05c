use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;
use cross_xdg::BaseDirs;
use nu_ansi_term::Color;

use crate::tape::DEFAULT_MEMORY_SIZE;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "LUNATIC_CONFIG";
pub const MEMORY_SIZE_ENV: &str = "LUNATIC_MEMORY_SIZE";
pub const MAX_STEPS_ENV: &str = "LUNATIC_MAX_STEPS";
pub const TIMEOUT_ENV: &str = "LUNATIC_TIMEOUT_MS";

/// Colours used for diagnostics on a terminal.
#[derive(Debug, Clone, PartialEq)]
pub struct Colors {
    pub error: Color,
    pub context: Color,
    pub caret: Color,
}

impl Default for Colors {
    fn default() -> Self {
        Self {
            error: Color::Red,
            context: Color::DarkGray,
            caret: Color::Yellow,
        }
    }
}

/// Effective interpreter settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub memory_size: usize,
    pub max_steps: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub colors: Colors,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            max_steps: None,
            timeout_ms: None,
            colors: Colors::default(),
        }
    }
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub memory_size: Option<usize>,
    pub max_steps: Option<u64>,
    pub timeout_ms: Option<u64>,
}

static FILE_SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Settings from the config file, or defaults when there is none.
pub fn file_settings() -> &'static Settings {
    FILE_SETTINGS.get_or_init(|| load_from_file().unwrap_or_default())
}

pub fn colors() -> &'static Colors {
    &file_settings().colors
}

/// Resolve settings: flags -> env -> config file -> defaults.
pub fn resolve(overrides: &Overrides) -> Settings {
    resolve_from(overrides, |key| env::var(key).ok(), file_settings())
}

fn resolve_from<F>(overrides: &Overrides, lookup: F, file: &Settings) -> Settings
where
    F: Fn(&str) -> Option<String>,
{
    let env_number = |key: &str| lookup(key).and_then(|s| parse_number(&s));

    Settings {
        memory_size: overrides
            .memory_size
            .or_else(|| env_number(MEMORY_SIZE_ENV).map(|n| n as usize))
            .unwrap_or(file.memory_size),
        max_steps: overrides.max_steps.or_else(|| env_number(MAX_STEPS_ENV)).or(file.max_steps),
        timeout_ms: overrides.timeout_ms.or_else(|| env_number(TIMEOUT_ENV)).or(file.timeout_ms),
        colors: file.colors.clone(),
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("lunatic.toml");
    Some(path)
}

fn load_from_file() -> Option<Settings> {
    let content = fs::read_to_string(config_path()?).ok()?;
    Some(parse_settings(&content))
}

/// Parse the config file format: `[interpreter]` and `[colors]` sections with
/// `key = value` lines. Unknown keys and malformed values are skipped.
pub fn parse_settings(content: &str) -> Settings {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') { continue; }
        if line.starts_with('[') && line.ends_with(']') {
            current = Some(line[1..line.len()-1].trim().to_string());
            continue;
        }
        let Some(section) = current.as_ref() else { continue };
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val_raw = line[eq+1..].trim();
            // Accept quoted or unquoted
            let val = if val_raw.starts_with('"') && val_raw.ends_with('"') && val_raw.len() >= 2 {
                val_raw[1..val_raw.len()-1].to_string()
            } else { val_raw.to_string() };
            sections.entry(section.clone()).or_default().insert(key, val);
        }
    }

    let mut cfg = Settings::default();

    if let Some(vm) = sections.get("interpreter") {
        if let Some(n) = vm.get("memory_size").and_then(|s| parse_number(s)) {
            cfg.memory_size = n as usize;
        }
        if let Some(n) = vm.get("max_steps").and_then(|s| parse_number(s)) {
            cfg.max_steps = Some(n);
        }
        if let Some(n) = vm.get("timeout_ms").and_then(|s| parse_number(s)) {
            cfg.timeout_ms = Some(n);
        }
    }

    if let Some(map) = sections.get("colors") {
        macro_rules! set {
            ($field:ident, $key:literal) => {
                if let Some(v) = map.get($key).and_then(|s| parse_color(s)) { cfg.colors.$field = v; }
            };
        }

        set!(error, "error");
        set!(context, "context");
        set!(caret, "caret");
    }

    cfg
}

/// Unsigned integer, `_` separators allowed.
fn parse_number(value: &str) -> Option<u64> {
    let digits: String = value.trim().chars().filter(|c| *c != '_').collect();
    digits.parse::<u64>().ok()
}

fn parse_color(value: &str) -> Option<Color> {
    let s = value.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
    } else {
        // Named colors matching nu_ansi_term::Color variants
        let name = s.to_ascii_lowercase();
        return Some(match name.as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "purple" | "magenta" => Color::Purple,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            "darkgray" | "dark_grey" | "darkgrey" | "dark_gray" => Color::DarkGray,
            "lightred" | "light_red" => Color::LightRed,
            "lightgreen" | "light_green" => Color::LightGreen,
            "lightblue" | "light_blue" => Color::LightBlue,
            "lightpurple" | "light_purple" | "lightmagenta" | "light_magenta" => Color::LightPurple,
            "lightcyan" | "light_cyan" => Color::LightCyan,
            "lightgray" | "light_gray" | "lightgrey" | "light_grey" => Color::LightGray,
            _ => return None,
        });
    }
    None
}
