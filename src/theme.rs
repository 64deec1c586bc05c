use nu_ansi_term::{Color, Style};

/// Catppuccin Mocha accents used by the REPL highlighter.
pub mod mocha {
    use nu_ansi_term::Color;

    pub const SURFACE2: Color = Color::Rgb(108, 112, 134);

    pub const RED: Color = Color::Rgb(243, 139, 168);
    pub const GREEN: Color = Color::Rgb(166, 227, 161);
    pub const YELLOW: Color = Color::Rgb(249, 226, 175);
    pub const MAUVE: Color = Color::Rgb(203, 166, 247);
    pub const PEACH: Color = Color::Rgb(250, 179, 135);
    pub const TEAL: Color = Color::Rgb(148, 226, 213);
    pub const SKY: Color = Color::Rgb(137, 220, 235);
    pub const PINK: Color = Color::Rgb(245, 194, 231);
}

/// Groups of opcodes that share a highlight colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    /// `>` `<`
    Move,
    /// `+` `#`
    Grow,
    /// `-` `=`
    Shrink,
    /// `.` `p`
    Output,
    /// `,` `s`
    Input,
    /// `[` `]`
    Loop,
    /// `^` `v` `$` `*`
    Stack,
    /// `i` `!`
    Jump,
    /// anything else
    Comment,
}

impl OpClass {
    pub fn of(ch: char) -> Self {
        match ch {
            '>' | '<' => OpClass::Move,
            '+' | '#' => OpClass::Grow,
            '-' | '=' => OpClass::Shrink,
            '.' | 'p' => OpClass::Output,
            ',' | 's' => OpClass::Input,
            '[' | ']' => OpClass::Loop,
            '^' | 'v' | '$' | '*' => OpClass::Stack,
            'i' | '!' => OpClass::Jump,
            _ => OpClass::Comment,
        }
    }

    pub fn color(self) -> Color {
        match self {
            OpClass::Move => mocha::SKY,
            OpClass::Grow => mocha::GREEN,
            OpClass::Shrink => mocha::RED,
            OpClass::Output => mocha::YELLOW,
            OpClass::Input => mocha::PEACH,
            OpClass::Loop => mocha::MAUVE,
            OpClass::Stack => mocha::TEAL,
            OpClass::Jump => mocha::PINK,
            OpClass::Comment => mocha::SURFACE2,
        }
    }

    pub fn style(self) -> Style {
        let style = Style::new().fg(self.color());
        if self == OpClass::Comment { style } else { style.bold() }
    }
}
