/// How the word "and" joins clauses, e.g. `x = 4 and y = 4`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Conjunction {
    /// `and` separates the equations of a system (`;`).
    #[default]
    Semicolon,
    /// `and` separates the items of a value list (`,`).
    Comma,
}

impl Conjunction {
    pub fn separator(self) -> &'static str {
        match self {
            Conjunction::Semicolon => ";",
            Conjunction::Comma => ",",
        }
    }
}

/// Knobs for tuning how lenient the checker is.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Config {
    pub conjunction: Conjunction,
    /// The absolute tolerance used when comparing values numerically.
    pub tolerance: f64,
    /// Only suggest "you are off by N" when `|N|` is at most this.
    pub hint_offset_limit: f64,
}

impl Config {
    pub const DEFAULT_TOLERANCE: f64 = 1e-9;
    pub const DEFAULT_HINT_OFFSET_LIMIT: f64 = 10.0;

    pub fn new() -> Self { Config::default() }

    pub fn with_conjunction(self, conjunction: Conjunction) -> Self {
        Config {
            conjunction,
            ..self
        }
    }

    pub fn with_tolerance(self, tolerance: f64) -> Self {
        Config { tolerance, ..self }
    }

    pub fn with_hint_offset_limit(self, hint_offset_limit: f64) -> Self {
        Config {
            hint_offset_limit,
            ..self
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            conjunction: Conjunction::default(),
            tolerance: Config::DEFAULT_TOLERANCE,
            hint_offset_limit: Config::DEFAULT_HINT_OFFSET_LIMIT,
        }
    }
}
