use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolishError {
    /// Malformed polish text
    ParseError {
        /// What was expected or found
        message: String,
        /// The line number (1-based)
        line: usize,
    },
    /// The group buffer could not grow
    OutOfMemory {
        /// Number of records the buffer tried to hold
        requested: usize,
    },
    /// Polishes were to be read from an interactive terminal
    Terminal,
}

impl PolishError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        PolishError::ParseError {
            message: message.into(),
            line,
        }
    }
}

impl fmt::Display for PolishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolishError::ParseError { message, line } => {
                write!(f, "Parse error at line {}: {}", line, message)
            }
            PolishError::OutOfMemory { requested } => write!(
                f,
                "Out of memory: Couldn't allocate space for {} polishes",
                requested
            ),
            PolishError::Terminal => write!(f, "I cannot read polishes from the terminal!"),
        }
    }
}

impl std::error::Error for PolishError {}
