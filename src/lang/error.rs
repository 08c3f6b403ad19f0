#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Fatal,
}

/// ## Engine errors
///
/// A SYNTAX error is recoverable: the dispatcher reports it and the session
/// keeps going. A FATAL error ends the session.

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    line: Option<i32>,
}

#[macro_export]
macro_rules! error {
    ($kind:ident; $($arg:tt)+) => {
        $crate::lang::Error::new($crate::lang::ErrorKind::$kind, format!($($arg)+))
    };
}

impl Error {
    pub fn new(kind: ErrorKind, message: String) -> Error {
        Error {
            kind,
            message,
            line: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::Fatal
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line_number(&self) -> Option<i32> {
        self.line
    }

    pub fn in_line_number(mut self, line: Option<i32>) -> Error {
        if self.line.is_none() {
            self.line = line;
        }
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.kind {
            ErrorKind::Syntax => write!(f, "SYNTAX ERROR: {}", self.message)?,
            ErrorKind::Fatal => write!(f, "FATAL ERROR: {}", self.message)?,
        }
        if let Some(line) = self.line {
            write!(f, "\nError on line {}", line)?;
        }
        Ok(())
    }
}
