//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  Every
//! diagnostic variant carries the same `{line, position, message}` triple so a
//! single [`Reporter`] can render scan, parse, resolve and runtime problems
//! uniformly.
//!
//! The module **does not** print diagnostics itself, except through the
//! opt‑in [`StderrReporter`].

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source location.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,

        /// 0‑based byte offset into the source.
        position: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse {
        message: String,
        line: usize,
        position: usize,
    },

    /// Static‑analysis failure found by the resolver.
    #[error("[line {line}] Error: {message}")]
    Resolve {
        message: String,
        line: usize,
        position: usize,
    },

    /// Runtime evaluation error.
    #[error("[line {line}] Runtime error: {message}")]
    Runtime {
        message: String,
        line: usize,
        position: usize,
    },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, position: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex {
            message,
            line,
            position,
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            position: token.position,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            position: token.position,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
            position: token.position,
        }
    }

    /// Source line of a diagnostic, `None` for I/O failures.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. }
            | LoxError::Runtime { line, .. } => Some(*line),
            LoxError::Io(_) => None,
        }
    }

    /// Byte offset of a diagnostic, `None` for I/O failures.
    pub fn position(&self) -> Option<usize> {
        match self {
            LoxError::Lex { position, .. }
            | LoxError::Parse { position, .. }
            | LoxError::Resolve { position, .. }
            | LoxError::Runtime { position, .. } => Some(*position),
            LoxError::Io(_) => None,
        }
    }

    /// The bare message, without the `[line N]` prefix.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

// ─────────────────────────────────────────────────────────────────────────────
// Reporting collaborators
// ─────────────────────────────────────────────────────────────────────────────

/// Sink for diagnostics produced by any phase.
///
/// Each phase receives the reporter explicitly; the driver inspects it between
/// phases to decide whether to continue.
pub trait Reporter {
    fn report(&mut self, error: LoxError);

    /// Has anything been reported since the last reset?
    fn has_errors(&self) -> bool;
}

/// Collects diagnostics in memory.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    /// Rendered messages in report order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(LoxError::message).collect()
    }
}

impl Reporter for Diagnostics {
    fn report(&mut self, error: LoxError) {
        self.errors.push(error);
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Prints every diagnostic to stderr as it arrives.
#[derive(Debug, Default)]
pub struct StderrReporter {
    had_error: bool,
}

impl StderrReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for StderrReporter {
    fn report(&mut self, error: LoxError) {
        self.had_error = true;
        eprintln!("{}", error);
    }

    fn has_errors(&self) -> bool {
        self.had_error
    }
}
