//! Session driver: scan → parse → resolve → interpret.
//!
//! Each phase reports into the [`Reporter`] handed to that run and the
//! driver stops after the first phase that reported anything.  Error state
//! lives in the reporter, not the session, so a failed run leaves the next
//! one unaffected.

use std::io::Write;

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::Reporter;
use crate::interpreter::Interpreter;
pub use crate::interpreter::RunStatus;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// Scan `source`, reporting lexical errors.  The returned tokens always end
/// with `EOF`.
pub fn scan<'a>(source: &'a str, reporter: &mut dyn Reporter) -> Vec<Token<'a>> {
    let (tokens, errors) = Scanner::new(source).scan_all();

    for e in errors {
        debug!("Scan debug: {}", e);
        reporter.report(e);
    }

    tokens
}

/// Parse a token buffer into statements, reporting syntax errors.
pub fn parse<'a>(tokens: &'a [Token<'a>], reporter: &mut dyn Reporter) -> Vec<Stmt<'a>> {
    Parser::new(tokens).parse(reporter)
}

/// Parse and resolve without keeping anything.  `false` once `reporter`
/// has seen an error.
fn accepts(tokens: &[Token<'_>], reporter: &mut dyn Reporter) -> bool {
    let statements = parse(tokens, reporter);
    if reporter.has_errors() {
        return false;
    }

    Resolver::new(reporter).resolve(&statements);
    !reporter.has_errors()
}

/// One interpreter state shared by consecutive runs, as in a REPL.
pub struct Lox<'a> {
    interpreter: Interpreter<'a>,
}

impl<'a> Lox<'a> {
    /// Session whose `print` goes to stdout.
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    pub fn with_output(out: Box<dyn Write + 'a>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
        }
    }

    /// Run one program (a file, or one REPL entry) in this session.
    pub fn run(&mut self, source: &'a str, reporter: &mut dyn Reporter) -> RunStatus {
        info!("Running {} bytes of source", source.len());

        let tokens = scan(source, reporter);
        if reporter.has_errors() {
            return RunStatus::StaticError;
        }

        // Rejected input is checked against a temporary borrow so its tokens
        // are freed again.
        if !accepts(&tokens, reporter) {
            return RunStatus::StaticError;
        }

        // Functions defined by this run may be called by later ones, and
        // resolution entries are keyed by token address, so accepted input is
        // pinned for the rest of the process and parsed again in place.
        let tokens: &'a [Token<'a>] = Box::leak(tokens.into_boxed_slice());
        let statements = parse(tokens, reporter);

        let status = self.interpreter.run(&statements, reporter);
        info!("Run finished: {:?}", status);
        status
    }
}

impl<'a> Default for Lox<'a> {
    fn default() -> Self {
        Self::new()
    }
}
