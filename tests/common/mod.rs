#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::{Diagnostics, Lox, RunStatus};

/// `print` target the test can read back after handing a clone to the
/// interpreter.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session that keeps its globals between [`Session::run`] calls.
pub struct Session {
    lox: Lox<'static>,
    out: SharedBuf,
}

pub struct Outcome {
    pub status: RunStatus,
    pub output: Vec<String>,
    pub errors: Vec<String>,
}

impl Session {
    pub fn new() -> Self {
        let out = SharedBuf::default();
        Self {
            lox: Lox::with_output(Box::new(out.clone())),
            out,
        }
    }

    pub fn run(&mut self, source: &'static str) -> Outcome {
        self.out.clear();

        let mut diagnostics = Diagnostics::new();
        let status = self.lox.run(source, &mut diagnostics);

        Outcome {
            status,
            output: self.out.lines(),
            errors: diagnostics.messages(),
        }
    }
}

/// Run `source` in a fresh session.
pub fn run(source: &'static str) -> Outcome {
    Session::new().run(source)
}

/// Run `source`, which must succeed, and return what it printed.
pub fn output_of(source: &'static str) -> Vec<String> {
    let outcome = run(source);
    assert_eq!(
        outcome.status,
        RunStatus::Ok,
        "unexpected errors: {:?}",
        outcome.errors
    );
    outcome.output
}

/// Run `source`, which must fail at run time, and return the single error
/// message.
pub fn runtime_error_of(source: &'static str) -> String {
    let outcome = run(source);
    assert_eq!(outcome.status, RunStatus::RuntimeError);
    assert_eq!(outcome.errors.len(), 1, "errors: {:?}", outcome.errors);
    outcome.errors[0].clone()
}
