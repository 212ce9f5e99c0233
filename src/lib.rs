pub mod ast;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod lox;
pub mod natives;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

pub use error::{Diagnostics, LoxError, Reporter, StderrReporter};
pub use interpreter::{Interpreter, RunStatus};
pub use lox::Lox;
pub use value::Value;
