//! Everything that can appear to the left of `(...)`.
//!
//! [`Callable`] is a closed set of variants rather than a trait object: the
//! interpreter checks `arity()` before every call and then dispatches with a
//! `match`.

use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::{InstanceRef, LoxClass};
use crate::environment::{EnvRef, Environment};
use crate::error::LoxError;
use crate::interpreter::{IResult, InterpretError, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Host function signature.  An `Err` becomes a runtime error located at the
/// call's closing parenthesis.
pub type NativeFn<'a> = fn(&[Value<'a>]) -> Result<Value<'a>, String>;

#[derive(Clone)]
pub enum Callable<'a> {
    Native(Rc<NativeFunction<'a>>),
    Function(Rc<LoxFunction<'a>>),
    BoundMethod(Rc<BoundMethod<'a>>),
    Class(Rc<LoxClass<'a>>),
}

impl<'a> Callable<'a> {
    /// Number of arguments a call must supply.
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.arity(),
            Callable::BoundMethod(bound) => bound.method.arity(),
            Callable::Class(class) => class.arity(),
        }
    }

    /// Invoke with already evaluated arguments.  The caller has checked the
    /// argument count against [`arity`](Self::arity).
    pub fn call(
        &self,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
        paren: &Token<'_>,
    ) -> IResult<'a, Value<'a>> {
        match self {
            Callable::Native(native) => {
                debug!("Calling native function '{}'", native.name);
                (native.func)(&arguments)
                    .map_err(|msg| InterpretError::from(LoxError::runtime(paren, msg)))
            }
            Callable::Function(function) => function.call(interpreter, arguments),
            Callable::BoundMethod(bound) => bound.call(interpreter, arguments),
            Callable::Class(class) => LoxClass::instantiate(class, interpreter, arguments),
        }
    }

    /// Identity comparison used by `==`.
    pub fn same(&self, other: &Callable<'a>) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::BoundMethod(a), Callable::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<'a> fmt::Display for Callable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
            Callable::Function(function) => write!(f, "{}", function),
            Callable::BoundMethod(bound) => write!(f, "{}", bound.method),
            Callable::Class(class) => write!(f, "<class {}>", class.name()),
        }
    }
}

impl<'a> fmt::Debug for Callable<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({}, arity {})", self, self.arity())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Native functions
// ─────────────────────────────────────────────────────────────────────────────

pub struct NativeFunction<'a> {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn<'a>,
}

impl<'a> NativeFunction<'a> {
    pub fn new(name: &'static str, arity: usize, func: NativeFn<'a>) -> Self {
        Self { name, arity, func }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User functions
// ─────────────────────────────────────────────────────────────────────────────

/// A function declaration paired with the frame that was current where it
/// was declared.
pub struct LoxFunction<'a> {
    declaration: Rc<FunctionDecl<'a>>,
    closure: EnvRef<'a>,
}

impl<'a> LoxFunction<'a> {
    pub fn new(declaration: Rc<FunctionDecl<'a>>, closure: EnvRef<'a>) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.arity()
    }

    pub fn name(&self) -> Option<&'a str> {
        self.declaration.name_str()
    }

    pub fn closure(&self) -> &EnvRef<'a> {
        &self.closure
    }

    pub fn call(
        &self,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> IResult<'a, Value<'a>> {
        self.call_in(interpreter, arguments, &self.closure)
    }

    /// Run the body in a fresh frame whose parent is `closure`, never the
    /// caller's frame.  A `return` unwinds to here and becomes the result.
    fn call_in(
        &self,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
        closure: &EnvRef<'a>,
    ) -> IResult<'a, Value<'a>> {
        debug!(
            "Calling function '{}' with {} argument(s)",
            self.name().unwrap_or("<anonymous>"),
            arguments.len()
        );

        let frame: EnvRef<'a> = Environment::child_of(closure);
        {
            let mut frame = frame.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                frame.define(param.lexeme, argument);
            }
        }

        match interpreter.execute_block(&self.declaration.body, frame) {
            Ok(()) => Ok(Value::Nil),
            Err(InterpretError::Return(value)) => Ok(value),
            Err(e) => Err(e),
        }
    }
}

impl<'a> fmt::Display for LoxFunction<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<fn {}>", name),
            None => write!(f, "<anonymous fn>"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bound methods
// ─────────────────────────────────────────────────────────────────────────────

/// A method paired with the instance it was read from.
pub struct BoundMethod<'a> {
    receiver: InstanceRef<'a>,
    method: Rc<LoxFunction<'a>>,
}

impl<'a> BoundMethod<'a> {
    pub fn new(receiver: InstanceRef<'a>, method: Rc<LoxFunction<'a>>) -> Self {
        Self { receiver, method }
    }

    /// Calls run one frame below the method's closure, in a frame that binds
    /// `this` to the receiver.
    pub fn call(
        &self,
        interpreter: &mut Interpreter<'a>,
        arguments: Vec<Value<'a>>,
    ) -> IResult<'a, Value<'a>> {
        let this_frame: EnvRef<'a> = Environment::child_of(self.method.closure());
        this_frame
            .borrow_mut()
            .define("this", Value::Instance(Rc::clone(&self.receiver)));

        self.method.call_in(interpreter, arguments, &this_frame)
    }
}
