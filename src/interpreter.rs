//! Tree‑walking evaluator.
//!
//! Variable accesses consult the resolver's distance table: a recorded
//! distance means "walk exactly that many frames up from the current one",
//! no entry means "global, look it up by name".  `return` travels as
//! [`InterpretError::Return`] and is caught at the nearest call boundary.

use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::ast::{Expr, LiteralValue, Stmt};
use crate::callable::{BoundMethod, Callable, LoxFunction};
use crate::class::{self, LoxClass};
use crate::environment::{self, EnvRef, Environment, Lookup};
use crate::error::{LoxError, Reporter};
use crate::natives;
use crate::resolver::{Locals, Resolver};
use crate::token::{Token, TokenType};
use crate::value::Value;

#[derive(Error, Debug)]
pub enum InterpretError<'a> {
    #[error(transparent)]
    Error(#[from] LoxError),

    /// Not a failure: unwinds to the enclosing call.
    #[error("Return signal with value: {0}")]
    Return(Value<'a>),
}

/// Convenient alias for interpreter results.
pub type IResult<'a, T> = Result<T, InterpretError<'a>>;

/// How far a call to [`Interpreter::run`] got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// The resolver (or an earlier phase) reported errors; nothing ran.
    StaticError,
    /// Execution started and was aborted by a runtime error.
    RuntimeError,
}

/// Deepest chain of nested calls a program may build.
pub const MAX_CALL_DEPTH: usize = 5_000;

/// Native stack kept free before recursing into a node.
const RED_ZONE: usize = 100 * 1024;

/// Native stack allocated each time the red zone is reached.
const STACK_PER_RECURSION: usize = 1024 * 1024;

pub struct Interpreter<'a> {
    globals: EnvRef<'a>,
    environment: EnvRef<'a>,
    locals: Locals,
    call_depth: usize,
    out: Box<dyn Write + 'a>,
}

impl<'a> Interpreter<'a> {
    /// Creates an Interpreter printing to stdout, with the native functions
    /// defined as globals.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Like [`new`](Self::new), but `print` writes to `out`.
    pub fn with_output(out: Box<dyn Write + 'a>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef<'a> = Environment::new().into_ref();
        natives::install(&mut globals.borrow_mut());

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            call_depth: 0,
            out,
        }
    }

    /// Merge a resolver table.  Tables from earlier runs are kept so
    /// functions defined by them still find their variables.
    pub fn add_locals(&mut self, locals: Locals) {
        self.locals.extend(locals);
    }

    /// Resolve, then execute, a whole program.  Every diagnostic goes to
    /// `reporter`; a static error prevents execution entirely.
    pub fn run(&mut self, statements: &[Stmt<'a>], reporter: &mut dyn Reporter) -> RunStatus {
        let locals = Resolver::new(reporter).resolve(statements);

        if reporter.has_errors() {
            info!("Static errors reported; skipping execution");
            return RunStatus::StaticError;
        }

        self.add_locals(locals);

        match self.interpret(statements) {
            Ok(()) => RunStatus::Ok,
            Err(e) => {
                debug!("Runtime debug: {}", e);
                reporter.report(e);
                RunStatus::RuntimeError
            }
        }
    }

    /// Executes a list of already resolved statements (a "program").  The
    /// first runtime error aborts the rest.
    pub fn interpret(&mut self, statements: &[Stmt<'a>]) -> Result<(), LoxError> {
        debug!("Interpreting {} statements", statements.len());

        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));

        // Block execution restores frames on every exit path; this only
        // guards the next run against a frame left behind by a bug.
        self.environment = Rc::clone(&self.globals);
        self.call_depth = 0;

        match result {
            Ok(()) => {
                info!("Interpretation completed successfully");
                Ok(())
            }
            Err(InterpretError::Error(e)) => Err(e),
            Err(InterpretError::Return(value)) => {
                // Rejected statically; reached only when the resolver was
                // skipped.  Treat it as the end of the program.
                debug!("Top-level return with value {}", value);
                Ok(())
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt<'a>) -> IResult<'a, ()> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt<'a>) -> IResult<'a, ()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value).map_err(LoxError::from)?;
                debug!("Printed value: {}", value);
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                match initializer {
                    Some(expr) => {
                        let value = self.evaluate(expr)?;
                        debug!("Defining variable '{}' = {}", name.lexeme, value);
                        self.environment.borrow_mut().define(name.lexeme, value);
                    }
                    None => {
                        debug!("Declaring variable '{}' without a value", name.lexeme);
                        self.environment.borrow_mut().declare(name.lexeme);
                    }
                }
                Ok(())
            }

            Stmt::Block(statements) => {
                let frame = Environment::child_of(&self.environment);
                self.execute_block(statements, frame)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment));
                if let Some(name) = declaration.name {
                    debug!("Defining function '{}'", name.lexeme);
                    self.environment.borrow_mut().define(
                        name.lexeme,
                        Value::Callable(Callable::Function(Rc::new(function))),
                    );
                }
                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Err(InterpretError::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Defining class '{}'", name.lexeme);

                let superclass: Option<Rc<LoxClass<'a>>> = match superclass {
                    Some(token) => match self.lookup_variable(token)? {
                        Value::Callable(Callable::Class(class)) => Some(class),
                        _ => {
                            return Err(
                                LoxError::runtime(token, "Superclass must be a class.").into()
                            )
                        }
                    },
                    None => None,
                };

                // Bound before the methods exist so they can refer to their own
                // class.  A rejected superclass leaves any earlier binding intact.
                self.environment.borrow_mut().declare(name.lexeme);

                // Subclass methods close over an extra frame holding `super`.
                let method_closure: EnvRef<'a> = match &superclass {
                    Some(parent) => {
                        let frame = Environment::child_of(&self.environment);
                        frame
                            .borrow_mut()
                            .define("super", Value::Callable(Callable::Class(Rc::clone(parent))));
                        frame
                    }
                    None => Rc::clone(&self.environment),
                };

                let table: HashMap<&'a str, Rc<LoxFunction<'a>>> = methods
                    .iter()
                    .filter_map(|decl| {
                        let method_name = decl.name_str()?;
                        let method = LoxFunction::new(Rc::clone(decl), Rc::clone(&method_closure));
                        Some((method_name, Rc::new(method)))
                    })
                    .collect();

                let class = LoxClass::new(name.lexeme, superclass, table);
                self.environment.borrow_mut().define(
                    name.lexeme,
                    Value::Callable(Callable::Class(Rc::new(class))),
                );
                Ok(())
            }
        }
    }

    /// Run `statements` with `frame` as the current environment, then put the
    /// previous environment back however the block exits.
    pub fn execute_block(&mut self, statements: &[Stmt<'a>], frame: EnvRef<'a>) -> IResult<'a, ()> {
        debug!("Entering block with {} statements", statements.len());

        let previous = std::mem::replace(&mut self.environment, frame);
        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));
        self.environment = previous;

        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr<'a>) -> IResult<'a, Value<'a>> {
        stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, || self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr<'a>) -> IResult<'a, Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;
                let short_circuit = match operator.token_type {
                    TokenType::OR => left_val.is_truthy(),
                    _ => !left_val.is_truthy(),
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable(name) => Ok(self.lookup_variable(name)?),

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.assign_variable(name, value.clone())?;
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut arg_values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                let Value::Callable(callable) = callee_val else {
                    return Err(
                        LoxError::runtime(paren, "Can only call functions and classes.").into(),
                    );
                };

                if arg_values.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            arg_values.len()
                        ),
                    )
                    .into());
                }

                if self.call_depth >= MAX_CALL_DEPTH {
                    return Err(LoxError::runtime(paren, "Stack overflow.").into());
                }

                self.call_depth += 1;
                let result = callable.call(self, arg_values, paren);
                self.call_depth -= 1;

                result
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => class::get_property(&instance, name.lexeme)
                    .ok_or_else(|| {
                        LoxError::runtime(
                            name,
                            format!("Property '{}' not defined.", name.lexeme),
                        )
                        .into()
                    }),
                _ => Err(LoxError::runtime(name, "Only instances have properties.").into()),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(LoxError::runtime(name, "Only instances have fields.").into());
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name.lexeme, value.clone());
                Ok(value)
            }

            Expr::This(keyword) => Ok(self.lookup_variable(keyword)?),

            Expr::Super { keyword, method } => self.evaluate_super(keyword, method),

            Expr::Lambda(declaration) => {
                let function = LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment));
                Ok(Value::Callable(Callable::Function(Rc::new(function))))
            }
        }
    }

    fn evaluate_unary(&mut self, op: &Token<'a>, right: &Expr<'a>) -> IResult<'a, Value<'a>> {
        let right_val = self.evaluate(right)?;

        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(not_a_number(op, &other).into()),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => Err(LoxError::runtime(op, format!("Invalid unary operator '{}'.", op.lexeme)).into()),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr<'a>,
        op: &Token<'a>,
        right: &Expr<'a>,
    ) -> IResult<'a, Value<'a>> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match op.token_type {
            TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => return Ok(Value::Bool(left_val != right_val)),
            TokenType::PLUS => return add(op, left_val, right_val),
            _ => {}
        }

        let (a, b) = match (&left_val, &right_val) {
            (Value::Number(a), Value::Number(b)) => (*a, *b),
            (Value::Number(_), other) | (other, _) => return Err(not_a_number(op, other).into()),
        };

        let result = match op.token_type {
            TokenType::MINUS => Value::Number(a - b),
            TokenType::STAR => Value::Number(a * b),
            TokenType::SLASH => Value::Number(a / b),
            TokenType::GREATER => Value::Bool(a > b),
            TokenType::GREATER_EQUAL => Value::Bool(a >= b),
            TokenType::LESS => Value::Bool(a < b),
            TokenType::LESS_EQUAL => Value::Bool(a <= b),
            _ => {
                return Err(LoxError::runtime(
                    op,
                    format!("Invalid binary operator '{}'.", op.lexeme),
                )
                .into())
            }
        };

        Ok(result)
    }

    /// `super.method`: look the method up from the superclass, bind it to
    /// the current `this`.
    fn evaluate_super(&mut self, keyword: &Token<'a>, method: &Token<'a>) -> IResult<'a, Value<'a>> {
        let Some(&distance) = self.locals.get(&keyword.id()) else {
            return Err(internal(keyword, "'super' was not resolved").into());
        };

        // The `this` frame sits one link below the `super` frame.
        let superclass = environment::get_at(&self.environment, distance, "super");
        let receiver = distance
            .checked_sub(1)
            .map(|d| environment::get_at(&self.environment, d, "this"));

        let (Ok(Value::Callable(Callable::Class(superclass))), Some(Ok(Value::Instance(receiver)))) =
            (superclass, receiver)
        else {
            return Err(internal(keyword, "'super' or 'this' missing from the environment").into());
        };

        match superclass.find_method(method.lexeme) {
            Some(found) => {
                let bound = BoundMethod::new(receiver, found);
                Ok(Value::Callable(Callable::BoundMethod(Rc::new(bound))))
            }
            None => Err(LoxError::runtime(
                method,
                format!("Property '{}' not defined.", method.lexeme),
            )
            .into()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Variable access
    // ─────────────────────────────────────────────────────────────────────────

    fn lookup_variable(&self, name: &Token<'a>) -> Result<Value<'a>, LoxError> {
        let result = match self.locals.get(&name.id()) {
            Some(&distance) => environment::get_at(&self.environment, distance, name.lexeme)
                .map_err(|lookup| match lookup {
                    Lookup::Undefined => internal(
                        name,
                        &format!("'{}' expected at distance {}", name.lexeme, distance),
                    ),
                    Lookup::Uninitialized => lookup_error(name, lookup),
                }),
            None => self
                .globals
                .borrow()
                .get(name.lexeme)
                .map_err(|lookup| lookup_error(name, lookup)),
        };

        if let Ok(value) = &result {
            debug!("Variable '{}' evaluated to: {}", name.lexeme, value);
        }

        result
    }

    fn assign_variable(&mut self, name: &Token<'a>, value: Value<'a>) -> Result<(), LoxError> {
        match self.locals.get(&name.id()) {
            Some(&distance) => {
                environment::assign_at(&self.environment, distance, name.lexeme, value).map_err(
                    |_| {
                        internal(
                            name,
                            &format!("'{}' expected at distance {}", name.lexeme, distance),
                        )
                    },
                )
            }
            None => self
                .globals
                .borrow_mut()
                .assign(name.lexeme, value)
                .map_err(|lookup| lookup_error(name, lookup)),
        }
    }
}

impl<'a> Default for Interpreter<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// `+` adds numbers; if either side is a string the other is rendered and
/// the two are concatenated.
fn add<'a>(op: &Token<'_>, left: Value<'a>, right: Value<'a>) -> IResult<'a, Value<'a>> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b))),
        (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        (a, b) => Err(LoxError::runtime(
            op,
            format!(
                "Operands must be two numbers or contain a string but found: {} and {}",
                a.diagnostic(),
                b.diagnostic()
            ),
        )
        .into()),
    }
}

fn not_a_number(op: &Token<'_>, operand: &Value<'_>) -> LoxError {
    LoxError::runtime(
        op,
        format!(
            "Operand must be a number but found: {}",
            operand.diagnostic()
        ),
    )
}

fn lookup_error(name: &Token<'_>, lookup: Lookup) -> LoxError {
    match lookup {
        Lookup::Undefined => LoxError::runtime(name, format!("'{}' not defined.", name.lexeme)),
        Lookup::Uninitialized => {
            LoxError::runtime(name, format!("'{}' not initialized.", name.lexeme))
        }
    }
}

/// The resolver and the environment chain disagree.  Not a user error, but
/// still reported rather than panicking.
fn internal(token: &Token<'_>, detail: &str) -> LoxError {
    LoxError::runtime(token, format!("Internal error: {}.", detail))
}
