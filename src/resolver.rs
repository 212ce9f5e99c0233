//! Static resolver pass for the **Lox** interpreter.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of identifier sets).
//! 2. Report static errors (redeclaration, `this`/`super`/`return` out of
//!    context, a class inheriting from itself) and keep walking, so one pass
//!    can surface several of them.
//! 3. Record, for *each* variable occurrence, how many scopes separate it from
//!    its declaration.  Occurrences found in no scope are globals and get no
//!    entry; the interpreter looks those up by name at run time.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::error::{LoxError, Reporter};
use crate::token::{Token, TokenId};

/// Scope distance for every resolved variable occurrence, keyed by the
/// identity of the token that names it.
pub type Locals = HashMap<TokenId, usize>;

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
}

/// Are we inside a class body?  Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'a, 'r> {
    reporter: &'r mut dyn Reporter,
    scopes: Vec<HashSet<&'a str>>,
    locals: Locals,
    current_function: FunctionType,
    current_class: ClassType,
}

impl<'a, 'r> Resolver<'a, 'r> {
    pub fn new(reporter: &'r mut dyn Reporter) -> Self {
        info!("Resolver instantiated");
        Resolver {
            reporter,
            scopes: Vec::new(),
            locals: HashMap::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Walk all top‑level statements and hand back the distance table.
    /// Static errors go to the reporter; check it before evaluating.
    pub fn resolve(mut self, statements: &[Stmt<'a>]) -> Locals {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
        info!("Resolved {} local reference(s)", self.locals.len());
        self.locals
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt<'a>) {
        match stmt {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(*name, *superclass, methods),

            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // The initializer is resolved first, so `var a = a;` reads the
                // enclosing `a`.
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.declare(name);
            }

            Stmt::Function(declaration) => {
                // Declared before the body so the function can recurse.
                if let Some(name) = declaration.name {
                    self.declare(name);
                }
                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(
                        keyword,
                        "'return' keyword should not be used outside a function/method.",
                    );
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &'a Token<'a>,
        superclass: Option<&'a Token<'a>>,
        methods: &[Rc<FunctionDecl<'a>>],
    ) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);

        if let Some(superclass) = superclass {
            if superclass.lexeme == name.lexeme {
                self.error(superclass, "A class cannot inherit itself.");
            }

            self.resolve_local(superclass);

            self.current_class = ClassType::Subclass;
            self.begin_scope();
            self.insert_implicit("super");
        }

        // `this` and `super` are keywords, so no user declaration can collide
        // with these entries.
        self.begin_scope();
        self.insert_implicit("this");

        for method in methods {
            self.resolve_function(method, FunctionType::Method);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr<'a>) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable(tok) => self.resolve_local(tok),

            Expr::Assign { name, value } => {
                self.resolve_expr(value);
                self.resolve_local(name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This(keyword) => {
                if self.current_class == ClassType::None {
                    self.error(
                        keyword,
                        "'this' keyword should not be used outside a method.",
                    );
                } else {
                    self.resolve_local(keyword);
                }
            }

            Expr::Super { keyword, .. } => {
                if self.current_class != ClassType::Subclass {
                    self.error(
                        keyword,
                        "'super' keyword should not be used outside a subclass.",
                    );
                } else {
                    self.resolve_local(keyword);
                }
            }

            Expr::Lambda(declaration) => {
                self.resolve_function(declaration, FunctionType::Function);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Parameters and body share one fresh scope, mirroring the single frame
    /// a call creates.
    fn resolve_function(&mut self, declaration: &FunctionDecl<'a>, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &declaration.params {
            self.declare(param);
        }
        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashSet::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Add `name` to the innermost scope.  Globals are not tracked, so
    /// redefining one at top level is allowed.
    fn declare(&mut self, name: &Token<'a>) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if !scope.insert(name.lexeme) {
            self.error(
                name,
                format!("Identifier '{}' already defined.", name.lexeme),
            );
        }
    }

    fn insert_implicit(&mut self, name: &'static str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name);
        }
    }

    fn error<S: Into<String>>(&mut self, token: &Token<'_>, message: S) {
        self.reporter.report(LoxError::resolve(token, message));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it
    /// unrecorded (global) if no scope declares it.
    fn resolve_local(&mut self, name: &Token<'a>) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains(name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.locals.insert(name.id(), depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
