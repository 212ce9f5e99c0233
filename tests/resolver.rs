use pretty_assertions::assert_eq;

use rox::error::{Diagnostics, Reporter};
use rox::lox;
use rox::resolver::{Locals, Resolver};
use rox::token::Token;

/// Distances recorded for every occurrence of `name`, in source order.
/// Declarations and globals have none.
fn distances(tokens: &[Token<'_>], locals: &Locals, name: &str) -> Vec<Option<usize>> {
    tokens
        .iter()
        .filter(|t| t.lexeme == name)
        .map(|t| locals.get(&t.id()).copied())
        .collect()
}

/// Resolve `source`, which must scan and parse cleanly, then hand the token
/// buffer, the table and the resolver's diagnostics to `check`.
fn resolve_with(source: &str, check: impl FnOnce(&[Token<'_>], &Locals, &Diagnostics)) {
    let mut front = Diagnostics::new();
    let tokens = lox::scan(source, &mut front);
    let statements = lox::parse(&tokens, &mut front);
    assert!(!front.has_errors(), "front end errors: {:?}", front.messages());

    let mut diagnostics = Diagnostics::new();
    let locals = Resolver::new(&mut diagnostics).resolve(&statements);

    check(&tokens, &locals, &diagnostics);
}

fn static_errors(source: &str) -> Vec<String> {
    let mut messages = Vec::new();
    resolve_with(source, |_, _, diagnostics| messages = diagnostics.messages());
    messages
}

#[test]
fn shadowing_resolves_each_reference_to_its_nearest_declaration() {
    let source = r#"
        var a = 1;
        {
            var a = 2;
            {
                print a;
            }
            print a;
        }
        print a;
    "#;

    resolve_with(source, |tokens, locals, diagnostics| {
        assert!(!diagnostics.has_errors());
        assert_eq!(
            distances(tokens, locals, "a"),
            vec![None, None, Some(1), Some(0), None]
        );
    });
}

#[test]
fn closures_record_distance_through_the_function_scope() {
    let source = r#"
        fun outer() {
            var x = 1;
            fun inner() {
                return x;
            }
            x = 2;
            return inner;
        }
    "#;

    resolve_with(source, |tokens, locals, diagnostics| {
        assert!(!diagnostics.has_errors());
        assert_eq!(distances(tokens, locals, "x"), vec![None, Some(1), Some(0)]);
        // `inner` is declared in outer's scope and read from the same scope.
        assert_eq!(distances(tokens, locals, "inner"), vec![None, Some(0)]);
    });
}

#[test]
fn initializer_reads_the_enclosing_binding() {
    let source = "{ var a = 1; { var a = a; } }";

    resolve_with(source, |tokens, locals, diagnostics| {
        assert!(!diagnostics.has_errors());
        assert_eq!(distances(tokens, locals, "a"), vec![None, None, Some(1)]);
    });
}

#[test]
fn resolving_twice_yields_the_same_table() {
    let source = r#"
        fun make() {
            var count = 0;
            fun inc() { count = count + 1; return count; }
            return inc;
        }
        class A { get() { return this; } }
        class B < A { get() { return super.get(); } }
    "#;

    let mut front = Diagnostics::new();
    let tokens = lox::scan(source, &mut front);
    let statements = lox::parse(&tokens, &mut front);
    assert!(!front.has_errors());

    let mut first_errors = Diagnostics::new();
    let first = Resolver::new(&mut first_errors).resolve(&statements);
    let mut second_errors = Diagnostics::new();
    let second = Resolver::new(&mut second_errors).resolve(&statements);

    assert!(!first_errors.has_errors());
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn this_and_super_resolve_inside_methods() {
    let source = r#"
        class A { name() { return "a"; } }
        class B < A {
            name() { return super.name(); }
            me() { fun inner() { return this; } return inner; }
        }
    "#;

    resolve_with(source, |tokens, locals, diagnostics| {
        assert!(!diagnostics.has_errors());
        // method scope -> `this` scope -> `super` scope
        assert_eq!(distances(tokens, locals, "super"), vec![Some(2)]);
        // inner scope -> method scope -> `this` scope
        assert_eq!(distances(tokens, locals, "this"), vec![Some(2)]);
    });
}

#[test]
fn top_level_declarations_are_globals() {
    let source = "var a = 1; var a = 2; fun f() { return a; }";

    resolve_with(source, |tokens, locals, diagnostics| {
        assert!(!diagnostics.has_errors());
        assert_eq!(distances(tokens, locals, "a"), vec![None, None, None]);
    });
}

#[test]
fn this_outside_a_method_is_rejected() {
    assert_eq!(
        static_errors("print this;"),
        vec!["'this' keyword should not be used outside a method."]
    );
    assert_eq!(
        static_errors("fun f() { return this; }"),
        vec!["'this' keyword should not be used outside a method."]
    );
}

#[test]
fn duplicate_local_declaration_is_rejected() {
    assert_eq!(
        static_errors("{ var a = 1; var a = 2; }"),
        vec!["Identifier 'a' already defined."]
    );
    assert_eq!(
        static_errors("fun f(a, a) {}"),
        vec!["Identifier 'a' already defined."]
    );
}

#[test]
fn return_outside_a_function_is_rejected() {
    assert_eq!(
        static_errors("return 1;"),
        vec!["'return' keyword should not be used outside a function/method."]
    );
    assert!(static_errors("var f = fun () { return 1; };").is_empty());
}

#[test]
fn class_inheriting_itself_is_rejected() {
    assert_eq!(
        static_errors("class A < A {}"),
        vec!["A class cannot inherit itself."]
    );
}

#[test]
fn super_outside_a_subclass_is_rejected() {
    assert_eq!(
        static_errors("class A { m() { return super.m(); } }"),
        vec!["'super' keyword should not be used outside a subclass."]
    );
    assert_eq!(
        static_errors("fun f() { return super.m; }"),
        vec!["'super' keyword should not be used outside a subclass."]
    );
}

#[test]
fn one_pass_reports_every_static_error() {
    let source = r#"
        print this;
        return;
        { var a; var a; }
    "#;

    let mut lines = Vec::new();
    resolve_with(source, |_, _, diagnostics| {
        lines = diagnostics
            .errors()
            .iter()
            .filter_map(|e| e.line())
            .collect();
    });

    assert_eq!(lines, vec![2, 3, 4]);
}
