mod common;

use pretty_assertions::assert_eq;

use common::{output_of, run, runtime_error_of, Session, SharedBuf};
use rox::{Diagnostics, Lox, RunStatus};

#[test]
fn block_shadowing_restores_the_outer_binding() {
    assert_eq!(
        output_of(r#"var a = "1"; { var a = 2; print a; } print a;"#),
        vec!["2", "1"]
    );
}

#[test]
fn closures_capture_their_defining_environment() {
    let source = r#"
        fun adder(x) {
            fun inner(y) { return x + y; }
            return inner;
        }
        var add5 = adder(5);
        print add5(3);
    "#;

    assert_eq!(output_of(source), vec!["8"]);
}

#[test]
fn closures_resolve_lexically_not_dynamically() {
    let source = r#"
        var a = "global";
        {
            fun show() { print a; }
            show();
            var a = "block";
            show();
        }
    "#;

    assert_eq!(output_of(source), vec!["global", "global"]);
}

#[test]
fn closure_created_in_a_loop_sees_later_mutation() {
    let source = r#"
        var saved = nil;
        for (var i = 0; i < 3; i = i + 1) {
            if (saved == nil) {
                fun show() { print i; }
                saved = show;
            }
        }
        saved();
    "#;

    assert_eq!(output_of(source), vec!["3"]);
}

#[test]
fn closures_from_one_frame_share_it() {
    let source = r#"
        fun pair() {
            var n = 0;
            fun inc() { n = n + 1; }
            fun get() { return n; }
            inc();
            inc();
            return get;
        }
        print pair()();
    "#;

    assert_eq!(output_of(source), vec!["2"]);
}

#[test]
fn plus_concatenates_when_either_side_is_a_string() {
    assert_eq!(
        output_of(r#"print "a" + 1; print 1 + "a"; print "x" + nil; print 1 + 2;"#),
        vec!["a1", "1a", "xnil", "3"]
    );
}

#[test]
fn arithmetic_on_a_string_names_the_operand() {
    assert_eq!(
        runtime_error_of(r#"print 1 - "a";"#),
        r#"Operand must be a number but found: "a""#
    );
    assert_eq!(
        runtime_error_of(r#"print -"a";"#),
        r#"Operand must be a number but found: "a""#
    );
    assert_eq!(
        runtime_error_of("print nil + 1;"),
        "Operands must be two numbers or contain a string but found: nil and 1"
    );
}

#[test]
fn division_by_zero_is_not_an_error() {
    assert_eq!(
        output_of("print 1 / 0 > 1000; print 7 / 2;"),
        vec!["true", "3.5"]
    );
}

#[test]
fn uninitialized_variable_reads_fail_until_assigned() {
    let mut session = Session::new();

    let declared = session.run("var x;");
    assert_eq!(declared.status, RunStatus::Ok);

    let read = session.run("print x;");
    assert_eq!(read.status, RunStatus::RuntimeError);
    assert_eq!(read.errors, vec!["'x' not initialized."]);

    let assigned = session.run("x = 5; print x;");
    assert_eq!(assigned.status, RunStatus::Ok);
    assert_eq!(assigned.output, vec!["5"]);
}

#[test]
fn locals_can_be_declared_without_a_value() {
    assert_eq!(output_of("{ var x; x = 5; print x; }"), vec!["5"]);
    assert_eq!(
        runtime_error_of("{ var x; print x; }"),
        "'x' not initialized."
    );
}

#[test]
fn undefined_names_are_runtime_errors() {
    assert_eq!(runtime_error_of("print nope;"), "'nope' not defined.");
    assert_eq!(runtime_error_of("nope = 1;"), "'nope' not defined.");
}

#[test]
fn wrong_argument_count_reports_expected_and_actual() {
    assert_eq!(
        runtime_error_of("fun zero() {} zero(1);"),
        "Expected 0 arguments but got 1."
    );
    assert_eq!(
        runtime_error_of("fun one(a) {} one();"),
        "Expected 1 arguments but got 0."
    );
    assert_eq!(
        runtime_error_of("fun two(a, b) {} two(1, 2, 3);"),
        "Expected 2 arguments but got 3."
    );
    assert_eq!(
        runtime_error_of("clock(1);"),
        "Expected 0 arguments but got 1."
    );
}

#[test]
fn only_callables_can_be_called() {
    assert_eq!(
        runtime_error_of(r#""not a function"();"#),
        "Can only call functions and classes."
    );
}

#[test]
fn logical_operators_return_the_deciding_operand() {
    let source = r#"
        print nil or "fallback";
        print "first" or "second";
        print 1 and 2;
        print false and 1;
        print nil or false;
    "#;

    assert_eq!(
        output_of(source),
        vec!["fallback", "first", "2", "false", "false"]
    );
}

#[test]
fn logical_operators_short_circuit() {
    let source = r#"
        var touched = false;
        fun touch() { touched = true; return true; }
        var r = true or touch();
        var s = false and touch();
        print touched;
    "#;

    assert_eq!(output_of(source), vec!["false"]);
}

#[test]
fn only_nil_and_false_are_falsy() {
    let source = r#"
        if (0) print "0 is truthy";
        if ("") print "empty string is truthy";
        if (nil) print "unreachable"; else print "nil is falsy";
        print !false;
        print !!nil;
    "#;

    assert_eq!(
        output_of(source),
        vec![
            "0 is truthy",
            "empty string is truthy",
            "nil is falsy",
            "true",
            "false"
        ]
    );
}

#[test]
fn equality_uses_values_for_primitives_and_identity_otherwise() {
    let source = r#"
        fun f() {}
        fun g() {}
        print 1 == 1;
        print "a" == "a";
        print nil == false;
        print nil == nil;
        print f == f;
        print f == g;
        print 1 != "1";
    "#;

    assert_eq!(
        output_of(source),
        vec!["true", "true", "false", "true", "true", "false", "true"]
    );
}

#[test]
fn recursion_and_return_unwinding() {
    let source = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(15);

        fun first_over(limit) {
            var i = 0;
            while (true) {
                i = i + 1;
                { if (i * i > limit) return i; }
            }
        }
        print first_over(50);

        fun nothing() { return; }
        print nothing();
    "#;

    assert_eq!(output_of(source), vec!["610", "8", "nil"]);
}

#[test]
fn anonymous_functions_are_values() {
    let source = r#"
        var add = fun (a, b) { return a + b; };
        print add(1, 2);
        fun apply(f, x) { return f(x); }
        print apply(fun (n) { return n * 10; }, 4);
        print fun () {};
    "#;

    assert_eq!(output_of(source), vec!["3", "40", "<anonymous fn>"]);
}

#[test]
fn function_values_render_by_kind() {
    assert_eq!(
        output_of("fun f() {} print f; print clock;"),
        vec!["<fn f>", "<native fn clock>"]
    );
    assert_eq!(output_of("print clock() > 0;"), vec!["true"]);
}

#[test]
fn static_errors_prevent_any_execution() {
    let outcome = run(r#"print "before"; return 1;"#);

    assert_eq!(outcome.status, RunStatus::StaticError);
    assert_eq!(outcome.output, Vec::<String>::new());
    assert_eq!(
        outcome.errors,
        vec!["'return' keyword should not be used outside a function/method."]
    );
}

#[test]
fn runtime_error_aborts_the_rest_of_the_program() {
    let outcome = run(r#"print "one"; print -nil; print "two";"#);

    assert_eq!(outcome.status, RunStatus::RuntimeError);
    assert_eq!(outcome.output, vec!["one"]);
}

#[test]
fn runtime_error_does_not_corrupt_the_next_run() {
    let mut session = Session::new();

    let failed = session.run("var a = 1; { var b = 2; print missing; }");
    assert_eq!(failed.status, RunStatus::RuntimeError);

    let next = session.run("print a; { var c = 3; print c; }");
    assert_eq!(next.status, RunStatus::Ok);
    assert_eq!(next.output, vec!["1", "3"]);
    assert!(next.errors.is_empty());

    // The block's frame did not leak into the globals.
    assert_eq!(session.run("print b;").errors, vec!["'b' not defined."]);
}

#[test]
fn functions_from_earlier_runs_keep_working() {
    let mut session = Session::new();

    session.run(
        r#"
        fun counter() {
            var n = 0;
            fun inc() { n = n + 1; return n; }
            return inc;
        }
        var c = counter();
        "#,
    );

    assert_eq!(session.run("print c(); print c();").output, vec!["1", "2"]);
    assert_eq!(session.run("print c();").output, vec!["3"]);
}

#[test]
fn globals_may_be_redefined() {
    assert_eq!(output_of("var a = 1; var a = a + 1; print a;"), vec!["2"]);
}

#[test]
fn syntax_errors_are_reported_as_static_errors() {
    let outcome = run("print 1 +; print 2;");

    assert_eq!(outcome.status, RunStatus::StaticError);
    assert!(outcome.output.is_empty());
    assert_eq!(outcome.errors.len(), 1);
}

#[test]
fn deep_recursion_within_the_call_limit_succeeds() {
    let source = r#"
        fun depth(n) {
            if (n == 0) return 0;
            return 1 + depth(n - 1);
        }
        print depth(2000);
    "#;

    assert_eq!(output_of(source), vec!["2000"]);
}

#[test]
fn unbounded_recursion_is_reported_not_fatal() {
    let mut session = Session::new();

    let overflow = session.run("fun forever(n) { return forever(n + 1); } forever(0);");
    assert_eq!(overflow.status, RunStatus::RuntimeError);
    assert_eq!(overflow.errors, vec!["Stack overflow."]);

    // The depth counter unwound with the error.
    let next = session.run("fun one() { return 1; } print one();");
    assert_eq!(next.status, RunStatus::Ok);
    assert_eq!(next.output, vec!["1"]);
}

#[test]
fn rejected_input_leaves_the_session_usable() {
    let mut session = Session::new();

    assert_eq!(session.run("fun broken( {").status, RunStatus::StaticError);
    assert_eq!(session.run("return 1;").status, RunStatus::StaticError);

    let next = session.run("fun twice(x) { return x * 2; } print twice(21);");
    assert_eq!(next.status, RunStatus::Ok);
    assert_eq!(next.output, vec!["42"]);
}

#[test]
fn diagnostics_carry_line_and_byte_offset() {
    let mut lox = Lox::with_output(Box::new(SharedBuf::default()));

    let mut runtime = Diagnostics::new();
    let status = lox.run("var a = 1;\nprint a - \"x\";", &mut runtime);
    assert_eq!(status, RunStatus::RuntimeError);

    // Located at the `-` operator.
    let error = &runtime.errors()[0];
    assert_eq!(error.line(), Some(2));
    assert_eq!(error.position(), Some(19));
    assert_eq!(
        error.to_string(),
        r#"[line 2] Runtime error: Operand must be a number but found: "x""#
    );

    let mut resolve = Diagnostics::new();
    assert_eq!(lox.run("print this;", &mut resolve), RunStatus::StaticError);

    let error = &resolve.errors()[0];
    assert_eq!(error.line(), Some(1));
    assert_eq!(error.position(), Some(6));
}
