//! Runtime faults (03xx) and boundary behaviors of the evaluator.

use cool::{
    CollectStringOutput, DiagnosticCode, EmptyInput, Interpreter, ResourceLimits, RunOutcome, interpret,
};
use pretty_assertions::assert_eq;

fn run(source: &str) -> RunOutcome {
    interpret(source, "test.cl", &mut EmptyInput)
}

fn assert_fault(source: &str, code: DiagnosticCode) -> RunOutcome {
    let outcome = run(source);
    assert!(!outcome.succeeded(), "expected a fault for: {source}");
    assert!(outcome.value.is_none());
    assert!(
        outcome.diagnostics.find(code).is_some(),
        "expected {code:?} ({}) in: {}",
        code.as_code(),
        outcome.diagnostics
    );
    outcome
}

#[test]
fn abort_writes_then_raises() {
    let source = r#"
class Main inherits IO {
    main(): Object { { out_string("before "); abort(); out_string("after"); } };
};
"#;
    let outcome = assert_fault(source, DiagnosticCode::AbortCalled);
    assert_eq!(outcome.output, "before Abort called from class Main\n");
}

#[test]
fn dispatch_on_void_receiver() {
    let source = r#"
class A { f(): Int { 1 }; };
class Main { main(): Int { let x: A in x.f() }; };
"#;
    assert_fault(source, DiagnosticCode::DispatchOnVoid);
}

#[test]
fn case_on_void() {
    let source = r#"
class A {};
class Main { main(): Int { case (let x: A in x) of y: A => 1; esac }; };
"#;
    assert_fault(source, DiagnosticCode::CaseOnVoid);
}

#[test]
fn case_without_matching_branch() {
    let source = r#"
class A {};
class B {};
class Main { main(): Int { case new B of a: A => 1; esac }; };
"#;
    assert_fault(source, DiagnosticCode::CaseNoBranchMatches);
}

#[test]
fn case_selects_most_specific_branch() {
    let source = r#"
class A {};
class B inherits A {};
class Main {
    main(): Int {
        case new B of
            o: Object => 0;
            a: A => 1;
            b: B => 2;
        esac
    };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(i64::try_from(&outcome.value.unwrap()).unwrap(), 2);
}

#[test]
fn case_falls_back_to_ancestor_branch() {
    let source = r#"
class A {};
class B inherits A {};
class Main { main(): Int { case new B of o: Object => 0; esac }; };
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(i64::try_from(&outcome.value.unwrap()).unwrap(), 0);
}

#[test]
fn substr_boundaries() {
    let ok = run(r#"class Main { main(): String { "hello".substr(1, 3) }; };"#);
    assert_eq!(String::try_from(&ok.value.unwrap()).unwrap(), "ell");

    let whole = run(r#"class Main { main(): String { "hello".substr(0, "hello".length()) }; };"#);
    assert_eq!(String::try_from(&whole.value.unwrap()).unwrap(), "hello");

    let empty = run(r#"class Main { main(): String { "hello".substr(5, 0) }; };"#);
    assert_eq!(String::try_from(&empty.value.unwrap()).unwrap(), "");

    assert_fault(
        r#"class Main { main(): String { "hello".substr(0, 6) }; };"#,
        DiagnosticCode::SubstrOutOfRange,
    );
    assert_fault(
        r#"class Main { main(): String { "hello".substr(0 - 1, 2) }; };"#,
        DiagnosticCode::SubstrOutOfRange,
    );
}

/// `class Main {};` passes analysis; the missing entry point is diagnosed at
/// evaluator entry as an undefined-method fault.
#[test]
fn main_without_main_method() {
    assert_fault("class Main {};", DiagnosticCode::UndefinedMethod);
}

#[test]
fn runaway_recursion_is_diagnosed() {
    let interpreter = Interpreter::new("class Main { f(): Int { f() }; main(): Int { f() }; };", "test.cl")
        .unwrap()
        .with_limits(ResourceLimits {
            max_recursion_depth: 64,
        });
    let error = interpreter
        .run(&mut EmptyInput, &mut CollectStringOutput::new())
        .unwrap_err();
    assert_eq!(error.code, DiagnosticCode::RuntimeError);
    assert!(error.message.contains("recursion depth"), "message: {}", error.message);
}

/// Call chains at least 200 deep run to completion under the default limit.
#[test]
fn deep_recursion_succeeds() {
    let source = r#"
class Main {
    sum(n: Int): Int { if n = 0 then 0 else n + sum(n - 1) fi };
    main(): Int { sum(250) };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(i64::try_from(&outcome.value.unwrap()).unwrap(), 31375);
}

#[test]
fn copy_is_shallow_and_distinct() {
    let source = r#"
class Counter {
    count: Int <- 1;
    bump(): Int { count <- count + 1 };
    get(): Int { count };
};
class Main inherits IO {
    main(): Object {
        let a: Counter <- new Counter, b: Counter <- a.copy(), c: Counter <- a in {
            a.bump();
            out_int(a.get());
            out_int(b.get());
            out_int(c.get());
            if a = b then out_string("same") else out_string("distinct") fi;
            if a = c then out_string("|aliased") else out_string("|separate") fi;
        }
    };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    // The copy kept the pre-bump value; the alias sees the write.
    assert_eq!(outcome.output, "212distinct|aliased");
}

#[test]
fn copy_of_self_type_preserves_dynamic_class() {
    let source = r#"
class A {};
class B inherits A {};
class Main { main(): String { (new B)@Object.copy().type_name() }; };
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(String::try_from(&outcome.value.unwrap()).unwrap(), "B");
}

#[test]
fn isvoid_behaviors() {
    let source = r#"
class Foo {};
class Main inherits IO {
    show(b: Bool): SELF_TYPE { if b then out_string("t") else out_string("f") fi };
    main(): Object {
        {
            show(isvoid new String);
            show(isvoid (let x: String in x));
            show(isvoid (let x: Foo in x));
            show(isvoid new Foo);
            show(isvoid (while false loop 0 pool));
        }
    };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(outcome.output, "fftft");
}

#[test]
fn attribute_defaults() {
    let source = r#"
class Main inherits IO {
    i: Int;
    s: String;
    b: Bool;
    main(): Object {
        {
            out_int(i);
            out_int(s.length());
            if b then out_string("t") else out_string("f") fi;
        }
    };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(outcome.output, "00f");
}

/// Attribute initializers run root-to-leaf in source order; earlier slots
/// (including inherited ones) are visible to later initializers.
#[test]
fn attribute_initialization_order() {
    let source = r#"
class Base { x: Int <- 10; };
class Main inherits Base {
    y: Int <- x + 5;
    z: Int <- y * 2;
    main(): Int { z };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(i64::try_from(&outcome.value.unwrap()).unwrap(), 30);
}

#[test]
fn equality_semantics() {
    let source = r#"
class A {};
class Main inherits IO {
    show(b: Bool): SELF_TYPE { if b then out_string("t") else out_string("f") fi };
    main(): Object {
        let a: A <- new A, void_a: A, void_b: A in {
            show("ab".concat("c") = "abc");
            show(1 + 1 = 2);
            show(new A = new A);
            show(a = a);
            show(void_a = void_b);
            show(void_a = a);
        }
    };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(outcome.output, "ttfttf");
}

#[test]
fn negation_and_wrapping_arithmetic() {
    let outcome = run("class Main { main(): Int { ~5 + 1 }; };");
    assert_eq!(i64::try_from(&outcome.value.unwrap()).unwrap(), -4);

    let outcome = run("class Main { main(): Int { ~0 }; };");
    assert_eq!(i64::try_from(&outcome.value.unwrap()).unwrap(), 0);
}

#[test]
fn while_evaluates_to_void() {
    let outcome = run("class Main { main(): Bool { isvoid (while false loop 0 pool) }; };");
    assert!(bool::try_from(&outcome.value.unwrap()).unwrap());
}

#[test]
fn output_before_fault_is_preserved() {
    let source = r#"
class Main inherits IO {
    main(): Int { { out_string("partial"); 1 / 0; } };
};
"#;
    let outcome = assert_fault(source, DiagnosticCode::DivisionByZero);
    assert_eq!(outcome.output, "partial");
}
