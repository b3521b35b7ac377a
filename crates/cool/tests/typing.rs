//! SELF_TYPE, dispatch resolution, and inheritance-lattice properties.

use cool::{DiagnosticCode, EmptyInput, Interpreter, RunOutcome, SymbolTable, interpret};
use pretty_assertions::assert_eq;

fn run(source: &str) -> RunOutcome {
    interpret(source, "test.cl", &mut EmptyInput)
}

fn returned_string(source: &str) -> String {
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    String::try_from(&outcome.value.expect("run returned a value")).unwrap()
}

#[test]
fn dynamic_dispatch_uses_the_runtime_class() {
    let source = r#"
class A { speak(): String { "a" }; };
class B inherits A { speak(): String { "b" }; };
class Main { main(): String { (new B).speak() }; };
"#;
    assert_eq!(returned_string(source), "b");
}

#[test]
fn static_dispatch_uses_the_named_class() {
    let source = r#"
class A { speak(): String { "a" }; };
class B inherits A { speak(): String { "b" }; };
class Main { main(): String { (new B)@A.speak() }; };
"#;
    assert_eq!(returned_string(source), "a");
}

#[test]
fn dispatch_through_an_inherited_method() {
    let source = r#"
class A { speak(): String { "a" }; };
class B inherits A {};
class Main { main(): String { (new B).speak() }; };
"#;
    assert_eq!(returned_string(source), "a");
}

#[test]
fn new_self_type_instantiates_the_dynamic_class() {
    let source = r#"
class A { fresh(): SELF_TYPE { new SELF_TYPE }; };
class B inherits A {};
class Main { main(): String { (new B).fresh().type_name() }; };
"#;
    assert_eq!(returned_string(source), "B");
}

/// SELF_TYPE returns make builder-style chaining type-check on subclasses.
#[test]
fn self_type_return_supports_chaining() {
    let source = r#"
class Main inherits IO {
    main(): Object { out_string("a").out_string("b").out_int(3) };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(outcome.output, "ab3");
}

#[test]
fn self_type_attribute_starts_void() {
    let source = r#"
class Main {
    twin: SELF_TYPE;
    main(): Bool { isvoid twin };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert!(bool::try_from(&outcome.value.unwrap()).unwrap());
}

#[test]
fn if_joins_branches_at_the_lub() {
    let source = r#"
class A { id(): Int { 1 }; };
class B inherits A {};
class C inherits A {};
class Main {
    pick(p: Bool): A { if p then new B else new C fi };
    main(): Int { pick(true).id() };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(i64::try_from(&outcome.value.unwrap()).unwrap(), 1);
}

#[test]
fn case_result_is_the_lub_of_branches() {
    // Both branches produce a subclass of A, so the case usable as an A.
    let source = r#"
class A { id(): Int { 7 }; };
class B inherits A {};
class C inherits A {};
class Main {
    main(): Int {
        (case new B of b: B => new C; o: Object => new B; esac).id()
    };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(i64::try_from(&outcome.value.unwrap()).unwrap(), 7);
}

fn lattice() -> SymbolTable {
    let source = "class A {}; class B inherits A {}; class C inherits A {}; class Main { main(): Int { 1 }; };";
    Interpreter::new(source, "test.cl").unwrap().symbols().clone()
}

#[test]
fn lub_is_commutative_and_idempotent() {
    let symbols = lattice();
    assert_eq!(symbols.lub("B", "C"), symbols.lub("C", "B"));
    assert_eq!(&*symbols.lub("B", "B"), "B");
    assert_eq!(&*symbols.lub("B", "C"), "A");
    assert_eq!(&*symbols.lub("B", "Int"), "Object");
    assert_eq!(&*symbols.lub("A", "Object"), "Object");
}

#[test]
fn conformance_follows_parent_links() {
    let symbols = lattice();
    assert!(symbols.conforms("B", "A"));
    assert!(symbols.conforms("B", "Object"));
    assert!(symbols.conforms("B", "B"));
    assert!(!symbols.conforms("A", "B"));
    assert!(!symbols.conforms("Int", "String"));
    let expected: Vec<std::rc::Rc<str>> = vec!["B".into(), "A".into(), "Object".into()];
    assert_eq!(symbols.ancestry("B"), expected);
}

/// Analysis is pure: the same program yields the same diagnostics.
#[test]
fn analysis_is_deterministic() {
    let source = "class A { f(): Int { \"s\" }; }; class Main { main(): Object { missing }; };";
    let first = run(source);
    let second = run(source);
    assert!(!first.succeeded());
    assert_eq!(first.diagnostics, second.diagnostics);

    let codes: Vec<DiagnosticCode> = first.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(codes, vec![
        DiagnosticCode::MethodBodyTypeMismatch,
        DiagnosticCode::UndefinedVariable
    ]);
}

#[test]
fn string_concat_is_associative() {
    let source = r#"
class Main {
    main(): Bool { ("a".concat("b")).concat("c") = "a".concat("b".concat("c")) };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert!(bool::try_from(&outcome.value.unwrap()).unwrap());
}
