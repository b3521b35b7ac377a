//! Semantic diagnostics: class registration (01xx) and typing (02xx).

use cool::{DiagnosticCode, EmptyInput, RunOutcome, interpret};

fn run(source: &str) -> RunOutcome {
    interpret(source, "test.cl", &mut EmptyInput)
}

fn assert_rejected_with(source: &str, code: DiagnosticCode) {
    let outcome = run(source);
    assert!(!outcome.succeeded(), "expected failure for: {source}");
    assert!(outcome.value.is_none());
    assert!(
        outcome.diagnostics.find(code).is_some(),
        "expected {code:?} ({}) in: {}",
        code.as_code(),
        outcome.diagnostics
    );
}

const MAIN_STUB: &str = "class Main { main(): Int { 1 }; };";

#[test]
fn duplicate_class() {
    assert_rejected_with(
        &format!("class A {{}}; class A {{}}; {MAIN_STUB}"),
        DiagnosticCode::DuplicateClass,
    );
}

#[test]
fn redefine_builtin() {
    assert_rejected_with(&format!("class Int {{}}; {MAIN_STUB}"), DiagnosticCode::RedefineBuiltin);
    assert_rejected_with(&format!("class Object {{}}; {MAIN_STUB}"), DiagnosticCode::RedefineBuiltin);
}

#[test]
fn inherit_from_primitive() {
    assert_rejected_with(
        &format!("class A inherits String {{}}; {MAIN_STUB}"),
        DiagnosticCode::InheritFromPrimitive,
    );
    assert_rejected_with(
        &format!("class A inherits Bool {{}}; {MAIN_STUB}"),
        DiagnosticCode::InheritFromPrimitive,
    );
}

/// Inheriting from Object or IO is allowed; only the value classes are sealed.
#[test]
fn inherit_from_io_is_allowed() {
    let outcome = run("class Main inherits IO { main(): SELF_TYPE { out_string(\"ok\") }; };");
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(outcome.output, "ok");
}

#[test]
fn missing_main_class() {
    assert_rejected_with("class A {};", DiagnosticCode::MissingMain);
}

#[test]
fn undefined_parent() {
    assert_rejected_with(
        &format!("class A inherits Missing {{}}; {MAIN_STUB}"),
        DiagnosticCode::UndefinedParent,
    );
}

#[test]
fn three_class_cycle_reports_the_chain() {
    let outcome = run(&format!(
        "class A inherits B {{}}; class B inherits C {{}}; class C inherits A {{}}; {MAIN_STUB}"
    ));
    assert!(!outcome.succeeded());
    let cycle = outcome
        .diagnostics
        .find(DiagnosticCode::InheritanceCycle)
        .expect("cycle diagnostic");
    assert!(cycle.message.contains("A -> B -> C -> A"), "message: {}", cycle.message);
}

#[test]
fn attribute_initializer_type_mismatch() {
    assert_rejected_with(
        "class Main { x: Int <- \"s\"; main(): Int { 1 }; };",
        DiagnosticCode::TypeMismatchInAttributeInit,
    );
}

#[test]
fn undefined_variable() {
    assert_rejected_with(
        "class Main { main(): Int { missing }; };",
        DiagnosticCode::UndefinedVariable,
    );
}

#[test]
fn assign_to_wrong_type() {
    assert_rejected_with(
        "class Main { x: Int; main(): Object { x <- \"s\" }; };",
        DiagnosticCode::AssignToWrongType,
    );
}

/// The widening direction is fine: a subclass value fits a parent variable.
#[test]
fn assign_widening_is_allowed() {
    let outcome = run("class A {}; class B inherits A {}; class Main { x: A; main(): A { x <- new B }; };");
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
}

#[test]
fn undefined_type_in_new() {
    assert_rejected_with(
        "class Main { main(): Object { new Missing }; };",
        DiagnosticCode::UndefinedType,
    );
}

#[test]
fn invalid_unary_operations() {
    assert_rejected_with(
        "class Main { main(): Int { ~true }; };",
        DiagnosticCode::InvalidUnaryOperation,
    );
    assert_rejected_with(
        "class Main { main(): Bool { not 1 }; };",
        DiagnosticCode::InvalidUnaryOperation,
    );
}

#[test]
fn invalid_binary_operations() {
    assert_rejected_with(
        "class Main { main(): Int { 1 + \"s\" }; };",
        DiagnosticCode::InvalidBinaryOperation,
    );
    assert_rejected_with(
        "class Main { main(): Bool { true < false }; };",
        DiagnosticCode::InvalidBinaryOperation,
    );
}

#[test]
fn equality_between_different_primitives() {
    assert_rejected_with(
        "class Main { main(): Bool { 1 = \"1\" }; };",
        DiagnosticCode::InvalidBinaryOperation,
    );
    assert_rejected_with(
        "class Main { main(): Bool { true = 0 }; };",
        DiagnosticCode::InvalidBinaryOperation,
    );
}

#[test]
fn equality_between_reference_types_is_allowed() {
    let outcome = run("class A {}; class Main { main(): Bool { new A = new Main }; };");
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
}

#[test]
fn if_predicate_must_be_bool() {
    assert_rejected_with(
        "class Main { main(): Int { if 1 then 2 else 3 fi }; };",
        DiagnosticCode::IfPredicateNotBool,
    );
}

#[test]
fn while_predicate_must_be_bool() {
    assert_rejected_with(
        "class Main { main(): Object { while 1 loop 2 pool }; };",
        DiagnosticCode::WhilePredicateNotBool,
    );
}

#[test]
fn let_binding_type_mismatch() {
    assert_rejected_with(
        "class Main { main(): Int { let x: Int <- \"s\" in x }; };",
        DiagnosticCode::LetBindingTypeMismatch,
    );
}

#[test]
fn static_dispatch_must_conform() {
    assert_rejected_with(
        "class Main { main(): Object { (new Object)@IO.out_string(\"x\") }; };",
        DiagnosticCode::StaticDispatchTypeError,
    );
}

#[test]
fn undefined_method() {
    assert_rejected_with(
        "class Main { main(): Int { self.missing() }; };",
        DiagnosticCode::UndefinedMethod,
    );
}

#[test]
fn wrong_number_of_arguments() {
    assert_rejected_with(
        "class Main inherits IO { main(): Object { out_string() }; };",
        DiagnosticCode::WrongNumberOfArguments,
    );
}

#[test]
fn argument_type_mismatch() {
    assert_rejected_with(
        "class Main inherits IO { main(): Object { out_string(1) }; };",
        DiagnosticCode::ArgumentTypeMismatch,
    );
}

#[test]
fn override_must_preserve_signature() {
    assert_rejected_with(
        &format!(
            "class A {{ f(x: Int): Int {{ x }}; }}; class B inherits A {{ f(x: String): Int {{ 1 }}; }}; {MAIN_STUB}"
        ),
        DiagnosticCode::OverrideMismatch,
    );
    assert_rejected_with(
        &format!("class A {{ f(): Int {{ 1 }}; }}; class B inherits A {{ f(): String {{ \"s\" }}; }}; {MAIN_STUB}"),
        DiagnosticCode::OverrideMismatch,
    );
    assert_rejected_with(
        &format!("class A {{ f(): Int {{ 1 }}; }}; class B inherits A {{ f(x: Int): Int {{ x }}; }}; {MAIN_STUB}"),
        DiagnosticCode::OverrideMismatch,
    );
}

/// An override with the identical signature is fine.
#[test]
fn exact_override_is_allowed() {
    let outcome = run(&format!(
        "class A {{ f(): Int {{ 1 }}; }}; class B inherits A {{ f(): Int {{ 2 }}; }}; {MAIN_STUB}"
    ));
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
}

#[test]
fn method_body_must_conform_to_return_type() {
    assert_rejected_with(
        "class Main { main(): Int { \"s\" }; };",
        DiagnosticCode::MethodBodyTypeMismatch,
    );
}

#[test]
fn assign_to_self_is_rejected() {
    assert_rejected_with(
        "class Main { main(): Object { self <- new Main }; };",
        DiagnosticCode::AssignToSelf,
    );
}

#[test]
fn duplicate_attribute_in_one_class() {
    assert_rejected_with(
        "class Main { x: Int; x: String; main(): Int { 1 }; };",
        DiagnosticCode::DuplicateAttribute,
    );
}

#[test]
fn duplicate_attribute_through_inheritance() {
    assert_rejected_with(
        &format!("class A {{ x: Int; }}; class B inherits A {{ x: Int; }}; {MAIN_STUB}"),
        DiagnosticCode::DuplicateAttribute,
    );
}

#[test]
fn duplicate_method() {
    assert_rejected_with(
        "class Main { main(): Int { 1 }; main(): Int { 2 }; };",
        DiagnosticCode::DuplicateMethod,
    );
}

#[test]
fn duplicate_formal() {
    assert_rejected_with(
        "class Main { f(x: Int, x: Int): Int { x }; main(): Int { 1 }; };",
        DiagnosticCode::DuplicateFormal,
    );
}

#[test]
fn duplicate_case_branch_type() {
    assert_rejected_with(
        "class Main { main(): Int { case 1 of a: Int => 1; b: Int => 2; esac }; };",
        DiagnosticCode::CaseBranchDuplicateType,
    );
}

#[test]
fn self_type_misuses() {
    assert_rejected_with(
        "class Main { self: Int; main(): Int { 1 }; };",
        DiagnosticCode::SelfTypeMisused,
    );
    assert_rejected_with(
        "class Main { f(x: SELF_TYPE): Int { 1 }; main(): Int { 1 }; };",
        DiagnosticCode::SelfTypeMisused,
    );
    assert_rejected_with(
        "class Main { main(): Int { case 1 of x: SELF_TYPE => 1; esac }; };",
        DiagnosticCode::SelfTypeMisused,
    );
    assert_rejected_with(
        "class Main { main(): Int { let self: Int <- 1 in 1 }; };",
        DiagnosticCode::SelfTypeMisused,
    );
}

/// Phase 1 errors keep phase 2 from running, so only the 01xx code shows up.
#[test]
fn phase_one_failure_suppresses_typing_diagnostics() {
    let outcome = run(&format!(
        "class A inherits Missing {{ f(): Int {{ \"s\" }}; }}; {MAIN_STUB}"
    ));
    assert!(!outcome.succeeded());
    assert!(outcome.diagnostics.find(DiagnosticCode::UndefinedParent).is_some());
    assert!(outcome.diagnostics.find(DiagnosticCode::MethodBodyTypeMismatch).is_none());
}

/// Registration errors accumulate: one bad class does not hide the next.
#[test]
fn phase_one_accumulates_across_classes() {
    let outcome = run(&format!(
        "class Int {{}}; class A inherits String {{}}; class B inherits Missing {{}}; {MAIN_STUB}"
    ));
    assert!(!outcome.succeeded());
    assert!(outcome.diagnostics.find(DiagnosticCode::RedefineBuiltin).is_some());
    assert!(outcome.diagnostics.find(DiagnosticCode::InheritFromPrimitive).is_some());
    assert!(outcome.diagnostics.find(DiagnosticCode::UndefinedParent).is_some());
}

/// Typing errors accumulate across classes within phase 2.
#[test]
fn phase_two_accumulates_across_classes() {
    let outcome = run(
        "class A { f(): Int { \"s\" }; }; class Main { main(): Int { missing }; };",
    );
    assert!(!outcome.succeeded());
    assert!(outcome.diagnostics.find(DiagnosticCode::MethodBodyTypeMismatch).is_some());
    assert!(outcome.diagnostics.find(DiagnosticCode::UndefinedVariable).is_some());
}
