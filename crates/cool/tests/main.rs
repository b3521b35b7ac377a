//! End-to-end scenarios: whole programs in, captured output and value out.

use cool::{CollectStringOutput, DiagnosticCode, EmptyInput, Interpreter, RunOutcome, interpret};
use pretty_assertions::assert_eq;

fn run(source: &str) -> RunOutcome {
    interpret(source, "test.cl", &mut EmptyInput)
}

#[test]
fn arithmetic_returns_seven() {
    let outcome = run("class Main { main(): Int { 1 + 2 * 3 }; };");
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    let value = outcome.value.expect("run returned a value");
    assert_eq!(i64::try_from(&value).unwrap(), 7);
    assert_eq!(outcome.output, "");
}

#[test]
fn primes_below_ten() {
    let source = r#"
class Main inherits IO {
    is_prime(n: Int): Bool {
        let divisor: Int <- 2, prime: Bool <- true in {
            while divisor * divisor <= n loop
                {
                    if n = divisor * (n / divisor) then prime <- false else false fi;
                    divisor <- divisor + 1;
                }
            pool;
            prime;
        }
    };

    main(): Object {
        let n: Int <- 2 in {
            while n < 10 loop
                {
                    if is_prime(n) then { out_int(n); out_string(" "); } else false fi;
                    n <- n + 1;
                }
            pool;
            out_string("\n");
        }
    };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(outcome.output, "2 3 5 7 \n");
}

#[test]
fn pascal_row_four() {
    let source = r#"
class Main inherits IO {
    binom(n: Int, k: Int): Int {
        if k = 0 then 1 else
        if k = n then 1 else
        binom(n - 1, k - 1) + binom(n - 1, k)
        fi fi
    };

    main(): Object {
        let k: Int <- 0 in {
            while k <= 4 loop
                {
                    out_int(binom(4, k));
                    out_string(" ");
                    k <- k + 1;
                }
            pool;
            out_string("\n");
        }
    };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(outcome.output, "1 4 6 4 1 \n");
}

#[test]
fn roman_numeral_conversion() {
    let source = r#"
class Main inherits IO {
    roman: String <- "";

    absorb(value: Int, symbol: String, amount: Int): Int {
        let remaining: Int <- amount in {
            while value <= remaining loop
                {
                    roman <- roman.concat(symbol);
                    remaining <- remaining - value;
                }
            pool;
            remaining;
        }
    };

    main(): Object {
        let n: Int <- 2026 in {
            out_int(n);
            out_string(" in Roman: ");
            n <- absorb(1000, "M", n);
            n <- absorb(900, "CM", n);
            n <- absorb(500, "D", n);
            n <- absorb(400, "CD", n);
            n <- absorb(100, "C", n);
            n <- absorb(90, "XC", n);
            n <- absorb(50, "L", n);
            n <- absorb(40, "XL", n);
            n <- absorb(10, "X", n);
            n <- absorb(9, "IX", n);
            n <- absorb(5, "V", n);
            n <- absorb(4, "IV", n);
            n <- absorb(1, "I", n);
            out_string(roman);
            out_string("\n");
        }
    };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(outcome.output, "2026 in Roman: MMXXVI\n");
}

#[test]
fn inheritance_cycle_is_rejected() {
    let outcome = run("class A inherits B {}; class B inherits A {}; class Main {};");
    assert!(!outcome.succeeded());
    assert!(outcome.value.is_none());
    let cycle = outcome
        .diagnostics
        .find(DiagnosticCode::InheritanceCycle)
        .expect("cycle diagnostic present");
    assert_eq!(cycle.code.as_code(), "COOL0106");
}

#[test]
fn division_by_zero_fails_the_run() {
    let outcome = run("class Main { main(): Int { 1 / 0 }; };");
    assert!(!outcome.succeeded());
    assert!(outcome.value.is_none());
    assert_eq!(outcome.output, "");
    let fault = outcome
        .diagnostics
        .find(DiagnosticCode::DivisionByZero)
        .expect("division diagnostic present");
    assert_eq!(fault.code.as_code(), "COOL0301");
}

/// An analyzed interpreter can run any number of times.
#[test]
fn repeat_run() {
    let interpreter = Interpreter::new("class Main { main(): Int { 40 + 2 }; };", "test.cl").unwrap();

    let mut output = CollectStringOutput::new();
    let value = interpreter.run(&mut EmptyInput, &mut output).unwrap();
    assert_eq!(i64::try_from(&value).unwrap(), 42);

    let mut output = CollectStringOutput::new();
    let value = interpreter.run(&mut EmptyInput, &mut output).unwrap();
    assert_eq!(i64::try_from(&value).unwrap(), 42);
}

#[test]
fn value_conversions() {
    let outcome = run(r#"class Main { main(): String { "hi" }; };"#);
    let value = outcome.value.expect("run returned a value");
    assert_eq!(String::try_from(&value).unwrap(), "hi");
    assert!(i64::try_from(&value).is_err());

    let outcome = run("class Main { main(): Bool { not false }; };");
    let value = outcome.value.expect("run returned a value");
    assert!(bool::try_from(&value).unwrap());
}

#[test]
fn output_is_captured_in_source_order() {
    let source = r#"
class Main inherits IO {
    main(): Object {
        out_string("a").out_string("b").out_int(3)
    };
};
"#;
    let outcome = run(source);
    assert!(outcome.succeeded(), "diagnostics: {}", outcome.diagnostics);
    assert_eq!(outcome.output, "ab3");
}
