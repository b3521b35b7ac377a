use std::{env, fs, process::ExitCode};

use cool::{StdInput, interpret};

const USAGE: &str = "\
Usage: cool [FILE]

Interprets the Cool program in FILE. With no FILE, runs a built-in demo
program. Program output goes to stdout, diagnostics to stderr. Exits 0 on a
clean run, 1 on any error diagnostic or unreadable file.

Options:
  -h, --help    print this help
";

/// Interpreted when no file is given: prints the primes below ten.
const DEMO_PROGRAM: &str = r#"
class Main inherits IO {
    is_prime(n: Int): Bool {
        let divisor: Int <- 2, prime: Bool <- true in {
            while divisor * divisor <= n loop {
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
            while n < 10 loop {
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

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("-h" | "--help") => {
            print!("{USAGE}");
            ExitCode::SUCCESS
        }
        Some(path) => match read_file(path) {
            Ok(source) => run_source(&source, path),
            Err(message) => {
                eprintln!("error: {message}");
                ExitCode::FAILURE
            }
        },
        None => run_source(DEMO_PROGRAM, "<demo>"),
    }
}

fn run_source(source: &str, filename: &str) -> ExitCode {
    let outcome = interpret(source, filename, &mut StdInput);
    print!("{}", outcome.output);
    for diagnostic in outcome.diagnostics.iter() {
        eprintln!("{diagnostic}");
    }
    if outcome.succeeded() {
        if let Some(value) = outcome.value {
            eprintln!("=> {value}");
        }
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn read_file(path: &str) -> Result<String, String> {
    match fs::metadata(path) {
        Ok(metadata) if !metadata.is_file() => return Err(format!("{path} is not a file")),
        Ok(_) => {}
        Err(err) => return Err(format!("cannot read {path}: {err}")),
    }
    fs::read_to_string(path).map_err(|err| format!("cannot read {path}: {err}"))
}
