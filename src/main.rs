use std::process::ExitCode;

fn main() -> ExitCode {
    daw_basic::term::main()
}
