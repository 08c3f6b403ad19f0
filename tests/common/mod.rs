use daw_basic::mach::Runtime;

/// Feed one line to the engine and return what it printed.
pub fn enter(runtime: &mut Runtime, line: &str) -> String {
    runtime.parse_line(line, false);
    let _ = runtime.take_errors();
    runtime.take_output()
}

/// Feed one line and return the reported errors instead of the output.
pub fn enter_err(runtime: &mut Runtime, line: &str) -> String {
    runtime.parse_line(line, false);
    let _ = runtime.take_output();
    runtime.take_errors().join("\n")
}
