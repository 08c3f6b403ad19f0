extern crate ansi_term;
extern crate linefeed;

use crate::mach::Runtime;
use ansi_term::Style;
use linefeed::{Interface, ReadResult};
use std::io::Write;
use std::process::ExitCode;

/// Interactive front end: read a line, hand it to the engine, print
/// whatever the engine produced. Errors come out bold.

pub fn main() -> ExitCode {
    match main_loop() {
        Ok(exit_code) => exit_code,
        Err(error) => {
            eprintln!("{}", error);
            ExitCode::FAILURE
        }
    }
}

fn main_loop() -> std::io::Result<ExitCode> {
    let interface = Interface::new("DAW BASIC")?;
    let mut runtime = Runtime::new();
    writeln!(std::io::stdout(), "DAW BASIC v0.1\nREADY")?;

    loop {
        let input = match interface.read_line()? {
            ReadResult::Input(input) => input,
            ReadResult::Signal(_) | ReadResult::Eof => break,
        };
        let more = runtime.parse_line(&input, true);
        flush(&interface, &mut runtime)?;
        if !more {
            break;
        }
        interface.add_history_unique(input);
    }
    if runtime.had_fatal_error() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn flush<T: linefeed::Terminal>(
    interface: &Interface<T>,
    runtime: &mut Runtime,
) -> std::io::Result<()> {
    let output = runtime.take_output();
    if !output.is_empty() {
        interface.write_fmt(format_args!("{}", output))?;
    }
    for error in runtime.take_errors() {
        interface.write_fmt(format_args!("{}\n", Style::new().bold().paint(error)))?;
    }
    Ok(())
}
