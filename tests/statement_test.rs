mod common;
use common::*;
use daw_basic::mach::{Runtime, Value};

#[test]
fn test_let_and_implicit_let() {
    let mut r = Runtime::new();
    assert_eq!(enter(&mut r, "LET A=1"), "");
    assert_eq!(enter(&mut r, "B=A+1"), "");
    assert_eq!(enter(&mut r, "PRINT A+B"), "3\n");
}

#[test]
fn test_case_insensitive_names() {
    let mut r = Runtime::new();
    enter(&mut r, "x=1");
    enter(&mut r, "X=X+1");
    assert_eq!(enter(&mut r, "print x"), "2\n");
    assert!(r.is_variable("X"));
    assert!(r.is_variable("x"));
    assert_eq!(r.get_variable_constant("x").unwrap(), Value::Integer(2));
}

#[test]
fn test_unknown_names() {
    let r = Runtime::new();
    assert!(!r.is_variable("NOPE"));
    assert!(!r.is_constant("NOPE"));
    assert!(r.is_constant("PI"));
    assert!(r.is_function("LEN"));
    assert!(r.is_keyword("GOSUB"));
}

#[test]
fn test_colon_separated_statements() {
    let mut r = Runtime::new();
    assert_eq!(enter(&mut r, "A=2 : B=3 : PRINT A*B"), "6\n");
    // stray separators are harmless
    assert_eq!(enter(&mut r, "PRINT 1 :: PRINT 2 :"), "1\n2\n");
    assert_eq!(enter(&mut r, r#"PRINT "A:B" : PRINT 9"#), "A:B\n9\n");
}

#[test]
fn test_assignment_to_builtin_names() {
    let mut r = Runtime::new();
    assert!(enter_err(&mut r, "LET PI=3")
        .contains("Attempt to set variable with name of built-in symbol"));
    assert!(enter_err(&mut r, "LEN=3").contains("Invalid keyword"));
    assert!(enter_err(&mut r, "GOTO=3").contains("Invalid keyword"));
}

#[test]
fn test_let_requires_assignment() {
    let mut r = Runtime::new();
    assert!(enter_err(&mut r, "LET X").contains("LET requires a variable and an assignment"));
}

#[test]
fn test_clr() {
    let mut r = Runtime::new();
    enter(&mut r, "X=1 : Y=2");
    enter(&mut r, "CLR X");
    assert!(!r.is_variable("X"));
    assert!(r.is_variable("Y"));
    enter(&mut r, "CLR");
    assert!(!r.is_variable("Y"));
    assert!(enter_err(&mut r, "CLR NOPE").contains("Attempt to delete unknown variable"));
}

#[test]
fn test_invalid_keyword() {
    let mut r = Runtime::new();
    assert_eq!(
        enter_err(&mut r, "FROBNICATE 1"),
        "SYNTAX ERROR: Invalid keyword 'FROBNICATE'"
    );
}

#[test]
fn test_blank_lines() {
    let mut r = Runtime::new();
    assert!(r.parse_line("", true));
    assert!(r.parse_line("   ", true));
    assert_eq!(r.take_output(), "");
}

#[test]
fn test_print_empty_rest() {
    let mut r = Runtime::new();
    assert_eq!(enter(&mut r, "PRINT"), "\n");
    assert_eq!(enter(&mut r, "REM anything at all"), "");
}

#[test]
fn test_quit_and_exit_end_the_session() {
    let mut r = Runtime::new();
    assert!(!r.parse_line("QUIT", false));
    assert_eq!(r.take_output(), "Good bye\n");
    assert!(!r.had_fatal_error());

    let mut r = Runtime::new();
    assert!(!r.parse_line("EXIT", false));
    assert_eq!(r.take_output(), "");
}

#[test]
fn test_quit_stops_statement_processing() {
    let mut r = Runtime::new();
    assert!(!r.parse_line("QUIT : PRINT 1", false));
    assert_eq!(r.take_output(), "Good bye\n");
}

#[test]
fn test_deferred_only_keywords_in_immediate_mode() {
    let mut r = Runtime::new();
    assert!(enter_err(&mut r, "GOTO 10").contains("Attempt to GOTO from outside a program"));
    assert!(enter_err(&mut r, "GOSUB 10").contains("Attempt to GOSUB from outside a program"));
    assert!(enter_err(&mut r, "RETURN").contains("Attempt to RETURN from outside a program"));
    assert!(enter_err(&mut r, "END").contains("Attempt to END from outside a program"));
    assert!(enter_err(&mut r, "STOP").contains("Attempt to STOP from outside a program"));
    assert!(enter_err(&mut r, "CONT").contains("Cannot continue"));
    assert!(enter_err(&mut r, "THEN 10")
        .contains("THEN is invalid without a preceding IF and condition"));
}

#[test]
fn test_syntax_errors_keep_the_session_alive() {
    let mut r = Runtime::new();
    assert!(r.parse_line("PRINT NOPE", false));
    let _ = r.take_errors();
    assert_eq!(enter(&mut r, "PRINT 1"), "1\n");
    assert!(!r.had_fatal_error());
}

#[test]
fn test_vars_listing() {
    let mut r = Runtime::new();
    enter(&mut r, "X=7");
    let output = enter(&mut r, "VARS");
    assert!(output.starts_with("Constants:\n"));
    assert!(output.contains("PI: Real = 3.141592653589793: Trigonometric Pi value\n"));
    assert!(output.contains("TRUE: Boolean = TRUE: \n"));
    assert!(output.contains("\nVariables:\nX: Integer = 7\n"));
}

#[test]
fn test_functions_and_keywords_listings() {
    let mut r = Runtime::new();
    let output = enter(&mut r, "FUNCTIONS");
    assert!(output.contains("LEFT$: LEFT$( string, len )"));
    assert!(output.contains("RND: RND( [seed] )"));
    let output = enter(&mut r, "KEYWORDS");
    assert!(output.contains("GOSUB\n"));
    assert!(output.contains("PRINT\n"));
}

#[test]
fn test_extensibility_api() {
    let mut r = Runtime::new();
    fn double(args: Vec<Value>) -> Result<Value, daw_basic::lang::Error> {
        match args.first() {
            Some(Value::Integer(n)) => Ok(Value::Integer(n * 2)),
            _ => Ok(Value::Empty),
        }
    }
    r.add_function("DOUBLE", "DOUBLE( x ) -> twice x", double)
        .unwrap();
    assert_eq!(enter(&mut r, "PRINT DOUBLE(21)"), "42\n");
    r.add_constant("ANSWER", "the answer", Value::Integer(42))
        .unwrap();
    assert_eq!(enter(&mut r, "PRINT ANSWER"), "42\n");
    r.add_variable("SEED", Value::Integer(7)).unwrap();
    assert_eq!(enter(&mut r, "PRINT SEED"), "7\n");
}
