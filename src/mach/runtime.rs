use super::eval::convert_indices;
use super::function::{self, BasicFunction};
use super::keyword::Keyword;
use super::operation::{is_word_operator, Operation};
use super::program::Program;
use super::symbol::Symbols;
use super::val::{classify, Value, ValueKind};
use crate::error;
use crate::lang::{scan, Error, ErrorKind, LineNumber};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Immediate,
    Deferred,
}

/// One live FOR loop: counter name, bounds, and the line holding the FOR
/// so NEXT can jump back to the statement after it.
#[derive(Debug, Clone)]
struct ForFrame {
    variable: String,
    end: Value,
    step: Value,
    line: LineNumber,
}

/// ## The engine
///
/// One `Runtime` is one BASIC session: symbol environment, program store,
/// GOSUB stack, and cursor. RUN drives the program inside an owned child
/// engine so the session at the prompt stays untouched.
///
/// The engine performs no terminal I/O. Printed text accumulates in an
/// output channel and reported errors in an error channel; the host drains
/// both after each `parse_line`.
pub struct Runtime {
    symbols: Symbols,
    program: Program,
    return_stack: Vec<LineNumber>,
    loop_stack: Vec<ForFrame>,
    cursor: usize,
    run_mode: RunMode,
    exiting: bool,
    has_syntax_error: bool,
    has_fatal_error: bool,
    child: Option<Box<Runtime>>,
    output: String,
    errors: Vec<String>,
}

impl Default for Runtime {
    fn default() -> Runtime {
        Runtime::new()
    }
}

impl Runtime {
    pub fn new() -> Runtime {
        let mut symbols = Symbols::new();
        install_builtins(&mut symbols).expect("builtin registry is collision-free");
        Runtime {
            symbols,
            program: Program::new(),
            return_stack: Vec::new(),
            loop_stack: Vec::new(),
            cursor: 0,
            run_mode: RunMode::Immediate,
            exiting: false,
            has_syntax_error: false,
            has_fatal_error: false,
            child: None,
            output: String::new(),
            errors: Vec::new(),
        }
    }

    /// Feed one line of input to the engine. Returns false when the session
    /// should end: QUIT/EXIT at the prompt, or a fatal error.
    pub fn parse_line(&mut self, text: &str, show_ready: bool) -> bool {
        self.exiting = false;
        match self.dispatch_line(text, show_ready) {
            Ok(more) => more,
            Err(error) => self.report(error, show_ready),
        }
    }

    fn dispatch_line(&mut self, text: &str, show_ready: bool) -> Result<bool> {
        let (head, rest) = scan::split_keyword(text);
        if head.is_empty() {
            return Ok(true);
        }
        if classify(head) == ValueKind::Integer {
            let number = Value::from_numeric(head)?.to_integer()?;
            if number < 0 {
                return Err(error!(Syntax; "Line numbers cannot be negative"));
            }
            if rest.is_empty() {
                self.program.remove_line(number);
            } else {
                self.program.add_line(number, rest);
            }
            return Ok(true);
        }
        for statement in scan::split_statements(text)? {
            if statement.trim().is_empty() {
                continue;
            }
            let (head, rest) = scan::split_keyword(statement);
            let result = match Keyword::from_name(head) {
                Some(keyword) => self.exec_keyword(keyword, rest)?,
                None => {
                    if !self.let_helper(statement, false)? {
                        return Err(error!(Syntax;
                            "Invalid keyword '{}'",
                            head.to_ascii_uppercase()
                        ));
                    }
                    true
                }
            };
            if self.exiting {
                return Ok(self.run_mode != RunMode::Immediate);
            }
            if !result {
                return Ok(false);
            }
        }
        if show_ready && self.run_mode == RunMode::Immediate {
            self.println("\nREADY");
        }
        Ok(true)
    }

    /// Record an error on the error channel. SYNTAX keeps the session
    /// alive; FATAL ends it.
    fn report(&mut self, error: Error, show_ready: bool) -> bool {
        let error = if self.run_mode == RunMode::Deferred {
            error.in_line_number(self.current_line_number())
        } else {
            error
        };
        self.errors.push(error.to_string());
        match error.kind() {
            ErrorKind::Syntax => {
                self.has_syntax_error = true;
                if show_ready {
                    self.println("\nREADY");
                }
                true
            }
            ErrorKind::Fatal => {
                self.has_fatal_error = true;
                false
            }
        }
    }

    fn exec_keyword(&mut self, keyword: Keyword, rest: &str) -> Result<bool> {
        match keyword {
            Keyword::New => self.kw_new(),
            Keyword::Clr => self.kw_clr(rest),
            Keyword::Delete => self.kw_delete(rest),
            Keyword::Dim => self.kw_dim(rest),
            Keyword::Let => self.let_helper(rest, true),
            Keyword::Stop => self.kw_stop(),
            Keyword::Cont => self.kw_cont(),
            Keyword::Goto => self.kw_goto(rest),
            Keyword::Gosub => self.kw_gosub(rest),
            Keyword::Return => self.kw_return(),
            Keyword::Print => self.kw_print(rest),
            Keyword::Quit => self.kw_quit(),
            Keyword::Exit => self.kw_exit(),
            Keyword::End => self.kw_end(),
            Keyword::Rem => Ok(true),
            Keyword::List => self.kw_list(),
            Keyword::Run => self.kw_run(rest),
            Keyword::Vars => self.kw_vars(),
            Keyword::Functions => self.kw_functions(),
            Keyword::Keywords => self.kw_keywords(),
            Keyword::Then => {
                Err(error!(Syntax; "THEN is invalid without a preceding IF and condition"))
            }
            Keyword::If => self.kw_if(rest),
            Keyword::For => self.kw_for(rest),
            Keyword::Next => self.kw_next(rest),
        }
    }

    /// Assignment, explicit or implicit. With `show_error` off a statement
    /// that does not even look like an assignment reports back to the
    /// dispatcher instead of raising.
    fn let_helper(&mut self, statement: &str, show_error: bool) -> Result<bool> {
        let parts = scan::split_in_two_on_char(statement, '=');
        if parts.len() != 2 {
            if show_error {
                return Err(error!(Syntax; "LET requires a variable and an assignment"));
            }
            return Ok(false);
        }
        let (target, expression) = (parts[0], parts[1]);
        let bare = match target.find('(') {
            Some(bracket) => target[..bracket].trim(),
            None => target,
        };
        if self.symbols.is_function(bare)
            || self.symbols.is_keyword(bare)
            || self.symbols.is_constant(bare)
        {
            if show_error {
                return Err(error!(Syntax; "Attempt to set variable with name of built-in symbol"));
            }
            return Ok(false);
        }
        let value = self.symbols.evaluate(expression)?;
        match target.find('(') {
            Some(bracket) => {
                let close = match target.rfind(')') {
                    Some(close) => close,
                    None => return Err(error!(Syntax; "Unclosed bracket on '{}'", target)),
                };
                let arguments = self
                    .symbols
                    .evaluate_parameters(&target[bracket + 1..close])?;
                let indices = convert_indices(arguments)?;
                self.symbols.array_store(bare, &indices, value)?;
            }
            None => self.symbols.store_variable(target, value)?,
        }
        Ok(true)
    }

    fn kw_new(&mut self) -> Result<bool> {
        self.child = None;
        self.program.clear();
        self.symbols.clear_variables();
        Ok(true)
    }

    fn kw_clr(&mut self, rest: &str) -> Result<bool> {
        let rest = rest.trim();
        if rest.is_empty() {
            self.symbols.clear_variables();
        } else {
            self.symbols.remove_variable(rest)?;
        }
        Ok(true)
    }

    fn kw_delete(&mut self, rest: &str) -> Result<bool> {
        if classify(rest) != ValueKind::Integer {
            return Err(error!(Syntax;
                "DELETE requires an INTEGER parameter for the line number to delete"
            ));
        }
        let number = Value::from_numeric(rest)?.to_integer()?;
        self.program.remove_line(number);
        Ok(true)
    }

    fn kw_dim(&mut self, rest: &str) -> Result<bool> {
        let parts = scan::split_in_two_on_char(rest, '(');
        if parts.len() != 2 {
            return Err(error!(Syntax; "Could not find parameters surrounded by ( )"));
        }
        let end = scan::find_end_of_bracket(parts[1])?;
        let sizes = self.symbols.evaluate_parameters(&parts[1][..end])?;
        if sizes.is_empty() || sizes.len() > 2 {
            return Err(error!(Syntax;
                "Must specify at least 1 size parameter to DIM and optionally 2"
            ));
        }
        let dimensions = convert_indices(sizes)?;
        self.symbols.dim_array(parts[0], dimensions)?;
        Ok(true)
    }

    fn kw_stop(&mut self) -> Result<bool> {
        if self.run_mode == RunMode::Immediate {
            return Err(error!(Syntax; "Attempt to STOP from outside a program"));
        }
        let number = self.current_line_number().unwrap_or(0);
        self.println(&format!("BREAK IN {}", number));
        self.exiting = true;
        Ok(true)
    }

    fn kw_cont(&mut self) -> Result<bool> {
        if self.run_mode == RunMode::Deferred {
            return Err(error!(Syntax; "Attempt to CONT from inside a program"));
        }
        let mut child = match self.child.take() {
            Some(child) => child,
            None => return Err(error!(Syntax; "Cannot continue")),
        };
        child.run_mode = RunMode::Deferred;
        let result = child.continue_run();
        self.adopt_child_channels(&mut child);
        self.child = Some(child);
        result
    }

    fn continue_run(&mut self) -> Result<bool> {
        match self.program.get(self.cursor + 1) {
            Some(line) => {
                let number = line.number;
                Ok(self.run(Some(number)))
            }
            None => Err(error!(Syntax; "Cannot continue. End of program reached")),
        }
    }

    fn kw_goto(&mut self, rest: &str) -> Result<bool> {
        if self.run_mode == RunMode::Immediate {
            return Err(error!(Syntax; "Attempt to GOTO from outside a program"));
        }
        if classify(rest) != ValueKind::Integer {
            return Err(error!(Syntax; "Can only GOTO line numbers"));
        }
        let number = Value::from_numeric(rest)?.to_integer()?;
        if number < 0 {
            return Err(error!(Syntax; "Attempt to jump to an invalid line"));
        }
        // land one before the target so the run loop's advance hits it
        self.cursor = self.find_cursor(number)? - 1;
        Ok(true)
    }

    fn kw_gosub(&mut self, rest: &str) -> Result<bool> {
        if self.run_mode == RunMode::Immediate {
            return Err(error!(Syntax; "Attempt to GOSUB from outside a program"));
        }
        let current = match self.program.get(self.cursor) {
            Some(line) => line.number,
            None => return Err(error!(Fatal; "Program cursor out of range")),
        };
        self.return_stack.push(current);
        self.kw_goto(rest)
    }

    fn kw_return(&mut self) -> Result<bool> {
        if self.run_mode == RunMode::Immediate {
            return Err(error!(Syntax; "Attempt to RETURN from outside a program"));
        }
        let number = match self.return_stack.pop() {
            Some(number) => number,
            None => {
                return Err(error!(Syntax; "Attempt to RETURN without a preceding GOSUB"));
            }
        };
        // resume at the line holding the GOSUB; the advance moves past it
        self.cursor = self.find_cursor(number)?;
        Ok(true)
    }

    fn kw_print(&mut self, rest: &str) -> Result<bool> {
        let rest = rest.trim();
        if rest.is_empty() {
            self.println("");
            return Ok(true);
        }
        let value = self.symbols.evaluate(rest)?;
        self.println(&value.to_string());
        Ok(true)
    }

    fn kw_quit(&mut self) -> Result<bool> {
        self.println("Good bye");
        self.exiting = true;
        Ok(true)
    }

    fn kw_exit(&mut self) -> Result<bool> {
        self.exiting = true;
        Ok(true)
    }

    fn kw_end(&mut self) -> Result<bool> {
        if self.run_mode == RunMode::Immediate {
            return Err(error!(Syntax; "Attempt to END from outside a program"));
        }
        self.exiting = true;
        Ok(true)
    }

    fn kw_list(&mut self) -> Result<bool> {
        self.program.sort();
        let listing = self.program.listing();
        self.print(&listing);
        self.println("");
        Ok(true)
    }

    fn kw_run(&mut self, rest: &str) -> Result<bool> {
        self.program.sort();
        let rest = rest.trim();
        let line_number = match classify(rest) {
            ValueKind::Integer => {
                let number = Value::from_numeric(rest)?.to_integer()?;
                if number >= 0 {
                    Some(number)
                } else {
                    None
                }
            }
            _ => None,
        };
        let mut child = match self.child.take() {
            Some(child) if line_number.is_none() => child,
            _ => Box::new(Runtime::new()),
        };
        child.run_mode = RunMode::Deferred;
        child.program = self.program.clone();
        let result = child.run(line_number);
        self.adopt_child_channels(&mut child);
        self.child = Some(child);
        Ok(result)
    }

    fn kw_vars(&mut self) -> Result<bool> {
        let constants = self.symbols.list_constants();
        let variables = self.symbols.list_variables();
        self.print(&format!(
            "Constants:\n{}\n\nVariables:\n{}\n",
            constants, variables
        ));
        Ok(true)
    }

    fn kw_functions(&mut self) -> Result<bool> {
        let listing = self.symbols.list_functions();
        self.print(&listing);
        self.println("");
        Ok(true)
    }

    fn kw_keywords(&mut self) -> Result<bool> {
        let listing = self.symbols.list_keywords();
        self.print(&listing);
        self.println("");
        Ok(true)
    }

    /// IF <condition> THEN <statement> | IF <condition> THEN/GOTO <line>.
    /// The condition runs to the first THEN or GOTO outside quotes and
    /// brackets; a purely numeric action is shorthand for a GOTO.
    fn kw_if(&mut self, rest: &str) -> Result<bool> {
        let bytes = rest.as_bytes();
        let mut clause_start = None;
        let mut pos = 0;
        while pos < bytes.len() {
            match bytes[pos] {
                b'"' => pos += scan::find_end_of_string(&rest[pos..])?,
                b'(' => pos += scan::find_end_of_bracket(&rest[pos..])?,
                _ => {
                    if matches_word(rest, pos, "THEN") || matches_word(rest, pos, "GOTO") {
                        clause_start = Some(pos);
                        break;
                    }
                }
            }
            pos += 1;
        }
        let clause_start = match clause_start {
            Some(pos) => pos,
            None => {
                return Err(error!(Syntax; "Unable to find end of condition in IF keyword"));
            }
        };
        let condition = self.symbols.evaluate(&rest[..clause_start])?;
        if !condition.to_boolean()? {
            return Ok(true);
        }
        let action = rest[clause_start + 4..].trim();
        if classify(action) == ValueKind::Integer {
            let action = format!("GOTO {}", action);
            return Ok(self.parse_line(&action, false));
        }
        Ok(self.parse_line(action, false))
    }

    /// FOR <var> = <start> TO <end> [STEP <step>]. The counter takes the
    /// start value and the loop body always runs once; the bounds check
    /// happens at NEXT.
    fn kw_for(&mut self, rest: &str) -> Result<bool> {
        if self.run_mode == RunMode::Immediate {
            return Err(error!(Syntax; "Attempt to FOR from outside a program"));
        }
        let parts = scan::split_in_two_on_char(rest, '=');
        if parts.len() != 2 {
            return Err(error!(Syntax; "FOR requires a counter variable assignment"));
        }
        let to_pos = match find_loop_word(parts[1], "TO")? {
            Some(pos) => pos,
            None => return Err(error!(Syntax; "FOR requires a TO clause")),
        };
        let (end_text, step_text) = {
            let bounds = &parts[1][to_pos + 2..];
            match find_loop_word(bounds, "STEP")? {
                Some(pos) => (&bounds[..pos], Some(&bounds[pos + 4..])),
                None => (bounds, None),
            }
        };
        let start = self.symbols.evaluate(&parts[1][..to_pos])?;
        require_numeric(&start, "Start")?;
        let end = self.symbols.evaluate(end_text)?;
        require_numeric(&end, "End")?;
        let step = match step_text {
            Some(text) => {
                let step = self.symbols.evaluate(text)?;
                require_numeric(&step, "Step")?;
                step
            }
            None => Value::Integer(1),
        };
        let line = match self.program.get(self.cursor) {
            Some(line) => line.number,
            None => return Err(error!(Fatal; "Program cursor out of range")),
        };
        self.symbols.store_variable(parts[0], start)?;
        self.loop_stack.push(ForFrame {
            variable: parts[0].to_ascii_uppercase(),
            end,
            step,
            line,
        });
        Ok(true)
    }

    /// Advance the innermost FOR counter; jump back to the loop line while
    /// the counter stays within its bound, pop the loop otherwise.
    fn kw_next(&mut self, rest: &str) -> Result<bool> {
        if self.run_mode == RunMode::Immediate {
            return Err(error!(Syntax; "Attempt to NEXT from outside a program"));
        }
        let frame = match self.loop_stack.last() {
            Some(frame) => frame.clone(),
            None => return Err(error!(Syntax; "NEXT without a preceding FOR")),
        };
        let rest = rest.trim();
        if !rest.is_empty() && rest.to_ascii_uppercase() != frame.variable {
            return Err(error!(Syntax;
                "NEXT '{}' does not match FOR '{}'",
                rest.to_ascii_uppercase(),
                frame.variable
            ));
        }
        let advanced = Operation::sum(
            self.symbols.fetch_variable_constant(&frame.variable)?,
            frame.step.clone(),
        )?;
        let more = if frame.step.to_numeric()? >= 0.0 {
            Operation::less_equal(advanced.clone(), frame.end.clone())?
        } else {
            Operation::greater_equal(advanced.clone(), frame.end.clone())?
        };
        self.symbols.store_variable(&frame.variable, advanced)?;
        if matches!(more, Value::Boolean(true)) {
            self.cursor = self.find_cursor(frame.line)?;
        } else {
            self.loop_stack.pop();
        }
        Ok(true)
    }

    /// Execute the stored program from `line_number`, or from the first
    /// real line. Returns false when the session must end.
    pub fn run(&mut self, line_number: Option<LineNumber>) -> bool {
        self.has_syntax_error = false;
        match line_number {
            Some(number) => match self.find_cursor(number) {
                Ok(index) => self.cursor = index,
                Err(error) => return self.report(error, false),
            },
            None => self.cursor = self.program.first_index(),
        }
        loop {
            let line = match self.program.get(self.cursor) {
                Some(line) => line.clone(),
                None => break,
            };
            if line.number >= 0 {
                if let Err(error) = self.symbols.add_constant(
                    "CURRENT_LINE",
                    "Current line of program execution",
                    Value::Integer(line.number),
                ) {
                    return self.report(error, false);
                }
                if !self.parse_line(&line.text, false) {
                    return false;
                }
                if self.has_syntax_error {
                    self.errors.push(format!("Error was on line {}", line.number));
                    self.has_syntax_error = false;
                    break;
                }
                if self.exiting {
                    self.exiting = false;
                    break;
                }
            }
            self.cursor += 1;
        }
        true
    }

    /// Sorted index of a program line, SYNTAX when absent.
    fn find_cursor(&mut self, line_number: LineNumber) -> Result<usize> {
        self.program.sort();
        match self.program.find_index(line_number) {
            Some(index) => Ok(index),
            None => Err(error!(Syntax; "Attempt to jump to an invalid line")),
        }
    }

    fn current_line_number(&self) -> Option<LineNumber> {
        match self.program.get(self.cursor) {
            Some(line) if line.number >= 0 => Some(line.number),
            _ => None,
        }
    }

    fn adopt_child_channels(&mut self, child: &mut Runtime) {
        self.output.push_str(&child.take_output());
        self.errors.extend(child.take_errors());
        if child.had_fatal_error() {
            self.has_fatal_error = true;
        }
    }

    fn print(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn println(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn take_errors(&mut self) -> Vec<String> {
        std::mem::take(&mut self.errors)
    }

    pub fn had_fatal_error(&self) -> bool {
        self.has_fatal_error
    }

    pub fn evaluate(&self, text: &str) -> Result<Value> {
        self.symbols.evaluate(text)
    }

    pub fn add_variable(&mut self, name: &str, value: Value) -> Result<()> {
        self.symbols.add_variable(name, value)
    }

    pub fn add_constant(&mut self, name: &str, description: &str, value: Value) -> Result<()> {
        self.symbols.add_constant(name, description, value)
    }

    pub fn add_function(
        &mut self,
        name: &str,
        description: &str,
        func: BasicFunction,
    ) -> Result<()> {
        self.symbols.add_function(name, description, func)
    }

    pub fn add_line(&mut self, number: LineNumber, text: &str) {
        self.program.add_line(number, text);
    }

    pub fn remove_line(&mut self, number: LineNumber) {
        self.program.remove_line(number);
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.symbols.is_variable(name)
    }

    pub fn is_constant(&self, name: &str) -> bool {
        self.symbols.is_constant(name)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.symbols.is_function(name)
    }

    pub fn is_keyword(&self, name: &str) -> bool {
        self.symbols.is_keyword(name)
    }

    pub fn get_variable_constant(&self, name: &str) -> Result<Value> {
        self.symbols.fetch_variable_constant(name)
    }

    pub fn list_variables(&self) -> String {
        self.symbols.list_variables()
    }

    pub fn list_constants(&self) -> String {
        self.symbols.list_constants()
    }

    pub fn list_functions(&self) -> String {
        self.symbols.list_functions()
    }

    pub fn list_keywords(&self) -> String {
        self.symbols.list_keywords()
    }
}

/// True when `word` spells out at `pos`, upper-cased.
fn matches_word(value: &str, pos: usize, word: &str) -> bool {
    let end = pos + word.len();
    end <= value.len() && value.as_bytes()[pos..end].eq_ignore_ascii_case(word.as_bytes())
}

/// Position of a whitespace-delimited loop word (TO, STEP) outside quotes
/// and brackets.
fn find_loop_word(value: &str, word: &str) -> Result<Option<usize>> {
    let bytes = value.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        match bytes[pos] {
            b'"' => pos += scan::find_end_of_string(&value[pos..])?,
            b'(' => pos += scan::find_end_of_bracket(&value[pos..])?,
            _ => {
                if pos > 0
                    && matches!(bytes[pos - 1], b' ' | b'\t')
                    && is_word_operator(word, value, pos)
                {
                    return Ok(Some(pos));
                }
            }
        }
        pos += 1;
    }
    Ok(None)
}

fn require_numeric(value: &Value, role: &str) -> Result<()> {
    match value.kind() {
        ValueKind::Integer | ValueKind::Real => Ok(()),
        _ => Err(error!(Syntax; "{} value must be numeric", role)),
    }
}

fn install_builtins(symbols: &mut Symbols) -> Result<()> {
    for (name, description, func) in function::builtins() {
        symbols.add_function(name, description, func)?;
    }
    symbols.add_constant("TRUE", "", Value::Boolean(true))?;
    symbols.add_constant("FALSE", "", Value::Boolean(false))?;
    symbols.add_constant(
        "PI",
        "Trigonometric Pi value",
        Value::Real(std::f64::consts::PI),
    )?;
    Ok(())
}
