//! Interactive REPL.
//!
//! Each line is compiled and run against a persistent value stack, a
//! persistent token table (definitions made on one line stay callable on
//! the next) and a persistent machine (variable scopes survive between
//! lines). Errors print and leave the previous stack untouched.

use std::io::{self, BufRead, Write};

use crate::lexer::{self, TokenTable};
use crate::machine::Machine;
use crate::prelude;
use crate::value::{format_stack, Value};

/// REPL configuration.
#[derive(Debug, Clone)]
pub struct ReplConfig {
    /// Prompt string.
    pub prompt: String,
    /// Echo the stack after every line.
    pub show_stack: bool,
    /// Install the prelude words on startup.
    pub prelude: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "tin> ".to_string(),
            show_stack: true,
            prelude: true,
        }
    }
}

/// Interactive shell around a persistent machine.
pub struct Repl {
    config: ReplConfig,
    table: TokenTable,
    machine: Machine,
    stack: Vec<Value>,
}

impl Repl {
    /// Create a new REPL with default config.
    pub fn new() -> Self {
        Self::with_config(ReplConfig::default())
    }

    /// Create with custom config.
    pub fn with_config(config: ReplConfig) -> Self {
        let table = if config.prelude {
            prelude::table()
        } else {
            TokenTable::new()
        };
        Self {
            config,
            table,
            machine: Machine::new(),
            stack: Vec::new(),
        }
    }

    /// Run the interactive loop until EOF or `:quit`.
    pub fn run(&mut self) -> io::Result<()> {
        println!("Tin REPL");
        println!("Type a program, :stack, :clear, :words, or :quit.");

        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("{}", self.config.prompt);
            io::stdout().flush()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => break,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match line {
                ":quit" | ":q" => break,
                ":stack" => println!("{}", format_stack(&self.stack)),
                ":clear" => {
                    self.stack.clear();
                    println!("stack cleared");
                }
                ":words" => {
                    let names: Vec<&str> = self.table.definitions().collect();
                    if names.is_empty() {
                        println!("no definitions");
                    } else {
                        println!("{}", names.join(" "));
                    }
                }
                _ => self.eval(line),
            }
        }
        Ok(())
    }

    /// Compile and run one line against the persistent stack.
    fn eval(&mut self, line: &str) {
        let program = match lexer::compile(line, &mut self.table) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("error: {}", e);
                return;
            }
        };

        match self.machine.execute(&program, self.stack.clone()) {
            Ok(stack) => {
                self.stack = stack;
                if self.config.show_stack {
                    println!("{}", format_stack(&self.stack));
                }
            }
            Err(e) => {
                eprintln!("error: {}", e);
                self.machine.reset_control();
            }
        }
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}
