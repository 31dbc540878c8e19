use crate::runner::{self, RunOptions};
use std::io::{self, Write};
use tracing::debug;

/// Interactive loop. Each line is its own run with a fresh environment:
/// `BEGIN ... END.` prints the resulting bindings, anything else is
/// evaluated as an expression.
pub fn start(options: &RunOptions) {
    println!("tinypas v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    loop {
        print!("> ");
        if let Err(error) = io::stdout().flush() {
            eprintln!("Error writing prompt: {}", error);
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    println!("Goodbye!");
                    break;
                }

                let mode = runner::detect_mode(line);
                debug!(?mode, "repl line");
                runner::run(line, None, mode, options);
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}
