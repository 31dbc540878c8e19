use clap::{Arg, ArgAction, Command};
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use tinypas::parser::DEFAULT_MAX_DEPTH;
use tinypas::runner::{self, Mode, RunOptions};
use tracing::{info, Level};

fn cli() -> Command {
    Command::new("tinypas")
        .about("Interpreter for a small Pascal-like language")
        .arg(
            Arg::new("file")
                .help("Program file to run ('BEGIN ... END.')")
                .value_name("FILE")
                .index(1)
                .conflicts_with("expr"),
        )
        .arg(
            Arg::new("expr")
                .short('e')
                .long("expr")
                .help("Evaluate a bare arithmetic expression and print its value")
                .value_name("EXPR"),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode")
                .conflicts_with_all(["file", "expr"])
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ast")
                .long("ast")
                .help("Print the syntax tree instead of evaluating")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .help("Maximum nesting of blocks, parentheses and unary operators")
                .value_name("N")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase log verbosity (repeatable)")
                .action(ArgAction::Count),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    let level = match matches.get_count("verbose") {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let options = RunOptions {
        max_depth: matches
            .get_one::<usize>("max-depth")
            .copied()
            .unwrap_or(DEFAULT_MAX_DEPTH),
    };
    let dump = matches.get_flag("ast");

    let ok = if matches.get_flag("interactive") {
        tinypas::start_repl(&options);
        true
    } else if let Some(expr) = matches.get_one::<String>("expr") {
        info!("evaluating expression from command line");
        execute(expr, None, Mode::Expression, &options, dump)
    } else if let Some(file_path) = matches.get_one::<String>("file") {
        run_file(file_path, &options, dump)
    } else {
        // No input given.
        tinypas::start_repl(&options);
        true
    };

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn execute(source: &str, filename: Option<&str>, mode: Mode, options: &RunOptions, dump: bool) -> bool {
    if dump {
        runner::dump_ast(source, filename, mode, options)
    } else {
        runner::run(source, filename, mode, options)
    }
}

fn run_file(path: &str, options: &RunOptions, dump: bool) -> bool {
    let path = Path::new(path);
    info!(path = %path.display(), "running file");

    match fs::read_to_string(path) {
        Ok(source) => {
            let filename = path.display().to_string();
            execute(&source, Some(&filename), Mode::Program, options, dump)
        }
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            false
        }
    }
}
