use sexp_bridge::diagnostics::{report_bridge_error, report_io_error};
use sexp_bridge::{from_wire, to_wire};
use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("Usage: sexp-bridge [decode|normalize] <file>");
        return ExitCode::FAILURE;
    }

    let command = &args[1];
    let filename = &args[2];

    let content = match fs::read_to_string(filename) {
        Ok(content) => content,
        Err(err) => {
            report_io_error(Path::new(filename), &err);
            return ExitCode::FAILURE;
        }
    };

    let value = match from_wire(&content) {
        Ok(value) => value,
        Err(err) => {
            report_bridge_error(filename, &content, &err);
            return ExitCode::FAILURE;
        }
    };

    match command.as_str() {
        "decode" => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        "normalize" => match to_wire(&value) {
            Ok(text) => {
                println!("{text}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                report_bridge_error(filename, &content, &err);
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("Unknown command: {command}");
            ExitCode::FAILURE
        }
    }
}
