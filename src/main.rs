use std::process::exit;

use colored::Colorize;

fn main() {
    match examresult::app::run_cli() {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!(
                "{}{}{} {}",
                "[".bold().white(),
                "ERR".bold().red(),
                "]".bold().white(),
                e
            );
            exit(1);
        }
    }
}
