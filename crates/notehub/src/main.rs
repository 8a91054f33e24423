//! `notehub`: browse, edit and journal in a GitHub repository of Markdown
//! notes from the terminal.

/// CLI module - command-line interface for notehub
mod cli;

fn main() {
    cli::run_cli();
}
