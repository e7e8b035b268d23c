//! Terminal chat shell for CodeMentor.
//!
//! Reads questions line by line, prints replies as they stream in, and
//! understands a handful of commands (`/help`, `/clear`, `/quit`, `sair`).

pub mod commands;
pub mod shell;

pub use commands::{parse_command, Command};
pub use shell::{ctrl_c, run_shell, TerminalPrinter};
