//! completion command - generate shell completion scripts

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::args::Cli;

/// Render the completion script for the given shell.
pub fn script(shell: Shell) -> String {
    let mut command = Cli::command();
    let mut buffer = Vec::new();
    clap_complete::generate(shell, &mut command, "ploom", &mut buffer);
    String::from_utf8_lossy(&buffer).into_owned()
}
