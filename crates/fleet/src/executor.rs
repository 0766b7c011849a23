//! Sequential command execution on one open session.

use crate::report::{CommandResult, EXIT_CODE_UNKNOWN};
use crate::types::Command;
use ssh::{ExecOutput, ExitStatus, RemoteSession};
use std::error::Error;

/// Runs every command in order, each in a fresh execution context.
///
/// A failing command never stops the ones after it; the result always has
/// one entry per command. Blocks until the last command finishes.
pub fn run<S: RemoteSession>(session: &mut S, commands: &[Command]) -> Vec<CommandResult> {
    commands
        .iter()
        .map(|command| match session.exec(&command.command_line) {
            Ok(output) => completed(&command.name, output),
            Err(error) => CommandResult::failed(&command.name, &error),
        })
        .collect()
}

/// Results for a command list whose execution never finished.
pub fn aborted(commands: &[Command], error: &dyn Error) -> Vec<CommandResult> {
    commands
        .iter()
        .map(|command| CommandResult::failed(&command.name, error))
        .collect()
}

fn completed(name: &str, output: ExecOutput) -> CommandResult {
    let (exit_code, errors) = match output.exit {
        ExitStatus::Code(0) => (0, Vec::new()),
        ExitStatus::Code(code) => (code, vec![format!("command exited with status {code}")]),
        ExitStatus::Missing => {
            let mut errors = vec!["exit code missing".to_string()];
            if let Some(signal) = &output.signal {
                errors.push(format!("terminated by signal {signal}"));
            }
            (EXIT_CODE_UNKNOWN, errors)
        }
    };

    CommandResult {
        name: name.to_string(),
        stdout: output.stdout.trim().to_string(),
        stderr: output.stderr.trim().to_string(),
        exit_code,
        errors,
    }
}
