//! The interactive shell: a line-based REPL over the authenticated
//! session and the client manager. One command at a time, each awaited
//! to completion before the next prompt.

pub mod command;
pub mod prompt;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;

use crate::auth::Session;
use crate::clients::ClientManager;
use crate::output;

const PROMPT: &str = "os> ";

fn welcome(session: &Session) -> String {
    let project = session
        .credentials()
        .project_name
        .as_deref()
        .unwrap_or("(unscoped)");
    format!(
        "\n{}\n\nAuthenticated against {} for project {}.\nType {} for the command list, {} to leave.\n",
        "Welcome to the OpenStack console.".bold(),
        session.auth_endpoint(),
        project,
        "help".green(),
        "exit".green()
    )
}

/// Run the shell until the operator exits or stdin closes.
pub async fn run(session: Arc<Session>, manager: ClientManager) -> Result<()> {
    println!("{}", welcome(&session));

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("{}", PROMPT);
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            println!();
            return Ok(());
        }

        match command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(cmd)) => {
                if command::dispatch(cmd, &session, &manager).await? {
                    return Ok(());
                }
            }
            Err(message) => output::print_error(&message),
        }
    }
}
