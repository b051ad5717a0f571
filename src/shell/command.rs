//! Shell command parsing and dispatch.

use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

use super::prompt;
use crate::auth::Session;
use crate::clients::{ClientError, ClientManager};
use crate::output;

/// Everything the shell knows how to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Services,
    Catalog,
    Token,
    Client {
        service: String,
        version: Option<String>,
        region: Option<String>,
    },
    Get {
        service: String,
        path: String,
    },
    Delete {
        service: String,
        path: String,
    },
    Exit,
}

/// Parse one input line. `Ok(None)` means a blank line.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&name, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let command = match name {
        "help" | "?" => Command::Help,
        "services" => Command::Services,
        "catalog" => Command::Catalog,
        "token" => Command::Token,
        "exit" | "quit" => Command::Exit,
        "client" => {
            let mut service = None;
            let mut version = None;
            let mut region = None;
            let mut rest = args.iter();
            while let Some(&arg) = rest.next() {
                match arg {
                    "--version" => {
                        version = Some(
                            rest.next()
                                .ok_or("--version needs a value")?
                                .to_string(),
                        )
                    }
                    "--region" => {
                        region = Some(
                            rest.next()
                                .ok_or("--region needs a value")?
                                .to_string(),
                        )
                    }
                    _ if service.is_none() => service = Some(arg.to_string()),
                    _ => return Err(format!("unexpected argument: {}", arg)),
                }
            }
            Command::Client {
                service: service.ok_or("usage: client <service> [--version V] [--region R]")?,
                version,
                region,
            }
        }
        "get" | "delete" => {
            let [service, path] = args else {
                return Err(format!("usage: {} <service> <path>", name));
            };
            if name == "get" {
                Command::Get {
                    service: service.to_string(),
                    path: path.to_string(),
                }
            } else {
                Command::Delete {
                    service: service.to_string(),
                    path: path.to_string(),
                }
            }
        }
        other => return Err(format!("unknown command: {} (try 'help')", other)),
    };

    Ok(Some(command))
}

const HELP: &str = "\
Commands:
  services                                 list known services and default versions
  catalog                                  show the session's service catalog
  token                                    show the current token and its expiry
  client <service> [--version V] [--region R]
                                           construct a client and show its endpoint
  get <service> <path>                     GET a path from a service, print JSON
  delete <service> <path>                  DELETE a path (asks for confirmation)
  help                                     this text
  exit                                     leave the shell";

/// Run one command. Returns `true` when the shell should exit.
pub async fn dispatch(
    command: Command,
    session: &Session,
    manager: &ClientManager,
) -> Result<bool> {
    match command {
        Command::Exit => return Ok(true),
        Command::Help => println!("{}", HELP),
        Command::Services => {
            println!("{}", output::format_services(manager.available_services()));
        }
        Command::Catalog => {
            let _timer = output::Timer::start("catalog");
            match session.catalog().await {
                Ok(catalog) => println!("{}", output::format_catalog(&catalog)),
                Err(e) => output::print_error(&format!("catalog failed: {}", e)),
            }
        }
        Command::Token => {
            let _timer = output::Timer::start("token");
            match session.token_data().await {
                Ok(data) => {
                    println!("token:   {}", output::truncate(&data.token, 24));
                    if let Some(minutes) = data.minutes_until_expiry() {
                        println!("expires: in {} minutes", minutes);
                    }
                    if let Some(ref project) = data.project_name {
                        println!("project: {}", project);
                    }
                    if let Some(ref user) = data.user_name {
                        println!("user:    {}", user);
                    }
                }
                Err(e) => output::print_error(&format!("token retrieval failed: {}", e)),
            }
        }
        Command::Client {
            service,
            version,
            region,
        } => {
            let _timer = output::Timer::start(format!("client {}", service));
            match manager
                .get_client(&service, version.as_deref(), region.as_deref())
                .await
            {
                Ok(client) => {
                    println!(
                        "{} v{} {} -> {}",
                        client.service().to_string().green(),
                        client.version(),
                        client.region().unwrap_or("(no region)"),
                        client.endpoint()
                    );
                }
                Err(e) => print_client_error(&e),
            }
        }
        Command::Get { service, path } => {
            let _timer = output::Timer::start(format!("get {} {}", service, path));
            match manager.get_client(&service, None, None).await {
                Ok(client) => match client.get(&path).await {
                    Ok(value) => println!("{}", output::json_pretty(&value)),
                    Err(e) => output::print_error(&format!("request failed: {}", e)),
                },
                Err(e) => print_client_error(&e),
            }
        }
        Command::Delete { service, path } => {
            let question = format!("Delete {} from {}?", path, service);
            if !prompt::confirm(&question, Some(false))? {
                println!("Aborted.");
                return Ok(false);
            }
            if !prompt::confirm_safe("This cannot be undone.")? {
                println!("Aborted.");
                return Ok(false);
            }
            let _timer = output::Timer::start(format!("delete {} {}", service, path));
            match manager.get_client(&service, None, None).await {
                Ok(client) => match client.delete(&path).await {
                    Ok(Value::Null) => output::print_success("Deleted."),
                    Ok(value) => println!("{}", output::json_pretty(&value)),
                    Err(e) => output::print_error(&format!("request failed: {}", e)),
                },
                Err(e) => print_client_error(&e),
            }
        }
    }
    Ok(false)
}

fn print_client_error(err: &ClientError) {
    match err {
        ClientError::ServiceNotFound(id) => {
            output::print_error(&format!("service not found: {}", id));
            println!("Known services: try 'services'.");
        }
        other => output::print_error(&format!("{}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_parse_to_nothing() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   ").unwrap(), None);
    }

    #[test]
    fn simple_commands_parse() {
        assert_eq!(parse("services").unwrap(), Some(Command::Services));
        assert_eq!(parse("catalog").unwrap(), Some(Command::Catalog));
        assert_eq!(parse("token").unwrap(), Some(Command::Token));
        assert_eq!(parse("exit").unwrap(), Some(Command::Exit));
        assert_eq!(parse("quit").unwrap(), Some(Command::Exit));
        assert_eq!(parse("?").unwrap(), Some(Command::Help));
    }

    #[test]
    fn client_command_takes_version_and_region() {
        let cmd = parse("client compute --version 3 --region RegionTwo")
            .unwrap()
            .unwrap();
        assert_eq!(
            cmd,
            Command::Client {
                service: "compute".to_string(),
                version: Some("3".to_string()),
                region: Some("RegionTwo".to_string()),
            }
        );
    }

    #[test]
    fn client_command_flags_are_optional() {
        let cmd = parse("client network").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Client {
                service: "network".to_string(),
                version: None,
                region: None,
            }
        );
    }

    #[test]
    fn get_needs_service_and_path() {
        let cmd = parse("get compute /servers").unwrap().unwrap();
        assert_eq!(
            cmd,
            Command::Get {
                service: "compute".to_string(),
                path: "/servers".to_string(),
            }
        );
        assert!(parse("get compute").is_err());
    }

    #[test]
    fn unknown_commands_are_reported() {
        let err = parse("frobnicate").unwrap_err();
        assert!(err.contains("frobnicate"));
    }

    #[test]
    fn dangling_flag_values_are_reported() {
        assert!(parse("client compute --version").is_err());
    }
}
