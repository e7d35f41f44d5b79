//! Task Submission Client
//!
//! Thin command-line front end for the orchestrator's client endpoint.
//! Carries no platform logic: it frames one JSON request per invocation,
//! prints the reply, and caches the login token in `.api_token` in the
//! working directory so later commands can authenticate.

use anyhow::Result;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use taskgrid::config::Config;

const TOKEN_FILE: &str = ".api_token";
const MAX_RESPONSE_BYTES: usize = 4096;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let mut config = Config::default();
    if let Ok(host) = std::env::var("ORCHESTRATOR_HOST") {
        config.host = host;
    }

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("login") if args.len() == 4 => login(&config, &args[2], &args[3]).await,
        Some("submit") if args.len() >= 3 => {
            let duration = parse_duration_flag(&args[3..])?;
            submit(&config, &args[2], duration).await
        }
        Some("status") if args.len() == 3 => status(&config, &args[2]).await,
        _ => {
            eprintln!("Usage: {} login <username> <password>", args[0]);
            eprintln!("       {} submit <description> [--duration <secs>]", args[0]);
            eprintln!("       {} status <task-id>", args[0]);
            std::process::exit(1);
        }
    }
}

/// Reads an optional `--duration <secs>` (or `-d <secs>`) pair.
fn parse_duration_flag(rest: &[String]) -> Result<u64> {
    let mut duration = 5;
    let mut i = 0;
    while i < rest.len() {
        match rest[i].as_str() {
            "--duration" | "-d" if i + 1 < rest.len() => {
                duration = rest[i + 1].parse()?;
                i += 2;
            }
            other => anyhow::bail!("unrecognized argument: {}", other),
        }
    }
    Ok(duration)
}

async fn login(config: &Config, username: &str, password: &str) -> Result<()> {
    let reply = send_request(
        config,
        serde_json::json!({
            "action": "login",
            "username": username,
            "password": password,
        }),
    )
    .await?;

    match reply.get("token").and_then(|token| token.as_str()) {
        Some(token) => {
            std::fs::write(TOKEN_FILE, token)?;
            println!("Login succeeded. Token saved.");
        }
        None => println!("Login failed: {}", error_text(&reply)),
    }
    Ok(())
}

async fn submit(config: &Config, description: &str, duration: u64) -> Result<()> {
    let Some(token) = load_token() else {
        println!("You need to log in first: client login <username> <password>");
        return Ok(());
    };

    let reply = send_request(
        config,
        serde_json::json!({
            "action": "submit_task",
            "token": token,
            "data": {"description": description, "duration": duration},
        }),
    )
    .await?;

    match reply.get("task_id").and_then(|id| id.as_str()) {
        Some(task_id) => println!("Task submitted. Task id: {}", task_id),
        None => println!("Submission failed: {}", error_text(&reply)),
    }
    Ok(())
}

async fn status(config: &Config, task_id: &str) -> Result<()> {
    let Some(token) = load_token() else {
        println!("You need to log in first: client login <username> <password>");
        return Ok(());
    };

    let reply = send_request(
        config,
        serde_json::json!({
            "action": "task_status",
            "token": token,
            "task_id": task_id,
        }),
    )
    .await?;

    if reply.get("error").is_some() {
        println!("Error: {}", error_text(&reply));
    } else {
        println!("--- Task status ---");
        if let Some(fields) = reply.as_object() {
            for (key, value) in fields {
                println!("{:<16} {}", key, value);
            }
        }
    }
    Ok(())
}

/// One-shot exchange: connect, send a single JSON object, read a single
/// JSON reply of at most 4 KiB, close.
async fn send_request(config: &Config, request: serde_json::Value) -> Result<serde_json::Value> {
    let mut stream = TcpStream::connect((config.host.as_str(), config.client_port))
        .await
        .map_err(|_| anyhow::anyhow!("could not connect to the orchestrator"))?;

    stream.write_all(&serde_json::to_vec(&request)?).await?;

    let mut buf = vec![0u8; MAX_RESPONSE_BYTES];
    let len = stream.read(&mut buf).await?;
    if len == 0 {
        anyhow::bail!("the orchestrator closed the connection without a reply");
    }

    Ok(serde_json::from_slice(&buf[..len])
        .map_err(|_| anyhow::anyhow!("invalid response received from the orchestrator"))?)
}

fn load_token() -> Option<String> {
    std::fs::read_to_string(TOKEN_FILE)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn error_text(reply: &serde_json::Value) -> String {
    reply
        .get("error")
        .and_then(|error| error.as_str())
        .unwrap_or("unknown")
        .to_string()
}
