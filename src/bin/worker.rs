use taskgrid::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("Usage: {} <host> <task-port>", args[0]);
        eprintln!("Example: {} localhost 60001", args[0]);
        std::process::exit(1);
    }

    let host = args[1].clone();
    let task_port: u16 = args[2].parse()?;

    let mut config = Config::default();
    if let Ok(orchestrator_host) = std::env::var("ORCHESTRATOR_HOST") {
        config.host = orchestrator_host;
    }

    taskgrid::worker::run(config, host, task_port).await
}
