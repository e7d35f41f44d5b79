use taskgrid::config::Config;
use taskgrid::orchestrator::{Orchestrator, Role};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let role = if args.iter().any(|arg| arg == "--backup") {
        Role::Backup
    } else {
        Role::Primary
    };

    let mut config = Config::default();
    if let Ok(host) = std::env::var("ORCHESTRATOR_HOST") {
        config.host = host;
    }

    Orchestrator::new(config).run(role).await
}
