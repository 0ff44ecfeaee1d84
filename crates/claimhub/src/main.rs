use clap::Parser;

#[derive(Parser)]
#[command(about = "Local stub of the claim backend")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1:8920")]
    bind: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let state = claimhub::HubState::default();

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    tracing::info!(bind = %listener.local_addr()?, "claimhub starting");

    axum::serve(listener, claimhub::router(state)).await?;
    Ok(())
}
