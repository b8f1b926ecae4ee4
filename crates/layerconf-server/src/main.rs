use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, Command};
use layerconf_backend::BackendConfig;
use layerconf_server::{build_service, routes, telemetry, StorageMode};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("layerconf-server")
        .version(layerconf_server::VERSION)
        .about("Layered settings resolution with dual-backend persistence")
        .arg(
            Arg::new("bind")
                .long("bind")
                .default_value("127.0.0.1:8080")
                .value_parser(value_parser!(SocketAddr))
                .help("Address to listen on"),
        )
        .arg(
            Arg::new("memory")
                .long("memory")
                .action(ArgAction::SetTrue)
                .help("Keep settings in process memory instead of the hosted database"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .get_matches();

    telemetry::init(matches.get_flag("json"));

    let bind = matches
        .get_one::<SocketAddr>("bind")
        .copied()
        .context("missing bind address")?;
    let mode = if matches.get_flag("memory") {
        StorageMode::Memory
    } else {
        StorageMode::Remote
    };

    let config = BackendConfig::from_env().context("invalid backend configuration")?;
    tracing::debug!(?config, "backend configuration");
    let service = Arc::new(build_service(&config, mode));
    let presence = config.presence();
    if mode == StorageMode::Remote && !presence.endpoint_url {
        tracing::warn!("no endpoint configured; every storage call will fail");
    }

    let (addr, server) = warp::serve(routes(Arc::clone(&service)))
        .try_bind_with_graceful_shutdown(bind, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .with_context(|| format!("failed to bind {bind}"))?;

    tracing::info!(
        %addr,
        mode = %service.mode(),
        memory = mode == StorageMode::Memory,
        privileged_credential = presence.privileged_credential,
        constrained_credential = presence.constrained_credential,
        "settings server listening"
    );
    server.await;
    tracing::info!("settings server stopped");
    Ok(())
}
