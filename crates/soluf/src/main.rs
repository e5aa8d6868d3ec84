mod cli;
mod server;
mod view;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::{eyre, WrapErr};

use soluf_core::rpc::{BitcoinRpc, HttpRpcClient, HttpRpcConfig, RetryPolicy};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    if args.dashboard_blocks == 0 || args.dashboard_blocks > server::MAX_BLOCK_COUNT {
        return Err(eyre!(
            "--dashboard-blocks must be between 1 and {}",
            server::MAX_BLOCK_COUNT
        ));
    }

    let rpc_config = HttpRpcConfig {
        user: args.rpc_user.clone(),
        pass: args.rpc_pass.clone(),
        cookie_file: args.rpc_cookie_file.clone(),
        requests_per_second: args.rpc_requests_per_second,
        batch_chunk_size: args.rpc_batch_chunk_size,
        connect_timeout: Duration::from_secs(args.rpc_connect_timeout_secs),
        request_timeout: Duration::from_secs(args.rpc_timeout_secs),
        retry: RetryPolicy {
            max_retries: args.rpc_retries,
            ..RetryPolicy::default()
        },
        ..HttpRpcConfig::new(&args.rpc_url)
    };

    // Connect to Bitcoin Core RPC and verify the connection succeeds
    // before starting the server.
    let rpc: Arc<dyn BitcoinRpc> =
        Arc::new(HttpRpcClient::new(rpc_config).context("configure RPC client")?);

    let status = rpc.get_blockchain_status().await.map_err(|err| {
        let message = format_rpc_connect_error(&args.rpc_url, &err.to_string());
        eyre!(message).wrap_err("while attempting to connect to Bitcoin Core RPC")
    })?;

    tracing::info!(
        chain = %status.chain,
        blocks = status.blocks,
        headers = status.headers,
        "connected to Bitcoin Core"
    );
    if status.pruned {
        tracing::warn!("node is pruned; blocks below the prune height cannot be shown");
    }
    if status.initial_block_download == Some(true) {
        tracing::warn!(
            progress = status.verification_progress,
            "node is still in initial block download; recent blocks may lag the network"
        );
    }

    let state = server::AppState {
        rpc,
        dashboard_blocks: args.dashboard_blocks,
    };

    let bind_addr = format!("{}:{}", args.bind, args.port);
    let origin = args
        .allowed_origin
        .clone()
        .unwrap_or_else(|| format!("http://{}:{}", args.bind, args.port));
    let router = server::build_router(state, &origin)?;

    if args.bind == "0.0.0.0" {
        tracing::warn!("server is bound to 0.0.0.0 and is accessible from the network");
    }

    println!();
    println!("  Soluf is running:");
    println!("    API:       http://{bind_addr}/api/v1");
    println!();

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("bind TCP listener")?;

    tracing::info!("listening on {bind_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("run HTTP server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

fn format_rpc_connect_error(rpc_url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("could not connect to RPC endpoint `{rpc_url}`"),
        format!("RPC error: {source_error}"),
    ];

    if source_error.contains("invalid configuration") {
        lines.push(
            "hint: check --rpc-user/--rpc-pass are given together and the cookie file is readable"
                .into(),
        );
    } else if source_error.contains("dns error") || source_error.contains("resolve") {
        lines.push(
            "hint: hostname resolution failed; verify the endpoint hostname and your DNS/network"
                .into(),
        );
    } else if source_error.contains("tls")
        || source_error.contains("certificate")
        || source_error.contains("SSL")
    {
        lines.push(
            "hint: TLS handshake failed; verify certificate trust and that the endpoint uses HTTPS"
                .into(),
        );
    } else if source_error.contains("401") || source_error.contains("403") {
        lines.push(
            "hint: authentication failed; verify token-in-URL, --rpc-user/--rpc-pass or --rpc-cookie-file"
                .into(),
        );
    } else if source_error.contains("404") {
        lines.push(
            "hint: endpoint path is invalid; verify the full RPC URL including token path".into(),
        );
    } else if source_error.contains("RPC error -28") {
        lines.push("hint: the node is still starting up; retry once it has loaded".into());
    } else if source_error.contains("HTTP request failed") {
        lines.push("hint: request could not be sent; verify URL format, network access, and endpoint reachability".into());
    }

    lines.join("\n")
}
