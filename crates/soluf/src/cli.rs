use std::path::PathBuf;

use clap::Parser;

/// Soluf: read-only Bitcoin block explorer backend serving a JSON API over a
/// remote Bitcoin Core RPC endpoint.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Bitcoin Core RPC URL.
    #[arg(long, default_value = "http://127.0.0.1:8332", env = "SOLUF_RPC_URL")]
    pub rpc_url: String,

    /// RPC username (optional; not needed for token-in-URL providers).
    #[arg(long, env = "SOLUF_RPC_USER")]
    pub rpc_user: Option<String>,

    /// RPC password (optional; not needed for token-in-URL providers).
    #[arg(long, env = "SOLUF_RPC_PASS")]
    pub rpc_pass: Option<String>,

    /// Bitcoin Core `.cookie` file, used when user/pass are not given.
    #[arg(long, env = "SOLUF_RPC_COOKIE_FILE")]
    pub rpc_cookie_file: Option<PathBuf>,

    /// Client-side limit on outbound RPC requests per second.
    #[arg(long, env = "SOLUF_RPC_REQUESTS_PER_SECOND")]
    pub rpc_requests_per_second: Option<u32>,

    /// Maximum number of calls sent in one JSON-RPC batch.
    #[arg(long, default_value = "25", env = "SOLUF_RPC_BATCH_CHUNK_SIZE")]
    pub rpc_batch_chunk_size: usize,

    /// TCP connect timeout for RPC requests, in seconds.
    #[arg(long, default_value = "10", env = "SOLUF_RPC_CONNECT_TIMEOUT_SECS")]
    pub rpc_connect_timeout_secs: u64,

    /// Overall timeout for one RPC request, in seconds.
    #[arg(long, default_value = "30", env = "SOLUF_RPC_TIMEOUT_SECS")]
    pub rpc_timeout_secs: u64,

    /// Retries for transient transport failures (0 disables retrying).
    #[arg(long, default_value = "3", env = "SOLUF_RPC_RETRIES")]
    pub rpc_retries: u32,

    /// Address to bind the web server to.
    #[arg(long, default_value = "127.0.0.1", env = "SOLUF_BIND")]
    pub bind: String,

    /// Port to listen on.
    #[arg(long, default_value = "3090", env = "SOLUF_PORT")]
    pub port: u16,

    /// Browser origin allowed by CORS. Defaults to the server's own origin.
    #[arg(long, env = "SOLUF_ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// Number of recent blocks shown on the dashboard.
    #[arg(long, default_value = "6", env = "SOLUF_DASHBOARD_BLOCKS")]
    pub dashboard_blocks: usize,
}
