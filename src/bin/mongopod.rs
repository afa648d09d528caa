use clap::Parser;
use mongopod::config::{self, AppConfig};
use mongopod::pod::{self, MongoPod, ServerOptions};
use mongopod::query::CallContext;
use mongopod::store::{MongoStore, Store};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "mongopod", version, about = "Serve read-only MongoDB queries over a pod socket")]
struct Cli {
    /// Unix socket path to listen on
    socket: PathBuf,
    /// Config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// MongoDB connection URI (defaults to $MONGODB_CONNECTION_URL)
    #[arg(long)]
    uri: Option<String>,
    /// log4rs YAML config file
    #[arg(long)]
    log_config: Option<PathBuf>,
    /// error|warn|info|debug|trace
    #[arg(long)]
    log_level: Option<String>,
    /// Directory for rolling log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Namespace advertised in the describe response
    #[arg(long)]
    namespace: Option<String>,
    /// Per-call timeout in milliseconds (0 disables)
    #[arg(long)]
    call_timeout_ms: Option<u64>,
    /// Startup connectivity check timeout in seconds
    #[arg(long)]
    ping_timeout_secs: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> AppConfig {
        AppConfig {
            connection_url: self.uri.clone(),
            log_config: self.log_config.clone(),
            log_level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
            namespace: self.namespace.clone(),
            call_timeout_ms: self.call_timeout_ms,
            ping_timeout_secs: self.ping_timeout_secs,
        }
    }
}

fn init_logging(cfg: &AppConfig) {
    let res = match &cfg.log_config {
        Some(path) => mongopod::logger::init_path(path),
        None => mongopod::logger::configure(cfg.log_dir.as_deref(), cfg.log_level.as_deref()),
    };
    if let Err(e) = res {
        eprintln!("failed to initialize logging: {e}");
    }
}

async fn check_connection(store: &dyn Store, cfg: &AppConfig) -> bool {
    let ctx = CallContext::background().with_timeout(cfg.ping_timeout());
    match ctx.run(store.ping()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            log::error!("{e}");
            false
        }
        Err(e) => {
            log::error!("ping: {e}");
            false
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let cfg = match config::load(cli.overrides(), cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&cfg);
    log::debug!("compiled features: {:?}", mongopod::COMPILED_FEATURES);

    let Some(uri) = cfg.connection_url.as_deref() else {
        log::error!("no connection URL: set MONGODB_CONNECTION_URL or pass --uri");
        return ExitCode::FAILURE;
    };
    let store = match MongoStore::connect(uri).await {
        Ok(s) => s,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if !check_connection(&store, &cfg).await {
        return ExitCode::FAILURE;
    }
    log::info!("Connected to MongoDB!");

    let listener = match pod::bind(&cli.socket) {
        Ok(l) => l,
        Err(e) => {
            log::error!("cannot listen on {}: {e}", cli.socket.display());
            return ExitCode::FAILURE;
        }
    };
    log::info!("listening on {}", cli.socket.display());

    let pod = Arc::new(MongoPod::new(Arc::new(store)).with_namespace(cfg.namespace_or_default()));
    let shutdown = CallContext::background();
    let signal_ctx = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_ctx.cancel();
        }
    });

    let opts = ServerOptions { call_timeout: cfg.call_timeout() };
    let result = pod::serve(listener, pod, opts, shutdown).await;
    if let Err(e) = std::fs::remove_file(&cli.socket) {
        log::warn!("could not remove socket {}: {e}", cli.socket.display());
    }
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("pod server failed: {e}");
            ExitCode::FAILURE
        }
    }
}
