use clap::Parser;
use pingora_core::server::configuration::Opt;
use pingora_core::server::Server;
use resin::config::Config;
use resin::error::ThumbnailError;
use resin::pipeline::RequestContext;
use resin::proxy::ResinProxy;
use resin::thumbnail::{
    invoke, HttpSourceFetcher, MemoryObjectStore, ObjectStore, RequestOrchestrator,
    ResponseEnvelope, S3ObjectStore, SourceFetcher,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Resin - on-demand image thumbnailing service built with Cloudflare's Pingora
#[derive(Parser, Debug)]
#[command(name = "resin")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (environment variables are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Daemon mode
    #[arg(short = 'd', long)]
    daemon: bool,

    /// Test configuration and exit
    #[arg(long)]
    test: bool,

    /// Upgrade workers gracefully
    #[arg(long)]
    upgrade: bool,

    /// Handle a single thumbnail path (`<width>x<height>/<source>`) and print
    /// the response envelope as JSON
    #[arg(long, value_name = "PATH")]
    invoke: Option<String>,

    /// Signature for --invoke
    #[arg(long, requires = "invoke")]
    sgn: Option<String>,

    /// Crop anchor for --invoke, e.g. `0.5,0`
    #[arg(long, requires = "invoke")]
    centering: Option<String>,

    /// Publish to an in-memory store instead of S3
    #[arg(long)]
    dry_run: bool,
}

fn load_config(args: &Args) -> Result<Config, ThumbnailError> {
    match &args.config {
        Some(path) => Config::from_file(path),
        None => Config::from_env(),
    }
}

async fn object_store(config: &Config, dry_run: bool) -> Option<Arc<dyn ObjectStore>> {
    if !config.storage.upload_to_s3 {
        return None;
    }
    if dry_run {
        tracing::info!("Dry run: thumbnails are published to memory");
        return Some(Arc::new(MemoryObjectStore::new()));
    }
    Some(Arc::new(S3ObjectStore::from_config(&config.storage).await))
}

/// One-shot mode: print the Lambda-style envelope for a single request
fn run_invoke(args: &Args, path: &str) -> i32 {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

    let mut query = HashMap::new();
    if let Some(sgn) = &args.sgn {
        query.insert("sgn".to_string(), sgn.clone());
    }
    if let Some(centering) = &args.centering {
        query.insert("c".to_string(), centering.clone());
    }
    let ctx = RequestContext::with_query_params(
        "GET".to_string(),
        path.trim_start_matches('/').to_string(),
        query,
    );

    let envelope = runtime.block_on(async {
        let config = match load_config(args) {
            Ok(config) => config,
            Err(e) => return ResponseEnvelope::from_error(&e),
        };
        let fetcher: Arc<dyn SourceFetcher> =
            match HttpSourceFetcher::new(config.limits.max_source_bytes) {
                Ok(fetcher) => Arc::new(fetcher),
                Err(e) => return ResponseEnvelope::from_error(&e),
            };
        let store = object_store(&config, args.dry_run).await;

        invoke(config, fetcher, store, &ctx).await
    });

    println!("{}", envelope.to_lambda_json());

    if envelope.status == 200 {
        0
    } else {
        1
    }
}

fn main() {
    // Initialize logging subsystem
    resin::logging::init_subscriber().expect("Failed to initialize logging subsystem");

    // Parse command-line arguments
    let args = Args::parse();

    if let Some(path) = &args.invoke {
        std::process::exit(run_invoke(&args, path));
    }

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    let config_source = args
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "environment".to_string());

    tracing::info!(
        config_source = %config_source,
        server_address = %config.server.address,
        server_port = config.server.port,
        known_domains = config.known_domains.len(),
        upload_to_s3 = config.storage.upload_to_s3,
        "Configuration loaded successfully"
    );

    // The S3 client is built once, before Pingora starts its own runtimes
    let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let store = runtime.block_on(object_store(&config, args.dry_run));

    let fetcher = HttpSourceFetcher::new(config.limits.max_source_bytes).unwrap_or_else(|e| {
        eprintln!("Failed to create source fetcher: {}", e);
        std::process::exit(1);
    });

    let listen_addr = config.server.listen_addr();
    let orchestrator = RequestOrchestrator::new(Arc::new(config), Arc::new(fetcher), store)
        .unwrap_or_else(|e| {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        });

    // Build Pingora server options
    let opt = Opt {
        daemon: args.daemon,
        test: args.test,
        upgrade: args.upgrade,
        ..Default::default()
    };

    // Create Pingora server
    let mut server = Server::new(Some(opt)).expect("Failed to create Pingora server");
    server.bootstrap();

    let proxy = ResinProxy::new(Arc::new(orchestrator));

    let mut proxy_service = pingora_proxy::http_proxy_service(&server.configuration, proxy);
    proxy_service.add_tcp(&listen_addr);

    tracing::info!(address = %listen_addr, "Starting Resin thumbnail service");

    server.add_service(proxy_service);

    // Run server forever (blocks until shutdown)
    server.run_forever();
}
