// # ddns-muxd - DynDNS Update Multiplexer Daemon
//
// Thin integration layer:
// 1. Read configuration from environment variables
// 2. Initialize logging and the runtime
// 3. Build the provider registry and the HTTP dispatcher
// 4. Serve `/update` and `/health` until SIGTERM/SIGINT
//
// All update logic lives in ddns-mux-core.
//
// ## Configuration
//
// ### Inbound identity
// - `USER_NAME`: expected username (default `user`)
// - `USER_PASSWORD`: expected password (required)
// - `USER_DOMAIN_NAME`: expected domain (default `any.domain`)
//
// ### Providers
// - `PROVIDERS`: JSON array of `{uri, username, passwd, domain, iid6}`
//
// ### Daemon
// - `LISTEN_ADDR`: listener address (default `0.0.0.0:8080`)
// - `LOG_LEVEL`: trace, debug, info, warn, error (default `info`)
// - `LOG_VERBOSE`: `true` lowers the default level to `debug`
//
// A broken provider configuration does not stop the daemon. It starts
// unhealthy and answers 500 until restarted with a fixed environment.
//
// ## Example
//
// ```bash
// export USER_PASSWORD=s3cret
// export PROVIDERS='[{"uri":"https://dyn.example/nic/update?hostname=<domain>&myip=<ipaddr>",
//                     "username":"alice","passwd":"hunter2","domain":"home.example"}]'
//
// ddns-muxd
// ```

mod server;

use anyhow::{Context, Result};
use ddns_mux_core::config::{DEFAULT_DOMAIN, DEFAULT_USERNAME, MuxConfig, ProviderConfig};
use ddns_mux_core::{Dispatcher, ProviderRegistry, UpdateEngine};
use ddns_mux_http::HttpDispatcher;
use server::AppState;
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Listener address used when `LISTEN_ADDR` is unset
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Daemon settings or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum MuxExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<MuxExitCode> for ExitCode {
    fn from(code: MuxExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon-level settings
///
/// Errors here are fatal, unlike errors in the multiplexer configuration.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    listen_addr: SocketAddr,
    log_level: Level,
    verbose: bool,
}

impl Settings {
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let verbose = lookup("LOG_VERBOSE").is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));

        let log_level = match lookup("LOG_LEVEL").filter(|v| !v.trim().is_empty()) {
            Some(level) => parse_level(&level)?,
            None if verbose => Level::DEBUG,
            None => Level::INFO,
        };

        let listen_addr = lookup("LISTEN_ADDR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr.trim().parse().with_context(|| {
            format!(
                "LISTEN_ADDR '{}' is not a socket address. Example: 0.0.0.0:8080",
                listen_addr
            )
        })?;

        Ok(Self {
            listen_addr,
            log_level,
            verbose,
        })
    }
}

fn parse_level(level: &str) -> Result<Level> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Read the multiplexer configuration
///
/// Only parsing happens here; `ProviderRegistry::new` validates.
fn load_mux_config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<MuxConfig> {
    let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

    let providers: Vec<ProviderConfig> = match non_empty("PROVIDERS") {
        Some(json) => serde_json::from_str(&json)
            .context("PROVIDERS is not a valid JSON array of provider objects")?,
        None => Vec::new(),
    };

    let config = MuxConfig::new(lookup("USER_PASSWORD").unwrap_or_default())
        .with_username(non_empty("USER_NAME").unwrap_or_else(|| DEFAULT_USERNAME.to_string()))
        .with_domain(non_empty("USER_DOMAIN_NAME").unwrap_or_else(|| DEFAULT_DOMAIN.to_string()));

    Ok(providers
        .into_iter()
        .fold(config, |config, provider| config.with_provider(provider)))
}

/// Turn a configuration into handler state
fn app_state(config: Result<MuxConfig>, dispatcher: Arc<dyn Dispatcher>) -> AppState {
    let registry = config.and_then(|config| Ok(ProviderRegistry::new(config)?));

    match registry {
        Ok(registry) => {
            info!("Configuration loaded: {} provider(s)", registry.len());
            for provider in registry.providers() {
                info!(
                    "Provider {}: uri={} domain={} iid6={}",
                    provider.index,
                    provider.uri,
                    provider.domain,
                    provider
                        .interface_id
                        .map(|iid| iid.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            AppState::Ready(UpdateEngine::new(Arc::new(registry), dispatcher))
        }
        Err(e) => {
            let reason = format!("{:#}", e);
            error!("Configuration error: {}", reason);
            warn!("Serving 500 on every endpoint until the configuration is fixed");
            AppState::Unhealthy(Arc::from(reason))
        }
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_lookup(|key| env::var(key).ok()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return MuxExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return MuxExitCode::ConfigError.into();
    }

    info!("Starting ddns-muxd {}", env!("CARGO_PKG_VERSION"));
    if settings.verbose {
        info!("Verbose logging enabled");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return MuxExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(settings).await {
            error!("Daemon error: {:#}", e);
            MuxExitCode::RuntimeError
        } else {
            MuxExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(settings: Settings) -> Result<()> {
    let dispatcher = Arc::new(HttpDispatcher::new()?);
    let state = app_state(load_mux_config_from(|key| env::var(key).ok()), dispatcher);

    let shutdown = shutdown_signal()?;

    let listener = tokio::net::TcpListener::bind(settings.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.listen_addr))?;
    info!("Listening on {}", settings.listen_addr);

    axum::serve(
        listener,
        server::router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("HTTP server failed")?;

    info!("Shutting down daemon");
    Ok(())
}

/// Install SIGTERM/SIGINT handlers
///
/// Handlers are installed up front so that a failure aborts startup; the
/// returned future completes on the first signal.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    Ok(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
    })
}

/// Install a CTRL-C handler
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()> + Send + 'static> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received shutdown signal: SIGINT"),
            Err(e) => {
                error!("Failed to wait for CTRL-C: {}", e);
                std::future::pending::<()>().await
            }
        }
    })
}
