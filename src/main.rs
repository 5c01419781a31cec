//! wagate server binary: CLI, configuration and startup.

use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use config::{Config, Environment, File, FileFormat};
use log::{debug, info, warn, LevelFilter};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

use wagate::api::{self, AppState};
use wagate::auth::AuthState;
use wagate::client::EngineClientFactory;
use wagate::db::Database;
use wagate::session::{self, RegistryConfig, SessionRegistry};
use wagate::store::LocalCredentialStore;
use wagate::user::{UserRepository, UserService};
use wagate::webhook::WebhookNotifier;

const APP_NAME: &str = "wagate";

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn async_main(ctx: RuntimeContext, cmd: ServeCommand) -> Result<()> {
    handle_serve(&ctx, cmd).await
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = RuntimeContext::new(cli.common.clone())?;
    ctx.init_logging();
    debug!("resolved paths: {:#?}", ctx.paths);

    match cli.command {
        Command::Serve(cmd) => async_main(ctx, cmd),
        Command::Init(cmd) => handle_init(&ctx, cmd),
        Command::Config { command } => handle_config(&ctx, command),
        Command::Completions { shell } => handle_completions(shell),
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Wagate - multi-tenant WhatsApp automation gateway.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Override the config file path
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Reduce output to only errors
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Enable debug logging (equivalent to -vv)
    #[arg(long, global = true)]
    debug: bool,
    /// Enable trace logging (overrides other levels)
    #[arg(long, global = true)]
    trace: bool,
    /// Output machine readable JSON
    #[arg(long, global = true)]
    json: bool,
    /// Disable ANSI colors in output
    #[arg(long = "no-color", global = true)]
    no_color: bool,
    /// Do not change anything on disk
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    /// Assume "yes" for interactive prompts
    #[arg(short = 'y', long = "yes", alias = "force", global = true)]
    assume_yes: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the gateway server
    Serve(ServeCommand),
    /// Write a default config file
    Init(InitCommand),
    /// Inspect the resolved configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
struct ServeCommand {
    /// Override the listen host
    #[arg(long)]
    host: Option<String>,
    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
    /// Skip recovering persisted sessions on boot
    #[arg(long)]
    no_recover: bool,
}

#[derive(Debug, Args)]
struct InitCommand {
    /// Overwrite an existing config file
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Print the resolved configuration
    Show,
    /// Print the config file path
    Path,
    /// Reset the config file to defaults
    Reset,
}

struct RuntimeContext {
    common: CommonOpts,
    paths: AppPaths,
    config: AppConfig,
}

impl RuntimeContext {
    fn new(common: CommonOpts) -> Result<Self> {
        let paths = AppPaths::discover(common.config.clone())?;
        let config = load_or_init_config(&paths, &common)?;
        let ctx = Self {
            common,
            paths,
            config,
        };
        ctx.ensure_directories()?;
        Ok(ctx)
    }

    fn init_logging(&self) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        if self.common.quiet {
            log::set_max_level(LevelFilter::Off);
            return;
        }

        let level = match self.effective_log_level() {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        };

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("wagate={level},tower_http={level}")));

        // The two branches build differently-typed subscriber stacks, so the
        // file layer is produced per stack.
        let log_file = self.config.logging.file.as_deref();
        if self.common.json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .with(file_log_layer(log_file))
                .try_init()
                .ok();
        } else {
            let disable_color = self.common.no_color
                || env::var_os("NO_COLOR").is_some()
                || !io::stderr().is_terminal();

            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().with_ansi(!disable_color))
                .with(file_log_layer(log_file))
                .try_init()
                .ok();
        }

        // Also init env_logger for compatibility with log crate users
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
        builder.filter_level(self.effective_log_level());
        builder.try_init().ok();
    }

    fn effective_log_level(&self) -> LevelFilter {
        if self.common.trace {
            LevelFilter::Trace
        } else if self.common.debug {
            LevelFilter::Debug
        } else {
            match self.common.verbose {
                0 => self.configured_log_level(),
                1 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    fn configured_log_level(&self) -> LevelFilter {
        match self.config.logging.level.to_ascii_lowercase().as_str() {
            "off" => LevelFilter::Off,
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        }
    }

    fn ensure_directories(&self) -> Result<()> {
        if self.common.dry_run {
            info!(
                "dry-run: would ensure data dir {} and state dir {}",
                self.paths.data_dir.display(),
                self.paths.state_dir.display()
            );
            return Ok(());
        }

        fs::create_dir_all(&self.paths.data_dir).with_context(|| {
            format!("creating data directory {}", self.paths.data_dir.display())
        })?;
        fs::create_dir_all(&self.paths.state_dir).with_context(|| {
            format!(
                "creating state directory {}",
                self.paths.state_dir.display()
            )
        })?;
        Ok(())
    }

    fn sessions_data_dir(&self) -> Result<PathBuf> {
        match &self.config.sessions.data_dir {
            Some(dir) => expand_str_path(dir),
            None => Ok(self.paths.data_dir.join("sessions")),
        }
    }

    fn engine_socket(&self) -> Result<PathBuf> {
        match &self.config.engine.socket {
            Some(path) => expand_str_path(path),
            None => Ok(self.paths.state_dir.join("engine.sock")),
        }
    }
}

#[derive(Debug, Clone)]
struct AppPaths {
    config_file: PathBuf,
    data_dir: PathBuf,
    state_dir: PathBuf,
}

impl AppPaths {
    fn discover(override_path: Option<PathBuf>) -> Result<Self> {
        let config_file = match override_path {
            Some(path) => {
                let expanded = expand_path(path)?;
                if expanded.is_dir() {
                    expanded.join("config.toml")
                } else {
                    expanded
                }
            }
            None => default_config_dir()?.join("config.toml"),
        };

        if config_file.parent().is_none() {
            return Err(anyhow!("invalid config file path: {config_file:?}"));
        }

        Ok(Self {
            config_file,
            data_dir: default_data_dir()?,
            state_dir: default_state_dir()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct AppConfig {
    gateway: GatewayConfig,
    auth: AuthConfig,
    webhook: WebhookConfig,
    sessions: SessionsConfig,
    engine: EngineConfig,
    logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            auth: AuthConfig::default(),
            webhook: WebhookConfig::default(),
            sessions: SessionsConfig::default(),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct GatewayConfig {
    host: String,
    port: u16,
    /// Shared key expected in x-api-key on session routes. Unset disables
    /// the check.
    api_key: Option<String>,
    enable_local_callback_example: bool,
    enable_swagger: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_key: None,
            enable_local_callback_example: false,
            enable_swagger: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct AuthConfig {
    jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct WebhookConfig {
    /// Lifecycle events are POSTed to `{base_url}/{session_id}`.
    base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct SessionsConfig {
    /// Credential store root. Defaults to `<data_dir>/sessions`.
    data_dir: Option<String>,
    /// Credential store backend. Only "local" is implemented.
    storage: String,
    max_qr_retries: u32,
    idle_timeout_secs: u64,
    reaper_interval_secs: u64,
    auto_restart_max: u32,
    recover_on_boot: bool,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            storage: "local".to_string(),
            max_qr_retries: 5,
            idle_timeout_secs: 1800,
            reaper_interval_secs: 300,
            auto_restart_max: 2,
            recover_on_boot: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct EngineConfig {
    /// Unix socket of the automation engine. Defaults to
    /// `<state_dir>/engine.sock`.
    socket: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct LoggingConfig {
    level: String,
    file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

async fn handle_serve(ctx: &RuntimeContext, cmd: ServeCommand) -> Result<()> {
    info!("Starting wagate gateway...");

    if ctx.config.sessions.storage != "local" {
        bail!(
            "unsupported sessions.storage backend: {} (only \"local\" is implemented)",
            ctx.config.sessions.storage
        );
    }
    if ctx.config.auth.jwt_secret.is_empty() {
        bail!("auth.jwt_secret must be set (see `wagate config path`)");
    }
    if ctx.config.auth.jwt_secret.len() < 32 {
        warn!("auth.jwt_secret is shorter than 32 characters");
    }
    if ctx.config.gateway.api_key.is_none() {
        warn!("gateway.api_key is unset; session routes are unauthenticated");
    }

    let db_path = ctx.paths.data_dir.join("wagate.db");
    info!("Database path: {}", db_path.display());
    let database = Database::new(&db_path).await?;
    let users = UserService::new(UserRepository::new(database.pool().clone()));
    let auth_state = AuthState::new(&ctx.config.auth.jwt_secret);

    let store_root = ctx.sessions_data_dir()?;
    info!("Credential store: {}", store_root.display());
    let store = Arc::new(LocalCredentialStore::new(store_root.clone()));

    let socket = ctx.engine_socket()?;
    info!("Engine socket: {}", socket.display());
    let factory = Arc::new(EngineClientFactory::new(socket, store_root));

    let webhooks = WebhookNotifier::new(ctx.config.webhook.base_url.clone());
    if webhooks.enabled() {
        info!("Webhook delivery enabled");
    }

    let registry = Arc::new(SessionRegistry::new(
        store,
        factory,
        webhooks,
        RegistryConfig {
            max_qr_retries: ctx.config.sessions.max_qr_retries,
            auto_restart_max: ctx.config.sessions.auto_restart_max,
        },
    ));

    if ctx.config.sessions.recover_on_boot && !cmd.no_recover {
        match registry.recover().await {
            Ok(0) => info!("No persisted sessions to recover"),
            Ok(n) => info!("Recovered {} persisted session(s)", n),
            Err(e) => warn!("Session recovery failed: {}", e),
        }
    }

    tokio::spawn(session::reaper::run(
        registry.clone(),
        Duration::from_secs(ctx.config.sessions.reaper_interval_secs),
        Duration::from_secs(ctx.config.sessions.idle_timeout_secs),
    ));

    let state = AppState {
        registry: registry.clone(),
        users,
        auth: auth_state,
        api_key: ctx.config.gateway.api_key.clone(),
        idle_timeout: Duration::from_secs(ctx.config.sessions.idle_timeout_secs),
        enable_local_callback: ctx.config.gateway.enable_local_callback_example,
        enable_swagger: ctx.config.gateway.enable_swagger,
    };
    let app = api::create_router(state);

    let host = cmd.host.unwrap_or_else(|| ctx.config.gateway.host.clone());
    let port = cmd.port.unwrap_or(ctx.config.gateway.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .context("binding to address")?;

    // Graceful shutdown disconnects clients without deleting credentials,
    // so the next boot recovers them.
    let registry_for_shutdown = registry.clone();
    let shutdown_signal = async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        info!("Shutdown signal received, disconnecting sessions...");
        registry_for_shutdown.shutdown().await;
        info!("Shutdown complete");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("running server")?;

    Ok(())
}

fn handle_init(ctx: &RuntimeContext, cmd: InitCommand) -> Result<()> {
    if ctx.paths.config_file.exists() && !(cmd.force || ctx.common.assume_yes) {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            ctx.paths.config_file.display()
        ));
    }

    if ctx.common.dry_run {
        info!(
            "dry-run: would write default config to {}",
            ctx.paths.config_file.display()
        );
        return Ok(());
    }

    write_default_config(&ctx.paths.config_file)
}

fn handle_config(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            if ctx.common.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ctx.config)
                        .context("serializing config to JSON")?
                );
            } else {
                println!("{:#?}", ctx.config);
            }
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", ctx.paths.config_file.display());
            Ok(())
        }
        ConfigCommand::Reset => {
            if ctx.common.dry_run {
                info!(
                    "dry-run: would reset config at {}",
                    ctx.paths.config_file.display()
                );
                return Ok(());
            }
            write_default_config(&ctx.paths.config_file)
        }
    }
}

fn handle_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
    Ok(())
}

/// Append-mode log file layer, boxed so it fits any subscriber stack.
/// An unopenable path is reported and logging proceeds without the file.
fn file_log_layer<S>(
    path: Option<&str>,
) -> Option<Box<dyn tracing_subscriber::Layer<S> + Send + Sync + 'static>>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    use tracing_subscriber::Layer;

    let path = path?;
    match fs::OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .boxed(),
        ),
        Err(e) => {
            let _ = writeln!(io::stderr(), "cannot open log file {path}: {e}");
            None
        }
    }
}

fn load_or_init_config(paths: &AppPaths, common: &CommonOpts) -> Result<AppConfig> {
    if !paths.config_file.exists() {
        if common.dry_run {
            info!(
                "dry-run: would create default config at {}",
                paths.config_file.display()
            );
        } else {
            write_default_config(&paths.config_file)?;
        }
    }

    let built = Config::builder()
        .set_default("gateway.host", "0.0.0.0")?
        .set_default("gateway.port", 3000_i64)?
        .set_default("sessions.storage", "local")?
        .set_default("logging.level", "info")?
        .add_source(
            File::from(paths.config_file.as_path())
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(Environment::with_prefix(&env_prefix()).separator("__"))
        .build()?;

    let mut config: AppConfig = built.try_deserialize()?;

    if let Some(ref file) = config.logging.file {
        let expanded = expand_str_path(file)?;
        config.logging.file = Some(expanded.display().to_string());
    }

    Ok(config)
}

fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {parent:?}"))?;
    }

    let config = AppConfig::default();
    let toml = toml::to_string_pretty(&config).context("serializing default config to TOML")?;
    let header = format!(
        "# wagate configuration\n# Environment overrides: {}__SECTION__KEY (e.g. {}__GATEWAY__PORT)\n\n",
        env_prefix(),
        env_prefix()
    );
    fs::write(path, format!("{header}{toml}"))
        .with_context(|| format!("writing config file to {}", path.display()))
}

fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        let mut path = PathBuf::from(dir);
        path.push(APP_NAME);
        return Ok(path);
    }

    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}

fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(mut dir) = dirs::data_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".local").join("share").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine data directory"))
}

fn default_state_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(mut dir) = dirs::state_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".local").join("state").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine state directory"))
}

fn expand_path(path: PathBuf) -> Result<PathBuf> {
    if let Some(text) = path.to_str() {
        expand_str_path(text)
    } else {
        Ok(path)
    }
}

fn expand_str_path(text: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(text).context("expanding path")?;
    Ok(PathBuf::from(expanded.to_string()))
}
