use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use patrol_core::model::SessionIdScheme;
use services::{
    AppConfig, AppServices, Clock, NetworkStatus, PatrolSessionService, SessionProgressStore,
    SyncDispatcher,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use ui::{
    App, CaptureCapability, CaptureDialog, UiApp, WebviewPrompt, build_app_context,
    capture_dialog_for,
};

const DEFAULT_DB_URL: &str = "sqlite://patrolmate.sqlite3";
const DEFAULT_LEDGER_FILE: &str = "data/ledger.json";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidIdScheme { raw: String },
    InvalidCapture { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidIdScheme { raw } => {
                write!(f, "invalid --id-scheme value: {raw} (expected joined or escaped)")
            }
            ArgsError::InvalidCapture { raw } => {
                write!(f, "invalid --capture value: {raw} (expected modal or prompt)")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

struct DesktopApp {
    services: AppServices,
    capture_dialog: Arc<dyn CaptureDialog>,
}

impl UiApp for DesktopApp {
    fn patrol(&self) -> Arc<PatrolSessionService> {
        self.services.patrol()
    }

    fn progress(&self) -> Arc<SessionProgressStore> {
        self.services.progress()
    }

    fn sync(&self) -> Arc<SyncDispatcher> {
        self.services.sync()
    }

    fn network(&self) -> NetworkStatus {
        self.services.network()
    }

    fn capture_dialog(&self) -> Arc<dyn CaptureDialog> {
        Arc::clone(&self.capture_dialog)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LedgerArg {
    Url(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    db_url: String,
    ledger: LedgerArg,
    id_scheme: SessionIdScheme,
    offline: bool,
    capture: CaptureCapability,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [ui|sync|status] [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>          default {DEFAULT_DB_URL}");
    eprintln!("  --ledger-url <url>         fetch the ledger over HTTP");
    eprintln!("  --ledger-file <path>       default {DEFAULT_LEDGER_FILE}");
    eprintln!("  --id-scheme joined|escaped default joined");
    eprintln!("  --offline                  start with connectivity off");
    eprintln!("  --capture modal|prompt     default modal");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PATROL_DB_URL, PATROL_LEDGER_URL, PATROL_LEDGER_FILE, PATROL_ID_SCHEME,");
    eprintln!("  PATROL_OFFLINE, PATROL_CAPTURE, PATROL_LOG_JSON, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ui,
    Sync,
    Status,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ui" => Some(Self::Ui),
            "sync" => Some(Self::Sync),
            "status" => Some(Self::Status),
            _ => None,
        }
    }
}

impl Args {
    /// Flags win over environment values; `env` is `std::env::var` outside tests.
    fn parse(
        args: &mut impl Iterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url =
            env("PATROL_DB_URL").map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut ledger = match (env("PATROL_LEDGER_URL"), env("PATROL_LEDGER_FILE")) {
            (Some(url), _) if !url.trim().is_empty() => LedgerArg::Url(url),
            (_, Some(path)) if !path.trim().is_empty() => LedgerArg::File(path.into()),
            _ => LedgerArg::File(DEFAULT_LEDGER_FILE.into()),
        };
        let mut id_scheme = match env("PATROL_ID_SCHEME") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ArgsError::InvalidIdScheme { raw: raw.clone() })?,
            None => SessionIdScheme::default(),
        };
        let mut offline = env("PATROL_OFFLINE")
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(false);
        let mut capture = match env("PATROL_CAPTURE") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ArgsError::InvalidCapture { raw: raw.clone() })?,
            None => CaptureCapability::default(),
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--ledger-url" => {
                    ledger = LedgerArg::Url(require_value(args, "--ledger-url")?);
                }
                "--ledger-file" => {
                    ledger = LedgerArg::File(require_value(args, "--ledger-file")?.into());
                }
                "--id-scheme" => {
                    let value = require_value(args, "--id-scheme")?;
                    id_scheme = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidIdScheme { raw: value.clone() })?;
                }
                "--offline" => offline = true,
                "--capture" => {
                    let value = require_value(args, "--capture")?;
                    capture = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCapture { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            ledger,
            id_scheme,
            offline,
            capture,
        })
    }

    fn app_config(&self) -> AppConfig {
        let ledger_source = match &self.ledger {
            LedgerArg::Url(url) => services::LedgerSourceConfig::Http(url.clone()),
            LedgerArg::File(path) => services::LedgerSourceConfig::File(path.clone()),
        };
        AppConfig {
            clock: Clock::system(),
            ledger_source,
            id_scheme: self.id_scheme,
            online: !self.offline,
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_json = std::env::var("PATROL_LOG_JSON")
        .ok()
        .as_deref()
        .and_then(parse_bool)
        .unwrap_or(false);
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn print_status(services: &AppServices) {
    let records = services.progress().records().await;
    if records.is_empty() {
        println!("no patrol records");
        return;
    }
    for (session_id, record) in records {
        let (operator, date, label) = record.meta.as_ref().map_or(("-", "-", "-"), |meta| {
            (
                meta.operator.as_str(),
                meta.date.as_str(),
                meta.attribute_label.as_str(),
            )
        });
        let state = if record.synced { "synced" } else { "pending" };
        println!(
            "{session_id}\t{operator}\t{date}\t{label}\t{}/{} done\t{state}",
            record.completed_count(),
            record.items.len()
        );
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: launching UI when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Ui,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Ui,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter, |name| std::env::var(name).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, &parsed.app_config()).await?;
    info!(
        db = %parsed.db_url,
        id_scheme = parsed.id_scheme.as_str(),
        offline = parsed.offline,
        command = ?cmd,
        "patrolmate starting"
    );

    match cmd {
        Command::Ui => {
            let capture_dialog = capture_dialog_for(parsed.capture, Arc::new(WebviewPrompt));
            let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
                services,
                capture_dialog,
            });
            let context = build_app_context(&app);

            // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
            // Explicitly disable it so the app doesn't behave like a modal window.
            let desktop_cfg = DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title("PatrolMate")
                    .with_always_on_top(false),
            );

            LaunchBuilder::desktop()
                .with_cfg(desktop_cfg)
                .with_context(context)
                .launch(App);
            Ok(())
        }
        Command::Sync => {
            let report = services.sync().sync().await;
            println!("{}", report.message());
            Ok(())
        }
        Command::Status => {
            print_status(&services).await;
            Ok(())
        }
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
