use std::fmt;
use std::sync::Arc;

use backend::BackendConfig;
use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use exam_core::model::{ExamId, ExamMode};
use services::{AppServices, Clock, ControllerOptions, ExamService};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};
use ui::{App, UiApp, build_app_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidExamId { raw: String },
    InvalidMode { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidExamId { raw } => write!(f, "invalid --exam-id value: {raw}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value: {raw} (expected exam or practice)")
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

struct DesktopApp {
    exam_id: ExamId,
    exam_mode: ExamMode,
    exams: Arc<ExamService>,
}

impl UiApp for DesktopApp {
    fn exam_id(&self) -> ExamId {
        self.exam_id
    }

    fn exam_mode(&self) -> ExamMode {
        self.exam_mode
    }

    fn exams(&self) -> Arc<ExamService> {
        Arc::clone(&self.exams)
    }
}

#[derive(Debug)]
struct Args {
    api: Option<String>,
    token: Option<String>,
    exam_id: ExamId,
    mode: ExamMode,
    mock: bool,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- ui [--api <url>] [--token <token>] [--exam-id <id>] [--mode exam|practice] [--mock]"
    );
    eprintln!();
    eprintln!("Defaults for ui:");
    eprintln!("  --api http://localhost:8000/api");
    eprintln!("  --exam-id 1");
    eprintln!("  --mode exam");
    eprintln!();
    eprintln!("Environment (also read from .env):");
    eprintln!("  EXAM_API_BASE_URL, EXAM_API_TOKEN, EXAM_API_TIMEOUT_SECS, EXAM_ID, EXAM_MODE, RUST_LOG");
}

fn parse_mode(raw: String) -> Result<ExamMode, ArgsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "exam" => Ok(ExamMode::Exam),
        "practice" => Ok(ExamMode::Practice),
        _ => Err(ArgsError::InvalidMode { raw }),
    }
}

fn parse_exam_id(raw: String) -> Result<ExamId, ArgsError> {
    raw.parse::<ExamId>()
        .map_err(|_| ArgsError::InvalidExamId { raw })
}

impl Args {
    fn parse_ui(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut exam_id = std::env::var("EXAM_ID")
            .ok()
            .map(parse_exam_id)
            .transpose()?
            .unwrap_or_else(|| ExamId::new(1));
        let mut mode = std::env::var("EXAM_MODE")
            .ok()
            .map(parse_mode)
            .transpose()?
            .unwrap_or_default();
        let mut api = None;
        let mut token = None;
        let mut mock = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => api = Some(require_value(args, "--api")?),
                "--token" => token = Some(require_value(args, "--token")?),
                "--exam-id" => exam_id = parse_exam_id(require_value(args, "--exam-id")?)?,
                "--mode" => mode = parse_mode(require_value(args, "--mode")?)?,
                "--mock" => mock = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            api,
            token,
            exam_id,
            mode,
            mock,
        })
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_fmt::layer().with_target(false))
        .init();
}

fn build_services(args: &Args) -> Result<AppServices, Box<dyn std::error::Error>> {
    let clock = Clock::system();
    let options = ControllerOptions::default();
    if args.mock {
        return Ok(AppServices::in_memory(clock, options));
    }

    let mut config = BackendConfig::from_env()?;
    if let Some(api) = args.api.as_deref() {
        config = BackendConfig {
            timeout: config.timeout,
            ..BackendConfig::new(api)?.with_bearer_token(config.bearer_token)
        };
    }
    if args.token.is_some() {
        config = config.with_bearer_token(args.token.clone());
    }
    if config.bearer_token.is_none() {
        warn!("no EXAM_API_TOKEN configured; requests go out unauthenticated");
    }

    Ok(AppServices::from_config(config, clock, options)?)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    match argv.first().map(String::as_str) {
        None => {}
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some("ui") => {
            argv.remove(0);
        }
        Some(first) if first.starts_with("--") => {}
        Some(first) => {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            return Err(
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand").into(),
            );
        }
    }

    let parsed = Args::parse_ui(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let services = build_services(&parsed)?;
    info!(
        exam_id = %parsed.exam_id,
        mode = parsed.mode.as_str(),
        backend = ?services.backend_kind(),
        "launching exam window"
    );

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        exam_id: parsed.exam_id,
        exam_mode: parsed.mode,
        exams: services.exams(),
    });
    let context = build_app_context(&app);

    // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Exam")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();
    init_logging();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|arg| (*arg).to_string());
        Args::parse_ui(&mut iter)
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&["--exam-id", "7", "--mode", "practice", "--mock"]).unwrap();
        assert_eq!(args.exam_id, ExamId::new(7));
        assert_eq!(args.mode, ExamMode::Practice);
        assert!(args.mock);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            parse(&["--exam-id", "seven"]),
            Err(ArgsError::InvalidExamId { .. })
        ));
        assert!(matches!(
            parse(&["--mode", "quiz"]),
            Err(ArgsError::InvalidMode { .. })
        ));
        assert!(matches!(
            parse(&["--api"]),
            Err(ArgsError::MissingValue { flag: "--api" })
        ));
        assert!(matches!(parse(&["--db"]), Err(ArgsError::UnknownArg(_))));
    }
}
