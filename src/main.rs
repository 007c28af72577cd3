use anyhow::Result;
use clap::Parser;
use gesture_keys::config::ActionMode;
use gesture_keys::{GestureKeysApp, GestureKeysConfig, GestureLabel};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "gesture-keys")]
#[command(about = "Turn hand landmark streams into debounced keyboard shortcuts")]
#[command(version)]
#[command(long_about = "Reads 21-point hand landmarks as JSON lines, classifies each frame \
into a gesture, and fires the matching Option key chord once per gesture change, \
separated by a cooldown.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "gesture-keys.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without reading landmarks")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Log chords instead of running the injection command
    #[arg(long, help = "Log triggered chords without sending them")]
    dry_run: bool,

    /// Landmark stream, overrides `source.path`
    #[arg(short, long, value_name = "PATH", help = "JSON-lines landmark file, or - for stdin")]
    input: Option<String>,

    /// Cooldown override in seconds
    #[arg(long, value_name = "SECONDS", help = "Minimum seconds between two triggers")]
    cooldown: Option<f64>,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting gesture-keys v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let mut config = match GestureKeysConfig::load_from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(input) = &args.input {
        config.source.path = input.clone();
    }
    if let Some(cooldown) = args.cooldown {
        config.debounce.cooldown_seconds = cooldown;
    }
    if args.dry_run {
        config.action.mode = ActionMode::Log;
    }

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    info!("Gestures:");
    for (label, action_id) in GestureLabel::key_bindings() {
        info!("  {} -> {}", label, action_id);
    }

    let mut app = GestureKeysApp::new(config).map_err(|e| {
        error!("Failed to start session: {}", e);
        e
    })?;

    let summary = app.run().await.map_err(|e| {
        error!("Session error: {}", e);
        e
    })?;

    println!(
        "Frames: {} | Gestures Detected: {} | Hand lost: {} | Invalid frames: {} | Failed actions: {}",
        summary.frames_processed,
        summary.trigger_count,
        summary.hand_losses,
        summary.invalid_frames,
        summary.action_failures
    );

    let exit_code = summary.reason.exit_code();
    info!("gesture-keys exited with code: {}", exit_code);

    // A reader blocked on stdin would otherwise hold the runtime open
    std::process::exit(exit_code);
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gesture_keys={}", log_level)));

    // Logs go to stderr so stdout stays free for the summary line
    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# gesture-keys configuration file");
    println!("# Default values for every option. Set debounce.cooldown_seconds = 2.5");
    println!("# for a slower trigger rate.");
    println!();
    println!("{}", toml::to_string_pretty(&GestureKeysConfig::default())?);
    Ok(())
}
