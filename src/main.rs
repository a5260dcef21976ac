use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use touchlink::config::AppConfig;
use touchlink::controller::PlatformEvent;
use touchlink::emission::{Session, SessionSignal};
use touchlink::persistence::{PersistedSettings, SettingsFile};
use touchlink::runtime::{RuntimeOptions, SessionHandle};
use touchlink::transport::{LinkEvent, LoopbackChannel, MessageChannel, MqttChannel};

const INPUT_CAPACITY: usize = 1000;
const LINK_CAPACITY: usize = 100;

/// Feeds platform events (JSON lines) through the input engine
#[derive(Parser, Debug)]
#[command(name = "touchlink", version, about)]
struct Cli {
    /// Config file (link, viewport, tuning)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Settings file for persisted user preferences and layout
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Read events from this file instead of stdin
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Print control messages to stdout instead of publishing them
    #[arg(long)]
    dry_run: bool,

    /// Grant sensor permission requests without asking
    #[arg(long)]
    auto_grant: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup(cli.verbose)?;

    let config = match cli.config.clone().or_else(AppConfig::default_path) {
        Some(path) => AppConfig::load(&path).await?,
        None => AppConfig::default(),
    };

    let settings_file = cli
        .settings
        .clone()
        .map(SettingsFile::new)
        .or_else(SettingsFile::default_location);
    let settings = match &settings_file {
        Some(file) => file.load().await.unwrap_or_else(|e| {
            warn!("Unable to load settings, using defaults: {}", e);
            PersistedSettings::default()
        }),
        None => PersistedSettings::default(),
    };

    let options = RuntimeOptions {
        auto_grant: cli.auto_grant,
        settings_file,
    };
    let (link_tx, link_rx) = mpsc::channel(LINK_CAPACITY);

    if cli.dry_run {
        info!("Dry run, control messages go to stdout");
        let (channel, mut outbound) = LoopbackChannel::new(INPUT_CAPACITY);
        let printer = tokio::spawn(async move {
            while let Some(line) = outbound.recv().await {
                println!("{}", line);
            }
        });

        link_tx
            .send(LinkEvent::Opened)
            .await
            .map_err(|e| eyre!("Failed to queue link event: {}", e))?;
        drop(link_tx);

        let session = Session::new(&settings, config.viewport, &config.tuning, channel);
        drive(session, link_rx, cli.replay, options).await?;
        printer
            .await
            .map_err(|e| eyre!("Output task failed: {}", e))?;
    } else {
        let cancel = CancellationToken::new();
        let (channel, link_task) = MqttChannel::connect(&config.link, link_tx, cancel.clone());

        let session = Session::new(&settings, config.viewport, &config.tuning, channel);
        drive(session, link_rx, cli.replay, options).await?;

        cancel.cancel();
        link_task
            .await
            .map_err(|e| eyre!("MQTT link task failed: {}", e))?;
    }

    Ok(())
}

/// Runs the session until input ends or Ctrl-C.
async fn drive<C: MessageChannel + 'static>(
    session: Session<C>,
    link_rx: mpsc::Receiver<LinkEvent>,
    replay: Option<PathBuf>,
    options: RuntimeOptions,
) -> Result<()> {
    let (input_tx, input_rx) = mpsc::channel(INPUT_CAPACITY);

    let mut handle = SessionHandle::new();
    let mut signals = handle
        .start(session, input_rx, link_rx, options)
        .map_err(|e| eyre!("Failed to start session: {}", e))?;

    let reader = tokio::spawn(async move {
        if let Err(e) = read_events(replay, input_tx).await {
            warn!("Event input stopped: {}", e);
        }
    });
    let reporter = tokio::spawn(async move {
        while let Some(signal) = signals.recv().await {
            report(&signal);
        }
    });

    let finished = tokio::select! {
        result = handle.join() => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let stats = match finished {
        Some(result) => result,
        None => {
            info!("Interrupted, shutting down");
            reader.abort();
            handle.shutdown().await
        }
    }
    .map_err(|e| eyre!("Session failed: {}", e))?;

    let _ = reporter.await;
    info!(
        "Session ended: {} messages sent, {} dropped, {} failed",
        stats.sent, stats.dropped, stats.failed
    );
    Ok(())
}

async fn read_events(replay: Option<PathBuf>, tx: mpsc::Sender<PlatformEvent>) -> Result<()> {
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &replay {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| eyre!("Failed to open replay file {}: {}", path.display(), e))?;
            info!("Replaying events from {}", path.display());
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut lines = reader.lines();
    let mut line_no = 0usize;
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| eyre!("Failed to read event: {}", e))?
    {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<PlatformEvent>(line) {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    warn!("Session stopped, discarding remaining input");
                    break;
                }
            }
            Err(e) => warn!("Skipping line {}: {}", line_no, e),
        }
    }
    Ok(())
}

fn report(signal: &SessionSignal) {
    match signal {
        SessionSignal::PermissionRequested(sensor) => {
            info!("{} sensor needs permission, answer with a permission_result event", sensor)
        }
        SessionSignal::PermissionDenied(sensor) => warn!("{} sensor permission denied", sensor),
        SessionSignal::SensorUnsupported(sensor) => {
            warn!("{} sensor is not supported on this device", sensor)
        }
        SessionSignal::RemoteError(message) => warn!("Remote error: {}", message),
        SessionSignal::OpenElementEditor(element) => info!("Edit requested for {}", element),
        SessionSignal::SettingsChanged => {}
    }
}

fn setup(verbose: bool) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;

    FmtSubscriber::builder()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .pretty()
        .init();
    Ok(())
}
