use anyhow::{bail, Context, Result};
use replaykit::app::cli::{parse_args, Commands, ConfigAction};
use replaykit::app::config::Config;
use replaykit::engine::Engine;
use replaykit::event::log::EventLog;
use replaykit::event::types::EventKind;
use replaykit::hook::{NullHook, TraceInjector};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = parse_args();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("replaykit=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("replaykit=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default().context("loading default config")?,
    };

    match cli.command {
        Commands::Inspect { file } => inspect(&file),
        Commands::Play { file, speed } => play(&file, speed, &config),
        Commands::Config { action } => configure(action, &config),
    }
}

fn inspect(file: &std::path::Path) -> Result<()> {
    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let log = EventLog::from_bytes(&bytes)
        .with_context(|| format!("decoding {}", file.display()))?;

    let mut moves = 0usize;
    let mut buttons = 0usize;
    let mut scrolls = 0usize;
    let mut keys = 0usize;
    for event in log.events() {
        match event.kind {
            EventKind::PointerMove { .. } => moves += 1,
            EventKind::PointerButton { .. } => buttons += 1,
            EventKind::Scroll { .. } => scrolls += 1,
            EventKind::KeyPress { .. } | EventKind::KeyRelease { .. } => keys += 1,
        }
    }

    println!("{}", file.display());
    println!("  events:   {}", log.len());
    println!("  duration: {:.2}s", log.duration_secs());
    println!("  size:     {} bytes", bytes.len());
    println!("  moves:    {moves}");
    println!("  buttons:  {buttons}");
    println!("  scrolls:  {scrolls}");
    println!("  keys:     {keys}");
    Ok(())
}

fn play(file: &std::path::Path, speed: f64, config: &Config) -> Result<()> {
    let bytes = fs::read(file).with_context(|| format!("reading {}", file.display()))?;

    let engine = Engine::new(Arc::new(NullHook::new()), Arc::new(TraceInjector), config)?;
    let count = engine.import_log(bytes)?;
    info!(count, speed, "replaying {}", file.display());

    let scheduled = engine.start_playback(Some(speed))?;
    println!("replaying {scheduled} events at {speed}x (ctrl-c to stop)");

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("installing ctrl-c handler")?;

    while engine.status().playing {
        if interrupted.load(Ordering::SeqCst) {
            engine.stop_playback()?;
            println!("stopped");
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    engine.shutdown();
    Ok(())
}

fn configure(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Show => {
            print!("{}", config.to_toml());
            Ok(())
        }
        ConfigAction::Init { force } => {
            let path = Config::default_path()?;
            if path.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            let written = Config::default().save_default()?;
            println!("wrote {}", written.display());
            Ok(())
        }
    }
}
