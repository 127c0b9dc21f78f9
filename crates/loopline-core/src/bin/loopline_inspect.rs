//! loopline-inspect - print the persisted loops and speeds
//!
//! ## Command line flags
//!
//! - `--config <path>`: config file (default `~/.config/loopline/config.yaml`)
//! - `--store <path>`: store file, overriding the config
//! - `--duration <secs>`: track length used to validate stored loops (default 24 h)
//! - `--write-default-config`: write the default config to the config path and exit

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use loopline_core::config::{default_config_path, load_config, save_config, LooplineConfig};
use loopline_core::persist::{DebouncedWriter, YamlFileStore};
use loopline_core::segments::LoopSet;
use loopline_core::speed::SpeedResolver;

/// Long enough for any track; only used to validate stored bounds
const INSPECT_DURATION: f64 = 24.0 * 60.0 * 60.0;

struct Args {
    config: PathBuf,
    store: Option<PathBuf>,
    duration: f64,
    write_default_config: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: default_config_path(),
        store: None,
        duration: INSPECT_DURATION,
        write_default_config: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = iter.next().context("--config needs a path")?.into(),
            "--store" => args.store = Some(iter.next().context("--store needs a path")?.into()),
            "--duration" => {
                let value = iter.next().context("--duration needs a value")?;
                args.duration = value
                    .parse()
                    .with_context(|| format!("Invalid duration: {}", value))?;
            }
            "--write-default-config" => args.write_default_config = true,
            other => bail!("Unknown argument: {}", other),
        }
    }
    Ok(args)
}

fn format_time(seconds: f64) -> String {
    let minutes = (seconds / 60.0).floor();
    format!("{:02}:{:06.3}", minutes as u64, seconds - minutes * 60.0)
}

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args()?;

    if args.write_default_config {
        save_config(&LooplineConfig::default(), &args.config)?;
        println!("Wrote default config to {}", args.config.display());
        return Ok(());
    }

    let config: LooplineConfig = load_config(&args.config);
    let store_path = args.store.unwrap_or_else(|| config.persistence.store_path.clone());
    if !store_path.exists() {
        bail!("No store at {}", store_path.display());
    }
    log::info!("loopline-inspect: reading {:?}", store_path);

    let writer = DebouncedWriter::new(YamlFileStore::new(&store_path), config.persistence.debounce());
    let loops = LoopSet::load(&writer, &config.timeline, args.duration);
    let speeds = SpeedResolver::new(writer, config.playback.global_speed);

    println!("Store: {}", store_path.display());
    println!("Global speed: {:.2}x", speeds.mapping().global_fallback());
    println!();

    if loops.is_empty() {
        println!("No loops");
    } else {
        println!(
            "{:>4}  {:<20} {:>10} {:>10} {:>7} {:>6} {:>6}",
            "id", "name", "start", "end", "speed", "repeat", "played"
        );
        for segment in loops.segments() {
            println!(
                "{:>4}  {:<20} {:>10} {:>10} {:>6.2}x {:>6} {:>6}",
                segment.id,
                segment.name,
                format_time(segment.start_time),
                format_time(segment.end_time),
                speeds.get_speed(Some(segment.id)),
                segment.repeat_count,
                segment.play_count
            );
        }
    }

    let orphaned: Vec<_> = speeds
        .mapping()
        .iter()
        .filter(|(id, _)| !loops.contains(*id))
        .collect();
    if !orphaned.is_empty() {
        println!();
        println!("Speed entries without a loop:");
        for (id, speed) in orphaned {
            println!("  {} -> {:.2}x", id, speed);
        }
    }

    if let Some(active) = speeds.mapping().active() {
        println!();
        println!("Active loop: {}", active);
    }

    Ok(())
}
