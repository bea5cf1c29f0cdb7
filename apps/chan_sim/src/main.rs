mod sim;

use std::path::PathBuf;

use anyhow::Context;
use mudchan::{ChannelFile, ChannelTable, ScopeRegistry, World};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{Level, info, warn};

fn usage_and_exit() -> ! {
    eprintln!(
        "chan_sim\n\n\
USAGE:\n  chan_sim [--world PATH] [--channels PATH]\n\n\
Reads commands from stdin, one per line (try: help).\n\n\
ENV:\n  CHAN_SIM_WORLD              default demos/world.yaml (multi-document area YAML)\n  CHAN_SIM_CHANNELS           default demos/channels.yaml\n"
    );
    std::process::exit(2);
}

#[derive(Clone, Debug)]
struct Config {
    world_path: PathBuf,
    channels_path: PathBuf,
}

fn parse_args() -> Config {
    let mut world_path: PathBuf = std::env::var("CHAN_SIM_WORLD")
        .unwrap_or_else(|_| "demos/world.yaml".to_string())
        .into();
    let mut channels_path: PathBuf = std::env::var("CHAN_SIM_CHANNELS")
        .unwrap_or_else(|_| "demos/channels.yaml".to_string())
        .into();

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--world" => {
                world_path = it.next().unwrap_or_else(|| usage_and_exit()).into();
            }
            "--channels" => {
                channels_path = it.next().unwrap_or_else(|| usage_and_exit()).into();
            }
            "-h" | "--help" => usage_and_exit(),
            _ => usage_and_exit(),
        }
    }

    Config {
        world_path,
        channels_path,
    }
}

fn load(cfg: &Config) -> anyhow::Result<sim::Sim> {
    let s = std::fs::read_to_string(&cfg.world_path)
        .with_context(|| format!("read world {}", cfg.world_path.display()))?;
    let mut world = World::new();
    let areas = world
        .load_areas_yaml(&cfg.world_path.display().to_string(), &s)
        .context("load world")?;
    for a in &areas {
        info!(zone = %a.zone_id, rooms = a.room_count, "area loaded");
    }

    let s = std::fs::read_to_string(&cfg.channels_path)
        .with_context(|| format!("read channels {}", cfg.channels_path.display()))?;
    let file = ChannelFile::parse(&s)
        .with_context(|| format!("parse channels {}", cfg.channels_path.display()))?;
    // Misconfigured channels stop startup here rather than on first use.
    let channels =
        ChannelTable::from_file(&file, &ScopeRegistry::with_builtin()).context("build channels")?;

    Ok(sim::Sim::new(world, channels))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,chan_sim=info".into()),
        )
        .with_target(false)
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    let cfg = parse_args();
    let mut sim = load(&cfg)?;
    info!(
        world = %cfg.world_path.display(),
        channels = sim.channels.len(),
        "chan_sim ready"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        let resp = match sim.exec(&line) {
            Ok(Some(s)) => s,
            Ok(None) => continue,
            Err(e) => {
                warn!(line = %line.trim(), err = %e, "command failed");
                format!("error: {e}")
            }
        };
        out.write_all(resp.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}
