use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use shimkit_natives::{NativesConfig, Openh264Resolver, Platform, Resolved, ShimResolver};
use std::path::PathBuf;

mod logging;

/// Download, verify and cache shimkit's native libraries ahead of time.
#[derive(Debug, Parser)]
#[command(name = "shimkit-fetch", version)]
#[command(about = "Prefetch shimkit native libraries into the shared cache", long_about = None)]
struct Cli {
    /// Which library to fetch.
    #[arg(long, value_enum, default_value_t = Component::All)]
    component: Component,

    /// Shim flavor (overrides SHIMKIT_FLAVOR).
    #[arg(long)]
    flavor: Option<String>,

    /// Cache root (overrides SHIMKIT_CACHE_DIR).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Target platform as OS/ARCH, e.g. linux/arm64. Defaults to this host.
    #[arg(long, value_parser = parse_platform)]
    platform: Option<Platform>,

    /// Treat "no OpenH264 binary published for this platform" as an error.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Component {
    Shim,
    Openh264,
    All,
}

fn parse_platform(s: &str) -> Result<Platform, String> {
    Platform::parse(s).ok_or_else(|| format!("expected OS/ARCH, got {s:?}"))
}

fn print(component: &str, resolved: &Resolved) {
    println!(
        "{component}\t{}\t{}",
        resolved.origin,
        resolved.path.display()
    );
}

fn run(cli: Cli) -> Result<()> {
    let mut cfg = NativesConfig::from_env().context("reading configuration from environment")?;
    if let Some(flavor) = cli.flavor {
        cfg.shim.flavor = flavor;
    }
    if let Some(dir) = cli.cache_dir {
        cfg.cache_dir = dir;
    }
    if let Some(platform) = cli.platform {
        cfg.platform = platform;
    }
    tracing::debug!(
        cache_dir = %cfg.cache_dir.display(),
        platform = %cfg.platform,
        "configuration"
    );

    if matches!(cli.component, Component::Shim | Component::All) {
        let shim = ShimResolver::new(&cfg)
            .resolve()
            .with_context(|| format!("resolving shim flavor {:?}", cfg.shim.flavor))?;
        print("shim", &shim);
    }

    if matches!(cli.component, Component::Openh264 | Component::All) {
        match Openh264Resolver::new(&cfg).resolve() {
            Ok(codec) => print("openh264", &codec),
            Err(e) if e.is_not_published() && !cli.strict => {
                tracing::warn!(error = %e, "skipping openh264");
            }
            Err(e) => return Err(anyhow!(e).context("resolving openh264")),
        }
    }

    Ok(())
}

fn main() {
    logging::init_logging();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("shimkit-fetch error: {:#}", err);
        std::process::exit(1);
    }
}
