use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Parser};

use shotgenie::{
    Frontend,
    capture::{CaptureMode, CaptureOutcome, CapturedImage},
    config::ConfigStore,
    export::{ExportError, MenuEntry},
    notification,
};

#[derive(Parser, Debug)]
#[command(name = "shotgenie")]
#[command(
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SHOTGENIE_GIT_HASH"), ")"),
    about = "Screenshot capture and send-to tool for Wayland desktops"
)]
struct Cli {
    /// Capture mode: fullScreen, currentScreen, activeWindow or rectangularRegion
    /// (defaults to the last used mode)
    #[arg(long, short = 'm', value_name = "MODE")]
    mode: Option<String>,

    /// Seconds to wait before capturing
    #[arg(long, short = 'd', value_name = "SECS", default_value_t = 0.0)]
    delay: f64,

    /// Leave the mouse pointer out of the screenshot
    #[arg(long, action = ArgAction::SetTrue)]
    no_pointer: bool,

    /// Leave window decorations out of window captures
    #[arg(long, action = ArgAction::SetTrue)]
    no_decorations: bool,

    /// Print the send-to menu and exit
    #[arg(long, action = ArgAction::SetTrue)]
    list_targets: bool,

    /// Print the send-to menu as JSON (with --list-targets)
    #[arg(long, requires = "list_targets", action = ArgAction::SetTrue)]
    json: bool,

    /// Send the screenshot to a menu target, by id or name
    #[arg(long, value_name = "ID|NAME")]
    send_to: Option<String>,

    /// Use an existing PNG instead of capturing
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Quick-save into the configured location
    #[arg(long, action = ArgAction::SetTrue)]
    save: bool,

    /// Save to exactly this path
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Use this config file instead of ~/.config/shotgenie/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let needs_capture = !cli.list_targets && cli.image.is_none();
    if needs_capture && std::env::var("WAYLAND_DISPLAY").is_err() {
        log::error!("WAYLAND_DISPLAY not set - capturing requires a Wayland session.");
        log::error!("Use --image to export an existing screenshot instead.");
        return Err(anyhow!("WAYLAND_DISPLAY not set"));
    }

    let store = match &cli.config {
        Some(path) => ConfigStore::open(path)?,
        None => ConfigStore::open_default()?,
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let mut frontend = Frontend::new(store, runtime.handle());

    if cli.list_targets {
        return print_targets(&frontend, cli.json);
    }

    runtime.block_on(run(&cli, &mut frontend))
}

async fn run(cli: &Cli, frontend: &mut Frontend) -> Result<()> {
    // The menu is complete before any capture, so a bad target fails first.
    let target = match &cli.send_to {
        Some(selector) => {
            let target = frontend
                .menu()
                .find(selector)
                .ok_or_else(|| ExportError::UnknownTarget(selector.clone()))?;
            Some((target.id(), target.display_name().to_string()))
        }
        None => None,
    };

    match &cli.image {
        Some(path) => {
            let image = CapturedImage::from_file(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            frontend.set_image(image);
        }
        None => capture(cli, frontend).await?,
    }

    if let Some((id, name)) = target {
        let action = frontend.send_to(id).await?;
        log::info!("Exported via {}", action);
        notification::notify_or_log("Screenshot sent", &name).await;
    }

    if let Some(output) = &cli.output {
        frontend.save_as(output).await?;
        println!("{}", output.display());
    }

    if cli.save || (cli.send_to.is_none() && cli.output.is_none()) {
        let path = frontend.save().await?;
        println!("{}", path.display());
    }

    Ok(())
}

async fn capture(cli: &Cli, frontend: &mut Frontend) -> Result<()> {
    let (saved_pointer, saved_decorations) = (
        frontend.config().gui.include_pointer,
        frontend.config().gui.include_decorations,
    );
    let include_pointer = saved_pointer && !cli.no_pointer;
    let include_decorations = saved_decorations && !cli.no_decorations;
    let token = match &cli.mode {
        Some(token) => token.clone(),
        None => CaptureMode::from_index(frontend.config().gui.capture_mode_index)
            .token()
            .to_string(),
    };

    frontend.capture(&token, cli.delay, include_pointer, include_decorations)?;
    if let Ok(mode) = token.parse::<CaptureMode>() {
        frontend.save_capture_mode(mode)?;
    }

    while let Some(event) = frontend.next_event().await {
        let failure = match &event.outcome {
            CaptureOutcome::Success(_) => None,
            CaptureOutcome::Cancelled(reason) => Some(format!("Capture cancelled: {reason}")),
            CaptureOutcome::Failed(message) => Some(format!("Capture failed: {message}")),
            CaptureOutcome::TimedOut(after) => Some(format!("Capture timed out after {after:?}")),
        };
        if !frontend.handle_outcome(event) {
            continue;
        }
        return match failure {
            Some(message) => bail!(message),
            None => Ok(()),
        };
    }
    bail!("Capture manager stopped")
}

fn print_targets(frontend: &Frontend, json: bool) -> Result<()> {
    let entries = frontend.menu().entries();
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    for entry in entries {
        match entry {
            MenuEntry::Target(target) => println!("{:>3}  {}", target.id(), target.display_name()),
            MenuEntry::Separator => println!("     ----"),
        }
    }
    Ok(())
}
