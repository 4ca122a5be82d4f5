// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` Behavior Player - headless playback of behavior graphs
//!
//! Loads a scene description (RON) and the behavior graph metadata saved
//! with it (JSON), attaches every active graph to its entity and plays a
//! fixed number of frames, replaying the scene's scripted keyboard input.
//! The final entity state is printed to stdout.
//!
//! ```text
//! ordoplay_behavior_player <scene.ron> <behavior.json> [--settings <player.ron>]
//!                          [--frames <n>] [--save <out.json>]
//! ```

mod diagnostics;
mod error;
mod player;
mod scene_file;
mod settings;

use diagnostics::{Diagnostics, DiagnosticsLayer};
use error::{PlayerError, Result};
use player::Player;
use settings::{PlayerSettings, DEFAULT_LOG_FILTER};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const USAGE: &str = "usage: ordoplay_behavior_player <scene.ron> <behavior.json> \
                     [--settings <player.ron>] [--frames <n>] [--save <out.json>]";

/// Parsed command line
#[derive(Debug, Clone, PartialEq, Default)]
struct Args {
    scene: PathBuf,
    metadata: PathBuf,
    settings: Option<PathBuf>,
    frames: Option<u32>,
    save: Option<PathBuf>,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut positional = Vec::new();
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| PlayerError::Usage(format!("{flag} needs a value\n{USAGE}")))
            };
            match arg.as_str() {
                "--settings" => parsed.settings = Some(value("--settings")?.into()),
                "--save" => parsed.save = Some(value("--save")?.into()),
                "--frames" => {
                    let frames = value("--frames")?;
                    parsed.frames = Some(
                        frames
                            .parse()
                            .map_err(|_| PlayerError::Usage(format!("invalid frame count {frames:?}")))?,
                    );
                }
                "-h" | "--help" => return Err(PlayerError::Usage(USAGE.to_string())),
                flag if flag.starts_with("--") => {
                    return Err(PlayerError::Usage(format!("unknown option {flag}\n{USAGE}")));
                }
                _ => positional.push(PathBuf::from(arg)),
            }
        }

        let mut positional = positional.into_iter();
        match (positional.next(), positional.next(), positional.next()) {
            (Some(scene), Some(metadata), None) => {
                parsed.scene = scene;
                parsed.metadata = metadata;
                Ok(parsed)
            }
            _ => Err(PlayerError::Usage(USAGE.to_string())),
        }
    }
}

fn init_logging(filter: &str) -> Diagnostics {
    let (diagnostics_layer, diagnostics) = DiagnosticsLayer::new();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(diagnostics_layer)
        .init();

    diagnostics
}

fn run(args: &Args, settings: PlayerSettings) -> Result<()> {
    let mut player = Player::load(settings, &args.scene, &args.metadata)?;
    let report = player.run();
    tracing::debug!(
        frame = player.frame(),
        running = player.extension().running_graphs(),
        "Graphs still running"
    );
    print!("{report}");
    if let Some(path) = &args.save {
        player.save_metadata(path)?;
    }
    Ok(())
}

fn main() {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let settings = args
        .settings
        .as_deref()
        .map(PlayerSettings::load)
        .transpose();
    let log_filter = settings
        .as_ref()
        .ok()
        .and_then(Option::as_ref)
        .map_or(DEFAULT_LOG_FILTER, |s| s.log_filter.as_str());
    let diagnostics = init_logging(log_filter);

    tracing::info!("Starting OrdoPlay Behavior Player v{}", env!("CARGO_PKG_VERSION"));

    let result = settings.and_then(|settings| {
        let mut settings = settings.unwrap_or_default();
        if let Some(frames) = args.frames {
            settings.frames = frames;
        }
        tracing::info!(
            frames = settings.frames,
            seconds = settings.duration(),
            scene = %args.scene.display(),
            "Playing"
        );
        run(&args, settings)
    });

    if let Err(e) = result {
        tracing::error!("Playback failed: {e}");
        std::process::exit(1);
    }
    tracing::info!(
        warnings = diagnostics.warnings(),
        errors = diagnostics.errors(),
        "Done"
    );
    for message in diagnostics.messages() {
        eprintln!("  {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args> {
        Args::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_parse_positional_and_flags() {
        let args = parse(&["scene.ron", "--frames", "120", "behavior.json", "--save", "out.json"]).unwrap();
        assert_eq!(args.scene, PathBuf::from("scene.ron"));
        assert_eq!(args.metadata, PathBuf::from("behavior.json"));
        assert_eq!(args.frames, Some(120));
        assert_eq!(args.save, Some(PathBuf::from("out.json")));
        assert_eq!(args.settings, None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse(&["scene.ron"]), Err(PlayerError::Usage(_))));
        assert!(matches!(parse(&["a", "b", "c"]), Err(PlayerError::Usage(_))));
        assert!(matches!(parse(&["a", "b", "--frames", "many"]), Err(PlayerError::Usage(_))));
        assert!(matches!(parse(&["a", "b", "--save"]), Err(PlayerError::Usage(_))));
        assert!(matches!(parse(&["a", "b", "--verbose"]), Err(PlayerError::Usage(_))));
    }
}
