use std::{path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use audio_integration::{AudioAssetProvider, AudioError, SimulatedAudioProvider};
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand};
use notifier::{dispatch_pending, DispatchError, LoggingPushSender};
use rosary_core::{PrayerSessionController, SessionError, StepKind, StepOutcome};
use shared::{
    domain::{DurationId, GuideId, MysteryCategory, UnknownCategory},
    error::{CodedError, ErrorCode, ErrorPayload},
    mysteries::{mystery_set, MysterySet, MEDITATIONS_PER_SET},
};
use storage::Storage;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_database_url, Settings};

#[derive(Parser, Debug)]
#[command(name = "rosary", about = "Guided rosary sessions and parish notification dispatch")]
struct Cli {
    #[arg(long, default_value = "rosary.toml")]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    /// Emit machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List a mystery set; defaults to the set prayed today.
    Mysteries { category: Option<String> },
    /// Walk through one meditation step by step.
    Pray {
        #[arg(long)]
        category: Option<String>,
        /// One-based position of the meditation within its set.
        #[arg(long, default_value_t = 1)]
        meditation: u8,
        #[arg(long)]
        guide: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        /// Play the meditation audio before reading the prayers.
        #[arg(long)]
        listen: bool,
        /// Print every repeated prayer in full.
        #[arg(long)]
        full: bool,
        /// Continue with the remaining meditations of the set.
        #[arg(long)]
        through: bool,
    },
    /// Apply database migrations.
    Migrate,
    /// Queue a notification for the next dispatch pass.
    Enqueue {
        recipient: String,
        title: String,
        body: String,
    },
    /// Send one batch of unsent notifications.
    Dispatch {
        #[arg(long)]
        batch: Option<u32>,
    },
}

struct PrayArgs {
    category: Option<String>,
    meditation: u8,
    guide: Option<String>,
    duration: Option<String>,
    listen: bool,
    full: bool,
    through: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string(&error_payload(&err)).unwrap_or_default()
                );
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings(&cli.config);
    if let Some(url) = cli.database_url {
        settings.database_url = normalize_database_url(&url);
    }

    match cli.command {
        Command::Mysteries { category } => list_mysteries(category.as_deref(), cli.json),
        Command::Pray {
            category,
            meditation,
            guide,
            duration,
            listen,
            full,
            through,
        } => {
            let args = PrayArgs {
                category,
                meditation,
                guide,
                duration,
                listen,
                full,
                through,
            };
            pray(&settings, args, cli.json).await
        }
        Command::Migrate => {
            Storage::new(&settings.database_url).await?;
            info!("migrate: database ready url={}", settings.database_url);
            Ok(())
        }
        Command::Enqueue {
            recipient,
            title,
            body,
        } => {
            let storage = Storage::connect(&settings.database_url).await?;
            storage.verify_schema().await?;
            let id = storage
                .enqueue_notification(&recipient, &title, &body)
                .await?;
            println!("queued notification_id={}", id.0);
            Ok(())
        }
        Command::Dispatch { batch } => {
            let storage = Storage::connect(&settings.database_url).await?;
            let batch = batch.unwrap_or(settings.dispatch_batch);
            let report = dispatch_pending(&storage, &LoggingPushSender, batch).await?;
            if cli.json {
                println!("{}", serde_json::to_string(&report)?);
            } else {
                println!(
                    "attempted={} sent={} failed={}",
                    report.attempted, report.sent, report.failed
                );
            }
            Ok(())
        }
    }
}

fn resolve_category(raw: Option<&str>) -> Result<MysteryCategory> {
    match raw {
        Some(raw) => Ok(raw.parse::<MysteryCategory>()?),
        None => Ok(MysteryCategory::for_weekday(Local::now().weekday())),
    }
}

fn list_mysteries(category: Option<&str>, json: bool) -> Result<()> {
    let set = mystery_set(resolve_category(category)?);
    if json {
        println!("{}", serde_json::to_string_pretty(set)?);
        return Ok(());
    }
    print_set(set);
    Ok(())
}

fn print_set(set: &MysterySet) {
    println!("{} Mysteries", set.category);
    for meditation in &set.meditations {
        match meditation.scripture {
            Some(reference) => println!(
                "  {}. {} ({reference})",
                meditation.id.ordinal + 1,
                meditation.title
            ),
            None => println!("  {}. {}", meditation.id.ordinal + 1, meditation.title),
        }
    }
}

fn simulated_audio(settings: &Settings) -> SimulatedAudioProvider {
    let length = Duration::from_secs(settings.track_seconds);
    settings
        .durations
        .iter()
        .fold(SimulatedAudioProvider::new(), |provider, duration| {
            provider.with_track_length(DurationId::new(duration.clone()), length)
        })
}

async fn pray(settings: &Settings, args: PrayArgs, json: bool) -> Result<()> {
    let set = mystery_set(resolve_category(args.category.as_deref())?);
    let meditation = args
        .meditation
        .checked_sub(1)
        .and_then(|ordinal| set.meditation(ordinal))
        .ok_or_else(|| {
            CodedError::new(
                ErrorCode::Validation,
                format!("meditation must be between 1 and {MEDITATIONS_PER_SET}"),
            )
        })?;
    let guide = GuideId::new(args.guide.unwrap_or_else(|| settings.guide.clone()));
    let duration = DurationId::new(args.duration.unwrap_or_else(|| settings.duration.clone()));

    let audio: Arc<dyn AudioAssetProvider> = Arc::new(simulated_audio(settings));
    let mut session =
        PrayerSessionController::start(audio, meditation, guide.clone(), duration.clone());

    loop {
        if args.listen {
            match session.toggle_playback().await {
                Ok(_) => {
                    session.wait_for_playback_end().await;
                }
                Err(err) => warn!("pray: continuing without audio: {err}"),
            }
        }

        loop {
            if args.full && !session.show_full_text() {
                session.toggle_full_text();
            }
            print_current_step(&session, json)?;
            match session.next().await {
                StepOutcome::Moved { .. } => continue,
                StepOutcome::Unchanged | StepOutcome::SessionComplete => break,
            }
        }

        if !args.through {
            break;
        }
        let Some(next) = set.next_after(session.meditation().id) else {
            break;
        };
        session.restart(next, guide.clone(), duration.clone()).await;
    }

    session.close().await;
    Ok(())
}

fn print_current_step(session: &PrayerSessionController, json: bool) -> Result<()> {
    if json {
        let line = serde_json::to_string(&session.snapshot()).context("serialize step")?;
        println!("{line}");
        return Ok(());
    }

    let step = session.current_step();
    if step.kind == StepKind::Announcement {
        println!();
        println!("== {} ==", session.meditation().title);
    }
    println!("[{}] {}", step.badge, step.title);
    let first_repeat = session
        .steps()
        .iter()
        .position(|candidate| candidate.kind == StepKind::RepeatedPrayer);
    let show_text = step.kind != StepKind::RepeatedPrayer
        || session.show_full_text()
        || first_repeat == Some(step.ordinal);
    if show_text {
        println!("    {}", step.text);
    }
    Ok(())
}

fn error_payload(err: &anyhow::Error) -> ErrorPayload {
    if let Some(err) = err.downcast_ref::<DispatchError>() {
        return err.payload();
    }
    if let Some(session_err) = err.downcast_ref::<SessionError>() {
        let code = match session_err {
            SessionError::OutOfRange { .. } => ErrorCode::Validation,
            SessionError::Playback(AudioError::NotFound(_)) => ErrorCode::NotFound,
            SessionError::Playback(_) => ErrorCode::Playback,
        };
        return ErrorPayload::new(code, session_err.to_string());
    }
    if let Some(coded) = err.downcast_ref::<CodedError>() {
        return ErrorPayload::new(coded.code, coded.message.clone());
    }
    if let Some(unknown) = err.downcast_ref::<UnknownCategory>() {
        return ErrorPayload::new(ErrorCode::Validation, unknown.to_string());
    }
    if err.downcast_ref::<storage::SchemaError>().is_some() {
        return ErrorPayload::new(ErrorCode::Schema, format!("{err:#}"));
    }
    ErrorPayload::new(ErrorCode::Internal, format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_payload_codes() {
        let unknown: anyhow::Error = UnknownCategory("festive".into()).into();
        assert_eq!(error_payload(&unknown).code, ErrorCode::Validation);

        let out_of_range: anyhow::Error = SessionError::OutOfRange { index: 20, len: 14 }.into();
        assert_eq!(error_payload(&out_of_range).code, ErrorCode::Validation);

        let missing: anyhow::Error =
            SessionError::Playback(AudioError::NotFound("joyful/1".into())).into();
        assert_eq!(error_payload(&missing).code, ErrorCode::NotFound);

        let other = anyhow::anyhow!("disk on fire");
        let payload = error_payload(&other);
        assert_eq!(payload.code, ErrorCode::Internal);
        assert_eq!(payload.message, "disk on fire");
    }

    #[test]
    fn simulated_audio_serves_configured_durations_only() {
        let settings = Settings {
            durations: vec!["short".into()],
            ..Settings::default()
        };
        let provider = simulated_audio(&settings);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        runtime.block_on(async {
            let request = |duration: &str| audio_integration::AudioRequest {
                meditation: mystery_set(MysteryCategory::Joyful).meditations[0].id,
                guide: GuideId::new("sister-anne"),
                duration: DurationId::new(duration),
            };
            assert!(provider.resolve(&request("short")).await.is_ok());
            assert!(matches!(
                provider.resolve(&request("standard")).await,
                Err(AudioError::NotFound(_))
            ));
        });
    }

    #[test]
    fn cli_parses_pray_flags() {
        let cli = Cli::try_parse_from([
            "rosary",
            "--json",
            "pray",
            "--category",
            "luminous",
            "--meditation",
            "3",
            "--through",
        ])
        .expect("parse");
        assert!(cli.json);
        match cli.command {
            Command::Pray {
                category,
                meditation,
                through,
                listen,
                ..
            } => {
                assert_eq!(category.as_deref(), Some("luminous"));
                assert_eq!(meditation, 3);
                assert!(through);
                assert!(!listen);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
