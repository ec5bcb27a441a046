//! CLI binary for nomad.

use clap::{Parser, Subcommand};
use nomad::config::{self, Config};
use nomad::device::{
    ClockedOutput, FileCamera, FileMicrophone, FixedGeolocator, GeoPoint, Geolocator,
};
use nomad::gateway::{GeminiGateway, GroundingSource, TravelGateway};
use nomad::scene::Scene;
use nomad::shell::{Shell, Tab};
use nomad::views::itinerary::PREFERENCE_PRESETS;
use nomad::views::{ChatView, ItineraryView, LensView, SafetyView, TranslatorView, VoiceGuideView};
use nomad::voice::{GeminiLiveConnector, SessionSettings, VoiceStatus};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// NomadAI: your AI travel companion.
#[derive(Parser)]
#[command(name = "nomad", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask the guide a question.
    Chat {
        /// The question.
        #[arg(required = true)]
        message: Vec<String>,
    },

    /// Identify a landmark, object or sign in a photo.
    Lens {
        /// Image file (PNG or JPEG) standing in for the camera.
        image: PathBuf,
    },

    /// Build a day-by-day itinerary.
    Plan {
        destination: String,
        /// Trip length in days (1-14).
        #[arg(short, long, default_value_t = 3)]
        days: u32,
        /// Vibe preset (relaxed, sightseeing, budget, luxury) or free text.
        #[arg(short, long, default_value = "relaxed")]
        vibe: String,
    },

    /// Quick activity suggestions for a destination.
    Suggest { destination: String },

    /// Translate a phrase with a pronunciation guide.
    Translate {
        #[arg(required = true)]
        text: Vec<String>,
        /// Target language.
        #[arg(short, long, default_value = "Japanese")]
        to: String,
    },

    /// Safety briefing for the configured location.
    Safety {
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
    },

    /// Talk to the live guide.
    Voice {
        /// Raw mono f32le PCM at the capture rate, played as the microphone.
        #[arg(long)]
        mic: PathBuf,
        /// Write the guide's audio here as s16le PCM.
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Show the ambient scene.
    Scene {
        #[arg(long)]
        destination: Option<String>,
    },
}

impl Command {
    fn tab(&self) -> Option<Tab> {
        match self {
            Self::Chat { .. } => Some(Tab::Chat),
            Self::Lens { .. } => Some(Tab::Lens),
            Self::Plan { .. } | Self::Suggest { .. } => Some(Tab::Itinerary),
            Self::Translate { .. } => Some(Tab::Translate),
            Self::Safety { .. } => Some(Tab::Safety),
            Self::Voice { .. } => Some(Tab::Voice),
            Self::Scene { .. } => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("nomad=info,reqwest=warn,tungstenite=warn,tokio_tungstenite=warn")
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let mut shell = Shell::new(Scene::at_startup(&config.scene.default_destination));
    // Running a feature command is the traveller's consent.
    shell.grant_consent();
    if let Some(tab) = cli.command.tab() {
        shell.select_tab(tab)?;
    }

    let gateway = GeminiGateway::new(config.api_key.clone(), &config.gateway);
    let location_timeout = Duration::from_secs(config.location.geolocation_timeout_secs);

    match cli.command {
        Command::Chat { message } => {
            run_chat(&message.join(" "), &gateway, &geolocator(&config), location_timeout).await
        }
        Command::Lens { image } => run_lens(FileCamera::new(image), &gateway).await,
        Command::Plan {
            destination,
            days,
            vibe,
        } => run_plan(&mut shell, &gateway, &destination, days, &vibe).await,
        Command::Suggest { destination } => run_suggest(&mut shell, &gateway, &destination).await,
        Command::Translate { text, to } => run_translate(&text.join(" "), &to, &gateway).await,
        Command::Safety { lat, lng } => {
            let geo = match (lat, lng) {
                (Some(latitude), Some(longitude)) => FixedGeolocator::new(Some(GeoPoint {
                    latitude,
                    longitude,
                })),
                _ => geolocator(&config),
            };
            run_safety(&geo, &gateway, location_timeout).await
        }
        Command::Voice { mic, record } => run_voice(&config, mic, record).await,
        Command::Scene { destination } => {
            shell.apply_destination(destination);
            print_scene(&shell);
            Ok(())
        }
    }
}

fn geolocator(config: &Config) -> FixedGeolocator {
    FixedGeolocator::new(config.location.fixed.map(|fixed| GeoPoint {
        latitude: fixed.latitude,
        longitude: fixed.longitude,
    }))
}

fn print_sources(sources: &[GroundingSource]) {
    if sources.is_empty() {
        return;
    }
    println!("\nSources:");
    for source in sources {
        let kind = match source {
            GroundingSource::Web { .. } => "web",
            GroundingSource::Map { .. } => "map",
        };
        println!("  [{kind}] {} <{}>", source.title(), source.uri());
    }
}

async fn run_chat(
    message: &str,
    gateway: &dyn TravelGateway,
    geo: &dyn Geolocator,
    location_timeout: Duration,
) -> anyhow::Result<()> {
    let mut chat = ChatView::new(location_timeout);
    if let Some(reply) = chat.send(message, gateway, geo).await {
        println!("{}", reply.content);
        print_sources(&reply.grounding);
    }
    Ok(())
}

async fn run_lens(camera: FileCamera, gateway: &dyn TravelGateway) -> anyhow::Result<()> {
    let mut lens = LensView::new();
    lens.capture_and_analyze(&camera, gateway).await;
    if let Some(text) = lens.result().display_text() {
        println!("{text}");
    }
    Ok(())
}

async fn run_plan(
    shell: &mut Shell,
    gateway: &dyn TravelGateway,
    destination: &str,
    days: u32,
    vibe: &str,
) -> anyhow::Result<()> {
    let mut planner = ItineraryView::new(&shell.scene().destination);
    planner.set_destination(destination);
    planner.set_days(days);
    let preferences = PREFERENCE_PRESETS
        .iter()
        .find(|(label, _)| label.eq_ignore_ascii_case(vibe))
        .map_or(vibe, |(_, text)| *text);
    planner.set_preferences(preferences);

    let moved = planner.generate(gateway).await;
    shell.apply_destination(moved);

    println!("{} · {} days · {}", shell.header_label(), planner.days(), planner.preferences());
    println!();
    if let Some(text) = planner.itinerary().display_text() {
        println!("{text}");
    }
    Ok(())
}

async fn run_suggest(
    shell: &mut Shell,
    gateway: &dyn TravelGateway,
    destination: &str,
) -> anyhow::Result<()> {
    let mut planner = ItineraryView::new(&shell.scene().destination);
    planner.set_destination(destination);
    planner.refresh_suggestions(gateway).await;
    let moved = planner.destination().trim();
    if !moved.is_empty() {
        shell.apply_destination(Some(moved.to_string()));
    }

    if let Some(reason) = planner.suggestion_status().failure() {
        eprintln!("Couldn't fetch suggestions: {reason}");
    }
    println!("Quick picks for {}:", shell.header_label());
    for suggestion in planner.suggestions() {
        println!(
            "  • {} [{}]: {}",
            suggestion.title, suggestion.category, suggestion.description
        );
    }
    Ok(())
}

async fn run_translate(text: &str, to: &str, gateway: &dyn TravelGateway) -> anyhow::Result<()> {
    let mut translator = TranslatorView::new();
    translator.set_text(text);
    translator.set_target_language(to);
    translator.translate(gateway).await;
    if let Some(text) = translator.result().display_text() {
        println!("{text}");
    }
    Ok(())
}

async fn run_safety(
    geo: &dyn Geolocator,
    gateway: &dyn TravelGateway,
    location_timeout: Duration,
) -> anyhow::Result<()> {
    let mut safety = SafetyView::new(location_timeout);
    safety.load(geo, gateway).await;

    println!("{}: {}", safety.location_name(), safety.region_status());
    for alert in safety.alerts() {
        println!("  ! [{:?}] {}: {}", alert.severity, alert.title, alert.desc);
    }
    if !safety.etiquette().is_empty() {
        println!("\nLocal etiquette:");
        for tip in safety.etiquette() {
            println!("  • {tip}");
        }
    }
    Ok(())
}

async fn run_voice(config: &Config, mic: PathBuf, record: Option<PathBuf>) -> anyhow::Result<()> {
    let api_key = config.api_key.clone().unwrap_or_default();
    let mut guide = VoiceGuideView::new(
        Arc::new(GeminiLiveConnector::new(api_key, &config.voice)),
        Arc::new(FileMicrophone::new(mic)),
        Arc::new(ClockedOutput::new(record)),
        SessionSettings::from(&config.voice),
    );

    println!("{}", VoiceStatus::Connecting.caption());
    guide.start().await?;
    println!("{} Press Ctrl+C to stop.", guide.caption());

    let mut status = guide.subscribe();
    let ended = async move { status.wait_for(|s| *s == VoiceStatus::Idle).await.is_ok() };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("received Ctrl+C, shutting down..."),
        _ = ended => info!("Live session ended"),
    }
    guide.stop().await;

    for line in guide.transcript() {
        println!("{line}");
    }
    Ok(())
}

fn print_scene(shell: &Shell) {
    let scene = shell.scene();
    let overlay = scene.overlay();
    println!("{}", shell.header_label());
    println!("  time of day: {}", scene.time_of_day.as_str());
    println!("  backdrop:    {}", scene.backdrop_url());
    println!("  overlay:     {} at {}%", overlay.color, overlay.opacity);
}
