mod app;
mod env;
mod topology;
mod util;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::topology::{AnnotationSyncPolicy, ClickAction, TopologyConfig};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON environment fixture; the built-in demo is used when omitted.
    #[arg(long)]
    fixture: Option<PathBuf>,
    /// Simulated round-trip time of environment calls.
    #[arg(long, default_value_t = 400)]
    latency_ms: u64,
    /// Deny position updates and destroys like a read-only environment.
    #[arg(long)]
    read_only: bool,
    /// Charm whose services cannot be destroyed from the menu.
    #[arg(long, default_value = "juju-gui")]
    protected_charm: String,
    #[arg(long, default_value_t = 750)]
    long_press_ms: u64,
    #[arg(long, default_value_t = 4.0)]
    drag_threshold: f32,
    #[arg(long, value_enum, default_value_t = AnnotationSyncPolicy::BothAxes)]
    annotation_sync: AnnotationSyncPolicy,
    #[arg(long, value_enum, default_value_t = ClickAction::ToggleMenu)]
    click_action: ClickAction,
}

impl Args {
    fn launch_options(self) -> app::LaunchOptions {
        let config = TopologyConfig {
            long_press_delay: Duration::from_millis(self.long_press_ms),
            drag_threshold: self.drag_threshold,
            annotation_sync: self.annotation_sync,
            protected_charm: self.protected_charm,
            click_action: self.click_action,
            ..TopologyConfig::default()
        };

        app::LaunchOptions {
            fixture: self.fixture,
            config,
            latency: Duration::from_millis(self.latency_ms),
            read_only: self.read_only,
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "service_topology=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = Args::parse().launch_options();
    tracing::info!(source = ?options.fixture, read_only = options.read_only, "starting");

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "service-topology",
        native_options,
        Box::new(move |cc| Ok(Box::new(app::TopologyApp::new(cc, options)))),
    )
}
