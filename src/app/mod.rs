use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use eframe::egui::{self, Context, Rect};

use crate::env::{Database, SimulatedEnvironment, demo_database, load_database};
use crate::topology::{ServiceModule, TopologyConfig};

mod canvas;
mod render_utils;
mod ui;

use canvas::CanvasScene;

/// Everything needed to (re)build a topology view.
#[derive(Clone, Debug)]
pub struct LaunchOptions {
    pub fixture: Option<PathBuf>,
    pub config: TopologyConfig,
    pub latency: Duration,
    pub read_only: bool,
}

impl LaunchOptions {
    fn source_label(&self) -> String {
        self.fixture
            .as_ref()
            .map_or_else(|| "built-in demo".to_owned(), |path| path.display().to_string())
    }
}

pub struct TopologyApp {
    options: LaunchOptions,
    state: AppState,
    reload_rx: Option<Receiver<Result<Database, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<Database, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    db: Database,
    env: SimulatedEnvironment,
    module: ServiceModule<CanvasScene>,
    canvas_rect: Rect,
    search: String,
    selected: Option<String>,
    location: Option<String>,
    charm_panel_open: bool,
    relation_source: Option<String>,
    pending_serial: usize,
}

impl TopologyApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        let state = Self::start_load(options.fixture.clone());
        Self {
            options,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(fixture: Option<PathBuf>) -> Receiver<Result<Database, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = match &fixture {
                Some(path) => load_database(path),
                None => demo_database(),
            };
            let _ = tx.send(result.map_err(|error| format!("{error:#}")));
        });

        rx
    }

    fn start_load(fixture: Option<PathBuf>) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(fixture),
        }
    }

    fn ready(&self, db: Database) -> AppState {
        tracing::info!(
            services = db.services().len(),
            relations = db.relations().len(),
            "environment loaded"
        );
        AppState::Ready(Box::new(ViewModel::new(db, &self.options)))
    }
}

impl eframe::App for TopologyApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(result);
                    }
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition = Some(Err("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading environment...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
                ctx.request_repaint_after(Duration::from_millis(50));
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the environment");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        self.reload_rx = Some(Self::spawn_load(self.options.fixture.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(
                    ctx,
                    &self.options.source_label(),
                    &mut reload_requested,
                    is_reloading,
                );

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.options.fixture.clone()));
                }
            }
        }

        if let Some(rx) = self.reload_rx.take() {
            match rx.try_recv() {
                Ok(result) => transition = Some(result),
                Err(TryRecvError::Empty) => {
                    self.reload_rx = Some(rx);
                    ctx.request_repaint_after(Duration::from_millis(50));
                }
                Err(TryRecvError::Disconnected) => {
                    transition = Some(Err("Background load worker disconnected".to_owned()));
                }
            }
        }

        if let Some(result) = transition {
            self.reload_rx = None;
            self.state = match result {
                Ok(db) => self.ready(db),
                Err(error) => {
                    tracing::warn!(%error, "environment failed to load");
                    AppState::Error(error)
                }
            };
        }
    }
}
