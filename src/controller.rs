//! Agent controller
//!
//! Turns user intent (save, start, pause, minimize, restore, exit) into
//! agent and config store calls, and renders what the agent reports.
//!
//! The controller lives on the UI thread and is the only thing that
//! touches the view. The worker never calls into it directly; it sends
//! [`UiEvent::Status`] through the UI channel and [`AgentController::dispatch`]
//! renders it when the UI thread gets to it.

use std::ops::ControlFlow;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Local};
use tokio::sync::mpsc::UnboundedSender;

use crate::agents::{AgentState, ConfigProvider, StatusCallback, UpdateAgent};
use crate::commands::{UserCommand, HELP};
use crate::config::{ConfigError, ConfigStore};
use crate::tray::{Tray, TrayCommand};
use crate::ui::{format_last_run, EntryFields, Indication, StatusView};
use crate::updater::StatusEvent;

/// Everything the UI thread reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Outcome of an attempt, sent by the worker
    Status(StatusEvent),
    /// Console input
    User(UserCommand),
    /// Tray menu selection
    Tray(TrayCommand),
    /// The console input is gone; the agent keeps running headless
    InputClosed,
}

/// Bridges the window and tray to the agent and its config
pub struct AgentController {
    store: Arc<ConfigStore>,
    agent: Arc<UpdateAgent>,
    view: Box<dyn StatusView>,
    tray: Box<dyn Tray>,
    fields: Arc<RwLock<EntryFields>>,
    events: UnboundedSender<UiEvent>,
    minimized: bool,
    last_run: Option<DateTime<Local>>,
}

impl AgentController {
    /// Creates the controller and starts the agent right away if the
    /// stored config already has a URL
    pub fn new(
        store: Arc<ConfigStore>,
        agent: Arc<UpdateAgent>,
        view: Box<dyn StatusView>,
        tray: Box<dyn Tray>,
        events: UnboundedSender<UiEvent>,
    ) -> Self {
        let config = store.current();
        let fields = EntryFields::from_config(&config);

        let mut controller = Self {
            store,
            agent,
            view,
            tray,
            fields: Arc::new(RwLock::new(fields.clone())),
            events,
            minimized: false,
            last_run: None,
        };

        controller.view.show_fields(&fields);
        if config.is_configured() {
            controller.view.show_status(&Indication::Stopped);
            tracing::info!("Update URL configured, starting agent");
            controller.on_start_requested();
        } else {
            controller.view.show_status(&Indication::Unconfigured);
        }

        controller
    }

    /// Current entry field contents
    pub fn fields(&self) -> EntryFields {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn edit_fields(&self, edit: impl FnOnce(&mut EntryFields)) {
        let mut fields = self.fields();
        edit(&mut fields);
        *self.fields.write().unwrap_or_else(PoisonError::into_inner) = fields;
    }

    /// Replaces the URL field
    pub fn set_url_field(&mut self, url: &str) {
        self.edit_fields(|fields| fields.url = url.to_string());
    }

    /// Replaces the interval field
    pub fn set_interval_field(&mut self, interval: &str) {
        self.edit_fields(|fields| fields.interval = interval.to_string());
    }

    /// Run state of the agent
    pub fn agent_state(&self) -> AgentState {
        self.agent.state()
    }

    /// Returns true while the window is hidden in the tray
    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Persists the given field values
    pub fn on_save(&mut self, url_text: &str, interval_text: &str) {
        match self.store.save(url_text, interval_text) {
            Ok(_) => self.view.show_status(&Indication::Saved),
            Err(ConfigError::InvalidInterval(text)) => {
                tracing::debug!("Rejected interval {:?}", text);
                self.view.show_status(&Indication::InvalidInterval);
            }
            Err(e) => {
                tracing::error!("Failed to save config: {}", e);
                self.view.show_status(&Indication::SaveFailed(e.to_string()));
            }
        }
    }

    /// Starts the agent against the live entry fields
    pub fn on_start_requested(&mut self) {
        if self.agent.start(self.config_provider(), self.status_callback()) {
            self.view.show_status(&Indication::Running);
        }
    }

    /// Stops polling but keeps the process alive
    pub fn on_pause_requested(&mut self) {
        if self.agent.stop() {
            self.view.show_status(&Indication::Stopped);
        }
    }

    /// The exit path: stop the agent, release the tray, then leave the
    /// event loop so the process can terminate
    pub fn on_stop_requested(&mut self) -> ControlFlow<()> {
        self.agent.stop();
        if self.tray.is_shown() {
            self.tray.release();
        }
        tracing::info!("Exiting");
        ControlFlow::Break(())
    }

    /// Hides the window behind a tray icon; the agent keeps running
    pub fn on_minimize_to_tray(&mut self) {
        if self.minimized {
            return;
        }
        match self.tray.show() {
            Ok(()) => {
                self.view.set_visible(false);
                self.minimized = true;
            }
            Err(e) => tracing::warn!("Cannot minimize, keeping window open: {}", e),
        }
    }

    /// Brings the window back; the agent is not restarted
    pub fn on_restore_from_tray(&mut self) {
        if !self.minimized {
            return;
        }
        self.tray.release();
        self.minimized = false;
        self.view.set_visible(true);
        let fields = self.fields();
        self.view.show_fields(&fields);
    }

    /// Single handler for every tray menu entry
    pub fn handle_tray(&mut self, command: TrayCommand) -> ControlFlow<()> {
        match command {
            TrayCommand::Open => {
                self.on_restore_from_tray();
                ControlFlow::Continue(())
            }
            TrayCommand::Exit => self.on_stop_requested(),
        }
    }

    /// Displays the outcome of one attempt
    pub fn render_status(&mut self, event: &StatusEvent) {
        self.view.show_status(&Indication::from(&event.outcome));
        if event.outcome.counts_as_run() {
            self.last_run = Some(event.timestamp);
            self.view.show_last_run(event.timestamp);
        }
    }

    /// Handles one event on the UI thread
    pub fn dispatch(&mut self, event: UiEvent) -> ControlFlow<()> {
        match event {
            UiEvent::Status(event) => {
                self.render_status(&event);
                ControlFlow::Continue(())
            }
            UiEvent::User(command) => self.handle_command(command),
            UiEvent::Tray(command) => self.handle_tray(command),
            UiEvent::InputClosed => {
                tracing::info!("Console input closed, agent keeps running");
                ControlFlow::Continue(())
            }
        }
    }

    fn handle_command(&mut self, command: UserCommand) -> ControlFlow<()> {
        match command {
            UserCommand::SetUrl(url) => self.set_url_field(&url),
            UserCommand::SetInterval(interval) => self.set_interval_field(&interval),
            UserCommand::Save => {
                let fields = self.fields();
                self.on_save(&fields.url, &fields.interval);
            }
            UserCommand::Start => self.on_start_requested(),
            UserCommand::Pause => self.on_pause_requested(),
            UserCommand::Minimize => self.on_minimize_to_tray(),
            UserCommand::Tray(command) => return self.handle_tray(command),
            UserCommand::Show => self.show_overview(),
            UserCommand::Help => self.view.show_notice(HELP),
            UserCommand::Nothing => {}
            UserCommand::Unknown(line) => self
                .view
                .show_notice(&format!("Unknown command {:?}, type 'help'", line)),
        }
        ControlFlow::Continue(())
    }

    fn show_overview(&mut self) {
        let fields = self.fields();
        self.view.show_fields(&fields);
        self.view.show_notice(&format_last_run(self.last_run));
        let state = if self.agent.state().is_running() {
            Indication::Running
        } else {
            Indication::Stopped
        };
        self.view.show_status(&state);
    }

    fn config_provider(&self) -> ConfigProvider {
        let fields = Arc::clone(&self.fields);
        let store = Arc::clone(&self.store);
        Arc::new(move || {
            fields
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .to_config(&store.current())
        })
    }

    fn status_callback(&self) -> StatusCallback {
        let events = self.events.clone();
        Arc::new(move |event| {
            if events.send(UiEvent::Status(event)).is_err() {
                tracing::debug!("UI is gone, dropping status event");
            }
        })
    }
}
