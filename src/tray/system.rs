//! Native tray icon
//!
//! The icon and its menu live on a dedicated thread running a `tao` event
//! loop. Menu clicks are forwarded to the UI thread as [`UiEvent::Tray`];
//! the UI thread shows and hides the icon through the loop's proxy.
//! The loop thread is started on the first `show()` and never exits.

use std::thread;

use tao::event::{Event, StartCause};
use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tray_icon::menu::{Menu, MenuEvent, MenuId, MenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

use super::{Tray, TrayCommand, TrayError};
use crate::controller::UiEvent;

const TOOLTIP: &str = "Dynamic DNS Agent";
const ICON_SIZE: u32 = 64;
const ICON_COLOR: [u8; 4] = [0x1e, 0x63, 0xd6, 0xff];

/// Requests from the UI thread to the tray thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrayRequest {
    Show,
    Hide,
}

type Ready = oneshot::Sender<Result<EventLoopProxy<TrayRequest>, TrayError>>;

/// Tray icon in the desktop's notification area
pub struct SystemTray {
    events: UnboundedSender<UiEvent>,
    proxy: Option<EventLoopProxy<TrayRequest>>,
    shown: bool,
}

impl SystemTray {
    /// Creates the tray; nothing is shown until [`Tray::show`]
    pub fn new(events: UnboundedSender<UiEvent>) -> Self {
        Self {
            events,
            proxy: None,
            shown: false,
        }
    }

    fn request(&self, request: TrayRequest) -> Result<(), TrayError> {
        let proxy = self
            .proxy
            .as_ref()
            .ok_or_else(|| TrayError::Unavailable("tray thread not started".into()))?;
        proxy
            .send_event(request)
            .map_err(|_| TrayError::Unavailable("tray thread has exited".into()))
    }

    fn spawn(&self) -> Result<EventLoopProxy<TrayRequest>, TrayError> {
        ensure_desktop()?;

        let (ready_tx, ready_rx) = oneshot::channel();
        let events = self.events.clone();
        thread::Builder::new()
            .name("tray".into())
            .spawn(move || run_tray_loop(events, ready_tx))
            .map_err(|e| TrayError::Unavailable(e.to_string()))?;

        ready_rx
            .blocking_recv()
            .map_err(|_| TrayError::Unavailable("tray thread failed to start".into()))?
    }
}

impl Tray for SystemTray {
    fn show(&mut self) -> Result<(), TrayError> {
        if self.shown {
            return Ok(());
        }

        if self.proxy.is_some() {
            self.request(TrayRequest::Show)?;
        } else {
            // The icon starts out visible
            let proxy = self.spawn()?;
            self.proxy = Some(proxy);
        }

        self.shown = true;
        tracing::debug!("Tray icon shown");
        Ok(())
    }

    fn release(&mut self) {
        if !self.shown {
            return;
        }
        self.shown = false;
        match self.request(TrayRequest::Hide) {
            Ok(()) => tracing::debug!("Tray icon released"),
            Err(e) => tracing::debug!("Could not hide tray icon: {}", e),
        }
    }

    fn is_shown(&self) -> bool {
        self.shown
    }
}

#[cfg(target_os = "linux")]
fn ensure_desktop() -> Result<(), TrayError> {
    if std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some() {
        Ok(())
    } else {
        Err(TrayError::Unavailable("no graphical session".into()))
    }
}

#[cfg(target_os = "windows")]
fn ensure_desktop() -> Result<(), TrayError> {
    Ok(())
}

// The event loop must own the main thread here, which belongs to the UI
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn ensure_desktop() -> Result<(), TrayError> {
    Err(TrayError::Unavailable(
        "native tray is not supported off the main thread on this platform".into(),
    ))
}

fn command_for(ids: &[(MenuId, TrayCommand)], id: &MenuId) -> Option<TrayCommand> {
    ids.iter()
        .find(|(item, _)| item == id)
        .map(|(_, command)| *command)
}

fn build_tray_icon(menu: &Menu) -> Result<TrayIcon, TrayError> {
    let rgba = ICON_COLOR.repeat((ICON_SIZE * ICON_SIZE) as usize);
    let icon = Icon::from_rgba(rgba, ICON_SIZE, ICON_SIZE)
        .map_err(|e| TrayError::Unavailable(e.to_string()))?;

    TrayIconBuilder::new()
        .with_menu(Box::new(menu.clone()))
        .with_tooltip(TOOLTIP)
        .with_icon(icon)
        .build()
        .map_err(|e| TrayError::Unavailable(e.to_string()))
}

fn run_tray_loop(events: UnboundedSender<UiEvent>, ready: Ready) {
    let mut builder = EventLoopBuilder::<TrayRequest>::with_user_event();
    #[cfg(target_os = "windows")]
    {
        use tao::platform::windows::EventLoopBuilderExtWindows;
        builder.with_any_thread(true);
    }
    #[cfg(target_os = "linux")]
    {
        use tao::platform::unix::EventLoopBuilderExtUnix;
        builder.with_any_thread(true);
    }
    let event_loop = builder.build();
    let proxy = event_loop.create_proxy();

    let menu = Menu::new();
    let items: Vec<(MenuItem, TrayCommand)> = TrayCommand::MENU
        .iter()
        .map(|command| (MenuItem::new(command.label(), true, None), *command))
        .collect();
    for (item, _) in &items {
        if let Err(e) = menu.append(item) {
            let _ = ready.send(Err(TrayError::Unavailable(e.to_string())));
            return;
        }
    }

    let ids: Vec<(MenuId, TrayCommand)> = items
        .iter()
        .map(|(item, command)| (item.id().clone(), *command))
        .collect();
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        if let Some(command) = command_for(&ids, &event.id) {
            if events.send(UiEvent::Tray(command)).is_err() {
                tracing::debug!("UI is gone, dropping tray command");
            }
        }
    }));

    let mut ready = Some(ready);
    let mut tray: Option<TrayIcon> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::NewEvents(StartCause::Init) => {
                let Some(ready) = ready.take() else {
                    return;
                };
                // On failure the idle loop stays behind; nothing reaches it
                match build_tray_icon(&menu) {
                    Ok(icon) => {
                        tray = Some(icon);
                        let _ = ready.send(Ok(proxy.clone()));
                    }
                    Err(e) => {
                        let _ = ready.send(Err(e));
                    }
                }
            }
            Event::UserEvent(request) => {
                if let Some(tray) = &tray {
                    if let Err(e) = tray.set_visible(request == TrayRequest::Show) {
                        tracing::warn!("Failed to update tray icon: {}", e);
                    }
                }
            }
            _ => {}
        }
    });
}
