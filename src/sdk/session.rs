use super::events::{self, EventStream, SessionEvent};
use super::settings::{self, Settings, SettingsStore};
use super::state::SessionState;
use super::timer::{Clock, CountdownTimer};
use super::tools::ToolDispatcher;
use super::transport::{EventSink, Transport, TransportConfig, TransportFactory};
use crate::protocol::TransportEvent;
use crate::{Error, Result};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

pub const DEFAULT_ERROR_DISPLAY: Duration = Duration::from_secs(5);
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

const MISSING_BACKEND_URL: &str =
    "Need to fill the backendURL. For more info visit: https://bots.daily.co";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// How long an error message stays visible.
    pub error_display: Duration,
    /// Countdown decrement period.
    pub tick_interval: Duration,
    pub map_zoom: u8,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            error_display: DEFAULT_ERROR_DISPLAY,
            tick_interval: DEFAULT_TICK_INTERVAL,
            map_zoom: super::maps::DEFAULT_MAP_ZOOM,
        }
    }
}

/// Cloneable handle for driving a session from UI code.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::Sender<Command>,
    state_rx: watch::Receiver<SessionState>,
}

/// A running voice session controller and the receiving end of its events.
pub struct Session {
    handle: SessionHandle,
    event_rx: mpsc::Receiver<SessionEvent>,
}

impl Session {
    #[must_use]
    pub fn builder() -> super::SessionBuilder {
        super::SessionBuilder::new()
    }

    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Connect to the bot backend at `backend_url`.
    ///
    /// Returns once the transport has been created and asked to start; the outcome
    /// of the start itself shows up in the session state.
    ///
    /// # Errors
    /// Returns `Error::Config` for a blank URL, or the transport factory's error.
    pub async fn connect(&self, backend_url: &str) -> Result<()> {
        self.handle.connect(backend_url).await
    }

    /// # Errors
    /// Returns an error if the controller has shut down.
    pub async fn disconnect(&self) -> Result<()> {
        self.handle.disconnect().await
    }

    /// # Errors
    /// Returns an error if the controller has shut down.
    pub async fn toggle_mic(&self) -> Result<()> {
        self.handle.toggle_mic().await
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.handle.state()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.handle.subscribe()
    }

    /// Await the next session event. `None` once the controller has stopped.
    ///
    /// # Errors
    /// Currently infallible; kept fallible for parity with the command methods.
    pub async fn next_event(&mut self) -> Result<Option<SessionEvent>> {
        Ok(self.event_rx.recv().await)
    }

    /// Stream session events.
    #[must_use]
    pub fn events(&mut self) -> EventStream<'_> {
        EventStream::new(&mut self.event_rx)
    }

    pub(super) fn spawn(parts: SessionParts) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(64);
        let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(128);
        let (sink_tx, sink_rx) = mpsc::unbounded_channel::<(u64, TransportEvent)>();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel::<Internal>();
        let (state_tx, state_rx) = watch::channel(SessionState::default());

        let controller = Controller {
            state: SessionState::default(),
            state_tx,
            event_tx,
            sink_tx,
            internal_tx,
            transport: None,
            generation: 0,
            issued: 0,
            countdown: CountdownTimer::default(),
            factory: parts.factory,
            settings: parts.settings,
            tools: parts.tools,
            clock: parts.clock,
            options: parts.options,
        };
        tokio::spawn(controller.run(cmd_rx, sink_rx, internal_rx));

        Self {
            handle: SessionHandle {
                sender: cmd_tx,
                state_rx,
            },
            event_rx,
        }
    }
}

impl SessionHandle {
    /// See [`Session::connect`].
    ///
    /// # Errors
    /// Returns `Error::Config` for a blank URL, or the transport factory's error.
    pub async fn connect(&self, backend_url: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Connect {
            backend_url: backend_url.to_string(),
            respond: tx,
        })
        .await?;
        rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Ask the transport to tear down. State changes follow from its callbacks.
    ///
    /// # Errors
    /// Returns an error if the controller has shut down.
    pub async fn disconnect(&self) -> Result<()> {
        self.send(Command::Disconnect).await
    }

    /// Flip the microphone. The new value is read back from the transport once it
    /// accepts the change.
    ///
    /// # Errors
    /// Returns an error if the controller has shut down.
    pub async fn toggle_mic(&self) -> Result<()> {
        self.send(Command::ToggleMic).await
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| Error::ConnectionClosed)
    }
}

pub(super) struct SessionParts {
    pub factory: Arc<dyn TransportFactory>,
    pub settings: Arc<dyn SettingsStore>,
    pub tools: ToolDispatcher,
    pub clock: Arc<dyn Clock>,
    pub options: SessionOptions,
}

enum Command {
    Connect {
        backend_url: String,
        respond: oneshot::Sender<Result<()>>,
    },
    Disconnect,
    ToggleMic,
}

/// Completions of work the controller spawned.
enum Internal {
    Started {
        generation: u64,
        backend_url: String,
        result: Result<()>,
    },
    MicToggled {
        generation: u64,
        result: Result<()>,
    },
    Tick {
        generation: u64,
    },
    ClearError,
}

/// Sole owner of `SessionState`; every mutation happens on its task.
struct Controller {
    state: SessionState,
    state_tx: watch::Sender<SessionState>,
    event_tx: mpsc::Sender<SessionEvent>,
    sink_tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
    internal_tx: mpsc::UnboundedSender<Internal>,
    transport: Option<Arc<dyn Transport>>,
    /// Bumped per created transport so events and completions from a replaced one
    /// are ignored.
    generation: u64,
    /// Last generation handed to a sink, including sinks of failed creations.
    issued: u64,
    countdown: CountdownTimer,
    factory: Arc<dyn TransportFactory>,
    settings: Arc<dyn SettingsStore>,
    tools: ToolDispatcher,
    clock: Arc<dyn Clock>,
    options: SessionOptions,
}

impl Controller {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::Receiver<Command>,
        mut sink_rx: mpsc::UnboundedReceiver<(u64, TransportEvent)>,
        mut internal_rx: mpsc::UnboundedReceiver<Internal>,
    ) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => break,
                    }
                }
                Some((generation, event)) = sink_rx.recv() => {
                    if generation == self.generation {
                        self.handle_transport_event(event);
                    } else {
                        tracing::debug!("ignoring {} from a replaced transport", event.name());
                    }
                }
                Some(msg) = internal_rx.recv() => self.handle_internal(msg).await,
            }
        }
        self.countdown.stop();
        tracing::debug!("session controller stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Connect {
                backend_url,
                respond,
            } => {
                let result = self.connect(&backend_url).await;
                let _ = respond.send(result);
            }
            Command::Disconnect => self.disconnect(),
            Command::ToggleMic => self.toggle_mic(),
        }
    }

    async fn connect(&mut self, backend_url: &str) -> Result<()> {
        let base_url = backend_url.trim();
        if base_url.is_empty() {
            let err = Error::Config(MISSING_BACKEND_URL.to_string());
            self.show_error(err.to_string());
            return Err(err);
        }

        let settings = match self.settings.load().await {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!("failed to load settings, using defaults: {err}");
                Settings::default()
            }
        };

        let config = TransportConfig::new(base_url, settings.enable_mic);
        self.issued += 1;
        let generation = self.issued;
        let sink = EventSink::new(self.sink_tx.clone(), generation);
        let transport = match self.factory.create(config, sink) {
            Ok(transport) => transport,
            Err(err) => {
                self.show_error(err.to_string());
                return Err(err);
            }
        };

        self.generation = generation;
        if let Some(replaced) = self.transport.replace(Arc::clone(&transport)) {
            tracing::warn!("replacing an existing transport");
            // Its own Disconnected callback is filtered out from here on.
            self.countdown.stop();
            self.state.timer_count = 0;
            self.state.is_bot_ready = false;
            self.publish_state();
            tokio::spawn(async move {
                if let Err(err) = replaced.disconnect().await {
                    tracing::warn!("replaced transport disconnect failed: {err}");
                }
            });
        }
        tracing::info!("starting transport for {base_url}");

        let internal = self.internal_tx.clone();
        let starter = Arc::clone(&transport);
        let backend_url = base_url.to_string();
        tokio::spawn(async move {
            let result = starter.start().await;
            let _ = internal.send(Internal::Started {
                generation,
                backend_url,
                result,
            });
        });

        if let Some(mic_id) = settings.selected_mic {
            tokio::spawn(async move {
                if let Err(err) = transport.update_mic(mic_id.clone()).await {
                    tracing::warn!("failed to select microphone {mic_id}: {err}");
                }
            });
        }
        Ok(())
    }

    fn disconnect(&self) {
        let Some(transport) = self.transport.clone() else {
            tracing::debug!("disconnect requested without a transport");
            return;
        };
        tokio::spawn(async move {
            if let Err(err) = transport.disconnect().await {
                tracing::warn!("transport disconnect failed: {err}");
            }
        });
    }

    fn toggle_mic(&self) {
        let Some(transport) = self.transport.clone() else {
            tracing::debug!("mic toggle requested without a transport");
            return;
        };
        let enable = !self.state.is_mic_enabled;
        let generation = self.generation;
        let internal = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = transport.set_mic_enabled(enable).await;
            let _ = internal.send(Internal::MicToggled { generation, result });
        });
    }

    async fn handle_internal(&mut self, msg: Internal) {
        match msg {
            Internal::Started {
                generation,
                backend_url,
                result,
            } => {
                if generation != self.generation {
                    tracing::debug!("ignoring start result of a replaced transport");
                    return;
                }
                match result {
                    Ok(()) => {
                        tracing::info!("transport started");
                        let saved = settings::update_settings(self.settings.as_ref(), |s| {
                            s.backend_url = backend_url;
                        })
                        .await;
                        if let Err(err) = saved {
                            tracing::warn!("failed to save backend URL: {err}");
                        }
                    }
                    Err(err) => {
                        tracing::warn!("transport failed to start: {err}");
                        self.transport = None;
                        self.show_error(Error::TransportStart(err.to_string()).to_string());
                    }
                }
            }
            Internal::MicToggled { generation, result } => {
                if generation != self.generation {
                    return;
                }
                match result {
                    Ok(()) => {
                        if let Some(transport) = &self.transport {
                            self.state.is_mic_enabled = transport.is_mic_enabled();
                        }
                    }
                    Err(err) => self.show_error(Error::MicToggle(err.to_string()).to_string()),
                }
            }
            Internal::Tick { generation } => {
                if self.countdown.is_current(generation) {
                    self.state.timer_count -= 1;
                }
            }
            Internal::ClearError => {
                // Clears whatever is shown, including a newer message.
                self.state.error_message = None;
            }
        }
        self.publish_state();
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        tracing::debug!("received event: {} {:?}", event.name(), event);
        match event {
            TransportEvent::StatusChanged(status) => {
                self.state.status = status;
            }
            TransportEvent::BotReady { expires_at } => {
                self.state.is_bot_ready = true;
                let expiry =
                    expires_at.or_else(|| self.transport.as_ref().and_then(|t| t.expiry()));
                match expiry {
                    Some(expiry) => self.start_countdown(expiry),
                    None => tracing::warn!("bot ready without a session expiry"),
                }
            }
            TransportEvent::Connected => {
                self.state.is_mic_enabled =
                    self.transport.as_ref().is_some_and(|t| t.is_mic_enabled());
            }
            TransportEvent::Disconnected => {
                self.countdown.stop();
                self.state.timer_count = 0;
                self.state.is_bot_ready = false;
            }
            TransportEvent::RemoteAudioLevel { level, .. } => {
                self.state.remote_audio_level = level;
            }
            TransportEvent::UserAudioLevel(level) => {
                self.state.local_audio_level = level;
            }
            TransportEvent::UserTranscript(transcript) => {
                if transcript.is_final() {
                    events::publish(
                        &self.event_tx,
                        SessionEvent::UserTranscript {
                            text: transcript.text,
                        },
                    );
                }
            }
            TransportEvent::BotTranscript(text) => {
                events::publish(&self.event_tx, SessionEvent::BotTranscript { text });
            }
            TransportEvent::ToolCall { call, respond } => {
                let tools = self.tools.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = tools.dispatch(&call).await;
                    if respond.send(result.clone()).is_err() {
                        tracing::debug!("result of {} was not awaited", call.name);
                    }
                    events::publish(
                        &event_tx,
                        SessionEvent::ToolCallResolved {
                            name: call.name,
                            result,
                        },
                    );
                });
            }
            TransportEvent::Error(message) => {
                tracing::warn!("transport error: {message}");
                self.show_error(message);
            }
            TransportEvent::TracksUpdated(tracks) => {
                events::publish(&self.event_tx, SessionEvent::TracksUpdated { tracks });
            }
        }
        self.publish_state();
    }

    /// Replaces any running ticker.
    fn start_countdown(&mut self, expires_at: i64) {
        if self.countdown.is_running() {
            tracing::debug!("restarting session countdown");
        }
        self.state.timer_count = expires_at - self.clock.now_unix();
        let internal = self.internal_tx.clone();
        self.countdown.start(self.options.tick_interval, move |generation| {
            let _ = internal.send(Internal::Tick { generation });
        });
    }

    fn show_error(&mut self, message: String) {
        self.state.error_message = Some(message);
        self.publish_state();
        let internal = self.internal_tx.clone();
        let delay = self.options.error_display;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = internal.send(Internal::ClearError);
        });
    }

    fn publish_state(&self) {
        self.state_tx.send_if_modified(|current| {
            if *current == self.state {
                false
            } else {
                current.clone_from(&self.state);
                true
            }
        });
    }
}
