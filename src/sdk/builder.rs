use super::location::{LocationBridge, LocationService};
use super::maps::{MapLauncher, MapOpener};
use super::session::{Session, SessionOptions, SessionParts};
use super::settings::{MemorySettingsStore, SettingsStore};
use super::timer::{Clock, SystemClock};
use super::tools::ToolDispatcher;
use super::transport::TransportFactory;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

pub struct SessionBuilder {
    transport: Option<Arc<dyn TransportFactory>>,
    location: Option<Arc<dyn LocationService>>,
    maps: Option<Arc<dyn MapLauncher>>,
    settings: Option<Arc<dyn SettingsStore>>,
    clock: Arc<dyn Clock>,
    options: SessionOptions,
}

impl SessionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            transport: None,
            location: None,
            maps: None,
            settings: None,
            clock: Arc::new(SystemClock),
            options: SessionOptions::default(),
        }
    }

    #[must_use]
    pub fn transport(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.transport = Some(factory);
        self
    }

    #[must_use]
    pub fn location_service(mut self, service: Arc<dyn LocationService>) -> Self {
        self.location = Some(service);
        self
    }

    #[must_use]
    pub fn map_launcher(mut self, launcher: Arc<dyn MapLauncher>) -> Self {
        self.maps = Some(launcher);
        self
    }

    /// Defaults to an in-memory store.
    #[must_use]
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(store);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn error_display(mut self, duration: Duration) -> Self {
        self.options.error_display = duration;
        self
    }

    #[must_use]
    pub const fn tick_interval(mut self, interval: Duration) -> Self {
        self.options.tick_interval = interval;
        self
    }

    #[must_use]
    pub const fn map_zoom(mut self, zoom: u8) -> Self {
        self.options.map_zoom = zoom;
        self
    }

    /// Start the session controller and request location permission.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the transport, location service or map launcher is missing.
    #[allow(clippy::result_large_err)]
    pub fn spawn(self) -> Result<Session> {
        let factory = self
            .transport
            .ok_or_else(|| Error::Config("transport factory required".to_string()))?;
        let location = self
            .location
            .ok_or_else(|| Error::Config("location service required".to_string()))?;
        let launcher = self
            .maps
            .ok_or_else(|| Error::Config("map launcher required".to_string()))?;
        let settings = self
            .settings
            .unwrap_or_else(|| Arc::new(MemorySettingsStore::default()));

        let bridge = Arc::new(LocationBridge::new(location));
        bridge.request_permission();
        let tools = ToolDispatcher::new(bridge, MapOpener::new(launcher, self.options.map_zoom));

        Ok(Session::spawn(SessionParts {
            factory,
            settings,
            tools,
            clock: self.clock,
            options: self.options,
        }))
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
