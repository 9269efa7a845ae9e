//! Session controller and the device bridges it drives.
//!
//! A [`Session`] owns the call state and reacts to transport callbacks; tool calls
//! from the bot are answered through the [`LocationBridge`] and [`MapOpener`].

mod builder;
pub mod events;
pub mod location;
pub mod maps;
mod session;
pub mod settings;
mod state;
mod timer;
mod tools;
mod transport;

pub use builder::SessionBuilder;
pub use events::{EventStream, SessionEvent};
pub use location::{
    AuthorizationStatus, Coordinate, LocationBridge, LocationDelegate, LocationService,
};
pub use maps::{MapLauncher, MapOpener};
pub use session::{Session, SessionHandle, SessionOptions};
pub use settings::{FileSettingsStore, MemorySettingsStore, Settings, SettingsStore};
pub use state::SessionState;
pub use timer::{Clock, SystemClock};
pub use tools::ToolDispatcher;
pub use transport::{BoxFuture, EventSink, Transport, TransportConfig, TransportFactory};
