#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

//! Client-side session control for a realtime voice travel companion.
//!
//! The voice transport, the platform geolocation service and the map launcher are
//! supplied by the application through traits; this crate mirrors transport
//! callbacks into [`SessionState`] and answers the bot's tool calls.

pub mod error;
pub mod protocol;
pub mod sdk;

pub use error::{Error, LocationError, Result};
pub use protocol::{
    LOCATION_FAILURE_SENTINEL, Participant, RestaurantLocation, SUCCESS_SENTINEL, ToolCall,
    ToolDefinition, ToolFunction, Tracks, Transcript, TransportEvent, TransportState,
};
pub use sdk::{
    AuthorizationStatus, Clock, Coordinate, EventSink, EventStream, FileSettingsStore,
    LocationBridge, LocationDelegate, LocationService, MapLauncher, MapOpener,
    MemorySettingsStore, Session, SessionBuilder, SessionEvent, SessionHandle, SessionOptions,
    SessionState, Settings, SettingsStore, SystemClock, ToolDispatcher, Transport,
    TransportConfig, TransportFactory,
};
