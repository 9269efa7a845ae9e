//! Data exchanged with the transport and the bot backend.

pub mod events;
pub mod status;
pub mod tools;

pub use events::{Participant, ParticipantTracks, ToolCall, Tracks, Transcript, TransportEvent};
pub use status::TransportState;
pub use tools::{
    LOCATION_FAILURE_SENTINEL, RestaurantLocation, SUCCESS_SENTINEL, SetRestaurantLocationArgs,
    ToolDefinition, ToolFunction,
};
