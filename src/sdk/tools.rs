use super::location::{Coordinate, LocationBridge};
use super::maps::MapOpener;
use crate::protocol::{
    LOCATION_FAILURE_SENTINEL, RestaurantLocation, SUCCESS_SENTINEL, ToolCall, ToolFunction,
};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Resolves bot tool calls against device capabilities.
#[derive(Clone)]
pub struct ToolDispatcher {
    location: Arc<LocationBridge>,
    maps: MapOpener,
}

impl ToolDispatcher {
    #[must_use]
    pub const fn new(location: Arc<LocationBridge>, maps: MapOpener) -> Self {
        Self { location, maps }
    }

    /// Produce the result for one tool call. Never fails: unknown functions yield an
    /// empty object and device failures are reported as sentinel strings.
    pub async fn dispatch(&self, call: &ToolCall) -> Value {
        tracing::debug!("tool call {}", call.name);
        let Ok(function) = call.name.parse::<ToolFunction>() else {
            tracing::warn!("invalid function received {}", call.name);
            return Value::Object(Map::new());
        };

        match function {
            ToolFunction::GetMyCurrentLocation => self.current_location().await,
            ToolFunction::SetRestaurantLocation => {
                tracing::debug!("restaurant location: {}", call.arguments);
                self.show_restaurant(&call.arguments);
                // The bot is told "success" whether or not the map could be shown.
                Value::String(SUCCESS_SENTINEL.to_string())
            }
        }
    }

    async fn current_location(&self) -> Value {
        match self.location.fetch_location().await {
            Ok(coordinate) => {
                tracing::debug!(
                    "location: {}, {}",
                    coordinate.latitude,
                    coordinate.longitude
                );
                location_value(coordinate)
            }
            Err(err) => {
                tracing::warn!("failed to get current location: {err}");
                Value::String(LOCATION_FAILURE_SENTINEL.to_string())
            }
        }
    }

    fn show_restaurant(&self, args: &Value) {
        match RestaurantLocation::from_args(args) {
            Ok(restaurant) => {
                tracing::info!(
                    "restaurant: {}, longitude: {}, latitude: {}, address: {}",
                    restaurant.name,
                    restaurant.longitude,
                    restaurant.latitude,
                    restaurant.address
                );
                // Coordinates from the bot often disagree with the address; search by address.
                self.maps.open_address(&restaurant.address);
            }
            Err(err) => {
                tracing::warn!("restaurant location incomplete, not opening maps: {err}");
            }
        }
    }
}

fn location_value(coordinate: Coordinate) -> Value {
    let mut map = Map::new();
    map.insert("lat".to_string(), Value::String(coordinate.latitude.to_string()));
    map.insert("lon".to_string(), Value::String(coordinate.longitude.to_string()));
    Value::Object(map)
}
