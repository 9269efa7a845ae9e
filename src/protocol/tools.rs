use crate::{Error, Result};
use schemars::JsonSchema;
use schemars::schema::RootSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Result returned to the bot whenever `set_restaurant_location` is handled.
pub const SUCCESS_SENTINEL: &str = "success";
/// Result returned to the bot when the device location cannot be read.
pub const LOCATION_FAILURE_SENTINEL: &str = "Failed to get current location!";

/// Functions the bot may invoke on the device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolFunction {
    GetMyCurrentLocation,
    SetRestaurantLocation,
}

impl ToolFunction {
    pub const ALL: [Self; 2] = [Self::GetMyCurrentLocation, Self::SetRestaurantLocation];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetMyCurrentLocation => "get_my_current_location",
            Self::SetRestaurantLocation => "set_restaurant_location",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::GetMyCurrentLocation => "Retrieves the user current location",
            Self::SetRestaurantLocation => {
                "Shows the selected restaurant in the map application on the user device"
            }
        }
    }

    #[must_use]
    pub fn definition(self) -> ToolDefinition {
        let schema = match self {
            Self::GetMyCurrentLocation => schemars::schema_for!(GetMyCurrentLocationArgs),
            Self::SetRestaurantLocation => schemars::schema_for!(SetRestaurantLocationArgs),
        };
        ToolDefinition {
            name: self.name().to_string(),
            description: Some(self.description().to_string()),
            schema,
        }
    }

    /// Definitions for every supported function, in declaration order.
    #[must_use]
    pub fn definitions() -> Vec<ToolDefinition> {
        Self::ALL.iter().map(|f| f.definition()).collect()
    }
}

impl FromStr for ToolFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| Error::ToolCall(format!("unknown function: {s}")))
    }
}

impl fmt::Display for ToolFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetMyCurrentLocationArgs {}

/// Arguments the bot sends with `set_restaurant_location`. Every field is a string,
/// coordinates included.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetRestaurantLocationArgs {
    /// Restaurant name.
    pub restaurant: String,
    /// Latitude as a decimal string.
    pub lat: String,
    /// Longitude as a decimal string.
    pub lon: String,
    /// Full street address, used for the map search.
    pub address: String,
}

#[derive(Clone, Debug)]
pub struct ToolDefinition {
    pub name: String,
    pub description: Option<String>,
    pub schema: RootSchema,
}

impl ToolDefinition {
    /// Whether the function takes any parameters at all.
    #[must_use]
    pub fn has_parameters(&self) -> bool {
        self.schema
            .schema
            .object
            .as_ref()
            .is_some_and(|obj| !obj.properties.is_empty())
    }

    /// Render the function declaration registered with the bot backend.
    /// Parameterless functions declare `parameters: null`.
    ///
    /// # Errors
    /// Returns an error if schema serialization fails.
    #[allow(clippy::result_large_err)]
    pub fn declaration(&self) -> Result<Value> {
        let parameters = if self.has_parameters() {
            serde_json::to_value(&self.schema)?
        } else {
            Value::Null
        };
        let mut decl = Map::new();
        decl.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(description) = &self.description {
            decl.insert("description".to_string(), Value::String(description.clone()));
        }
        decl.insert("parameters".to_string(), parameters);
        Ok(Value::Object(decl))
    }
}

/// A restaurant picked by the bot, validated from untyped tool arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl RestaurantLocation {
    /// Extract a restaurant from tool arguments.
    ///
    /// Fields must be strings; anything else counts as missing. `restaurant`, `lat`
    /// and `lon` are required and the coordinates must parse as numbers. A missing
    /// `address` becomes an empty string.
    ///
    /// # Errors
    /// Returns `Error::ToolCall` naming the first missing or invalid field.
    #[allow(clippy::result_large_err)]
    pub fn from_args(args: &Value) -> Result<Self> {
        let fields = args.as_object();
        let field = |key: &str| fields.and_then(|map| map.get(key)).and_then(Value::as_str);
        let coordinate = |key: &str| field(key).and_then(|raw| raw.trim().parse::<f64>().ok());

        let name = field("restaurant")
            .ok_or_else(|| Error::ToolCall("missing field `restaurant`".to_string()))?;
        let longitude = coordinate("lon")
            .ok_or_else(|| Error::ToolCall("missing or non-numeric field `lon`".to_string()))?;
        let latitude = coordinate("lat")
            .ok_or_else(|| Error::ToolCall("missing or non-numeric field `lat`".to_string()))?;

        Ok(Self {
            name: name.to_string(),
            latitude,
            longitude,
            address: field("address").unwrap_or_default().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_function_names() {
        assert_eq!(
            "get_my_current_location".parse::<ToolFunction>().unwrap(),
            ToolFunction::GetMyCurrentLocation
        );
        assert_eq!(
            "set_restaurant_location".parse::<ToolFunction>().unwrap(),
            ToolFunction::SetRestaurantLocation
        );
        assert!("Get_My_Current_Location".parse::<ToolFunction>().is_err());
    }

    #[test]
    fn restaurant_requires_numeric_coordinates() {
        let ok = json!({"restaurant": "X", "lat": "1.5", "lon": "-2", "address": "1 Main St"});
        let parsed = RestaurantLocation::from_args(&ok).unwrap();
        assert_eq!(parsed.name, "X");
        assert!((parsed.latitude - 1.5).abs() < f64::EPSILON);
        assert!((parsed.longitude + 2.0).abs() < f64::EPSILON);
        assert_eq!(parsed.address, "1 Main St");

        let bad_lat = json!({"restaurant": "X", "lat": "north", "lon": "2"});
        assert!(RestaurantLocation::from_args(&bad_lat).is_err());

        let numeric_lat = json!({"restaurant": "X", "lat": 1.0, "lon": "2"});
        assert!(RestaurantLocation::from_args(&numeric_lat).is_err());
    }

    #[test]
    fn restaurant_address_is_optional() {
        let args = json!({"restaurant": "X", "lat": "1", "lon": "2"});
        let parsed = RestaurantLocation::from_args(&args).unwrap();
        assert_eq!(parsed.address, "");
    }

    #[test]
    fn declarations_match_backend_shape() {
        let defs = ToolFunction::definitions();
        assert_eq!(defs.len(), 2);

        let location = defs[0].declaration().unwrap();
        assert_eq!(location["name"], "get_my_current_location");
        assert_eq!(location["description"], "Retrieves the user current location");
        assert!(location["parameters"].is_null());

        let restaurant = defs[1].declaration().unwrap();
        let props = &restaurant["parameters"]["properties"];
        for key in ["restaurant", "lat", "lon", "address"] {
            assert!(props.get(key).is_some(), "missing {key}");
        }
    }
}
