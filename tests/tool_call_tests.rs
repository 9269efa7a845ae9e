use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use travel_companion::sdk::BoxFuture;
use travel_companion::sdk::maps::DEFAULT_MAP_ZOOM;
use travel_companion::{
    AuthorizationStatus, Coordinate, EventSink, LOCATION_FAILURE_SENTINEL, LocationBridge,
    LocationDelegate, LocationService, MapLauncher, MapOpener, SUCCESS_SENTINEL, Session,
    SessionEvent, ToolCall, ToolDispatcher, Transport, TransportConfig, TransportFactory,
};
use url::Url;

enum Fix {
    Denied,
    At(Coordinate),
    Fails(&'static str),
}

struct ScriptedLocation {
    fix: Fix,
    requests: AtomicUsize,
}

impl ScriptedLocation {
    fn new(fix: Fix) -> Arc<Self> {
        Arc::new(Self {
            fix,
            requests: AtomicUsize::new(0),
        })
    }
}

impl LocationService for ScriptedLocation {
    fn request_permission(&self) {}

    fn authorization_status(&self) -> AuthorizationStatus {
        match self.fix {
            Fix::Denied => AuthorizationStatus::Denied,
            _ => AuthorizationStatus::AuthorizedWhenInUse,
        }
    }

    fn request_location(&self, delegate: LocationDelegate) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match &self.fix {
            Fix::Denied => {}
            Fix::At(coordinate) => delegate.did_update_locations(&[*coordinate]),
            Fix::Fails(reason) => delegate.did_fail(*reason),
        }
    }
}

#[derive(Default)]
struct RecordingLauncher {
    installed: bool,
    attempts: Mutex<Vec<Url>>,
    opened: Mutex<Vec<Url>>,
}

impl RecordingLauncher {
    fn attempted_queries(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter_map(|url| {
                url.query_pairs()
                    .find(|(k, _)| k == "q")
                    .map(|(_, v)| v.into_owned())
            })
            .collect()
    }
}

impl MapLauncher for RecordingLauncher {
    fn can_open(&self, uri: &Url) -> bool {
        self.attempts.lock().unwrap().push(uri.clone());
        self.installed
    }

    fn open(&self, uri: &Url) {
        self.opened.lock().unwrap().push(uri.clone());
    }
}

fn dispatcher(fix: Fix, launcher: &Arc<RecordingLauncher>) -> ToolDispatcher {
    let bridge = Arc::new(LocationBridge::new(ScriptedLocation::new(fix)));
    ToolDispatcher::new(bridge, MapOpener::new(launcher.clone(), DEFAULT_MAP_ZOOM))
}

fn restaurant_args() -> Value {
    json!({
        "restaurant": "X",
        "lat": "1.0",
        "lon": "2.0",
        "address": "1 Main St"
    })
}

#[tokio::test]
async fn current_location_returns_string_coordinates() {
    let launcher = Arc::new(RecordingLauncher::default());
    let tools = dispatcher(Fix::At(Coordinate::new(-27.501_586, -48.489_71)), &launcher);

    let result = tools
        .dispatch(&ToolCall::new("get_my_current_location", json!({})))
        .await;
    assert_eq!(result, json!({"lat": "-27.501586", "lon": "-48.48971"}));
}

#[tokio::test]
async fn location_failure_becomes_sentinel() {
    let launcher = Arc::new(RecordingLauncher::default());
    let tools = dispatcher(Fix::Fails("kCLErrorDenied"), &launcher);

    let result = tools
        .dispatch(&ToolCall::new("get_my_current_location", json!({})))
        .await;
    assert_eq!(result, Value::String(LOCATION_FAILURE_SENTINEL.to_string()));
}

#[tokio::test]
async fn denied_permission_becomes_sentinel_without_request() {
    let launcher = Arc::new(RecordingLauncher::default());
    let service = ScriptedLocation::new(Fix::Denied);
    let bridge = Arc::new(LocationBridge::new(service.clone()));
    let tools = ToolDispatcher::new(bridge, MapOpener::new(launcher, DEFAULT_MAP_ZOOM));

    let result = tools
        .dispatch(&ToolCall::new("get_my_current_location", Value::Null))
        .await;
    assert_eq!(result, Value::String(LOCATION_FAILURE_SENTINEL.to_string()));
    assert_eq!(service.requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn restaurant_opens_map_by_address() {
    let launcher = Arc::new(RecordingLauncher {
        installed: true,
        ..RecordingLauncher::default()
    });
    let tools = dispatcher(Fix::Denied, &launcher);

    let result = tools
        .dispatch(&ToolCall::new("set_restaurant_location", restaurant_args()))
        .await;
    assert_eq!(result, Value::String(SUCCESS_SENTINEL.to_string()));
    assert_eq!(launcher.attempted_queries(), vec!["1 Main St".to_string()]);

    let opened = launcher.opened.lock().unwrap();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].scheme(), "comgooglemaps");
    assert!(!opened[0].as_str().contains("center"));
}

#[tokio::test]
async fn restaurant_without_maps_app_opens_web_search() {
    let launcher = Arc::new(RecordingLauncher::default());
    let tools = dispatcher(Fix::Denied, &launcher);

    tools
        .dispatch(&ToolCall::new("set_restaurant_location", restaurant_args()))
        .await;

    let opened = launcher.opened.lock().unwrap();
    assert_eq!(opened.len(), 1);
    assert_eq!(opened[0].scheme(), "https");
    let query: Vec<_> = opened[0]
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(query.contains(&("query".to_string(), "1 Main St".to_string())));
}

#[tokio::test]
async fn incomplete_restaurant_still_reports_success() {
    let launcher = Arc::new(RecordingLauncher {
        installed: true,
        ..RecordingLauncher::default()
    });
    let tools = dispatcher(Fix::Denied, &launcher);

    let mut args = restaurant_args();
    args.as_object_mut().unwrap().remove("lat");
    let result = tools
        .dispatch(&ToolCall::new("set_restaurant_location", args))
        .await;
    assert_eq!(result, Value::String(SUCCESS_SENTINEL.to_string()));

    let not_numeric = json!({
        "restaurant": "X",
        "lat": "one",
        "lon": "2.0",
        "address": "1 Main St"
    });
    let result = tools
        .dispatch(&ToolCall::new("set_restaurant_location", not_numeric))
        .await;
    assert_eq!(result, Value::String(SUCCESS_SENTINEL.to_string()));

    let result = tools
        .dispatch(&ToolCall::new("set_restaurant_location", json!("1 Main St")))
        .await;
    assert_eq!(result, Value::String(SUCCESS_SENTINEL.to_string()));

    assert!(launcher.attempts.lock().unwrap().is_empty());
    assert!(launcher.opened.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_function_returns_empty_object() {
    let launcher = Arc::new(RecordingLauncher {
        installed: true,
        ..RecordingLauncher::default()
    });
    let service = ScriptedLocation::new(Fix::At(Coordinate::new(0.0, 0.0)));
    let bridge = Arc::new(LocationBridge::new(service.clone()));
    let tools = ToolDispatcher::new(bridge, MapOpener::new(launcher.clone(), DEFAULT_MAP_ZOOM));

    let result = tools.dispatch(&ToolCall::new("unknown_fn", json!({}))).await;
    assert_eq!(result, json!({}));
    assert_eq!(service.requests.load(Ordering::SeqCst), 0);
    assert!(launcher.attempts.lock().unwrap().is_empty());
}

struct IdleTransport;

impl Transport for IdleTransport {
    fn start(&self) -> BoxFuture<'_, travel_companion::Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn disconnect(&self) -> BoxFuture<'_, travel_companion::Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn set_mic_enabled(&self, _enabled: bool) -> BoxFuture<'_, travel_companion::Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn update_mic(&self, _mic_id: String) -> BoxFuture<'_, travel_companion::Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn is_mic_enabled(&self) -> bool {
        false
    }

    fn expiry(&self) -> Option<i64> {
        None
    }
}

#[derive(Default)]
struct SinkCapture {
    sink: Mutex<Option<EventSink>>,
}

impl TransportFactory for SinkCapture {
    fn create(
        &self,
        _config: TransportConfig,
        events: EventSink,
    ) -> travel_companion::Result<Arc<dyn Transport>> {
        *self.sink.lock().unwrap() = Some(events);
        Ok(Arc::new(IdleTransport))
    }
}

#[tokio::test]
async fn session_answers_tool_calls_from_transport() {
    let capture = Arc::new(SinkCapture::default());
    let launcher = Arc::new(RecordingLauncher {
        installed: true,
        ..RecordingLauncher::default()
    });
    let mut session = Session::builder()
        .transport(capture.clone())
        .location_service(ScriptedLocation::new(Fix::At(Coordinate::new(10.5, 20.25))))
        .map_launcher(launcher.clone())
        .spawn()
        .unwrap();
    session.connect("http://localhost:7860").await.unwrap();
    let sink = capture.sink.lock().unwrap().clone().unwrap();

    let location = sink
        .tool_call(ToolCall::new("get_my_current_location", json!({})))
        .await
        .unwrap();
    assert_eq!(location, json!({"lat": "10.5", "lon": "20.25"}));

    let restaurant = sink
        .tool_call(ToolCall::new("set_restaurant_location", restaurant_args()))
        .await
        .unwrap();
    assert_eq!(restaurant, Value::String(SUCCESS_SENTINEL.to_string()));
    assert_eq!(launcher.attempted_queries(), vec!["1 Main St".to_string()]);

    let unknown = sink
        .tool_call(ToolCall::new("book_table", json!({"party": 2})))
        .await
        .unwrap();
    assert_eq!(unknown, json!({}));

    let first = session.next_event().await.unwrap().unwrap();
    assert_eq!(
        first,
        SessionEvent::ToolCallResolved {
            name: "get_my_current_location".to_string(),
            result: location,
        }
    );
}
