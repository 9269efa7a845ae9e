//! One-shot location fetches over a callback-driven geolocation service.

use crate::error::LocationError;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tokio::sync::oneshot;

type Reply = oneshot::Sender<Result<Coordinate, LocationError>>;
type Pending = Arc<Mutex<Option<Reply>>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedAlways,
    AuthorizedWhenInUse,
}

impl AuthorizationStatus {
    #[must_use]
    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::AuthorizedAlways | Self::AuthorizedWhenInUse)
    }
}

/// Platform geolocation. Results of `request_location` are reported later through
/// the supplied delegate, from any thread.
pub trait LocationService: Send + Sync {
    fn request_permission(&self);
    fn authorization_status(&self) -> AuthorizationStatus;
    fn request_location(&self, delegate: LocationDelegate);
}

/// Callback handle given to the platform for one request. Callbacks after the
/// first answer are ignored; dropping every clone unanswered cancels the fetch.
#[derive(Clone)]
pub struct LocationDelegate {
    pending: Pending,
}

impl LocationDelegate {
    /// Report a batch of locations. Only the last one is used; an empty batch is ignored.
    pub fn did_update_locations(&self, locations: &[Coordinate]) {
        let Some(last) = locations.last() else {
            return;
        };
        self.resolve(Ok(*last));
    }

    pub fn did_fail(&self, error: impl Into<String>) {
        self.resolve(Err(LocationError::Platform(error.into())));
    }

    fn resolve(&self, result: Result<Coordinate, LocationError>) {
        let reply = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match reply {
            Some(tx) => {
                let _ = tx.send(result);
            }
            None => tracing::debug!("location callback for an already answered request"),
        }
    }
}

pub struct LocationBridge {
    service: Arc<dyn LocationService>,
    current: Mutex<Weak<Mutex<Option<Reply>>>>,
}

impl LocationBridge {
    #[must_use]
    pub fn new(service: Arc<dyn LocationService>) -> Self {
        Self {
            service,
            current: Mutex::new(Weak::new()),
        }
    }

    pub fn request_permission(&self) {
        self.service.request_permission();
    }

    /// Fetch the current device location.
    ///
    /// Waits for the platform to call back; there is no timeout.
    ///
    /// # Errors
    /// `PermissionDenied` without touching the platform when location access is not
    /// authorized, `AlreadyPending` while another fetch is outstanding, `Cancelled`
    /// when the platform drops the delegate without answering, or whatever the
    /// platform reports.
    pub async fn fetch_location(&self) -> Result<Coordinate, LocationError> {
        if !self.service.authorization_status().is_authorized() {
            return Err(LocationError::PermissionDenied);
        }

        let (tx, rx) = oneshot::channel();
        let pending = Arc::new(Mutex::new(Some(tx)));
        {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            // A reply whose receiver is gone belongs to an abandoned fetch.
            let outstanding = current.upgrade().is_some_and(|reply| {
                reply
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .as_ref()
                    .is_some_and(|tx| !tx.is_closed())
            });
            if outstanding {
                return Err(LocationError::AlreadyPending);
            }
            *current = Arc::downgrade(&pending);
        }

        self.service.request_location(LocationDelegate { pending });

        rx.await.map_err(|_| LocationError::Cancelled)?
    }
}
