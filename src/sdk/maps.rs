use crate::Result;
use std::sync::Arc;
use url::Url;

const MAPS_APP_BASE: &str = "comgooglemaps://";
const MAPS_WEB_SEARCH: &str = "https://www.google.com/maps/search/";
pub const DEFAULT_MAP_ZOOM: u8 = 14;

/// Opens URIs in native applications.
pub trait MapLauncher: Send + Sync {
    /// Whether an installed application handles this URI.
    fn can_open(&self, uri: &Url) -> bool;
    fn open(&self, uri: &Url);
}

#[derive(Clone)]
pub struct MapOpener {
    launcher: Arc<dyn MapLauncher>,
    zoom: u8,
}

impl MapOpener {
    #[must_use]
    pub fn new(launcher: Arc<dyn MapLauncher>, zoom: u8) -> Self {
        Self { launcher, zoom }
    }

    /// Show `address` in the maps app, or in the browser when the app is missing.
    pub fn open_address(&self, address: &str) {
        let deep_link = match app_uri(address, self.zoom) {
            Ok(uri) => uri,
            Err(err) => {
                tracing::warn!("could not build maps deep link: {err}");
                return;
            }
        };
        tracing::debug!("maps deep link {deep_link}");
        if self.launcher.can_open(&deep_link) {
            self.launcher.open(&deep_link);
            return;
        }

        match web_uri(address) {
            Ok(uri) => {
                tracing::info!("maps app not installed, opening {uri}");
                self.launcher.open(&uri);
            }
            Err(err) => tracing::warn!("could not build maps web link: {err}"),
        }
    }
}

/// Deep link into the maps application, searching for `address`.
///
/// # Errors
/// Returns an error if the URI cannot be built.
#[allow(clippy::result_large_err)]
pub fn app_uri(address: &str, zoom: u8) -> Result<Url> {
    let mut url = Url::parse(MAPS_APP_BASE)?;
    url.query_pairs_mut()
        .append_pair("q", address)
        .append_pair("zoom", &zoom.to_string());
    Ok(url)
}

/// Browser map search for `address`.
///
/// # Errors
/// Returns an error if the URI cannot be built.
#[allow(clippy::result_large_err)]
pub fn web_uri(address: &str) -> Result<Url> {
    let mut url = Url::parse(MAPS_WEB_SEARCH)?;
    url.query_pairs_mut()
        .append_pair("api", "1")
        .append_pair("query", address);
    Ok(url)
}
