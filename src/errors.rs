use crate::FieldKey;
use thiserror::Error;

/// Failure taxonomy for widget actions. Every variant is caught at the
/// user-initiated action and turned into a transient notice; nothing crashes
/// the widget loop or leaves timers and subscriptions dangling.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// Missing or unusable configuration, fatal to initialization.
    #[error("configuration error: {0}")]
    Config(String),

    /// The map provider could not be initialized, fatal.
    #[error("map provider failed to load: {0}")]
    Load(String),

    /// Required user input is missing, aborts the build.
    #[error("{0}")]
    Input(String),

    /// Geocoding failed for one of the address fields. The action is
    /// aborted with state unchanged; the build path will retry later.
    #[error("could not resolve {field} address")]
    Resolution {
        field: FieldKey,
        #[source]
        source: anyhow::Error,
    },

    /// The routing provider rejected or failed the build. The previous
    /// route, if any, stays on the map.
    #[error("route build failed")]
    Route(#[source] anyhow::Error),

    /// Static overlay data could not be fetched or parsed. Never shown to
    /// the user; the overlay degrades to a no-op.
    #[error("overlay data unavailable")]
    OverlayLoad(#[source] anyhow::Error),
}
