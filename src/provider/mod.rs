pub mod yandex;

use crate::Coord;
use crate::RoutingOptions;
use crate::ui::SuggestionEntry;
use tokio::sync::mpsc::UnboundedSender;

/// South-west and north-east corners of the visible map area, used to bias
/// suggestions towards what the user is currently looking at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub south_west: Coord,
    pub north_east: Coord,
}

#[derive(Clone, Copy, Debug)]
pub struct SuggestOptions {
    pub limit: usize,
    pub bounded_by: Option<BoundingBox>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RouteEventKind {
    /// The provider recalculated the route, typically after a waypoint drag.
    RecomputeSucceeded,
    /// A different alternative became active.
    ActiveRouteChanged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteEvent {
    pub kind: RouteEventKind,
}

/// Opaque handle for one event subscription on a live route. Returned by
/// subscribe and required for unsubscribe; the coordinator drains its
/// handles before a route is discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Summary of one route alternative, already humanized by the provider
/// adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteAlternativeSummary {
    pub human_distance: String,
    pub human_duration: String,
}

/// Live route handle returned by a successful build.
///
/// The upstream SDK exposes alternatives through three different collection
/// shapes (enumerator, indexed get + length, plain array); adapters
/// normalize all of them to ordered `Vec`s so the coordinator never cares.
pub trait ProviderRoute {
    /// Stable identity for overlay add/remove pairing.
    fn id(&self) -> u64;
    /// Alternatives in the order the provider returned them. Stable across
    /// calls until the next recompute.
    fn alternatives(&self) -> Vec<RouteAlternativeSummary>;
    fn active_alternative(&self) -> Option<usize>;
    fn set_active_alternative(&self, index: usize) -> anyhow::Result<()>;
    /// Current waypoint sequence: origin, via points in leg order,
    /// destination. Reflects drag edits.
    fn waypoints(&self) -> Vec<Coord>;
    /// Polyline of the active alternative, for drawing.
    fn geometry(&self) -> Vec<Coord>;
    fn subscribe(&self, kind: RouteEventKind, tx: UnboundedSender<RouteEvent>) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
    /// Turns on interactive drag editing. Not every transport supports it;
    /// failure leaves the route usable, just not editable.
    fn start_editing(&self) -> anyhow::Result<()>;
    fn stop_editing(&self);
}

/// Remote mapping service. Suggestion ranking, geocoding and route
/// computation are all delegated here; the widget only coordinates.
#[allow(async_fn_in_trait)]
pub trait GeoProvider {
    async fn suggest(
        &self,
        text: &str,
        options: &SuggestOptions,
    ) -> anyhow::Result<Vec<SuggestionEntry>>;

    async fn geocode(&self, text: &str) -> anyhow::Result<Coord>;

    async fn build_route(
        &self,
        points: &[Coord],
        options: &RoutingOptions,
    ) -> anyhow::Result<Box<dyn ProviderRoute>>;
}

/// One static marker with pre-rendered popup content.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkerOverlayItem {
    pub coord: Coord,
    pub hint: String,
    pub popup_html: String,
}

/// Host map surface: accepts overlays, reports the visible bounds. Click
/// coordinates flow the other way, into `MapWidget::handle_map_click`.
pub trait MapSurface {
    fn add_route_overlay(&mut self, route: &dyn ProviderRoute);
    fn remove_route_overlay(&mut self, route_id: u64);
    fn add_marker_overlay(&mut self, markers: Vec<MarkerOverlayItem>);
    fn visible_bounds(&self) -> Option<BoundingBox>;
}
