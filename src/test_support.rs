//! Shared fakes for the controller tests: a scriptable provider, a
//! recording map surface and a recording UI sink.

use crate::Coord;
use crate::FieldKey;
use crate::RoutingOptions;
use crate::provider::BoundingBox;
use crate::provider::GeoProvider;
use crate::provider::MapSurface;
use crate::provider::MarkerOverlayItem;
use crate::provider::ProviderRoute;
use crate::provider::RouteAlternativeSummary;
use crate::provider::RouteEvent;
use crate::provider::RouteEventKind;
use crate::provider::SubscriptionId;
use crate::ui::Notice;
use crate::ui::RouteListView;
use crate::ui::SuggestionEntry;
use crate::ui::UiSink;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::UnboundedSender;

static NEXT_MOCK_ROUTE_ID: AtomicU64 = AtomicU64::new(1000);

#[derive(Default)]
pub struct MockProvider {
    pub suggest_calls: Mutex<Vec<String>>,
    pub geocode_calls: Mutex<Vec<String>>,
    pub build_calls: Mutex<Vec<(Vec<Coord>, RoutingOptions)>>,
    pub suggest_response: Mutex<Vec<SuggestionEntry>>,
    failing_geocodes: Mutex<Vec<String>>,
    /// Every route handed out by `build_route`, oldest first.
    pub routes: Mutex<Vec<Arc<MockRoute>>>,
}

impl MockProvider {
    pub fn with_suggestions(entries: Vec<SuggestionEntry>) -> Self {
        let provider = MockProvider::default();
        *provider.suggest_response.lock().unwrap() = entries;
        provider
    }

    pub fn fail_geocode(&self, text: &str) {
        self.failing_geocodes.lock().unwrap().push(text.to_string());
    }

    /// Deterministic pseudo-coordinates so assertions can predict geocode
    /// results without scripting every response.
    pub fn coord_for(text: &str) -> Coord {
        let sum: u32 = text.bytes().map(u32::from).sum();
        Coord::new(50.0 + f64::from(sum % 1000) / 100.0, 30.0 + f64::from(sum % 700) / 100.0)
    }

    pub fn last_route(&self) -> Arc<MockRoute> {
        self.routes
            .lock()
            .unwrap()
            .last()
            .expect("no route was built")
            .clone()
    }
}

impl GeoProvider for MockProvider {
    async fn suggest(
        &self,
        text: &str,
        _options: &crate::provider::SuggestOptions,
    ) -> anyhow::Result<Vec<SuggestionEntry>> {
        self.suggest_calls.lock().unwrap().push(text.to_string());
        Ok(self.suggest_response.lock().unwrap().clone())
    }

    async fn geocode(&self, text: &str) -> anyhow::Result<Coord> {
        self.geocode_calls.lock().unwrap().push(text.to_string());
        if self
            .failing_geocodes
            .lock()
            .unwrap()
            .iter()
            .any(|failing| failing == text)
        {
            anyhow::bail!("no geocoder result for {text:?}");
        }
        Ok(Self::coord_for(text))
    }

    async fn build_route(
        &self,
        points: &[Coord],
        options: &RoutingOptions,
    ) -> anyhow::Result<Box<dyn ProviderRoute>> {
        self.build_calls
            .lock()
            .unwrap()
            .push((points.to_vec(), *options));
        let route = Arc::new(MockRoute::new(points.to_vec()));
        self.routes.lock().unwrap().push(route.clone());
        Ok(Box::new(MockRouteHandle { inner: route }))
    }
}

pub struct MockRoute {
    pub id: u64,
    waypoints: Mutex<Vec<Coord>>,
    alternatives: Mutex<Vec<RouteAlternativeSummary>>,
    active: AtomicUsize,
    subscribers: Mutex<Vec<(SubscriptionId, RouteEventKind, UnboundedSender<RouteEvent>)>>,
    next_sub_id: AtomicU64,
    subscribe_count: AtomicUsize,
    unsubscribe_count: AtomicUsize,
    editing_starts: AtomicUsize,
    editing_stops: AtomicUsize,
}

impl MockRoute {
    fn new(waypoints: Vec<Coord>) -> Self {
        MockRoute {
            id: NEXT_MOCK_ROUTE_ID.fetch_add(1, Ordering::Relaxed),
            waypoints: Mutex::new(waypoints),
            alternatives: Mutex::new(vec![
                RouteAlternativeSummary {
                    human_distance: "10.0 km".to_string(),
                    human_duration: "12 min".to_string(),
                },
                RouteAlternativeSummary {
                    human_distance: "12.5 km".to_string(),
                    human_duration: "15 min".to_string(),
                },
            ]),
            active: AtomicUsize::new(0),
            subscribers: Mutex::new(Vec::new()),
            next_sub_id: AtomicU64::new(0),
            subscribe_count: AtomicUsize::new(0),
            unsubscribe_count: AtomicUsize::new(0),
            editing_starts: AtomicUsize::new(0),
            editing_stops: AtomicUsize::new(0),
        }
    }

    pub fn set_waypoints(&self, waypoints: Vec<Coord>) {
        *self.waypoints.lock().unwrap() = waypoints;
    }

    pub fn fire(&self, kind: RouteEventKind) {
        for (_, subscribed_kind, tx) in self.subscribers.lock().unwrap().iter() {
            if *subscribed_kind == kind {
                let _ = tx.send(RouteEvent { kind });
            }
        }
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribe_count.load(Ordering::Relaxed)
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribe_count.load(Ordering::Relaxed)
    }

    pub fn editing_starts(&self) -> usize {
        self.editing_starts.load(Ordering::Relaxed)
    }

    pub fn editing_stops(&self) -> usize {
        self.editing_stops.load(Ordering::Relaxed)
    }
}

/// Boxed handle handed to the coordinator; shares state with the `Arc` the
/// test keeps for inspection and event firing.
pub struct MockRouteHandle {
    inner: Arc<MockRoute>,
}

impl ProviderRoute for MockRouteHandle {
    fn id(&self) -> u64 {
        self.inner.id
    }

    fn alternatives(&self) -> Vec<RouteAlternativeSummary> {
        self.inner.alternatives.lock().unwrap().clone()
    }

    fn active_alternative(&self) -> Option<usize> {
        let active = self.inner.active.load(Ordering::Relaxed);
        (active < self.inner.alternatives.lock().unwrap().len()).then_some(active)
    }

    fn set_active_alternative(&self, index: usize) -> anyhow::Result<()> {
        anyhow::ensure!(
            index < self.inner.alternatives.lock().unwrap().len(),
            "alternative index {index} out of range"
        );
        self.inner.active.store(index, Ordering::Relaxed);
        self.inner.fire(RouteEventKind::ActiveRouteChanged);
        Ok(())
    }

    fn waypoints(&self) -> Vec<Coord> {
        self.inner.waypoints.lock().unwrap().clone()
    }

    fn geometry(&self) -> Vec<Coord> {
        self.inner.waypoints.lock().unwrap().clone()
    }

    fn subscribe(&self, kind: RouteEventKind, tx: UnboundedSender<RouteEvent>) -> SubscriptionId {
        self.inner.subscribe_count.fetch_add(1, Ordering::Relaxed);
        let id = SubscriptionId(self.inner.next_sub_id.fetch_add(1, Ordering::Relaxed));
        self.inner.subscribers.lock().unwrap().push((id, kind, tx));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.unsubscribe_count.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .unwrap()
            .retain(|(sub_id, _, _)| *sub_id != id);
    }

    fn start_editing(&self) -> anyhow::Result<()> {
        self.inner.editing_starts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn stop_editing(&self) {
        self.inner.editing_stops.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
pub struct RecordingSurface {
    pub added_routes: Vec<u64>,
    pub removed_routes: Vec<u64>,
    pub marker_batches: Vec<Vec<MarkerOverlayItem>>,
    pub bounds: Option<BoundingBox>,
}

impl MapSurface for RecordingSurface {
    fn add_route_overlay(&mut self, route: &dyn ProviderRoute) {
        self.added_routes.push(route.id());
    }

    fn remove_route_overlay(&mut self, route_id: u64) {
        self.removed_routes.push(route_id);
    }

    fn add_marker_overlay(&mut self, markers: Vec<MarkerOverlayItem>) {
        self.marker_batches.push(markers);
    }

    fn visible_bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum UiCall {
    SetFieldText(FieldKey, String),
    RenderDropdown(FieldKey, Vec<SuggestionEntry>),
    HideDropdown(FieldKey),
    RenderRouteList(RouteListView),
    ClearRouteList,
    Notify(Notice),
}

#[derive(Default)]
pub struct RecordingUi {
    pub calls: Vec<UiCall>,
}

impl RecordingUi {
    pub fn last_dropdown(&self, field: FieldKey) -> Option<&Vec<SuggestionEntry>> {
        self.calls.iter().rev().find_map(|call| match call {
            UiCall::RenderDropdown(call_field, entries) if *call_field == field => Some(entries),
            _ => None,
        })
    }

    pub fn dropdown_renders(&self, field: FieldKey) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, UiCall::RenderDropdown(call_field, _) if *call_field == field))
            .count()
    }

    pub fn notices(&self) -> Vec<&Notice> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                UiCall::Notify(notice) => Some(notice),
                _ => None,
            })
            .collect()
    }

    pub fn route_list_renders(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, UiCall::RenderRouteList(_)))
            .count()
    }

    pub fn route_list_clears(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, UiCall::ClearRouteList))
            .count()
    }

    pub fn last_route_list(&self) -> Option<&RouteListView> {
        self.calls.iter().rev().find_map(|call| match call {
            UiCall::RenderRouteList(view) => Some(view),
            _ => None,
        })
    }
}

impl UiSink for RecordingUi {
    fn set_field_text(&mut self, field: FieldKey, text: &str) {
        self.calls.push(UiCall::SetFieldText(field, text.to_string()));
    }

    fn render_dropdown(&mut self, field: FieldKey, entries: &[SuggestionEntry]) {
        self.calls
            .push(UiCall::RenderDropdown(field, entries.to_vec()));
    }

    fn hide_dropdown(&mut self, field: FieldKey) {
        self.calls.push(UiCall::HideDropdown(field));
    }

    fn render_route_list(&mut self, view: &RouteListView) {
        self.calls.push(UiCall::RenderRouteList(view.clone()));
    }

    fn clear_route_list(&mut self) {
        self.calls.push(UiCall::ClearRouteList);
    }

    fn notify(&mut self, notice: Notice) {
        self.calls.push(UiCall::Notify(notice));
    }
}
