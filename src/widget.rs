// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use crate::Coord;
use crate::FieldKey;
use crate::VehicleMode;
use crate::config::WidgetConfig;
use crate::errors::WidgetError;
use crate::provider::GeoProvider;
use crate::provider::MapSurface;
use crate::provider::RouteEvent;
use crate::provider::RouteEventKind;
use crate::route_sync::RouteCoordinator;
use crate::suggest::SuggestController;
use crate::ui::Notice;
use crate::ui::UiSink;
use log::debug;
use log::info;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::mpsc::unbounded_channel;

/// Messages feeding the single-threaded widget pump: expired timers and
/// live route events. Everything that mutates widget state goes through
/// `handle_event` or the public handler methods, never concurrently.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WidgetEvent {
    SuggestTimerFired {
        field: FieldKey,
        text: String,
        tag: u64,
    },
    BlurGraceElapsed {
        field: FieldKey,
    },
    Route(RouteEvent),
}

/// The widget controller. One instance per embedded map; all mutable state
/// (per-field caches, via points, the current route and its subscriptions)
/// lives here rather than at module scope.
pub struct MapWidget<P, S, U> {
    config: WidgetConfig,
    provider: P,
    surface: S,
    ui: U,
    suggest: SuggestController,
    coordinator: RouteCoordinator,
    via_points: Vec<Coord>,
    events_tx: UnboundedSender<WidgetEvent>,
    events_rx: UnboundedReceiver<WidgetEvent>,
    route_tx: UnboundedSender<RouteEvent>,
    route_rx: UnboundedReceiver<RouteEvent>,
}

impl<P: GeoProvider, S: MapSurface, U: UiSink> MapWidget<P, S, U> {
    pub fn new(config: WidgetConfig, provider: P, surface: S, ui: U) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        let (route_tx, route_rx) = unbounded_channel();
        MapWidget {
            config,
            provider,
            surface,
            ui,
            suggest: SuggestController::new(),
            coordinator: RouteCoordinator::new(),
            via_points: Vec::new(),
            events_tx,
            events_rx,
            route_tx,
            route_rx,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn via_points(&self) -> &[Coord] {
        &self.via_points
    }

    pub fn has_route(&self) -> bool {
        self.coordinator.has_route()
    }

    /// Waits for the next event from either the timer channel or the live
    /// route.
    pub async fn next_event(&mut self) -> Option<WidgetEvent> {
        tokio::select! {
            event = self.events_rx.recv() => event,
            route_event = self.route_rx.recv() => route_event.map(WidgetEvent::Route),
        }
    }

    pub async fn handle_event(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::SuggestTimerFired { field, text, tag } => {
                let bounds = self.surface.visible_bounds();
                self.suggest
                    .handle_timer_fired(
                        field,
                        &text,
                        tag,
                        &self.provider,
                        bounds,
                        &self.config,
                        &mut self.ui,
                    )
                    .await;
            }
            WidgetEvent::BlurGraceElapsed { field } => {
                self.suggest.handle_blur_elapsed(field, &mut self.ui);
            }
            WidgetEvent::Route(route_event) => self.handle_route_event(route_event),
        }
    }

    fn handle_route_event(&mut self, event: RouteEvent) {
        match event.kind {
            RouteEventKind::RecomputeSucceeded => {
                // A drag edit changed the effective via points; adopt them
                // so the next build starts from what the user sees.
                if let Some(via) = self.coordinator.sync_via_points() {
                    debug!("via points resynchronized from route, {} points", via.len());
                    self.via_points = via;
                }
                self.coordinator.render_route_list(&mut self.ui);
            }
            RouteEventKind::ActiveRouteChanged => {
                self.coordinator.render_route_list(&mut self.ui);
            }
        }
    }

    pub fn handle_input(&mut self, field: FieldKey, text: &str) {
        self.suggest
            .handle_input(field, text, &self.config, &self.events_tx, &mut self.ui);
    }

    pub async fn handle_focus(&mut self, field: FieldKey) {
        let bounds = self.surface.visible_bounds();
        self.suggest
            .handle_focus(field, &self.provider, bounds, &self.config, &mut self.ui)
            .await;
    }

    pub fn handle_blur(&mut self, field: FieldKey) {
        self.suggest.handle_blur(field, &self.config, &self.events_tx);
    }

    pub async fn choose_suggestion(&mut self, field: FieldKey, value: &str) {
        self.suggest
            .choose_suggestion(field, value, &self.provider, &mut self.ui)
            .await;
    }

    /// Map click: append a via point and confirm with a transient counter
    /// toast. Cleared only explicitly or by route resynchronization.
    pub fn handle_map_click(&mut self, coord: Coord) {
        self.via_points.push(coord);
        self.ui.notify(Notice::info(
            format!("Via point added ({})", self.via_points.len()),
            2000,
        ));
    }

    pub fn clear_via_points(&mut self) {
        self.via_points.clear();
        self.ui.notify(Notice::info("Via points cleared", 1500));
    }

    pub fn select_alternative(&mut self, index: usize) {
        self.coordinator.select_alternative(index);
    }

    /// The build action. All failures become a transient error notice; the
    /// previous route, if any, stays on the map untouched. Returns whether
    /// the build succeeded.
    pub async fn build_route(&mut self, mode: VehicleMode) -> bool {
        match self.try_build_route(mode).await {
            Ok(()) => {
                self.ui.notify(Notice::info("Route built", 2000));
                true
            }
            Err(err) => {
                self.ui.notify(Notice::error(err.to_string()));
                false
            }
        }
    }

    async fn try_build_route(&mut self, mode: VehicleMode) -> Result<(), WidgetError> {
        let from_text = self.suggest.field_text(FieldKey::From).trim().to_string();
        let to_text = self.suggest.field_text(FieldKey::To).trim().to_string();
        if from_text.is_empty() || to_text.is_empty() {
            return Err(WidgetError::Input(
                "Both departure and arrival addresses are required".to_string(),
            ));
        }

        let origin = self
            .suggest
            .resolve_for_build(FieldKey::From, &from_text, &self.provider)
            .await?;
        let destination = self
            .suggest
            .resolve_for_build(FieldKey::To, &to_text, &self.provider)
            .await?;

        let mut points = Vec::with_capacity(self.via_points.len() + 2);
        points.push(origin);
        points.extend_from_slice(&self.via_points);
        points.push(destination);

        let options = mode.routing_options();
        let route = self
            .provider
            .build_route(&points, &options)
            .await
            .map_err(WidgetError::Route)?;
        info!(
            "route built, {} alternatives, {} via points",
            route.alternatives().len(),
            self.via_points.len()
        );

        self.via_points =
            self.coordinator
                .install(route, &mut self.surface, &self.route_tx, &mut self.ui);
        Ok(())
    }

    /// Static overlay bootstrap. Failures degrade silently.
    pub async fn load_overlay(&mut self, client: &reqwest::Client) {
        if let Some(url) = self.config.overlay_url.clone() {
            crate::overlay::load_static_overlay(client, &url, &mut self.surface).await;
        }
    }
}
