// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives

use crate::Coord;
use crate::provider::MapSurface;
use crate::provider::ProviderRoute;
use crate::provider::RouteEvent;
use crate::provider::RouteEventKind;
use crate::provider::SubscriptionId;
use crate::ui::RouteListItem;
use crate::ui::RouteListView;
use crate::ui::UiSink;
use log::warn;
use tokio::sync::mpsc::UnboundedSender;

/// Owns the single current-route slot. A successful build replaces the old
/// route wholesale: subscriptions drained, editor stopped, overlay removed,
/// then the new route installed and wired up. Two routes never coexist.
pub struct RouteCoordinator {
    current: Option<Box<dyn ProviderRoute>>,
    subscriptions: Vec<SubscriptionId>,
}

impl RouteCoordinator {
    pub fn new() -> Self {
        RouteCoordinator {
            current: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn has_route(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&dyn ProviderRoute> {
        self.current.as_deref()
    }

    /// Replaces the current route and returns the resynchronized via-point
    /// list for the caller to adopt.
    pub fn install<S: MapSurface, U: UiSink>(
        &mut self,
        route: Box<dyn ProviderRoute>,
        surface: &mut S,
        events: &UnboundedSender<RouteEvent>,
        ui: &mut U,
    ) -> Vec<Coord> {
        self.teardown(surface);

        surface.add_route_overlay(route.as_ref());
        self.subscriptions
            .push(route.subscribe(RouteEventKind::RecomputeSucceeded, events.clone()));
        self.subscriptions
            .push(route.subscribe(RouteEventKind::ActiveRouteChanged, events.clone()));
        if let Err(err) = route.start_editing() {
            warn!("route editor could not be started: {err:#}");
        }
        self.current = Some(route);

        self.render_route_list(ui);
        self.sync_via_points().unwrap_or_default()
    }

    /// Detaches subscriptions and removes the overlay of the current route,
    /// if any. Subscriptions are always drained before the handle is
    /// dropped, so no callback can fire against a removed route.
    pub fn teardown<S: MapSurface>(&mut self, surface: &mut S) {
        if let Some(route) = self.current.take() {
            route.stop_editing();
            for subscription in self.subscriptions.drain(..) {
                route.unsubscribe(subscription);
            }
            surface.remove_route_overlay(route.id());
        }
    }

    /// Waypoints minus origin and destination, in leg order. `None` when no
    /// route exists or the provider reports fewer than two waypoints.
    pub fn sync_via_points(&self) -> Option<Vec<Coord>> {
        let route = self.current.as_deref()?;
        let waypoints = route.waypoints();
        if waypoints.len() < 2 {
            return None;
        }
        Some(waypoints[1..waypoints.len() - 1].to_vec())
    }

    pub fn route_list_view(&self) -> RouteListView {
        let Some(route) = self.current.as_deref() else {
            return RouteListView::default();
        };
        let active = route.active_alternative();
        let items = route
            .alternatives()
            .into_iter()
            .enumerate()
            .map(|(index, alternative)| RouteListItem {
                index,
                label: format!("Route {}", index + 1),
                distance: alternative.human_distance,
                duration: alternative.human_duration,
                active: active == Some(index),
            })
            .collect();
        RouteListView { items }
    }

    /// Full re-render of the alternatives list. Idempotent: the view is
    /// rebuilt from the route every time, never patched incrementally.
    pub fn render_route_list<U: UiSink>(&self, ui: &mut U) {
        let view = self.route_list_view();
        if view.items.is_empty() {
            ui.clear_route_list();
        } else {
            ui.render_route_list(&view);
        }
    }

    /// Marks an alternative active on the provider route. The resulting
    /// ActiveRouteChanged event triggers the list re-render.
    pub fn select_alternative(&self, index: usize) {
        if let Some(route) = self.current.as_deref()
            && let Err(err) = route.set_active_alternative(index)
        {
            warn!("could not activate route alternative {index}: {err:#}");
        }
    }
}

impl Default for RouteCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
