// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives

use crate::Coord;
use crate::FieldKey;
use crate::config::WidgetConfig;
use crate::debounce::DebounceTimer;
use crate::errors::WidgetError;
use crate::provider::BoundingBox;
use crate::provider::GeoProvider;
use crate::provider::SuggestOptions;
use crate::ui::Notice;
use crate::ui::SuggestionEntry;
use crate::ui::UiSink;
use crate::widget::WidgetEvent;
use ahash::AHashMap;
use log::warn;
use tokio::sync::mpsc::UnboundedSender;

/// Geocoded coordinates remembered for the exact text that produced them.
/// Any edit to the field invalidates the entry.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPoint {
    pub query_text: String,
    pub coords: Coord,
}

#[derive(Default)]
struct FieldState {
    text: String,
    resolved: Option<ResolvedPoint>,
    debounce: DebounceTimer,
    blur_timer: DebounceTimer,
    /// Tag of the most recently issued or superseding request. A response
    /// carrying an older tag is dropped without touching the dropdown.
    latest_tag: u64,
    dropdown_open: bool,
}

/// Per-field autocomplete state machine: debounced queries, stale-response
/// suppression, resolved-coordinate caching and the single resolution path
/// used by the build action.
pub struct SuggestController {
    fields: AHashMap<FieldKey, FieldState>,
}

impl SuggestController {
    pub fn new() -> Self {
        SuggestController {
            fields: AHashMap::new(),
        }
    }

    fn state_mut(&mut self, field: FieldKey) -> &mut FieldState {
        self.fields.entry(field).or_default()
    }

    /// Current input text as the controller last saw it. Empty until the
    /// first keystroke.
    pub fn field_text(&self, field: FieldKey) -> &str {
        self.fields
            .get(&field)
            .map(|state| state.text.as_str())
            .unwrap_or("")
    }

    pub fn cached_point(&self, field: FieldKey) -> Option<&ResolvedPoint> {
        self.fields.get(&field).and_then(|state| state.resolved.as_ref())
    }

    pub fn dropdown_open(&self, field: FieldKey) -> bool {
        self.fields
            .get(&field)
            .map(|state| state.dropdown_open)
            .unwrap_or(false)
    }

    fn close_dropdown<U: UiSink>(&mut self, field: FieldKey, ui: &mut U) {
        self.state_mut(field).dropdown_open = false;
        ui.hide_dropdown(field);
    }

    /// Keystroke handler. Invalidates the cache unconditionally, then either
    /// hides the dropdown (short text) or restarts the debounce timer.
    pub fn handle_input<U: UiSink>(
        &mut self,
        field: FieldKey,
        text: &str,
        config: &WidgetConfig,
        events: &UnboundedSender<WidgetEvent>,
        ui: &mut U,
    ) {
        let trimmed = text.trim().to_string();
        {
            let state = self.state_mut(field);
            state.text = text.to_string();
            state.resolved = None;
            // supersede any response still in flight for the old text
            state.latest_tag += 1;
        }

        if trimmed.is_empty() || trimmed.chars().count() < config.min_query_len {
            self.state_mut(field).debounce.cancel();
            self.close_dropdown(field, ui);
            return;
        }

        let state = self.state_mut(field);
        let tag = state.latest_tag;
        state.debounce.schedule(
            config.debounce(),
            events.clone(),
            WidgetEvent::SuggestTimerFired {
                field,
                text: trimmed,
                tag,
            },
        );
    }

    /// Focus re-opens suggestions for existing text without waiting out the
    /// debounce interval.
    pub async fn handle_focus<P: GeoProvider, U: UiSink>(
        &mut self,
        field: FieldKey,
        provider: &P,
        bounds: Option<BoundingBox>,
        config: &WidgetConfig,
        ui: &mut U,
    ) {
        let text = self.field_text(field).trim().to_string();
        if text.is_empty() {
            return;
        }
        let tag = {
            let state = self.state_mut(field);
            state.latest_tag += 1;
            state.latest_tag
        };
        self.run_query(field, &text, tag, provider, bounds, config, ui)
            .await;
    }

    /// Debounce timer callback. The tag is rechecked both here and when the
    /// response arrives, so an overtaken request can never repaint the
    /// dropdown.
    pub async fn handle_timer_fired<P: GeoProvider, U: UiSink>(
        &mut self,
        field: FieldKey,
        text: &str,
        tag: u64,
        provider: &P,
        bounds: Option<BoundingBox>,
        config: &WidgetConfig,
        ui: &mut U,
    ) {
        if self.state_mut(field).latest_tag != tag {
            return;
        }
        self.run_query(field, text, tag, provider, bounds, config, ui)
            .await;
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_query<P: GeoProvider, U: UiSink>(
        &mut self,
        field: FieldKey,
        text: &str,
        tag: u64,
        provider: &P,
        bounds: Option<BoundingBox>,
        config: &WidgetConfig,
        ui: &mut U,
    ) {
        let options = SuggestOptions {
            limit: config.suggest_limit,
            bounded_by: bounds,
        };
        let result = provider.suggest(text, &options).await;
        self.apply_query_result(field, tag, result, ui);
    }

    /// Applies a suggest response if and only if its tag is still the
    /// latest for the field. Failures behave like "no results".
    pub(crate) fn apply_query_result<U: UiSink>(
        &mut self,
        field: FieldKey,
        tag: u64,
        result: anyhow::Result<Vec<SuggestionEntry>>,
        ui: &mut U,
    ) {
        if self.state_mut(field).latest_tag != tag {
            return;
        }
        match result {
            Ok(entries) if entries.is_empty() => self.close_dropdown(field, ui),
            Ok(entries) => {
                self.state_mut(field).dropdown_open = true;
                ui.render_dropdown(field, &entries);
            }
            Err(err) => {
                warn!("suggest query for {field} field failed: {err:#}");
                self.close_dropdown(field, ui);
            }
        }
    }

    /// Blur closes the dropdown after a grace delay, so a mousedown landing
    /// on a dropdown item still wins the race.
    pub fn handle_blur(
        &mut self,
        field: FieldKey,
        config: &WidgetConfig,
        events: &UnboundedSender<WidgetEvent>,
    ) {
        let grace = config.blur_grace();
        self.state_mut(field).blur_timer.schedule(
            grace,
            events.clone(),
            WidgetEvent::BlurGraceElapsed { field },
        );
    }

    pub fn handle_blur_elapsed<U: UiSink>(&mut self, field: FieldKey, ui: &mut U) {
        self.close_dropdown(field, ui);
    }

    /// Dropdown selection: adopt the value, close the dropdown, then geocode
    /// so the later build can reuse the cache. A geocode failure leaves the
    /// cache empty; the build path retries.
    pub async fn choose_suggestion<P: GeoProvider, U: UiSink>(
        &mut self,
        field: FieldKey,
        value: &str,
        provider: &P,
        ui: &mut U,
    ) {
        {
            let state = self.state_mut(field);
            state.text = value.to_string();
            state.resolved = None;
            // the dropdown is closing, drop any in-flight suggest result
            state.latest_tag += 1;
        }
        ui.set_field_text(field, value);
        self.close_dropdown(field, ui);

        match provider.geocode(value).await {
            Ok(coords) => {
                self.state_mut(field).resolved = Some(ResolvedPoint {
                    query_text: value.to_string(),
                    coords,
                });
            }
            Err(err) => {
                warn!("geocode for chosen {field} suggestion failed: {err:#}");
                ui.notify(Notice::error(format!(
                    "Could not resolve {field} address"
                )));
            }
        }
    }

    /// The single resolution path for the build action. The cache is reused
    /// only when its stored text matches `text` exactly; otherwise one fresh
    /// geocode call fills it.
    pub async fn resolve_for_build<P: GeoProvider>(
        &mut self,
        field: FieldKey,
        text: &str,
        provider: &P,
    ) -> Result<Coord, WidgetError> {
        if let Some(resolved) = self.cached_point(field)
            && resolved.query_text == text
        {
            return Ok(resolved.coords);
        }
        let coords = provider
            .geocode(text)
            .await
            .map_err(|source| WidgetError::Resolution { field, source })?;
        self.state_mut(field).resolved = Some(ResolvedPoint {
            query_text: text.to_string(),
            coords,
        });
        Ok(coords)
    }
}

impl Default for SuggestController {
    fn default() -> Self {
        Self::new()
    }
}
