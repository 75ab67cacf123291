// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives

use crate::Coord;
use crate::RoutingOptions;
use crate::config::WidgetConfig;
use crate::errors::WidgetError;
use crate::fmt_distance;
use crate::fmt_duration;
use crate::provider::GeoProvider;
use crate::provider::ProviderRoute;
use crate::provider::RouteAlternativeSummary;
use crate::provider::RouteEvent;
use crate::provider::RouteEventKind;
use crate::provider::SubscriptionId;
use crate::provider::SuggestOptions;
use crate::ui::SuggestionEntry;
use anyhow::Context;
use itertools::Itertools;
use log::warn;
use serde::Deserialize;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::UnboundedSender;

const SUGGEST_URL: &str = "https://suggest-maps.yandex.ru/v1/suggest";
const GEOCODE_URL: &str = "https://geocode-maps.yandex.ru/1.x/";
const ROUTER_URL: &str = "https://api.routing.yandex.net/v2/route";

static NEXT_ROUTE_ID: AtomicU64 = AtomicU64::new(1);

/// `GeoProvider` over the provider's plain HTTP endpoints. Suitable for
/// headless use; the browser build swaps in the interactive SDK adapter
/// instead.
pub struct YandexHttpProvider {
    client: reqwest::Client,
    api_key: String,
    lang: String,
}

impl YandexHttpProvider {
    pub fn new(config: &WidgetConfig) -> Result<Self, WidgetError> {
        if config.api_key.trim().is_empty() {
            return Err(WidgetError::Config(
                "missing map provider API key".to_string(),
            ));
        }
        Ok(YandexHttpProvider {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            lang: config.lang.clone(),
        })
    }
}

#[derive(Deserialize)]
struct SuggestResponse {
    #[serde(default)]
    results: Vec<SuggestResult>,
}

#[derive(Deserialize)]
struct SuggestResult {
    title: SuggestText,
    subtitle: Option<SuggestText>,
    address: Option<SuggestAddress>,
}

#[derive(Deserialize)]
struct SuggestText {
    text: String,
}

#[derive(Deserialize)]
struct SuggestAddress {
    formatted_address: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    response: GeocodeResponseBody,
}

#[derive(Deserialize)]
struct GeocodeResponseBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember", default)]
    members: Vec<FeatureMember>,
}

#[derive(Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    geo_object: GeoObject,
}

#[derive(Deserialize)]
struct GeoObject {
    #[serde(rename = "Point")]
    point: GeocodePoint,
}

#[derive(Deserialize)]
struct GeocodePoint {
    /// "lon lat", space separated
    pos: String,
}

#[derive(Deserialize)]
struct RouteResponse {
    #[serde(default)]
    routes: Vec<RouteJson>,
}

#[derive(Deserialize)]
struct RouteJson {
    distance: MetricJson,
    duration: MetricJson,
    /// Encoded polyline of the whole alternative, precision 6.
    geometry: Option<String>,
}

#[derive(Deserialize)]
struct MetricJson {
    value: f64,
    #[serde(default)]
    text: Option<String>,
}

fn parse_pos(pos: &str) -> anyhow::Result<Coord> {
    let mut parts = pos.split_whitespace();
    let lon: f64 = parts
        .next()
        .context("geocoder point is empty")?
        .parse()
        .context("geocoder longitude is not a number")?;
    let lat: f64 = parts
        .next()
        .context("geocoder point has no latitude")?
        .parse()
        .context("geocoder latitude is not a number")?;
    Ok(Coord::new(lat, lon))
}

fn decode_geometry(encoded: &str) -> Vec<Coord> {
    match polyline::decode_polyline(encoded, 6) {
        Ok(line) => line.coords().map(|c| Coord::new(c.y, c.x)).collect(),
        Err(err) => {
            warn!("failed to decode route geometry: {err}");
            Vec::new()
        }
    }
}

impl GeoProvider for YandexHttpProvider {
    async fn suggest(
        &self,
        text: &str,
        options: &SuggestOptions,
    ) -> anyhow::Result<Vec<SuggestionEntry>> {
        let mut query = vec![
            ("apikey".to_string(), self.api_key.clone()),
            ("text".to_string(), text.to_string()),
            ("lang".to_string(), self.lang.clone()),
            ("results".to_string(), options.limit.to_string()),
            ("print_address".to_string(), "1".to_string()),
        ];
        if let Some(bbox) = options.bounded_by {
            query.push((
                "bbox".to_string(),
                format!(
                    "{},{}~{},{}",
                    bbox.south_west.lon, bbox.south_west.lat, bbox.north_east.lon,
                    bbox.north_east.lat
                ),
            ));
        }

        let body: SuggestResponse = self
            .client
            .get(SUGGEST_URL)
            .query(&query)
            .send()
            .await
            .context("suggest request failed")?
            .error_for_status()
            .context("suggest request rejected")?
            .json()
            .await
            .context("suggest response was not valid JSON")?;

        Ok(body
            .results
            .into_iter()
            .map(|result| {
                let title = result.title.text;
                let display_label = match &result.subtitle {
                    Some(subtitle) => format!("{}, {}", title, subtitle.text),
                    None => title.clone(),
                };
                let value = result
                    .address
                    .and_then(|address| address.formatted_address)
                    .unwrap_or_else(|| title.clone());
                SuggestionEntry {
                    display_label,
                    value,
                }
            })
            .collect())
    }

    async fn geocode(&self, text: &str) -> anyhow::Result<Coord> {
        let query = [
            ("apikey", self.api_key.as_str()),
            ("geocode", text),
            ("format", "json"),
            ("results", "1"),
            ("lang", self.lang.as_str()),
        ];

        let body: GeocodeResponse = self
            .client
            .get(GEOCODE_URL)
            .query(&query)
            .send()
            .await
            .context("geocode request failed")?
            .error_for_status()
            .context("geocode request rejected")?
            .json()
            .await
            .context("geocode response was not valid JSON")?;

        let member = body
            .response
            .collection
            .members
            .into_iter()
            .next()
            .with_context(|| format!("no geocoder result for {text:?}"))?;
        parse_pos(&member.geo_object.point.pos)
    }

    async fn build_route(
        &self,
        points: &[Coord],
        options: &RoutingOptions,
    ) -> anyhow::Result<Box<dyn ProviderRoute>> {
        anyhow::ensure!(points.len() >= 2, "route build needs at least two points");

        let waypoints = points
            .iter()
            .map(|point| format!("{:.6},{:.6}", point.lat, point.lon))
            .join("|");
        let mut query = vec![
            ("apikey".to_string(), self.api_key.clone()),
            ("waypoints".to_string(), waypoints),
            ("mode".to_string(), options.mode.as_str().to_string()),
            ("alternatives".to_string(), "3".to_string()),
        ];
        if let Some(weight) = options.weight {
            query.push(("weight".to_string(), weight.to_string()));
        }

        let body: RouteResponse = self
            .client
            .get(ROUTER_URL)
            .query(&query)
            .send()
            .await
            .context("route request failed")?
            .error_for_status()
            .context("route request rejected")?
            .json()
            .await
            .context("route response was not valid JSON")?;

        anyhow::ensure!(!body.routes.is_empty(), "router returned no routes");
        Ok(Box::new(HttpRoute::new(points.to_vec(), body.routes)))
    }
}

struct HttpAlternative {
    summary: RouteAlternativeSummary,
    geometry: Vec<Coord>,
}

#[derive(Default)]
struct SubscriberList {
    next_id: u64,
    entries: Vec<(SubscriptionId, RouteEventKind, UnboundedSender<RouteEvent>)>,
}

/// Route built over plain HTTP. There is no live edit session behind it, so
/// recompute events never fire; active-alternative changes are still fanned
/// out to subscribers so list re-rendering behaves like the interactive SDK.
pub struct HttpRoute {
    id: u64,
    waypoints: Vec<Coord>,
    alternatives: Vec<HttpAlternative>,
    active: AtomicUsize,
    subscribers: Mutex<SubscriberList>,
}

impl HttpRoute {
    fn new(waypoints: Vec<Coord>, routes: Vec<RouteJson>) -> Self {
        let alternatives = routes
            .into_iter()
            .map(|route| {
                let human_distance = route
                    .distance
                    .text
                    .unwrap_or_else(|| fmt_distance(route.distance.value));
                let human_duration = route
                    .duration
                    .text
                    .unwrap_or_else(|| fmt_duration(route.duration.value));
                let geometry = route
                    .geometry
                    .as_deref()
                    .map(decode_geometry)
                    .unwrap_or_default();
                HttpAlternative {
                    summary: RouteAlternativeSummary {
                        human_distance,
                        human_duration,
                    },
                    geometry,
                }
            })
            .collect();
        HttpRoute {
            id: NEXT_ROUTE_ID.fetch_add(1, Ordering::Relaxed),
            waypoints,
            alternatives,
            active: AtomicUsize::new(0),
            subscribers: Mutex::new(SubscriberList::default()),
        }
    }

    fn fire(&self, kind: RouteEventKind) {
        let subscribers = self.subscribers.lock().unwrap();
        for (_, subscribed_kind, tx) in &subscribers.entries {
            if *subscribed_kind == kind {
                let _ = tx.send(RouteEvent { kind });
            }
        }
    }
}

impl ProviderRoute for HttpRoute {
    fn id(&self) -> u64 {
        self.id
    }

    fn alternatives(&self) -> Vec<RouteAlternativeSummary> {
        self.alternatives
            .iter()
            .map(|alternative| alternative.summary.clone())
            .collect()
    }

    fn active_alternative(&self) -> Option<usize> {
        let active = self.active.load(Ordering::Relaxed);
        (active < self.alternatives.len()).then_some(active)
    }

    fn set_active_alternative(&self, index: usize) -> anyhow::Result<()> {
        anyhow::ensure!(
            index < self.alternatives.len(),
            "alternative index {index} out of range"
        );
        self.active.store(index, Ordering::Relaxed);
        self.fire(RouteEventKind::ActiveRouteChanged);
        Ok(())
    }

    fn waypoints(&self) -> Vec<Coord> {
        self.waypoints.clone()
    }

    fn geometry(&self) -> Vec<Coord> {
        self.active_alternative()
            .map(|active| self.alternatives[active].geometry.clone())
            .unwrap_or_default()
    }

    fn subscribe(&self, kind: RouteEventKind, tx: UnboundedSender<RouteEvent>) -> SubscriptionId {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.next_id += 1;
        let id = SubscriptionId(subscribers.next_id);
        subscribers.entries.push((id, kind, tx));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.entries.retain(|(sub_id, _, _)| *sub_id != id);
    }

    fn start_editing(&self) -> anyhow::Result<()> {
        anyhow::bail!("drag editing requires the interactive map SDK")
    }

    fn stop_editing(&self) {}
}
