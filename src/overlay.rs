use crate::Coord;
use crate::provider::MapSurface;
use crate::provider::MarkerOverlayItem;
use crate::ui::escape_html;
use anyhow::Context;
use geojson::GeoJson;
use log::info;
use log::warn;

/// Loads the static marker overlay (weighing frames and similar fixed
/// checkpoints) and hands it to the map surface. Every failure path
/// degrades to a no-op: the widget works fine without the overlay.
pub async fn load_static_overlay<S: MapSurface>(
    client: &reqwest::Client,
    url: &str,
    surface: &mut S,
) {
    match fetch_overlay_markers(client, url).await {
        Ok(markers) => {
            info!("static overlay loaded, {} markers", markers.len());
            surface.add_marker_overlay(markers);
        }
        Err(err) => warn!("static overlay unavailable: {err:#}"),
    }
}

async fn fetch_overlay_markers(
    client: &reqwest::Client,
    url: &str,
) -> anyhow::Result<Vec<MarkerOverlayItem>> {
    // cache buster, the document is regenerated out of band
    let version = chrono::Utc::now().timestamp_millis();
    let body = client
        .get(url)
        .query(&[("v", version.to_string())])
        .send()
        .await
        .context("overlay fetch failed")?
        .error_for_status()
        .context("overlay fetch rejected")?
        .text()
        .await
        .context("overlay body read failed")?;
    markers_from_geojson(&body)
}

fn markers_from_geojson(body: &str) -> anyhow::Result<Vec<MarkerOverlayItem>> {
    let geojson: GeoJson = body.parse().context("overlay is not valid GeoJSON")?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        anyhow::bail!("overlay document is not a FeatureCollection");
    };
    Ok(collection
        .features
        .into_iter()
        .filter_map(feature_to_marker)
        .collect())
}

fn feature_to_marker(feature: geojson::Feature) -> Option<MarkerOverlayItem> {
    let geometry = feature.geometry.as_ref()?;
    let geojson::Value::Point(position) = &geometry.value else {
        return None;
    };
    // GeoJSON positions are lon, lat
    let coord = Coord::new(*position.get(1)?, *position.get(0)?);

    let name = feature
        .property("name")
        .and_then(|value| value.as_str())
        .unwrap_or("Checkpoint")
        .to_string();
    let mut popup_html = format!("<b>{}</b>", escape_html(&name));
    if let Some(comment) = feature.property("comment").and_then(|value| value.as_str()) {
        popup_html.push_str(&format!("<div>{}</div>", escape_html(comment)));
    }
    if let Some(date) = feature.property("date").and_then(|value| value.as_str()) {
        popup_html.push_str(&format!("<div>Date: {}</div>", escape_html(date)));
    }

    Some(MarkerOverlayItem {
        coord,
        hint: name,
        popup_html,
    })
}
