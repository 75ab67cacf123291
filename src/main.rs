// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

use anyhow::Context;
use clap::Parser;
use log::info;
use log::warn;
use std::str::FromStr;
use transtime_map::Coord;
use transtime_map::FieldKey;
use transtime_map::VehicleMode;
use transtime_map::config::WidgetConfig;
use transtime_map::provider::BoundingBox;
use transtime_map::provider::MapSurface;
use transtime_map::provider::MarkerOverlayItem;
use transtime_map::provider::ProviderRoute;
use transtime_map::provider::yandex::YandexHttpProvider;
use transtime_map::ui::Notice;
use transtime_map::ui::NoticeLevel;
use transtime_map::ui::RouteListView;
use transtime_map::ui::SuggestionEntry;
use transtime_map::ui::UiSink;
use transtime_map::widget::MapWidget;

#[derive(Parser)]
#[command(
    name = "routeplan",
    about = "Builds a route through the map provider and prints the alternatives"
)]
struct Args {
    /// Departure address
    #[arg(long)]
    from: String,

    /// Arrival address
    #[arg(long)]
    to: String,

    /// Vehicle: car, truck40 or truckheavy
    #[arg(long, default_value = "truck40")]
    vehicle: String,

    /// Intermediate via point as "lat,lon", repeatable, in order
    #[arg(long = "via")]
    via: Vec<String>,
}

/// Headless stand-in for the interactive map surface.
struct ConsoleSurface;

impl MapSurface for ConsoleSurface {
    fn add_route_overlay(&mut self, route: &dyn ProviderRoute) {
        info!(
            "route overlay added, {} geometry points",
            route.geometry().len()
        );
    }

    fn remove_route_overlay(&mut self, route_id: u64) {
        info!("route overlay {route_id} removed");
    }

    fn add_marker_overlay(&mut self, markers: Vec<MarkerOverlayItem>) {
        info!("marker overlay added, {} markers", markers.len());
    }

    fn visible_bounds(&self) -> Option<BoundingBox> {
        None
    }
}

struct ConsoleUi;

impl UiSink for ConsoleUi {
    fn set_field_text(&mut self, field: FieldKey, text: &str) {
        info!("{field} field set to {text:?}");
    }

    fn render_dropdown(&mut self, field: FieldKey, entries: &[SuggestionEntry]) {
        for entry in entries {
            println!("  {field} suggestion: {}", entry.display_label);
        }
    }

    fn hide_dropdown(&mut self, _field: FieldKey) {}

    fn render_route_list(&mut self, view: &RouteListView) {
        for item in &view.items {
            let marker = if item.active { "*" } else { " " };
            println!(
                "{marker} {}  {}  {}",
                item.label, item.distance, item.duration
            );
        }
    }

    fn clear_route_list(&mut self) {}

    fn notify(&mut self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!("{}", notice.text),
            NoticeLevel::Error => warn!("{}", notice.text),
        }
    }
}

fn parse_via(value: &str) -> anyhow::Result<Coord> {
    let (lat, lon) = value
        .split_once(',')
        .with_context(|| format!("via point {value:?} is not \"lat,lon\""))?;
    Ok(Coord::new(
        lat.trim().parse().context("via latitude is not a number")?,
        lon.trim().parse().context("via longitude is not a number")?,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let vehicle = VehicleMode::from_str(&args.vehicle).map_err(anyhow::Error::msg)?;

    let config = WidgetConfig::from_env().context("widget configuration")?;
    let provider = YandexHttpProvider::new(&config)?;
    let mut widget = MapWidget::new(config, provider, ConsoleSurface, ConsoleUi);

    let client = reqwest::Client::new();
    widget.load_overlay(&client).await;

    for via in &args.via {
        widget.handle_map_click(parse_via(via)?);
    }
    widget.handle_input(FieldKey::From, &args.from);
    widget.handle_input(FieldKey::To, &args.to);

    if !widget.build_route(vehicle).await {
        std::process::exit(1);
    }
    Ok(())
}
