// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::boxed_local,
    clippy::let_unit_value,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::bind_instead_of_map,
    clippy::vec_box,
    clippy::while_let_loop,
    clippy::useless_asref,
    clippy::repeat_once,
    clippy::deref_addrof,
    clippy::suspicious_map,
    clippy::arc_with_non_send_sync,
    clippy::single_char_pattern,
    clippy::for_kv_map,
    clippy::let_and_return,
    clippy::iter_nth,
    clippy::iter_cloned_collect,
    clippy::bytes_nth,
    clippy::deprecated_clippy_cfg_attr,
    clippy::match_result_ok,
    clippy::cmp_owned,
    clippy::cmp_null,
    clippy::op_ref
)]

pub mod config;
pub mod debounce;
pub mod errors;
pub mod overlay;
pub mod provider;
pub mod route_sync;
pub mod suggest;
pub mod ui;
pub mod widget;

#[cfg(test)]
pub mod test_support;

use serde::Deserialize;
use serde::Serialize;

/// WGS-84 coordinate pair, latitude first (the order the routing provider
/// uses on the wire).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Coord { lat, lon }
    }
}

impl From<geo_types::Point<f64>> for Coord {
    fn from(point: geo_types::Point<f64>) -> Self {
        Coord {
            lat: point.y(),
            lon: point.x(),
        }
    }
}

impl From<Coord> for geo_types::Point<f64> {
    fn from(coord: Coord) -> Self {
        geo_types::Point::new(coord.lon, coord.lat)
    }
}

/// The two address inputs of the widget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKey {
    From,
    To,
}

impl FieldKey {
    pub fn human_name(&self) -> &'static str {
        match self {
            FieldKey::From => "departure",
            FieldKey::To => "arrival",
        }
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.human_name())
    }
}

/// Vehicle selection from the mode radio group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleMode {
    Car,
    Truck40,
    TruckHeavy,
}

impl std::str::FromStr for VehicleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "car" => Ok(VehicleMode::Car),
            "truck40" | "truck40kg" => Ok(VehicleMode::Truck40),
            "truckheavy" => Ok(VehicleMode::TruckHeavy),
            other => Err(format!("unknown vehicle mode {other:?}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Auto,
    Truck,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Auto => "auto",
            TravelMode::Truck => "truck",
        }
    }
}

/// Options forwarded to the provider's route builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RoutingOptions {
    pub mode: TravelMode,
    /// Gross vehicle weight in kilograms, truck modes only.
    pub weight: Option<u32>,
}

impl VehicleMode {
    pub fn routing_options(&self) -> RoutingOptions {
        match self {
            VehicleMode::Car => RoutingOptions {
                mode: TravelMode::Auto,
                weight: None,
            },
            VehicleMode::Truck40 => RoutingOptions {
                mode: TravelMode::Truck,
                weight: Some(40_000),
            },
            VehicleMode::TruckHeavy => RoutingOptions {
                mode: TravelMode::Truck,
                weight: Some(55_000),
            },
        }
    }
}

/// Fallback distance formatting for providers that only return raw metres.
pub fn fmt_distance(metres: f64) -> String {
    if metres >= 1000.0 {
        format!("{:.1} km", metres / 1000.0)
    } else {
        format!("{} m", metres.round() as i64)
    }
}

/// Fallback duration formatting for providers that only return raw seconds.
pub fn fmt_duration(seconds: f64) -> String {
    let total_minutes = (seconds / 60.0).round() as i64;
    if total_minutes >= 60 {
        format!("{} h {:02} min", total_minutes / 60, total_minutes % 60)
    } else {
        format!("{} min", total_minutes.max(1))
    }
}
