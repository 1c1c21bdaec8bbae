use route_sequencer::{GeoPoint, Stop, StopStatus};

/// Warehouse the drivers load at.
pub const DEPOT: GeoPoint = GeoPoint::new(36.0614, -115.0631);

/// `(client, lat, lng)` for a day's deliveries spread across the valley.
pub const CLIENTS: &[(&str, f64, f64)] = &[
    ("Hard Rock Cafe", 36.1041592, -115.1722166),
    ("Islander's Grill", 36.0335058, -114.9856162),
    ("Sinatra", 36.1300035, -115.1654850),
    ("Roberto's Taco Shop", 36.1452953, -115.0478347),
    ("Bootlegger Bistro", 36.0492047, -115.1715744),
    ("Naga", 36.0137634, -114.9928676),
    ("Brooklyn Bowl", 36.1175388, -115.1695094),
    ("Monarca Mexican Restaurant", 36.1440711, -115.0634197),
    ("Mikos Izakaya", 36.0429503, -115.1527627),
    ("RibCage", 35.9949754, -115.0999810),
    ("Rao's", 36.1163982, -115.1763053),
    ("Beers and Bets", 36.1428945, -115.1573836),
];

/// Builder for stops with sensible defaults.
#[derive(Clone, Debug)]
pub struct TestStop {
    stop: Stop,
}

impl TestStop {
    pub fn new(id: &str) -> Self {
        Self {
            stop: Stop::new(id, "route-1", GeoPoint::new(36.1, -115.1)),
        }
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.stop.location = GeoPoint::new(lat, lng);
        self
    }

    pub fn order(mut self, stop_order: u32) -> Self {
        self.stop.stop_order = stop_order;
        self
    }

    pub fn status(mut self, status: StopStatus) -> Self {
        self.stop.status = status;
        self
    }

    pub fn client(mut self, name: &str) -> Self {
        self.stop.client_name = name.to_string();
        self
    }

    pub fn build(self) -> Stop {
        self.stop
    }
}

/// One stop per client, in dispatcher order.
pub fn client_stops() -> Vec<Stop> {
    CLIENTS
        .iter()
        .enumerate()
        .map(|(i, (name, lat, lng))| {
            TestStop::new(&format!("stop-{}", i + 1))
                .at(*lat, *lng)
                .order(i as u32 + 1)
                .client(name)
                .build()
        })
        .collect()
}

pub fn ids(stops: &[Stop]) -> Vec<&str> {
    stops.iter().map(|stop| stop.id.as_str()).collect()
}
