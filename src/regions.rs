//! Monitoring region registry.
//!
//! Defines the seismically active regions this service reports on, as
//! latitude/longitude boxes. This is the single source of truth for region
//! names; other modules should look regions up here rather than hardcoding
//! bounds.

// ---------------------------------------------------------------------------
// Region metadata
// ---------------------------------------------------------------------------

/// A monitored region, bounded by an inclusive latitude/longitude box.
pub struct Region {
    pub name: &'static str,
    /// Human-readable description of why the region is watched.
    pub description: &'static str,
    /// Southern and northern bounds, in degrees.
    pub latitude_range: (f64, f64),
    /// Western and eastern bounds, in degrees.
    pub longitude_range: (f64, f64),
}

impl Region {
    /// Returns `true` if the coordinate lies inside the box, edges included.
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        let (south, north) = self.latitude_range;
        let (west, east) = self.longitude_range;
        (south..=north).contains(&latitude) && (west..=east).contains(&longitude)
    }
}

/// All monitored regions.
pub static REGION_REGISTRY: &[Region] = &[
    Region {
        name: "Pacific Ring of Fire",
        description: "Western Pacific subduction zones from Indonesia through \
                      Japan to the Kamchatka Peninsula.",
        latitude_range: (0.0, 60.0),
        longitude_range: (100.0, 180.0),
    },
    Region {
        name: "Mediterranean",
        description: "African-Eurasian plate boundary: Italy, Greece, Turkey \
                      and the Aegean arc.",
        latitude_range: (30.0, 45.0),
        longitude_range: (-10.0, 45.0),
    },
    Region {
        name: "Mid-Atlantic Ridge",
        description: "Divergent boundary running down the Atlantic, including \
                      the Azores triple junction.",
        latitude_range: (-60.0, 60.0),
        longitude_range: (-45.0, 0.0),
    },
];

/// Looks up a region by name. Returns `None` if not found.
pub fn find_region(name: &str) -> Option<&'static Region> {
    REGION_REGISTRY.iter().find(|r| r.name == name)
}

/// Returns every region whose box contains the coordinate, in registry
/// order.
pub fn regions_containing(latitude: f64, longitude: f64) -> Vec<&'static Region> {
    REGION_REGISTRY
        .iter()
        .filter(|r| r.contains(latitude, longitude))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
