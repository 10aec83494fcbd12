use tracing::debug;

use crate::config::LocationConfig;
use crate::matcher::normalize;
use crate::schema::Coordinates;

/// Brand keywords checked in order; the first hit names the search.
const BRANDS: [(&[&str], &str); 5] = [
    (&["iphone", "apple"], "Apple"),
    (&["samsung"], "Samsung"),
    (&["dell"], "Dell"),
    (&["hp"], "HP"),
    (&["lenovo"], "Lenovo"),
];

const GENERIC_BRAND: &str = "computer";

/// Phrases in a solution that warrant offering the repair-center finder.
const REPAIR_HINTS: [&str; 3] = ["hardware", "professional", "repair center"];

/// Phrase in a solution that warrants asking for the user's location.
const LOCATION_HINT: &str = "service center near me";

/// Why a location could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("location access denied")]
    Denied,

    #[error("location unsupported: {0}")]
    Unsupported(String),
}

/// Source of the user's position.
pub trait LocationProvider: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &'static str;

    fn locate(&self) -> Result<Coordinates, LocationError>;
}

/// Coordinates supplied through config or command-line flags.
pub struct ConfiguredLocation {
    coordinates: Option<Coordinates>,
}

impl ConfiguredLocation {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }

    pub fn from_config(config: &LocationConfig) -> Self {
        Self::new(config.shared_coordinates())
    }
}

impl LocationProvider for ConfiguredLocation {
    fn name(&self) -> &'static str {
        "Configured"
    }

    fn locate(&self) -> Result<Coordinates, LocationError> {
        self.coordinates
            .ok_or_else(|| LocationError::Unsupported("no coordinates configured".to_string()))
    }
}

/// Provider for when the user declined to share a position.
pub struct DeniedLocation;

impl LocationProvider for DeniedLocation {
    fn name(&self) -> &'static str {
        "Denied"
    }

    fn locate(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Denied)
    }
}

/// Ask a provider for coordinates. Failures are not surfaced; the caller
/// falls back to a search without location.
pub fn resolve_location(provider: &dyn LocationProvider) -> Option<Coordinates> {
    match provider.locate() {
        Ok(coords) => Some(coords),
        Err(e) => {
            debug!(provider = provider.name(), error = %e, "proceeding without location");
            None
        }
    }
}

pub fn detect_brand(problem: &str) -> &'static str {
    let lower = normalize(problem);
    BRANDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, brand)| *brand)
        .unwrap_or(GENERIC_BRAND)
}

/// Map or web search URL for service centers matching the problem's device brand.
pub fn repair_search_url(problem: &str, location: Option<Coordinates>, zoom: u8) -> String {
    let brand = detect_brand(problem);
    match location {
        Some(c) => format!(
            "https://www.google.com/maps/search/{brand}+service+center/@{},{},{zoom}z",
            c.latitude, c.longitude
        ),
        None => format!("https://www.google.com/search?q={brand}+service+center+near+me"),
    }
}

/// Whether the solution suggests a repair shop may be needed.
pub fn offers_repair_centers(solution: &str) -> bool {
    REPAIR_HINTS.iter().any(|h| solution.contains(h))
}

/// Whether the solution points the user at nearby service centers.
pub fn mentions_service_center(solution: &str) -> bool {
    solution.contains(LOCATION_HINT)
}
