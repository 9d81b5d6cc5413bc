use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snip_core::ClickMetadata;

/// Locations used when simulating clicks from anywhere in the world.
pub const GLOBAL_LOCATIONS: &[&str] = &[
    "New York, USA",
    "London, UK",
    "Tokyo, Japan",
    "Sydney, Australia",
    "Toronto, Canada",
    "Berlin, Germany",
    "Mumbai, India",
    "São Paulo, Brazil",
];

/// Locations used when simulating clicks from a single region.
pub const REGIONAL_LOCATIONS: &[&str] = &[
    "Pune, India",
    "Mumbai, India",
    "Jhansi, India",
    "Bengaluru, India",
];

const DEFAULT_CLIENT: &str = concat!("snip/", env!("CARGO_PKG_VERSION"));

/// Supplies the location, address and client of a click.
pub trait MetadataProvider: Send + Sync + 'static {
    fn metadata(&self) -> ClickMetadata;
}

impl<M: MetadataProvider> MetadataProvider for std::sync::Arc<M> {
    fn metadata(&self) -> ClickMetadata {
        (**self).metadata()
    }
}

/// Random plausible metadata for demo and simulated clicks.
///
/// Picks a location uniformly from its list and a private
/// `192.168.x.y` address.
pub struct SimulatedMetadata {
    rng: Mutex<StdRng>,
    locations: Vec<String>,
    client: String,
}

impl SimulatedMetadata {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_os_rng())
    }

    /// Deterministic variant for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            locations: GLOBAL_LOCATIONS.iter().map(|s| s.to_string()).collect(),
            client: DEFAULT_CLIENT.to_string(),
        }
    }

    /// Replaces the location list. An empty list keeps the current one.
    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let locations: Vec<String> = locations.into_iter().map(Into::into).collect();
        if !locations.is_empty() {
            self.locations = locations;
        }
        self
    }

    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }
}

impl Default for SimulatedMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataProvider for SimulatedMetadata {
    fn metadata(&self) -> ClickMetadata {
        let mut rng = self.rng.lock();
        let location = &self.locations[rng.random_range(0..self.locations.len())];
        let address = format!(
            "192.168.{}.{}",
            rng.random_range(0..255u8),
            rng.random_range(0..255u8)
        );
        ClickMetadata::new(location.as_str(), address, &self.client)
    }
}

/// Always returns the same metadata.
#[derive(Debug, Clone)]
pub struct FixedMetadata(ClickMetadata);

impl FixedMetadata {
    pub fn new(location: &str, network_address: &str, client: &str) -> Self {
        Self(ClickMetadata::new(location, network_address, client))
    }
}

impl MetadataProvider for FixedMetadata {
    fn metadata(&self) -> ClickMetadata {
        self.0.clone()
    }
}
