use typed_builder::TypedBuilder;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5174";

/// Tunables of the [`Shortener`](crate::Shortener).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// Origin that short URLs are displayed under, as `<base>/s/<code>`.
    #[builder(default = DEFAULT_BASE_URL.to_string(), setter(into))]
    pub base_url: String,
    /// How many clicks the statistics summary lists as recent.
    #[builder(default = 10)]
    pub recent_clicks_limit: usize,
    /// How many locations the statistics summary ranks.
    #[builder(default = 5)]
    pub top_locations: usize,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}
