use typed_builder::TypedBuilder;

/// Tunables of a [`ShortenerService`](crate::ShortenerService).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// How many codes are tried before a create gives up. Values below 1
    /// are treated as 1.
    #[builder(default = 5)]
    pub max_attempts: u32,
    /// Upper bound for a requested page size; larger requests are clamped.
    #[builder(default = 100)]
    pub max_page_size: u32,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}
