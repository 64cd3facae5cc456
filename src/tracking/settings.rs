//! Tracking configuration.

/// Configuration consumed by the tracking engine.
///
/// Settings are fixed per tracking session: the root wrapper captures them at
/// `track` time and every child wrapper inherits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingSettings {
    /// Wrap complex-typed properties in child trackers. When false, complex values are
    /// still written through the ledger but get no wrapper of their own.
    pub track_complex_properties: bool,
    /// Wrap collection-typed properties in collection trackers.
    pub track_collection_properties: bool,
    /// Wrap collection items at collection-wrap time rather than on first touch.
    pub wrap_items_eagerly: bool,
}

impl TrackingSettings {
    /// Creates the default settings (everything enabled, eager item wrapping).
    #[must_use]
    pub fn new() -> Self {
        Self {
            track_complex_properties: true,
            track_collection_properties: true,
            wrap_items_eagerly: true,
        }
    }
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self::new()
    }
}
