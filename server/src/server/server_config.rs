use std::default::Default;

/// Update ranges, in tiles, used when resolving who hears about a change
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeltaConfig {
    /// Range given to a new session that does not ask for one
    pub default_update_range: i32,
    /// Radius of the spatial query around a changed entity. No session may
    /// see further than this.
    pub max_update_range: i32,
    pub min_update_range: i32,
}

impl DeltaConfig {
    pub fn clamp_update_range(&self, range: i32) -> i32 {
        range.clamp(self.min_update_range, self.max_update_range)
    }
}

impl Default for DeltaConfig {
    fn default() -> Self {
        Self {
            default_update_range: 18,
            max_update_range: 24,
            min_update_range: 5,
        }
    }
}

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Ranges used by the delta processor
    pub delta: DeltaConfig,
    /// Whether property summaries are derived and broadcast at all
    pub properties_enabled: bool,
    /// Edge length of one square cell of the default visibility index
    pub sector_size: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            delta: DeltaConfig::default(),
            properties_enabled: true,
            sector_size: 16,
        }
    }
}
