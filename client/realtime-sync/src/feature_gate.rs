//! Process-wide feature flags, read once at startup
use crate::error::ConfigError;
use serde::Deserialize;
use tracing::info;

const ENV_PREFIX: &str = "REWARDS_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    pub notifications_enabled: bool,
    pub real_time_updates_enabled: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            real_time_updates_enabled: true,
        }
    }
}

/// Raw flag sources as they appear in the environment
#[derive(Debug, Deserialize)]
struct FlagSource {
    #[serde(default = "default_enabled")]
    feature_notifications: bool,

    #[serde(default = "default_enabled")]
    feature_real_time_updates: bool,

    /// Fallback identity mode; realtime has no server to talk to
    #[serde(default)]
    demo_mode: bool,
}

fn default_enabled() -> bool {
    true
}

impl From<FlagSource> for FeatureFlags {
    fn from(source: FlagSource) -> Self {
        Self {
            notifications_enabled: source.feature_notifications,
            real_time_updates_enabled: source.feature_real_time_updates && !source.demo_mode,
        }
    }
}

/// Immutable snapshot of [`FeatureFlags`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureGate {
    flags: FeatureFlags,
}

impl FeatureGate {
    pub fn new(flags: FeatureFlags) -> Self {
        Self { flags }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let source: FlagSource = envy::prefixed(ENV_PREFIX).from_env()?;
        Ok(Self::loaded(source))
    }

    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let source: FlagSource = envy::prefixed(ENV_PREFIX).from_iter(pairs)?;
        Ok(Self::loaded(source))
    }

    fn loaded(source: FlagSource) -> Self {
        let demo_mode = source.demo_mode;
        let flags = FeatureFlags::from(source);

        info!(
            notifications = flags.notifications_enabled,
            real_time_updates = flags.real_time_updates_enabled,
            demo_mode,
            "Feature flags loaded"
        );

        Self { flags }
    }

    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }

    pub fn realtime_enabled(&self) -> bool {
        self.flags.real_time_updates_enabled
    }

    pub fn notifications_enabled(&self) -> bool {
        self.flags.notifications_enabled
    }
}
