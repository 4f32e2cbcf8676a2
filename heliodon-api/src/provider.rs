//! Defines the interface location providers implement so `heliodond`
//! can resolve the observer's position.

use std::future::Future;

use crate::types::geo::ResolvedLocation;
use crate::Result;

/// Represents how configuration information is given to a provider.
/// Since each provider can have different requirements, the config
/// structure needs to be as general as possible: a map with `String`
/// keys and `toml::Value` values, taken straight from the provider's
/// section of the configuration file.

pub type ProviderConfig = toml::value::Table;

/// All location providers implement the `Locate` trait.
///
/// Providers are expected to *fail open*: when a real fix can't be
/// obtained, `resolve` should log a warning and return
/// [`ResolvedLocation::fallback`] rather than an error. The `Err`
/// branch exists for providers that genuinely cannot produce any
/// location at all (a misconfiguration, for instance); the daemon
/// reports such an error to its subscribers and does not start
/// polling.

pub trait Locate: Send {
    /// Creates an instance of the provider from its section of the
    /// configuration file. Implementations should validate the
    /// parameters here and return `Error::ConfigError` on bad input.
    fn create_instance(
        cfg: &ProviderConfig,
    ) -> impl Future<Output = Result<Box<Self>>> + Send + '_
    where
        Self: Sized;

    /// Resolves the observer's location. Called once per monitor
    /// start, not per tick; implementations may cache a recent fix.
    fn resolve(
        &mut self,
    ) -> impl Future<Output = Result<ResolvedLocation>> + Send + '_;

    /// The name of the provider, as used in the configuration file.
    /// This should be relatively short, but needs to be unique across
    /// all providers.
    fn name(&self) -> &'static str;

    /// A short, one-line summary of the provider.
    fn summary(&self) -> &'static str;
}
