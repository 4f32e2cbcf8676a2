//! Selects and creates the location provider named in the
//! configuration, and houses the built-in `fixed` provider for
//! installations that know where they are.

use heliodon_api::{
    geo::{Coordinate, ResolvedLocation},
    provider::{Locate, ProviderConfig},
    Error, Result,
};
use std::future::Future;
use tokio::sync::broadcast;

use crate::config;
use crate::sun;

/// A provider that always reports the configured coordinate. It never
/// falls back and never fails once created.

pub struct FixedInstance {
    loc: ResolvedLocation,
}

impl FixedInstance {
    pub const NAME: &'static str = "fixed";

    pub const SUMMARY: &'static str =
        "reports a coordinate taken from the configuration";

    fn get_cfg_angle(
        cfg: &ProviderConfig,
        key: &str,
        range: (f64, f64),
    ) -> Result<f64> {
        let val = match cfg.get(key) {
            Some(toml::value::Value::Float(v)) => *v,
            Some(toml::value::Value::Integer(v)) => *v as f64,
            Some(_) => {
                return Err(Error::ConfigError(format!(
                    "'{}' config parameter should be a number",
                    key
                )))
            }
            None => {
                return Err(Error::ConfigError(format!(
                    "missing '{}' config parameter",
                    key
                )))
            }
        };

        // A mistyped coordinate is caught here rather than silently
        // clamped; the operator wrote it down on purpose.

        if (range.0..=range.1).contains(&val) {
            Ok(val)
        } else {
            Err(Error::ConfigError(format!(
                "'{}' must lie in [{}, {}]",
                key, range.0, range.1
            )))
        }
    }

    fn get_cfg_timezone(cfg: &ProviderConfig) -> Result<String> {
        match cfg.get("timezone") {
            Some(toml::value::Value::String(v)) => Ok(v.to_string()),
            Some(_) => Err(Error::ConfigError(String::from(
                "'timezone' config parameter should be a string",
            ))),
            None => Ok(String::from("UTC")),
        }
    }
}

impl Locate for FixedInstance {
    fn create_instance(
        cfg: &ProviderConfig,
    ) -> impl Future<Output = Result<Box<Self>>> + Send + '_ {
        async move {
            let latitude =
                FixedInstance::get_cfg_angle(cfg, "latitude", (-90.0, 90.0))?;
            let longitude = FixedInstance::get_cfg_angle(
                cfg,
                "longitude",
                (-180.0, 180.0),
            )?;
            let timezone = FixedInstance::get_cfg_timezone(cfg)?;

            Ok(Box::new(FixedInstance {
                loc: ResolvedLocation {
                    coordinate: Coordinate::new(latitude, longitude),
                    timezone,
                    was_fallback: false,
                },
            }))
        }
    }

    fn resolve(
        &mut self,
    ) -> impl Future<Output = Result<ResolvedLocation>> + Send + '_ {
        async move { Ok(self.loc.clone()) }
    }

    fn name(&self) -> &'static str {
        FixedInstance::NAME
    }

    fn summary(&self) -> &'static str {
        FixedInstance::SUMMARY
    }
}

/// Creates the configured provider and starts the sun monitor on it.

pub async fn create_monitor(
    cfg: &config::LocationConfig,
) -> Result<(sun::Monitor, broadcast::Receiver<sun::State>)> {
    match cfg.provider.as_str() {
        FixedInstance::NAME => {
            let provider =
                FixedInstance::create_instance(&cfg.cfg).await?;

            Ok(sun::create_task(provider))
        }
        heliodon_loc_geoip::Instance::NAME => {
            let provider =
                heliodon_loc_geoip::Instance::create_instance(&cfg.cfg)
                    .await?;

            Ok(sun::create_task(provider))
        }
        name => Err(Error::ConfigError(format!(
            "unknown location provider '{}'",
            name
        ))),
    }
}
