use heliodon_api::{
    geo::{Coordinate, ResolvedLocation},
    provider::{Locate, ProviderConfig},
    Error, Result,
};
use serde_derive::Deserialize;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const DEFAULT_URL: &str = "http://ip-api.com/json";

// How long to wait for the geolocation service before giving up and
// taking the fallback path.

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

// How long a successful fix stays usable without re-querying the
// service.

const MAX_FIX_AGE: Duration = Duration::from_secs(300);

// The interesting subset of the service's reply. ip-api.com reports
// `status: "fail"` (with an HTTP 200) for private or unroutable
// addresses, so the status field has to be checked, too.

#[derive(Deserialize)]
struct Reply {
    status: String,
    lat: f64,
    lon: f64,
    timezone: String,
}

pub struct Instance {
    con: reqwest::Client,
    url: String,
    cached: Option<(ResolvedLocation, Instant)>,
}

impl Instance {
    pub const NAME: &'static str = "geoip";

    pub const SUMMARY: &'static str =
        "resolves the observer's location from an IP-geolocation service";

    pub const DESCRIPTION: &'static str = include_str!("../README.md");

    fn get_cfg_url(cfg: &ProviderConfig) -> Result<String> {
        match cfg.get("url") {
            Some(toml::value::Value::String(val)) => Ok(val.to_string()),
            Some(_) => Err(Error::ConfigError(String::from(
                "'url' config parameter should be a string",
            ))),
            None => Ok(String::from(DEFAULT_URL)),
        }
    }

    // Returns the cached fix if it is younger than `MAX_FIX_AGE`.

    fn cached_fix(&self, now: Instant) -> Option<ResolvedLocation> {
        match &self.cached {
            Some((loc, at)) if now.duration_since(*at) < MAX_FIX_AGE => {
                Some(loc.clone())
            }
            _ => None,
        }
    }

    // Performs one lookup against the service. Every failure mode is
    // collapsed into `None`; the caller decides what that means.

    async fn lookup(&self) -> Option<ResolvedLocation> {
        let reply = self
            .con
            .get(&self.url)
            .send()
            .await
            .ok()?
            .json::<Reply>()
            .await
            .ok()?;

        if reply.status == "success" {
            Some(ResolvedLocation {
                coordinate: Coordinate::new(reply.lat, reply.lon),
                timezone: reply.timezone,
                was_fallback: false,
            })
        } else {
            None
        }
    }
}

impl Locate for Instance {
    fn create_instance(
        cfg: &ProviderConfig,
    ) -> impl Future<Output = Result<Box<Self>>> + Send + '_ {
        let url = Instance::get_cfg_url(cfg);

        async move {
            match reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
            {
                Ok(con) => Ok(Box::new(Instance {
                    con,
                    url: url?,
                    cached: None,
                })),
                Err(e) => Err(Error::ConfigError(format!(
                    "couldn't build client connection -- {}",
                    &e
                ))),
            }
        }
    }

    // Resolution fails open: any lookup failure yields the fallback
    // location rather than an error, so downstream logic always gets
    // a usable value. Failed lookups are not cached -- the next
    // resolve tries the service again.

    fn resolve(
        &mut self,
    ) -> impl Future<Output = Result<ResolvedLocation>> + Send + '_ {
        async move {
            if let Some(loc) = self.cached_fix(Instant::now()) {
                debug!("using cached fix");
                return Ok(loc);
            }

            match self.lookup().await {
                Some(loc) => {
                    debug!(
                        "fix: {:.4}, {:.4} ({})",
                        loc.coordinate.latitude,
                        loc.coordinate.longitude,
                        &loc.timezone
                    );
                    self.cached = Some((loc.clone(), Instant::now()));
                    Ok(loc)
                }
                None => {
                    warn!("geolocation failed ... using fallback location");
                    Ok(ResolvedLocation::fallback())
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        Instance::NAME
    }

    fn summary(&self) -> &'static str {
        Instance::SUMMARY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_instance(url: &str) -> Instance {
        Instance {
            con: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap(),
            url: String::from(url),
            cached: None,
        }
    }

    #[test]
    fn test_config() {
        let mut cfg = ProviderConfig::new();

        // Missing 'url' uses the default endpoint.

        assert_eq!(
            Instance::get_cfg_url(&cfg).unwrap(),
            String::from(DEFAULT_URL)
        );

        cfg.insert(
            String::from("url"),
            toml::value::Value::String(String::from(
                "http://localhost:9999/json",
            )),
        );
        assert_eq!(
            Instance::get_cfg_url(&cfg).unwrap(),
            String::from("http://localhost:9999/json")
        );

        // A non-string 'url' is a config error.

        cfg.insert(
            String::from("url"),
            toml::value::Value::Integer(5),
        );
        assert!(Instance::get_cfg_url(&cfg).is_err());
    }

    #[test]
    fn test_reply_parsing() {
        let reply: Reply = serde_json::from_str(
            r#"{ "status": "success", "lat": 48.1351, "lon": 11.582,
                 "timezone": "Europe/Berlin", "query": "1.2.3.4" }"#,
        )
        .unwrap();

        assert_eq!(reply.status, "success");
        assert_eq!(reply.lat, 48.1351);
        assert_eq!(reply.lon, 11.582);
        assert_eq!(reply.timezone, "Europe/Berlin");

        // A reply missing required fields doesn't parse.

        assert!(serde_json::from_str::<Reply>(
            r#"{ "status": "fail", "query": "10.0.0.1" }"#
        )
        .is_err());
    }

    #[test]
    fn test_fix_cache() {
        let mut inst = mk_instance(DEFAULT_URL);
        let now = Instant::now();

        // No cache entry, no fix.

        assert_eq!(inst.cached_fix(now), None);

        // A fresh fix is returned as-is.

        let fix = ResolvedLocation {
            coordinate: Coordinate::new(21.0285, 105.8542),
            timezone: String::from("Asia/Bangkok"),
            was_fallback: false,
        };

        inst.cached = Some((fix.clone(), now));
        assert_eq!(inst.cached_fix(now), Some(fix.clone()));
        assert_eq!(
            inst.cached_fix(now + Duration::from_secs(299)),
            Some(fix.clone())
        );

        // At or past the maximum age, the fix is stale.

        assert_eq!(inst.cached_fix(now + MAX_FIX_AGE), None);
        assert_eq!(
            inst.cached_fix(now + Duration::from_secs(3_600)),
            None
        );
    }

    // The fallback path must hand back the advertised literals; the
    // UI treats them as "Boston until told otherwise".

    #[tokio::test]
    async fn test_failed_lookup_falls_back() {
        // Nothing listens on this port, so the lookup fails fast and
        // the resolve must still succeed with the fallback location.

        let mut inst = mk_instance("http://127.0.0.1:9/json");
        let loc = inst.resolve().await.unwrap();

        assert_eq!(loc.coordinate.latitude, 42.3601);
        assert_eq!(loc.coordinate.longitude, -71.0589);
        assert_eq!(loc.timezone, "America/New_York");
        assert!(loc.was_fallback);

        // The fallback is never cached.

        assert!(inst.cached.is_none());
    }
}
