use heliodon_api::{Error, Result};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

mod config;
mod data;
mod location;
mod scene;
mod sun;

// Initializes the application. It determines the configuration and
// sets up the logger. It returns `None` if the program should exit
// (because `--print-config` was given, for instance.)

async fn init_app() -> Option<config::Config> {
    let cfg = config::get().await?;

    // Initialize the log system. The max log level is determined by
    // the user (either through the config file or the command line.)

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(cfg.get_log_level())
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Unable to set global default subscriber");
    Some(cfg)
}

async fn build_model(
    cfg: &config::Config,
) -> Result<scene::SceneModel> {
    let resolution = scene::textures::Resolution::from_config(
        &cfg.globe.resolution,
    )
    .ok_or_else(|| {
        Error::ConfigError(format!(
            "unknown texture resolution '{}'",
            &cfg.globe.resolution
        ))
    })?;
    let textures = scene::textures::select(
        Path::new(&cfg.globe.textures),
        resolution,
    )
    .await;

    let countries = if cfg.scene.boundaries {
        let con = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| {
                Error::OperationError(format!(
                    "couldn't build client connection -- {}",
                    &e
                ))
            })?;
        let url = cfg
            .scene
            .boundaries_url
            .as_deref()
            .unwrap_or(scene::boundaries::DEFAULT_URL);

        scene::boundaries::fetch(&con, url).await
    } else {
        vec![]
    };

    Ok(scene::model(cfg.globe.style, countries, textures))
}

// Follows the render-input feed, logging day/night transitions, until
// the feed dies or the process is interrupted.

async fn follow(
    mut inputs: tokio::sync::watch::Receiver<scene::Inputs>,
) -> Result<()> {
    let mut was_day = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted ... shutting down");
                break Ok(());
            }

            changed = inputs.changed() => {
                if changed.is_err() {
                    break Ok(());
                }

                let current = inputs.borrow_and_update().clone();

                if let Some(detail) = &current.error {
                    break Err(Error::OperationError(detail.clone()));
                }

                if !current.loading && was_day != Some(current.is_day)
                {
                    info!(
                        "the observer is on the {} side (intensity {:.2})",
                        if current.is_day { "day" } else { "night" },
                        current.uniforms.sun_intensity
                    );
                    was_day = Some(current.is_day);
                }
            }
        }
    }
}

async fn run(cfg: config::Config) -> Result<()> {
    let model = build_model(&cfg).await?;

    info!(
        "scene ready: {} markers, {} arcs, {} country boundaries, {} textures",
        model.markers.len(),
        model.arcs.len(),
        model.countries.len(),
        if model.textures.high_detail() {
            "full"
        } else if model.textures.fallback.is_some() {
            "legacy"
        } else {
            "flat-color"
        }
    );

    if model.style.mode().is_none() {
        info!("flat globe style ... the lighting pipeline is off");

        let _ = tokio::signal::ctrl_c().await;
        return Ok(());
    }

    let (monitor, sun_rx) =
        location::create_monitor(&cfg.location).await?;
    let (refresher, stylized_rx) = scene::shading::create_task();
    let (feed, inputs_rx) =
        scene::create_task(model.style, sun_rx, stylized_rx);

    let result = follow(inputs_rx).await;

    feed.stop();
    refresher.stop();
    monitor.stop();

    result
}

#[tokio::main]
async fn main() {
    if let Some(cfg) = init_app().await {
        if let Err(e) = run(cfg).await {
            error!("{}", &e);
            std::process::exit(1);
        }
    }
}
