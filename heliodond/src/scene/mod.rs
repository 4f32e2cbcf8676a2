//! Builds everything a renderer needs to draw the globe: the static
//! model (markers, arc routes, boundaries, textures) and a live feed
//! of lighting inputs derived from the sun monitor.

use glam::DVec3;
use heliodon_api::{geo, solar};
use palette::Srgb;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{info, info_span};
use tracing_futures::Instrument;

use crate::config::Style;
use crate::data;
use crate::sun::{State, SunState};

pub mod boundaries;
pub mod shading;
pub mod textures;

// Arc dash styling, shared by every style.

const ARC_DASH_LENGTH: f64 = 0.4;
const ARC_DASH_GAP: f64 = 0.2;
const ARC_DASH_ANIMATE_MS: u32 = 1500;

const CYAN: Srgb<u8> = Srgb::new(0x00, 0xff, 0xff);
const MAGENTA: Srgb<u8> = Srgb::new(0xff, 0x00, 0xff);
const CORAL: Srgb<u8> = Srgb::new(0xff, 0x6b, 0x6b);
const TEAL: Srgb<u8> = Srgb::new(0x4e, 0xcd, 0xc4);
const SKY: Srgb<u8> = Srgb::new(0x45, 0xb7, 0xd1);
const SAGE: Srgb<u8> = Srgb::new(0x96, 0xce, 0xb4);
const DAY_SKY: Srgb<u8> = Srgb::new(0x87, 0xce, 0xeb);
const MIDNIGHT: Srgb<u8> = Srgb::new(0x19, 0x19, 0x70);
const PINK: Srgb<u8> = Srgb::new(0xff, 0xb6, 0xc1);

/// A place marker, positioned on the unit globe.

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub location: &'static data::Location,
    /// Cartesian position in the renderer's frame, pushed out past
    /// the surface by `altitude`.
    pub position: DVec3,
    pub altitude: f64,
    pub size: f64,
    pub color: Srgb<u8>,
}

/// An animated travel arc between two of the marked places.

#[derive(Debug, Clone, PartialEq)]
pub struct ArcRoute {
    pub from: &'static str,
    pub to: &'static str,
    /// Great-circle samples as lat/lng degrees.
    pub path: Vec<(f64, f64)>,
    /// Gradient endpoints, start to end.
    pub colors: [Srgb<u8>; 2],
    pub stroke: f64,
    pub dash_length: f64,
    pub dash_gap: f64,
    pub dash_animate_ms: u32,
}

/// The atmosphere halo around the globe.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atmosphere {
    pub color: Srgb<u8>,
    pub altitude: f64,
}

fn marker_style(style: Style) -> (f64, f64, Srgb<u8>) {
    match style {
        Style::Flat => (0.01, 0.3, CYAN),
        Style::Realistic => (0.01, 0.2, CYAN),
        Style::Stylized => (0.03, 0.48, CORAL),
    }
}

/// Markers for every known location, styled for `style`.

pub fn markers(style: Style) -> Vec<Marker> {
    let (altitude, size, color) = marker_style(style);

    data::LOCATIONS
        .iter()
        .map(|loc| {
            let (lat, lng) = loc.coordinates;

            Marker {
                location: loc,
                position: geo::to_scene(lat, lng, 1.0 + altitude),
                altitude,
                size,
                color,
            }
        })
        .collect()
}

const ARC_SEGMENTS: usize = 100;

fn route(
    from: &'static data::Location,
    to: &'static data::Location,
    colors: [Srgb<u8>; 2],
    stroke: f64,
) -> ArcRoute {
    let (lat1, lng1) = from.coordinates;
    let (lat2, lng2) = to.coordinates;

    ArcRoute {
        from: from.id,
        to: to.id,
        path: geo::great_circle_path(
            geo::Coordinate::new(lat1, lng1),
            geo::Coordinate::new(lat2, lng2),
            ARC_SEGMENTS,
        ),
        colors,
        stroke,
        dash_length: ARC_DASH_LENGTH,
        dash_gap: ARC_DASH_GAP,
        dash_animate_ms: ARC_DASH_ANIMATE_MS,
    }
}

/// The career path drawn as arcs: Hanoi to Munich to Boston.

pub fn arc_routes(style: Style) -> Vec<ArcRoute> {
    let [hanoi, munich, boston] = [
        &data::LOCATIONS[2],
        &data::LOCATIONS[1],
        &data::LOCATIONS[0],
    ];

    match style {
        Style::Flat | Style::Realistic => vec![
            route(hanoi, munich, [CYAN, MAGENTA], 0.5),
            route(munich, boston, [MAGENTA, CYAN], 0.5),
        ],
        Style::Stylized => vec![
            route(hanoi, munich, [CORAL, TEAL], 3.0),
            route(munich, boston, [SKY, SAGE], 3.0),
        ],
    }
}

/// The atmosphere for a style. Only the realistic style reacts to
/// day/night.

pub fn atmosphere(style: Style, is_day: bool) -> Atmosphere {
    match style {
        Style::Flat => Atmosphere {
            color: CYAN,
            altitude: 0.15,
        },
        Style::Realistic => Atmosphere {
            color: if is_day { DAY_SKY } else { MIDNIGHT },
            altitude: 0.12,
        },
        Style::Stylized => Atmosphere {
            color: PINK,
            altitude: 0.15,
        },
    }
}

/// Everything static about the scene, built once at startup.

pub struct SceneModel {
    pub style: Style,
    pub markers: Vec<Marker>,
    pub arcs: Vec<ArcRoute>,
    pub countries: Vec<boundaries::Country>,
    pub textures: textures::TextureSet,
}

pub fn model(
    style: Style,
    countries: Vec<boundaries::Country>,
    textures: textures::TextureSet,
) -> SceneModel {
    SceneModel {
        style,
        markers: markers(style),
        arcs: arc_routes(style),
        countries,
        textures,
    }
}

/// The per-frame inputs a renderer consumes: the current uniform
/// block plus the bits of sun state that drive non-shader visuals.

#[derive(Debug, Clone, PartialEq)]
pub struct RenderInputs {
    pub uniforms: shading::ShaderUniforms,
    pub atmosphere: Atmosphere,
    pub is_day: bool,
    pub loading: bool,
    pub error: Option<String>,
}

pub type Inputs = Arc<RenderInputs>;

fn compose(
    style: Style,
    state: Option<&SunState>,
    stylized: &shading::ShaderUniforms,
) -> Inputs {
    let (is_day, loading, error) = match state {
        Some(s) => (s.is_day, s.loading, s.error.clone()),
        None => (true, true, None),
    };

    let uniforms = match style.mode() {
        Some(solar::Mode::Stylized) => *stylized,
        _ => match state {
            Some(s) => {
                shading::from_position(s.position.as_ref(), s.intensity)
            }
            None => shading::ShaderUniforms::default(),
        },
    };

    Arc::new(RenderInputs {
        uniforms,
        atmosphere: atmosphere(style, is_day),
        is_day,
        loading,
        error,
    })
}

/// Owns the feed task. Dropping it stops the task.

pub struct Feed {
    task: JoinHandle<()>,
}

impl Feed {
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for Feed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    style: Style,
    mut sun: BroadcastStream<State>,
    mut stylized: watch::Receiver<shading::ShaderUniforms>,
    tx: watch::Sender<Inputs>,
) {
    let mut last: Option<State> = None;
    let mut stylized_alive = style.mode() == Some(solar::Mode::Stylized);

    loop {
        tokio::select! {
            next = sun.next() => match next {
                Some(Ok(state)) => {
                    let inputs = compose(
                        style,
                        Some(&state),
                        &stylized.borrow().clone(),
                    );

                    last = Some(state);
                    if tx.send(inputs).is_err() {
                        info!("no remaining clients ... terminating");
                        break;
                    }
                }

                // Falling behind only costs intermediate snapshots;
                // the next one is current again.
                Some(Err(_)) => continue,

                None => break,
            },

            changed = stylized.changed(), if stylized_alive => {
                match changed {
                    Ok(()) => {
                        let inputs = compose(
                            style,
                            last.as_deref(),
                            &stylized.borrow_and_update().clone(),
                        );

                        if tx.send(inputs).is_err() {
                            info!(
                                "no remaining clients ... terminating"
                            );
                            break;
                        }
                    }
                    Err(_) => {
                        stylized_alive = false;
                    }
                }
            }
        }
    }
}

/// Starts the render-input feed. The returned channel always holds a
/// value; until the first sun state arrives it reports loading with
/// default lighting.

pub fn create_task(
    style: Style,
    sun: tokio::sync::broadcast::Receiver<State>,
    stylized: watch::Receiver<shading::ShaderUniforms>,
) -> (Feed, watch::Receiver<Inputs>) {
    let initial = compose(style, None, &stylized.borrow().clone());
    let (tx, rx) = watch::channel(initial);

    let task = tokio::spawn(
        run(style, BroadcastStream::new(sun), stylized, tx)
            .instrument(info_span!("scene")),
    );

    (Feed { task }, rx)
}
