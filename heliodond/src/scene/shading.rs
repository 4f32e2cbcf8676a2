//! Builds the uniform block the globe shaders consume and keeps the
//! stylized sun direction fresh on a slow timer.

use chrono::{DateTime, Utc};
use glam::Vec3;
use heliodon_api::solar;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{info, info_span};
use tracing_futures::Instrument;

// The stylized direction drifts a quarter degree per minute, so five
// minute refreshes are imperceptible.

const REFRESH_INTERVAL: Duration = Duration::from_secs(300);

// Tuned by eye; changing these changes the look of the toon shader.

pub const CARTOON_LEVELS: f32 = 6.0;
pub const SATURATION: f32 = 1.8;
pub const BRIGHTNESS: f32 = 1.2;
pub const ATMOSPHERE_STRENGTH: f32 = 0.1;

// Used whenever no sun position is available (loading, errored, or a
// degenerate direction). Lights the globe from along +X.

pub const DEFAULT_DIRECTION: Vec3 = Vec3::X;

/// The uniform block handed to the shaders, in single precision as
/// the GPU wants it.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShaderUniforms {
    pub sun_direction: Vec3,
    pub sun_intensity: f32,
    pub cartoon_levels: f32,
    pub saturation: f32,
    pub brightness: f32,
    pub atmosphere_strength: f32,
}

impl Default for ShaderUniforms {
    fn default() -> Self {
        ShaderUniforms {
            sun_direction: DEFAULT_DIRECTION,
            sun_intensity: 0.5,
            cartoon_levels: CARTOON_LEVELS,
            saturation: SATURATION,
            brightness: BRIGHTNESS,
            atmosphere_strength: ATMOSPHERE_STRENGTH,
        }
    }
}

fn sanitize(v: Vec3) -> Vec3 {
    if v.is_finite() && v.length_squared() > 0.0 {
        v.normalize()
    } else {
        DEFAULT_DIRECTION
    }
}

/// Uniforms for the realistic mode, from an observer's sun position.
/// `None` (still loading, or the provider errored) keeps the default
/// direction.

pub fn from_position(
    position: Option<&solar::Position>,
    intensity: f64,
) -> ShaderUniforms {
    let sun_direction = match position {
        Some(pos) => {
            sanitize(solar::direction_from_position(pos).as_vec3())
        }
        None => DEFAULT_DIRECTION,
    };

    ShaderUniforms {
        sun_direction,
        sun_intensity: intensity.clamp(0.0, 1.0) as f32,
        ..ShaderUniforms::default()
    }
}

/// Uniforms for the stylized mode at an instant. Intensity is pegged
/// at full; the toon shader derives its banding from the direction
/// alone.

pub fn from_instant(time: &DateTime<Utc>) -> ShaderUniforms {
    ShaderUniforms {
        sun_direction: sanitize(solar::stylized_direction(time).as_vec3()),
        sun_intensity: 1.0,
        ..ShaderUniforms::default()
    }
}

/// Owns the refresh task. Dropping it stops the task.

pub struct Refresher {
    task: JoinHandle<()>,
}

impl Refresher {
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(tx: watch::Sender<ShaderUniforms>) {
    let mut interval = time::interval(REFRESH_INTERVAL);

    // The initial value was computed when the channel was created.

    let _ = interval.tick().await;

    loop {
        let _ = interval.tick().await;

        if tx.send(from_instant(&Utc::now())).is_err() {
            info!("no remaining clients ... terminating");
            break;
        }
    }
}

/// Starts the stylized-direction refresh task. The returned channel
/// always holds a current value; receivers never wait for the first
/// tick.

pub fn create_task() -> (Refresher, watch::Receiver<ShaderUniforms>) {
    let (tx, rx) = watch::channel(from_instant(&Utc::now()));

    let task = tokio::spawn(run(tx).instrument(info_span!("shading")));

    (Refresher { task }, rx)
}
