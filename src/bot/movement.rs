//! Autonomous roaming
//!
//! Each tick the bot walks in a straight line along its heading, turning
//! toward a random point inside the roaming square whenever it strays
//! outside. Server position corrections are read as "something is in the
//! way" and drive a small recovery ladder: retry, climb, then either
//! descend or pick a new heading.

use rand::Rng;

use crate::config::BotConfig;
use crate::protocol::packet::{PositionSync, Relativity};

/// Bot position and heading. All-zero means "not spawned yet".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Degrees, never normalised
    pub yaw: f32,
}

impl Pose {
    pub fn new(x: f64, y: f64, z: f64, yaw: f32) -> Self {
        Self { x, y, z, yaw }
    }

    pub fn is_origin(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Overwrite coordinates from a server sync; flagged axes are deltas
    pub fn apply_sync(&mut self, sync: &PositionSync) {
        let resolve = |flag, current: f64, value: f64| {
            if sync.flags.contains(flag) { current + value } else { value }
        };
        self.x = resolve(Relativity::X, self.x, sync.x);
        self.y = resolve(Relativity::Y, self.y, sync.y);
        self.z = resolve(Relativity::Z, self.z, sync.z);
    }

    /// Chebyshev distance from a point on the horizontal plane
    pub fn horizontal_distance(&self, x: f64, z: f64) -> f64 {
        (self.x - x).abs().max((self.z - z).abs())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovementConfig {
    pub speed: f64,
    pub radius: f64,
    pub center_x: f64,
    pub center_z: f64,
    pub y_axis: bool,
    pub vertical_continue_chance: f64,
    pub redirect_chance: f64,
}

impl From<&BotConfig> for MovementConfig {
    fn from(c: &BotConfig) -> Self {
        Self {
            speed: c.speed,
            radius: c.radius,
            center_x: c.center_x,
            center_z: c.center_z,
            y_axis: c.y_axis,
            vertical_continue_chance: c.vertical_continue_chance,
            redirect_chance: c.redirect_chance,
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self::from(&BotConfig::default())
    }
}

/// Vertical intent; climbing and descending exclude each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalIntent {
    #[default]
    Level,
    Ascending,
    Descending,
}

const GIVE_UP_DESCEND_CHANCE: f64 = 0.5;
/// Height gained or lost per climbing or descending tick, independent of speed
const VERTICAL_STEP: f64 = 0.1;

pub struct MovementSimulator<R> {
    config: MovementConfig,
    pose: Pose,
    intent: VerticalIntent,
    rng: R,
}

impl<R: Rng> MovementSimulator<R> {
    pub fn new(config: MovementConfig, mut rng: R) -> Self {
        let yaw = random_heading(&mut rng);
        Self {
            config,
            pose: Pose { yaw, ..Pose::default() },
            intent: VerticalIntent::Level,
            rng,
        }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn intent(&self) -> VerticalIntent {
        self.intent
    }

    pub fn is_ascending(&self) -> bool {
        self.intent == VerticalIntent::Ascending
    }

    pub fn is_descending(&self) -> bool {
        self.intent == VerticalIntent::Descending
    }

    /// Take a server correction: it always wins over the simulated position
    pub fn apply_correction(&mut self, sync: &PositionSync) -> Pose {
        self.pose.apply_sync(sync);
        self.on_obstructed();
        self.pose
    }

    /// Recovery ladder, one rung per correction
    pub fn on_obstructed(&mut self) {
        self.intent = match self.intent {
            VerticalIntent::Descending => VerticalIntent::Level,
            VerticalIntent::Level => VerticalIntent::Ascending,
            VerticalIntent::Ascending => {
                if self.rng.gen_bool(GIVE_UP_DESCEND_CHANCE) {
                    VerticalIntent::Descending
                } else {
                    self.pose.yaw = random_heading(&mut self.rng);
                    VerticalIntent::Level
                }
            }
        };
    }

    /// Advance one tick. Returns `None` until the first position sync arrives.
    pub fn step(&mut self) -> Option<Pose> {
        if self.pose.is_origin() {
            return None;
        }
        let speed = self.config.speed;

        if !self.config.y_axis && self.intent != VerticalIntent::Level {
            self.intent = VerticalIntent::Level;
            if self.rng.gen_bool(self.config.redirect_chance) {
                self.pose.yaw = random_heading(&mut self.rng);
            }
        }

        match self.intent {
            VerticalIntent::Ascending => {
                self.pose.y += VERTICAL_STEP;
                if !self.rng.gen_bool(self.config.vertical_continue_chance) {
                    self.intent = VerticalIntent::Level;
                }
            }
            VerticalIntent::Descending => {
                self.pose.y -= VERTICAL_STEP;
                if !self.rng.gen_bool(self.config.vertical_continue_chance) {
                    self.intent = VerticalIntent::Level;
                }
            }
            VerticalIntent::Level => {
                let c = &self.config;
                if self.pose.horizontal_distance(c.center_x, c.center_z) > c.radius {
                    let tx = self.rng.gen::<f64>() * c.radius * 2.0 - c.radius + c.center_x;
                    let tz = self.rng.gen::<f64>() * c.radius * 2.0 - c.radius + c.center_z;
                    self.pose.yaw = (self.pose.x - tx).atan2(tz - self.pose.z).to_degrees() as f32;
                }

                let heading = (self.pose.yaw as f64).to_radians();
                self.pose.x += speed * -heading.sin();
                self.pose.z += speed * heading.cos();
            }
        }

        if self.config.y_axis {
            self.pose.y -= speed / 10.0;
        }

        Some(self.pose)
    }
}

fn random_heading<R: Rng>(rng: &mut R) -> f32 {
    rng.gen::<f32>() * 360.0
}
