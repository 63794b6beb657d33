//! The shooting star: a single transient glow that flies in, waits, and
//! leaves while steering the camera.
//!
//! [`ShootingStar::step`] is a pure function from the current state, the frame
//! delta and this frame's [`ShootingStarInput`] to the next state plus a
//! [`ShootingStarOutput`] for the host. Phases only ever advance
//! `Entering -> Idle -> Exiting -> Gone`.

mod renderer;
pub mod trail;

use glam::Vec3;
use nightsky_render::{CameraFrame, MaterialError, MaterialRegistry, per_frame_lerp};

pub use renderer::{
    HEAD_SIZE, ShootingStarRenderer, ShootingStarUniforms, TrailShading, shade_shooting_star,
};
pub(crate) use renderer::shooting_star_material;
pub use trail::Trail;

/// Per-frame (60 Hz) lerp factor toward the entry target.
pub const ENTER_EASING: f32 = 0.02;
/// Entry ends once the head is this close to its target.
pub const ARRIVAL_DISTANCE: f32 = 1.0;
/// Brightness while waiting.
pub const IDLE_BRIGHTNESS: f32 = 0.7;
/// Exit time after which the star is gone.
pub const EXIT_DURATION: f32 = 2.0;
/// Exit time at which the brightness fade starts.
pub const FADE_START: f32 = 3.0;
/// Length of the brightness fade.
pub const FADE_DURATION: f32 = 2.0;
/// Camera aims this far ahead of the head along the exit direction.
pub const LOOK_LEAD: f32 = 8.0;
/// The camera follows while the head is inside this NDC rectangle.
pub const FOLLOW_BOUNDS: f32 = 0.9;
/// Head flare spin in radians per second at rest.
pub const BASE_SPIN: f32 = 0.6;
/// Extra spin per unit of trail length.
pub const SPIN_PER_LENGTH: f32 = 4.0;

/// Lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Entering,
    Idle,
    Exiting,
    Gone,
}

/// Fixed parameters of one flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flight {
    pub start: Vec3,
    pub target: Vec3,
    /// World units per second while exiting.
    pub exit_speed: f32,
    /// Per-frame (60 Hz) lerp factor of the follow camera.
    pub look_easing: f32,
}

impl Flight {
    /// Flight with entry points given relative to the camera position.
    pub fn relative_to(
        camera: Vec3,
        start_offset: Vec3,
        target_offset: Vec3,
        exit_speed: f32,
        look_easing: f32,
    ) -> Self {
        Self {
            start: camera + start_offset,
            target: camera + target_offset,
            exit_speed,
            look_easing,
        }
    }

    /// Unit exit direction continuing the entry path; zero if start equals target.
    pub fn exit_direction(&self) -> Vec3 {
        (self.target - self.start).try_normalize().unwrap_or(Vec3::ZERO)
    }
}

/// Inputs read from the host each frame.
#[derive(Debug, Clone, Copy)]
pub struct ShootingStarInput {
    /// The external "please leave" flag.
    pub exit_requested: bool,
    pub camera: CameraFrame,
    /// Position of the most recently created journal star, if any.
    pub latest_star: Option<Vec3>,
}

/// A camera request for the orbit host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraCommand {
    /// Move the orbit target `factor` of the way toward `target`.
    LookAt { target: Vec3, factor: f32 },
    /// Ease onto `point` over the following frames.
    FocusOn(Vec3),
}

/// What one step asks of the host.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShootingStarOutput {
    pub camera: Option<CameraCommand>,
    /// Raised on the step that ends the flight.
    pub finished: bool,
}

/// Brightness during exit as a function of time since exit began.
///
/// Full until [`FADE_START`], then linear to zero over [`FADE_DURATION`].
pub fn exit_brightness(elapsed: f32) -> f32 {
    if elapsed <= FADE_START {
        1.0
    } else {
        (1.0 - (elapsed - FADE_START) / FADE_DURATION).clamp(0.0, 1.0)
    }
}

/// Complete state of the shooting star.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShootingStar {
    pub flight: Flight,
    pub phase: Phase,
    pub position: Vec3,
    pub trail: Trail,
    /// In `[0, 1]`.
    pub brightness: f32,
    /// Seconds since exit began. Zero outside `Exiting`.
    pub exit_elapsed: f32,
    /// Head flare rotation in radians.
    pub spin: f32,
}

impl ShootingStar {
    pub fn spawn(flight: Flight) -> Self {
        Self {
            flight,
            phase: Phase::Entering,
            position: flight.start,
            trail: Trail::default(),
            brightness: 1.0,
            exit_elapsed: 0.0,
            spin: 0.0,
        }
    }

    /// Whether the star can be clicked.
    pub fn is_selectable(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Advance by `delta` seconds.
    pub fn step(&self, delta: f32, input: &ShootingStarInput) -> (ShootingStar, ShootingStarOutput) {
        let mut next = *self;
        let mut output = ShootingStarOutput::default();
        let delta = delta.max(0.0);

        match self.phase {
            Phase::Gone => return (next, output),
            Phase::Entering => {
                let t = per_frame_lerp(ENTER_EASING, delta);
                next.position = self.position.lerp(self.flight.target, t);
                next.brightness = 1.0;
                if next.position.distance(self.flight.target) < ARRIVAL_DISTANCE {
                    next.phase = Phase::Idle;
                    log::debug!("Shooting star arrived, now idle");
                }
            }
            Phase::Idle => {
                next.brightness = IDLE_BRIGHTNESS;
                if input.exit_requested {
                    next.phase = Phase::Exiting;
                    next.exit_elapsed = 0.0;
                    log::debug!("Shooting star exit requested");
                }
            }
            Phase::Exiting => {
                let direction = self.flight.exit_direction();
                next.exit_elapsed = self.exit_elapsed + delta;
                next.position = self.position + direction * self.flight.exit_speed * delta;
                next.brightness = exit_brightness(next.exit_elapsed);

                if in_follow_bounds(&input.camera, next.position) {
                    output.camera = Some(CameraCommand::LookAt {
                        target: next.position + direction * LOOK_LEAD,
                        factor: per_frame_lerp(self.flight.look_easing, delta),
                    });
                }

                if next.exit_elapsed > EXIT_DURATION {
                    if let Some(latest) = input.latest_star {
                        output.camera = Some(CameraCommand::FocusOn(latest));
                    }
                    next.phase = Phase::Gone;
                    output.finished = true;
                    log::debug!("Shooting star gone after {:.2}s", next.exit_elapsed);
                }
            }
        }

        next.trail = self.trail.observe(next.position, delta, &input.camera);
        next.spin = (self.spin + delta * (BASE_SPIN + SPIN_PER_LENGTH * next.trail.length))
            % std::f32::consts::TAU;
        (next, output)
    }
}

fn in_follow_bounds(camera: &CameraFrame, point: Vec3) -> bool {
    camera
        .project_ndc(point)
        .is_some_and(|ndc| ndc.x.abs() <= FOLLOW_BOUNDS && ndc.y.abs() <= FOLLOW_BOUNDS)
}

/// Owns the live shooting star, if any, and its renderer.
///
/// Ticks are skipped entirely while the renderer has no GPU resources.
#[derive(Default)]
pub struct ShootingStarController {
    star: Option<ShootingStar>,
    renderer: ShootingStarRenderer,
    headless: bool,
}

impl ShootingStarController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the shooting star material.
    pub fn attach(
        &mut self,
        device: &wgpu::Device,
        registry: &MaterialRegistry,
        format: wgpu::TextureFormat,
    ) -> Result<(), MaterialError> {
        self.renderer.attach(device, registry, format)
    }

    pub fn is_attached(&self) -> bool {
        self.headless || self.renderer.is_attached()
    }

    /// Step the star without GPU resources. Prepare and render stay no-ops.
    #[cfg(any(test, feature = "test-support"))]
    pub fn run_headless(&mut self) {
        self.headless = true;
    }

    /// Start a new flight unless one is live. Returns whether it spawned.
    pub fn spawn(&mut self, flight: Flight) -> bool {
        if self.star.is_some() {
            return false;
        }
        self.star = Some(ShootingStar::spawn(flight));
        log::debug!("Shooting star spawned at {}", flight.start);
        true
    }

    pub fn star(&self) -> Option<&ShootingStar> {
        self.star.as_ref()
    }

    /// Step the live star. Drops it once gone.
    pub fn tick(&mut self, delta: f32, input: &ShootingStarInput) -> ShootingStarOutput {
        if !self.is_attached() {
            log::trace!("Shooting star renderer not attached, skipping frame");
            return ShootingStarOutput::default();
        }
        let Some(star) = self.star else {
            return ShootingStarOutput::default();
        };
        let (next, output) = star.step(delta, input);
        self.star = (next.phase != Phase::Gone).then_some(next);
        output
    }

    /// Upload this frame's uniforms.
    pub fn prepare(&self, queue: &wgpu::Queue, camera: &CameraFrame) {
        if let Some(star) = &self.star {
            self.renderer.prepare(queue, star, camera);
        }
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.star.is_some() {
            self.renderer.render(pass);
        }
    }
}
