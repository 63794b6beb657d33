//! Window creation and event handling via winit.
//!
//! Provides [`AppState`] which implements winit's [`ApplicationHandler`] trait,
//! and a [`run`] function to start the event loop.

use std::sync::Arc;

use glam::Vec2;
use nightsky_config::Config;
use nightsky_render::{FrameEncoder, NIGHT_CLEAR, RenderContext, SurfaceError, init_render_context_blocking};
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::config_watch::ConfigWatcher;
use crate::frame_clock::FrameClock;
use crate::scene::Scene;

/// Cursor travel below which a press and release count as a click.
pub const CLICK_SLOP: f32 = 4.0;
/// Orbit rotation per pixel of drag, in radians.
pub const DRAG_SENSITIVITY: f32 = 0.005;
/// Zoom factor per scroll line.
pub const ZOOM_STEP: f32 = 0.9;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
        .with_fullscreen(
            config
                .window
                .fullscreen
                .then_some(Fullscreen::Borderless(None)),
        )
}

/// What a key press asks of the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Send the shooting star away.
    RequestExit,
    SpawnShootingStar,
    Quit,
}

/// Map a pressed physical key to an action.
pub fn key_action(code: KeyCode) -> Option<KeyAction> {
    match code {
        KeyCode::Space => Some(KeyAction::RequestExit),
        KeyCode::KeyN => Some(KeyAction::SpawnShootingStar),
        KeyCode::Escape => Some(KeyAction::Quit),
        _ => None,
    }
}

/// Left-button drag tracking that tells clicks from orbit drags.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragState {
    cursor: Vec2,
    pressed_at: Option<Vec2>,
    travelled: f32,
}

impl DragState {
    /// Record a cursor move. Returns the drag delta while the button is held.
    pub fn moved(&mut self, position: Vec2) -> Option<Vec2> {
        let delta = position - self.cursor;
        self.cursor = position;
        self.pressed_at?;
        self.travelled += delta.length();
        Some(delta)
    }

    pub fn pressed(&mut self) {
        self.pressed_at = Some(self.cursor);
        self.travelled = 0.0;
    }

    /// Returns the click position if the cursor barely moved while held.
    pub fn released(&mut self) -> Option<Vec2> {
        self.pressed_at.take()?;
        (self.travelled < CLICK_SLOP).then_some(self.cursor)
    }
}

/// Application state: the window, GPU context, frame clock and scene.
pub struct AppState {
    /// The window handle, wrapped in `Arc` for sharing with the surface.
    pub window: Option<Arc<Window>>,
    /// GPU context owning device, queue, and surface.
    pub gpu: Option<RenderContext>,
    pub clock: FrameClock,
    pub scene: Scene,
    pub config: Config,
    watcher: Option<ConfigWatcher>,
    drag: DragState,
}

impl AppState {
    pub fn new(config: Config, scene: Scene, watcher: Option<ConfigWatcher>) -> Self {
        Self {
            window: None,
            gpu: None,
            clock: FrameClock::new(),
            scene,
            config,
            watcher,
            drag: DragState::default(),
        }
    }

    fn poll_config(&mut self, delta: f32) {
        let Some(config) = self.watcher.as_mut().and_then(|w| w.poll(delta)) else {
            return;
        };
        self.scene.apply_config(&config);
        if let Some(window) = &self.window {
            window.set_title(&config.window.title);
        }
        self.config = config;
    }

    fn handle_key(&mut self, event: &KeyEvent, event_loop: &ActiveEventLoop) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match key_action(code) {
            Some(KeyAction::RequestExit) => {
                info!("Exit requested from keyboard");
                self.scene.request_exit();
            }
            Some(KeyAction::SpawnShootingStar) => {
                if !self.scene.spawn_shooting_star() {
                    info!("A shooting star is already flying");
                }
            }
            Some(KeyAction::Quit) => event_loop.exit(),
            None => {}
        }
    }

    fn handle_resize(&mut self, width: u32, height: u32) {
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
        }
        self.scene.resize(width, height);
        info!("Window resized to {}x{}", width, height);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let delta = self.clock.tick();
        self.poll_config(delta);
        self.scene.tick(delta);

        if let Some(gpu) = &self.gpu {
            match gpu.get_current_texture() {
                Ok(surface_texture) => {
                    self.scene.prepare(&gpu.device, &gpu.queue);
                    let mut frame =
                        FrameEncoder::new(&gpu.device, Arc::clone(&gpu.queue), surface_texture);
                    if let Some(mut pass) = frame.begin_sky_pass(NIGHT_CLEAR) {
                        self.scene.render(&mut pass);
                    }
                    frame.submit();
                }
                Err(SurfaceError::Lost) => {
                    if let Some(gpu) = &mut self.gpu {
                        let (width, height) = gpu.size();
                        gpu.resize(width, height);
                    }
                }
                Err(SurfaceError::OutOfMemory) => {
                    error!("GPU out of memory");
                    event_loop.exit();
                }
                Err(SurfaceError::Timeout) => {
                    warn!("Surface timeout, skipping frame");
                }
            }
        }

        if let Some(window) = &self.window {
            if self.config.debug.show_fps && self.clock.frame_count() % 60 == 0 {
                window.set_title(&format!(
                    "{} ({:.0} fps)",
                    self.config.window.title,
                    self.clock.fps()
                ));
            }
            window.request_redraw();
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Window creation failed: {e}");
                event_loop.exit();
                return;
            }
        };

        match init_render_context_blocking(Arc::clone(&window), self.config.window.vsync) {
            Ok(ctx) => {
                if let Err(e) = self.scene.attach(&ctx.device, ctx.surface_format) {
                    error!("Scene initialization failed: {e}");
                    event_loop.exit();
                    return;
                }
                let (width, height) = ctx.size();
                self.scene.resize(width, height);
                self.gpu = Some(ctx);
            }
            Err(e) => {
                error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.handle_key(&event, event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if let Some(delta) = self.drag.moved(position) {
                    self.scene.rig_mut().rotate(delta * DRAG_SENSITIVITY);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.drag.pressed(),
                ElementState::Released => {
                    if let Some(pixel) = self.drag.released() {
                        self.scene.click(pixel);
                    }
                }
            },
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                };
                self.scene.rig_mut().zoom(ZOOM_STEP.powf(lines));
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Creates an event loop and runs the viewer until the window is closed.
#[instrument(skip_all)]
pub fn run(
    config: Config,
    scene: Scene,
    watcher: Option<ConfigWatcher>,
) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::new(config, scene, watcher);
    event_loop.run_app(&mut app)
}
