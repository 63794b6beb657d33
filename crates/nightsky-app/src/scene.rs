//! Scene coordination: owns every sky component, the orbit rig and the
//! journal catalog, and drives them once per display frame.
//!
//! Components talk to each other only through the scene: the shooting star
//! reads the exit flag and the latest journal star from here, and its camera
//! requests are applied to the rig here.

use std::path::PathBuf;

use glam::{Vec2, Vec3};
use nightsky_config::Config;
use nightsky_render::{MaterialError, OrbitRig};
use nightsky_sky::starfield::hsl_to_rgb;
use nightsky_sky::{
    BACKGROUND_STARS, BillboardGlowRenderer, CameraCommand, CatalogError, Flight, GlowInstance,
    GlowStyle, JOURNAL_STARS, LayerKind, LayeredSkyComposer, Selection, ShootingStar,
    ShootingStarController, ShootingStarInput, ShootingStarOutput, Star, StarCatalog,
    StarFieldGenerator, pick, sky_materials,
};
use tracing::{debug, info, warn};

/// Receives every successful pick.
pub type SelectionHandler = Box<dyn FnMut(&Selection)>;

/// Visual size of stars written from the viewer.
const NEW_STAR_SCALE: f32 = 3.0;

/// Where and how fast each new shooting star flies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightSettings {
    pub start_offset: Vec3,
    pub target_offset: Vec3,
    pub exit_speed: f32,
    pub look_easing: f32,
}

impl FlightSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_offset: Vec3::from_array(config.shooting_star.start_offset),
            target_offset: Vec3::from_array(config.shooting_star.target_offset),
            exit_speed: config.shooting_star.exit_speed,
            look_easing: config.camera.look_easing,
        }
    }

    /// A flight starting relative to `eye`.
    pub fn flight_from(&self, eye: Vec3) -> Flight {
        Flight::relative_to(
            eye,
            self.start_offset,
            self.target_offset,
            self.exit_speed,
            self.look_easing,
        )
    }
}

/// Apply the shooting star's camera request to the rig. Returns whether the
/// flight finished this step.
pub fn apply_output(rig: &mut OrbitRig, output: &ShootingStarOutput) -> bool {
    match output.camera {
        Some(CameraCommand::LookAt { target, factor }) => rig.ease_look_at(target, factor),
        Some(CameraCommand::FocusOn(point)) => rig.focus_on(point),
        None => {}
    }
    output.finished
}

/// A star for a new journal entry at `position`.
///
/// Color and twinkle phase come from the id so reloading the catalog gives the
/// same sky.
pub fn journal_star(id: u64, position: Vec3) -> Star {
    let golden = |x: f64| (x * 0.618_033_988_75).fract() as f32;
    Star {
        id,
        position: position.to_array(),
        color: hsl_to_rgb(golden(id as f64 + 1.0), 0.55, 0.78),
        scale: NEW_STAR_SCALE,
        random_seed: golden(id as f64 * 7.0 + 3.0),
    }
}

/// The night sky and everything driving it.
pub struct Scene {
    rig: OrbitRig,
    catalog: StarCatalog,
    catalog_path: Option<PathBuf>,
    synced_revision: Option<u64>,
    journal: BillboardGlowRenderer,
    background: BillboardGlowRenderer,
    composer: LayeredSkyComposer,
    shooting: ShootingStarController,
    flight: FlightSettings,
    exit_requested: bool,
    finished: bool,
    viewport: (u32, u32),
    on_select: Option<SelectionHandler>,
}

impl Scene {
    /// Build the scene from configuration and an already loaded catalog.
    ///
    /// `catalog_path` is where newly written stars are saved; `None` keeps
    /// them in memory only.
    pub fn new(config: &Config, catalog: StarCatalog, catalog_path: Option<PathBuf>) -> Self {
        let mut rig = OrbitRig::new(
            config.camera.orbit_distance,
            config.camera.fov_degrees.to_radians(),
            config.camera.focus_easing,
        );
        rig.set_viewport(config.window.width, config.window.height);

        let field = StarFieldGenerator::new(config.sky.seed)
            .generate(i64::from(config.sky.background_star_count));
        let mut background = BillboardGlowRenderer::new(GlowStyle::BACKGROUND);
        background.set_instances(GlowInstance::from_field(&field));
        info!("Generated {} background stars", field.len());

        let layers = [
            (config.sky.gradient, LayerKind::Gradient),
            (config.sky.nebula, LayerKind::Nebula),
            (config.sky.distant_stars, LayerKind::DistantStars),
            (config.sky.fog, LayerKind::Fog),
        ];
        let composer = LayeredSkyComposer::new(
            layers
                .into_iter()
                .filter_map(|(enabled, kind)| enabled.then_some(kind)),
        );

        let mut scene = Self {
            rig,
            catalog,
            catalog_path,
            synced_revision: None,
            journal: BillboardGlowRenderer::new(GlowStyle::JOURNAL),
            background,
            composer,
            shooting: ShootingStarController::new(),
            flight: FlightSettings::from_config(config),
            exit_requested: false,
            finished: false,
            viewport: (config.window.width.max(1), config.window.height.max(1)),
            on_select: None,
        };
        scene.sync_catalog();
        scene.composer.resize(scene.viewport.0, scene.viewport.1);
        if config.shooting_star.spawn_on_start {
            scene.spawn_shooting_star();
        }
        scene
    }

    /// Create GPU resources for every component.
    pub fn attach(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> Result<(), MaterialError> {
        let registry = sky_materials()?;
        self.composer.attach(device, &registry, format)?;
        self.background
            .attach(device, &registry, BACKGROUND_STARS, format)?;
        self.journal.attach(device, &registry, JOURNAL_STARS, format)?;
        self.shooting.attach(device, &registry, format)?;
        info!("Scene attached with {} materials", registry.len());
        Ok(())
    }

    /// Take over settings that can change while running. Flight settings
    /// apply from the next spawn; the sky itself is built once.
    pub fn apply_config(&mut self, config: &Config) {
        self.flight = FlightSettings::from_config(config);
        self.rig.fov_y = config.camera.fov_degrees.to_radians();
        self.rig.focus_easing = config.camera.focus_easing;
    }

    pub fn set_selection_handler(&mut self, handler: SelectionHandler) {
        self.on_select = Some(handler);
    }

    pub fn rig(&self) -> &OrbitRig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut OrbitRig {
        &mut self.rig
    }

    pub fn catalog(&self) -> &StarCatalog {
        &self.catalog
    }

    pub fn composer(&self) -> &LayeredSkyComposer {
        &self.composer
    }

    pub fn journal(&self) -> &BillboardGlowRenderer {
        &self.journal
    }

    pub fn background(&self) -> &BillboardGlowRenderer {
        &self.background
    }

    pub fn shooting_star(&self) -> Option<&ShootingStar> {
        self.shooting.star()
    }

    /// Raise the exit flag. Read by the next tick only.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Latched once a flight has ended; cleared by the next spawn.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Launch a shooting star from the current eye position unless one is
    /// already flying.
    pub fn spawn_shooting_star(&mut self) -> bool {
        let spawned = self.shooting.spawn(self.flight.flight_from(self.rig.eye()));
        if spawned {
            self.finished = false;
        }
        spawned
    }

    /// Append a journal star, persisting the catalog when a path is known.
    pub fn write_star(&mut self, position: Vec3) -> Result<Star, CatalogError> {
        let star = journal_star(self.catalog.next_id(), position);
        self.catalog.push(star.clone())?;
        self.sync_catalog();
        if let Some(path) = &self.catalog_path {
            self.catalog.save(path)?;
        }
        Ok(star)
    }

    /// Advance the whole scene by `delta` seconds.
    pub fn tick(&mut self, delta: f32) {
        self.composer.advance(delta);
        self.background.advance(delta);
        self.journal.advance(delta);

        let input = ShootingStarInput {
            exit_requested: std::mem::take(&mut self.exit_requested),
            camera: self.rig.camera().frame(),
            latest_star: self.catalog.latest().map(Star::position),
        };
        let output = self.shooting.tick(delta, &input);
        if apply_output(&mut self.rig, &output) {
            info!("Shooting star finished");
            self.finished = true;
        }

        self.rig.update(delta);
        self.composer.set_view(&self.rig.camera().frame());
        self.sync_catalog();
    }

    /// Forward a new canvas size in physical pixels.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width.max(1), height.max(1));
        self.rig.set_viewport(width, height);
        self.composer.resize(width, height);
    }

    /// Route a click at `pixel` (physical, origin top-left).
    pub fn click(&mut self, pixel: Vec2) -> Option<Selection> {
        let (width, height) = self.viewport;
        let ray = self
            .rig
            .camera()
            .screen_ray(pixel, width as f32, height as f32);
        let selection = pick(&ray, &self.catalog, self.shooting.star())?;
        self.select(&selection);
        Some(selection)
    }

    /// React to a selection, then hand it to the handler.
    ///
    /// Catching the shooting star writes a journal star where it was caught
    /// and sends it away; picking a journal star focuses the camera on it.
    /// A catch made while an exit is already pending is ignored.
    pub fn select(&mut self, selection: &Selection) {
        match selection {
            Selection::ShootingStar => {
                if self.exit_requested {
                    debug!("Shooting star already caught this frame");
                    return;
                }
                if let Some(position) = self.shooting.star().map(|star| star.position) {
                    match self.write_star(position) {
                        Ok(star) => info!("Wrote journal star {} at {}", star.id, position),
                        Err(e) => warn!("Failed to record journal star: {e}"),
                    }
                    self.request_exit();
                }
            }
            Selection::JournalStar(star) => self.rig.focus_on(star.position()),
        }
        if let Some(handler) = self.on_select.as_mut() {
            handler(selection);
        }
    }

    /// Upload this frame's uniforms and instance data.
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        let frame = self.rig.camera().frame();
        self.composer.prepare(queue);
        self.background.prepare(device, queue, &frame);
        self.journal.prepare(device, queue, &frame);
        self.shooting.prepare(queue, &frame);
    }

    /// Draw back to front: sky backdrop, star layers, shooting star, fog.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.composer.render_backdrop(pass);
        self.background.render(pass);
        self.journal.render(pass);
        self.shooting.render(pass);
        self.composer.render_foreground(pass);
    }

    fn sync_catalog(&mut self) {
        let revision = self.catalog.revision();
        if self.synced_revision == Some(revision) {
            return;
        }
        self.journal
            .set_instances(GlowInstance::from_catalog(&self.catalog));
        self.synced_revision = Some(revision);
    }
}
