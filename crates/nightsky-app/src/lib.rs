//! Night sky viewer application.
//!
//! Provides the frame clock, platform directories, config hot reload, the
//! scene coordinator and the winit window host.

pub mod config_watch;
pub mod frame_clock;
pub mod platform;
pub mod scene;
pub mod window;
