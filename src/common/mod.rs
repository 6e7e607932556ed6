//! Host-side helpers shared by the CLI and the runner.
//!
//! - `scene`: topology file loading, saving and validation
//! - `watcher`: scene file change detection

pub mod scene;
pub mod watcher;

pub use scene::{NodeRecord, Scene, SceneLoadError, load_scene, save_scene};
pub use watcher::SceneWatcher;
