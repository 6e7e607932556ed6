//! Headless driver applying control commands to a simulation.
//!
//! The runner owns the simulation together with the scene file it was built
//! from. Between commands it polls the scene file and rebuilds the
//! simulation when the file changed on disk.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::common::scene::{load_scene, save_scene};
use crate::common::watcher::SceneWatcher;
use crate::error::MeshError;
use crate::simulation::geometry::Position;
use crate::simulation::scheduler::{Simulation, StepReport};
use crate::simulation::types::{MessageId, NodeId};

use super::command::ControlCommand;
use super::config::SimulatorConfig;

/// Steps between two scene file checks within one `step` command.
const SCENE_POLL_INTERVAL: u64 = 20;

fn polls_scene_before(step_index: u64) -> bool {
    step_index % SCENE_POLL_INTERVAL == 0
}

/// A message consumed at its destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub step: u64,
    pub node_id: NodeId,
    pub message_id: MessageId,
}

pub struct Runner {
    simulation: Simulation,
    scene_path: PathBuf,
    watcher: Option<SceneWatcher>,
    config: SimulatorConfig,
    deliveries: Vec<Delivery>,
}

impl Runner {
    /// Load the scene at `scene_path` and build a simulation from it.
    pub fn new(scene_path: &Path, config: SimulatorConfig) -> Result<Self> {
        let scene = load_scene(scene_path)?;
        let simulation = Simulation::from_scene(&scene, &config.simulation_config())
            .with_context(|| format!("Invalid topology in {}", scene_path.display()))?;

        let watcher = config.watch_scene.then(|| SceneWatcher::new(scene_path));

        Ok(Self {
            simulation,
            scene_path: scene_path.to_path_buf(),
            watcher,
            config,
            deliveries: Vec::new(),
        })
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn deliveries(&self) -> &[Delivery] {
        &self.deliveries
    }

    /// Rebuild from the scene file if it changed since the last check.
    ///
    /// Returns whether a reload happened. A changed file that fails to load
    /// is reported and the current simulation is kept.
    pub fn refresh_if_scene_changed(&mut self) -> bool {
        let Some(watcher) = self.watcher.as_mut() else {
            return false;
        };

        match watcher.poll_changed() {
            Ok(true) => {
                log::info!("Scene file {} changed, reloading", self.scene_path.display());
                match self.reload() {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("Keeping current simulation: {:#}", e);
                        false
                    }
                }
            }
            Ok(false) => false,
            Err(e) => {
                log::warn!("Cannot read scene file {}: {}", self.scene_path.display(), e);
                false
            }
        }
    }

    fn reload(&mut self) -> Result<()> {
        let scene = load_scene(&self.scene_path)?;
        self.simulation
            .reload(&scene)
            .with_context(|| format!("Invalid topology in {}", self.scene_path.display()))?;
        self.deliveries.clear();
        Ok(())
    }

    fn record_step(&mut self, report: &StepReport) {
        for (node_id, message) in report.deliveries() {
            self.deliveries.push(Delivery {
                step: report.step,
                node_id,
                message_id: message.id,
            });
        }
    }

    /// Apply one command.
    ///
    /// Commands naming an unknown node, or an injection the network cannot
    /// perform, are logged and skipped. I/O failures are returned.
    pub fn apply(&mut self, command: &ControlCommand) -> Result<()> {
        log::debug!("Applying '{}'", command);

        match command {
            ControlCommand::Inject => match self.simulation.inject_new_message() {
                Ok(id) => log::info!("Injected message {} at node {}", id, self.config.origin_node_id),
                Err(e) => log::warn!("Cannot inject: {}", e),
            },
            ControlCommand::Step(count) => {
                for index in 0..*count {
                    if polls_scene_before(index) {
                        self.refresh_if_scene_changed();
                    }
                    let report = self.simulation.step();
                    self.record_step(&report);
                }
            }
            ControlCommand::Toggle(id) => match self.simulation.toggle_node(*id) {
                Ok(status) => log::info!("Node {} is now {:?}", id, status),
                Err(e) => warn_skipped(command, &e),
            },
            ControlCommand::Power { node_id, delta } => match self.simulation.adjust_node_power(*node_id, *delta) {
                Ok(power) => log::info!("Node {} power is now {}", node_id, power),
                Err(e) => warn_skipped(command, &e),
            },
            ControlCommand::Create { x, y } => {
                self.simulation.create_node(Position::new(*x, *y));
            }
            ControlCommand::Remove(id) => {
                if self.simulation.remove_node(*id).is_none() {
                    warn_skipped(command, &MeshError::NodeNotFound(*id));
                }
            }
            ControlCommand::Save(path) => {
                let target = path.as_ref().map(PathBuf::from).unwrap_or_else(|| self.scene_path.clone());
                save_scene(&target, &self.simulation.to_scene())?;
                if target == self.scene_path {
                    if let Some(watcher) = self.watcher.as_mut() {
                        watcher.acknowledge().context("Failed to fingerprint saved scene")?;
                    }
                }
            }
            ControlCommand::Reload => self.reload()?,
            ControlCommand::Links => {
                for (from, to) in self.simulation.medium().links() {
                    log::info!("link {} -> {}", from, to);
                }
            }
        }

        Ok(())
    }

    /// Apply commands in order, stopping at the first I/O failure.
    pub fn run(&mut self, commands: &[ControlCommand]) -> Result<()> {
        for command in commands {
            self.apply(command)?;
        }
        Ok(())
    }

    /// Log a closing summary of the run.
    pub fn log_summary(&self) {
        let stats = self.simulation.stats();
        log::info!(
            "Finished after {} steps: {} injected, {} relayed, {} delivered, {} discarded, {} emissions, {} receptions",
            self.simulation.step_count(),
            stats.injected,
            stats.relayed,
            stats.delivered,
            stats.discarded,
            stats.emissions,
            stats.receptions
        );
        for delivery in &self.deliveries {
            log::info!(
                "message {} delivered to node {} in step {}",
                delivery.message_id,
                delivery.node_id,
                delivery.step
            );
        }
    }
}

fn warn_skipped(command: &ControlCommand, error: &MeshError) {
    log::warn!("Skipping '{}': {}", command, error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::command::parse_script;
    use std::fs;

    const LINE: &str = r#"[
        { "id": 0, "pos": { "x": 0, "y": 0 }, "power": 2, "status": "online", "type": "flooding" },
        { "id": 1, "pos": { "x": 2, "y": 0 }, "power": 2, "status": "online", "type": "flooding" },
        { "id": 2, "pos": { "x": 4, "y": 0 }, "power": 2, "status": "online", "type": "flooding" }
    ]"#;

    fn scene_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("flooding-mesh-runner-{}-{}.json", name, std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn script_floods_to_highest_id() {
        let path = scene_file("flood", LINE);
        let mut runner = Runner::new(&path, SimulatorConfig::default()).unwrap();

        runner.run(&parse_script("inject\nstep 5\n").unwrap()).unwrap();
        assert_eq!(
            runner.deliveries(),
            &[Delivery {
                step: 2,
                node_id: 2,
                message_id: 0
            }]
        );
        assert_eq!(runner.simulation().step_count(), 5);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn extreme_power_deltas_clamp() {
        let path = scene_file("power", LINE);
        let mut runner = Runner::new(&path, SimulatorConfig::default()).unwrap();

        runner.apply(&"power 0 9223372036854775807".parse().unwrap()).unwrap();
        assert_eq!(runner.simulation().medium().find_node_by_id(0).unwrap().power(), u32::MAX);
        runner.apply(&"power 0 -9223372036854775808".parse().unwrap()).unwrap();
        assert_eq!(runner.simulation().medium().find_node_by_id(0).unwrap().power(), 0);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn scene_is_polled_every_interval_within_a_step_command() {
        let polled: Vec<u64> = (0..45).filter(|&i| polls_scene_before(i)).collect();
        assert_eq!(polled, vec![0, 20, 40]);
    }

    #[test]
    fn step_command_picks_up_pending_edit_first() {
        let path = scene_file("pending", LINE);
        let mut runner = Runner::new(&path, SimulatorConfig::default()).unwrap();
        runner.apply(&ControlCommand::Step(2)).unwrap();

        fs::write(&path, "[]").unwrap();
        runner.apply(&ControlCommand::Step(3)).unwrap();
        assert!(runner.simulation().medium().is_empty());
        assert_eq!(runner.simulation().step_count(), 3);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn edits_on_unknown_nodes_are_skipped() {
        let path = scene_file("unknown", LINE);
        let mut runner = Runner::new(&path, SimulatorConfig::default()).unwrap();

        runner.run(&parse_script("toggle 9\npower 9 1\nremove 9\n").unwrap()).unwrap();
        assert_eq!(runner.simulation().medium().len(), 3);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn offline_relay_breaks_the_chain() {
        let path = scene_file("offline", LINE);
        let mut runner = Runner::new(&path, SimulatorConfig::default()).unwrap();

        runner.run(&parse_script("toggle 1\ninject\nstep 6\n").unwrap()).unwrap();
        assert!(runner.deliveries().is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_then_external_edit_triggers_reload() {
        let path = scene_file("reload", LINE);
        let mut runner = Runner::new(&path, SimulatorConfig::default()).unwrap();

        runner.run(&parse_script("create 6 0\nsave\nstep 2\n").unwrap()).unwrap();
        assert_eq!(runner.simulation().medium().len(), 4);
        assert_eq!(runner.simulation().step_count(), 2);

        fs::write(&path, LINE).unwrap();
        assert!(runner.refresh_if_scene_changed());
        assert_eq!(runner.simulation().medium().len(), 3);
        assert_eq!(runner.simulation().step_count(), 0);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn broken_scene_edit_keeps_simulation() {
        let path = scene_file("broken", LINE);
        let mut runner = Runner::new(&path, SimulatorConfig::default()).unwrap();
        runner.apply(&ControlCommand::Step(1)).unwrap();

        fs::write(&path, "not json").unwrap();
        assert!(!runner.refresh_if_scene_changed());
        assert_eq!(runner.simulation().step_count(), 1);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn watching_can_be_disabled() {
        let path = scene_file("nowatch", LINE);
        let config = SimulatorConfig {
            watch_scene: false,
            ..SimulatorConfig::default()
        };
        let mut runner = Runner::new(&path, config).unwrap();
        fs::write(&path, "[]").unwrap();
        assert!(!runner.refresh_if_scene_changed());
        assert_eq!(runner.simulation().medium().len(), 3);
        let _ = fs::remove_file(&path);
    }
}
