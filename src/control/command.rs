//! Command type definitions for the control module.
//!
//! Commands are the headless counterpart of the interactive controls: each
//! one is a single text line such as `step 5` or `power 3 -1`.

use std::fmt;
use std::str::FromStr;

use crate::simulation::types::NodeId;

/// Operations a host can apply to a running simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Seed a new flood at the origin node.
    Inject,
    /// Run the given number of steps.
    Step(u64),
    /// Flip a node between online and offline.
    Toggle(NodeId),
    /// Grow or shrink a node's power.
    Power { node_id: NodeId, delta: i64 },
    /// Create a node at a position.
    Create { x: i32, y: i32 },
    /// Remove a node.
    Remove(NodeId),
    /// Save the topology, to the given path or back to the scene file.
    Save(Option<String>),
    /// Rebuild the simulation from the scene file.
    Reload,
    /// Log the current reachability links.
    Links,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("'{command}' expects {expected}")]
    BadArguments { command: String, expected: &'static str },
}

fn bad(command: &str, expected: &'static str) -> CommandParseError {
    CommandParseError::BadArguments {
        command: command.to_string(),
        expected,
    }
}

impl FromStr for ControlCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let name = parts.next().ok_or(CommandParseError::Empty)?;
        let args: Vec<&str> = parts.collect();

        let command = match (name, args.as_slice()) {
            ("inject", []) => ControlCommand::Inject,
            ("step", []) => ControlCommand::Step(1),
            ("step", [n]) => ControlCommand::Step(n.parse().map_err(|_| bad(name, "a step count"))?),
            ("toggle", [id]) => ControlCommand::Toggle(id.parse().map_err(|_| bad(name, "a node id"))?),
            ("power", [id, delta]) => ControlCommand::Power {
                node_id: id.parse().map_err(|_| bad(name, "a node id and a signed delta"))?,
                delta: delta.parse().map_err(|_| bad(name, "a node id and a signed delta"))?,
            },
            ("create", [x, y]) => ControlCommand::Create {
                x: x.parse().map_err(|_| bad(name, "integer x and y"))?,
                y: y.parse().map_err(|_| bad(name, "integer x and y"))?,
            },
            ("remove", [id]) => ControlCommand::Remove(id.parse().map_err(|_| bad(name, "a node id"))?),
            ("save", []) => ControlCommand::Save(None),
            ("save", [path]) => ControlCommand::Save(Some(path.to_string())),
            ("reload", []) => ControlCommand::Reload,
            ("links", []) => ControlCommand::Links,
            ("inject" | "reload" | "links", _) => return Err(bad(name, "no arguments")),
            ("step", _) => return Err(bad(name, "an optional step count")),
            ("toggle" | "remove", _) => return Err(bad(name, "a node id")),
            ("power", _) => return Err(bad(name, "a node id and a signed delta")),
            ("create", _) => return Err(bad(name, "integer x and y")),
            ("save", _) => return Err(bad(name, "an optional path")),
            _ => return Err(CommandParseError::UnknownCommand(name.to_string())),
        };

        Ok(command)
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlCommand::Inject => write!(f, "inject"),
            ControlCommand::Step(n) => write!(f, "step {}", n),
            ControlCommand::Toggle(id) => write!(f, "toggle {}", id),
            ControlCommand::Power { node_id, delta } => write!(f, "power {} {:+}", node_id, delta),
            ControlCommand::Create { x, y } => write!(f, "create {} {}", x, y),
            ControlCommand::Remove(id) => write!(f, "remove {}", id),
            ControlCommand::Save(Some(path)) => write!(f, "save {}", path),
            ControlCommand::Save(None) => write!(f, "save"),
            ControlCommand::Reload => write!(f, "reload"),
            ControlCommand::Links => write!(f, "links"),
        }
    }
}

/// Parse a script: one command per line, `#` starts a comment, blank lines
/// are skipped. Errors carry the 1-based line number.
pub fn parse_script(script: &str) -> Result<Vec<ControlCommand>, (usize, CommandParseError)> {
    let mut commands = Vec::new();
    for (index, raw) in script.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        commands.push(line.parse().map_err(|e| (index + 1, e))?);
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        assert_eq!("inject".parse(), Ok(ControlCommand::Inject));
        assert_eq!("step".parse(), Ok(ControlCommand::Step(1)));
        assert_eq!("step 12".parse(), Ok(ControlCommand::Step(12)));
        assert_eq!("toggle 3".parse(), Ok(ControlCommand::Toggle(3)));
        assert_eq!("power 3 -2".parse(), Ok(ControlCommand::Power { node_id: 3, delta: -2 }));
        assert_eq!("create -4 7".parse(), Ok(ControlCommand::Create { x: -4, y: 7 }));
        assert_eq!("remove 1".parse(), Ok(ControlCommand::Remove(1)));
        assert_eq!("save".parse(), Ok(ControlCommand::Save(None)));
        assert_eq!("save out.json".parse(), Ok(ControlCommand::Save(Some("out.json".to_string()))));
        assert_eq!("reload".parse(), Ok(ControlCommand::Reload));
        assert_eq!("  links  ".parse(), Ok(ControlCommand::Links));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!("".parse::<ControlCommand>(), Err(CommandParseError::Empty));
        assert_eq!(
            "fly 1".parse::<ControlCommand>(),
            Err(CommandParseError::UnknownCommand("fly".to_string()))
        );
        assert!(matches!(
            "toggle x".parse::<ControlCommand>(),
            Err(CommandParseError::BadArguments { .. })
        ));
        assert!(matches!(
            "step -1".parse::<ControlCommand>(),
            Err(CommandParseError::BadArguments { .. })
        ));
        assert!(matches!(
            "inject now".parse::<ControlCommand>(),
            Err(CommandParseError::BadArguments { .. })
        ));
    }

    #[test]
    fn display_matches_parse_syntax() {
        let command = ControlCommand::Power { node_id: 2, delta: 3 };
        assert_eq!(command.to_string(), "power 2 +3");
        assert_eq!(command.to_string().parse(), Ok(command));
    }

    #[test]
    fn script_skips_comments_and_reports_line() {
        let script = "# warm up\ninject\n\nstep 3 # three hops\n";
        assert_eq!(
            parse_script(script),
            Ok(vec![ControlCommand::Inject, ControlCommand::Step(3)])
        );

        let err = parse_script("inject\nwarp 9\n").unwrap_err();
        assert_eq!(err.0, 2);
    }
}
