use std::fs;
use std::path::Path;

use placement::{Cell, Footprint, LayerKind, MachineId, Ray, SeatCandidate, SeatId, Vec3};
use serde::{Deserialize, Serialize};

use super::SandboxError;

const DEMO_SESSION_JSON: &str = include_str!("../../assets/demo_session.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SessionScript {
    #[serde(default)]
    pub(crate) seed: u64,
    #[serde(default)]
    pub(crate) agent: Vec3,
    #[serde(default)]
    pub(crate) occluders: Vec<Occluder>,
    pub(crate) steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Occluder {
    pub(crate) center: Vec3,
    pub(crate) radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub(crate) enum Step {
    MoveAgent {
        to: Vec3,
    },
    Place {
        key: String,
        layer: LayerKind,
        cell: Cell,
        #[serde(default)]
        footprint: Footprint,
    },
    /// `cell` is aimed at from straight above unless `pointer` is given. The
    /// removal acts on whichever cell the pointer ray hits.
    Remove {
        cell: Cell,
        #[serde(default)]
        pointer: Option<Ray>,
    },
    Hover {
        cell: Cell,
    },
    EndTool,
    AddMachine {
        machine: MachineId,
    },
    Deposit {
        machine: MachineId,
        amount: u64,
    },
    ApproachMachine {
        machine: MachineId,
    },
    LeaveMachine {
        machine: MachineId,
    },
    GrabMoney,
    AddSeat {
        seat: SeatCandidate,
    },
    TakeSeat {
        anchor: Vec3,
    },
    ReleaseSeat {
        seat: SeatId,
    },
}

pub(crate) fn parse_script(raw: &str) -> Result<SessionScript, SandboxError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        SandboxError::ParseScript {
            location,
            source: error.into_inner(),
        }
    })
}

pub(crate) fn load_script(path: &Path) -> Result<SessionScript, SandboxError> {
    let raw = fs::read_to_string(path).map_err(|source| SandboxError::ReadScript {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&raw)
}

pub(crate) fn demo_script() -> Result<SessionScript, SandboxError> {
    parse_script(DEMO_SESSION_JSON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn demo_script_parses() {
        let script = demo_script().expect("demo script");
        assert!(!script.steps.is_empty());
        assert!(script
            .steps
            .iter()
            .any(|step| matches!(step, Step::Remove { .. })));
    }

    #[test]
    fn step_defaults_apply() {
        let script = parse_script(
            r#"{ "steps": [
                { "op": "place", "key": "tile", "layer": "floor", "cell": { "x": 1, "y": 0, "z": 2 } },
                { "op": "remove", "cell": { "x": 1, "y": 0, "z": 2 } },
                { "op": "grab_money" }
            ] }"#,
        )
        .expect("parse");
        assert_eq!(script.seed, 0);
        assert_eq!(script.agent, Vec3::ZERO);
        assert_eq!(
            script.steps,
            vec![
                Step::Place {
                    key: "tile".to_string(),
                    layer: LayerKind::Floor,
                    cell: Cell::new(1, 0, 2),
                    footprint: Footprint::UNIT,
                },
                Step::Remove {
                    cell: Cell::new(1, 0, 2),
                    pointer: None,
                },
                Step::GrabMoney,
            ]
        );
    }

    #[test]
    fn bad_layer_names_the_step_path() {
        let err = parse_script(
            r#"{ "steps": [
                { "op": "grab_money" },
                { "op": "place", "key": "x", "layer": "roof", "cell": { "x": 0, "y": 0, "z": 0 } }
            ] }"#,
        )
        .expect_err("bad layer");
        match err {
            SandboxError::ParseScript { location, .. } => {
                assert!(location.starts_with("steps[1]"), "{location}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn oversized_footprint_is_a_parse_error() {
        let err = parse_script(
            r#"{ "steps": [
                { "op": "place", "key": "x", "layer": "floor", "cell": { "x": 0, "y": 0, "z": 0 },
                  "footprint": { "width": 3000000000, "depth": 1 } }
            ] }"#,
        )
        .expect_err("oversized footprint");
        match err {
            SandboxError::ParseScript { location, source } => {
                assert!(location.starts_with("steps[0]"), "{location}");
                assert!(source.to_string().contains("exceeds"), "{source}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_script_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "seed": 9, "steps": [ {{ "op": "end_tool" }} ] }}"#).expect("write");
        let script = load_script(file.path()).expect("load");
        assert_eq!(script.seed, 9);
        assert_eq!(script.steps, vec![Step::EndTool]);
    }
}
