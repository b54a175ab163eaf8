use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use super::{AutoError, ParseSnafu, ReadSnafu};

/// The contents of a `.auto` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoRoutine {
    #[serde(default)]
    pub version: Option<String>,
    pub command: AutoStep,
    #[serde(default)]
    pub reset_odom: bool,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub choreo_auto: bool,
}

/// One node of a routine's command tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum AutoStep {
    Wait {
        #[serde(rename = "waitTime")]
        wait_time: f64,
    },
    Named {
        name: Option<String>,
    },
    Path {
        #[serde(rename = "pathName")]
        path_name: Option<String>,
    },
    Sequential {
        commands: Vec<AutoStep>,
    },
    Parallel {
        commands: Vec<AutoStep>,
    },
    Race {
        commands: Vec<AutoStep>,
    },
    Deadline {
        commands: Vec<AutoStep>,
    },
}

impl AutoRoutine {
    pub fn load(path: &Path) -> Result<Self, AutoError> {
        let text = fs::read_to_string(path).context(ReadSnafu { path })?;
        serde_json::from_str(&text).context(ParseSnafu { path })
    }
}

impl AutoStep {
    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a AutoStep)) {
        f(self);
        match self {
            Self::Sequential { commands }
            | Self::Parallel { commands }
            | Self::Race { commands }
            | Self::Deadline { commands } => {
                for command in commands {
                    command.visit(f);
                }
            }
            Self::Wait { .. } | Self::Named { .. } | Self::Path { .. } => {}
        }
    }

    /// Names of the named commands this step refers to, in order of appearance.
    pub fn named_commands(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.visit(&mut |step| {
            if let Self::Named { name: Some(name) } = step {
                names.push(name.as_str());
            }
        });
        names
    }

    /// Names of the paths this step follows, in order of appearance.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths = Vec::new();
        self.visit(&mut |step| {
            if let Self::Path { path_name: Some(path) } = step {
                paths.push(path.as_str());
            }
        });
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCORE_TWO: &str = r#"{
      "version": "2025.0",
      "command": {
        "type": "sequential",
        "data": {
          "commands": [
            { "type": "named", "data": { "name": "L4" } },
            { "type": "path", "data": { "pathName": "Reef To Station" } },
            {
              "type": "deadline",
              "data": {
                "commands": [
                  { "type": "wait", "data": { "waitTime": 1.5 } },
                  { "type": "named", "data": { "name": "Grab Coral" } }
                ]
              }
            },
            { "type": "named", "data": { "name": null } }
          ]
        }
      },
      "resetOdom": true,
      "folder": null,
      "choreoAuto": false
    }"#;

    #[test]
    fn parses_pathplanner_layout() {
        let routine: AutoRoutine = serde_json::from_str(SCORE_TWO).unwrap();
        assert!(routine.reset_odom);
        assert_eq!(routine.version.as_deref(), Some("2025.0"));
        assert_eq!(routine.command.named_commands(), vec!["L4", "Grab Coral"]);
        assert_eq!(routine.command.paths(), vec!["Reef To Station"]);

        let AutoStep::Sequential { commands } = &routine.command else {
            panic!("expected a sequential root");
        };
        assert_eq!(commands[2], AutoStep::Deadline {
            commands: vec![
                AutoStep::Wait { wait_time: 1.5 },
                AutoStep::Named { name: Some("Grab Coral".into()) },
            ],
        });
    }

    #[test]
    fn optional_fields_default() {
        let routine: AutoRoutine =
            serde_json::from_str(r#"{ "command": { "type": "wait", "data": { "waitTime": 0.5 } } }"#)
                .unwrap();
        assert!(!routine.reset_odom);
        assert!(routine.folder.is_none());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AutoRoutine::load(&dir.path().join("missing.auto")).unwrap_err();
        assert!(matches!(err, AutoError::Read { .. }));
    }
}
