use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use frc_command::{dashboard, robot::RobotRunner};
use reefscape_robot::{
    config::RobotConfig,
    container::AUTO_CHOOSER_KEY,
    sim::{run_match, MatchPlan},
    Robot,
};

fn deploy_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("deploy")
}

fn robot() -> Robot {
    let mut config = RobotConfig::default();
    config.auto.deploy_dir = deploy_dir();
    Robot::new(config).unwrap()
}

fn plan(autonomous: u64, teleop: u64) -> MatchPlan {
    MatchPlan {
        autonomous: Duration::from_secs(autonomous),
        teleop: Duration::from_secs(teleop),
        realtime: false,
    }
}

#[test]
fn deployed_autos_are_offered() {
    let robot = robot();
    assert_eq!(
        robot.container().auto_chooser().option_names(),
        ["None", "Score L4", "Two Algae"]
    );
}

#[test]
fn sample_config_loads() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("robot.toml");
    let config = RobotConfig::load(&path).unwrap();
    assert_eq!(config, RobotConfig::default());
}

#[test]
fn score_l4_returns_to_the_feeder_station() {
    let robot = robot();
    dashboard::put_string(format!("{AUTO_CHOOSER_KEY}/selected"), "Score L4");

    let mut runner = RobotRunner::new(robot);
    let summary = run_match(&mut runner, &plan(5, 1)).unwrap();

    assert_eq!(summary.auto, "Score L4");
    assert_eq!(summary.loops, 1 + 250 + 50 + 1);
    assert!(!summary.running_at_auto_end.contains(&"Score L4".to_owned()));
    assert!((summary.arm_position - 33.0).abs() < 1.5, "{summary:?}");
    assert!(summary.elevator_position.abs() < 1.5, "{summary:?}");
    assert!(summary.peak_current_draw > 50.0);
}

#[test]
fn two_algae_ends_holding_a_ball() {
    let robot = robot();
    dashboard::put_string(format!("{AUTO_CHOOSER_KEY}/selected"), "Two Algae");

    let mut runner = RobotRunner::new(robot);
    let summary = run_match(&mut runner, &plan(6, 2)).unwrap();

    assert_eq!(summary.auto, "Two Algae");
    assert!(summary.running_at_auto_end.contains(&"Algae Idle".to_owned()));
    assert!((summary.algae_arm_position - 11.5).abs() < 1.0, "{summary:?}");
    let algae = runner.robot().container().algae().borrow();
    assert!(!algae.stow_when_idle());
}

#[test]
fn unknown_selection_runs_nothing() {
    let robot = robot();
    dashboard::put_string(format!("{AUTO_CHOOSER_KEY}/selected"), "Three Piece");

    let mut runner = RobotRunner::new(robot);
    let summary = run_match(&mut runner, &plan(1, 0)).unwrap();
    assert_eq!(summary.auto, "None");
}
