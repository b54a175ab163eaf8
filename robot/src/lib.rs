//! The 2025 REV starter bot: a swerve drive with a coral elevator and arm
//! and an algae intake, wired for command-based control.

pub mod commands;
pub mod config;
pub mod constants;
pub mod container;
pub mod error;
pub mod logger;
pub mod robot;
pub mod sim;
pub mod subsystems;

pub use container::RobotContainer;
pub use robot::Robot;
