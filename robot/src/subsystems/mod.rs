pub mod algae;
pub mod coral;
pub mod drive;
pub mod kinematics;

pub use algae::AlgaeSubsystem;
pub use coral::{CoralSubsystem, Setpoint};
pub use drive::DriveSubsystem;
