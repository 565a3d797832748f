//! Alerting scores built on top of the rollups.

pub mod accountability;
pub mod burnout;

pub use accountability::{score_managers, ManagerAccountability};
pub use burnout::{assess_person, detect_burnout_risks, BurnoutRisk};
