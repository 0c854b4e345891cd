pub mod combat;
pub mod config;
pub mod content;
pub mod dialogue;
pub mod effects;
pub mod eligibility;
pub mod endings;
pub mod log;
pub mod persistence;
pub mod random_event;
pub mod rng;
pub mod session;
