pub mod app_settings;
pub mod codec;
pub mod countdown;
pub mod error;
pub mod history;
pub mod messages;
pub mod network;
pub mod pairing;
pub mod phase_gate;
pub mod profile;
pub mod refresher;
pub mod roster;
pub mod session;
pub mod submission;
