pub mod settings;
pub mod stats;
pub mod timer;
pub mod user;
