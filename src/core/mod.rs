pub mod alerts;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod replay;
pub mod sounds;
pub mod translate;
