pub mod config;
pub mod display;
pub mod gate;
pub mod governor;
pub mod host;
pub mod input;
pub mod messages;
pub mod mixer;
pub mod motor;
pub mod runtime;
