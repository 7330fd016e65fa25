//! Crew roster engine for Star Trek Timelines: buff normalization, roster
//! building across active, frozen and imported crew, usage ranking, and a
//! local JSON API over a signed-in session.

pub mod api;
pub mod cli;
pub mod config;
pub mod crew;
pub mod data;
pub mod galaxy;
pub mod logging;
pub mod server;
