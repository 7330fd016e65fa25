pub mod catalog;
pub mod crew;
pub mod player;
pub mod skills;
