pub mod buffs;
pub mod builder;
pub mod export_csv;
pub mod format;
pub mod search;
pub mod usage;

pub use buffs::{BuffConfig, BuffOperator, BuffStat};
pub use builder::{
    build_active_roster, build_crew_data, build_crew_data_all, crew_to_roster,
    frozen_roster_entry, FrozenCrewSource, RosterContext, SyntheticIds,
};
pub use format::format_crew_stats;
pub use search::{crew_matches, filter_crew};
pub use usage::{collect_usage, rank_usage, RankField};
