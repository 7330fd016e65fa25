//! Galaxy (gather) event helper: which crew to send on each jackpot recipe and
//! what the event's recipes need.

pub mod planner;

pub use planner::{
    calc_chance, event_crew_bonuses, event_progress, farming_list, is_event_recipe,
    plan_galaxy_event, process_archetype, roster_with_bonuses, BonusCrew, CalcSlot, DemandLine,
    EventProgress, FarmEntry, GalaxyContext, ItemDemand, RankedCrew, SlotKind, RARE_TURNIN_VP,
};
