//! Compile clan chat notifications into per-player statistics.
//!
//! Lines flow through [`classify`] into a [`tally::PlayerTally`], are scored by [`reward`], merged
//! into the month's [`ledger`], and rendered into Discord-sized chunks by [`report`].

pub mod classify;
pub mod compile;
pub mod date_range;
pub mod history;
pub mod ledger;
pub mod report;
pub mod reward;
pub mod tally;
