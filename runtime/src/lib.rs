//! tabveil: disguise open browser tabs and put them back.
//!
//! [`engine::DisguiseEngine`] captures each eligible tab's title and favicon
//! once per disguise cycle, rewrites them concurrently, and restores them
//! from the snapshot on undo. Browser access goes through
//! [`host::TabHost`]; persistence through [`store::KeyValueStore`].

pub mod accessor;
pub mod cli;
pub mod config;
pub mod engine;
pub mod host;
pub mod mapping;
pub mod store;
pub mod tabs;
