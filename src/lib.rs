pub mod config;
pub mod db;
pub mod export;
pub mod filter;
pub mod import;
pub mod known;
pub mod logging;
pub mod navigator;
pub mod normalize;
pub mod record;
pub mod saved;
pub mod score;
pub mod session;
pub mod wallet;

pub const TARGET_DB: &str = "db_query";
pub const TARGET_FILTER: &str = "filter_apply";
pub const TARGET_NORMALIZE: &str = "normalize";
