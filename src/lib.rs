// Library surface shared by the dashboard binary and the integration tests.
pub mod app_dirs;
pub mod board;
pub mod config;
pub mod device;
pub mod editor;
pub mod recalc;
pub mod runtime;
pub mod schedule;
pub mod status;
pub mod time_of_day;
