pub mod chart;
pub mod setup;
pub mod ui;
pub mod watch;
