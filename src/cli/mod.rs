pub mod portfolio;
pub mod setup;
pub mod stocks;
pub mod ui;
