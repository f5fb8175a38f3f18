//! Domain types for NeuroQuant

pub mod action;
pub mod bar;
pub mod frame;
pub mod portfolio;
pub mod series;

pub use action::Action;
pub use bar::Bar;
pub use frame::MarketFrame;
pub use portfolio::PortfolioState;
pub use series::{frames_from_closes, MarketSeries, SeriesError};
