//! Charts module - Dashboard rendering

mod renderer;
mod style;

pub use renderer::{DashboardData, DashboardRenderer, PlotError};
pub use style::{parse_hex_color, ChartStyle, ResolvedStyle, StyleError};
