//! Stats module - Aggregate views over cleaned listings

mod calculator;

pub use calculator::{
    CategoryCount, CorrelationMatrix, DescriptiveStats, GroupPrice, Histogram, StatsCalculator,
    StatsError,
};
