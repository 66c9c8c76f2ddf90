//! Statistics Calculator Module
//! Aggregate views over the canonical listings: grouped price summaries,
//! category frequencies, correlations and histograms.

use crate::data::schema::{NEIGHBOURHOOD, NEIGHBOURHOOD_GROUP, PRICE, ROOM_TYPE};
use polars::prelude::*;
use serde::Serialize;
use statrs::statistics::{Data, Median, Statistics};
use thiserror::Error;

const MEAN_PRICE: &str = "mean_price";
const COUNT: &str = "count";

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Count, mean, median and sample standard deviation of one set of values.
/// Undefined figures are NaN.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

/// Mean price and listing count for one group key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPrice {
    pub group: String,
    pub mean_price: f64,
    pub count: usize,
}

/// Number of listings carrying one category value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Symmetric Pearson correlation matrix.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == row)?;
        let j = self.columns.iter().position(|c| c == column)?;
        Some(self.values[i][j])
    }
}

/// Equal-width bins over `[start, start + bin_width * counts.len()]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub start: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bin_range(&self, bin: usize) -> (f64, f64) {
        let low = self.start + self.bin_width * bin as f64;
        (low, low + self.bin_width)
    }

    pub fn end(&self) -> f64 {
        self.start + self.bin_width * self.counts.len() as f64
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().fold(0, usize::max)
    }
}

/// Handles statistical calculations over the canonical listing frame.
pub struct StatsCalculator;

impl StatsCalculator {
    pub fn describe(values: &[f64]) -> DescriptiveStats {
        DescriptiveStats {
            count: values.len(),
            mean: values.iter().mean(),
            median: Data::new(values.to_vec()).median(),
            std: values.iter().std_dev(),
        }
    }

    /// Non-null values of a numeric column.
    pub fn column_values(df: &DataFrame, column: &str) -> Result<Vec<f64>, StatsError> {
        Ok(Self::optional_values(df, column)?.into_iter().flatten().collect())
    }

    /// Values of a numeric column, nulls kept in place.
    pub fn optional_values(df: &DataFrame, column: &str) -> Result<Vec<Option<f64>>, StatsError> {
        let values = df.column(column)?.cast(&DataType::Float64)?;
        Ok(values.f64()?.into_iter().collect())
    }

    /// Listing count per room type, most frequent first, ties by name.
    pub fn room_type_distribution(df: &DataFrame) -> Result<Vec<CategoryCount>, StatsError> {
        let out = df
            .clone()
            .lazy()
            .group_by([col(ROOM_TYPE)])
            .agg([len().alias(COUNT)])
            .sort_by_exprs(
                [col(COUNT), col(ROOM_TYPE)],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .collect()?;

        let categories = out.column(ROOM_TYPE)?.cast(&DataType::String)?;
        let counts = out.column(COUNT)?.cast(&DataType::UInt64)?;
        Ok(categories
            .str()?
            .into_iter()
            .zip(counts.u64()?.into_iter())
            .map(|(category, count)| CategoryCount {
                category: category.unwrap_or_default().to_string(),
                count: count.unwrap_or(0) as usize,
            })
            .collect())
    }

    /// The most frequent room type.
    pub fn modal_room_type(distribution: &[CategoryCount]) -> Option<&CategoryCount> {
        distribution
            .iter()
            .min_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)))
    }

    /// Mean price and count per neighbourhood group, ordered by group name.
    pub fn group_price_summary(df: &DataFrame) -> Result<Vec<GroupPrice>, StatsError> {
        let out = Self::grouped_prices(df, NEIGHBOURHOOD_GROUP)
            .sort_by_exprs([col(NEIGHBOURHOOD_GROUP)], SortMultipleOptions::default())
            .collect()?;
        Self::read_group_prices(&out, NEIGHBOURHOOD_GROUP)
    }

    /// The `n` neighbourhoods with the highest mean price.
    ///
    /// Ties on mean price are broken by neighbourhood name, ascending.
    pub fn top_neighbourhoods(df: &DataFrame, n: usize) -> Result<Vec<GroupPrice>, StatsError> {
        let out = Self::grouped_prices(df, NEIGHBOURHOOD)
            .sort_by_exprs(
                [col(MEAN_PRICE), col(NEIGHBOURHOOD)],
                SortMultipleOptions::default().with_order_descending_multi([true, false]),
            )
            .limit(n as IdxSize)
            .collect()?;
        Self::read_group_prices(&out, NEIGHBOURHOOD)
    }

    /// Group summaries ranked by listing count, largest first, ties by name.
    pub fn rank_by_count(summary: &[GroupPrice]) -> Vec<GroupPrice> {
        let mut ranked = summary.to_vec();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.group.cmp(&b.group)));
        ranked
    }

    /// Group summaries ranked by mean price, highest first, ties by name.
    pub fn rank_by_mean_price(summary: &[GroupPrice]) -> Vec<GroupPrice> {
        let mut ranked = summary.to_vec();
        ranked.sort_by(|a, b| {
            b.mean_price
                .partial_cmp(&a.mean_price)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.group.cmp(&b.group))
        });
        ranked
    }

    fn grouped_prices(df: &DataFrame, key: &str) -> LazyFrame {
        df.clone().lazy().group_by([col(key)]).agg([
            col(PRICE).mean().alias(MEAN_PRICE),
            col(PRICE).count().alias(COUNT),
        ])
    }

    fn read_group_prices(out: &DataFrame, key: &str) -> Result<Vec<GroupPrice>, StatsError> {
        let groups = out.column(key)?.cast(&DataType::String)?;
        let means = out.column(MEAN_PRICE)?.cast(&DataType::Float64)?;
        let counts = out.column(COUNT)?.cast(&DataType::UInt64)?;

        Ok(groups
            .str()?
            .into_iter()
            .zip(means.f64()?.into_iter())
            .zip(counts.u64()?.into_iter())
            .map(|((group, mean), count)| GroupPrice {
                group: group.unwrap_or_default().to_string(),
                mean_price: mean.unwrap_or(f64::NAN),
                count: count.unwrap_or(0) as usize,
            })
            .collect())
    }

    /// Pairwise Pearson correlation over the given numeric columns.
    ///
    /// Each pair uses the rows where both values are present. The diagonal is
    /// exactly 1.0 whenever the column has at least two values and nonzero
    /// variance, NaN otherwise.
    pub fn correlation_matrix(df: &DataFrame, columns: &[&str]) -> Result<CorrelationMatrix, StatsError> {
        let data = columns
            .iter()
            .map(|name| Self::optional_values(df, name))
            .collect::<Result<Vec<_>, _>>()?;

        let n = columns.len();
        let mut values = vec![vec![f64::NAN; n]; n];
        for i in 0..n {
            for j in i..n {
                let (xs, ys): (Vec<f64>, Vec<f64>) = data[i]
                    .iter()
                    .zip(&data[j])
                    .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                    .unzip();

                let r = if i == j {
                    if xs.len() > 1 && xs.iter().variance() > 0.0 {
                        1.0
                    } else {
                        f64::NAN
                    }
                } else {
                    Self::pearson(&xs, &ys)
                };
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        Ok(CorrelationMatrix {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            values,
        })
    }

    /// Sample Pearson correlation; NaN for fewer than two pairs or zero variance.
    pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
        if xs.len() != ys.len() || xs.len() < 2 {
            return f64::NAN;
        }

        let sx = xs.iter().std_dev();
        let sy = ys.iter().std_dev();
        if sx == 0.0 || sy == 0.0 {
            return f64::NAN;
        }

        (xs.iter().covariance(ys.iter()) / (sx * sy)).clamp(-1.0, 1.0)
    }

    /// Count values into `bins` equal-width bins spanning their range.
    /// The maximum value lands in the last bin.
    pub fn histogram(values: &[f64], bins: usize) -> Histogram {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let bins = bins.max(1);
        if finite.is_empty() {
            return Histogram {
                start: 0.0,
                bin_width: 1.0,
                counts: vec![0; bins],
            };
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let bin_width = if max > min { (max - min) / bins as f64 } else { 1.0 };

        let mut counts = vec![0; bins];
        for v in finite {
            let index = (((v - min) / bin_width).floor() as usize).min(bins - 1);
            counts[index] += 1;
        }

        Histogram {
            start: min,
            bin_width,
            counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{CORRELATION_COLUMNS, MINIMUM_NIGHTS, NUMBER_OF_REVIEWS, REVIEWS_PER_MONTH};

    fn listings(rows: &[(&str, &str, &str, f64)]) -> DataFrame {
        let n = rows.len();
        DataFrame::new(vec![
            Column::new(NEIGHBOURHOOD_GROUP.into(), rows.iter().map(|r| r.0).collect::<Vec<_>>()),
            Column::new(NEIGHBOURHOOD.into(), rows.iter().map(|r| r.1).collect::<Vec<_>>()),
            Column::new(ROOM_TYPE.into(), rows.iter().map(|r| r.2).collect::<Vec<_>>()),
            Column::new(PRICE.into(), rows.iter().map(|r| r.3).collect::<Vec<_>>()),
            Column::new(MINIMUM_NIGHTS.into(), (1..=n as i64).collect::<Vec<_>>()),
            Column::new(NUMBER_OF_REVIEWS.into(), (0..n as i64).map(|i| (i * 7) % 5).collect::<Vec<_>>()),
            Column::new(REVIEWS_PER_MONTH.into(), (0..n).map(|i| i as f64 * 0.3 + 0.1).collect::<Vec<_>>()),
        ])
        .unwrap()
    }

    fn sample() -> DataFrame {
        listings(&[
            ("Brooklyn", "Williamsburg", "Entire home/apt", 200.0),
            ("Brooklyn", "Bushwick", "Private room", 60.0),
            ("Manhattan", "Harlem", "Private room", 80.0),
            ("Manhattan", "Chelsea", "Entire home/apt", 300.0),
            ("Manhattan", "Chelsea", "Shared room", 100.0),
        ])
    }

    #[test]
    fn describe_matches_known_values() {
        let stats = StatsCalculator::describe(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert!((stats.std - 1.290_994_448_735_805_6).abs() < 1e-12);

        let empty = StatsCalculator::describe(&[]);
        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_nan());
        assert!(StatsCalculator::describe(&[7.0]).std.is_nan());
    }

    #[test]
    fn room_types_are_counted_most_frequent_first() {
        let distribution = StatsCalculator::room_type_distribution(&sample()).unwrap();
        assert_eq!(
            distribution,
            vec![
                CategoryCount { category: "Entire home/apt".into(), count: 2 },
                CategoryCount { category: "Private room".into(), count: 2 },
                CategoryCount { category: "Shared room".into(), count: 1 },
            ]
        );
        let modal = StatsCalculator::modal_room_type(&distribution).unwrap();
        assert_eq!(modal.category, "Entire home/apt");
    }

    #[test]
    fn group_summary_has_mean_and_count() {
        let summary = StatsCalculator::group_price_summary(&sample()).unwrap();
        assert_eq!(
            summary,
            vec![
                GroupPrice { group: "Brooklyn".into(), mean_price: 130.0, count: 2 },
                GroupPrice { group: "Manhattan".into(), mean_price: 160.0, count: 3 },
            ]
        );
        assert_eq!(summary.iter().map(|g| g.count).sum::<usize>(), 5);

        let by_count = StatsCalculator::rank_by_count(&summary);
        assert_eq!(by_count[0].group, "Manhattan");
        let by_price = StatsCalculator::rank_by_mean_price(&summary);
        assert_eq!(by_price[0].group, "Manhattan");
    }

    #[test]
    fn top_neighbourhoods_rank_by_mean_then_name() {
        let df = listings(&[
            ("Queens", "Zeta", "Private room", 100.0),
            ("Queens", "Alpha", "Private room", 100.0),
            ("Queens", "Mid", "Private room", 150.0),
            ("Queens", "Low", "Private room", 50.0),
        ]);

        let top = StatsCalculator::top_neighbourhoods(&df, 3).unwrap();
        let names: Vec<&str> = top.iter().map(|g| g.group.as_str()).collect();
        assert_eq!(names, vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn top_neighbourhoods_truncates_to_ten() {
        let rows: Vec<(String, f64)> = (0..15).map(|i| (format!("Area {i:02}"), 10.0 * i as f64)).collect();
        let df = listings(
            &rows
                .iter()
                .map(|(name, price)| ("Bronx", name.as_str(), "Private room", *price))
                .collect::<Vec<_>>(),
        );

        let top = StatsCalculator::top_neighbourhoods(&df, 10).unwrap();
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].group, "Area 14");
        assert_eq!(top[9].group, "Area 05");
    }

    #[test]
    fn correlation_diagonal_is_exactly_one() {
        let matrix = StatsCalculator::correlation_matrix(&sample(), &CORRELATION_COLUMNS).unwrap();
        for (i, row) in matrix.values.iter().enumerate() {
            assert_eq!(row[i], 1.0);
            for (j, value) in row.iter().enumerate() {
                assert_eq!(value.to_bits(), matrix.values[j][i].to_bits());
            }
        }
        // minimum_nights and reviews_per_month are both linear in the row index
        let r = matrix.get(MINIMUM_NIGHTS, REVIEWS_PER_MONTH).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_handles_degenerate_input() {
        assert!(StatsCalculator::pearson(&[1.0], &[2.0]).is_nan());
        assert!(StatsCalculator::pearson(&[1.0, 1.0], &[2.0, 3.0]).is_nan());
        let r = StatsCalculator::pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_frame_gives_empty_aggregates() {
        let df = listings(&[]);
        assert!(StatsCalculator::room_type_distribution(&df).unwrap().is_empty());
        assert!(StatsCalculator::group_price_summary(&df).unwrap().is_empty());
        assert!(StatsCalculator::top_neighbourhoods(&df, 10).unwrap().is_empty());

        let matrix = StatsCalculator::correlation_matrix(&df, &CORRELATION_COLUMNS).unwrap();
        assert!(matrix.values.iter().flatten().all(|v| v.is_nan()));
        assert!(StatsCalculator::modal_room_type(&[]).is_none());
    }

    #[test]
    fn histogram_places_max_in_last_bin() {
        let histogram = StatsCalculator::histogram(&[0.0, 1.0, 2.0, 10.0], 5);
        assert_eq!(histogram.counts, vec![2, 1, 0, 0, 1]);
        assert_eq!(histogram.bin_range(1), (2.0, 4.0));
        assert_eq!(histogram.end(), 10.0);
        assert_eq!(histogram.max_count(), 2);

        let flat = StatsCalculator::histogram(&[5.0, 5.0], 3);
        assert_eq!(flat.counts, vec![2, 0, 0]);
        assert_eq!(StatsCalculator::histogram(&[], 4).counts, vec![0; 4]);
    }
}
