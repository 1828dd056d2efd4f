//! Statistics over a [`SalesTable`].
//!
//! Every function here is pure: it reads the table (or a series derived from
//! it) and returns a new value. Nothing is cached and the table is never
//! modified.

use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    money::Money,
    table::{SalesTable, DAYS},
};

/// Cost price as a fraction of selling price, used when none is given.
pub const DEFAULT_COST_RATIO: f64 = 0.6;

/// Units each item starts the period with, used when none is given.
pub const DEFAULT_INITIAL_STOCK: i64 = 500;

/// Moving-average window for forecasts, in days.
pub const DEFAULT_WINDOW: usize = 3;

/// Returns the total revenue over all items and all days.
#[must_use]
pub fn total_sales(table: &SalesTable) -> Money {
    table.iter().map(|r| r.revenue()).sum()
}

/// Returns the revenue across all items for each day, `Day1` first.
#[must_use]
pub fn daily_totals(table: &SalesTable) -> Vec<Money> {
    let mut totals = vec![Money::ZERO; DAYS];
    for record in table {
        for (total, &units) in totals.iter_mut().zip(&record.daily_sales) {
            *total += record.price * units;
        }
    }
    totals
}

/// Returns the mean of the daily totals, in rupees.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn daily_average(table: &SalesTable) -> f64 {
    total_sales(table).as_major() / DAYS as f64
}

/// Returns the change in total revenue from each day to the next.
///
/// The result has 29 entries: entry `d` is the total for day `d + 2` minus
/// the total for day `d + 1`. This is a revenue difference only; no costs are
/// taken into account.
#[must_use]
pub fn day_over_day_change(table: &SalesTable) -> Vec<Money> {
    daily_totals(table)
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect()
}

/// The best and worst selling days, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtremeDays {
    pub best: usize,
    pub worst: usize,
}

/// Returns the days with the highest and lowest totals.
///
/// When several days share the highest (or lowest) total, the earliest of
/// them is returned. Returns `None` for an empty series.
#[must_use]
pub fn extreme_days(daily_totals: &[Money]) -> Option<ExtremeDays> {
    let first = *daily_totals.first()?;
    let mut best = (0, first);
    let mut worst = (0, first);
    for (idx, &total) in daily_totals.iter().enumerate().skip(1) {
        if total > best.1 {
            best = (idx, total);
        }
        if total < worst.1 {
            worst = (idx, total);
        }
    }
    Some(ExtremeDays {
        best: best.0 + 1,
        worst: worst.0 + 1,
    })
}

/// Returns, for each category, the item with the highest revenue.
///
/// Categories are listed in the order they first appear in the table. Ties
/// within a category go to the record that appears first.
#[must_use]
pub fn top_item_per_category(table: &SalesTable) -> Vec<(String, String)> {
    let mut best: Vec<(&str, &str, Money)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in table {
        let revenue = record.revenue();
        match index.get(record.category.as_str()) {
            Some(&i) => {
                if revenue > best[i].2 {
                    best[i] = (record.category.as_str(), record.item.as_str(), revenue);
                }
            }
            None => {
                index.insert(record.category.as_str(), best.len());
                best.push((record.category.as_str(), record.item.as_str(), revenue));
            }
        }
    }
    best.into_iter()
        .map(|(category, item, _)| (category.to_string(), item.to_string()))
        .collect()
}

/// Stock left for one item at the end of the period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    pub item: String,
    /// Negative when more units were sold than were in stock.
    pub remaining: i128,
}

/// Returns the stock left for each item, assuming every item started the
/// period with `initial_stock` units.
///
/// The result is wide enough for any `initial_stock` minus any number of
/// units a record can hold.
#[must_use]
pub fn remaining_stock(table: &SalesTable, initial_stock: i64) -> Vec<StockLevel> {
    table
        .iter()
        .map(|record| StockLevel {
            item: record.item.clone(),
            remaining: i128::from(initial_stock) - i128::from(record.units_sold()),
        })
        .collect()
}

/// Returns the simple moving averages of `series` over every complete window
/// of `window` consecutive entries, in rupees.
///
/// # Errors
///
/// Returns [`Error::InvalidWindowSize`] if `window` is zero or longer than
/// the series.
#[allow(clippy::cast_precision_loss)]
pub fn moving_averages(series: &[Money], window: usize) -> Result<Vec<f64>> {
    if window == 0 || window > series.len() {
        return Err(Error::InvalidWindowSize {
            window,
            len: series.len(),
        });
    }
    Ok(series
        .windows(window)
        .map(|w| w.iter().copied().sum::<Money>().as_major() / window as f64)
        .collect())
}

/// Forecasts the next value of `series` as the mean of its last `window`
/// entries, in rupees.
///
/// # Examples
///
/// ```
/// # use sales_analysis::{stats, Money};
/// let series = [10, 20, 30].map(Money::from_major);
/// assert_eq!(stats::moving_average_forecast(&series, 2).unwrap(), 25.0);
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidWindowSize`] if `window` is zero or longer than
/// the series.
pub fn moving_average_forecast(series: &[Money], window: usize) -> Result<f64> {
    let averages = moving_averages(series, window)?;
    averages.last().copied().ok_or(Error::InvalidWindowSize {
        window,
        len: series.len(),
    })
}

/// Revenue, cost and profit over the whole period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profitability {
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub margin_percent: f64,
}

/// Returns profit figures assuming each item costs `cost_ratio` times its
/// selling price.
///
/// # Errors
///
/// Returns [`Error::InvalidCostRatio`] if `cost_ratio` is negative or not
/// finite, and [`Error::DivisionUndefined`] if total revenue is zero.
pub fn profitability(table: &SalesTable, cost_ratio: f64) -> Result<Profitability> {
    if !cost_ratio.is_finite() || cost_ratio < 0.0 {
        return Err(Error::InvalidCostRatio(cost_ratio));
    }
    let revenue = total_sales(table);
    if revenue == Money::ZERO {
        return Err(Error::DivisionUndefined);
    }
    let revenue = revenue.as_major();
    let cost = revenue * cost_ratio;
    let profit = revenue - cost;
    Ok(Profitability {
        revenue,
        cost,
        profit,
        margin_percent: profit / revenue * 100.0,
    })
}

/// Returns the total revenue of each category, in the order categories first
/// appear in the table.
#[must_use]
pub fn category_totals(table: &SalesTable) -> Vec<(String, Money)> {
    let mut totals: Vec<(String, Money)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for record in table {
        let i = *index.entry(record.category.as_str()).or_insert_with(|| {
            totals.push((record.category.clone(), Money::ZERO));
            totals.len() - 1
        });
        totals[i].1 += record.revenue();
    }
    totals
}

/// Settings for [`Summary::compute`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryOptions {
    /// Units every item is assumed to start the period with.
    pub initial_stock: i64,
    /// Moving-average window for the sales forecast.
    pub window: usize,
    /// Cost price as a fraction of selling price.
    pub cost_ratio: f64,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            initial_stock: DEFAULT_INITIAL_STOCK,
            window: DEFAULT_WINDOW,
            cost_ratio: DEFAULT_COST_RATIO,
        }
    }
}

/// Every statistic for a table, computed in one pass over the functions in
/// this module.
///
/// Figures that can fail are kept as `Result`s so that one undefined figure
/// does not hide the others.
#[derive(Debug)]
pub struct Summary {
    pub options: SummaryOptions,
    pub total_sales: Money,
    pub daily_totals: Vec<Money>,
    pub daily_average: f64,
    pub day_over_day_change: Vec<Money>,
    pub extreme_days: Option<ExtremeDays>,
    pub top_items: Vec<(String, String)>,
    pub stock: Vec<StockLevel>,
    pub forecast: Result<f64>,
    pub profitability: Result<Profitability>,
    pub category_totals: Vec<(String, Money)>,
}

impl Summary {
    #[must_use]
    pub fn compute(table: &SalesTable, options: &SummaryOptions) -> Self {
        let daily_totals = daily_totals(table);
        Self {
            total_sales: total_sales(table),
            daily_average: daily_average(table),
            day_over_day_change: day_over_day_change(table),
            extreme_days: extreme_days(&daily_totals),
            top_items: top_item_per_category(table),
            stock: remaining_stock(table, options.initial_stock),
            forecast: moving_average_forecast(&daily_totals, options.window),
            profitability: profitability(table, options.cost_ratio),
            category_totals: category_totals(table),
            daily_totals,
            options: *options,
        }
    }
}
