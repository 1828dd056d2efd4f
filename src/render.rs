//! Text tables and terminal charts for the figures in [`crate::stats`].

use comfy_table::{presets::ASCII_MARKDOWN, Cell, CellAlignment, Table};

use std::fmt::Display;

use crate::{
    money::Money,
    stats::{StockLevel, Summary},
    table::{SalesTable, DAYS},
};

const AXIS_WIDTH: usize = 12;

/// Formats an amount as rupees, e.g. `₹1250.00`.
#[must_use]
pub fn rupees(amount: Money) -> String {
    format!("₹{amount}")
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN).set_header(header);
    table
}

fn right(value: impl Display) -> Cell {
    Cell::new(value).set_alignment(CellAlignment::Right)
}

/// Returns every record with its price, daily sales and total units.
#[must_use]
pub fn product_table(sales: &SalesTable) -> Table {
    let days: Vec<String> = (1..=DAYS).map(|d| format!("Day{d}")).collect();
    let mut header = vec!["Item", "Category", "Price"];
    header.extend(days.iter().map(String::as_str));
    header.push("Units");
    let mut table = new_table(header);
    for record in sales {
        let mut row = vec![
            Cell::new(&record.item),
            Cell::new(&record.category),
            right(record.price),
        ];
        row.extend(record.daily_sales.iter().map(right));
        row.push(right(record.units_sold()));
        table.add_row(row);
    }
    table
}

/// Returns each day's total revenue alongside its change from the day before.
#[must_use]
pub fn daily_table(daily_totals: &[Money], changes: &[Money]) -> Table {
    let mut table = new_table(vec!["Day", "Total", "Change"]);
    for (idx, &total) in daily_totals.iter().enumerate() {
        let change = idx
            .checked_sub(1)
            .and_then(|prev| changes.get(prev))
            .map_or_else(String::new, ToString::to_string);
        table.add_row(vec![right(idx + 1), right(total), right(change)]);
    }
    table
}

#[must_use]
pub fn winners_table(winners: &[(String, String)]) -> Table {
    let mut table = new_table(vec!["Category", "Top item"]);
    for (category, item) in winners {
        table.add_row(vec![category, item]);
    }
    table
}

#[must_use]
pub fn stock_table(stock: &[StockLevel]) -> Table {
    let mut table = new_table(vec!["Item", "Remaining stock"]);
    for level in stock {
        table.add_row(vec![Cell::new(&level.item), right(level.remaining)]);
    }
    table
}

#[must_use]
pub fn category_table(totals: &[(String, Money)]) -> Table {
    let mut table = new_table(vec!["Category", "Revenue"]);
    for (category, total) in totals {
        table.add_row(vec![Cell::new(category), right(rupees(*total))]);
    }
    table
}

/// Maps `value` in `0..=span` onto `0..=steps`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn scale(value: f64, span: f64, steps: usize) -> usize {
    if span <= 0.0 {
        return 0;
    }
    let scaled = (value / span * steps as f64).round();
    (scaled.max(0.0) as usize).min(steps)
}

fn x_axis(out: &mut String, days: usize) {
    out.push_str(&format!("{:AXIS_WIDTH$} +{}\n", "", "---".repeat(days)));
    let labels: String = (1..=days)
        .map(|day| {
            if day == 1 || day % 5 == 0 {
                format!("{day:>3}")
            } else {
                "   ".to_string()
            }
        })
        .collect();
    out.push_str(&format!("{:AXIS_WIDTH$}  {labels}\n", ""));
    out.push_str(&format!("{:AXIS_WIDTH$}  {:^width$}\n", "", "Day", width = days * 3));
}

/// Plots daily totals as points, one column per day, between the lowest
/// and highest total.
#[must_use]
pub fn line_chart(daily_totals: &[Money], height: usize) -> String {
    let height = height.max(2);
    let values: Vec<f64> = daily_totals.iter().map(|m| m.as_major()).collect();
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let rows: Vec<usize> = values
        .iter()
        .map(|&v| scale(v - lo, hi - lo, height - 1))
        .collect();
    let mut out = format!("Daily Sales Trend Over {} Days (₹)\n", values.len());
    for row in (0..height).rev() {
        let label = match row {
            r if r == height - 1 && !values.is_empty() => format!("{hi:.2}"),
            0 if !values.is_empty() => format!("{lo:.2}"),
            _ => String::new(),
        };
        let points: String = rows
            .iter()
            .map(|&r| if r == row { "  *" } else { "   " })
            .collect();
        out.push_str(&format!("{label:>AXIS_WIDTH$} |{}\n", points.trim_end()));
    }
    x_axis(&mut out, values.len());
    out
}

/// Plots daily totals as vertical bars scaled against the highest total.
#[must_use]
pub fn bar_chart(daily_totals: &[Money], height: usize) -> String {
    let height = height.max(1);
    let values: Vec<f64> = daily_totals.iter().map(|m| m.as_major()).collect();
    let hi = values.iter().copied().fold(0.0, f64::max);
    let filled: Vec<usize> = values.iter().map(|&v| scale(v, hi, height)).collect();
    let mut out = format!("Daily Sales Over {} Days (₹)\n", values.len());
    for row in (1..=height).rev() {
        let label = if row == height && hi > 0.0 {
            format!("{hi:.2}")
        } else {
            String::new()
        };
        let bars: String = filled
            .iter()
            .map(|&f| if f >= row { "  █" } else { "   " })
            .collect();
        out.push_str(&format!("{label:>AXIS_WIDTH$} |{}\n", bars.trim_end()));
    }
    x_axis(&mut out, values.len());
    out
}

impl Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let width = 24;
        writeln!(f, "{:width$} {}", "Total sales", rupees(self.total_sales))?;
        writeln!(f, "{:width$} ₹{:.2}", "Daily average", self.daily_average)?;
        if let Some(days) = self.extreme_days {
            writeln!(f, "{:width$} Day {}", "Most selling day", days.best)?;
            writeln!(f, "{:width$} Day {}", "Least selling day", days.worst)?;
        }
        let label = format!("Forecast ({}-day average)", self.options.window);
        match &self.forecast {
            Ok(forecast) => writeln!(f, "{label:width$} ₹{forecast:.2}")?,
            Err(e) => writeln!(f, "{label:width$} {e}")?,
        }
        match &self.profitability {
            Ok(p) => {
                writeln!(f, "{:width$} ₹{:.2}", "Total profit", p.profit)?;
                writeln!(f, "{:width$} {:.2}%", "Profit margin", p.margin_percent)?;
            }
            Err(e) => writeln!(f, "{:width$} {e}", "Profit")?,
        }
        writeln!(f)?;
        writeln!(f, "{}", category_table(&self.category_totals))?;
        writeln!(f)?;
        writeln!(f, "{}", winners_table(&self.top_items))?;
        writeln!(f)?;
        writeln!(f, "Inventory (from {} units each):", self.options.initial_stock)?;
        writeln!(f, "{}", stock_table(&self.stock))?;
        writeln!(f)?;
        writeln!(
            f,
            "{}",
            daily_table(&self.daily_totals, &self.day_over_day_change)
        )?;
        Ok(())
    }
}
