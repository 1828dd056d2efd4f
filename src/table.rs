use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use std::{fs::File, io, path::Path};

use crate::{
    error::{Error, Result},
    money::Money,
};

/// Number of daily sales columns (`Day1` to `Day30`) every record carries.
pub const DAYS: usize = 30;

const REQUIRED_COLUMNS: [&str; 3] = ["Item", "Category", "Price"];

/// One item's price and its sales over the 30-day period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesRecord {
    pub item: String,
    pub category: String,
    pub price: Money,
    /// Units sold on each day; index 0 is `Day1`.
    pub daily_sales: [u32; DAYS],
}

impl SalesRecord {
    /// Returns the revenue for this item over all 30 days.
    #[must_use]
    pub fn revenue(&self) -> Money {
        self.daily_sales.iter().map(|&units| self.price * units).sum()
    }

    /// Returns the revenue for this item, or `None` if it does not fit in a
    /// [`Money`].
    #[must_use]
    pub fn checked_revenue(&self) -> Option<Money> {
        self.daily_sales
            .iter()
            .try_fold(Money::ZERO, |acc, &units| {
                acc.checked_add(self.price.checked_mul(units)?)
            })
    }

    /// Returns the total units sold over all 30 days.
    #[must_use]
    pub fn units_sold(&self) -> u64 {
        self.daily_sales.iter().map(|&units| u64::from(units)).sum()
    }
}

/// Holds the sales records for one analysis session, in file order.
///
/// A table is loaded once with [`SalesTable::load`] and never modified
/// afterwards; derived figures (see [`crate::stats`]) are returned as new
/// values.
///
/// Every price in a table is non-negative and the revenue over all records
/// and days fits in a [`Money`]. Any daily, per-record or per-category sum
/// is bounded by that total, so the statistics never overflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesTable {
    records: Vec<SalesRecord>,
}

impl SalesTable {
    /// Builds a table from records already in memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] if a price is negative or the total
    /// revenue of the records is too large to represent.
    pub fn new(records: Vec<SalesRecord>) -> Result<Self> {
        let mut total = Money::ZERO;
        for record in &records {
            if record.price.is_negative() {
                return Err(Error::InvalidRecord {
                    item: record.item.clone(),
                    reason: format!("negative price {}", record.price),
                });
            }
            total = add_revenue(total, record).ok_or_else(|| Error::InvalidRecord {
                item: record.item.clone(),
                reason: "revenue out of range".to_string(),
            })?;
        }
        Ok(Self { records })
    }

    /// Reads sales data from the CSV file at `path`.
    ///
    /// The file must have a header row naming the columns `Item`, `Category`,
    /// `Price` and `Day1` to `Day30`, in any order. Any other columns are
    /// ignored. Row order is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file cannot be opened, and any
    /// error from [`SalesTable::from_reader`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|_| Error::NotFound {
            path: path.to_path_buf(),
        })?;
        let table = Self::from_reader(file)?;
        debug!(path = %path.display(), rows = table.len(), "loaded sales table");
        Ok(table)
    }

    /// Reads sales data in CSV format from `rdr`.
    ///
    /// # Errors
    ///
    /// Returns errors if:
    /// * The data is not valid CSV, or rows have differing field counts
    /// * A required column is missing from the header
    /// * A price or daily sales count cannot be parsed
    /// * The revenue of the rows read so far is too large to represent
    pub fn from_reader(rdr: impl io::Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);
        let headers = rdr.headers()?.clone();
        for name in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == name) {
                return Err(Error::MissingColumn(name.to_string()));
            }
        }
        let day_columns = day_columns(&headers)?;
        let mut records = Vec::new();
        let mut total = Money::ZERO;
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map_or(0, csv::Position::line);
            let row: Row = record
                .deserialize(Some(&headers))
                .map_err(|e| parse_error(line, &e))?;
            let mut daily_sales = [0; DAYS];
            for (day, (slot, &col)) in daily_sales.iter_mut().zip(&day_columns).enumerate() {
                let raw = record.get(col).unwrap_or_default();
                *slot = raw.parse().map_err(|e| Error::Parse {
                    line,
                    message: format!("Day{}: {raw:?}: {e}", day + 1),
                })?;
            }
            let record = SalesRecord {
                item: row.item,
                category: row.category,
                price: row.price,
                daily_sales,
            };
            total = add_revenue(total, &record).ok_or_else(|| Error::Parse {
                line,
                message: format!("revenue for {:?} is out of range", record.item),
            })?;
            records.push(record);
        }
        Ok(Self { records })
    }

    #[must_use]
    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalesRecord> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a SalesTable {
    type Item = &'a SalesRecord;
    type IntoIter = std::slice::Iter<'a, SalesRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn add_revenue(total: Money, record: &SalesRecord) -> Option<Money> {
    total.checked_add(record.checked_revenue()?)
}

/// Defines the non-daily columns of the CSV format.
#[derive(Debug, Deserialize)]
struct Row {
    #[serde(rename = "Item")]
    item: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Price")]
    price: Money,
}

/// Returns the header index of each of `Day1` to `Day30`, in day order.
fn day_columns(headers: &csv::StringRecord) -> Result<[usize; DAYS]> {
    let re = Regex::new(r"^Day(\d+)$")?;
    let mut found = [None; DAYS];
    for (idx, header) in headers.iter().enumerate() {
        let Some(day) = re
            .captures(header)
            .and_then(|caps| caps[1].parse::<usize>().ok())
        else {
            continue;
        };
        if (1..=DAYS).contains(&day) {
            found[day - 1].get_or_insert(idx);
        }
    }
    let mut columns = [0; DAYS];
    for (day, (col, idx)) in columns.iter_mut().zip(found).enumerate() {
        *col = idx.ok_or_else(|| Error::MissingColumn(format!("Day{}", day + 1)))?;
    }
    Ok(columns)
}

fn parse_error(line: u64, err: &csv::Error) -> Error {
    let message = match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => err.to_string(),
        _ => err.to_string(),
    };
    Error::Parse { line, message }
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, str::FromStr};

    use super::*;

    fn header() -> String {
        let days: Vec<_> = (1..=DAYS).map(|d| format!("Day{d}")).collect();
        format!("Item,Category,Price,{}", days.join(","))
    }

    #[test]
    fn load_fn_correctly_parses_product_sales_data() {
        let table = SalesTable::load("testdata/product_sales.csv").unwrap();
        assert_eq!(table.len(), 5, "wrong row count");
        let items: Vec<_> = table.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(items, ["Notebook", "Pen", "Headphones", "Charger", "Mug"]);
        let notebook = &table.records()[0];
        assert_eq!(notebook.category, "Stationery");
        assert_eq!(notebook.price, Money::from_minor(4550));
        assert_eq!(notebook.daily_sales[0], 10);
        assert_eq!(notebook.daily_sales[DAYS - 1], 1);
        assert_eq!(notebook.units_sold(), 279);
        assert_eq!(notebook.revenue(), Money::from_minor(1_269_450));
    }

    #[test]
    fn load_fn_returns_not_found_for_missing_file() {
        let err = SalesTable::load("testdata/bogus.csv").unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }), "got {err:?}");
    }

    #[test]
    fn load_fn_returns_error_for_missing_day_column() {
        let err = SalesTable::load("testdata/missing_day.csv").unwrap_err();
        assert!(
            matches!(&err, Error::MissingColumn(name) if name == "Day17"),
            "got {err:?}"
        );
    }

    #[test]
    fn load_fn_reports_line_of_bad_price() {
        let err = SalesTable::load("testdata/bad_price.csv").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }), "got {err:?}");
    }

    #[test]
    fn from_reader_fn_returns_error_for_missing_category_column() {
        let data = "Item,Price,Day1\nPen,10,1\n";
        let err = SalesTable::from_reader(Cursor::new(data)).unwrap_err();
        assert!(
            matches!(&err, Error::MissingColumn(name) if name == "Category"),
            "got {err:?}"
        );
    }

    #[test]
    fn from_reader_fn_matches_day_columns_by_name_not_position() {
        let mut days: Vec<_> = (1..=DAYS).map(|d| format!("Day{d}")).collect();
        days.reverse();
        let values: Vec<_> = (1..=DAYS).rev().map(|d| d.to_string()).collect();
        let data = format!(
            "Notes,{},Price,Category,Item,Day31\nlow stock,{},2.50,Office,Stapler,99\n",
            days.join(","),
            values.join(","),
        );
        let table = SalesTable::from_reader(Cursor::new(data)).unwrap();
        let stapler = &table.records()[0];
        assert_eq!(stapler.item, "Stapler");
        assert_eq!(stapler.price, Money::from_minor(250));
        let expected: Vec<u32> = (1..=30).collect();
        assert_eq!(stapler.daily_sales.to_vec(), expected);
    }

    fn rows(rows: &[(&str, &str, u32)]) -> String {
        let mut data = header();
        for (item, price, units) in rows {
            let values = vec![units.to_string(); DAYS].join(",");
            data.push_str(&format!("\n{item},Misc,{price},{values}"));
        }
        data
    }

    fn record(item: &str, price: Money, units: u32) -> SalesRecord {
        SalesRecord {
            item: item.to_string(),
            category: "Misc".to_string(),
            price,
            daily_sales: [units; DAYS],
        }
    }

    #[test]
    fn from_reader_fn_accepts_three_decimal_price() {
        let data = rows(&[("Sticker", "0.125", 8)]);
        let table = SalesTable::from_reader(Cursor::new(data)).unwrap();
        let sticker = &table.records()[0];
        assert_eq!(sticker.price * 8, Money::from_major(1));
        assert_eq!(sticker.revenue(), Money::from_major(30));
    }

    #[test]
    fn from_reader_fn_rejects_row_whose_revenue_overflows() {
        let data = rows(&[("Pen", "10", 1), ("Yacht", "100000000000000000000", 4_000_000_000)]);
        let err = SalesTable::from_reader(Cursor::new(data)).unwrap_err();
        assert!(
            matches!(&err, Error::Parse { line: 3, message } if message.contains("out of range")),
            "got {err:?}"
        );
    }

    #[test]
    fn from_reader_fn_rejects_rows_whose_combined_revenue_overflows() {
        let price = "2000000000000000000000000000";
        let data = rows(&[("Jet", price, 1)]);
        assert!(SalesTable::from_reader(Cursor::new(data)).is_ok());
        let data = rows(&[("Jet", price, 1), ("Jet II", price, 1)]);
        let err = SalesTable::from_reader(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }), "got {err:?}");
    }

    #[test]
    fn new_fn_rejects_records_whose_revenue_overflows() {
        let price = Money::from_str("100000000000000000000").unwrap();
        let err = SalesTable::new(vec![record("Yacht", price, 4_000_000_000)]).unwrap_err();
        assert!(
            matches!(&err, Error::InvalidRecord { item, .. } if item == "Yacht"),
            "got {err:?}"
        );
    }

    #[test]
    fn new_fn_rejects_negative_price() {
        let err = SalesTable::new(vec![record("Refund", Money::from_minor(-100), 1)]).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { .. }), "got {err:?}");
    }

    #[test]
    fn new_fn_accepts_records_in_range() {
        let table = SalesTable::new(vec![record("Pen", Money::from_major(10), 2)]).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn from_reader_fn_rejects_negative_daily_sales() {
        let values = vec!["1"; DAYS - 1].join(",");
        let data = format!("{}\nPen,Stationery,10,-1,{values}\n", header());
        let err = SalesTable::from_reader(Cursor::new(data)).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "got {err:?}");
    }
}
