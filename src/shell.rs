use tracing::{info, warn};

use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use crate::{
    auth::{Credentials, Session},
    error::{Error, Result},
    render::{self, rupees},
    stats::{self, Summary, SummaryOptions},
    table::{SalesTable, DAYS},
};

const MENU: &str = "
Options:
1. Display Product Data
2. Calculate Total Sales
3. Show Daily Sales Trend
4. Find Most and Least Selling Days
5. Find Most Sold Items by Category
6. Calculate Inventory Levels
7. Sales Forecasting
8. Profitability Analysis
9. Category Sales Analysis
10. Show Daily Sales Bar Graph
11. Add New User
12. Log Out
13. Show Summary Report
0. Exit";

/// Data file loaded when no other is given.
pub const DEFAULT_DATA: &str = "product_sales.csv";

/// Chart height, in lines, used when none is given.
pub const DEFAULT_CHART_HEIGHT: usize = 12;

/// Settings for an interactive session.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// CSV file loaded after each login.
    pub data: PathBuf,
    /// Settings for the statistics shown in the menu.
    pub stats: SummaryOptions,
    /// Rows used to draw charts.
    pub chart_height: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            data: PathBuf::from(DEFAULT_DATA),
            stats: SummaryOptions::default(),
            chart_height: DEFAULT_CHART_HEIGHT,
        }
    }
}

enum Next {
    LogOut,
    Exit,
}

/// Runs the login prompt and numbered menu over `input` and `output`.
///
/// Each login loads the sales table afresh from [`Options::data`]; the table
/// is then held, unchanged, until the user logs out. Errors from individual
/// statistics are printed and the menu carries on.
pub struct Shell<R, W> {
    input: R,
    output: W,
    options: Options,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(input: R, output: W, options: Options) -> Self {
        Self {
            input,
            output,
            options,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Runs sessions until the user exits or input ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the sales data cannot be loaded, or if reading
    /// input or writing output fails.
    pub fn run(&mut self, credentials: &mut Credentials) -> Result<()> {
        loop {
            let Some(session) = self.login(credentials)? else {
                return Ok(());
            };
            let table = SalesTable::load(&self.options.data)?;
            match self.menu(credentials, &table)? {
                Next::LogOut => {
                    info!(username = session.username(), "user logged out");
                    writeln!(self.output, "\nLogged out {}.\n", session.username())?;
                }
                Next::Exit => {
                    writeln!(self.output, "Exiting system...")?;
                    return Ok(());
                }
            }
        }
    }

    /// Prints `message` and reads one line, without its line ending.
    /// Returns `None` at end of input.
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let len = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(len);
        Ok(Some(line))
    }

    fn login(&mut self, credentials: &mut Credentials) -> Result<Option<Session>> {
        if credentials.is_empty() {
            writeln!(
                self.output,
                "No users found. Please create your first login credentials."
            )?;
            loop {
                let Some(username) = self.prompt("Create Username: ")? else {
                    return Ok(None);
                };
                let Some(password) = self.prompt("Create Password: ")? else {
                    return Ok(None);
                };
                let username = username.trim();
                match credentials.add_user(username, &password) {
                    Ok(()) => {
                        writeln!(
                            self.output,
                            "\nAccount created successfully! Welcome, {username}.\n"
                        )?;
                        return credentials.authenticate(username, &password).map(Some);
                    }
                    Err(e) => writeln!(self.output, "\n{e}. Please try again.")?,
                }
            }
        }
        loop {
            writeln!(
                self.output,
                "Please log in to access the sales analysis system."
            )?;
            let Some(username) = self.prompt("Username: ")? else {
                return Ok(None);
            };
            let Some(password) = self.prompt("Password: ")? else {
                return Ok(None);
            };
            match credentials.authenticate(username.trim(), &password) {
                Ok(session) => {
                    writeln!(self.output, "\nWelcome, {}!", session.username())?;
                    return Ok(Some(session));
                }
                Err(Error::InvalidCredentials) => writeln!(
                    self.output,
                    "\nInvalid username or password. Please try again."
                )?,
                Err(e) => return Err(e),
            }
        }
    }

    fn menu(&mut self, credentials: &mut Credentials, table: &SalesTable) -> Result<Next> {
        loop {
            writeln!(self.output, "{MENU}")?;
            let Some(choice) = self.prompt("Select an option: ")? else {
                return Ok(Next::Exit);
            };
            match choice.trim() {
                "1" => {
                    writeln!(self.output, "\nProduct Sales Report (Days 1 to {DAYS}):")?;
                    writeln!(self.output, "{}", render::product_table(table))?;
                }
                "2" => {
                    let total = stats::total_sales(table);
                    writeln!(self.output, "\nTotal Sales: {}", rupees(total))?;
                }
                "3" => {
                    let totals = stats::daily_totals(table);
                    let chart = render::line_chart(&totals, self.options.chart_height);
                    writeln!(self.output, "\n{chart}")?;
                }
                "4" => match stats::extreme_days(&stats::daily_totals(table)) {
                    Some(days) => {
                        writeln!(self.output, "\nMost Selling Day: Day {}", days.best)?;
                        writeln!(self.output, "Least Selling Day: Day {}", days.worst)?;
                    }
                    None => writeln!(self.output, "\nNo sales data.")?,
                },
                "5" => {
                    let winners = stats::top_item_per_category(table);
                    writeln!(self.output, "\nMost Sold Items by Category:")?;
                    writeln!(self.output, "{}", render::winners_table(&winners))?;
                }
                "6" => {
                    let stock = stats::remaining_stock(table, self.options.stats.initial_stock);
                    writeln!(self.output, "\nInventory Levels:")?;
                    writeln!(self.output, "{}", render::stock_table(&stock))?;
                }
                "7" => {
                    let window = self.options.stats.window;
                    match stats::moving_average_forecast(&stats::daily_totals(table), window) {
                        Ok(forecast) => writeln!(
                            self.output,
                            "\nSales Forecast (next day, based on {window}-day moving average): ₹{forecast:.2}"
                        )?,
                        Err(e) => self.report(&e)?,
                    }
                }
                "8" => match stats::profitability(table, self.options.stats.cost_ratio) {
                    Ok(p) => {
                        writeln!(self.output, "\nTotal Profit: ₹{:.2}", p.profit)?;
                        writeln!(self.output, "Profit Margin: {:.2}%", p.margin_percent)?;
                    }
                    Err(e) => self.report(&e)?,
                },
                "9" => {
                    let totals = stats::category_totals(table);
                    writeln!(self.output, "\nCategory Sales Analysis:")?;
                    writeln!(self.output, "{}", render::category_table(&totals))?;
                }
                "10" => {
                    let totals = stats::daily_totals(table);
                    let chart = render::bar_chart(&totals, self.options.chart_height);
                    writeln!(self.output, "\n{chart}")?;
                }
                "11" => self.add_user(credentials)?,
                "12" => return Ok(Next::LogOut),
                "13" => {
                    let summary = Summary::compute(table, &self.options.stats);
                    writeln!(self.output, "\n{summary}")?;
                }
                "0" => return Ok(Next::Exit),
                _ => writeln!(self.output, "Invalid option. Please try again.")?,
            }
        }
    }

    fn add_user(&mut self, credentials: &mut Credentials) -> Result<()> {
        writeln!(self.output, "\nAdd a New User")?;
        let Some(username) = self.prompt("Enter Username: ")? else {
            return Ok(());
        };
        let username = username.trim().to_string();
        if credentials.contains(&username) {
            writeln!(self.output, "This username already exists.")?;
            return Ok(());
        }
        let Some(password) = self.prompt("Enter Password: ")? else {
            return Ok(());
        };
        match credentials.add_user(&username, &password) {
            Ok(()) => writeln!(self.output, "\nUser {username} added successfully.\n")?,
            Err(e) => self.report(&e)?,
        }
        Ok(())
    }

    fn report(&mut self, err: &Error) -> Result<()> {
        warn!(error = %err, "operation failed");
        writeln!(self.output, "\nError: {err}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn options() -> Options {
        Options {
            data: PathBuf::from("testdata/product_sales.csv"),
            ..Options::default()
        }
    }

    fn run(input: &str, options: Options, credentials: &mut Credentials) -> (Result<()>, String) {
        let mut shell = Shell::new(Cursor::new(input.to_string()), Vec::new(), options);
        let result = shell.run(credentials);
        let output = String::from_utf8(shell.into_output()).unwrap();
        (result, output)
    }

    fn with_user() -> Credentials {
        let mut credentials = Credentials::new();
        credentials.add_user("asha", "s3cret").unwrap();
        credentials
    }

    #[test]
    fn run_fn_creates_first_account_then_reports_total_sales() {
        let mut credentials = Credentials::new();
        let (result, out) = run("asha\ns3cret\n2\n0\n", options(), &mut credentials);
        result.unwrap();
        assert!(out.contains("No users found"));
        assert!(out.contains("Account created successfully! Welcome, asha."));
        assert!(out.contains("Total Sales: ₹255872.57"), "{out}");
        assert!(out.ends_with("Exiting system...\n"));
        assert!(credentials.authenticate("asha", "s3cret").is_ok());
    }

    #[test]
    fn run_fn_reprompts_after_invalid_credentials() {
        let mut credentials = with_user();
        let (result, out) = run("asha\nwrong\nasha\ns3cret\n0\n", options(), &mut credentials);
        result.unwrap();
        assert!(out.contains("Invalid username or password. Please try again."));
        assert!(out.contains("Welcome, asha!"));
    }

    #[test]
    fn run_fn_prints_extreme_days_and_forecast() {
        let mut credentials = with_user();
        let (result, out) = run("asha\ns3cret\n4\n7\n0\n", options(), &mut credentials);
        result.unwrap();
        assert!(out.contains("Most Selling Day: Day 17"));
        assert!(out.contains("Least Selling Day: Day 30"));
        assert!(out.contains("based on 3-day moving average): ₹6699.47"));
    }

    #[test]
    fn run_fn_reports_invalid_window_and_continues() {
        let mut credentials = with_user();
        let options = Options {
            stats: SummaryOptions {
                window: DAYS + 1,
                ..SummaryOptions::default()
            },
            ..options()
        };
        let (result, out) = run("asha\ns3cret\n7\n8\n0\n", options, &mut credentials);
        result.unwrap();
        assert!(out.contains("Error: window size 31"), "{out}");
        assert!(out.contains("Profit Margin: 40.00%"));
    }

    #[test]
    fn run_fn_uses_summary_options_for_menu_figures() {
        let mut credentials = with_user();
        let options = Options {
            stats: SummaryOptions {
                initial_stock: 300,
                window: 1,
                cost_ratio: 0.5,
            },
            ..options()
        };
        let (result, out) = run("asha\ns3cret\n6\n7\n8\n13\n0\n", options, &mut credentials);
        result.unwrap();
        assert!(out.contains("-97"), "{out}");
        assert!(out.contains("based on 1-day moving average)"), "{out}");
        assert!(out.contains("Profit Margin: 50.00%"), "{out}");
        assert!(out.contains("Inventory (from 300 units each):"), "{out}");
    }

    #[test]
    fn options_default_fn_embeds_summary_defaults() {
        let options = Options::default();
        assert_eq!(options.stats, SummaryOptions::default());
        assert_eq!(options.data, PathBuf::from(DEFAULT_DATA));
        assert_eq!(options.chart_height, DEFAULT_CHART_HEIGHT);
    }

    #[test]
    fn run_fn_reports_undefined_margin_for_zero_sales() {
        let mut credentials = with_user();
        let options = Options {
            data: PathBuf::from("testdata/zero_sales.csv"),
            ..Options::default()
        };
        let (result, out) = run("asha\ns3cret\n8\n0\n", options, &mut credentials);
        result.unwrap();
        assert!(out.contains("Error: profit margin is undefined"));
    }

    #[test]
    fn run_fn_returns_error_when_data_file_is_missing() {
        let mut credentials = with_user();
        let options = Options {
            data: PathBuf::from("testdata/bogus.csv"),
            ..Options::default()
        };
        let (result, _) = run("asha\ns3cret\n", options, &mut credentials);
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn run_fn_adds_user_who_can_log_in_after_log_out() {
        let mut credentials = with_user();
        let input = "asha\ns3cret\n11\nravi\npw\n11\nravi\n12\nravi\npw\n0\n";
        let (result, out) = run(input, options(), &mut credentials);
        result.unwrap();
        assert!(out.contains("User ravi added successfully."));
        assert!(out.contains("This username already exists."));
        assert!(out.contains("Logged out asha."));
        assert!(out.contains("Welcome, ravi!"));
    }

    #[test]
    fn run_fn_rejects_unknown_menu_option() {
        let mut credentials = with_user();
        let (result, out) = run("asha\ns3cret\n42\n0\n", options(), &mut credentials);
        result.unwrap();
        assert!(out.contains("Invalid option. Please try again."));
    }

    #[test]
    fn run_fn_stops_cleanly_at_end_of_input() {
        let mut credentials = Credentials::new();
        let (result, _) = run("", options(), &mut credentials);
        result.unwrap();
        let mut credentials = with_user();
        let (result, out) = run("asha\ns3cret\n", options(), &mut credentials);
        result.unwrap();
        assert!(out.ends_with("Exiting system...\n"));
    }

    #[test]
    fn run_fn_renders_tables_and_charts() {
        let mut credentials = with_user();
        let input = "asha\ns3cret\n1\n3\n5\n6\n9\n10\n13\n0\n";
        let (result, out) = run(input, options(), &mut credentials);
        result.unwrap();
        assert!(out.contains("Product Sales Report (Days 1 to 30):"));
        assert!(out.contains("Daily Sales Trend Over 30 Days"));
        assert!(out.contains("Most Sold Items by Category:"));
        assert!(out.contains("Inventory Levels:"));
        assert!(out.contains("Category Sales Analysis:"));
        assert!(out.contains("Daily Sales Over 30 Days"));
        assert!(out.contains("Forecast (3-day average)"));
    }
}
