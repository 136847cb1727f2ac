//! Aggregates a user's transactions over a time window into a report.
//!
//! Nothing here touches the database or a renderer, the input is a slice of
//! expenses and the output is plain data.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use time::{Duration, OffsetDateTime};

use crate::{
    category::CategoryId,
    expense::{Expense, ExpenseType},
    report::format::{format_currency, format_date, truncate_description},
};

/// The length of time a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    Weekly,
    #[default]
    Monthly,
}

impl ReportPeriod {
    /// Parse a period name, ignoring case and surrounding whitespace.
    ///
    /// Missing or unrecognised names give [ReportPeriod::Monthly].
    pub fn parse_lenient(raw_period: Option<&str>) -> Self {
        match raw_period.map(|period| period.trim().to_ascii_lowercase()) {
            Some(period) if period == "weekly" => ReportPeriod::Weekly,
            Some(period) if period == "monthly" => ReportPeriod::Monthly,
            Some(period) => {
                tracing::debug!("unrecognised report period \"{period}\", using monthly");
                ReportPeriod::Monthly
            }
            None => ReportPeriod::Monthly,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
        }
    }

    /// The capitalised name used in report titles.
    pub fn label(&self) -> &'static str {
        match self {
            ReportPeriod::Weekly => "Weekly",
            ReportPeriod::Monthly => "Monthly",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            ReportPeriod::Weekly => Duration::days(7),
            ReportPeriod::Monthly => Duration::days(30),
        }
    }

    /// The window ending at `now`.
    pub fn window(&self, now: OffsetDateTime) -> ReportWindow {
        ReportWindow {
            start: now - self.duration(),
            end: now,
        }
    }
}

/// An inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl ReportWindow {
    pub fn contains(&self, date: OffsetDateTime) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Totals over the report window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    /// Income minus expenses.
    pub balance: Decimal,
}

/// How much was spent in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    /// `None` for expenses whose category was deleted.
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub total: Decimal,
    /// Share of the total expenses, rounded to two decimal places.
    pub percentage: Decimal,
}

/// A transaction formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRow {
    pub date: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub expense_type: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub title: String,
    pub period: ReportPeriod,
    pub window: ReportWindow,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub summary: ReportSummary,
    pub categories: Vec<CategoryBreakdown>,
    pub transactions: Vec<TransactionRow>,
}

/// Build a report from `expenses`.
///
/// Expenses dated outside `window` are ignored.
pub fn build_report(
    expenses: &[Expense],
    period: ReportPeriod,
    window: ReportWindow,
    generated_at: OffsetDateTime,
) -> Report {
    let mut in_window: Vec<&Expense> = expenses
        .iter()
        .filter(|expense| window.contains(expense.date))
        .collect();
    in_window.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

    let summary = summarise(&in_window);
    let categories = break_down_by_category(&in_window, summary.total_expense);
    let transactions = in_window.iter().map(|expense| to_row(expense)).collect();

    Report {
        title: format!("{} Expense Report", period.label()),
        period,
        window,
        generated_at,
        summary,
        categories,
        transactions,
    }
}

fn summarise(expenses: &[&Expense]) -> ReportSummary {
    // An empty sum has no scale, totals are always shown in cents.
    let total_of = |expense_type: ExpenseType| -> Decimal {
        let mut total: Decimal = expenses
            .iter()
            .filter(|expense| expense.expense_type == expense_type)
            .map(|expense| expense.amount.to_decimal())
            .sum();
        total.rescale(2);
        total
    };

    let total_income = total_of(ExpenseType::Income);
    let total_expense = total_of(ExpenseType::Expense);

    ReportSummary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
    }
}

fn break_down_by_category(expenses: &[&Expense], total_expense: Decimal) -> Vec<CategoryBreakdown> {
    let mut totals: HashMap<Option<CategoryId>, (String, Decimal)> = HashMap::new();

    for expense in expenses
        .iter()
        .filter(|expense| expense.expense_type == ExpenseType::Expense)
    {
        let key = expense.category.as_ref().map(|category| category.id);
        let entry = totals
            .entry(key)
            .or_insert_with(|| (expense.category_name().to_owned(), Decimal::ZERO));
        entry.1 += expense.amount.to_decimal();
    }

    let mut breakdown: Vec<CategoryBreakdown> = totals
        .into_iter()
        .map(|(category_id, (name, total))| CategoryBreakdown {
            category_id,
            name,
            total,
            percentage: percentage_of(total, total_expense),
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.category_id.cmp(&b.category_id))
    });

    breakdown
}

fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }

    (part * Decimal::ONE_HUNDRED / whole)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

fn to_row(expense: &Expense) -> TransactionRow {
    TransactionRow {
        date: format_date(expense.date),
        description: truncate_description(&expense.description),
        category: expense.category_name().to_owned(),
        expense_type: expense.expense_type.label().to_owned(),
        amount: format_currency(expense.amount.to_decimal()),
    }
}


#[cfg(test)]
mod build_report_tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        category::{Category, CategoryName},
        expense::{Amount, Expense, ExpenseType},
    };

    use super::{ReportPeriod, build_report};

    const NOW: OffsetDateTime = datetime!(2025-03-31 12:00 UTC);

    fn category(id: i64, name: &str) -> Option<Category> {
        Some(Category {
            id,
            name: CategoryName::new_unchecked(name),
        })
    }

    fn expense(
        id: i64,
        amount: Decimal,
        expense_type: ExpenseType,
        category: Option<Category>,
        days_ago: i64,
    ) -> Expense {
        Expense {
            id,
            amount: Amount::new(amount).unwrap(),
            description: format!("transaction {id}"),
            date: NOW - Duration::days(days_ago),
            expense_type,
            category,
        }
    }

    #[test]
    fn single_expense_is_whole_breakdown() {
        let expenses = [expense(1, dec!(20), ExpenseType::Expense, category(1, "Food"), 0)];
        let period = ReportPeriod::Weekly;

        let report = build_report(&expenses, period, period.window(NOW), NOW);

        assert_eq!(report.title, "Weekly Expense Report");
        assert_eq!(report.summary.total_expense, dec!(20.00));
        assert_eq!(report.summary.total_income, Decimal::ZERO);
        assert_eq!(report.summary.balance, dec!(-20.00));
        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.categories[0].name, "Food");
        assert_eq!(report.categories[0].total, dec!(20.00));
        assert_eq!(report.categories[0].percentage, dec!(100));
    }

    #[test]
    fn totals_add_up() {
        let expenses = [
            expense(1, dec!(10.10), ExpenseType::Expense, category(1, "Food"), 1),
            expense(2, dec!(33.33), ExpenseType::Expense, category(2, "Rent"), 2),
            expense(3, dec!(5.57), ExpenseType::Expense, category(1, "Food"), 3),
            expense(4, dec!(1000), ExpenseType::Income, category(3, "Salary"), 4),
            expense(5, dec!(0.01), ExpenseType::Income, category(1, "Food"), 5),
        ];
        let period = ReportPeriod::Monthly;

        let report = build_report(&expenses, period, period.window(NOW), NOW);

        let summary = &report.summary;
        assert_eq!(summary.total_income - summary.total_expense, summary.balance);
        assert_eq!(summary.total_expense, dec!(49.00));
        assert_eq!(summary.total_income, dec!(1000.01));
        let category_sum: Decimal = report.categories.iter().map(|c| c.total).sum();
        assert_eq!(category_sum, summary.total_expense);
    }

    #[test]
    fn breakdown_is_sorted_by_total_and_excludes_income() {
        let expenses = [
            expense(1, dec!(10), ExpenseType::Expense, category(1, "Food"), 1),
            expense(2, dec!(30), ExpenseType::Expense, category(2, "Rent"), 2),
            expense(3, dec!(10), ExpenseType::Expense, category(3, "Bus"), 3),
            expense(4, dec!(500), ExpenseType::Income, category(4, "Salary"), 4),
        ];
        let period = ReportPeriod::Monthly;

        let report = build_report(&expenses, period, period.window(NOW), NOW);

        let names: Vec<&str> = report.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Rent", "Bus", "Food"]);
        let percentages: Vec<Decimal> = report.categories.iter().map(|c| c.percentage).collect();
        assert_eq!(percentages, [dec!(60), dec!(20), dec!(20)]);
    }

    #[test]
    fn percentages_are_rounded() {
        let expenses = [
            expense(1, dec!(1), ExpenseType::Expense, category(1, "Food"), 1),
            expense(2, dec!(2), ExpenseType::Expense, category(2, "Rent"), 2),
        ];
        let period = ReportPeriod::Monthly;

        let report = build_report(&expenses, period, period.window(NOW), NOW);

        assert_eq!(report.categories[0].percentage, dec!(66.67));
        assert_eq!(report.categories[1].percentage, dec!(33.33));
    }

    #[test]
    fn percentages_are_zero_without_expenses() {
        let expenses = [
            expense(1, dec!(0), ExpenseType::Expense, category(1, "Food"), 1),
            expense(2, dec!(100), ExpenseType::Income, category(2, "Salary"), 2),
        ];
        let period = ReportPeriod::Monthly;

        let report = build_report(&expenses, period, period.window(NOW), NOW);

        assert_eq!(report.summary.total_expense, Decimal::ZERO);
        assert!(!report.categories.is_empty());
        assert!(report.categories.iter().all(|c| c.percentage.is_zero()));
    }

    #[test]
    fn empty_report() {
        let period = ReportPeriod::Weekly;

        let report = build_report(&[], period, period.window(NOW), NOW);

        assert_eq!(report.summary.balance, Decimal::ZERO);
        assert!(report.categories.is_empty());
        assert!(report.transactions.is_empty());
    }

    #[test]
    fn empty_totals_keep_cents() {
        let period = ReportPeriod::Weekly;

        let report = build_report(&[], period, period.window(NOW), NOW);

        assert_eq!(report.summary.total_income.to_string(), "0.00");
        assert_eq!(report.summary.total_expense.to_string(), "0.00");
        assert_eq!(report.summary.balance.to_string(), "0.00");
    }

    #[test]
    fn same_named_categories_are_kept_apart() {
        let expenses = [
            expense(1, dec!(10), ExpenseType::Expense, category(1, "Food"), 1),
            expense(2, dec!(30), ExpenseType::Expense, category(2, "Food"), 2),
        ];
        let period = ReportPeriod::Monthly;

        let report = build_report(&expenses, period, period.window(NOW), NOW);

        assert_eq!(report.categories.len(), 2);
        assert_eq!(report.categories[0].category_id, Some(2));
    }

    #[test]
    fn uncategorized_expenses_are_grouped() {
        let expenses = [
            expense(1, dec!(10), ExpenseType::Expense, None, 1),
            expense(2, dec!(5), ExpenseType::Expense, None, 2),
        ];
        let period = ReportPeriod::Monthly;

        let report = build_report(&expenses, period, period.window(NOW), NOW);

        assert_eq!(report.categories.len(), 1);
        assert_eq!(report.categories[0].category_id, None);
        assert_eq!(report.categories[0].name, "Uncategorized");
        assert_eq!(report.categories[0].total, dec!(15));
    }

    #[test]
    fn ignores_expenses_outside_window() {
        let expenses = [
            expense(1, dec!(10), ExpenseType::Expense, category(1, "Food"), 7),
            expense(2, dec!(99), ExpenseType::Expense, category(1, "Food"), 8),
        ];
        let period = ReportPeriod::Weekly;

        let report = build_report(&expenses, period, period.window(NOW), NOW);

        assert_eq!(report.summary.total_expense, dec!(10));
        assert_eq!(report.transactions.len(), 1);
    }

    #[test]
    fn rows_are_formatted_and_newest_first() {
        let mut old = expense(1, dec!(1234.5), ExpenseType::Income, category(1, "Salary"), 3);
        old.description = "a very long description that goes on and on".to_owned();
        let new = expense(2, dec!(20), ExpenseType::Expense, None, 1);
        let period = ReportPeriod::Weekly;

        let report = build_report(&[old, new], period, period.window(NOW), NOW);

        let rows = &report.transactions;
        assert_eq!(rows[0].date, "2025-03-30");
        assert_eq!(rows[0].category, "Uncategorized");
        assert_eq!(rows[0].expense_type, "Expense");
        assert_eq!(rows[0].amount, "$20.00");
        assert_eq!(rows[1].description, "a very long description tha...");
        assert_eq!(rows[1].expense_type, "Income");
        assert_eq!(rows[1].amount, "$1,234.50");
    }
}
