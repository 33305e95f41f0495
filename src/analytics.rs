use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Months, NaiveDate};
use rusqlite::Connection;

use crate::error::Result;
use crate::models::TransactionKind;
use crate::money::Money;

pub const DEFAULT_TREND_MONTHS: u32 = 12;
pub const DEFAULT_MERCHANT_LIMIT: usize = 10;
pub const DEFAULT_DAILY_DAYS: u32 = 30;

const MONTHLY_TREND_LIMIT: i64 = 12;

const WEEKDAYS: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Monthly trends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTrend {
    pub month: String,
    pub expenses: Money,
    pub income: Money,
    pub count: i64,
}

/// Expense and income totals for the twelve most recent months with any
/// activity, oldest first.
pub fn get_monthly_trends(conn: &Connection) -> Result<Vec<MonthlyTrend>> {
    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m', spent_on) as month, \
         SUM(CASE WHEN transaction_type = 'expense' THEN amount_pennies ELSE 0 END) as expenses, \
         SUM(CASE WHEN transaction_type = 'income' THEN amount_pennies ELSE 0 END) as income, \
         COUNT(*) as count \
         FROM expenses GROUP BY month ORDER BY month DESC LIMIT ?1",
    )?;
    let mut rows = stmt
        .query_map([MONTHLY_TREND_LIMIT], |row| {
            Ok(MonthlyTrend {
                month: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                expenses: row.get(1)?,
                income: row.get(2)?,
                count: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.reverse();
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Category breakdown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub transaction_count: i64,
    pub total: Money,
    pub average: f64,
}

/// Expense-only totals per category, largest first. Categories without any
/// expense are left out rather than reported as zero.
pub fn get_category_breakdown(conn: &Connection) -> Result<Vec<CategoryTotal>> {
    let mut stmt = conn.prepare(
        "SELECT c.name, COUNT(e.id) as transaction_count, SUM(e.amount_pennies) as total, \
         AVG(e.amount_pennies) as average \
         FROM categories c \
         JOIN expenses e ON c.id = e.category_id AND e.transaction_type = 'expense' \
         GROUP BY c.id, c.name \
         HAVING total > 0 \
         ORDER BY total DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                transaction_count: row.get(1)?,
                total: row.get(2)?,
                average: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Category trends
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTrend {
    pub category: String,
    pub kind: TransactionKind,
    pub month: String,
    pub total: Money,
}

pub fn get_category_trends(conn: &Connection, months: u32) -> Result<Vec<CategoryTrend>> {
    get_category_trends_as_of(conn, today(), months)
}

/// Monthly totals per category and transaction kind over the trailing
/// `months` window ending `today`. Ordered by category name, kind, month.
pub fn get_category_trends_as_of(
    conn: &Connection,
    today: NaiveDate,
    months: u32,
) -> Result<Vec<CategoryTrend>> {
    let since = today
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN);
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, e.transaction_type, strftime('%Y-%m', e.spent_on), e.amount_pennies \
         FROM expenses e JOIN categories c ON c.id = e.category_id \
         WHERE e.spent_on >= ?1",
    )?;
    let rows = stmt
        .query_map([iso(since)], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, TransactionKind>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Money>(4)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // (name, id) keeps same-named categories apart while still sorting by name.
    let mut totals: BTreeMap<(String, i64, TransactionKind, String), Money> = BTreeMap::new();
    for (id, name, kind, month, amount) in rows {
        let Some(month) = month else { continue };
        *totals.entry((name, id, kind, month)).or_default() += amount;
    }

    Ok(totals
        .into_iter()
        .filter(|(_, total)| *total > Money::ZERO)
        .map(|((category, _, kind, month), total)| CategoryTrend {
            category,
            kind,
            month,
            total,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Top merchants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MerchantTotal {
    pub merchant: String,
    pub transaction_count: i64,
    pub total: Money,
}

/// Merchants by total across both expenses and income.
pub fn get_top_merchants(conn: &Connection, limit: usize) -> Result<Vec<MerchantTotal>> {
    let mut stmt = conn.prepare(
        "SELECT merchant, COUNT(*) as transaction_count, SUM(amount_pennies) as total \
         FROM expenses GROUP BY merchant ORDER BY total DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit as i64], |row| {
            Ok(MerchantTotal {
                merchant: row.get(0)?,
                transaction_count: row.get(1)?,
                total: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Weekday analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayTotal {
    /// 0 = Sunday .. 6 = Saturday.
    pub day_num: u32,
    pub weekday: &'static str,
    pub transaction_count: i64,
    pub total: Money,
    pub average: f64,
}

/// One row per weekday that has at least one transaction; days without
/// activity are absent.
pub fn get_weekday_analysis(conn: &Connection) -> Result<Vec<WeekdayTotal>> {
    let mut stmt = conn.prepare(
        "SELECT CAST(strftime('%w', spent_on) AS INTEGER) as day_num, \
         COUNT(*) as transaction_count, SUM(amount_pennies) as total, AVG(amount_pennies) as average \
         FROM expenses \
         WHERE strftime('%w', spent_on) IS NOT NULL \
         GROUP BY day_num ORDER BY day_num",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let day_num: u32 = row.get(0)?;
            Ok(WeekdayTotal {
                day_num,
                weekday: WEEKDAYS[day_num as usize % 7],
                transaction_count: row.get(1)?,
                total: row.get(2)?,
                average: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Spending stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SpendingStats {
    pub total_transactions: i64,
    pub total_spent: Money,
    pub total_income: Money,
    /// Average, smallest and largest are over expenses only.
    pub average_transaction: Option<f64>,
    pub smallest_transaction: Option<Money>,
    pub largest_transaction: Option<Money>,
}

pub fn get_spending_stats(conn: &Connection) -> Result<SpendingStats> {
    let stats = conn.query_row(
        "SELECT COUNT(*), \
         COALESCE(SUM(CASE WHEN transaction_type = 'expense' THEN amount_pennies ELSE 0 END), 0), \
         COALESCE(SUM(CASE WHEN transaction_type = 'income' THEN amount_pennies ELSE 0 END), 0), \
         AVG(CASE WHEN transaction_type = 'expense' THEN amount_pennies END), \
         MIN(CASE WHEN transaction_type = 'expense' THEN amount_pennies END), \
         MAX(CASE WHEN transaction_type = 'expense' THEN amount_pennies END) \
         FROM expenses",
        [],
        |row| {
            Ok(SpendingStats {
                total_transactions: row.get(0)?,
                total_spent: row.get(1)?,
                total_income: row.get(2)?,
                average_transaction: row.get(3)?,
                smallest_transaction: row.get(4)?,
                largest_transaction: row.get(5)?,
            })
        },
    )?;
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Monthly comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MonthTotal {
    pub month: String,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyComparison {
    pub current: MonthTotal,
    pub previous: MonthTotal,
    pub difference: Money,
    pub percent_change: f64,
}

pub fn get_monthly_comparison(conn: &Connection) -> Result<Option<MonthlyComparison>> {
    get_monthly_comparison_as_of(conn, today())
}

/// Compare expense totals of the two most recent months with activity on or
/// after the first day of last month. `None` when fewer than two qualify.
pub fn get_monthly_comparison_as_of(
    conn: &Connection,
    today: NaiveDate,
) -> Result<Option<MonthlyComparison>> {
    let start_of_month = today.with_day(1).unwrap_or(today);
    let since = start_of_month
        .checked_sub_months(Months::new(1))
        .unwrap_or(start_of_month);
    let mut stmt = conn.prepare(
        "SELECT strftime('%Y-%m', spent_on) as month, \
         SUM(CASE WHEN transaction_type = 'expense' THEN amount_pennies ELSE 0 END) as total \
         FROM expenses WHERE spent_on >= ?1 AND strftime('%Y-%m', spent_on) IS NOT NULL \
         GROUP BY month ORDER BY month DESC LIMIT 2",
    )?;
    let months = stmt
        .query_map([iso(since)], |row| {
            Ok(MonthTotal {
                month: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                total: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut months = months.into_iter();
    let (Some(current), Some(previous)) = (months.next(), months.next()) else {
        return Ok(None);
    };
    let difference = current.total - previous.total;
    let percent_change = if previous.total > Money::ZERO {
        difference.minor() as f64 / previous.total.minor() as f64 * 100.0
    } else {
        0.0
    };
    Ok(Some(MonthlyComparison {
        current,
        previous,
        difference,
        percent_change,
    }))
}

// ---------------------------------------------------------------------------
// Daily spending
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotal {
    pub date: String,
    pub total: Money,
}

pub fn get_daily_spending(conn: &Connection, days: u32) -> Result<Vec<DailyTotal>> {
    get_daily_spending_as_of(conn, today(), days)
}

/// Per-day totals (both kinds) over the last `days` days, oldest first.
pub fn get_daily_spending_as_of(
    conn: &Connection,
    today: NaiveDate,
    days: u32,
) -> Result<Vec<DailyTotal>> {
    let since = today - Duration::days(i64::from(days));
    let mut stmt = conn.prepare(
        "SELECT spent_on, SUM(amount_pennies) FROM expenses \
         WHERE spent_on >= ?1 GROUP BY spent_on ORDER BY spent_on ASC",
    )?;
    let rows = stmt
        .query_map([iso(since)], |row| {
            Ok(DailyTotal {
                date: row.get(0)?,
                total: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub spent: Money,
    pub income: Money,
    pub net: Money,
}

pub fn get_totals(conn: &Connection) -> Result<Totals> {
    let (spent, income): (Money, Money) = conn.query_row(
        "SELECT \
         COALESCE(SUM(CASE WHEN transaction_type = 'expense' THEN amount_pennies END), 0), \
         COALESCE(SUM(CASE WHEN transaction_type = 'income' THEN amount_pennies END), 0) \
         FROM expenses",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(Totals {
        spent,
        income,
        net: income - spent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_db;

    fn category_id(conn: &Connection, name: &str) -> i64 {
        conn.query_row("SELECT id FROM categories WHERE name = ?1", [name], |r| r.get(0))
            .unwrap()
    }

    fn add(conn: &Connection, date: &str, pennies: i64, category: &str, merchant: &str, kind: &str) {
        let cat = category_id(conn, category);
        conn.execute(
            "INSERT INTO expenses (spent_on, amount_pennies, category_id, merchant, transaction_type) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![date, pennies, cat, merchant, kind],
        )
        .unwrap();
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_ledger_yields_empty_views() {
        let (_dir, conn) = test_db();
        assert!(get_monthly_trends(&conn).unwrap().is_empty());
        assert!(get_category_breakdown(&conn).unwrap().is_empty());
        assert!(get_category_trends(&conn, DEFAULT_TREND_MONTHS).unwrap().is_empty());
        assert!(get_top_merchants(&conn, DEFAULT_MERCHANT_LIMIT).unwrap().is_empty());
        assert!(get_weekday_analysis(&conn).unwrap().is_empty());
        assert!(get_monthly_comparison(&conn).unwrap().is_none());
        let stats = get_spending_stats(&conn).unwrap();
        assert_eq!(stats.total_transactions, 0);
        assert_eq!(stats.total_spent, Money::ZERO);
        assert_eq!(stats.average_transaction, None);
        assert_eq!(stats.largest_transaction, None);
    }

    #[test]
    fn test_monthly_trends_ascending_and_capped() {
        let (_dir, conn) = test_db();
        for m in 1..=12 {
            add(&conn, &format!("2023-{m:02}-10"), 100 * m, "Groceries", "TESCO", "expense");
        }
        add(&conn, "2024-01-05", 500, "Groceries", "TESCO", "expense");
        add(&conn, "2024-01-25", 200000, "Income", "SALARY", "income");
        let trends = get_monthly_trends(&conn).unwrap();
        assert_eq!(trends.len(), 12);
        assert_eq!(trends[0].month, "2023-02");
        let last = trends.last().unwrap();
        assert_eq!(last.month, "2024-01");
        assert_eq!(last.expenses, Money::from_minor(500));
        assert_eq!(last.income, Money::from_minor(200000));
        assert_eq!(last.count, 2);
    }

    #[test]
    fn test_category_breakdown_expenses_only() {
        let (_dir, conn) = test_db();
        add(&conn, "2024-03-01", 1000, "Groceries", "TESCO", "expense");
        add(&conn, "2024-03-02", 3000, "Groceries", "ASDA", "expense");
        add(&conn, "2024-03-03", 5000, "Rent", "LANDLORD", "expense");
        add(&conn, "2024-03-04", 99999, "Income", "SALARY", "income");
        let breakdown = get_category_breakdown(&conn).unwrap();
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, "Rent");
        assert_eq!(breakdown[1].category, "Groceries");
        assert_eq!(breakdown[1].transaction_count, 2);
        assert_eq!(breakdown[1].total, Money::from_minor(4000));
        assert_eq!(breakdown[1].average, 2000.0);
    }

    #[test]
    fn test_category_trends_grouping_and_order() {
        let (_dir, conn) = test_db();
        let today = date("2024-06-15");
        add(&conn, "2024-05-01", 100, "Groceries", "TESCO", "expense");
        add(&conn, "2024-05-20", 250, "Groceries", "TESCO", "expense");
        add(&conn, "2024-04-01", 300, "Groceries", "TESCO", "expense");
        add(&conn, "2024-05-03", 700, "Groceries", "REFUND", "income");
        add(&conn, "2024-05-03", 900, "Bills", "SKY", "expense");
        add(&conn, "2024-05-04", 0, "Fun", "FREEBIE", "expense");
        // Outside a three month window.
        add(&conn, "2024-03-14", 5000, "Bills", "SKY", "expense");

        let trends = get_category_trends_as_of(&conn, today, 3).unwrap();
        let keys: Vec<(&str, TransactionKind, &str, i64)> = trends
            .iter()
            .map(|t| (t.category.as_str(), t.kind, t.month.as_str(), t.total.minor()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Bills", TransactionKind::Expense, "2024-05", 900),
                ("Groceries", TransactionKind::Expense, "2024-04", 300),
                ("Groceries", TransactionKind::Expense, "2024-05", 350),
                ("Groceries", TransactionKind::Income, "2024-05", 700),
            ]
        );
    }

    #[test]
    fn test_top_merchants_limit_and_both_kinds() {
        let (_dir, conn) = test_db();
        add(&conn, "2024-03-01", 100, "Groceries", "TESCO", "expense");
        add(&conn, "2024-03-02", 150, "Groceries", "TESCO", "expense");
        add(&conn, "2024-03-03", 5000, "Income", "SALARY", "income");
        add(&conn, "2024-03-04", 200, "Fun", "CINEMA", "expense");
        let top = get_top_merchants(&conn, 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].merchant, "SALARY");
        assert_eq!(top[1].merchant, "TESCO");
        assert_eq!(top[1].transaction_count, 2);
        assert_eq!(top[1].total, Money::from_minor(250));
    }

    #[test]
    fn test_weekday_analysis_excludes_idle_days() {
        let (_dir, conn) = test_db();
        // 2024-03-03 is a Sunday, 2024-03-06 a Wednesday.
        add(&conn, "2024-03-03", 100, "Groceries", "TESCO", "expense");
        add(&conn, "2024-03-10", 300, "Groceries", "TESCO", "expense");
        add(&conn, "2024-03-06", 50, "Fun", "CINEMA", "expense");
        let days = get_weekday_analysis(&conn).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!((days[0].day_num, days[0].weekday), (0, "Sunday"));
        assert_eq!(days[0].transaction_count, 2);
        assert_eq!(days[0].total, Money::from_minor(400));
        assert_eq!(days[0].average, 200.0);
        assert_eq!((days[1].day_num, days[1].weekday), (3, "Wednesday"));
    }

    #[test]
    fn test_weekday_analysis_full_week() {
        let (_dir, conn) = test_db();
        for d in 3..=9 {
            add(&conn, &format!("2024-03-{d:02}"), 100, "Groceries", "TESCO", "expense");
        }
        let days = get_weekday_analysis(&conn).unwrap();
        let nums: Vec<u32> = days.iter().map(|d| d.day_num).collect();
        assert_eq!(nums, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(days[6].weekday, "Saturday");
    }

    #[test]
    fn test_spending_stats_mixed_kinds() {
        let (_dir, conn) = test_db();
        add(&conn, "2024-03-01", 500, "Groceries", "TESCO", "expense");
        add(&conn, "2024-03-02", 1000, "Income", "SALARY", "income");
        let stats = get_spending_stats(&conn).unwrap();
        assert_eq!(stats.total_transactions, 2);
        assert_eq!(stats.total_spent, Money::from_minor(500));
        assert_eq!(stats.total_income, Money::from_minor(1000));
        assert_eq!(stats.average_transaction, Some(500.0));
        assert_eq!(stats.smallest_transaction, Some(Money::from_minor(500)));
        assert_eq!(stats.largest_transaction, Some(Money::from_minor(500)));
    }

    #[test]
    fn test_monthly_comparison() {
        let (_dir, conn) = test_db();
        let today = date("2024-06-15");
        add(&conn, "2024-04-20", 99999, "Groceries", "TESCO", "expense");
        add(&conn, "2024-05-02", 1000, "Groceries", "TESCO", "expense");
        add(&conn, "2024-06-01", 1500, "Groceries", "TESCO", "expense");
        let cmp = get_monthly_comparison_as_of(&conn, today).unwrap().unwrap();
        assert_eq!(cmp.current.month, "2024-06");
        assert_eq!(cmp.previous.month, "2024-05");
        assert_eq!(cmp.difference, Money::from_minor(500));
        assert_eq!(cmp.percent_change, 50.0);
    }

    #[test]
    fn test_monthly_comparison_zero_previous() {
        let (_dir, conn) = test_db();
        let today = date("2024-06-15");
        add(&conn, "2024-05-10", 2000, "Income", "SALARY", "income");
        add(&conn, "2024-06-01", 1500, "Groceries", "TESCO", "expense");
        let cmp = get_monthly_comparison_as_of(&conn, today).unwrap().unwrap();
        assert_eq!(cmp.previous.total, Money::ZERO);
        assert_eq!(cmp.difference, Money::from_minor(1500));
        assert_eq!(cmp.percent_change, 0.0);
    }

    #[test]
    fn test_monthly_comparison_needs_two_months() {
        let (_dir, conn) = test_db();
        let today = date("2024-06-15");
        add(&conn, "2024-03-10", 2000, "Groceries", "TESCO", "expense");
        add(&conn, "2024-06-01", 1500, "Groceries", "TESCO", "expense");
        assert!(get_monthly_comparison_as_of(&conn, today).unwrap().is_none());
    }

    #[test]
    fn test_monthly_comparison_ignores_unparseable_dates() {
        let (_dir, conn) = test_db();
        let today = date("2024-06-15");
        add(&conn, "2024/06/03", 700, "Groceries", "SLASHED", "expense");
        add(&conn, "2024-06-01", 1500, "Groceries", "TESCO", "expense");
        assert!(get_monthly_comparison_as_of(&conn, today).unwrap().is_none());

        add(&conn, "2024-05-02", 1000, "Groceries", "TESCO", "expense");
        let cmp = get_monthly_comparison_as_of(&conn, today).unwrap().unwrap();
        assert_eq!(cmp.current.month, "2024-06");
        assert_eq!(cmp.current.total, Money::from_minor(1500));
        assert_eq!(cmp.previous.month, "2024-05");
    }

    #[test]
    fn test_daily_spending_window() {
        let (_dir, conn) = test_db();
        let today = date("2024-06-15");
        add(&conn, "2024-05-01", 100, "Groceries", "TESCO", "expense");
        add(&conn, "2024-06-10", 200, "Groceries", "TESCO", "expense");
        add(&conn, "2024-06-10", 300, "Income", "SALARY", "income");
        add(&conn, "2024-06-12", 50, "Fun", "CINEMA", "expense");
        let daily = get_daily_spending_as_of(&conn, today, 30).unwrap();
        assert_eq!(
            daily,
            vec![
                DailyTotal { date: "2024-06-10".to_string(), total: Money::from_minor(500) },
                DailyTotal { date: "2024-06-12".to_string(), total: Money::from_minor(50) },
            ]
        );
    }

    #[test]
    fn test_totals() {
        let (_dir, conn) = test_db();
        add(&conn, "2024-03-01", 700, "Groceries", "TESCO", "expense");
        add(&conn, "2024-03-02", 1000, "Income", "SALARY", "income");
        let totals = get_totals(&conn).unwrap();
        assert_eq!(totals.spent, Money::from_minor(700));
        assert_eq!(totals.income, Money::from_minor(1000));
        assert_eq!(totals.net, Money::from_minor(300));
    }
}
