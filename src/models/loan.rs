//! Loan (borrow record) model and status lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};

use super::book::BookShort;
use super::user::UserShort;

/// Loan record status.
///
/// `Returned` and `ReturnedLate` are terminal; a loan in either state never
/// transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LoanStatus {
    Active,
    Overdue,
    Returned,
    ReturnedLate,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
            LoanStatus::ReturnedLate => "returned-late",
        }
    }

    /// An open loan ties up one copy of the book
    pub fn is_open(&self) -> bool {
        matches!(self, LoanStatus::Active | LoanStatus::Overdue)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }

    /// Terminal status for a return completed on `today`
    pub fn on_return(due_date: NaiveDate, today: NaiveDate) -> LoanStatus {
        if is_past_due(due_date, today) {
            LoanStatus::ReturnedLate
        } else {
            LoanStatus::Returned
        }
    }
}

/// Overdue rule, date-only granularity: a loan is past due strictly after
/// its due date, never on the due date itself.
pub fn is_past_due(due_date: NaiveDate, today: NaiveDate) -> bool {
    today > due_date
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LoanStatus::Active),
            "overdue" => Ok(LoanStatus::Overdue),
            "returned" => Ok(LoanStatus::Returned),
            "returned-late" => Ok(LoanStatus::ReturnedLate),
            _ => Err(format!("Invalid loan status: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus (stored as TEXT)
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub user_id: i32,
    pub book_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

/// Loan with joined book and user data for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub return_date: Option<DateTime<Utc>>,
    pub status: LoanStatus,
    pub book: BookShort,
    pub user: Option<UserShort>,
}

/// Borrow request: a validated (user, book, due date) triple
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BorrowRequest {
    pub user_id: i32,
    pub book_id: i32,
    /// Must be strictly after the borrow date
    pub due_date: NaiveDate,
}

/// Loan query parameters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LoanQuery {
    pub status: Option<LoanStatus>,
    pub user_id: Option<i32>,
    pub book_id: Option<i32>,
    /// Earliest borrow date, inclusive
    pub from_date: Option<NaiveDate>,
    /// Latest borrow date, inclusive
    pub to_date: Option<NaiveDate>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn past_due_is_strict() {
        let due = date(2026, 3, 10);
        assert!(!is_past_due(due, date(2026, 3, 9)));
        assert!(!is_past_due(due, date(2026, 3, 10)));
        assert!(is_past_due(due, date(2026, 3, 11)));
    }

    #[test]
    fn return_on_or_before_due_date_is_on_time() {
        let due = date(2026, 3, 10);
        assert_eq!(LoanStatus::on_return(due, date(2026, 3, 10)), LoanStatus::Returned);
        assert_eq!(LoanStatus::on_return(due, date(2026, 3, 1)), LoanStatus::Returned);
    }

    #[test]
    fn return_after_due_date_is_late() {
        let due = date(2026, 3, 10);
        assert_eq!(
            LoanStatus::on_return(due, date(2026, 3, 11)),
            LoanStatus::ReturnedLate
        );
    }

    #[test]
    fn open_and_terminal_partition_the_status_set() {
        assert!(LoanStatus::Active.is_open());
        assert!(LoanStatus::Overdue.is_open());
        assert!(LoanStatus::Returned.is_terminal());
        assert!(LoanStatus::ReturnedLate.is_terminal());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            LoanStatus::Active,
            LoanStatus::Overdue,
            LoanStatus::Returned,
            LoanStatus::ReturnedLate,
        ] {
            assert_eq!(status.as_str().parse::<LoanStatus>().unwrap(), status);
        }
        assert!("lost".parse::<LoanStatus>().is_err());
    }
}
