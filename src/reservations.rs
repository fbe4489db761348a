// 🏠 Reservations - input records, reservation sources, aggregation
//
// Reservation records are immutable inputs. No date ordering or sign
// checks are done on them; a source only decides which records belong
// to a property and a statement period.

use crate::error::{Result, StatementError};
use crate::money::checked_sum;
use chrono::{Datelike, Local, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ============================================================================
// RESERVATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub reservation_id: String,
    pub property_tag: String,

    #[serde(default)]
    pub guest_name: String,

    pub check_in: NaiveDate,
    pub check_out: NaiveDate,

    /// Missing or blank amounts count as zero
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub total_amount: Decimal,

    #[serde(default, deserialize_with = "amount_or_zero")]
    pub cleaning_fee: Decimal,

    #[serde(default)]
    pub platform: String,

    #[serde(default)]
    pub status: String,
}

/// Accepts numbers, numeric strings, blanks and nulls (blank/null → 0).
/// Floats go through their shortest text form so `130.45` stays `130.45`.
fn amount_or_zero<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct AmountVisitor;

    impl<'de> serde::de::Visitor<'de> for AmountVisitor {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a money amount")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<Decimal, E> {
            Ok(Decimal::from(v))
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> std::result::Result<Decimal, E> {
            Decimal::from_str(&v.to_string()).map_err(E::custom)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<Decimal, E> {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(Decimal::ZERO);
            }
            Decimal::from_str(trimmed).map_err(E::custom)
        }

        fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Decimal, E> {
            Ok(Decimal::ZERO)
        }

        fn visit_none<E: serde::de::Error>(self) -> std::result::Result<Decimal, E> {
            Ok(Decimal::ZERO)
        }

        fn visit_some<D2>(self, deserializer: D2) -> std::result::Result<Decimal, D2::Error>
        where
            D2: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(AmountVisitor)
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}

// ============================================================================
// STATEMENT PERIOD (YYYY-MM)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatementPeriod {
    year: i32,
    month: u32,
}

impl StatementPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|_| StatementPeriod { year, month })
            .ok_or_else(|| StatementError::InvalidPeriod(format!("{:04}-{:02}", year, month)))
    }

    /// The month before the one containing `today`
    pub fn previous_month(today: NaiveDate) -> Self {
        StatementPeriod {
            year: today.year(),
            month: today.month(),
        }
        .previous()
    }

    /// Default period offered to the operator: last month
    pub fn last_month() -> Self {
        Self::previous_month(Local::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            StatementPeriod { year: self.year + 1, month: 1 }
        } else {
            StatementPeriod { year: self.year, month: self.month + 1 }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            StatementPeriod { year: self.year - 1, month: 12 }
        } else {
            StatementPeriod { year: self.year, month: self.month - 1 }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl FromStr for StatementPeriod {
    type Err = StatementError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let invalid = || StatementError::InvalidPeriod(raw.to_string());

        let (year, month) = raw.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        StatementPeriod::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for StatementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for StatementPeriod {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StatementPeriod {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// RESERVATION SOURCES
// ============================================================================

/// Produces the reservations of one property for one statement period.
/// The statement core only sees the resulting sequence.
pub trait ReservationSource {
    fn reservations(&self, tag: &str, period: &StatementPeriod) -> Result<Vec<Reservation>>;
}

/// Built-in demo bookings standing in for a booking-platform feed.
///
/// The same three September 2025 stays are returned for every tag and
/// period, stamped with the requested tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleReservationSource;

impl SampleReservationSource {
    pub fn sample(tag: &str) -> Vec<Reservation> {
        let stay = |id: &str, guest: &str, days: (u32, u32), total: Decimal, cleaning: Decimal, platform: &str| {
            Reservation {
                reservation_id: id.to_string(),
                property_tag: tag.to_string(),
                guest_name: guest.to_string(),
                check_in: NaiveDate::from_ymd_opt(2025, 9, days.0).unwrap_or_default(),
                check_out: NaiveDate::from_ymd_opt(2025, 9, days.1).unwrap_or_default(),
                total_amount: total,
                cleaning_fee: cleaning,
                platform: platform.to_string(),
                status: "completed".to_string(),
            }
        };

        vec![
            stay("HSP001", "John Doe", (1, 5), dec!(1800.00), dec!(120.00), "Airbnb"),
            stay("HSP002", "Jane Smith", (10, 15), dec!(2500.00), dec!(150.00), "VRBO"),
            stay("HSP003", "Mike Johnson", (20, 25), dec!(2200.00), dec!(130.00), "Booking.com"),
        ]
    }
}

impl ReservationSource for SampleReservationSource {
    fn reservations(&self, tag: &str, _period: &StatementPeriod) -> Result<Vec<Reservation>> {
        Ok(Self::sample(tag))
    }
}

/// Reservations exported to CSV (one row per booking, headers = field names).
/// Rows are kept when the tag matches and the check-in falls in the period.
#[derive(Debug, Clone)]
pub struct CsvReservationSource {
    path: PathBuf,
}

impl CsvReservationSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvReservationSource { path: path.into() }
    }

    pub fn load_all(&self) -> Result<Vec<Reservation>> {
        let mut rdr = csv::Reader::from_path(&self.path)?;
        let mut reservations = Vec::new();
        for row in rdr.deserialize() {
            let reservation: Reservation = row?;
            reservations.push(reservation);
        }
        tracing::debug!(path = %self.path.display(), rows = reservations.len(), "reservations loaded");
        Ok(reservations)
    }
}

impl ReservationSource for CsvReservationSource {
    fn reservations(&self, tag: &str, period: &StatementPeriod) -> Result<Vec<Reservation>> {
        Ok(self
            .load_all()?
            .into_iter()
            .filter(|r| r.property_tag == tag && period.contains(r.check_in))
            .collect())
    }
}

/// Fixed in-memory list, filtered by tag only
#[derive(Debug, Clone, Default)]
pub struct InMemoryReservationSource {
    reservations: Vec<Reservation>,
}

impl InMemoryReservationSource {
    pub fn new(reservations: Vec<Reservation>) -> Self {
        InMemoryReservationSource { reservations }
    }
}

impl ReservationSource for InMemoryReservationSource {
    fn reservations(&self, tag: &str, _period: &StatementPeriod) -> Result<Vec<Reservation>> {
        Ok(self
            .reservations
            .iter()
            .filter(|r| r.property_tag == tag)
            .cloned()
            .collect())
    }
}

// ============================================================================
// AGGREGATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReservationTotals {
    pub total_income: Decimal,
    pub total_cleaning_fees: Decimal,
    pub count: usize,
}

/// Sum income and cleaning fees. Empty input yields all zeros; a sum
/// beyond the Decimal range is `ComputationFailed`.
pub fn aggregate(reservations: &[Reservation]) -> Result<ReservationTotals> {
    Ok(ReservationTotals {
        total_income: checked_sum(reservations.iter().map(|r| r.total_amount), "reservation income")?,
        total_cleaning_fees: checked_sum(reservations.iter().map(|r| r.cleaning_fee), "cleaning fees")?,
        count: reservations.len(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
