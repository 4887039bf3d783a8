//! Record identity and the customer domain type.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A batch record with a stable identity.
///
/// The engine never inspects domain fields; the identity exists only for
/// traceability in logs and tests. A filter stage may produce a transformed
/// record but must preserve its identity unless documented otherwise.
pub trait Record: Send + 'static {
    /// Stable identity of this record.
    fn identity(&self) -> u64;
}

/// A customer as decoded from the input store.
///
/// Immutable once produced by the source; stages that transform a customer
/// return a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique customer id.
    pub id: u64,

    /// Display name.
    pub name: String,

    /// Date of birth.
    pub birthday: NaiveDate,

    /// Number of transactions on record.
    pub transactions: u32,
}

impl Record for Customer {
    fn identity(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={} name={} birthday={} transactions={}",
            self.id, self.name, self.birthday, self.transactions
        )
    }
}

/// Generate `count` random customers and write them as a JSON array to `path`.
///
/// Birthdays fall within the 100 years before `reference`; transaction counts
/// are uniform in `0..=100`. Intended for seeding a local input file to
/// exercise the job against.
pub fn seed_customers(path: &Path, count: u32, reference: NaiveDate) -> Result<()> {
    let mut rng = rand::rng();
    let mut customers = Vec::with_capacity(count as usize);

    for id in 1..=u64::from(count) {
        let year = rng.random_range(reference.year() - 100..=reference.year());
        let last_day = NaiveDate::from_ymd_opt(year, 12, 31)
            .with_context(|| format!("invalid year {year}"))?;
        let ordinal = rng.random_range(1..=last_day.ordinal());
        let birthday = NaiveDate::from_yo_opt(year, ordinal)
            .with_context(|| format!("invalid day {ordinal} of year {year}"))?;

        let name: String = (0..rng.random_range(6..=12))
            .map(|_| rng.random_range(b'a'..=b'z') as char)
            .collect();

        customers.push(Customer {
            id,
            name,
            birthday,
            transactions: rng.random_range(0..=100),
        });
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), &customers)?;

    tracing::info!("Seeded {} customers to {}", count, path.display());
    Ok(())
}
