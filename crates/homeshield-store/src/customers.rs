//! CSV-backed customer table
//!
//! The file is read again on every lookup, so edits show up without a
//! restart. Recognised header columns:
//!
//! | column                          | required |
//! |---------------------------------|----------|
//! | `customer_id`                   | yes      |
//! | `plan` or `policy_plan`         | yes      |
//! | `state`                         | yes      |
//! | `effective_year`                | one of   |
//! | `effective_date`                | these    |
//! | `policy_file` or `policy_doc`   | no       |
//! | `first_name`                    | no       |

use crate::StoreError;
use async_trait::async_trait;
use homeshield_domain::chunk::title_case;
use homeshield_domain::customer::effective_year_from_date;
use homeshield_domain::traits::CustomerLookup;
use homeshield_domain::{Customer, UpstreamError};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Customer table stored as a CSV file
#[derive(Debug, Clone)]
pub struct CsvCustomerTable {
    path: PathBuf,
}

impl CsvCustomerTable {
    /// Create a table reading from `path`; the file is not opened yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every customer from the file
    pub fn load(&self) -> Result<Vec<Customer>, StoreError> {
        let file = std::fs::File::open(&self.path)
            .map_err(|e| StoreError::Io(format!("{}: {}", self.path.display(), e)))?;
        parse_customers(file)
    }

    /// Find one customer by exact id
    pub fn find(&self, id: &str) -> Result<Option<Customer>, StoreError> {
        let id = id.trim();
        Ok(self.load()?.into_iter().find(|c| c.id == id))
    }
}

#[async_trait]
impl CustomerLookup for CsvCustomerTable {
    async fn get_customer(&self, id: &str) -> Result<Option<Customer>, UpstreamError> {
        let table = self.clone();
        let id = id.to_string();
        let customer = tokio::task::spawn_blocking(move || table.find(&id))
            .await
            .map_err(|e| UpstreamError::Communication(format!("Customer lookup task failed: {}", e)))??;
        debug!("Customer lookup resolved: {}", customer.is_some());
        Ok(customer)
    }
}

struct Columns {
    id: usize,
    plan: usize,
    state: usize,
    effective_year: Option<usize>,
    effective_date: Option<usize>,
    policy_file: Option<usize>,
    first_name: Option<usize>,
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|h| names.iter().any(|n| *n == h.trim()))
}

fn require_column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize, StoreError> {
    find_column(headers, names)
        .ok_or_else(|| StoreError::InvalidData(format!("missing column {}", names.join(" or "))))
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, StoreError> {
        let columns = Self {
            id: require_column(headers, &["customer_id"])?,
            plan: require_column(headers, &["plan", "policy_plan"])?,
            state: require_column(headers, &["state"])?,
            effective_year: find_column(headers, &["effective_year"]),
            effective_date: find_column(headers, &["effective_date"]),
            policy_file: find_column(headers, &["policy_file", "policy_doc"]),
            first_name: find_column(headers, &["first_name"]),
        };
        if columns.effective_year.is_none() && columns.effective_date.is_none() {
            return Err(StoreError::InvalidData(
                "missing column effective_year or effective_date".to_string(),
            ));
        }
        Ok(columns)
    }
}

fn field(record: &csv::StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_year(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|y| y.is_finite())
        .map(|y| y.trunc() as i64)
}

/// Parse a customer CSV from any reader
pub fn parse_customers<R: Read>(reader: R) -> Result<Vec<Customer>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = Columns::from_headers(reader.headers()?)?;

    let mut customers = Vec::new();
    for record in reader.records() {
        let record = record?;
        let Some(id) = field(&record, Some(columns.id)) else {
            continue;
        };
        let effective_date = field(&record, columns.effective_date);
        let effective_year = field(&record, columns.effective_year)
            .as_deref()
            .and_then(parse_year)
            .or_else(|| effective_date.as_deref().and_then(effective_year_from_date));

        customers.push(Customer {
            id,
            plan: title_case(&field(&record, Some(columns.plan)).unwrap_or_default()),
            state: field(&record, Some(columns.state)).unwrap_or_default().to_uppercase(),
            effective_year,
            effective_date,
            policy_file: field(&record, columns.policy_file),
            first_name: field(&record, columns.first_name),
        });
    }
    Ok(customers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year_columns() {
        let csv = "customer_id,plan,state,effective_year\nC00001,gold,tx,2025\nC00002,Silver,CA,2024.0\n";
        let customers = parse_customers(csv.as_bytes()).unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[0].plan, "Gold");
        assert_eq!(customers[0].state, "TX");
        assert_eq!(customers[0].effective_year, Some(2025));
        assert_eq!(customers[1].effective_year, Some(2024));
    }

    #[test]
    fn test_parse_date_and_alias_columns() {
        let csv = "customer_id,first_name,policy_plan,state,effective_date,policy_doc\n\
                   C00182,Ana,Platinum,fl,2024-06-15,LHG_Platinum_FL_2024.txt\n";
        let customers = parse_customers(csv.as_bytes()).unwrap();
        let c = &customers[0];
        assert_eq!(c.plan, "Platinum");
        assert_eq!(c.state, "FL");
        assert_eq!(c.effective_year, Some(2024));
        assert_eq!(c.effective_date.as_deref(), Some("2024-06-15"));
        assert_eq!(c.policy_file.as_deref(), Some("LHG_Platinum_FL_2024.txt"));
        assert_eq!(c.first_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_unparseable_year_is_none() {
        let csv = "customer_id,plan,state,effective_year\nC00003,Gold,TX,soon\n";
        let customers = parse_customers(csv.as_bytes()).unwrap();
        assert_eq!(customers[0].effective_year, None);
        assert!(customers[0].routing().is_none());
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "customer_id,state,effective_year\nC00001,TX,2025\n";
        assert!(matches!(parse_customers(csv.as_bytes()), Err(StoreError::InvalidData(_))));

        let csv = "customer_id,plan,state\nC00001,Gold,TX\n";
        assert!(matches!(parse_customers(csv.as_bytes()), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_blank_ids_are_skipped() {
        let csv = "customer_id,plan,state,effective_year\n,Gold,TX,2025\nC00001,Gold,TX,2025\n";
        assert_eq!(parse_customers(csv.as_bytes()).unwrap().len(), 1);
    }
}
