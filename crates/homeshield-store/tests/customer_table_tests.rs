//! Integration tests for the CSV customer table

use homeshield_domain::traits::CustomerLookup;
use homeshield_domain::UpstreamError;
use homeshield_store::CsvCustomerTable;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn test_lookup_known_customer() {
    let file = write_csv("customer_id,first_name,plan,state,effective_year\nC00001,Sam,Gold,TX,2025\n");
    let table = CsvCustomerTable::new(file.path());

    let customer = table.get_customer("C00001").await.unwrap().unwrap();
    assert_eq!(customer.first_name.as_deref(), Some("Sam"));

    let routing = customer.routing().unwrap();
    assert_eq!((routing.plan.as_str(), routing.state.as_str(), routing.effective_year), ("Gold", "TX", 2025));
}

#[tokio::test]
async fn test_unknown_customer_is_none() {
    let file = write_csv("customer_id,plan,state,effective_year\nC00001,Gold,TX,2025\n");
    let table = CsvCustomerTable::new(file.path());

    assert!(table.get_customer("C99999").await.unwrap().is_none());
}

#[tokio::test]
async fn test_edits_are_seen_without_restart() {
    let mut file = write_csv("customer_id,plan,state,effective_year\nC00001,Gold,TX,2025\n");
    let table = CsvCustomerTable::new(file.path());
    assert!(table.get_customer("C00002").await.unwrap().is_none());

    file.write_all(b"C00002,Silver,CA,2024\n").unwrap();
    file.flush().unwrap();

    let customer = table.get_customer("C00002").await.unwrap().unwrap();
    assert_eq!(customer.plan, "Silver");
}

#[tokio::test]
async fn test_missing_file_is_upstream_error() {
    let dir = tempfile::tempdir().unwrap();
    let table = CsvCustomerTable::new(dir.path().join("absent.csv"));

    let result = table.get_customer("C00001").await;
    assert!(matches!(result, Err(UpstreamError::Communication(_))));
}
