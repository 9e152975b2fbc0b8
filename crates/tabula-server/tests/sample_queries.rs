//! Runs the sample query catalogue against Northwind-shaped tables.

mod common;

use tabula_server::samples::{sample_queries, sample_query};
use tabula_server::QueryResponse;
use tabula_sql::executor::Value;

use common::database;

fn run_sample(id: u32) -> QueryResponse {
    let sample = sample_query(id).unwrap();
    database()
        .run_query(sample.query)
        .unwrap_or_else(|e| panic!("sample {} failed: {}", id, e))
}

fn column(response: &QueryResponse, index: usize) -> Vec<String> {
    response
        .rows
        .iter()
        .map(|row| row[index].to_string())
        .collect()
}

fn float(value: &Value) -> f64 {
    value.as_number().map(|n| n.to_f64()).unwrap()
}

#[test]
fn test_every_sample_runs() {
    let db = database();
    for sample in sample_queries() {
        let response = db
            .run_query(sample.query)
            .unwrap_or_else(|e| panic!("sample {} failed: {}", sample.id, e));
        assert!(!response.columns.is_empty(), "sample {}", sample.id);
        assert!(!response.rows.is_empty(), "sample {}", sample.id);
    }
}

#[test]
fn test_basic_samples() {
    assert_eq!(run_sample(1).rows.len(), 10);
    assert_eq!(run_sample(3).rows, vec![vec![Value::Integer(10)]]);

    let orders = run_sample(4);
    assert_eq!(orders.rows.len(), 6);
    assert_eq!(orders.columns[0], "order_id");
}

#[test]
fn test_products_by_category_sample() {
    let response = run_sample(2);
    assert_eq!(response.columns, vec!["category_name", "product_count"]);
    assert_eq!(
        column(&response, 0),
        vec!["Condiments", "Beverages", "Meat/Poultry", "Produce", "Seafood"]
    );
    assert_eq!(column(&response, 1), vec!["5", "2", "1", "1", "1"]);
}

#[test]
fn test_top_customers_sample() {
    let response = run_sample(5);
    assert_eq!(response.columns, vec!["company_name", "order_count"]);
    assert_eq!(
        column(&response, 0),
        vec![
            "Vins et alcools Chevalier",
            "Alfreds Futterkiste",
            "Around the Horn"
        ]
    );
    assert_eq!(column(&response, 1), vec!["3", "2", "1"]);
}

#[test]
fn test_sales_by_country_sample() {
    let response = run_sample(6);
    assert_eq!(response.columns, vec!["ship_country", "orders", "total_freight"]);
    assert_eq!(column(&response, 0), vec!["France", "Germany", "UK"]);
    assert_eq!(column(&response, 1), vec!["3", "2", "1"]);

    let totals: Vec<f64> = response.rows.iter().map(|row| float(&row[2])).collect();
    for (total, expected) in totals.iter().zip([131.89, 62.91, 65.83]) {
        assert!((total - expected).abs() < 1e-9, "{} != {}", total, expected);
    }
}

#[test]
fn test_employee_performance_sample() {
    let response = run_sample(7);
    assert_eq!(
        response.columns,
        vec!["employee_name", "orders_processed", "avg_freight"]
    );
    assert_eq!(
        column(&response, 0),
        vec!["Nancy Davolio", "Janet Leverling", "Andrew Fuller"]
    );
    assert_eq!(column(&response, 1), vec!["3", "2", "1"]);
    assert_eq!(column(&response, 2), vec!["42.91", "36.86", "58.17"]);
}
