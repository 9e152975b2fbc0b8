//! Shared fixtures for the server integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tabula_server::database::{Database, DatabaseConfig};
use tabula_sql::storage::{LoadError, LoadResult, MemorySource, TableSource};

pub const CATEGORIES: &str = "\
category_id,category_name,description
1,Beverages,\"Soft drinks, coffees, teas, beers, and ales\"
2,Condiments,\"Sweet and savory sauces, relishes, spreads, and seasonings\"
3,Confections,\"Desserts, candies, and sweet breads\"
6,Meat/Poultry,Prepared meats
7,Produce,Dried fruit and bean curd
8,Seafood,Seaweed and fish
";

pub const PRODUCTS: &str = "\
product_id,product_name,supplier_id,category_id,unit_price,units_in_stock
1,Chai,1,1,18,39
2,Chang,1,1,19,17
3,Aniseed Syrup,1,2,10,13
4,Chef Anton's Cajun Seasoning,2,2,22,53
5,Chef Anton's Gumbo Mix,2,2,21.35,0
6,Grandma's Boysenberry Spread,3,2,25,120
7,Uncle Bob's Organic Dried Pears,3,7,30,15
8,Northwoods Cranberry Sauce,3,2,40,6
9,Mishi Kobe Niku,4,6,97,29
10,Ikura,4,8,31,31
";

pub const SHIPPERS: &str = "\
shipper_id,company_name,phone
1,Speedy Express,(503) 555-9831
2,United Package,(503) 555-3199
3,Federal Shipping,
";

pub const CUSTOMERS: &str = "\
customer_id,company_name,contact_name,country
ALFKI,Alfreds Futterkiste,Maria Anders,Germany
ANATR,Ana Trujillo Emparedados y helados,Ana Trujillo,Mexico
AROUT,Around the Horn,Thomas Hardy,UK
VINET,Vins et alcools Chevalier,Paul Henriot,France
";

pub const EMPLOYEES: &str = "\
employee_id,last_name,first_name,title
1,Davolio,Nancy,Sales Representative
2,Fuller,Andrew,\"Vice President, Sales\"
3,Leverling,Janet,Sales Representative
";

pub const ORDERS: &str = "\
order_id,customer_id,employee_id,order_date,ship_country,freight
10248,VINET,3,1996-07-04,France,32.38
10249,ALFKI,1,1996-07-05,Germany,11.61
10250,AROUT,1,1996-07-08,UK,65.83
10251,VINET,3,1996-07-08,France,41.34
10252,ALFKI,1,1996-07-09,Germany,51.30
10253,VINET,2,1996-07-10,France,58.17
";

pub const PRODUCT_COLUMNS: [&str; 6] = [
    "product_id",
    "product_name",
    "supplier_id",
    "category_id",
    "unit_price",
    "units_in_stock",
];

pub fn northwind_source() -> Arc<MemorySource> {
    Arc::new(
        MemorySource::new()
            .with_table("categories", CATEGORIES)
            .with_table("customers", CUSTOMERS)
            .with_table("employees", EMPLOYEES)
            .with_table("orders", ORDERS)
            .with_table("products", PRODUCTS)
            .with_table("shippers", SHIPPERS),
    )
}

pub fn database() -> Database {
    Database::with_source(northwind_source(), DatabaseConfig::default())
}

/// Serves a table after a delay, counting fetches.
#[derive(Debug)]
pub struct SlowSource {
    pub delay: Duration,
    pub fetches: AtomicUsize,
}

impl SlowSource {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl TableSource for SlowSource {
    fn table_names(&self) -> Vec<String> {
        vec!["products".to_string()]
    }

    fn fetch(&self, _table: &str) -> LoadResult<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Ok(PRODUCTS.to_string())
    }
}

/// Fails the first `failures` fetches, then serves the products table.
#[derive(Debug)]
pub struct FlakySource {
    pub failures: usize,
    pub fetches: AtomicUsize,
}

impl FlakySource {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl TableSource for FlakySource {
    fn table_names(&self) -> Vec<String> {
        vec!["products".to_string()]
    }

    fn fetch(&self, table: &str) -> LoadResult<String> {
        let attempt = self.fetches.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            Err(LoadError::unavailable(table, "503 Service Unavailable"))
        } else {
            Ok(PRODUCTS.to_string())
        }
    }
}
