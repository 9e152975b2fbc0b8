//! Sample queries over the Northwind data set.

use serde::Serialize;

/// A ready-made query offered to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SampleQuery {
    /// Stable identifier.
    pub id: u32,
    /// Short title.
    pub name: &'static str,
    /// What the query shows.
    pub description: &'static str,
    /// The SQL text.
    pub query: &'static str,
}

const SAMPLES: &[SampleQuery] = &[
    SampleQuery {
        id: 1,
        name: "Basic Select",
        description: "Get every product",
        query: "SELECT * FROM products;",
    },
    SampleQuery {
        id: 2,
        name: "Products by Category",
        description: "Count products per category with sorting",
        query: "SELECT c.category_name, COUNT(p.product_id) AS product_count\n\
                FROM categories c\n\
                JOIN products p ON c.category_id = p.category_id\n\
                GROUP BY c.category_name\n\
                ORDER BY product_count DESC;",
    },
    SampleQuery {
        id: 3,
        name: "Count number of products",
        description: "Count total number of products in the table",
        query: "SELECT COUNT(*) FROM products;",
    },
    SampleQuery {
        id: 4,
        name: "Order table (long version)",
        description: "Show all orders from order table",
        query: "SELECT * FROM orders;",
    },
    SampleQuery {
        id: 5,
        name: "Top Customers",
        description: "Customers with the most orders",
        query: "SELECT c.company_name, COUNT(o.order_id) AS order_count\n\
                FROM customers c\n\
                JOIN orders o ON c.customer_id = o.customer_id\n\
                GROUP BY c.company_name\n\
                ORDER BY order_count DESC\n\
                LIMIT 5;",
    },
    SampleQuery {
        id: 6,
        name: "Sales by Country",
        description: "Orders and total freight per shipping country",
        query: "SELECT ship_country, COUNT(order_id) AS orders, SUM(freight) AS total_freight\n\
                FROM orders\n\
                GROUP BY ship_country\n\
                ORDER BY orders DESC\n\
                LIMIT 8;",
    },
    SampleQuery {
        id: 7,
        name: "Employee Performance",
        description: "Orders processed and average freight per employee",
        query: "SELECT e.first_name || ' ' || e.last_name AS employee_name,\n\
                COUNT(o.order_id) AS orders_processed,\n\
                ROUND(AVG(o.freight), 2) AS avg_freight\n\
                FROM employees e\n\
                JOIN orders o ON e.employee_id = o.employee_id\n\
                GROUP BY e.employee_id\n\
                ORDER BY orders_processed DESC;",
    },
];

/// All sample queries, ordered by id.
pub fn sample_queries() -> &'static [SampleQuery] {
    SAMPLES
}

/// Looks up a sample query by id.
pub fn sample_query(id: u32) -> Option<&'static SampleQuery> {
    SAMPLES.iter().find(|sample| sample.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_sql::parser::Parser;

    #[test]
    fn test_samples_parse() {
        for sample in sample_queries() {
            assert!(
                Parser::parse(sample.query).is_ok(),
                "sample {} does not parse",
                sample.id
            );
        }
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let ids: Vec<u32> = sample_queries().iter().map(|s| s.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(ids, sorted);
        assert_eq!(sample_query(2).map(|s| s.name), Some("Products by Category"));
        assert!(sample_query(99).is_none());
    }
}
