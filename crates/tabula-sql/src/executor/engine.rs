//! Statement execution.
//!
//! A [`SelectStatement`] runs through a fixed pipeline:
//!
//! ```text
//! FROM / JOIN ─▶ WHERE ─▶ GROUP BY / HAVING ─▶ project ─▶ DISTINCT ─▶ ORDER BY ─▶ OFFSET / LIMIT
//! ```
//!
//! Joins are nested loops. Until projection, a working row is a tuple of
//! row positions, one per source table, so no cell is copied while rows
//! are being joined, filtered or grouped.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::parser::{
    ColumnRef, Expr, Literal, OrderByExpr, SelectItem, SelectStatement, SortDirection, TableRef,
};
use crate::storage::{Catalog, Table};

use super::aggregate::Accumulator;
use super::binder::{AggregateCall, Binder, Scope};
use super::error::{ExecutionError, ExecutionResult};
use super::evaluator::{evaluate, evaluate_predicate, BoundExpr, EvalContext};
use super::value::{Number, Value};

/// The rows produced by a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Output column names in projection order.
    pub columns: Vec<String>,
    /// Output rows, each aligned to `columns`.
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    /// Number of output rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the statement produced no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Executes statements against the tables of a catalog.
///
/// The executor never loads anything: a table that is not loaded when the
/// statement runs is reported as not found. Callers load the tables a
/// statement references first (see [`SelectStatement::referenced_tables`]).
#[derive(Debug, Clone, Copy)]
pub struct QueryExecutor<'a> {
    catalog: &'a Catalog,
}

impl<'a> QueryExecutor<'a> {
    /// Creates an executor over a catalog.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Executes a statement and collects its rows.
    pub fn execute(&self, statement: &SelectStatement) -> ExecutionResult<QueryResult> {
        let (tables, scope, constraints) = self.resolve_sources(statement)?;
        let input = Input {
            tables: &tables,
            scope: &scope,
        };

        let mut tuples = join(input, &constraints)?;

        let mut binder = Binder::new(&scope);
        if let Some(selection) = &statement.selection {
            let predicate = binder.bind_scalar(selection, "WHERE")?;
            let mut kept = Vec::with_capacity(tuples.len());
            for tuple in tuples {
                if evaluate_predicate(&predicate, &input.row(&tuple), "WHERE")? {
                    kept.push(tuple);
                }
            }
            tuples = kept;
        }

        let outputs = bind_projection(&statement.projection, &scope, &mut binder)?;
        binder.set_aliases(output_aliases(&statement.projection));
        let keys = statement
            .group_by
            .iter()
            .map(|expr| bind_group_key(expr, &outputs, &mut binder))
            .collect::<ExecutionResult<Vec<_>>>()?;
        let having = match &statement.having {
            Some(having) => Some(binder.bind_with_aggregates(having)?),
            None => None,
        };
        let sort_keys = bind_order_by(&statement.order_by, &outputs, &mut binder)?;
        let calls = binder.into_aggregates();

        let grouped =
            !statement.group_by.is_empty() || having.is_some() || statement.has_aggregates();

        let mut rows = Vec::new();
        if grouped {
            for group in group_rows(input, tuples, &keys)? {
                let aggregates = aggregate_group(input, &calls, &group.tuples)?;
                let ctx = GroupContext {
                    input,
                    tuples: &group.tuples,
                    key_exprs: &keys,
                    key: &group.key,
                    aggregates: &aggregates,
                };
                if let Some(having) = &having {
                    if !evaluate_predicate(having, &ctx, "HAVING")? {
                        continue;
                    }
                }
                rows.push(project(&ctx, &outputs, &sort_keys)?);
            }
        } else {
            for tuple in &tuples {
                rows.push(project(&input.row(tuple), &outputs, &sort_keys)?);
            }
        }

        if statement.distinct {
            let mut seen = HashSet::new();
            rows.retain(|row| seen.insert(row.values.clone()));
        }

        let directions = sort_keys.iter().map(|(_, dir)| *dir).collect::<Vec<_>>();
        sort_rows(&mut rows, &directions);

        let offset = statement
            .offset
            .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
        let limit = statement
            .limit
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));
        let rows = rows
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| row.values)
            .collect::<Vec<_>>();

        debug!(
            tables = tables.len(),
            columns = outputs.len(),
            rows = rows.len(),
            grouped,
            "Executed SELECT"
        );

        Ok(QueryResult {
            columns: outputs.into_iter().map(|output| output.name).collect(),
            rows,
        })
    }

    /// Looks up every table in FROM and JOIN, building the scope as it
    /// goes. Each ON predicate is bound against the tables to its left and
    /// its own table only.
    fn resolve_sources(
        &self,
        statement: &SelectStatement,
    ) -> ExecutionResult<(Vec<Arc<Table>>, Scope, Vec<Option<BoundExpr>>)> {
        let mut tables = Vec::new();
        let mut scope = Scope::new();
        let mut constraints = Vec::new();

        let Some(from) = &statement.from else {
            return Ok((tables, scope, constraints));
        };

        self.add_source(&from.table, &mut tables, &mut scope)?;
        for join in &from.joins {
            self.add_source(&join.table, &mut tables, &mut scope)?;
            let constraint = match &join.constraint {
                Some(on) => Some(Binder::new(&scope).bind_scalar(on, "ON")?),
                None => None,
            };
            constraints.push(constraint);
        }
        Ok((tables, scope, constraints))
    }

    fn add_source(
        &self,
        table: &TableRef,
        tables: &mut Vec<Arc<Table>>,
        scope: &mut Scope,
    ) -> ExecutionResult<()> {
        let data = self
            .catalog
            .get(&table.name)
            .ok_or_else(|| ExecutionError::TableNotFound(table.name.clone()))?;
        scope.add_table(table.qualifier(), &data);
        tables.push(data);
        Ok(())
    }
}

/// Row positions, one per source table.
type Tuple = Vec<usize>;

/// The source tables of a statement together with their scope.
#[derive(Clone, Copy)]
struct Input<'r> {
    tables: &'r [Arc<Table>],
    scope: &'r Scope,
}

impl<'r> Input<'r> {
    fn row<'t>(self, tuple: &'t [usize]) -> RowContext<'t>
    where
        'r: 't,
    {
        RowContext { input: self, tuple }
    }
}

/// Evaluation context for one joined row.
struct RowContext<'r> {
    input: Input<'r>,
    tuple: &'r [usize],
}

impl EvalContext for RowContext<'_> {
    fn column(&self, index: usize, name: &str) -> ExecutionResult<Value> {
        let column = self
            .input
            .scope
            .columns()
            .get(index)
            .ok_or_else(|| ExecutionError::ColumnNotFound(name.to_string()))?;
        // Positions past the tuple belong to tables not joined yet.
        Ok(self
            .tuple
            .get(column.source)
            .and_then(|&row| self.input.tables.get(column.source)?.rows().get(row))
            .and_then(|row| row.get(column.column))
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn aggregate(&self, _slot: usize) -> ExecutionResult<Value> {
        Err(ExecutionError::MisplacedAggregate(
            "row-level expressions".to_string(),
        ))
    }
}

/// A group of rows sharing the same GROUP BY values.
struct Group {
    key: Vec<Value>,
    tuples: Vec<Tuple>,
}

/// Evaluation context for one group.
///
/// GROUP BY expressions evaluate to the group's key. A bare column
/// reference is accepted only if it holds a single value across the
/// group; aggregates read their precomputed results.
struct GroupContext<'r> {
    input: Input<'r>,
    tuples: &'r [Tuple],
    key_exprs: &'r [BoundExpr],
    key: &'r [Value],
    aggregates: &'r [Value],
}

impl EvalContext for GroupContext<'_> {
    fn column(&self, index: usize, name: &str) -> ExecutionResult<Value> {
        let mut values = self
            .tuples
            .iter()
            .map(|tuple| self.input.row(tuple).column(index, name));
        let first = match values.next() {
            Some(value) => value?,
            None => return Ok(Value::Null),
        };
        for value in values {
            if value? != first {
                return Err(ExecutionError::UngroupedColumn(name.to_string()));
            }
        }
        Ok(first)
    }

    fn aggregate(&self, slot: usize) -> ExecutionResult<Value> {
        self.aggregates.get(slot).cloned().ok_or_else(|| {
            ExecutionError::InvalidArgument(format!("no aggregate in slot {}", slot))
        })
    }

    fn group_key(&self, expr: &BoundExpr) -> Option<Value> {
        self.key_exprs
            .iter()
            .position(|key| key == expr)
            .and_then(|i| self.key.get(i).cloned())
    }
}

/// One output column.
struct Output<'s> {
    name: String,
    expr: BoundExpr,
    /// The select-list expression, absent for columns expanded from `*`.
    source: Option<&'s Expr>,
}

/// What an ORDER BY key sorts on.
enum SortKey {
    /// A column of the output, by position.
    Output(usize),
    /// An expression evaluated alongside the projection.
    Expr(BoundExpr),
}

/// A projected row with the values of its ORDER BY keys.
struct ProjectedRow {
    values: Vec<Value>,
    keys: Vec<Value>,
}

fn join(input: Input<'_>, constraints: &[Option<BoundExpr>]) -> ExecutionResult<Vec<Tuple>> {
    let Some(first) = input.tables.first() else {
        // No FROM: a single row with no columns.
        return Ok(vec![Vec::new()]);
    };

    let mut tuples = (0..first.len()).map(|row| vec![row]).collect::<Vec<_>>();
    for (offset, (table, constraint)) in input.tables[1..].iter().zip(constraints).enumerate() {
        let mut joined = Vec::new();
        let mut candidate = Vec::with_capacity(offset + 2);
        for tuple in &tuples {
            for row in 0..table.len() {
                candidate.clear();
                candidate.extend_from_slice(tuple);
                candidate.push(row);
                let keep = match constraint {
                    Some(on) => evaluate_predicate(on, &input.row(&candidate), "ON")?,
                    None => true,
                };
                if keep {
                    joined.push(candidate.clone());
                }
            }
        }
        tuples = joined;
    }
    Ok(tuples)
}

fn bind_projection<'s>(
    items: &'s [SelectItem],
    scope: &Scope,
    binder: &mut Binder<'_>,
) -> ExecutionResult<Vec<Output<'s>>> {
    let mut outputs = Vec::with_capacity(items.len());
    for item in items {
        match item {
            SelectItem::Wildcard => {
                if scope.is_empty() {
                    return Err(ExecutionError::InvalidArgument(
                        "SELECT * requires a FROM clause".to_string(),
                    ));
                }
                outputs.extend((0..scope.len()).filter_map(|index| scope_output(scope, index)));
            }
            SelectItem::QualifiedWildcard(qualifier) => {
                let columns = scope.columns_of(qualifier);
                if columns.is_empty() {
                    return Err(ExecutionError::TableNotFound(qualifier.clone()));
                }
                outputs.extend(
                    columns
                        .into_iter()
                        .filter_map(|index| scope_output(scope, index)),
                );
            }
            SelectItem::Expr { expr, alias, text } => {
                let bound = binder.bind_with_aggregates(expr)?;
                let name = match (alias, &bound) {
                    (Some(alias), _) => alias.clone(),
                    (None, BoundExpr::Column { index, .. }) => scope
                        .columns()
                        .get(*index)
                        .map_or_else(|| text.clone(), |column| column.name.clone()),
                    (None, _) => text.clone(),
                };
                outputs.push(Output {
                    name,
                    expr: bound,
                    source: Some(expr),
                });
            }
        }
    }
    Ok(outputs)
}

fn scope_output<'s>(scope: &Scope, index: usize) -> Option<Output<'s>> {
    let column = scope.columns().get(index)?;
    Some(Output {
        name: column.name.clone(),
        expr: BoundExpr::Column {
            index,
            name: format!("{}.{}", column.qualifier, column.name),
        },
        source: None,
    })
}

fn output_aliases(items: &[SelectItem]) -> Vec<(String, Expr)> {
    items
        .iter()
        .filter_map(|item| match item {
            SelectItem::Expr {
                expr,
                alias: Some(alias),
                ..
            } => Some((alias.clone(), expr.clone())),
            _ => None,
        })
        .collect()
}

/// Maps a 1-based select-list position to an output index.
fn output_position(position: i64, outputs: usize, clause: &str) -> ExecutionResult<usize> {
    usize::try_from(position)
        .ok()
        .filter(|p| (1..=outputs).contains(p))
        .map(|p| p - 1)
        .ok_or_else(|| {
            ExecutionError::InvalidArgument(format!(
                "{} position {} is not in the select list",
                clause, position
            ))
        })
}

/// Resolves a GROUP BY key. An integer literal is a 1-based output
/// position, grouping on that output's expression.
fn bind_group_key(
    expr: &Expr,
    outputs: &[Output<'_>],
    binder: &mut Binder<'_>,
) -> ExecutionResult<BoundExpr> {
    let Expr::Literal(Literal::Integer(position)) = expr else {
        return binder.bind_scalar(expr, "GROUP BY");
    };
    let output = &outputs[output_position(*position, outputs.len(), "GROUP BY")?];
    match output.source {
        Some(source) => binder.bind_scalar(source, "GROUP BY"),
        None => Ok(output.expr.clone()),
    }
}

/// Resolves ORDER BY keys. An integer literal is a 1-based output
/// position and a bare name matching an output column sorts on that
/// column; anything else is an expression over the input.
fn bind_order_by(
    keys: &[OrderByExpr],
    outputs: &[Output<'_>],
    binder: &mut Binder<'_>,
) -> ExecutionResult<Vec<(SortKey, SortDirection)>> {
    let mut bound = Vec::with_capacity(keys.len());
    for key in keys {
        let sort_key = match &key.expr {
            Expr::Literal(Literal::Integer(position)) => {
                SortKey::Output(output_position(*position, outputs.len(), "ORDER BY")?)
            }
            Expr::Column(ColumnRef {
                table: None,
                column,
            }) => match outputs
                .iter()
                .position(|output| output.name.eq_ignore_ascii_case(column))
            {
                Some(index) => SortKey::Output(index),
                None => SortKey::Expr(binder.bind_with_aggregates(&key.expr)?),
            },
            expr => SortKey::Expr(binder.bind_with_aggregates(expr)?),
        };
        bound.push((sort_key, key.direction));
    }
    Ok(bound)
}

fn group_rows(
    input: Input<'_>,
    tuples: Vec<Tuple>,
    key_exprs: &[BoundExpr],
) -> ExecutionResult<Vec<Group>> {
    if key_exprs.is_empty() {
        // Aggregates without GROUP BY: the whole input is one group, even
        // when it is empty.
        return Ok(vec![Group {
            key: Vec::new(),
            tuples,
        }]);
    }

    let mut positions: HashMap<Vec<Value>, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();
    for tuple in tuples {
        let ctx = input.row(&tuple);
        let key = key_exprs
            .iter()
            .map(|expr| evaluate(expr, &ctx))
            .collect::<ExecutionResult<Vec<_>>>()?;
        match positions.get(&key) {
            Some(&position) => groups[position].tuples.push(tuple),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    tuples: vec![tuple],
                });
            }
        }
    }
    Ok(groups)
}

fn aggregate_group(
    input: Input<'_>,
    calls: &[AggregateCall],
    tuples: &[Tuple],
) -> ExecutionResult<Vec<Value>> {
    calls
        .iter()
        .map(|call| {
            let mut acc = Accumulator::new(call.func, call.distinct);
            for tuple in tuples {
                match &call.arg {
                    None => acc.count_row(),
                    Some(arg) => acc.accumulate(evaluate(arg, &input.row(tuple))?)?,
                }
            }
            Ok(acc.finish())
        })
        .collect()
}

fn project<C: EvalContext>(
    ctx: &C,
    outputs: &[Output<'_>],
    sort_keys: &[(SortKey, SortDirection)],
) -> ExecutionResult<ProjectedRow> {
    let values = outputs
        .iter()
        .map(|output| evaluate(&output.expr, ctx))
        .collect::<ExecutionResult<Vec<_>>>()?;
    let keys = sort_keys
        .iter()
        .map(|(key, _)| match key {
            SortKey::Output(index) => Ok(values.get(*index).cloned().unwrap_or(Value::Null)),
            SortKey::Expr(expr) => evaluate(expr, ctx),
        })
        .collect::<ExecutionResult<Vec<_>>>()?;
    Ok(ProjectedRow { values, keys })
}

/// A sort key value, normalised once before sorting.
enum SortValue {
    Null,
    Number(Number),
    Text(String),
}

impl SortValue {
    fn new(value: &Value, numeric: bool) -> Self {
        if value.is_null() {
            return SortValue::Null;
        }
        if numeric {
            if let Some(number) = value.as_number() {
                return SortValue::Number(number);
            }
        }
        SortValue::Text(value.to_text().unwrap_or_default())
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Null, SortValue::Null) => Ordering::Equal,
            (SortValue::Null, _) => Ordering::Less,
            (_, SortValue::Null) => Ordering::Greater,
            (SortValue::Number(a), SortValue::Number(b)) => a.compare(*b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        }
    }
}

/// Stable multi-key sort.
///
/// A key sorts numerically when every non-NULL value it takes reads as a
/// number, and lexically otherwise. NULLs sort first; DESC reverses the
/// comparison of its own key only.
fn sort_rows(rows: &mut Vec<ProjectedRow>, directions: &[SortDirection]) {
    if directions.is_empty() || rows.len() < 2 {
        return;
    }

    let numeric = (0..directions.len())
        .map(|k| {
            rows.iter()
                .filter_map(|row| row.keys.get(k))
                .filter(|value| !value.is_null())
                .all(Value::is_numeric)
        })
        .collect::<Vec<_>>();

    let mut keyed = rows
        .drain(..)
        .map(|row| {
            let keys = row
                .keys
                .iter()
                .zip(&numeric)
                .map(|(value, &numeric)| SortValue::new(value, numeric))
                .collect::<Vec<_>>();
            (keys, row)
        })
        .collect::<Vec<_>>();

    keyed.sort_by(|(a, _), (b, _)| {
        a.iter()
            .zip(b)
            .zip(directions)
            .map(|((a, b), direction)| match direction {
                SortDirection::Ascending => a.compare(b),
                SortDirection::Descending => a.compare(b).reverse(),
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });

    rows.extend(keyed.into_iter().map(|(_, row)| row));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::storage::MemorySource;

    const CATEGORIES: &str = "\
category_id,category_name,description
1,Beverages,\"Soft drinks, coffees, teas\"
2,Condiments,Sweet and savory sauces
3,Confections,Desserts and candies
4,Produce,Dried fruit
";

    const PRODUCTS: &str = "\
product_id,product_name,category_id,unit_price,units_in_stock
1,Chai,1,18,39
2,Chang,1,19,17
3,Aniseed Syrup,2,10,13
4,Chef Anton's Cajun Seasoning,2,22,53
5,Grandma's Boysenberry Spread,2,25,120
6,Pavlova,3,17.45,29
7,Teatime Chocolate Biscuits,3,9.2,25
8,Guaraná Fantástica,1,4.5,20
9,Mystery Item,,7,
";

    fn catalog() -> Catalog {
        let source = MemorySource::new()
            .with_table("categories", CATEGORIES)
            .with_table("products", PRODUCTS);
        let catalog = Catalog::new(Arc::new(source));
        catalog.load_all().unwrap();
        catalog
    }

    fn run(catalog: &Catalog, sql: &str) -> ExecutionResult<QueryResult> {
        let statement = Parser::parse(sql).unwrap();
        QueryExecutor::new(catalog).execute(&statement)
    }

    fn texts(result: &QueryResult, column: usize) -> Vec<String> {
        result
            .rows
            .iter()
            .map(|row| row[column].to_string())
            .collect()
    }

    #[test]
    fn test_select_star() {
        let catalog = catalog();
        let result = run(&catalog, "SELECT * FROM products;").unwrap();
        assert_eq!(
            result.columns,
            vec![
                "product_id",
                "product_name",
                "category_id",
                "unit_price",
                "units_in_stock"
            ]
        );
        assert_eq!(result.row_count(), 9);
        assert_eq!(result.rows[8][2], Value::Null);
    }

    #[test]
    fn test_select_without_from() {
        let catalog = catalog();
        let result = run(&catalog, "SELECT 1 + 1 AS two, 'x' || 'y'").unwrap();
        assert_eq!(result.columns, vec!["two", "'x' || 'y'"]);
        assert_eq!(result.rows, vec![vec![Value::Integer(2), Value::text("xy")]]);

        assert_eq!(
            run(&catalog, "SELECT 1/0").unwrap_err(),
            ExecutionError::DivisionByZero
        );
        assert!(matches!(
            run(&catalog, "SELECT *"),
            Err(ExecutionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_join_group_order() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT category_name, COUNT(*) AS product_count \
             FROM categories JOIN products ON categories.category_id = products.category_id \
             GROUP BY category_name ORDER BY product_count DESC;",
        )
        .unwrap();
        assert_eq!(result.columns, vec!["category_name", "product_count"]);
        assert_eq!(
            result.rows,
            vec![
                vec![Value::text("Beverages"), Value::Integer(3)],
                vec![Value::text("Condiments"), Value::Integer(3)],
                vec![Value::text("Confections"), Value::Integer(2)],
            ]
        );
    }

    #[test]
    fn test_cross_join_size() {
        let catalog = catalog();
        let result = run(&catalog, "SELECT * FROM categories CROSS JOIN products").unwrap();
        assert_eq!(result.row_count(), 4 * 9);
        assert_eq!(result.columns.len(), 3 + 5);

        let result = run(&catalog, "SELECT * FROM categories JOIN products ON 1 = 1").unwrap();
        assert_eq!(result.row_count(), 4 * 9);
    }

    #[test]
    fn test_where_excludes_unknown() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT product_name FROM products WHERE category_id = 1",
        )
        .unwrap();
        assert_eq!(
            texts(&result, 0),
            vec!["Chai", "Chang", "Guaraná Fantástica"]
        );

        let result = run(&catalog, "SELECT product_id FROM products WHERE category_id <> 1").unwrap();
        assert_eq!(texts(&result, 0), vec!["3", "4", "5", "6", "7"]);

        let result = run(
            &catalog,
            "SELECT product_id FROM products WHERE category_id IS NULL",
        )
        .unwrap();
        assert_eq!(texts(&result, 0), vec!["9"]);
    }

    #[test]
    fn test_order_numeric_and_lexical() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT product_name, unit_price FROM products ORDER BY unit_price LIMIT 3",
        )
        .unwrap();
        assert_eq!(texts(&result, 1), vec!["4.5", "7", "9.2"]);

        let result = run(
            &catalog,
            "SELECT product_name FROM products ORDER BY product_name LIMIT 4",
        )
        .unwrap();
        assert_eq!(
            texts(&result, 0),
            vec![
                "Aniseed Syrup",
                "Chai",
                "Chang",
                "Chef Anton's Cajun Seasoning"
            ]
        );
    }

    #[test]
    fn test_order_desc_reverses() {
        let catalog = catalog();
        let asc = run(&catalog, "SELECT product_id FROM products ORDER BY product_id").unwrap();
        let desc = run(
            &catalog,
            "SELECT product_id FROM products ORDER BY product_id DESC",
        )
        .unwrap();
        let mut reversed = asc.rows.clone();
        reversed.reverse();
        assert_eq!(desc.rows, reversed);
    }

    #[test]
    fn test_order_is_stable_with_nulls_first() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT product_name, category_id FROM products ORDER BY category_id",
        )
        .unwrap();
        assert_eq!(
            texts(&result, 0)[..4],
            ["Mystery Item", "Chai", "Chang", "Guaraná Fantástica"]
        );
    }

    #[test]
    fn test_order_by_position_and_expression() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT c.category_id, c.category_name, COUNT(*) AS n \
             FROM categories c JOIN products p ON c.category_id = p.category_id \
             GROUP BY c.category_id ORDER BY 1 DESC",
        )
        .unwrap();
        assert_eq!(result.columns, vec!["category_id", "category_name", "n"]);
        assert_eq!(texts(&result, 1), vec!["Confections", "Condiments", "Beverages"]);

        let result = run(
            &catalog,
            "SELECT product_name FROM products ORDER BY unit_price * units_in_stock DESC LIMIT 1",
        )
        .unwrap();
        assert_eq!(texts(&result, 0), vec!["Grandma's Boysenberry Spread"]);

        assert!(matches!(
            run(&catalog, "SELECT product_name FROM products ORDER BY 2"),
            Err(ExecutionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_limit_offset() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT product_id FROM products ORDER BY product_id LIMIT 2 OFFSET 3",
        )
        .unwrap();
        assert_eq!(texts(&result, 0), vec!["4", "5"]);

        let result = run(&catalog, "SELECT product_id FROM products LIMIT 0").unwrap();
        assert!(result.is_empty());
        assert_eq!(result.columns, vec!["product_id"]);
    }

    #[test]
    fn test_distinct() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT DISTINCT category_id FROM products ORDER BY category_id",
        )
        .unwrap();
        assert_eq!(
            result.rows,
            vec![
                vec![Value::Null],
                vec![Value::text("1")],
                vec![Value::text("2")],
                vec![Value::text("3")],
            ]
        );
    }

    #[test]
    fn test_group_counts_cover_input() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT category_id, COUNT(*) AS n FROM products GROUP BY category_id",
        )
        .unwrap();
        assert_eq!(result.row_count(), 4);
        let total: i64 = result
            .rows
            .iter()
            .map(|row| match row[1] {
                Value::Integer(n) => n,
                _ => panic!("count is not an integer"),
            })
            .sum();
        assert_eq!(total, 9);
    }

    #[test]
    fn test_having() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT category_id, COUNT(*) AS n FROM products \
             GROUP BY category_id HAVING COUNT(*) >= 3",
        )
        .unwrap();
        assert_eq!(
            result.rows,
            vec![
                vec![Value::text("1"), Value::Integer(3)],
                vec![Value::text("2"), Value::Integer(3)],
            ]
        );
    }

    #[test]
    fn test_group_by_position() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT category_id, COUNT(*) FROM products GROUP BY 1",
        )
        .unwrap();
        assert_eq!(
            result.rows,
            vec![
                vec![Value::text("1"), Value::Integer(3)],
                vec![Value::text("2"), Value::Integer(3)],
                vec![Value::text("3"), Value::Integer(2)],
                vec![Value::Null, Value::Integer(1)],
            ]
        );

        let result = run(&catalog, "SELECT * FROM categories GROUP BY 2").unwrap();
        assert_eq!(result.row_count(), 4);

        assert_eq!(
            run(&catalog, "SELECT COUNT(*) FROM products GROUP BY 1").unwrap_err(),
            ExecutionError::MisplacedAggregate("GROUP BY".into())
        );
        assert!(matches!(
            run(&catalog, "SELECT category_id FROM products GROUP BY 2"),
            Err(ExecutionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_output_aliases_in_clauses() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT category_id AS cat, COUNT(*) AS n FROM products \
             GROUP BY cat HAVING n >= 2 ORDER BY n * 1, cat DESC",
        )
        .unwrap();
        assert_eq!(result.columns, vec!["cat", "n"]);
        assert_eq!(
            result.rows,
            vec![
                vec![Value::text("3"), Value::Integer(2)],
                vec![Value::text("2"), Value::Integer(3)],
                vec![Value::text("1"), Value::Integer(3)],
            ]
        );

        assert_eq!(
            run(&catalog, "SELECT COUNT(*) AS n FROM products GROUP BY n").unwrap_err(),
            ExecutionError::MisplacedAggregate("GROUP BY".into())
        );
        assert_eq!(
            run(&catalog, "SELECT product_id AS pid FROM products WHERE pid = 1").unwrap_err(),
            ExecutionError::ColumnNotFound("pid".into())
        );
    }

    #[test]
    fn test_aggregates_without_group_by() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT COUNT(*), SUM(unit_price) FROM products WHERE unit_price > 1000",
        )
        .unwrap();
        assert_eq!(result.columns, vec!["COUNT(*)", "SUM(unit_price)"]);
        assert_eq!(result.rows, vec![vec![Value::Integer(0), Value::Null]]);

        let result = run(
            &catalog,
            "SELECT AVG(unit_price), COUNT(units_in_stock), MAX(unit_price) FROM products \
             WHERE category_id = 2",
        )
        .unwrap();
        assert_eq!(
            result.rows,
            vec![vec![Value::Float(19.0), Value::Integer(3), Value::text("25")]]
        );
    }

    #[test]
    fn test_ungrouped_column() {
        let catalog = catalog();
        assert_eq!(
            run(
                &catalog,
                "SELECT category_name, product_name FROM categories \
                 JOIN products ON categories.category_id = products.category_id \
                 GROUP BY category_name",
            )
            .unwrap_err(),
            ExecutionError::UngroupedColumn("product_name".into())
        );
    }

    #[test]
    fn test_semantic_errors() {
        let catalog = catalog();
        assert_eq!(
            run(&catalog, "SELECT * FROM nowhere").unwrap_err(),
            ExecutionError::TableNotFound("nowhere".into())
        );
        assert_eq!(
            run(
                &catalog,
                "SELECT category_id FROM categories \
                 JOIN products ON categories.category_id = products.category_id",
            )
            .unwrap_err(),
            ExecutionError::AmbiguousColumn("category_id".into())
        );
        assert_eq!(
            run(&catalog, "SELECT * FROM products WHERE COUNT(*) > 1").unwrap_err(),
            ExecutionError::MisplacedAggregate("WHERE".into())
        );
        assert_eq!(
            run(&catalog, "SELECT * FROM products WHERE product_name").unwrap_err(),
            ExecutionError::NonBooleanPredicate {
                clause: "WHERE",
                found: "text"
            }
        );
        assert!(matches!(
            run(&catalog, "SELECT product_name * 2 FROM products"),
            Err(ExecutionError::TypeMismatch(_))
        ));
        assert!(matches!(
            run(&catalog, "SELECT nope FROM products"),
            Err(ExecutionError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_qualified_wildcard() {
        let catalog = catalog();
        let result = run(
            &catalog,
            "SELECT c.*, p.product_name FROM categories c \
             JOIN products p ON c.category_id = p.category_id LIMIT 1",
        )
        .unwrap();
        assert_eq!(
            result.columns,
            vec!["category_id", "category_name", "description", "product_name"]
        );
        assert_eq!(result.rows[0][3], Value::text("Chai"));

        assert_eq!(
            run(&catalog, "SELECT x.* FROM products").unwrap_err(),
            ExecutionError::TableNotFound("x".into())
        );
    }

    #[test]
    fn test_repeatable() {
        let catalog = catalog();
        let sql = "SELECT category_id, SUM(unit_price) FROM products GROUP BY category_id";
        assert_eq!(run(&catalog, sql).unwrap(), run(&catalog, sql).unwrap());
    }
}
