//! Name resolution.
//!
//! A [`Scope`] lists the columns visible to a statement: every column of
//! every table in FROM and JOIN, in order, tagged with the table's
//! qualifier (its alias, or its name when no alias is given). The
//! [`Binder`] resolves column references against a scope and turns AST
//! expressions into [`BoundExpr`]s, collecting aggregate calls as it goes.
//!
//! Once the select list is bound, its aliases become visible too: an
//! unqualified name that matches no column in scope falls back to the
//! aliased output expression, which is bound again in the current clause.

use crate::parser::{AggregateFunction, ColumnRef, Expr};
use crate::storage::Table;

use super::error::{ExecutionError, ExecutionResult};
use super::evaluator::{BoundExpr, ScalarFunction};
use super::value::Value;

/// A column visible in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeColumn {
    /// Alias or name of the owning table.
    pub qualifier: String,
    /// Column name as it appears in the table header.
    pub name: String,
    /// Position of the owning table in FROM / JOIN order.
    pub source: usize,
    /// Position of the column within its table.
    pub column: usize,
}

/// Columns visible to a statement.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    columns: Vec<ScopeColumn>,
}

impl Scope {
    /// Creates an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds all columns of a table under the given qualifier.
    pub fn add_table(&mut self, qualifier: &str, table: &Table) {
        let source = self.columns.last().map_or(0, |c| c.source + 1);
        self.columns.extend(
            table
                .schema()
                .columns()
                .iter()
                .enumerate()
                .map(|(column, name)| ScopeColumn {
                    qualifier: qualifier.to_string(),
                    name: name.clone(),
                    source,
                    column,
                }),
        );
    }

    /// All visible columns in order.
    pub fn columns(&self) -> &[ScopeColumn] {
        &self.columns
    }

    /// Number of visible columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if no columns are visible.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Positions of the columns owned by the table with this qualifier.
    pub fn columns_of(&self, qualifier: &str) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.qualifier.eq_ignore_ascii_case(qualifier))
            .map(|(i, _)| i)
            .collect()
    }

    /// Resolves a column reference to a position in the scope.
    ///
    /// Names match ignoring ASCII case. An unqualified name present in more
    /// than one table is ambiguous.
    pub fn resolve(&self, reference: &ColumnRef) -> ExecutionResult<usize> {
        let mut matches = self.columns.iter().enumerate().filter(|(_, c)| {
            c.name.eq_ignore_ascii_case(&reference.column)
                && reference
                    .table
                    .as_ref()
                    .map_or(true, |q| c.qualifier.eq_ignore_ascii_case(q))
        });
        let Some((index, first)) = matches.next() else {
            return Err(ExecutionError::ColumnNotFound(reference.to_string()));
        };
        if matches.any(|(_, other)| other.source != first.source) {
            return Err(ExecutionError::AmbiguousColumn(reference.to_string()));
        }
        Ok(index)
    }
}

/// One aggregate call found while binding.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateCall {
    /// The aggregate.
    pub func: AggregateFunction,
    /// Bound argument, or `None` for `COUNT(*)`.
    pub arg: Option<BoundExpr>,
    /// `DISTINCT` inside the call.
    pub distinct: bool,
}

/// Binds AST expressions against a scope.
#[derive(Debug)]
pub struct Binder<'a> {
    scope: &'a Scope,
    aggregates: Vec<AggregateCall>,
    aliases: Vec<(String, Expr)>,
}

impl<'a> Binder<'a> {
    /// Creates a binder over a scope.
    pub fn new(scope: &'a Scope) -> Self {
        Self {
            scope,
            aggregates: Vec::new(),
            aliases: Vec::new(),
        }
    }

    /// Makes output aliases resolvable in expressions bound from now on.
    pub fn set_aliases(&mut self, aliases: Vec<(String, Expr)>) {
        self.aliases = aliases;
    }

    /// Aggregate calls collected so far, indexed by slot.
    pub fn aggregates(&self) -> &[AggregateCall] {
        &self.aggregates
    }

    /// Consumes the binder, returning the collected aggregate calls.
    pub fn into_aggregates(self) -> Vec<AggregateCall> {
        self.aggregates
    }

    /// Binds an expression in which aggregates are not allowed. `clause`
    /// names the clause for error messages.
    pub fn bind_scalar(&mut self, expr: &Expr, clause: &str) -> ExecutionResult<BoundExpr> {
        self.bind(expr, Some(clause))
    }

    /// Binds an expression that may contain aggregate calls.
    pub fn bind_with_aggregates(&mut self, expr: &Expr) -> ExecutionResult<BoundExpr> {
        self.bind(expr, None)
    }

    fn boxed(&mut self, expr: &Expr, forbid: Option<&str>) -> ExecutionResult<Box<BoundExpr>> {
        Ok(Box::new(self.bind(expr, forbid)?))
    }

    fn bind(&mut self, expr: &Expr, forbid: Option<&str>) -> ExecutionResult<BoundExpr> {
        Ok(match expr {
            Expr::Literal(literal) => BoundExpr::Literal(Value::from_literal(literal)),
            Expr::Column(reference) => match self.scope.resolve(reference) {
                Ok(index) => BoundExpr::Column {
                    index,
                    name: reference.to_string(),
                },
                Err(ExecutionError::ColumnNotFound(name)) if reference.table.is_none() => {
                    self.bind_alias(&reference.column, forbid)
                        .unwrap_or(Err(ExecutionError::ColumnNotFound(name)))?
                }
                Err(e) => return Err(e),
            },
            Expr::Unary { op, expr } => BoundExpr::Unary {
                op: *op,
                expr: self.boxed(expr, forbid)?,
            },
            Expr::Binary { left, op, right } => BoundExpr::Binary {
                left: self.boxed(left, forbid)?,
                op: *op,
                right: self.boxed(right, forbid)?,
            },
            Expr::Like {
                expr,
                pattern,
                negated,
            } => BoundExpr::Like {
                expr: self.boxed(expr, forbid)?,
                pattern: self.boxed(pattern, forbid)?,
                negated: *negated,
            },
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => BoundExpr::Between {
                expr: self.boxed(expr, forbid)?,
                low: self.boxed(low, forbid)?,
                high: self.boxed(high, forbid)?,
                negated: *negated,
            },
            Expr::IsNull { expr, negated } => BoundExpr::IsNull {
                expr: self.boxed(expr, forbid)?,
                negated: *negated,
            },
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                let expr = self.boxed(expr, forbid)?;
                let list = list
                    .iter()
                    .map(|item| self.bind(item, forbid))
                    .collect::<ExecutionResult<Vec<_>>>()?;
                BoundExpr::InList {
                    expr,
                    list,
                    negated: *negated,
                }
            }
            Expr::Function { name, args } => {
                let func = ScalarFunction::lookup(name)
                    .ok_or_else(|| ExecutionError::UnknownFunction(name.clone()))?;
                func.check_arity(args.len())?;
                let args = args
                    .iter()
                    .map(|arg| self.bind(arg, forbid))
                    .collect::<ExecutionResult<Vec<_>>>()?;
                BoundExpr::Function { func, args }
            }
            Expr::Aggregate {
                func,
                arg,
                distinct,
            } => {
                if let Some(clause) = forbid {
                    return Err(ExecutionError::MisplacedAggregate(clause.to_string()));
                }
                let arg = match arg {
                    Some(arg) => Some(self.bind(arg, Some("aggregate arguments"))?),
                    None => None,
                };
                let call = AggregateCall {
                    func: *func,
                    arg,
                    distinct: *distinct,
                };
                let slot = match self.aggregates.iter().position(|c| *c == call) {
                    Some(slot) => slot,
                    None => {
                        self.aggregates.push(call);
                        self.aggregates.len() - 1
                    }
                };
                BoundExpr::Aggregate(slot)
            }
        })
    }

    /// Binds the output expression aliased as `name`, if there is one.
    /// Aliases are hidden while it is bound, so an alias never resolves
    /// to itself.
    fn bind_alias(
        &mut self,
        name: &str,
        forbid: Option<&str>,
    ) -> Option<ExecutionResult<BoundExpr>> {
        let aliases = std::mem::take(&mut self.aliases);
        let bound = aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|(_, expr)| self.bind(expr, forbid));
        self.aliases = aliases;
        bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Row;
    use crate::parser::Parser;
    use crate::storage::Schema;

    fn table(name: &str, columns: &[&str]) -> Table {
        Table::new(
            name,
            Schema::new(columns.iter().map(|c| c.to_string()).collect()),
            Vec::<Row>::new(),
        )
    }

    fn scope() -> Scope {
        let mut scope = Scope::new();
        scope.add_table("c", &table("categories", &["category_id", "category_name"]));
        scope.add_table("p", &table("products", &["product_id", "product_name", "category_id"]));
        scope
    }

    fn column(table: Option<&str>, name: &str) -> ColumnRef {
        ColumnRef {
            table: table.map(String::from),
            column: name.to_string(),
        }
    }

    #[test]
    fn test_resolve() {
        let scope = scope();
        assert_eq!(scope.resolve(&column(None, "category_name")).unwrap(), 1);
        assert_eq!(scope.resolve(&column(Some("P"), "CATEGORY_ID")).unwrap(), 4);
        assert_eq!(scope.resolve(&column(Some("c"), "category_id")).unwrap(), 0);
        assert_eq!(scope.columns()[4].source, 1);
        assert_eq!(scope.columns_of("p"), vec![2, 3, 4]);
    }

    #[test]
    fn test_resolve_errors() {
        let scope = scope();
        assert_eq!(
            scope.resolve(&column(None, "category_id")).unwrap_err(),
            ExecutionError::AmbiguousColumn("category_id".into())
        );
        assert_eq!(
            scope.resolve(&column(None, "price")).unwrap_err(),
            ExecutionError::ColumnNotFound("price".into())
        );
        assert_eq!(
            scope.resolve(&column(Some("x"), "product_id")).unwrap_err(),
            ExecutionError::ColumnNotFound("x.product_id".into())
        );
    }

    #[test]
    fn test_bind_collects_aggregates_once() {
        let scope = scope();
        let mut binder = Binder::new(&scope);
        let first = binder
            .bind_with_aggregates(&Parser::parse_expr("COUNT(p.product_id) + 1").unwrap())
            .unwrap();
        let second = binder
            .bind_with_aggregates(&Parser::parse_expr("count(p.product_id)").unwrap())
            .unwrap();
        assert_eq!(second, BoundExpr::Aggregate(0));
        assert!(matches!(first, BoundExpr::Binary { .. }));
        assert_eq!(binder.aggregates().len(), 1);
    }

    #[test]
    fn test_misplaced_aggregates() {
        let scope = scope();
        let mut binder = Binder::new(&scope);
        assert_eq!(
            binder
                .bind_scalar(&Parser::parse_expr("COUNT(*) > 1").unwrap(), "WHERE")
                .unwrap_err(),
            ExecutionError::MisplacedAggregate("WHERE".into())
        );
        assert!(matches!(
            binder.bind_with_aggregates(&Parser::parse_expr("SUM(COUNT(*))").unwrap()),
            Err(ExecutionError::MisplacedAggregate(_))
        ));
    }

    #[test]
    fn test_alias_fallback() {
        let scope = scope();
        let mut binder = Binder::new(&scope);
        binder.set_aliases(vec![
            ("n".to_string(), Parser::parse_expr("COUNT(*)").unwrap()),
            ("name".to_string(), Parser::parse_expr("p.product_name").unwrap()),
            ("loop".to_string(), Parser::parse_expr("loop + 1").unwrap()),
        ]);

        let bound = binder
            .bind_with_aggregates(&Parser::parse_expr("N > 1").unwrap())
            .unwrap();
        assert!(matches!(bound, BoundExpr::Binary { .. }));
        assert_eq!(binder.aggregates().len(), 1);

        assert_eq!(
            binder
                .bind_scalar(&Parser::parse_expr("name").unwrap(), "GROUP BY")
                .unwrap(),
            BoundExpr::Column {
                index: 3,
                name: "p.product_name".into()
            }
        );
        assert_eq!(
            binder
                .bind_scalar(&Parser::parse_expr("n").unwrap(), "GROUP BY")
                .unwrap_err(),
            ExecutionError::MisplacedAggregate("GROUP BY".into())
        );
        assert_eq!(
            binder
                .bind_scalar(&Parser::parse_expr("loop").unwrap(), "GROUP BY")
                .unwrap_err(),
            ExecutionError::ColumnNotFound("loop".into())
        );
        assert_eq!(
            binder
                .bind_scalar(&Parser::parse_expr("p.n").unwrap(), "GROUP BY")
                .unwrap_err(),
            ExecutionError::ColumnNotFound("p.n".into())
        );
    }

    #[test]
    fn test_unknown_function() {
        let scope = scope();
        let mut binder = Binder::new(&scope);
        assert_eq!(
            binder
                .bind_scalar(&Parser::parse_expr("frobnicate(1)").unwrap(), "SELECT")
                .unwrap_err(),
            ExecutionError::UnknownFunction("frobnicate".into())
        );
        assert!(matches!(
            binder.bind_scalar(&Parser::parse_expr("upper(1, 2)").unwrap(), "SELECT"),
            Err(ExecutionError::InvalidArgument(_))
        ));
    }
}
