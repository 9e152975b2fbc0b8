//! SQL parsing.
//!
//! [`Parser::parse`] turns a single SELECT statement into an
//! [`ast::SelectStatement`]. The grammar covers projection with aliases,
//! `DISTINCT`, FROM with table aliases, inner and cross joins, WHERE,
//! GROUP BY, HAVING, ORDER BY, LIMIT and OFFSET. Anything else yields a
//! [`ParseError`] with the line and column of the offending token.

pub mod ast;
mod error;
mod lexer;

use std::ops::Add;

pub use ast::*;
pub use error::{ParseError, ParseResult};
pub use lexer::{Keyword, Lexer, Location, SpannedToken, Token};

/// Recursive-descent parser over a token buffer.
pub struct Parser<'a> {
    input: &'a str,
    tokens: Vec<SpannedToken>,
    position: usize,
}

impl<'a> Parser<'a> {
    /// Parses the input into a SELECT statement. The whole input must be a
    /// single statement, optionally terminated by a semicolon.
    pub fn parse(sql: &'a str) -> ParseResult<SelectStatement> {
        let mut parser = Self::new(sql)?;
        let statement = parser.parse_statement()?;
        parser.skip(Token::Semicolon);
        if let Some(token) = parser.peek_spanned() {
            if parser.position > 0
                && parser.tokens[parser.position - 1].token == Token::Semicolon
            {
                return Err(ParseError::unsupported("multiple statements", token.start));
            }
            return Err(parser.unexpected(token.clone(), "end of query"));
        }
        Ok(statement)
    }

    /// Parses a standalone expression.
    pub fn parse_expr(expr: &'a str) -> ParseResult<Expr> {
        let mut parser = Self::new(expr)?;
        let expression = parser.parse_expression()?;
        if let Some(token) = parser.peek_spanned() {
            return Err(parser.unexpected(token.clone(), "end of expression"));
        }
        Ok(expression)
    }

    fn new(input: &'a str) -> ParseResult<Self> {
        let tokens = Lexer::tokenize(input)?;
        if tokens.iter().all(|t| t.token == Token::Semicolon) {
            return Err(ParseError::EmptyQuery);
        }
        Ok(Self {
            input,
            tokens,
            position: 0,
        })
    }

    fn peek_spanned(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.position)
    }

    /// Peeks the next token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n).map(|t| &t.token)
    }

    /// Fetches the next token, or errors if the input is exhausted.
    fn next(&mut self, expected: &str) -> ParseResult<SpannedToken> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEnd {
                expected: expected.to_string(),
            })?;
        self.position += 1;
        Ok(token)
    }

    /// Passes the next token through the closure, consuming it if the
    /// closure returns Some.
    fn next_if_map<T>(&mut self, f: impl Fn(&Token) -> Option<T>) -> Option<T> {
        let value = self.peek().and_then(f)?;
        self.position += 1;
        Some(value)
    }

    /// Consumes the next token if it is the given token, returning true.
    fn next_is(&mut self, token: Token) -> bool {
        self.next_if_map(|t| (t == &token).then_some(())).is_some()
    }

    /// Consumes the next token if it is the given token.
    fn skip(&mut self, token: Token) {
        self.next_is(token);
    }

    /// Consumes the next token if it's the expected token, or errors.
    fn expect(&mut self, expect: Token) -> ParseResult<()> {
        let expected = expect.to_string();
        let token = self.next(&expected)?;
        if token.token != expect {
            return Err(self.unexpected(token, &expected));
        }
        Ok(())
    }

    /// Returns the next identifier, or errors.
    fn next_ident(&mut self, expected: &str) -> ParseResult<String> {
        let token = self.next(expected)?;
        match token.token {
            Token::Ident(ident) => Ok(ident),
            _ => Err(self.unexpected(token, expected)),
        }
    }

    fn unexpected(&self, token: SpannedToken, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            found: token.token.to_string(),
            expected: expected.to_string(),
            line: token.start.line,
            column: token.start.column,
        }
    }

    /// Location of the next token, or of the end of input.
    fn location(&self) -> Location {
        match self.peek_spanned() {
            Some(token) => token.start,
            None => {
                let mut lexer = Lexer::new(self.input);
                while lexer.next().is_some() {}
                lexer.location()
            }
        }
    }

    fn parse_statement(&mut self) -> ParseResult<SelectStatement> {
        let Some(token) = self.peek_spanned().cloned() else {
            return Err(ParseError::EmptyQuery);
        };
        match token.token {
            Token::Keyword(Keyword::Select) => self.parse_select(),
            Token::Keyword(
                keyword @ (Keyword::Insert
                | Keyword::Update
                | Keyword::Delete
                | Keyword::Create
                | Keyword::Drop
                | Keyword::Alter),
            ) => Err(ParseError::unsupported(
                format!("{} statements", keyword),
                token.start,
            )),
            Token::Keyword(Keyword::With) => {
                Err(ParseError::unsupported("WITH clauses", token.start))
            }
            _ => Err(self.unexpected(token, "SELECT")),
        }
    }

    fn parse_select(&mut self) -> ParseResult<SelectStatement> {
        self.expect(Keyword::Select.into())?;
        let distinct = self.next_is(Keyword::Distinct.into());
        let projection = self.parse_projection()?;
        let from = self.parse_from_clause()?;
        let selection = self.parse_where_clause()?;
        let group_by = self.parse_group_by_clause()?;
        let having = self.parse_having_clause()?;
        let order_by = self.parse_order_by_clause()?;
        let (limit, offset) = self.parse_limit_clause()?;

        if let Some(token) = self.peek_spanned() {
            if let Token::Keyword(Keyword::Union) = token.token {
                return Err(ParseError::unsupported("UNION", token.start));
            }
        }

        Ok(SelectStatement {
            distinct,
            projection,
            from,
            selection,
            group_by,
            having,
            order_by,
            limit,
            offset,
        })
    }

    fn parse_projection(&mut self) -> ParseResult<Vec<SelectItem>> {
        let mut items = Vec::new();
        loop {
            items.push(self.parse_select_item()?);
            if !self.next_is(Token::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_select_item(&mut self) -> ParseResult<SelectItem> {
        if self.next_is(Token::Asterisk) {
            return Ok(SelectItem::Wildcard);
        }
        if let (Some(Token::Ident(table)), Some(Token::Period), Some(Token::Asterisk)) =
            (self.peek_nth(0), self.peek_nth(1), self.peek_nth(2))
        {
            let table = table.clone();
            self.position += 3;
            return Ok(SelectItem::QualifiedWildcard(table));
        }

        let start = self.location().offset;
        let expr = self.parse_expression()?;
        let end = self.tokens[self.position - 1].end;
        let text = self.input[start..end].to_string();
        let alias = self.parse_alias()?;
        Ok(SelectItem::Expr { expr, alias, text })
    }

    /// Parses `AS alias` or a bare alias identifier, if present.
    fn parse_alias(&mut self) -> ParseResult<Option<String>> {
        if self.next_is(Keyword::As.into()) {
            return Ok(Some(self.next_ident("alias")?));
        }
        Ok(self.next_if_map(|token| match token {
            Token::Ident(ident) => Some(ident.clone()),
            _ => None,
        }))
    }

    fn parse_from_clause(&mut self) -> ParseResult<Option<FromClause>> {
        if !self.next_is(Keyword::From.into()) {
            return Ok(None);
        }
        let table = self.parse_table_ref()?;
        let mut joins = Vec::new();
        while let Some(kind) = self.parse_join_kind()? {
            let table = self.parse_table_ref()?;
            let constraint = match kind {
                JoinKind::Inner => {
                    self.expect(Keyword::On.into())?;
                    Some(self.parse_expression()?)
                }
                JoinKind::Cross => None,
            };
            joins.push(Join {
                kind,
                table,
                constraint,
            });
        }
        Ok(Some(FromClause { table, joins }))
    }

    fn parse_table_ref(&mut self) -> ParseResult<TableRef> {
        if let Some(Token::OpenParen) = self.peek() {
            return Err(ParseError::unsupported("subqueries", self.location()));
        }
        let name = self.next_ident("table name")?;
        if let Some(Token::Period) = self.peek() {
            return Err(ParseError::unsupported(
                "qualified table names",
                self.location(),
            ));
        }
        let alias = self.parse_alias()?;
        Ok(TableRef { name, alias })
    }

    fn parse_join_kind(&mut self) -> ParseResult<Option<JoinKind>> {
        let location = self.location();
        if self.next_is(Token::Comma) || self.next_is(Keyword::Cross.into()) {
            if self.tokens[self.position - 1].token != Token::Comma {
                self.expect(Keyword::Join.into())?;
            }
            return Ok(Some(JoinKind::Cross));
        }
        if self.next_is(Keyword::Join.into()) {
            return Ok(Some(JoinKind::Inner));
        }
        if self.next_is(Keyword::Inner.into()) {
            self.expect(Keyword::Join.into())?;
            return Ok(Some(JoinKind::Inner));
        }
        if let Some(keyword) = self.next_if_map(|token| match token {
            Token::Keyword(k @ (Keyword::Left | Keyword::Right | Keyword::Full)) => Some(*k),
            _ => None,
        }) {
            return Err(ParseError::unsupported(
                format!("{} OUTER JOIN", keyword),
                location,
            ));
        }
        Ok(None)
    }

    fn parse_where_clause(&mut self) -> ParseResult<Option<Expr>> {
        if !self.next_is(Keyword::Where.into()) {
            return Ok(None);
        }
        Ok(Some(self.parse_expression()?))
    }

    fn parse_group_by_clause(&mut self) -> ParseResult<Vec<Expr>> {
        if !self.next_is(Keyword::Group.into()) {
            return Ok(Vec::new());
        }
        self.expect(Keyword::By.into())?;
        let mut group_by = Vec::new();
        loop {
            group_by.push(self.parse_expression()?);
            if !self.next_is(Token::Comma) {
                break;
            }
        }
        Ok(group_by)
    }

    fn parse_having_clause(&mut self) -> ParseResult<Option<Expr>> {
        if !self.next_is(Keyword::Having.into()) {
            return Ok(None);
        }
        Ok(Some(self.parse_expression()?))
    }

    fn parse_order_by_clause(&mut self) -> ParseResult<Vec<OrderByExpr>> {
        if !self.next_is(Keyword::Order.into()) {
            return Ok(Vec::new());
        }
        self.expect(Keyword::By.into())?;
        let mut order_by = Vec::new();
        loop {
            let expr = self.parse_expression()?;
            let direction = self
                .next_if_map(|token| match token {
                    Token::Keyword(Keyword::Asc) => Some(SortDirection::Ascending),
                    Token::Keyword(Keyword::Desc) => Some(SortDirection::Descending),
                    _ => None,
                })
                .unwrap_or_default();
            order_by.push(OrderByExpr { expr, direction });
            if !self.next_is(Token::Comma) {
                break;
            }
        }
        Ok(order_by)
    }

    /// Parses `LIMIT n [OFFSET m]` or a lone `OFFSET m`.
    fn parse_limit_clause(&mut self) -> ParseResult<(Option<u64>, Option<u64>)> {
        let limit = if self.next_is(Keyword::Limit.into()) {
            Some(self.parse_row_count("LIMIT")?)
        } else {
            None
        };
        let offset = if self.next_is(Keyword::Offset.into()) {
            Some(self.parse_row_count("OFFSET")?)
        } else {
            None
        };
        Ok((limit, offset))
    }

    fn parse_row_count(&mut self, clause: &'static str) -> ParseResult<u64> {
        let token = self.next("row count")?;
        let invalid = |found: String| ParseError::InvalidLimit {
            clause,
            found,
            line: token.start.line,
            column: token.start.column,
        };
        match &token.token {
            Token::Number(n) => n.parse::<u64>().map_err(|_| invalid(n.clone())),
            Token::Minus => {
                let end = self
                    .peek_spanned()
                    .map(|next| next.end)
                    .unwrap_or(token.end);
                Err(invalid(self.input[token.start.offset..end].to_string()))
            }
            other => Err(invalid(other.to_string())),
        }
    }

    /// Parses an expression using precedence climbing.
    ///
    /// Precedence levels, lowest first:
    ///
    /// * 1: OR
    /// * 2: AND
    /// * 3: NOT
    /// * 4: =, <>, LIKE, IN, BETWEEN, IS
    /// * 5: <, <=, >, >=
    /// * 6: +, -, ||
    /// * 7: *, /, %
    /// * 10: +, - (prefix)
    ///
    /// Prefix operators are right-associative, everything else is
    /// left-associative.
    fn parse_expression(&mut self) -> ParseResult<Expr> {
        self.parse_expression_at(0)
    }

    fn parse_expression_at(&mut self, min_precedence: Precedence) -> ParseResult<Expr> {
        let mut lhs = if let Some(prefix) = self.parse_prefix_operator_at(min_precedence) {
            let next_precedence = prefix.precedence() + Associativity::Right;
            let rhs = self.parse_expression_at(next_precedence)?;
            prefix.into_expression(rhs)
        } else {
            self.parse_expression_atom()?
        };

        loop {
            if let Some(predicate) = self.parse_predicate_operator_at(min_precedence)? {
                lhs = self.parse_predicate_rhs(predicate, lhs)?;
                continue;
            }
            if let Some(infix) = self.parse_infix_operator_at(min_precedence) {
                let next_precedence = infix.precedence() + Associativity::Left;
                let rhs = self.parse_expression_at(next_precedence)?;
                lhs = infix.into_expression(lhs, rhs);
                continue;
            }
            break;
        }
        Ok(lhs)
    }

    /// Parses an expression atom: a literal, a column reference, a
    /// function call or a parenthesized expression.
    fn parse_expression_atom(&mut self) -> ParseResult<Expr> {
        let token = self.next("an expression")?;
        Ok(match token.token {
            Token::Number(ref n) => parse_number(n).ok_or_else(|| {
                ParseError::invalid_token(format!("invalid number {}", n), token.start)
            })?,
            Token::String(s) => Literal::String(s).into(),
            Token::Keyword(Keyword::True) => Literal::Boolean(true).into(),
            Token::Keyword(Keyword::False) => Literal::Boolean(false).into(),
            Token::Keyword(Keyword::Null) => Literal::Null.into(),

            Token::Ident(name) if self.peek() == Some(&Token::OpenParen) => {
                self.position += 1;
                match AggregateFunction::lookup(&name) {
                    Some(func) => self.parse_aggregate_call(func)?,
                    None => self.parse_function_call(name)?,
                }
            }

            Token::Ident(table) if self.peek() == Some(&Token::Period) => {
                self.position += 1;
                let column = self.next_ident("column name")?;
                Expr::Column(ColumnRef {
                    table: Some(table),
                    column,
                })
            }

            Token::Ident(column) => Expr::Column(ColumnRef {
                table: None,
                column,
            }),

            Token::OpenParen => {
                if let Some(Token::Keyword(Keyword::Select)) = self.peek() {
                    return Err(ParseError::unsupported("subqueries", self.location()));
                }
                let expr = self.parse_expression()?;
                self.expect(Token::CloseParen)?;
                expr
            }

            _ => return Err(self.unexpected(token, "an expression")),
        })
    }

    fn parse_aggregate_call(&mut self, func: AggregateFunction) -> ParseResult<Expr> {
        let distinct = self.next_is(Keyword::Distinct.into());
        let arg = if !distinct && func == AggregateFunction::Count && self.next_is(Token::Asterisk)
        {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };
        self.expect(Token::CloseParen)?;
        Ok(Expr::Aggregate {
            func,
            arg,
            distinct,
        })
    }

    fn parse_function_call(&mut self, name: String) -> ParseResult<Expr> {
        let mut args = Vec::new();
        if !self.next_is(Token::CloseParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.next_is(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::CloseParen)?;
        }
        Ok(Expr::Function { name, args })
    }

    fn parse_prefix_operator_at(&mut self, min_precedence: Precedence) -> Option<PrefixOperator> {
        self.next_if_map(|token| {
            let operator = match token {
                Token::Keyword(Keyword::Not) => PrefixOperator::Not,
                Token::Minus => PrefixOperator::Minus,
                Token::Plus => PrefixOperator::Plus,
                _ => return None,
            };
            Some(operator).filter(|op| op.precedence() >= min_precedence)
        })
    }

    fn parse_infix_operator_at(&mut self, min_precedence: Precedence) -> Option<InfixOperator> {
        self.next_if_map(|token| {
            let operator = match token {
                Token::Asterisk => InfixOperator::Multiply,
                Token::Concat => InfixOperator::Concat,
                Token::Equal => InfixOperator::Equal,
                Token::GreaterThan => InfixOperator::GreaterThan,
                Token::GreaterThanOrEqual => InfixOperator::GreaterThanOrEqual,
                Token::Keyword(Keyword::And) => InfixOperator::And,
                Token::Keyword(Keyword::Or) => InfixOperator::Or,
                Token::LessThan => InfixOperator::LessThan,
                Token::LessThanOrEqual => InfixOperator::LessThanOrEqual,
                Token::Minus => InfixOperator::Subtract,
                Token::NotEqual => InfixOperator::NotEqual,
                Token::Percent => InfixOperator::Remainder,
                Token::Plus => InfixOperator::Add,
                Token::Slash => InfixOperator::Divide,
                _ => return None,
            };
            Some(operator).filter(|op| op.precedence() >= min_precedence)
        })
    }

    /// Parses the operator of an IS, LIKE, IN or BETWEEN predicate, including
    /// a leading NOT.
    fn parse_predicate_operator_at(
        &mut self,
        min_precedence: Precedence,
    ) -> ParseResult<Option<PredicateOperator>> {
        if PREDICATE_PRECEDENCE < min_precedence {
            return Ok(None);
        }
        let (negated, keyword) = match (self.peek_nth(0), self.peek_nth(1)) {
            (Some(Token::Keyword(Keyword::Not)), Some(Token::Keyword(k))) => (true, *k),
            (Some(Token::Keyword(k)), _) => (false, *k),
            _ => return Ok(None),
        };
        let operator = match keyword {
            Keyword::Like => PredicateOperator::Like { negated },
            Keyword::In => PredicateOperator::In { negated },
            Keyword::Between => PredicateOperator::Between { negated },
            Keyword::Is if !negated => {
                self.position += 1;
                let negated = self.next_is(Keyword::Not.into());
                self.expect(Keyword::Null.into())?;
                return Ok(Some(PredicateOperator::IsNull { negated }));
            }
            _ => return Ok(None),
        };
        self.position += if negated { 2 } else { 1 };
        Ok(Some(operator))
    }

    fn parse_predicate_rhs(&mut self, operator: PredicateOperator, lhs: Expr) -> ParseResult<Expr> {
        let expr = Box::new(lhs);
        let operand_precedence = PREDICATE_PRECEDENCE + Associativity::Left;
        Ok(match operator {
            PredicateOperator::IsNull { negated } => Expr::IsNull { expr, negated },
            PredicateOperator::Like { negated } => Expr::Like {
                expr,
                pattern: Box::new(self.parse_expression_at(operand_precedence)?),
                negated,
            },
            PredicateOperator::In { negated } => {
                self.expect(Token::OpenParen)?;
                if let Some(Token::Keyword(Keyword::Select)) = self.peek() {
                    return Err(ParseError::unsupported("subqueries", self.location()));
                }
                let mut list = Vec::new();
                loop {
                    list.push(self.parse_expression()?);
                    if !self.next_is(Token::Comma) {
                        break;
                    }
                }
                self.expect(Token::CloseParen)?;
                Expr::InList {
                    expr,
                    list,
                    negated,
                }
            }
            PredicateOperator::Between { negated } => {
                let low = Box::new(self.parse_expression_at(operand_precedence)?);
                self.expect(Keyword::And.into())?;
                let high = Box::new(self.parse_expression_at(operand_precedence)?);
                Expr::Between {
                    expr,
                    low,
                    high,
                    negated,
                }
            }
        })
    }
}

/// Parses a numeric literal: integers that fit in an i64 stay integers.
fn parse_number(text: &str) -> Option<Expr> {
    if text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = text.parse::<i64>() {
            return Some(Literal::Integer(n).into());
        }
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| Literal::Float(f).into())
}

/// Operator precedence.
type Precedence = u8;

const PREDICATE_PRECEDENCE: Precedence = 4;

/// Operator associativity.
enum Associativity {
    Left,
    Right,
}

impl Add<Associativity> for Precedence {
    type Output = Self;

    fn add(self, rhs: Associativity) -> Self {
        // Left-associative operators bind tighter to their left-hand side.
        self + match rhs {
            Associativity::Left => 1,
            Associativity::Right => 0,
        }
    }
}

enum PrefixOperator {
    Minus,
    Not,
    Plus,
}

impl PrefixOperator {
    fn precedence(&self) -> Precedence {
        match self {
            Self::Not => 3,
            Self::Minus | Self::Plus => 10,
        }
    }

    fn into_expression(self, rhs: Expr) -> Expr {
        let op = match self {
            Self::Minus => UnaryOperator::Minus,
            Self::Not => UnaryOperator::Not,
            Self::Plus => UnaryOperator::Plus,
        };
        Expr::Unary {
            op,
            expr: Box::new(rhs),
        }
    }
}

enum InfixOperator {
    Add,
    And,
    Concat,
    Divide,
    Equal,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Multiply,
    NotEqual,
    Or,
    Remainder,
    Subtract,
}

impl InfixOperator {
    fn precedence(&self) -> Precedence {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Equal | Self::NotEqual => 4,
            Self::GreaterThan
            | Self::GreaterThanOrEqual
            | Self::LessThan
            | Self::LessThanOrEqual => 5,
            Self::Add | Self::Subtract | Self::Concat => 6,
            Self::Multiply | Self::Divide | Self::Remainder => 7,
        }
    }

    fn into_expression(self, lhs: Expr, rhs: Expr) -> Expr {
        let op = match self {
            Self::Add => BinaryOperator::Plus,
            Self::And => BinaryOperator::And,
            Self::Concat => BinaryOperator::Concat,
            Self::Divide => BinaryOperator::Divide,
            Self::Equal => BinaryOperator::Eq,
            Self::GreaterThan => BinaryOperator::Gt,
            Self::GreaterThanOrEqual => BinaryOperator::GtEq,
            Self::LessThan => BinaryOperator::Lt,
            Self::LessThanOrEqual => BinaryOperator::LtEq,
            Self::Multiply => BinaryOperator::Multiply,
            Self::NotEqual => BinaryOperator::NotEq,
            Self::Or => BinaryOperator::Or,
            Self::Remainder => BinaryOperator::Modulo,
            Self::Subtract => BinaryOperator::Minus,
        };
        Expr::Binary {
            left: Box::new(lhs),
            op,
            right: Box::new(rhs),
        }
    }
}

enum PredicateOperator {
    IsNull { negated: bool },
    Like { negated: bool },
    In { negated: bool },
    Between { negated: bool },
}
