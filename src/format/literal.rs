//! Row-tuple literals.
//!
//! The executor reports rows as a bracketed list of tuples, e.g.
//! `[('Alice', 30), ('Bob', None)]` or `[(42,)]`:
//!
//! - text is single-quoted with embedded quotes doubled
//! - numbers are bare, NULL is `None`, booleans are `True` / `False`
//! - one-element tuples keep their trailing comma
//!
//! Parsing accepts that form plus double-quoted strings and single-argument
//! constructor wrappers such as `Decimal('1.50')`. The text is tokenized with
//! sqlparser's PostgreSQL tokenizer, whose string rules (doubled quotes, no
//! backslash escapes) match the renderer.

use crate::models::{Cell, QueryOutcome};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

/// Render rows as a row-tuple literal.
pub fn render_rows(rows: &[Vec<Cell>]) -> String {
    let tuples: Vec<String> = rows.iter().map(|row| render_tuple(row)).collect();
    format!("[{}]", tuples.join(", "))
}

fn render_tuple(row: &[Cell]) -> String {
    let cells: Vec<String> = row.iter().map(render_cell).collect();
    match cells.as_slice() {
        [single] => format!("({},)", single),
        _ => format!("({})", cells.join(", ")),
    }
}

/// Literal form of one cell.
pub fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => format!("'{}'", s.replace('\'', "''")),
        other => other.to_string(),
    }
}

/// Interpret executor output.
///
/// - a list literal gives `Rows` (or `Empty` when it has no items)
/// - a lone value or tuple gives `Scalar`
/// - anything else, including text that fails to tokenize, gives `RawText`
pub fn parse(raw: &str) -> QueryOutcome {
    let tokens = match Tokenizer::new(&PostgreSqlDialect {}, raw).tokenize() {
        Ok(tokens) => tokens,
        Err(_) => return QueryOutcome::RawText(raw.to_string()),
    };
    let tokens: Vec<Token> = tokens
        .into_iter()
        .filter(|t| !matches!(t, Token::Whitespace(_) | Token::EOF))
        .collect();

    let mut parser = LiteralParser { tokens, pos: 0 };
    match parser.parse_top() {
        Some(outcome) if parser.at_end() => match outcome {
            Literal::List(rows) if rows.is_empty() => QueryOutcome::Empty,
            Literal::List(rows) => QueryOutcome::Rows(rows),
            Literal::Tuple => QueryOutcome::Scalar(raw.trim().to_string()),
            Literal::Value(cell) => QueryOutcome::Scalar(cell.to_string()),
        },
        _ => QueryOutcome::RawText(raw.to_string()),
    }
}

enum Literal {
    List(Vec<Vec<Cell>>),
    /// A bare tuple is answered with its text as written.
    Tuple,
    Value(Cell),
}

struct LiteralParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl LiteralParser {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_top(&mut self) -> Option<Literal> {
        match self.peek()? {
            Token::LBracket => {
                self.pos += 1;
                let items = self.parse_sequence(&Token::RBracket, Self::parse_row)?;
                Some(Literal::List(items))
            }
            Token::LParen => {
                self.pos += 1;
                self.parse_sequence(&Token::RParen, Self::parse_value)?;
                Some(Literal::Tuple)
            }
            _ => self.parse_value().map(Literal::Value),
        }
    }

    /// Comma-separated items up to `close`; a trailing comma is allowed.
    fn parse_sequence<T>(
        &mut self,
        close: &Token,
        mut item: impl FnMut(&mut Self) -> Option<T>,
    ) -> Option<Vec<T>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Some(items);
            }
            items.push(item(self)?);
            if !self.eat(&Token::Comma) {
                return self.eat(close).then_some(items);
            }
        }
    }

    /// A tuple or list becomes a row; a bare value is a one-column row.
    fn parse_row(&mut self) -> Option<Vec<Cell>> {
        match self.peek()? {
            Token::LParen => {
                self.pos += 1;
                self.parse_sequence(&Token::RParen, Self::parse_value)
            }
            Token::LBracket => {
                self.pos += 1;
                self.parse_sequence(&Token::RBracket, Self::parse_value)
            }
            _ => self.parse_value().map(|cell| vec![cell]),
        }
    }

    fn parse_value(&mut self) -> Option<Cell> {
        match self.next()? {
            Token::SingleQuotedString(s) => Some(Cell::Text(s)),
            Token::Number(n, _) => Some(Cell::Number(n)),
            Token::Minus => match self.next()? {
                Token::Number(n, _) => Some(Cell::Number(format!("-{}", n))),
                _ => None,
            },
            Token::Word(w) if w.quote_style == Some('"') => Some(Cell::Text(w.value)),
            Token::Word(w) if w.quote_style.is_none() => match w.value.as_str() {
                "None" => Some(Cell::Null),
                "True" => Some(Cell::Bool(true)),
                "False" => Some(Cell::Bool(false)),
                _ => self.parse_constructor(),
            },
            _ => None,
        }
    }

    /// `Name(value)` or `module.Name(value)`; the constructor name was just consumed.
    fn parse_constructor(&mut self) -> Option<Cell> {
        while self.eat(&Token::Period) {
            match self.next()? {
                Token::Word(w) if w.quote_style.is_none() => {}
                _ => return None,
            }
        }
        if !self.eat(&Token::LParen) {
            return None;
        }
        let value = self.parse_value()?;
        self.eat(&Token::RParen).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_single_column_rows() {
        let rows = vec![vec![Cell::text("Alice")], vec![Cell::text("Bob")]];
        assert_eq!(render_rows(&rows), "[('Alice',), ('Bob',)]");
    }

    #[test]
    fn test_render_mixed_row() {
        let rows = vec![vec![
            Cell::number(42),
            Cell::Null,
            Cell::Bool(true),
            Cell::text("O'Brien"),
        ]];
        assert_eq!(render_rows(&rows), "[(42, None, True, 'O''Brien')]");
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_rows(&[]), "[]");
    }

    #[test]
    fn test_parse_rows() {
        assert_eq!(
            parse("[('Alice',), ('Bob',)]"),
            QueryOutcome::Rows(vec![vec![Cell::text("Alice")], vec![Cell::text("Bob")]])
        );
    }

    #[test]
    fn test_parse_empty_list() {
        assert_eq!(parse("[]"), QueryOutcome::Empty);
        assert_eq!(parse("  [ ]\n"), QueryOutcome::Empty);
    }

    #[test]
    fn test_parse_scalar_number() {
        assert_eq!(parse("42"), QueryOutcome::Scalar("42".to_string()));
        assert_eq!(parse("-1.5"), QueryOutcome::Scalar("-1.5".to_string()));
    }

    #[test]
    fn test_parse_prose_is_raw_text() {
        let raw = "There are 42 users";
        assert_eq!(parse(raw), QueryOutcome::RawText(raw.to_string()));
        assert_eq!(
            parse("it's broken"),
            QueryOutcome::RawText("it's broken".to_string())
        );
    }

    #[test]
    fn test_parse_doubled_quote_and_none() {
        assert_eq!(
            parse("[('O''Brien', None, False)]"),
            QueryOutcome::Rows(vec![vec![
                Cell::text("O'Brien"),
                Cell::Null,
                Cell::Bool(false)
            ]])
        );
    }

    #[test]
    fn test_parse_constructor_wrappers() {
        assert_eq!(
            parse("[(Decimal('1.50'),), (decimal.Decimal('2'),)]"),
            QueryOutcome::Rows(vec![vec![Cell::text("1.50")], vec![Cell::text("2")]])
        );
    }

    #[test]
    fn test_parse_double_quoted_string() {
        assert_eq!(
            parse(r#"[("it's",)]"#),
            QueryOutcome::Rows(vec![vec![Cell::text("it's")]])
        );
    }

    #[test]
    fn test_parse_bare_items_become_rows() {
        assert_eq!(
            parse("[1, 2]"),
            QueryOutcome::Rows(vec![vec![Cell::number(1)], vec![Cell::number(2)]])
        );
    }

    #[test]
    fn test_parse_top_level_tuple_is_scalar() {
        assert_eq!(parse("(1, 2)"), QueryOutcome::Scalar("(1, 2)".to_string()));
    }

    #[test]
    fn test_parse_trailing_garbage_is_raw_text() {
        assert!(matches!(parse("[(1,)] extra"), QueryOutcome::RawText(_)));
        assert!(matches!(parse("[(1,)"), QueryOutcome::RawText(_)));
    }

    #[test]
    fn test_render_then_parse_preserves_text() {
        let rows = vec![vec![Cell::text("line one\nline 'two'"), Cell::number("3.10")]];
        assert_eq!(parse(&render_rows(&rows)), QueryOutcome::Rows(rows));
    }
}
