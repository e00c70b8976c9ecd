//! Script parser.
//!
//! Parses source text into an arena-allocated statement list. The AST borrows
//! from the arena only; the source can be dropped after parsing.

use bumpalo::Bump;
use pest::Parser;
use pest::error::LineColLocation;
use pest::iterators::Pair;
use pest_derive::Parser;

use crate::error::ScriptError;

#[derive(Parser)]
#[grammar = "parser/script.pest"]
struct ScriptParser;

/// Line and column of a syntax node, 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    fn of(pair: &Pair<Rule>) -> Self {
        let (line, column) = pair.as_span().start_pos().line_col();
        Self { line, column }
    }

    pub fn error(self, message: impl Into<String>) -> ScriptError {
        ScriptError::new(message, self.line, self.column)
    }
}

#[derive(Debug)]
pub(crate) enum Stmt<'a> {
    Import { name: &'a str, pos: Pos },
    Let { name: &'a str, value: &'a Expr<'a> },
    Expr(&'a Expr<'a>),
}

#[derive(Debug)]
pub(crate) struct Expr<'a> {
    pub kind: ExprKind<'a>,
    pub pos: Pos,
}

#[derive(Debug)]
pub(crate) enum ExprKind<'a> {
    Nil,
    Int(i64),
    Float(f64),
    Str(&'a str),
    Dict(&'a [(&'a str, &'a Expr<'a>)]),
    Ident(&'a str),
    Field {
        target: &'a Expr<'a>,
        name: &'a str,
    },
    Call {
        callee: &'a Expr<'a>,
        args: &'a [Arg<'a>],
    },
}

#[derive(Debug)]
pub(crate) enum Arg<'a> {
    Positional(&'a Expr<'a>),
    Keyword(&'a str, &'a Expr<'a>),
}

/// Parse a whole script.
pub(crate) fn parse<'a>(arena: &'a Bump, source: &str) -> Result<&'a [Stmt<'a>], ScriptError> {
    let mut pairs = ScriptParser::parse(Rule::program, source).map_err(|e| {
        tracing::debug!("Pest parser failed with: {:?}", e);
        let (line, column) = match e.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        };
        ScriptError::new(e.variant.message().into_owned(), line, column)
    })?;
    let Some(program) = pairs.next() else {
        return Ok(&[]);
    };

    let context = ParseContext { arena };
    let mut statements = Vec::new();
    for pair in program.into_inner() {
        match pair.as_rule() {
            Rule::EOI => break,
            _ => statements.push(context.parse_statement(pair)?),
        }
    }
    Ok(arena.alloc_slice_fill_iter(statements))
}

struct ParseContext<'a> {
    arena: &'a Bump,
}

impl<'a> ParseContext<'a> {
    fn str(&self, s: &str) -> &'a str {
        self.arena.alloc_str(s)
    }

    fn parse_statement(&self, pair: Pair<Rule>) -> Result<Stmt<'a>, ScriptError> {
        let pos = Pos::of(&pair);
        match pair.as_rule() {
            Rule::import_stmt => {
                let name = last_ident(pair);
                Ok(Stmt::Import {
                    name: self.str(name),
                    pos,
                })
            }
            Rule::let_stmt => {
                let mut inner = pair.into_inner().filter(|p| p.as_rule() != Rule::kw_let);
                let (Some(name), Some(value)) = (inner.next(), inner.next()) else {
                    return Err(pos.error("malformed let statement"));
                };
                Ok(Stmt::Let {
                    name: self.str(name.as_str()),
                    value: self.parse_expr(value)?,
                })
            }
            Rule::expr_stmt => match pair.into_inner().next() {
                Some(expr) => Ok(Stmt::Expr(self.parse_expr(expr)?)),
                None => Err(pos.error("empty statement")),
            },
            rule => Err(pos.error(format!("unexpected {:?}", rule))),
        }
    }

    fn parse_expr(&self, pair: Pair<Rule>) -> Result<&'a Expr<'a>, ScriptError> {
        let pos = Pos::of(&pair);
        let mut inner = pair.into_inner();
        let Some(primary) = inner.next() else {
            return Err(pos.error("empty expression"));
        };
        let mut expr = self.parse_primary(primary)?;

        for postfix in inner {
            let pos = Pos::of(&postfix);
            let kind = match postfix.as_rule() {
                Rule::field => ExprKind::Field {
                    target: expr,
                    name: self.str(last_ident(postfix)),
                },
                Rule::call => {
                    let args = postfix
                        .into_inner()
                        .map(|arg| self.parse_argument(arg))
                        .collect::<Result<Vec<_>, _>>()?;
                    ExprKind::Call {
                        callee: expr,
                        args: self.arena.alloc_slice_fill_iter(args),
                    }
                }
                rule => return Err(pos.error(format!("unexpected {:?}", rule))),
            };
            expr = self.arena.alloc(Expr { kind, pos });
        }
        Ok(expr)
    }

    fn parse_argument(&self, pair: Pair<Rule>) -> Result<Arg<'a>, ScriptError> {
        let pos = Pos::of(&pair);
        let rule = pair.as_rule();
        let mut inner = pair.into_inner();
        match (rule, inner.next(), inner.next()) {
            (Rule::positional_arg, Some(expr), None) => {
                Ok(Arg::Positional(self.parse_expr(expr)?))
            }
            (Rule::keyword_arg, Some(name), Some(expr)) => Ok(Arg::Keyword(
                self.str(name.as_str()),
                self.parse_expr(expr)?,
            )),
            _ => Err(pos.error("malformed argument")),
        }
    }

    fn parse_primary(&self, pair: Pair<Rule>) -> Result<&'a Expr<'a>, ScriptError> {
        let pos = Pos::of(&pair);
        let kind = match pair.as_rule() {
            Rule::expr => return self.parse_expr(pair),
            Rule::nil => ExprKind::Nil,
            Rule::int => ExprKind::Int(
                pair.as_str()
                    .parse()
                    .map_err(|_| pos.error(format!("integer literal `{}` out of range", pair.as_str())))?,
            ),
            Rule::float => ExprKind::Float(
                pair.as_str()
                    .parse()
                    .map_err(|_| pos.error(format!("invalid float literal `{}`", pair.as_str())))?,
            ),
            Rule::string => ExprKind::Str(self.parse_string(pair)),
            Rule::ident => ExprKind::Ident(self.str(pair.as_str())),
            Rule::dict => {
                let entries = pair
                    .into_inner()
                    .map(|entry| {
                        let entry_pos = Pos::of(&entry);
                        let mut inner = entry.into_inner();
                        match (inner.next(), inner.next()) {
                            (Some(key), Some(value)) => {
                                Ok((self.parse_string(key), self.parse_expr(value)?))
                            }
                            _ => Err(entry_pos.error("malformed dictionary entry")),
                        }
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                ExprKind::Dict(self.arena.alloc_slice_fill_iter(entries))
            }
            rule => return Err(pos.error(format!("unexpected {:?}", rule))),
        };
        Ok(self.arena.alloc(Expr { kind, pos }))
    }

    fn parse_string(&self, pair: Pair<Rule>) -> &'a str {
        let raw = pair
            .into_inner()
            .next()
            .map(|inner| inner.as_str())
            .unwrap_or_default();
        if !raw.contains('\\') {
            return self.str(raw);
        }

        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            // The grammar only admits these escapes.
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        }
        self.str(&out)
    }
}

fn last_ident<'i>(pair: Pair<'i, Rule>) -> &'i str {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::ident)
        .last()
        .map(|p| p.as_str())
        .unwrap_or_default()
}
