use serde_json::Value;

use super::lexer::{tokenize, Spanned, Token};
use super::RuleSyntaxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
}

/// Parses a complete rule. Trailing semicolons are accepted.
pub fn parse(source: &str) -> Result<Expr, RuleSyntaxError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
    };
    let expr = parser.conditional()?;
    while parser.eat(&Token::Semicolon) {}
    if let Some(spanned) = parser.tokens.get(parser.pos) {
        return Err(RuleSyntaxError::new(
            spanned.offset,
            format!("unexpected {:?}", spanned.token),
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|spanned| &spanned.token)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|spanned| spanned.offset)
            .unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|spanned| spanned.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
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

    fn expect(&mut self, expected: Token) -> Result<(), RuleSyntaxError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(RuleSyntaxError::new(
                self.offset(),
                format!("expected {expected:?}"),
            ))
        }
    }

    fn conditional(&mut self) -> Result<Expr, RuleSyntaxError> {
        let test = self.or()?;
        if !self.eat(&Token::Question) {
            return Ok(test);
        }
        let then = self.conditional()?;
        self.expect(Token::Colon)?;
        let otherwise = self.conditional()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn or(&mut self) -> Result<Expr, RuleSyntaxError> {
        let mut lhs = self.and()?;
        while self.eat(&Token::Or) {
            let rhs = self.and()?;
            lhs = Expr::Logical {
                op: LogicalOp::Or,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, RuleSyntaxError> {
        let mut lhs = self.equality()?;
        while self.eat(&Token::And) {
            let rhs = self.equality()?;
            lhs = Expr::Logical {
                op: LogicalOp::And,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, RuleSyntaxError>,
        ops: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr, RuleSyntaxError> {
        let mut lhs = next(self)?;
        while let Some(op) = self.peek().and_then(ops) {
            self.pos += 1;
            let rhs = next(self)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, RuleSyntaxError> {
        self.binary_level(Self::relational, |token| match token {
            Token::Eq | Token::StrictEq => Some(BinaryOp::Eq),
            Token::NotEq | Token::StrictNotEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn relational(&mut self) -> Result<Expr, RuleSyntaxError> {
        self.binary_level(Self::additive, |token| match token {
            Token::Lt => Some(BinaryOp::Lt),
            Token::Le => Some(BinaryOp::Le),
            Token::Gt => Some(BinaryOp::Gt),
            Token::Ge => Some(BinaryOp::Ge),
            _ => None,
        })
    }

    fn additive(&mut self) -> Result<Expr, RuleSyntaxError> {
        self.binary_level(Self::multiplicative, |token| match token {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn multiplicative(&mut self) -> Result<Expr, RuleSyntaxError> {
        self.binary_level(Self::unary, |token| match token {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    fn unary(&mut self) -> Result<Expr, RuleSyntaxError> {
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, RuleSyntaxError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                let offset = self.offset();
                match self.advance() {
                    Some(Token::Ident(property)) => {
                        expr = Expr::Member {
                            object: Box::new(expr),
                            property,
                        };
                    }
                    _ => return Err(RuleSyntaxError::new(offset, "expected property name")),
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.conditional()?;
                self.expect(Token::RBracket)?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat(&Token::LParen) {
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.conditional()?);
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        self.expect(Token::Comma)?;
                    }
                }
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, RuleSyntaxError> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Number(value)) => Ok(Expr::Literal(super::eval::number(value))),
            Some(Token::Str(text)) => Ok(Expr::Literal(Value::String(text))),
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" | "undefined" => Expr::Literal(Value::Null),
                _ => Expr::Ident(name),
            }),
            Some(Token::LParen) => {
                let expr = self.conditional()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            Some(token) => Err(RuleSyntaxError::new(
                offset,
                format!("unexpected {token:?}"),
            )),
            None => Err(RuleSyntaxError::new(offset, "unexpected end of rule")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.into()))
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let expr = parse("a || b && c").expect("rule should parse");
        assert_eq!(
            expr,
            Expr::Logical {
                op: LogicalOp::Or,
                lhs: ident("a"),
                rhs: Box::new(Expr::Logical {
                    op: LogicalOp::And,
                    lhs: ident("b"),
                    rhs: ident("c"),
                }),
            }
        );
    }

    #[test]
    fn postfix_chains() {
        let expr = parse("getLast(toPile.cards)[0]").expect("rule should parse");
        let Expr::Index { object, .. } = expr else {
            panic!("expected an index expression");
        };
        let Expr::Call { callee, args } = *object else {
            panic!("expected a call");
        };
        assert_eq!(callee, ident("getLast"));
        assert_eq!(
            args,
            vec![Expr::Member {
                object: ident("toPile"),
                property: "cards".into(),
            }]
        );
    }

    #[test]
    fn accepts_trailing_semicolon_and_ternary() {
        assert!(parse("a ? 1 : 2;").is_ok());
        assert!(parse("(a < 5) === true;;").is_ok());
    }

    #[test]
    fn rejects_incomplete_rules() {
        assert!(parse("toPile.cards.length <").is_err());
        assert!(parse("f(a,").is_err());
        assert!(parse("a b").is_err());
        assert!(parse("").is_err());
        assert!(parse("a.").is_err());
    }
}
