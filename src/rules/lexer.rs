use super::RuleSyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Question,
    Colon,
    Semicolon,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    And,
    Or,
}

/// A token plus the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Spanned>, RuleSyntaxError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (offset, c) = chars[i];
        let peek = chars.get(i + 1).map(|&(_, c)| c);
        let peek2 = chars.get(i + 2).map(|&(_, c)| c);

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && peek.is_some_and(|p| p.is_ascii_digit())) {
            let start = i;
            while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
                i += 1;
            }
            let text: String = chars[start..i].iter().map(|&(_, c)| c).collect();
            let value = text
                .parse::<f64>()
                .map_err(|_| RuleSyntaxError::new(offset, format!("bad number `{text}`")))?;
            tokens.push(Spanned {
                token: Token::Number(value),
                offset,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            let start = i;
            while i < chars.len()
                && (chars[i].1.is_alphanumeric() || chars[i].1 == '_' || chars[i].1 == '$')
            {
                i += 1;
            }
            let text: String = chars[start..i].iter().map(|&(_, c)| c).collect();
            tokens.push(Spanned {
                token: Token::Ident(text),
                offset,
            });
            continue;
        }

        if c == '\'' || c == '"' {
            let quote = c;
            let mut text = String::new();
            i += 1;
            loop {
                let Some(&(_, c)) = chars.get(i) else {
                    return Err(RuleSyntaxError::new(offset, "unterminated string"));
                };
                i += 1;
                match c {
                    c if c == quote => break,
                    '\\' => {
                        let Some(&(_, escaped)) = chars.get(i) else {
                            return Err(RuleSyntaxError::new(offset, "unterminated string"));
                        };
                        i += 1;
                        text.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            other => other,
                        });
                    }
                    c => text.push(c),
                }
            }
            tokens.push(Spanned {
                token: Token::Str(text),
                offset,
            });
            continue;
        }

        let (token, width) = match (c, peek, peek2) {
            ('=', Some('='), Some('=')) => (Token::StrictEq, 3),
            ('!', Some('='), Some('=')) => (Token::StrictNotEq, 3),
            ('=', Some('='), _) => (Token::Eq, 2),
            ('!', Some('='), _) => (Token::NotEq, 2),
            ('<', Some('='), _) => (Token::Le, 2),
            ('>', Some('='), _) => (Token::Ge, 2),
            ('&', Some('&'), _) => (Token::And, 2),
            ('|', Some('|'), _) => (Token::Or, 2),
            ('<', _, _) => (Token::Lt, 1),
            ('>', _, _) => (Token::Gt, 1),
            ('!', _, _) => (Token::Bang, 1),
            ('+', _, _) => (Token::Plus, 1),
            ('-', _, _) => (Token::Minus, 1),
            ('*', _, _) => (Token::Star, 1),
            ('/', _, _) => (Token::Slash, 1),
            ('%', _, _) => (Token::Percent, 1),
            ('(', _, _) => (Token::LParen, 1),
            (')', _, _) => (Token::RParen, 1),
            ('[', _, _) => (Token::LBracket, 1),
            (']', _, _) => (Token::RBracket, 1),
            ('.', _, _) => (Token::Dot, 1),
            (',', _, _) => (Token::Comma, 1),
            ('?', _, _) => (Token::Question, 1),
            (':', _, _) => (Token::Colon, 1),
            (';', _, _) => (Token::Semicolon, 1),
            (other, _, _) => {
                return Err(RuleSyntaxError::new(
                    offset,
                    format!("unexpected character `{other}`"),
                ))
            }
        };
        tokens.push(Spanned { token, offset });
        i += width;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("source should tokenize")
            .into_iter()
            .map(|spanned| spanned.token)
            .collect()
    }

    #[test]
    fn operators_take_the_longest_match() {
        assert_eq!(
            kinds("a !== b != c === d == e <= f"),
            vec![
                Token::Ident("a".into()),
                Token::StrictNotEq,
                Token::Ident("b".into()),
                Token::NotEq,
                Token::Ident("c".into()),
                Token::StrictEq,
                Token::Ident("d".into()),
                Token::Eq,
                Token::Ident("e".into()),
                Token::Le,
                Token::Ident("f".into()),
            ]
        );
    }

    #[test]
    fn strings_and_numbers() {
        assert_eq!(
            kinds(r#"'Draw\'s' "x" 4.5 .5"#),
            vec![
                Token::Str("Draw's".into()),
                Token::Str("x".into()),
                Token::Number(4.5),
                Token::Number(0.5),
            ]
        );
    }

    #[test]
    fn reports_offsets_of_bad_input() {
        let error = tokenize("a # b").expect_err("`#` is not a token");
        assert_eq!(error.offset, 2);
        assert!(tokenize("'open").is_err());
    }
}
