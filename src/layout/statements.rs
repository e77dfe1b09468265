//! Second pass of layout parsing: tokens to typed statements.
//!
//! Splits the token stream at `;` and interprets the `INPUT` column
//! declarations and `LABEL` assignments. Everything else in a SAS setup
//! file is carried as [`Statement::Other`] and ignored by the caller.

use super::lexer::{Token, TokenKind};
use crate::constants::{INPUT_KEYWORD, LABEL_KEYWORD};
use crate::error::{ConvertError, Result};
use std::iter::Peekable;
use std::slice::Iter;

/// One `NAME [$] START[-END]` item of an INPUT statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub character: bool,
    pub line: usize,
}

/// One `NAME = "TEXT"` item of a LABEL statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelAssignment {
    pub name: String,
    pub text: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Input {
        line: usize,
        fields: Vec<FieldDeclaration>,
    },
    Label {
        line: usize,
        labels: Vec<LabelAssignment>,
    },
    Other {
        line: usize,
    },
}

/// Group tokens into statements and parse the ones we understand
pub fn parse_statements(tokens: &[Token]) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    let mut rest = tokens;

    while let Some(first) = rest.first() {
        let (body, terminated, remaining) =
            match rest.iter().position(|t| t.kind == TokenKind::Semicolon) {
                Some(end) => (&rest[..end], true, &rest[end + 1..]),
                None => (rest, false, &[][..]),
            };
        rest = remaining;

        let keyword = first.ident().map(str::to_ascii_uppercase);
        let statement = match keyword.as_deref() {
            Some(INPUT_KEYWORD) => {
                require_terminator(INPUT_KEYWORD, first.line, terminated)?;
                Statement::Input {
                    line: first.line,
                    fields: parse_input_body(&body[1..])?,
                }
            }
            Some(LABEL_KEYWORD) => {
                require_terminator(LABEL_KEYWORD, first.line, terminated)?;
                Statement::Label {
                    line: first.line,
                    labels: parse_label_body(&body[1..])?,
                }
            }
            _ => Statement::Other { line: first.line },
        };
        statements.push(statement);
    }

    Ok(statements)
}

fn require_terminator(keyword: &str, line: usize, terminated: bool) -> Result<()> {
    if terminated {
        Ok(())
    } else {
        Err(ConvertError::schema_parse(
            line,
            format!("{} statement is not terminated by ';'", keyword),
        ))
    }
}

fn parse_input_body(tokens: &[Token]) -> Result<Vec<FieldDeclaration>> {
    let mut cursor = tokens.iter().peekable();
    let mut fields = Vec::new();

    while let Some(token) = cursor.next() {
        let name = token.ident().ok_or_else(|| {
            ConvertError::schema_parse(
                token.line,
                format!("expected a variable name, found {}", token.kind),
            )
        })?;

        let character = next_if_kind(&mut cursor, &TokenKind::Dollar).is_some();

        let start_token = cursor.next().ok_or_else(|| {
            ConvertError::schema_parse(
                token.line,
                format!("variable '{}' has no column position", name),
            )
        })?;
        let start = column_number(start_token, name)?;

        let end = match next_if_kind(&mut cursor, &TokenKind::Dash) {
            Some(dash) => {
                let end_token = cursor.next().ok_or_else(|| {
                    ConvertError::schema_parse(
                        dash.line,
                        format!("range for variable '{}' has no end column", name),
                    )
                })?;
                column_number(end_token, name)?
            }
            None => start,
        };

        // SAS decimal specifier, e.g. `V1 1-8 .2`
        if next_if_kind(&mut cursor, &TokenKind::Dot).is_some() {
            cursor.next_if(|t| matches!(t.kind, TokenKind::Number(_)));
        }

        if start > end {
            return Err(ConvertError::schema_parse(
                start_token.line,
                format!(
                    "variable '{}' starts at column {} after its end column {}",
                    name, start, end
                ),
            ));
        }

        fields.push(FieldDeclaration {
            name: name.to_string(),
            start,
            end,
            character,
            line: token.line,
        });
    }

    Ok(fields)
}

fn parse_label_body(tokens: &[Token]) -> Result<Vec<LabelAssignment>> {
    let mut cursor = tokens.iter().peekable();
    let mut labels = Vec::new();

    while let Some(token) = cursor.next() {
        let name = token.ident().ok_or_else(|| {
            ConvertError::schema_parse(
                token.line,
                format!("expected a variable name in LABEL, found {}", token.kind),
            )
        })?;

        if next_if_kind(&mut cursor, &TokenKind::Equals).is_none() {
            return Err(ConvertError::schema_parse(
                token.line,
                format!("label for '{}' is missing '='", name),
            ));
        }

        let text = match cursor.next() {
            Some(Token {
                kind: TokenKind::Str(text),
                ..
            }) => text.clone(),
            _ => {
                return Err(ConvertError::schema_parse(
                    token.line,
                    format!("label for '{}' is missing its quoted text", name),
                ));
            }
        };

        labels.push(LabelAssignment {
            name: name.to_string(),
            text,
            line: token.line,
        });
    }

    Ok(labels)
}

fn next_if_kind<'a>(cursor: &mut Peekable<Iter<'a, Token>>, kind: &TokenKind) -> Option<&'a Token> {
    cursor.next_if(|t| &t.kind == kind)
}

fn column_number(token: &Token, name: &str) -> Result<usize> {
    let TokenKind::Number(digits) = &token.kind else {
        return Err(ConvertError::schema_parse(
            token.line,
            format!(
                "expected a column position for '{}', found {}",
                name, token.kind
            ),
        ));
    };

    let column: usize = digits.parse().map_err(|_| {
        ConvertError::schema_parse(
            token.line,
            format!("column position {} for '{}' is out of range", digits, name),
        )
    })?;

    if column == 0 {
        return Err(ConvertError::schema_parse(
            token.line,
            format!("column positions are 1-based; '{}' declares column 0", name),
        ));
    }

    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::lexer::tokenize;

    fn statements(text: &str) -> Result<Vec<Statement>> {
        parse_statements(&tokenize(text).unwrap())
    }

    fn input_fields(text: &str) -> Vec<FieldDeclaration> {
        statements(text)
            .unwrap()
            .into_iter()
            .find_map(|s| match s {
                Statement::Input { fields, .. } => Some(fields),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_single_and_range_positions() {
        let fields = input_fields("INPUT A $ 1 B 2 C 3-5 D $ 6 - 8;");
        let spans: Vec<_> = fields
            .iter()
            .map(|f| (f.name.as_str(), f.start, f.end, f.character))
            .collect();
        assert_eq!(
            spans,
            vec![
                ("A", 1, 1, true),
                ("B", 2, 2, false),
                ("C", 3, 5, false),
                ("D", 6, 8, true),
            ]
        );
    }

    #[test]
    fn test_decimal_specifier_skipped() {
        let fields = input_fields("INPUT AMOUNT 1-8 .2 NEXT 9;");
        assert_eq!(fields.len(), 2);
        assert_eq!((fields[1].start, fields[1].end), (9, 9));
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let parsed = statements("input a 1; label a = 'x';").unwrap();
        assert!(matches!(parsed[0], Statement::Input { .. }));
        assert!(matches!(parsed[1], Statement::Label { .. }));
    }

    #[test]
    fn test_other_statements_ignored() {
        let parsed = statements("DATA; INFILE 'file.txt' LRECL=8; INPUT A 1;").unwrap();
        assert_eq!(parsed.len(), 3);
        assert!(matches!(parsed[0], Statement::Other { line: 1 }));
        assert!(matches!(parsed[1], Statement::Other { .. }));
    }

    #[test]
    fn test_missing_position_is_error() {
        match statements("INPUT\n A 1\n B C 3;") {
            Err(ConvertError::SchemaParse { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("'B'"), "{}", message);
            }
            other => panic!("Expected SchemaParse, got {:?}", other),
        }
    }

    #[test]
    fn test_position_without_name_is_error() {
        assert!(matches!(
            statements("INPUT A 1 2-3;"),
            Err(ConvertError::SchemaParse { .. })
        ));
    }

    #[test]
    fn test_reversed_range_is_error() {
        let err = statements("INPUT A 5-3;").unwrap_err();
        assert!(err.to_string().contains("after its end column"));
    }

    #[test]
    fn test_zero_column_is_error() {
        assert!(statements("INPUT A 0;").is_err());
    }

    #[test]
    fn test_unterminated_input_is_error() {
        let err = statements("INPUT A 1 B 2").unwrap_err();
        assert!(err.to_string().contains("not terminated"));
    }

    #[test]
    fn test_label_assignments() {
        let parsed = statements("LABEL\n A = \"FIRST\"\n B = '';").unwrap();
        let Statement::Label { labels, .. } = &parsed[0] else {
            panic!("Expected a LABEL statement");
        };
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].text, "FIRST");
        assert_eq!(labels[1].text, "");
        assert_eq!(labels[1].line, 3);
    }

    #[test]
    fn test_label_without_text_is_error() {
        assert!(statements("LABEL A = B;").is_err());
        assert!(statements("LABEL A \"text\";").is_err());
    }
}
