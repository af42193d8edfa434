use crate::core::row::Row;
use crate::error::VcxError;
use crate::utils::util::Result;
use std::sync::Once;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Greater,
    Less,
    GreaterEq,
    LessEq,
    Eq,
    NotEq,
}

impl CompareOp {
    fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Greater => lhs > rhs,
            CompareOp::Less => lhs < rhs,
            CompareOp::GreaterEq => lhs >= rhs,
            CompareOp::LessEq => lhs <= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::NotEq => lhs != rhs,
        }
    }
}

/// Parsed include-expression: comparisons joined by `&&`/`||` with
/// parentheses. `&&` binds tighter than `||`.
#[derive(Clone, Debug, PartialEq)]
pub enum IncludeExpr {
    Comparison {
        key: String,
        op: CompareOp,
        value: String,
    },
    And(Vec<IncludeExpr>),
    Or(Vec<IncludeExpr>),
}

impl IncludeExpr {
    pub fn parse(input: &str) -> Result<Self> {
        validate_delimiters(input)?;
        parse_or(input)
    }

    /// Evaluates against a row. `QUAL` reads the row's qual; any other key
    /// reads the INFO map. A missing value (including `.`) or a value that
    /// does not parse as a number makes the comparison false.
    pub fn evaluate(&self, row: &Row) -> bool {
        match self {
            IncludeExpr::Comparison { key, op, value } => evaluate_comparison(row, key, *op, value),
            IncludeExpr::And(children) => children.iter().all(|child| child.evaluate(row)),
            IncludeExpr::Or(children) => children.iter().any(|child| child.evaluate(row)),
        }
    }
}

fn evaluate_comparison(row: &Row, key: &str, op: CompareOp, value: &str) -> bool {
    let lhs = if key == "QUAL" {
        match row.qual {
            Some(qual) => qual,
            None => return false,
        }
    } else {
        match row.info_fields().get(key) {
            None => return false,
            Some(text) if text == "." => return false,
            Some(text) => match text.parse::<f64>() {
                Ok(number) => number,
                Err(_) => {
                    log_non_numeric_value(key, text);
                    return false;
                }
            },
        }
    };

    let rhs = match value.parse::<f64>() {
        Ok(number) => number,
        Err(_) => {
            log_non_numeric_literal(value);
            return false;
        }
    };

    op.apply(lhs, rhs)
}

static NON_NUMERIC_VALUE_LOGGED: Once = Once::new();
static NON_NUMERIC_LITERAL_LOGGED: Once = Once::new();

fn log_non_numeric_value(key: &str, text: &str) {
    NON_NUMERIC_VALUE_LOGGED.call_once(|| {
        log::warn!("Skipping comparisons on non-numeric value for {key}: {text}");
    });
}

fn log_non_numeric_literal(value: &str) {
    NON_NUMERIC_LITERAL_LOGGED.call_once(|| {
        log::warn!("Skipping comparisons against non-numeric literal: {value}");
    });
}

fn validate_delimiters(input: &str) -> Result<()> {
    let mut depth: i64 = 0;
    let mut quote: Option<u8> = None;
    for &byte in input.as_bytes() {
        match quote {
            Some(open) => {
                if byte == open {
                    quote = None;
                }
            }
            None => match byte {
                b'\'' | b'"' => quote = Some(byte),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(VcxError::invalid_expression("unbalanced parentheses"));
                    }
                }
                _ => {}
            },
        }
    }
    if depth != 0 {
        return Err(VcxError::invalid_expression("unbalanced parentheses"));
    }
    if quote.is_some() {
        return Err(VcxError::invalid_expression("unterminated string literal"));
    }
    Ok(())
}

/// Splits on a two-character separator at paren depth zero, outside quotes.
fn split_top_level<'a>(input: &'a str, separator: &str) -> Vec<&'a str> {
    let bytes = input.as_bytes();
    let sep = separator.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut quote: Option<u8> = None;
    let mut start = 0_usize;
    let mut index = 0_usize;

    while index < bytes.len() {
        let byte = bytes[index];
        match quote {
            Some(open) => {
                if byte == open {
                    quote = None;
                }
            }
            None => match byte {
                b'\'' | b'"' => quote = Some(byte),
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                _ => {
                    if depth == 0 && bytes[index..].starts_with(sep) {
                        parts.push(&input[start..index]);
                        index += sep.len();
                        start = index;
                        continue;
                    }
                }
            },
        }
        index += 1;
    }

    parts.push(&input[start..]);
    parts
}

fn parse_or(input: &str) -> Result<IncludeExpr> {
    let groups = split_top_level(input, "||");
    if groups.len() == 1 {
        return parse_and(input);
    }
    let children = groups
        .into_iter()
        .map(parse_and)
        .collect::<Result<Vec<_>>>()?;
    Ok(IncludeExpr::Or(children))
}

fn parse_and(input: &str) -> Result<IncludeExpr> {
    let groups = split_top_level(input, "&&");
    if groups.len() == 1 {
        return parse_comparison(input);
    }
    let children = groups
        .into_iter()
        .map(parse_comparison)
        .collect::<Result<Vec<_>>>()?;
    Ok(IncludeExpr::And(children))
}

fn parse_comparison(input: &str) -> Result<IncludeExpr> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(VcxError::invalid_expression("empty expression group"));
    }

    if let Some(inner) = strip_outer_parens(trimmed)? {
        return parse_or(inner);
    }

    let (key, op, literal) = split_comparison(trimmed)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(VcxError::invalid_expression(format!(
            "comparison is missing a field name: {trimmed}"
        )));
    }
    let literal = literal.trim();
    let value = unquote(literal);
    if value.is_empty() {
        return Err(VcxError::invalid_expression(format!(
            "comparison is missing a value: {trimmed}"
        )));
    }
    let was_quoted = value.len() != literal.len();
    if !was_quoted && value.parse::<f64>().is_err() {
        return Err(VcxError::invalid_expression(format!(
            "literal is neither a number nor quoted: {literal}"
        )));
    }

    Ok(IncludeExpr::Comparison {
        key: key.to_string(),
        op,
        value: value.to_string(),
    })
}

/// Unwraps one level of matching parentheses around the whole group, if any.
fn strip_outer_parens(trimmed: &str) -> Result<Option<&str>> {
    if !trimmed.starts_with('(') {
        return Ok(None);
    }

    let bytes = trimmed.as_bytes();
    let mut depth = 0_usize;
    let mut quote: Option<u8> = None;
    for (index, &byte) in bytes.iter().enumerate() {
        match quote {
            Some(open) => {
                if byte == open {
                    quote = None;
                }
            }
            None => match byte {
                b'\'' | b'"' => quote = Some(byte),
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        if index == bytes.len() - 1 {
                            return Ok(Some(&trimmed[1..index]));
                        }
                        return Err(VcxError::invalid_expression(format!(
                            "unexpected trailing input after group: {trimmed}"
                        )));
                    }
                }
                _ => {}
            },
        }
    }
    Err(VcxError::invalid_expression("unbalanced parentheses"))
}

fn split_comparison(input: &str) -> Result<(&str, CompareOp, &str)> {
    let bytes = input.as_bytes();
    let mut quote: Option<u8> = None;
    let mut index = 0_usize;

    while index < bytes.len() {
        let byte = bytes[index];
        match quote {
            Some(open) => {
                if byte == open {
                    quote = None;
                }
            }
            None => match byte {
                b'\'' | b'"' => quote = Some(byte),
                b'>' | b'<' => {
                    let (op, width) = if bytes.get(index + 1) == Some(&b'=') {
                        (
                            if byte == b'>' {
                                CompareOp::GreaterEq
                            } else {
                                CompareOp::LessEq
                            },
                            2,
                        )
                    } else {
                        (
                            if byte == b'>' {
                                CompareOp::Greater
                            } else {
                                CompareOp::Less
                            },
                            1,
                        )
                    };
                    return Ok((&input[..index], op, &input[index + width..]));
                }
                b'=' | b'!' => {
                    if bytes.get(index + 1) == Some(&b'=') {
                        let op = if byte == b'=' {
                            CompareOp::Eq
                        } else {
                            CompareOp::NotEq
                        };
                        return Ok((&input[..index], op, &input[index + 2..]));
                    }
                    return Err(VcxError::invalid_expression(format!(
                        "unsupported comparison operator in: {input}"
                    )));
                }
                _ => {}
            },
        }
        index += 1;
    }

    Err(VcxError::invalid_expression(format!(
        "no comparison operator found in: {input}"
    )))
}

fn unquote(literal: &str) -> &str {
    let bytes = literal.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        if (first == b'\'' || first == b'"') && bytes[bytes.len() - 1] == first {
            return &literal[1..literal.len() - 1];
        }
    }
    literal
}
