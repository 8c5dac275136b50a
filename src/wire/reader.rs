use crate::cons::{build_dotted, build_quoted};
use crate::error::{BridgeError, BridgeResult, SyntaxError};
use crate::session::Session;
use crate::value::{HashTable, Value};
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{cut, map, map_res, opt, verify},
    error::{Error as NomError, ErrorKind},
    multi::many0,
    sequence::{pair, preceded, terminated},
    IResult, Parser as NomParser,
};
use num_bigint::BigInt;
use num_complex::Complex64;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};

/// Syntax tree of one wire expression, before atoms are classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Atom(String),
    Text(String),
    List {
        items: Vec<Datum>,
        tail: Option<Box<Datum>>,
    },
    Vector(Vec<Datum>),
    Table(Vec<Datum>),
    Complex(Box<Datum>, Box<Datum>),
    Handle(u64),
    Quoted(Box<Datum>),
}

/// Parses exactly one expression, allowing surrounding whitespace.
pub fn parse_wire(source: &str) -> Result<Datum, SyntaxError> {
    match terminated(datum, multispace0).parse(source) {
        Ok(("", parsed)) => Ok(parsed),
        Ok((rest, _)) => {
            let start = source.len() - rest.len();
            Err(
                SyntaxError::new("Unexpected input after expression", start..source.len())
                    .with_help("A reply must contain a single expression"),
            )
        }
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
            Err(describe_failure(source, err))
        }
        Err(nom::Err::Incomplete(_)) => Err(SyntaxError::new(
            "Unexpected end of input",
            source.len()..source.len(),
        )),
    }
}

fn describe_failure(source: &str, err: NomError<&str>) -> SyntaxError {
    let rest = err.input.trim_start();
    let start = source.len() - rest.len();
    match rest.chars().next() {
        None => SyntaxError::new("Unexpected end of input", start..start)
            .with_help("Check that every `(` has a matching `)`"),
        Some('"') => SyntaxError::new("Unterminated string literal", start..source.len()),
        Some(c @ (')' | '}')) => {
            SyntaxError::new(format!("Unbalanced `{c}`"), start..start + 1)
        }
        Some(c) => SyntaxError::new(
            format!("Malformed expression at `{c}`"),
            start..start + c.len_utf8(),
        ),
    }
}

fn datum(input: &str) -> IResult<&str, Datum> {
    preceded(
        multispace0,
        alt((text, handle, complex, vector, table, list, quoted, atom)),
    )
    .parse(input)
}

fn text(input: &str) -> IResult<&str, Datum> {
    let (mut rest, _) = char('"')(input)?;
    let mut out = String::new();
    loop {
        let mut chars = rest.chars();
        match chars.next() {
            Some('"') => return Ok((chars.as_str(), Datum::Text(out))),
            Some('\\') => match chars.next() {
                Some(escaped) => out.push(escaped),
                None => return Err(nom::Err::Failure(NomError::new(input, ErrorKind::Escaped))),
            },
            Some(c) => out.push(c),
            None => return Err(nom::Err::Failure(NomError::new(input, ErrorKind::Char))),
        }
        rest = chars.as_str();
    }
}

fn handle(input: &str) -> IResult<&str, Datum> {
    map_res(
        preceded(char('#'), terminated(digit1, char('?'))),
        |digits: &str| digits.parse::<u64>().map(Datum::Handle),
    )
    .parse(input)
}

fn complex(input: &str) -> IResult<&str, Datum> {
    map(
        preceded(tag_no_case("#C("), cut(terminated(pair(datum, datum), close_paren))),
        |(re, im)| Datum::Complex(Box::new(re), Box::new(im)),
    )
    .parse(input)
}

fn vector(input: &str) -> IResult<&str, Datum> {
    map(
        preceded(tag("#("), cut(terminated(many0(datum), close_paren))),
        Datum::Vector,
    )
    .parse(input)
}

fn table(input: &str) -> IResult<&str, Datum> {
    map(
        preceded(tag("#{"), cut(terminated(many0(datum), close_brace))),
        Datum::Table,
    )
    .parse(input)
}

fn list(input: &str) -> IResult<&str, Datum> {
    let (input, _) = char('(')(input)?;
    let (input, items) = many0(datum).parse(input)?;
    let dot_position = input;
    let (input, tail) = opt(preceded(preceded(multispace0, char('.')), cut(datum))).parse(input)?;
    if items.is_empty() && tail.is_some() {
        return Err(nom::Err::Failure(NomError::new(
            dot_position,
            ErrorKind::Verify,
        )));
    }
    let (input, _) = cut(close_paren).parse(input)?;
    Ok((
        input,
        Datum::List {
            items,
            tail: tail.map(Box::new),
        },
    ))
}

fn quoted(input: &str) -> IResult<&str, Datum> {
    map(preceded(char('\''), cut(datum)), |inner| {
        Datum::Quoted(Box::new(inner))
    })
    .parse(input)
}

fn atom(input: &str) -> IResult<&str, Datum> {
    map(
        verify(take_while1(is_atom_char), |token: &str| token != "."),
        |token: &str| Datum::Atom(token.to_string()),
    )
    .parse(input)
}

fn close_paren(input: &str) -> IResult<&str, char> {
    preceded(multispace0, char(')')).parse(input)
}

fn close_brace(input: &str) -> IResult<&str, char> {
    preceded(multispace0, char('}')).parse(input)
}

fn is_atom_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '"' | '\'' | ';' | '{' | '}')
}

/// Turns wire text into host values.
///
/// An unbound reader rejects handle tokens; a reader bound to a session
/// turns them into live handles on that session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reader<'s> {
    session: Option<&'s Session>,
}

impl<'s> Reader<'s> {
    pub fn new() -> Self {
        Self { session: None }
    }

    pub fn bound_to(session: &'s Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn read(&self, source: &str) -> BridgeResult<Value> {
        let parsed = parse_wire(source)?;
        self.decode(parsed)
    }

    pub fn decode(&self, datum: Datum) -> BridgeResult<Value> {
        match datum {
            Datum::Atom(token) => classify_atom(&token),
            Datum::Text(text) => Ok(Value::String(text)),
            Datum::List { items, tail } => {
                let terminal = match tail {
                    Some(tail) => self.decode(*tail)?,
                    None => Value::Nil,
                };
                Ok(build_dotted(self.decode_all(items)?, terminal))
            }
            Datum::Vector(items) => Ok(Value::Vector(self.decode_all(items)?)),
            Datum::Table(items) => {
                if items.len() % 2 != 0 {
                    return Err(BridgeError::unsupported(
                        "hash-table literal with an odd number of elements",
                    ));
                }
                let mut values = self.decode_all(items)?.into_iter();
                let mut table = HashTable::new();
                while let (Some(key), Some(value)) = (values.next(), values.next()) {
                    table.push_unchecked(key, value);
                }
                Ok(Value::HashTable(table))
            }
            Datum::Complex(re, im) => {
                let re = complex_part(self.decode(*re)?)?;
                let im = complex_part(self.decode(*im)?)?;
                Ok(Value::Complex(Complex64::new(re, im)))
            }
            Datum::Handle(id) => match self.session {
                Some(session) => Ok(Value::Handle(session.handle(id))),
                None => Err(BridgeError::unsupported(format!(
                    "handle #{id}? read outside a session"
                ))),
            },
            Datum::Quoted(inner) => Ok(build_quoted(self.decode(*inner)?)),
        }
    }

    fn decode_all(&self, items: Vec<Datum>) -> BridgeResult<Vec<Value>> {
        items.into_iter().map(|item| self.decode(item)).collect()
    }
}

/// Decodes one wire expression without a session.
pub fn from_wire(source: &str) -> BridgeResult<Value> {
    Reader::new().read(source)
}

fn complex_part(value: Value) -> BridgeResult<f64> {
    let part = match &value {
        Value::Float(v) => Some(*v),
        Value::Integer(n) => n.to_f64(),
        Value::Ratio(r) => r
            .numer()
            .to_f64()
            .zip(r.denom().to_f64())
            .map(|(n, d)| n / d),
        _ => None,
    };
    part.ok_or_else(|| {
        BridgeError::unsupported(format!(
            "complex part of type {}",
            value.type_name()
        ))
    })
}

fn classify_atom(token: &str) -> BridgeResult<Value> {
    let name = token
        .strip_prefix("CL:")
        .or_else(|| token.strip_prefix("COMMON-LISP:"))
        .unwrap_or(token);
    if name.eq_ignore_ascii_case("T") {
        return Ok(Value::Bool(true));
    }
    if name.eq_ignore_ascii_case("NIL") {
        return Ok(Value::Nil);
    }
    if let Some(n) = parse_integer(token) {
        return Ok(Value::Integer(n));
    }
    if let Some(ratio) = parse_ratio(token)? {
        return Ok(Value::Ratio(ratio));
    }
    if let Some(v) = parse_float(token) {
        if !v.is_finite() {
            return Err(BridgeError::unsupported(format!(
                "float `{token}` is out of range"
            )));
        }
        return Ok(Value::Float(v));
    }
    if token.starts_with('#') {
        return Err(BridgeError::unsupported(format!(
            "unrecognized token `{token}`"
        )));
    }
    Ok(Value::Symbol(token.to_string()))
}

fn split_sign(token: &str) -> (bool, &str) {
    match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    }
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn signed_digits(token: &str) -> Option<BigInt> {
    let (negative, digits) = split_sign(token);
    if !all_digits(digits) {
        return None;
    }
    let magnitude = BigInt::parse_bytes(digits.as_bytes(), 10)?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Decimal integers; a trailing `.` still means integer.
fn parse_integer(token: &str) -> Option<BigInt> {
    signed_digits(token.strip_suffix('.').unwrap_or(token))
}

fn parse_ratio(token: &str) -> BridgeResult<Option<BigRational>> {
    let Some((numer, denom)) = token.split_once('/') else {
        return Ok(None);
    };
    if !all_digits(denom) {
        return Ok(None);
    }
    let Some(numer) = signed_digits(numer) else {
        return Ok(None);
    };
    let denom = BigInt::parse_bytes(denom.as_bytes(), 10).unwrap_or_default();
    if denom.is_zero() {
        return Err(BridgeError::unsupported(format!(
            "ratio `{token}` has a zero denominator"
        )));
    }
    Ok(Some(BigRational::new(numer, denom)))
}

/// Any of the exponent markers. `d`/`l` mark double floats, the rest single
/// floats; both land in `f64` and are read at full precision.
fn parse_float(token: &str) -> Option<f64> {
    let (negative, body) = split_sign(token);
    let split = body
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(body.len());
    let (mantissa, rest) = body.split_at(split);
    if mantissa.matches('.').count() > 1 || !mantissa.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    let exponent = if rest.is_empty() {
        let (_, fraction) = mantissa.split_once('.')?;
        if fraction.is_empty() {
            return None;
        }
        "0"
    } else {
        let mut chars = rest.chars();
        let marker = chars.next()?.to_ascii_lowercase();
        if !matches!(marker, 'e' | 's' | 'f' | 'd' | 'l') {
            return None;
        }
        let exponent = chars.as_str();
        if !all_digits(split_sign(exponent).1) {
            return None;
        }
        exponent
    };
    let sign = if negative { "-" } else { "" };
    format!("{sign}{mantissa}e{exponent}").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cons::build_list;

    fn read(source: &str) -> Value {
        from_wire(source).expect("readable")
    }

    #[test]
    fn truth_and_nil() {
        assert_eq!(read("T"), Value::Bool(true));
        assert_eq!(read("NIL"), Value::Nil);
        assert_eq!(read("nil"), Value::Nil);
        assert_eq!(read("()"), Value::Nil);
        assert_eq!(read("CL:NIL"), Value::Nil);
    }

    #[test]
    fn integers() {
        assert_eq!(read("-42"), Value::from(-42i64));
        assert_eq!(read("+7"), Value::from(7i64));
        assert_eq!(read("12."), Value::from(12i64));
        let big: BigInt = "98765432109876543210987654321".parse().expect("bigint");
        assert_eq!(read("98765432109876543210987654321"), Value::Integer(big));
    }

    #[test]
    fn single_and_double_floats_merge() {
        assert_eq!(read("1.5d0"), Value::from(1.5));
        assert_eq!(read("1.5f0"), read("1.5d0"));
        assert_eq!(read("0.1"), read("0.1d0"));
        assert_eq!(read("1.0e3"), Value::from(1000.0));
        assert_eq!(read("-2.5D-1"), Value::from(-0.25));
        assert_eq!(read(".5"), Value::from(0.5));
        assert!(from_wire("1d400").is_err());
    }

    #[test]
    fn ratios_are_reduced() {
        let expected = BigRational::new(BigInt::from(-1), BigInt::from(2));
        assert_eq!(read("-2/4"), Value::Ratio(expected));
        assert!(matches!(
            from_wire("1/0"),
            Err(BridgeError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn complex_parts_decode_recursively() {
        assert_eq!(
            read("#C(1 1/2)"),
            Value::Complex(Complex64::new(1.0, 0.5))
        );
        assert_eq!(
            read("#c(1.5d0 -2.0f0)"),
            Value::Complex(Complex64::new(1.5, -2.0))
        );
        assert!(from_wire("#C(\"a\" 1)").is_err());
    }

    #[test]
    fn strings_unescape() {
        assert_eq!(read(r#""say \"hi\"""#), Value::from("say \"hi\""));
        assert_eq!(read(r#""a\\b""#), Value::from("a\\b"));
    }

    #[test]
    fn lists_vectors_and_tables() {
        assert_eq!(
            read("(1 (2) . 3)").to_string(),
            "Cons(1, Cons(List(2), 3))"
        );
        assert_eq!(
            read("( 1 2 )"),
            build_list([Value::from(1i64), Value::from(2i64)])
        );
        assert_eq!(
            read("#(1 \"a\")"),
            Value::Vector(vec![Value::from(1i64), Value::from("a")])
        );
        let table = read("#{:A 1 :B 2}");
        let Value::HashTable(table) = table else {
            panic!("expected hash table");
        };
        assert_eq!(table.get(&Value::symbol(":B")), Some(&Value::from(2i64)));
        assert!(from_wire("#{:A}").is_err());
    }

    #[test]
    fn quote_reader_macro() {
        assert_eq!(
            read("'X"),
            build_list([Value::symbol("CL:QUOTE"), Value::symbol("X")])
        );
    }

    #[test]
    fn symbols_and_unknown_dispatch() {
        assert_eq!(read("CL:FUNCALL"), Value::symbol("CL:FUNCALL"));
        assert_eq!(read("1+"), Value::symbol("1+"));
        assert_eq!(read("DEFUN"), Value::symbol("DEFUN"));
        assert!(matches!(
            from_wire("#\\a"),
            Err(BridgeError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn handles_need_a_session() {
        assert!(matches!(
            from_wire("#5?"),
            Err(BridgeError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn syntax_errors_carry_spans() {
        let err = parse_wire("(1 2").unwrap_err();
        assert_eq!(err.message, "Unexpected end of input");
        assert_eq!(err.span, 4..4);

        let err = parse_wire("1 )").unwrap_err();
        assert_eq!(err.span, 2..3);

        let err = parse_wire("  \"open").unwrap_err();
        assert_eq!(err.message, "Unterminated string literal");
        assert_eq!(err.span.start, 2);

        assert!(parse_wire("(. 1)").is_err());
        assert!(parse_wire("").is_err());
    }

    #[test]
    fn long_lists_read_and_compare() {
        let source = format!(
            "({})",
            (0..100_000).map(|n| n.to_string()).collect::<Vec<_>>().join(" ")
        );
        let first = read(&source);
        let second = read(&source);
        assert_eq!(first, second);
        assert_eq!(first.as_cons().map(|cell| cell.len()), Some(100_000));
    }

    #[test]
    fn quote_symbol_ignores_session_config() {
        use crate::config::BridgeConfig;
        use crate::tests::support::RecordingChannel;
        use std::rc::Rc;

        let config = BridgeConfig::from_toml_str("quote_symbol = \"QUOTE\"\n").expect("config");
        let session = Session::with_config(Rc::new(RecordingChannel::default()), config);
        assert_eq!(session.read("'X").expect("readable"), read("'X"));
    }
}
