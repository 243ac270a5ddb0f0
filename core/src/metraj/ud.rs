//! Readers for the numeric form fields of the metraj screen.
//!
//! UD depth lists arrive either comma separated (`"2.0, 7.5"`) or space
//! separated with decimal commas (`"2,0 7,5"`). The comma form is tried
//! first; only if it fails is the string re-read as a whitespace list.

use nom::{
    character::complete::{char, digit1, multispace0, multispace1, one_of},
    combinator::{all_consuming, map_res, opt, recognize},
    multi::separated_list1,
    number::complete::recognize_float,
    sequence::delimited,
    IResult, Parser,
};

use crate::error::MetrajError;

/// Parse a list of UD sample depths.
pub fn parse_ud_depths(input: &str) -> Result<Vec<f64>, MetrajError> {
    let depths = match comma_separated(input) {
        Ok((_, depths)) => depths,
        Err(_) => match whitespace_separated(input) {
            Ok((_, depths)) => depths,
            Err(_) => {
                return Err(parse_error(
                    input,
                    "expected numbers separated by commas or spaces",
                ))
            }
        },
    };

    if depths.is_empty() {
        return Err(parse_error(input, "no depths given"));
    }
    if let Some(bad) = depths.iter().find(|d| !d.is_finite() || **d < 0.0) {
        return Err(parse_error(input, format!("depth {bad} is out of range")));
    }
    Ok(depths)
}

/// Parse a single decimal that may use a comma as the decimal separator.
pub fn parse_decimal(input: &str) -> Option<f64> {
    let result: IResult<&str, f64> =
        all_consuming(delimited(multispace0, decimal_comma_number, multispace0)).parse(input);
    result.ok().map(|(_, value)| value)
}

/// Parse a non-negative integer count.
pub fn parse_count(input: &str) -> Option<u32> {
    let result: IResult<&str, u32> = all_consuming(delimited(
        multispace0,
        map_res(digit1, |s: &str| s.parse::<u32>()),
        multispace0,
    ))
    .parse(input);
    result.ok().map(|(_, value)| value)
}

fn parse_error(input: &str, message: impl Into<String>) -> MetrajError {
    MetrajError::ParseError {
        input: input.to_string(),
        message: message.into(),
    }
}

/// `1.5, 3 ,4.5,`: empty slots between commas are ignored.
fn comma_separated(input: &str) -> IResult<&str, Vec<f64>> {
    let (rest, depths) = all_consuming(delimited(
        multispace0,
        separated_list1(
            delimited(multispace0, char(','), multispace0),
            opt(plain_number),
        ),
        multispace0,
    ))
    .parse(input)?;
    Ok((rest, depths.into_iter().flatten().collect()))
}

/// `1,5 3 4,5`
fn whitespace_separated(input: &str) -> IResult<&str, Vec<f64>> {
    all_consuming(delimited(
        multispace0,
        separated_list1(multispace1, decimal_comma_number),
        multispace0,
    ))
    .parse(input)
}

fn plain_number(input: &str) -> IResult<&str, f64> {
    map_res(recognize_float, |s: &str| s.parse::<f64>()).parse(input)
}

fn decimal_comma_number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize((opt(one_of("+-")), digit1, opt((one_of(".,"), digit1)))),
        |s: &str| s.replace(',', ".").parse::<f64>(),
    )
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comma_list() {
        assert_eq!(parse_ud_depths("2.0, 7.0").unwrap(), vec![2.0, 7.0]);
        assert_eq!(parse_ud_depths("3").unwrap(), vec![3.0]);
        assert_eq!(parse_ud_depths(" 1.5,3 ,4.5, ").unwrap(), vec![1.5, 3.0, 4.5]);
    }

    #[test]
    fn test_whitespace_list_with_decimal_commas() {
        assert_eq!(parse_ud_depths("2,5 7,5").unwrap(), vec![2.5, 7.5]);
        assert_eq!(parse_ud_depths("2.5   7").unwrap(), vec![2.5, 7.0]);
        assert_eq!(parse_ud_depths("\t4,25\n9 ").unwrap(), vec![4.25, 9.0]);
    }

    #[test]
    fn test_bare_decimal_comma_reads_as_two_depths() {
        // Comma splitting wins when every token is a number.
        assert_eq!(parse_ud_depths("2,5").unwrap(), vec![2.0, 5.0]);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            parse_ud_depths("1.5;3"),
            Err(MetrajError::ParseError { .. })
        ));
        assert!(matches!(
            parse_ud_depths("abc"),
            Err(MetrajError::ParseError { .. })
        ));
        assert!(matches!(
            parse_ud_depths(" , "),
            Err(MetrajError::ParseError { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_depth() {
        let result = parse_ud_depths("1.5, -2");
        match result {
            Err(MetrajError::ParseError { message, .. }) => {
                assert_eq!(message, "depth -2 is out of range")
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("12.5"), Some(12.5));
        assert_eq!(parse_decimal(" 12,5 "), Some(12.5));
        assert_eq!(parse_decimal("20"), Some(20.0));
        assert_eq!(parse_decimal("-3"), Some(-3.0));
        assert_eq!(parse_decimal("12.5m"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("2"), Some(2));
        assert_eq!(parse_count(" 10 "), Some(10));
        assert_eq!(parse_count("two"), None);
        assert_eq!(parse_count("-1"), None);
    }
}
