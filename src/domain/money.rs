use serde::{Deserialize, Deserializer, Serializer};
use thiserror::Error;

/// Amounts are whole cents. Sums stay exact no matter how many
/// transactions are added up.
pub type Cents = i64;

/// Largest amount a single transaction may carry: 100 billion in whole units.
/// Over 900,000 transactions at this cap still sum within `i64`.
pub const MAX_AMOUNT_CENTS: Cents = 10_000_000_000_000;

/// Render cents with two decimals, e.g. `-1234` as `-12.34`.
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

/// Parse a decimal amount such as `"300"`, `"12.5"` or `".99"` into cents.
///
/// Anything that is not a plain decimal with at most two fractional digits is
/// rejected. Extra precision is an error rather than being truncated away.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, decimal_str) = match digits.split_once('.') {
        Some((units, decimals)) => (units, decimals),
        None => (digits, ""),
    };

    if units_str.is_empty() && decimal_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    if !units_str.bytes().all(|b| b.is_ascii_digit())
        || !decimal_str.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseCentsError::Overflow)?
    };

    let decimal_cents: i64 = match decimal_str.len() {
        0 => 0,
        // "12.5" is 12.50
        1 => decimal_str.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10,
        2 => decimal_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?,
        _ => return Err(ParseCentsError::TooPrecise),
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::Overflow)?;
    Ok(if negative { -cents } else { cents })
}

/// Serde helpers writing cents as a decimal string (`"12.34"`), the same
/// shape transaction records use for `amount`.
pub mod decimal {
    use super::*;

    pub fn serialize<S: Serializer>(cents: &Cents, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_cents(*cents))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cents, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_cents(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    #[error("invalid money format")]
    InvalidFormat,

    #[error("more than two decimal places")]
    TooPrecise,

    #[error("amount is too large")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(100000), "1000.00");
        assert_eq!(format_cents(20050), "200.50");
        assert_eq!(format_cents(7), "0.07");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-1501), "-15.01");
        assert_eq!(format_cents(i64::MIN), "-92233720368547758.08");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("300"), Ok(30000));
        assert_eq!(parse_cents("1000.00"), Ok(100000));
        assert_eq!(parse_cents("45.99"), Ok(4599));
        assert_eq!(parse_cents("200.5"), Ok(20050));
        assert_eq!(parse_cents("12."), Ok(1200));
        assert_eq!(parse_cents(".99"), Ok(99));
        assert_eq!(parse_cents(" 7.25 "), Ok(725));
        assert_eq!(parse_cents("-15.01"), Ok(-1501));
    }

    #[test]
    fn test_parse_cents_rejects_malformed_input() {
        assert_eq!(parse_cents("abc"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("12.34.56"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents(""), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("-"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("."), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("NaN"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("1e3"), Err(ParseCentsError::InvalidFormat));
        assert_eq!(parse_cents("+5"), Err(ParseCentsError::InvalidFormat));
    }

    #[test]
    fn test_parse_cents_rejects_extra_precision() {
        assert_eq!(parse_cents("100.999"), Err(ParseCentsError::TooPrecise));
    }

    #[test]
    fn test_parse_cents_overflow() {
        assert_eq!(
            parse_cents("99999999999999999999"),
            Err(ParseCentsError::Overflow)
        );
        assert_eq!(
            parse_cents("92233720368547758.08"),
            Err(ParseCentsError::Overflow)
        );
    }

    #[test]
    fn test_decimal_serde() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Wrapper(#[serde(with = "decimal")] Cents);

        assert_eq!(serde_json::to_string(&Wrapper(4599)).unwrap(), r#""45.99""#);
        assert_eq!(serde_json::from_str::<Wrapper>(r#""0.5""#).unwrap().0, 50);
        assert!(serde_json::from_str::<Wrapper>(r#""abc""#).is_err());
    }
}
