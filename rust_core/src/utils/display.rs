//! Price rendering for the BlockClock's fixed-width digit display.
//!
//! The device has room for six digits. Separators (`,` and `.`) are drawn
//! between the digit cells, so they do not consume a cell.
//!
//! # Usage
//!
//! ```rust
//! use blockclock_rust_core::utils::display::format_price;
//!
//! assert_eq!(format_price(1234.5), "1,234.50");
//! assert_eq!(format_price(0.0), "0.00000");
//! ```

/// Number of digit cells on the display
pub const DISPLAY_DIGITS: usize = 6;

/// Decimal places rendered before truncation
pub const PRICE_DECIMALS: usize = 6;

/// Format a price for the device's large-text display.
///
/// Renders with [`PRICE_DECIMALS`] places and thousands grouping, pads one
/// trailing zero, then cuts the string right after the sixth digit. Prices of
/// a million or more never reach the decimal point.
///
/// The cut lands after the sixth digit, not just before a seventh, so
/// six-figure prices render as `"123,456"` and never as `"123,456."` with a
/// dangling separator.
pub fn format_price(price: f64) -> String {
    let mut rendered = format_grouped(price, PRICE_DECIMALS);
    rendered.push('0');
    truncate_digits(&rendered, DISPLAY_DIGITS).to_string()
}

/// Render `value` with `decimals` places and `,` between integer thousands.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let plain = format!("{:.*}", decimals, value);
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let mut out = String::with_capacity(plain.len() + int_part.len() / 3);
    out.push_str(sign);
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Longest prefix of `s` holding at most `max_digits` ASCII digits, ending on a digit.
fn truncate_digits(s: &str, max_digits: usize) -> &str {
    let mut seen = 0;
    for (idx, ch) in s.char_indices() {
        if ch.is_ascii_digit() {
            seen += 1;
            if seen == max_digits {
                return &s[..idx + ch.len_utf8()];
            }
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digit_count(s: &str) -> usize {
        s.chars().filter(|c| c.is_ascii_digit()).count()
    }

    #[test]
    fn test_format_price_table() {
        let cases = [
            (0.0, "0.00000"),
            (0.5, "0.50000"),
            (0.001234, "0.00123"),
            (1.0, "1.00000"),
            (42.42, "42.4200"),
            (150.0, "150.000"),
            (1234.5, "1,234.50"),
            (99_999.99, "99,999.9"),
            (123_456.7, "123,456"),
            (999_999.0, "999,999"),
            (1_000_000.0, "1,000,00"),
            (12_345_678.9, "12,345,6"),
        ];

        for (price, expected) in cases {
            assert_eq!(format_price(price), expected, "price {}", price);
        }
    }

    #[test]
    fn test_six_figure_prices_have_no_dangling_separator() {
        for price in [100_000.0, 123_456.7, 500_000.5, 999_999.99] {
            let out = format_price(price);
            assert!(!out.ends_with('.') && !out.ends_with(','), "{} rendered as {}", price, out);
            assert_eq!(digit_count(&out), DISPLAY_DIGITS);
        }
    }

    #[test]
    fn test_format_price_digit_bound() {
        let mut price = 0.000_001;
        while price < 1e12 {
            let out = format_price(price);
            assert!(
                digit_count(&out) <= DISPLAY_DIGITS,
                "{} rendered as {}",
                price,
                out
            );
            price *= 3.7;
        }
    }

    #[test]
    fn test_large_prices_drop_decimals() {
        assert!(!format_price(2_500_000.25).contains('.'));
        assert!(!format_price(123_456.789).contains('.'));
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(1234.5, 6), "1,234.500000");
        assert_eq!(format_grouped(1_234_567.0, 2), "1,234,567.00");
        assert_eq!(format_grouped(999.0, 0), "999");
        assert_eq!(format_grouped(-12_345.5, 1), "-12,345.5");
    }
}
