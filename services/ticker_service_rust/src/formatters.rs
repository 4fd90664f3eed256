use blockclock_rust_core::utils::format_grouped;
use blockclock_rust_core::{trigger, PriceReading, TokenConfig, Trigger};

pub fn alert_subject(token: &TokenConfig) -> String {
    format!("ALERT - {}", token.symbol)
}

/// HTML alert body. The first line is always `{currency} {price}`.
pub fn alert_body(token: &TokenConfig, reading: &PriceReading) -> String {
    let mut lines = vec![
        format!(
            "{} {}",
            token.quote_currency,
            format_grouped(reading.price, 6)
        ),
        format!("24h: {:+.2}%", reading.percent_change_24h),
        format!("Market cap: {}", format_grouped(reading.market_cap, 0)),
    ];

    if let Some(hit) = trigger(reading, token) {
        lines.push(trigger_line(token, hit));
    }

    if let Some(ts) = reading.last_updated() {
        lines.push(format!("Updated: {}", ts.format("%Y-%m-%d %H:%M:%S UTC")));
    }

    lines.join("<br>\n")
}

fn trigger_line(token: &TokenConfig, hit: Trigger) -> String {
    match hit {
        Trigger::PriceAbove => format!("Trigger: above {}", format_grouped(token.price_above, 2)),
        Trigger::PriceBelow => format!("Trigger: below {}", format_grouped(token.price_below, 2)),
        Trigger::PercentAbove => format!("Trigger: 24h change above {:+}%", token.percent_change),
        Trigger::PercentBelow => format!("Trigger: 24h change below {:+}%", -token.percent_change),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockclock_rust_core::FeedKind;

    fn token() -> TokenConfig {
        TokenConfig {
            feed: FeedKind::Coingecko,
            symbol: "ETH".to_string(),
            display_currency: "USD".to_string(),
            contract_address: "ethereum".to_string(),
            quote_currency: "usd".to_string(),
            price_above: 3000.0,
            price_below: 0.0,
            percent_change: 5.0,
            notify_enabled: true,
            dwell_seconds: 30,
        }
    }

    fn reading() -> PriceReading {
        PriceReading {
            price: 3123.456789,
            market_cap: 375_000_000_000.4,
            volume: 12_000_000_000.0,
            percent_change_24h: -1.234,
            last_updated_epoch: 1_700_000_000,
        }
    }

    #[test]
    fn test_subject() {
        assert_eq!(alert_subject(&token()), "ALERT - ETH");
    }

    #[test]
    fn test_body_lines() {
        let body = alert_body(&token(), &reading());
        let lines: Vec<&str> = body.split("<br>\n").collect();

        assert_eq!(lines[0], "usd 3,123.456789");
        assert_eq!(lines[1], "24h: -1.23%");
        assert_eq!(lines[2], "Market cap: 375,000,000,000");
        assert_eq!(lines[3], "Trigger: above 3,000.00");
        assert_eq!(lines[4], "Updated: 2023-11-14 22:13:20 UTC");
    }

    #[test]
    fn test_body_percent_trigger() {
        let reading = PriceReading {
            price: 2000.0,
            percent_change_24h: -7.5,
            ..reading()
        };
        let body = alert_body(&token(), &reading);
        assert!(body.contains("24h: -7.50%"));
        assert!(body.contains("Trigger: 24h change below -5%"));
    }

    #[test]
    fn test_body_names_percent_rule_when_price_threshold_not_hit() {
        // price_above is 3000 but only the +5% rule fired
        let reading = PriceReading {
            price: 2000.0,
            percent_change_24h: 6.0,
            ..reading()
        };
        let body = alert_body(&token(), &reading);
        assert!(body.contains("Trigger: 24h change above +5%"));
        assert!(!body.contains("Trigger: above 3,000.00"));
    }

    #[test]
    fn test_body_without_timestamp() {
        let reading = PriceReading {
            price: 2000.0,
            last_updated_epoch: 0,
            ..reading()
        };
        let body = alert_body(&token(), &reading);
        assert!(!body.contains("Updated"));
        assert!(!body.contains("Trigger"));
        assert!(body.starts_with("usd 2,000.000000<br>"));
    }
}
