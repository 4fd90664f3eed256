//! Threshold evaluation for the alert lights
//!
//! Decides which light to show for a reading and whether an alert should go
//! out. Evaluation is stateless: a reading that stays past a threshold lights
//! up (and notifies) on every cycle, there is no hysteresis.

use crate::models::{AlertDecision, LightState, PriceReading, TokenConfig};

/// Which configured condition lit the alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    PriceAbove,
    PercentAbove,
    PriceBelow,
    PercentBelow,
}

impl Trigger {
    pub fn light_state(self) -> LightState {
        match self {
            Self::PriceAbove | Self::PercentAbove => LightState::Above,
            Self::PriceBelow | Self::PercentBelow => LightState::Below,
        }
    }
}

/// Evaluate a reading against its token's thresholds.
///
/// The "above" condition is checked first, so a config where both conditions
/// hold for the same reading always shows [`LightState::Above`]. A threshold
/// of zero disables that check.
pub fn decide(reading: &PriceReading, config: &TokenConfig) -> AlertDecision {
    match trigger(reading, config) {
        Some(hit) => AlertDecision {
            light_state: hit.light_state(),
            notify: config.notify_enabled,
        },
        None => AlertDecision::off(),
    }
}

/// The condition behind [`decide`]'s light, if any.
///
/// Within one direction the price threshold is reported ahead of the percent
/// threshold when both hold.
pub fn trigger(reading: &PriceReading, config: &TokenConfig) -> Option<Trigger> {
    if config.price_above > 0.0 && reading.price >= config.price_above {
        return Some(Trigger::PriceAbove);
    }
    if config.percent_change > 0.0 && reading.percent_change_24h > config.percent_change {
        return Some(Trigger::PercentAbove);
    }
    if config.price_below > 0.0 && reading.price <= config.price_below {
        return Some(Trigger::PriceBelow);
    }
    // Any non-zero percent arms the downside check, including a negative one
    if config.percent_change != 0.0 && reading.percent_change_24h < -config.percent_change {
        return Some(Trigger::PercentBelow);
    }
    None
}
