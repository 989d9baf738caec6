//! Strategy configuration validation, run before a scan.

use crate::domain::error::DipscanError;
use crate::domain::scoring::StrategyConfig;

pub fn validate_strategy_config(config: &StrategyConfig) -> Result<(), DipscanError> {
    validate_windows(config)?;
    validate_rsi_levels(config)?;
    validate_spans(config)?;
    validate_volume_multiplier(config)?;
    validate_volume_period(config)?;
    validate_damage_limit(config)?;
    Ok(())
}

fn invalid(key: &str, reason: &str) -> DipscanError {
    DipscanError::ConfigInvalid {
        section: "strategy".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_windows(config: &StrategyConfig) -> Result<(), DipscanError> {
    if config.primary_window == 0 {
        return Err(invalid("primary_window", "must be at least 1"));
    }
    if config.confirm_window == 0 {
        return Err(invalid("confirm_window", "must be at least 1"));
    }
    if config.confirm_window > config.primary_window {
        return Err(invalid(
            "confirm_window",
            "must not exceed primary_window",
        ));
    }
    Ok(())
}

fn validate_rsi_levels(config: &StrategyConfig) -> Result<(), DipscanError> {
    for (key, value) in [
        ("rsi_oversold", config.rsi_oversold),
        ("rsi_overbought", config.rsi_overbought),
    ] {
        if let Some(v) = value {
            if !(0.0..=100.0).contains(&v) {
                return Err(invalid(key, "must be between 0 and 100"));
            }
        }
    }
    if let (Some(oversold), Some(overbought)) = (config.rsi_oversold, config.rsi_overbought) {
        if oversold >= overbought {
            return Err(invalid(
                "rsi_oversold",
                "must be below rsi_overbought",
            ));
        }
    }
    Ok(())
}

fn validate_spans(config: &StrategyConfig) -> Result<(), DipscanError> {
    if config.rsi_confirm_span == Some(0) {
        return Err(invalid("rsi_confirm_span", "must be at least 1 or off"));
    }
    if config.ha_confirm_count == Some(0) {
        return Err(invalid("ha_confirm_count", "must be at least 1 or off"));
    }
    Ok(())
}

fn validate_volume_multiplier(config: &StrategyConfig) -> Result<(), DipscanError> {
    if let Some(mult) = config.volume_multiplier {
        if mult <= 0.0 {
            return Err(invalid("volume_multiplier", "must be positive or off"));
        }
    }
    Ok(())
}

fn validate_volume_period(config: &StrategyConfig) -> Result<(), DipscanError> {
    // sample std needs two observations
    if config.volume_avg_period < 2 {
        return Err(invalid("volume_avg_period", "must be at least 2"));
    }
    Ok(())
}

fn validate_damage_limit(config: &StrategyConfig) -> Result<(), DipscanError> {
    if let Some(limit) = config.max_below_sma200_pct {
        if !(0.0..100.0).contains(&limit) {
            return Err(invalid(
                "max_below_sma200_pct",
                "must be between 0 and 100 or off",
            ));
        }
    }
    Ok(())
}
