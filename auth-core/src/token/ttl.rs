use std::time::Duration;

/// Parse a compact TTL string: an integer magnitude followed by one unit
/// character in `{s, m, h, d}` (e.g. `15m`, `7d`).
///
/// Anything that does not match the grammar, including `None`, falls back
/// to the given default rather than failing. One parsed value must feed
/// both the signed `exp` claim and the persisted record expiry so the two
/// can never diverge.
pub fn parse_ttl(value: Option<&str>, fallback: Duration) -> Duration {
    let Some(value) = value else {
        return fallback;
    };

    let Some(unit) = value.chars().last() else {
        return fallback;
    };

    let magnitude = &value[..value.len() - unit.len_utf8()];
    let Ok(amount) = magnitude.parse::<u64>() else {
        return fallback;
    };

    let seconds_per_unit = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return fallback,
    };

    Duration::from_secs(amount * seconds_per_unit)
}
