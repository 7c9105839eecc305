//! Conversions between unit counts and scores.

/// A unit count as a score operand. Counts past `u32::MAX` saturate.
pub(crate) fn units(value: u64) -> f64 {
    u32::try_from(value).map_or(f64::from(u32::MAX), f64::from)
}

/// `pct` percent of `holding`, rounded half up, at least one unit and at
/// most the holding. Zero when nothing is held.
pub(crate) fn share_of(holding: u32, pct: u32) -> u32 {
    if holding == 0 {
        return 0;
    }
    let scaled = u64::from(holding)
        .saturating_mul(u64::from(pct))
        .saturating_add(50)
        .checked_div(100)
        .unwrap_or(0);
    u32::try_from(scaled).unwrap_or(holding).clamp(1, holding)
}
