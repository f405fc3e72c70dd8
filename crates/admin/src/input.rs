use board::MAX_PRICE;

/// Reads a price from loosely typed text: every non-digit is dropped and an
/// empty remainder means zero. `"82.500.000"` reads as `82500000`.
pub fn normalize_price(raw: &str) -> u64 {
    raw.chars()
        .filter_map(|ch| ch.to_digit(10))
        .fold(0u64, |acc, digit| {
            acc.saturating_mul(10)
                .saturating_add(u64::from(digit))
                .min(MAX_PRICE)
        })
}
