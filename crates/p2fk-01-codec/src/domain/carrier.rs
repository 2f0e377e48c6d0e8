//! # Carrier Denominations
//!
//! Outputs whose amount is not one of these exact strings are change or
//! decoys and never contribute payload bytes.

/// Satoshis per coin.
pub const SATS_PER_COIN: u64 = 100_000_000;

/// Allowed carrier amounts, 8-decimal fixed point.
pub const CARRIER_AMOUNTS: [&str; 10] = [
    "0.00000001",
    "0.00000546",
    "0.00000548",
    "0.00005480",
    "0.00000550",
    "0.00005500",
    "0.00001000",
    "0.01000000",
    "0.02000000",
    "1.00000000",
];

/// Amount used by the encoder when none is given.
pub const DEFAULT_CARRIER_SATS: u64 = 5_500;

/// Render satoshis as an 8-decimal coin amount (`5500` -> `"0.00005500"`).
#[must_use]
pub fn format_amount(sats: u64) -> String {
    format!("{}.{:08}", sats / SATS_PER_COIN, sats % SATS_PER_COIN)
}

/// Exact string match against the allow-list.
#[must_use]
pub fn is_carrier_amount(amount: &str) -> bool {
    CARRIER_AMOUNTS.contains(&amount)
}

/// Whether an amount in satoshis is a carrier denomination.
#[must_use]
pub fn is_carrier_sats(sats: u64) -> bool {
    is_carrier_amount(&format_amount(sats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(5_500), "0.00005500");
        assert_eq!(format_amount(1), "0.00000001");
        assert_eq!(format_amount(SATS_PER_COIN), "1.00000000");
        assert_eq!(format_amount(123_456_789_012), "1234.56789012");
    }

    #[test]
    fn test_allow_list_is_exact() {
        assert!(is_carrier_amount("0.00005500"));
        assert!(!is_carrier_amount("0.000055"));
        assert!(!is_carrier_amount("0.00005501"));
        assert!(is_carrier_sats(546));
        assert!(is_carrier_sats(SATS_PER_COIN));
        assert!(!is_carrier_sats(547));
        assert!(is_carrier_sats(DEFAULT_CARRIER_SATS));
    }
}
