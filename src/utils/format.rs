// Currency and address formatting for display. Pure functions, no
// business logic.

use ethers::types::{Address, U256};
use ethers::utils::format_ether;

/// Shorten an address to the `0x1234...abcd` form used in the UI.
pub fn short_address(address: &Address) -> String {
    let full = format!("{address:#x}");
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// Whole-rupee amount with en-IN digit grouping: the last three digits,
/// then groups of two (`1234567` -> `₹12,34,567`).
pub fn format_inr(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{digits}");
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let head_bytes = head.as_bytes();
    let mut end = head_bytes.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("₹{},{}", groups.join(","), tail)
}

/// Render a wei amount as ETH, trimming trailing zeros from the decimal
/// expansion (`1000000000000` wei -> `0.000001 ETH`).
pub fn format_eth(wei: U256) -> String {
    let mut eth = format_ether(wei);
    if eth.contains('.') {
        eth = eth
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string();
    }
    format!("{eth} ETH")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_address_keeps_prefix_and_suffix() {
        let address: Address = "0x1BeB7894f17024A1D5f3D5aa079aCAE180e0fc4E"
            .parse()
            .unwrap();
        assert_eq!(short_address(&address), "0x1beb...fc4e");
    }

    #[test]
    fn inr_uses_indian_grouping() {
        assert_eq!(format_inr(0), "₹0");
        assert_eq!(format_inr(500), "₹500");
        assert_eq!(format_inr(2200), "₹2,200");
        assert_eq!(format_inr(54321), "₹54,321");
        assert_eq!(format_inr(1_234_567), "₹12,34,567");
        assert_eq!(format_inr(100_000_000), "₹10,00,00,000");
    }

    #[test]
    fn eth_rendering_trims_trailing_zeros() {
        assert_eq!(format_eth(U256::from(1_000_000_000_000u64)), "0.000001 ETH");
        assert_eq!(format_eth(U256::from(3_000_000_000_000u64)), "0.000003 ETH");
        assert_eq!(format_eth(U256::zero()), "0 ETH");
        assert_eq!(format_eth(U256::exp10(18)), "1 ETH");
    }
}
