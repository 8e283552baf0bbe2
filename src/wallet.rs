//! Wallet address helpers: explorer links, validation, display.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Base58 alphabet, the usual Solana address length range.
    static ref WALLET_RE: Regex = Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").unwrap();
}

/// Solscan account page for a wallet.
pub fn solscan_url(wallet: &str) -> String {
    format!("https://solscan.io/account/{}", wallet)
}

/// GMGN address page for a wallet.
pub fn gmgn_url(wallet: &str) -> String {
    format!("https://gmgn.ai/sol/address/{}", wallet)
}

pub fn is_valid_wallet(wallet: &str) -> bool {
    WALLET_RE.is_match(wallet)
}

/// Shorten an address for display: `start` leading and `end` trailing
/// characters around an ellipsis. Addresses short enough to show whole are
/// returned unchanged.
pub fn format_wallet_address(wallet: &str, start: usize, end: usize) -> String {
    let chars: Vec<char> = wallet.chars().collect();
    if chars.len() <= start + end {
        return wallet.to_string();
    }

    let head: String = chars[..start].iter().collect();
    let tail: String = chars[chars.len() - end..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WALLET: &str = "5Q544fKrFoe6tsEbD7S8EmxGTJYAKtTVhAW5Q5pge4j1";

    #[test]
    fn test_explorer_urls() {
        assert_eq!(
            solscan_url(WALLET),
            format!("https://solscan.io/account/{}", WALLET)
        );
        assert_eq!(
            gmgn_url(WALLET),
            format!("https://gmgn.ai/sol/address/{}", WALLET)
        );
    }

    #[test]
    fn test_wallet_validation() {
        assert!(is_valid_wallet(WALLET));
        // Base58 excludes 0, O, I and l.
        assert!(!is_valid_wallet("0OIl0OIl0OIl0OIl0OIl0OIl0OIl0OIl"));
        assert!(!is_valid_wallet("tooshort"));
        assert!(!is_valid_wallet(""));
    }

    #[test]
    fn test_format_wallet_address() {
        assert_eq!(format_wallet_address(WALLET, 4, 4), "5Q54...e4j1");
        assert_eq!(format_wallet_address("short", 4, 4), "short");
    }
}
