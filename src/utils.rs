//! Identifier helpers for minting principal addresses

use bech32::Bech32m;
use uuid7::uuid7;

/// Human readable prefix used when no other is configured.
pub const DEFAULT_HRP: &str = "olive";

// fresh uuid7, bech32m encoded under the given prefix
pub fn new_bech32_address(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let address = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_carries_prefix() {
        let address = new_bech32_address(DEFAULT_HRP).unwrap();
        assert!(address.starts_with("olive1"));
    }

    #[test]
    fn empty_prefix_is_rejected() {
        assert!(new_bech32_address("").is_err());
    }
}
