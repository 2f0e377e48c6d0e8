//! Chain parameters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which Bitcoin network to join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// Public test network (testnet3).
    #[default]
    Testnet,
    /// Production network.
    Mainnet,
    /// Local regression-test network.
    Regtest,
}

impl Chain {
    /// Parameters for this chain.
    #[must_use]
    pub fn params(self) -> ChainParams {
        match self {
            Self::Testnet => ChainParams {
                chain: self,
                magic: [0x0b, 0x11, 0x09, 0x07],
                default_port: 18333,
                p2pkh_version: 0x6f,
                p2sh_version: 0xc4,
                dns_seeds: &[
                    "testnet-seed.bitcoin.jonasschnelli.ch",
                    "seed.tbtc.petertodd.net",
                    "seed.testnet.bitcoin.sprovoost.nl",
                    "testnet-seed.bluematt.me",
                ],
            },
            Self::Mainnet => ChainParams {
                chain: self,
                magic: [0xf9, 0xbe, 0xb4, 0xd9],
                default_port: 8333,
                p2pkh_version: 0x00,
                p2sh_version: 0x05,
                dns_seeds: &[
                    "seed.bitcoin.sipa.be",
                    "dnsseed.bluematt.me",
                    "seed.bitcoin.jonasschnelli.ch",
                    "seed.btc.petertodd.net",
                ],
            },
            Self::Regtest => ChainParams {
                chain: self,
                magic: [0xfa, 0xbf, 0xb5, 0xda],
                default_port: 18444,
                p2pkh_version: 0x6f,
                p2sh_version: 0xc4,
                dns_seeds: &[],
            },
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
            Self::Regtest => "regtest",
        })
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" | "testnet3" | "test" => Ok(Self::Testnet),
            "mainnet" | "main" | "bitcoin" => Ok(Self::Mainnet),
            "regtest" => Ok(Self::Regtest),
            other => Err(format!("unknown chain: {other}")),
        }
    }
}

/// Constants that differ between chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainParams {
    /// Chain this belongs to.
    pub chain: Chain,
    /// Message start bytes.
    pub magic: [u8; 4],
    /// Default P2P port.
    pub default_port: u16,
    /// Base58 version byte for pay-to-pubkey-hash.
    pub p2pkh_version: u8,
    /// Base58 version byte for pay-to-script-hash.
    pub p2sh_version: u8,
    /// DNS seeds.
    pub dns_seeds: &'static [&'static str],
}

impl ChainParams {
    /// DNS seeds as `host:port` dial targets.
    #[must_use]
    pub fn seed_targets(&self) -> Vec<String> {
        self.dns_seeds
            .iter()
            .map(|host| format!("{host}:{}", self.default_port))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_testnet_params() {
        let params = Chain::Testnet.params();
        assert_eq!(params.magic, [0x0b, 0x11, 0x09, 0x07]);
        assert_eq!(params.p2pkh_version, 0x6f);
        assert!(params.seed_targets()[0].ends_with(":18333"));
    }

    #[test]
    fn test_chain_parse() {
        assert_eq!("testnet3".parse::<Chain>(), Ok(Chain::Testnet));
        assert_eq!("REGTEST".parse::<Chain>(), Ok(Chain::Regtest));
        assert!("litecoin".parse::<Chain>().is_err());
        assert!(Chain::Regtest.params().seed_targets().is_empty());
    }
}
