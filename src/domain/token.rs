//! Token reference table for Base mainnet.
//!
//! Static metadata (address, symbol, decimals) with no lifecycle.
//! The native asset is represented by the zero address; each quote
//! provider has its own convention for it, exposed as helper methods.

use alloy::primitives::{Address, address};
use serde::{Deserialize, Serialize};

/// Wrapped ether on Base (OP-stack predeploy).
pub const WETH_ADDRESS: Address = address!("4200000000000000000000000000000000000006");

/// Sentinel Odos uses for the native asset.
pub const ODOS_NATIVE_ADDRESS: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Known DEX routers on Base, used to label `getDexRouters` output.
pub const DEX_ROUTERS: [(&str, Address); 4] = [
    ("Uniswap V3", address!("2626664c2603336E57B271c5C0b26F421741e481")),
    ("Aerodrome", address!("cF77a3Ba9A5CA399B7c97c74d54e5b1Beb874E43")),
    ("BaseSwap", address!("327Df1E6de05895d2ab08513aaDD9313Fe505d86")),
    ("SushiSwap", address!("6BDED42c6DA8FBf0d2bA55B2fa120C5e0c8D7891")),
];

/// Label a router address with its DEX name, if known.
pub fn router_name(router: Address) -> Option<&'static str> {
    DEX_ROUTERS
        .iter()
        .find(|(_, addr)| *addr == router)
        .map(|(name, _)| *name)
}

/// Fungible token metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Contract address (zero address for native ETH).
    pub address: Address,
    /// Ticker symbol.
    pub symbol: String,
    /// Human-readable name.
    pub name: String,
    /// ERC-20 decimals.
    pub decimals: u8,
}

impl Token {
    fn known(address: Address, symbol: &str, name: &str, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            name: name.to_string(),
            decimals,
        }
    }

    /// Placeholder metadata for an address missing from the table.
    ///
    /// Symbol is the first 6 characters of the address, decimals 18.
    pub fn unknown(address: Address) -> Self {
        let text = address.to_string();
        Self {
            address,
            symbol: text.chars().take(6).collect(),
            name: text,
            decimals: 18,
        }
    }

    /// Whether this is the chain's native asset.
    pub fn is_native(&self) -> bool {
        self.address == Address::ZERO
    }

    /// Token identifier for the 0x API (`ETH` for native).
    pub fn zeroex_id(&self) -> String {
        if self.is_native() {
            "ETH".to_string()
        } else {
            self.address.to_string()
        }
    }

    /// Token address for the Odos API.
    pub fn odos_address(&self) -> Address {
        if self.is_native() {
            ODOS_NATIVE_ADDRESS
        } else {
            self.address
        }
    }

    /// Token address for spot-price lookups (native priced as WETH).
    pub fn price_address(&self) -> Address {
        if self.is_native() {
            WETH_ADDRESS
        } else {
            self.address
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Lookup table over the tokens the client knows about.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<Token>,
}

impl TokenRegistry {
    /// The built-in Base mainnet token list.
    pub fn base() -> Self {
        let tokens = vec![
            Token::known(Address::ZERO, "ETH", "Ethereum", 18),
            Token::known(WETH_ADDRESS, "WETH", "Wrapped Ether", 18),
            Token::known(
                address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
                "USDC",
                "USD Coin",
                6,
            ),
            Token::known(
                address!("d9aAEc86B65D86f6A7B5B1b0c42FFA531710b6CA"),
                "USDbC",
                "USD Base Coin",
                6,
            ),
            Token::known(
                address!("50c5725949A6F0c72E6C4a641F24049A917DB0Cb"),
                "DAI",
                "Dai Stablecoin",
                18,
            ),
            Token::known(
                address!("2Ae3F1Ec7F1F5012CFEab0185bfc7aa3cf0DEc22"),
                "cbETH",
                "Coinbase Wrapped Staked ETH",
                18,
            ),
            Token::known(
                address!("940181a94A35A4569E4529A3CDfB74e38FD98631"),
                "AERO",
                "Aerodrome",
                18,
            ),
            Token::known(
                address!("532f27101965dd16442E59d40670FaF5eBB142E4"),
                "BRETT",
                "Brett",
                18,
            ),
            Token::known(
                address!("4ed4E862860beD51a9570b96d89aF5E1B0Efefed"),
                "DEGEN",
                "Degen",
                18,
            ),
            Token::known(
                address!("AC1Bd2486aAf3B5C0fc3Fd868558b082a531B2B4"),
                "TOSHI",
                "Toshi",
                18,
            ),
        ];
        Self { tokens }
    }

    /// All registered tokens in table order.
    pub fn all(&self) -> &[Token] {
        &self.tokens
    }

    /// Find a token by symbol, case-insensitive.
    pub fn by_symbol(&self, symbol: &str) -> Option<&Token> {
        self.tokens
            .iter()
            .find(|t| t.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Resolve an address to its metadata, falling back to a placeholder.
    pub fn by_address(&self, address: Address) -> Token {
        self.tokens
            .iter()
            .find(|t| t.address == address)
            .cloned()
            .unwrap_or_else(|| Token::unknown(address))
    }

    /// Whether `address` is in the static table.
    pub fn is_known(&self, address: Address) -> bool {
        self.tokens.iter().any(|t| t.address == address)
    }

    /// Resolve user input: a symbol or a hex address.
    ///
    /// Returns `None` only when the text is neither a known symbol
    /// nor a parseable address.
    pub fn resolve(&self, text: &str) -> Option<Token> {
        if let Some(token) = self.by_symbol(text) {
            return Some(token.clone());
        }
        text.parse::<Address>().ok().map(|a| self.by_address(a))
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::base()
    }
}
