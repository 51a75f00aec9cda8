use serde::{Deserialize, Serialize};

/// The payment rails a brand can fund its wallet through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Crypto,
    Card,
    Wire,
    Personal,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Crypto,
        PaymentMethod::Card,
        PaymentMethod::Wire,
        PaymentMethod::Personal,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            PaymentMethod::Crypto => "Crypto",
            PaymentMethod::Card => "Card",
            PaymentMethod::Wire => "Wire Transfer",
            PaymentMethod::Personal => "Personal Wallet",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PaymentMethod::Crypto => "Send USDC from any supported network",
            PaymentMethod::Card => "Pay instantly with a debit or credit card",
            PaymentMethod::Wire => "Bank wire or ACH transfer",
            PaymentMethod::Personal => "Move funds from your personal balance",
        }
    }

    pub fn estimated_time(&self) -> Option<&'static str> {
        match self {
            PaymentMethod::Crypto => Some("~1-5 min"),
            PaymentMethod::Card => Some("Instant"),
            PaymentMethod::Wire => Some("1-3 business days"),
            PaymentMethod::Personal => Some("Instant"),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Crypto => write!(f, "crypto"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Wire => write!(f, "wire"),
            PaymentMethod::Personal => write!(f, "personal"),
        }
    }
}

/// Networks a USDC crypto deposit can arrive on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CryptoNetwork {
    Solana,
    Base,
    Ethereum,
    Polygon,
}

impl CryptoNetwork {
    pub const ALL: [CryptoNetwork; 4] = [
        CryptoNetwork::Solana,
        CryptoNetwork::Base,
        CryptoNetwork::Ethereum,
        CryptoNetwork::Polygon,
    ];

    /// Match a network name from rail metadata, ignoring case and
    /// surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|network| network.to_string().eq_ignore_ascii_case(name))
    }

    /// Human-readable network name.
    pub fn display_name(&self) -> &'static str {
        match self {
            CryptoNetwork::Solana => "Solana",
            CryptoNetwork::Base => "Base",
            CryptoNetwork::Ethereum => "Ethereum",
            CryptoNetwork::Polygon => "Polygon",
        }
    }

    /// Prefix for linking a transaction hash or signature to a block explorer.
    pub fn explorer_tx_url(&self) -> &'static str {
        match self {
            CryptoNetwork::Solana => "https://solscan.io/tx/",
            CryptoNetwork::Base => "https://basescan.org/tx/",
            CryptoNetwork::Ethereum => "https://etherscan.io/tx/",
            CryptoNetwork::Polygon => "https://polygonscan.com/tx/",
        }
    }
}

impl std::fmt::Display for CryptoNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CryptoNetwork::Solana => write!(f, "solana"),
            CryptoNetwork::Base => write!(f, "base"),
            CryptoNetwork::Ethereum => write!(f, "ethereum"),
            CryptoNetwork::Polygon => write!(f, "polygon"),
        }
    }
}
