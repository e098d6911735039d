//! Caller identities and the custody roles they are bound to
use super::batch::BatchStatus;
use super::utils;
use std::fmt;

/// An externally verified caller identity. Compared by equality only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Principal(String);

/// The three custody roles bound on every batch at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Producer,
    Importer,
    Retailer,
}

/// What a caller must hold to pass a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Exactly the principal bound to this role.
    Role(Role),
    /// Any of the three principals bound to the batch.
    Party,
}

impl Principal {
    /// Wrap an address that has already been verified by the identity layer.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }
    /// Mint a fresh address under `hrp`.
    pub fn generate(hrp: &str) -> anyhow::Result<Self> {
        Ok(Self(utils::new_bech32_address(hrp)?))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Role {
    /// The single edge of the status sequence this role may traverse.
    pub fn transition(&self) -> (BatchStatus, BatchStatus) {
        match self {
            Role::Producer => (BatchStatus::Produced, BatchStatus::Sent),
            Role::Importer => (BatchStatus::Sent, BatchStatus::Received),
            Role::Retailer => (BatchStatus::Received, BatchStatus::Delivered),
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Producer => "producer",
            Role::Importer => "importer",
            Role::Retailer => "retailer",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Role(role) => write!(f, "the {role}"),
            Access::Party => f.write_str("a party to the batch"),
        }
    }
}

impl<C> minicbor::Encode<C> for Principal {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(&self.0)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Principal {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(Principal(d.str()?.to_owned()))
    }
}
