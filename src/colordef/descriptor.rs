//! Color descriptor codec
//!
//! A color descriptor is the compact textual identity of a color:
//! `"<class_code>:<field>:<field>..."`. For order-based coloring it is
//! `"obc:<genesis txhash hex>:<genesis outindex>:<genesis height>"`.
//! The class code selects the kernel implementation.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    data_structures::types::TxHash,
    errors::{ColorWalletError, ColorWalletResult},
};

const FIELD_SEPARATOR: char = ':';

/// Known color kernel classes, keyed by their descriptor class code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorClass {
    /// Order-based coloring
    OrderBased,
}

impl ColorClass {
    /// Every supported class; this is the complete kernel registry
    pub const ALL: [ColorClass; 1] = [ColorClass::OrderBased];

    pub fn code(&self) -> &'static str {
        match self {
            ColorClass::OrderBased => "obc",
        }
    }

    /// Number of `:`-separated fields in a descriptor of this class, code included
    pub fn field_count(&self) -> usize {
        match self {
            ColorClass::OrderBased => 4,
        }
    }
}

impl FromStr for ColorClass {
    type Err = ColorWalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.code() == s)
            .ok_or_else(|| ColorWalletError::Parse(format!("unknown color class code '{s}'")))
    }
}

impl Display for ColorClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// The output at which a color is first minted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genesis {
    pub txhash: TxHash,
    pub outindex: u32,
    pub height: u64,
}

impl Genesis {
    pub fn new(txhash: TxHash, outindex: u32, height: u64) -> Self {
        Self {
            txhash,
            outindex,
            height,
        }
    }
}

/// Parsed color descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorDescriptor {
    OrderBased { genesis: Genesis },
}

impl ColorDescriptor {
    pub fn order_based(genesis: Genesis) -> Self {
        Self::OrderBased { genesis }
    }

    pub fn class(&self) -> ColorClass {
        match self {
            Self::OrderBased { .. } => ColorClass::OrderBased,
        }
    }

    pub fn genesis(&self) -> &Genesis {
        match self {
            Self::OrderBased { genesis } => genesis,
        }
    }

    /// Class code of a descriptor string without parsing the rest of it
    pub fn class_code_of(desc: &str) -> &str {
        desc.split(FIELD_SEPARATOR).next().unwrap_or_default()
    }

    pub fn parse(desc: &str) -> ColorWalletResult<Self> {
        let class: ColorClass = Self::class_code_of(desc).parse()?;
        let fields: Vec<&str> = desc.split(FIELD_SEPARATOR).collect();
        if fields.len() != class.field_count() {
            return Err(ColorWalletError::Parse(format!(
                "'{desc}': {class} descriptor needs {} fields, got {}",
                class.field_count(),
                fields.len()
            )));
        }

        match class {
            ColorClass::OrderBased => {
                let txhash = TxHash::from_hex(fields[1])
                    .map_err(|e| ColorWalletError::Parse(format!("'{desc}': genesis txhash: {e}")))?;
                let outindex = fields[2].parse::<u32>().map_err(|e| {
                    ColorWalletError::Parse(format!("'{desc}': genesis outindex: {e}"))
                })?;
                let height = fields[3]
                    .parse::<u64>()
                    .map_err(|e| ColorWalletError::Parse(format!("'{desc}': genesis height: {e}")))?;
                Ok(Self::order_based(Genesis::new(txhash, outindex, height)))
            }
        }
    }
}

impl FromStr for ColorDescriptor {
    type Err = ColorWalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for ColorDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OrderBased { genesis } => write!(
                f,
                "{}:{}:{}:{}",
                self.class(),
                genesis.txhash,
                genesis.outindex,
                genesis.height
            ),
        }
    }
}

impl Serialize for ColorDescriptor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColorDescriptor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLUE: &str = "obc:b1586cd10b32f78795b86e9a3febe58dcb59189175fad884a7f4a6623b77486e:0:46442";

    #[test]
    fn test_parse_obc_descriptor() {
        let desc: ColorDescriptor = BLUE.parse().unwrap();
        assert_eq!(desc.class(), ColorClass::OrderBased);
        let genesis = desc.genesis();
        assert_eq!(
            genesis.txhash.to_hex(),
            "b1586cd10b32f78795b86e9a3febe58dcb59189175fad884a7f4a6623b77486e"
        );
        assert_eq!(genesis.outindex, 0);
        assert_eq!(genesis.height, 46442);
        assert_eq!(desc.to_string(), BLUE);
    }

    #[test]
    fn test_unknown_class_code() {
        let err = ColorDescriptor::parse("epobc:aa:0:1").unwrap_err();
        assert!(matches!(err, ColorWalletError::Parse(ref m) if m.contains("unknown color class")));
        assert!(ColorDescriptor::parse("").is_err());
    }

    #[test]
    fn test_field_count_mismatch() {
        assert!(ColorDescriptor::parse("obc:b1586cd10b32f78795b86e9a3febe58dcb59189175fad884a7f4a6623b77486e:0").is_err());
        assert!(ColorDescriptor::parse(&format!("{BLUE}:7")).is_err());
    }

    #[test]
    fn test_malformed_fields() {
        assert!(ColorDescriptor::parse("obc:nothex:0:1").is_err());
        assert!(ColorDescriptor::parse(
            "obc:b1586cd10b32f78795b86e9a3febe58dcb59189175fad884a7f4a6623b77486e:x:1"
        )
        .is_err());
        assert!(ColorDescriptor::parse(
            "obc:b1586cd10b32f78795b86e9a3febe58dcb59189175fad884a7f4a6623b77486e:0:-5"
        )
        .is_err());
    }

    #[test]
    fn test_class_code_of() {
        assert_eq!(ColorDescriptor::class_code_of(BLUE), "obc");
        assert_eq!(ColorDescriptor::class_code_of(""), "");
    }

    #[test]
    fn test_descriptor_serde_as_string() {
        let desc: ColorDescriptor = BLUE.parse().unwrap();
        let json = serde_json::to_string(&desc).unwrap();
        assert_eq!(json, format!("\"{BLUE}\""));
        assert!(serde_json::from_str::<ColorDescriptor>("\"xyz:1\"").is_err());
    }
}
