use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::ChainName;

/// A config struct which can be partially overridden. The companion `Override`
/// type has every field optional; a set field replaces the default's value,
/// an unset one keeps it. Nested values are replaced whole, never merged.
pub trait Overridable: Clone {
    /// Same fields as `Self`, all optional
    type Override: Clone + Debug + Default;

    /// Apply an override on top of `self`
    fn with_override(&self, over: &Self::Override) -> Self;
}

/// Returns the default with any values overridden for `chain`.
pub fn resolve<T: Overridable>(
    default: &T,
    overrides: &BTreeMap<ChainName, T::Override>,
    chain: ChainName,
) -> T {
    match overrides.get(&chain) {
        Some(over) => default.with_override(over),
        None => default.clone(),
    }
}

/// Allows a "default" config to be specified and any per-chain overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(
    serialize = "T: Serialize, T::Override: Serialize",
    deserialize = "T: Deserialize<'de>, T::Override: Deserialize<'de>"
))]
pub struct ChainOverridableConfig<T: Overridable> {
    /// Config used for every chain
    pub default: T,
    /// Chain specific replacements of individual fields
    #[serde(default)]
    pub chain_overrides: BTreeMap<ChainName, T::Override>,
}

impl<T: Overridable> ChainOverridableConfig<T> {
    /// A config without overrides
    pub fn new(default: T) -> Self {
        Self {
            default,
            chain_overrides: BTreeMap::new(),
        }
    }

    /// Returns the default config with any overriden values specified for the
    /// provided chain.
    pub fn for_chain(&self, chain: ChainName) -> T {
        resolve(&self.default, &self.chain_overrides, chain)
    }
}

/// Declare a config struct along with its `Override` companion, e.g.
///
/// ```
/// hyperlane_infra_core::decl_overridable!(
///     /// Example
///     #[derive(Debug, PartialEq)]
///     pub struct Example {
///         /// A number
///         pub interval: u64,
///     }
/// );
/// let over = ExampleOverride { interval: Some(3) };
/// ```
#[macro_export]
macro_rules! decl_overridable {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $($(#[$tags:meta])* pub $prop:ident: $type:ty,)*
        }
    ) => {
        $crate::paste::paste! {
            $(#[$meta])*
            #[derive(Clone, serde::Serialize, serde::Deserialize)]
            #[serde(rename_all = "camelCase")]
            pub struct $name {
                $(
                    $(#[$tags])*
                    pub $prop: $type,
                )*
            }

            #[doc = "Per-chain override of `" $name "`, every field is optional"]
            #[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
            #[serde(rename_all = "camelCase")]
            pub struct [<$name Override>] {
                $(
                    #[doc = "Replaces `" $prop "` when set"]
                    #[serde(default, skip_serializing_if = "Option::is_none")]
                    pub $prop: Option<$type>,
                )*
            }

            impl $crate::Overridable for $name {
                type Override = [<$name Override>];

                fn with_override(&self, over: &Self::Override) -> Self {
                    Self {
                        $(
                            $prop: over
                                .$prop
                                .clone()
                                .unwrap_or_else(|| self.$prop.clone()),
                        )*
                    }
                }
            }
        }
    };
}
