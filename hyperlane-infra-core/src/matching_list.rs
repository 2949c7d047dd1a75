use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::marker::PhantomData;

use serde::de::{Error, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ChainName, H160, H256};

/// Defines a set of patterns for determining if a message should or should not
/// be relayed. This is useful for determine if a message matches a given set or
/// rules.
///
/// Valid options for each of the tuple elements are
/// - wildcard "*"
/// - single value in decimal or hex (must start with `0x`) format
/// - list of values in decimal or hex format
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(transparent)]
pub struct MatchingList(Option<Vec<ListElement>>);

/// A single field pattern of a [`ListElement`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filter<T> {
    /// Matches any value
    Wildcard,
    /// Matches any of the listed values
    Enumerated(Vec<T>),
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self::Wildcard
    }
}

impl<T: PartialEq> Filter<T> {
    fn matches(&self, v: &T) -> bool {
        match self {
            Filter::Wildcard => true,
            Filter::Enumerated(list) => list.iter().any(|i| i == v),
        }
    }
}

impl<T> Filter<T> {
    /// A filter matching exactly one value
    pub fn single(v: T) -> Self {
        Self::Enumerated(vec![v])
    }
}

impl<T: Debug> Display for Filter<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => write!(f, "*"),
            Self::Enumerated(l) if l.len() == 1 => write!(f, "{:?}", l[0]),
            Self::Enumerated(l) => {
                write!(f, "[")?;
                for i in l {
                    write!(f, "{i:?},")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrInt {
    Str(String),
    Int(u64),
}

impl TryFrom<StrOrInt> for u32 {
    type Error = String;

    fn try_from(v: StrOrInt) -> Result<Self, Self::Error> {
        match v {
            StrOrInt::Str(s) => parse_domain(&s),
            StrOrInt::Int(i) => {
                u32::try_from(i).map_err(|_| "Domain Id must fit within a u32 value".to_owned())
            }
        }
    }
}

struct FilterVisitor<T>(PhantomData<T>);
impl<'de> Visitor<'de> for FilterVisitor<u32> {
    type Value = Filter<u32>;

    fn expecting(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "Expecting either a wildcard \"*\", decimal/hex value string, or list of decimal/hex value strings")
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: Error,
    {
        if v <= u32::MAX as u64 {
            Ok(Self::Value::single(v as u32))
        } else {
            Err(E::custom("Domain Id must fit within a u32 value"))
        }
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(if v == "*" {
            Self::Value::Wildcard
        } else {
            Self::Value::single(parse_domain(v).map_err(E::custom)?)
        })
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut values = Vec::new();
        while let Some(i) = seq.next_element::<StrOrInt>()? {
            values.push(i.try_into().map_err(A::Error::custom)?);
        }
        Ok(Self::Value::Enumerated(values))
    }
}

impl<'de> Visitor<'de> for FilterVisitor<H256> {
    type Value = Filter<H256>;

    fn expecting(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(
            fmt,
            "Expecting either a wildcard \"*\", hex address string, or list of hex address strings"
        )
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(if v == "*" {
            Self::Value::Wildcard
        } else {
            Self::Value::single(parse_addr(v)?)
        })
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut values = Vec::new();
        while let Some(i) = seq.next_element::<String>()? {
            values.push(parse_addr(&i)?)
        }
        Ok(Self::Value::Enumerated(values))
    }
}

impl<'de> Deserialize<'de> for Filter<u32> {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_any(FilterVisitor::<u32>(Default::default()))
    }
}

impl<'de> Deserialize<'de> for Filter<H256> {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_any(FilterVisitor::<H256>(Default::default()))
    }
}

impl Serialize for Filter<u32> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Filter::Wildcard => s.serialize_str("*"),
            Filter::Enumerated(l) if l.len() == 1 => s.serialize_u32(l[0]),
            Filter::Enumerated(l) => {
                let mut seq = s.serialize_seq(Some(l.len()))?;
                for domain in l {
                    seq.serialize_element(domain)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Filter<H256> {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Filter::Wildcard => s.serialize_str("*"),
            Filter::Enumerated(l) if l.len() == 1 => s.serialize_str(&format_addr(&l[0])),
            Filter::Enumerated(l) => {
                let mut seq = s.serialize_seq(Some(l.len()))?;
                for addr in l {
                    seq.serialize_element(&format_addr(addr))?;
                }
                seq.end()
            }
        }
    }
}

/// One rule of a matching list. A message matches the rule when every field
/// matches; omitted fields are wildcards.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListElement {
    /// Origin domain id
    #[serde(default)]
    pub origin_domain: Filter<u32>,
    /// Sender address on the origin
    #[serde(default)]
    pub sender_address: Filter<H256>,
    /// Destination domain id
    #[serde(default)]
    pub destination_domain: Filter<u32>,
    /// Recipient address on the destination
    #[serde(default)]
    pub recipient_address: Filter<H256>,
}

/// An element which matches every message.
pub const MATCHING_LIST_ALL_WILDCARDS: ListElement = ListElement {
    origin_domain: Filter::Wildcard,
    sender_address: Filter::Wildcard,
    destination_domain: Filter::Wildcard,
    recipient_address: Filter::Wildcard,
};

impl Display for ListElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{originDomain: {}, senderAddress: {}, destinationDomain: {}, recipientAddress: {}}}",
            self.origin_domain,
            self.sender_address,
            self.destination_domain,
            self.recipient_address
        )
    }
}

/// The fields of a message a matching list is evaluated against.
#[derive(Copy, Clone, Debug)]
pub struct MatchInfo<'a> {
    /// Origin domain id
    pub src_domain: u32,
    /// Sender address
    pub src_addr: &'a H256,
    /// Destination domain id
    pub dst_domain: u32,
    /// Recipient address
    pub dst_addr: &'a H256,
}

impl MatchingList {
    /// A list made of the given rules
    pub fn new(rules: Vec<ListElement>) -> Self {
        Self(Some(rules))
    }

    /// A list with the single all-wildcard rule, matching everything.
    pub fn all_wildcards() -> Self {
        Self::new(vec![MATCHING_LIST_ALL_WILDCARDS])
    }

    /// Builds the list matching every message sent between two distinct
    /// routers. Rules are ordered origin-major, destination-minor following
    /// the iteration order of `routers`; `n` routers yield `n * (n - 1)`
    /// rules.
    pub fn from_routers(routers: impl IntoIterator<Item = (ChainName, H256)>) -> Self {
        let routers: Vec<(ChainName, H256)> = routers.into_iter().collect();
        let mut rules = Vec::with_capacity(routers.len() * routers.len().saturating_sub(1));
        for (origin, sender) in routers.iter() {
            for (destination, recipient) in routers.iter() {
                if origin == destination {
                    continue;
                }
                rules.push(ListElement {
                    origin_domain: Filter::single(origin.domain_id()),
                    sender_address: Filter::single(*sender),
                    destination_domain: Filter::single(destination.domain_id()),
                    recipient_address: Filter::single(*recipient),
                });
            }
        }
        Self::new(rules)
    }

    /// The rules of this list, empty if no list was configured
    pub fn rules(&self) -> &[ListElement] {
        self.0.as_deref().unwrap_or_default()
    }

    /// Number of rules in the list
    pub fn len(&self) -> usize {
        self.rules().len()
    }

    /// True if no rules are configured
    pub fn is_empty(&self) -> bool {
        self.rules().is_empty()
    }

    /// Concatenate the rules of another list onto this one
    pub fn extend(mut self, other: MatchingList) -> Self {
        if let Some(rules) = other.0 {
            self.0.get_or_insert_with(Vec::new).extend(rules);
        }
        self
    }

    /// Check if a message matches any of the rules.
    /// - `default`: What to return if the the matching list is empty.
    pub fn matches(&self, info: MatchInfo, default: bool) -> bool {
        if let Some(rules) = &self.0 {
            matches_any_rule(rules.iter(), info)
        } else {
            default
        }
    }

    /// The textual form handed to agents, which parse matching lists from a
    /// JSON string.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// How a matching list is declared in an environment config: either spelled
/// out rule by rule, or derived from a set of routers that may message each
/// other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchingListConf {
    /// Explicit rules
    List(MatchingList),
    /// All traffic between the given routers, see [`MatchingList::from_routers`]
    Routers {
        /// Router address per chain
        routers: Routers,
    },
}

impl MatchingListConf {
    /// Resolve to the concrete list of rules
    pub fn compile(&self) -> MatchingList {
        match self {
            MatchingListConf::List(list) => list.clone(),
            MatchingListConf::Routers { routers } => {
                MatchingList::from_routers(routers.0.iter().map(|(c, a)| (*c, H256::from(*a))))
            }
        }
    }
}

/// Router address per chain, kept in the order they were declared in. Reads
/// and writes a JSON object keyed by chain name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Routers(pub Vec<(ChainName, H160)>);

impl Serialize for Routers {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(self.0.len()))?;
        for (chain, router) in &self.0 {
            map.serialize_entry(chain, router)?;
        }
        map.end()
    }
}

struct RoutersVisitor;
impl<'de> Visitor<'de> for RoutersVisitor {
    type Value = Routers;

    fn expecting(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "Expecting a map of chain names to router addresses")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut routers: Vec<(ChainName, H160)> = Vec::new();
        while let Some((chain, router)) = map.next_entry::<ChainName, H160>()? {
            if routers.iter().any(|(c, _)| *c == chain) {
                return Err(A::Error::custom(format!("Duplicate router for {chain}")));
            }
            routers.push((chain, router));
        }
        Ok(Routers(routers))
    }
}

impl<'de> Deserialize<'de> for Routers {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_map(RoutersVisitor)
    }
}

impl From<MatchingList> for MatchingListConf {
    fn from(list: MatchingList) -> Self {
        MatchingListConf::List(list)
    }
}

fn matches_any_rule<'a>(mut rules: impl Iterator<Item = &'a ListElement>, info: MatchInfo) -> bool {
    rules.any(|rule| {
        rule.origin_domain.matches(&info.src_domain)
            && rule.sender_address.matches(info.src_addr)
            && rule.destination_domain.matches(&info.dst_domain)
            && rule.recipient_address.matches(info.dst_addr)
    })
}

impl Display for MatchingList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(wl) = &self.0 {
            write!(f, "[")?;
            for i in wl {
                write!(f, "{i},")?;
            }
            write!(f, "]")
        } else {
            write!(f, "null")
        }
    }
}

fn parse_domain(v: &str) -> Result<u32, String> {
    if let Some(hex) = v.strip_prefix("0x") {
        u32::from_str_radix(hex, 16)
    } else {
        v.parse::<u32>()
    }
    .map_err(|e| e.to_string())
}

fn parse_addr<E: Error>(addr_str: &str) -> Result<H256, E> {
    if addr_str.len() <= 42 {
        addr_str.parse::<H160>().map(H256::from)
    } else {
        addr_str.parse::<H256>()
    }
    .map_err(|e| E::custom(e.to_string()))
}

/// 20 byte addresses stay 20 bytes when written back out.
fn format_addr(addr: &H256) -> String {
    if addr.as_bytes()[..12].iter().all(|b| *b == 0) {
        format!("{:?}", H160::from(*addr))
    } else {
        format!("{addr:?}")
    }
}
