//! Obfuscation categories.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Class of identifier that receives a reversible-looking substitute.
///
/// Each category owns one table in the [`MappingStore`](crate::MappingStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// IPv4 addresses
    #[serde(alias = "ip")]
    Ipv4,
    /// IPv6 addresses
    Ipv6,
    /// Ethernet hardware addresses
    Mac,
    /// The host's own FQDN and short name
    Hostname,
    /// Operator supplied keywords
    Keyword,
}

impl Category {
    /// All categories in canonical order.
    pub const ALL: [Category; 5] = [
        Category::Ipv4,
        Category::Ipv6,
        Category::Mac,
        Category::Hostname,
        Category::Keyword,
    ];

    /// Parse from string.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ipv4" | "ip" => Some(Category::Ipv4),
            "ipv6" => Some(Category::Ipv6),
            "mac" => Some(Category::Mac),
            "hostname" | "host" => Some(Category::Hostname),
            "keyword" | "keywords" => Some(Category::Keyword),
            _ => None,
        }
    }

    /// Title used in report headers.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Ipv4 => "IPv4",
            Category::Ipv6 => "IPv6",
            Category::Mac => "MAC",
            Category::Hostname => "Hostname",
            Category::Keyword => "Keyword",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Ipv4 => "ipv4",
            Category::Ipv6 => "ipv6",
            Category::Mac => "mac",
            Category::Hostname => "hostname",
            Category::Keyword => "keyword",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::parse_str(s).ok_or_else(|| format!("unknown obfuscation category: {}", s))
    }
}

/// A set of categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CategorySet(u8);

impl CategorySet {
    /// The empty set.
    pub const fn empty() -> Self {
        CategorySet(0)
    }

    /// Every category.
    pub fn all() -> Self {
        Category::ALL.iter().copied().collect()
    }

    pub fn insert(&mut self, category: Category) {
        self.0 |= category.bit();
    }

    pub fn remove(&mut self, category: Category) {
        self.0 &= !category.bit();
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Categories in `self` that are not in `other`.
    pub fn difference(&self, other: CategorySet) -> CategorySet {
        CategorySet(self.0 & !other.0)
    }

    pub fn union(&self, other: CategorySet) -> CategorySet {
        CategorySet(self.0 | other.0)
    }

    /// Iterate in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = CategorySet::empty();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

impl Serialize for CategorySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for CategorySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let list = Vec::<Category>::deserialize(deserializer)?;
        Ok(list.into_iter().collect())
    }
}
