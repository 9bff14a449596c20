use serde::{Deserialize, Serialize};

/// A source of catalog data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    /// Network-fetched datfiles (redump.org)
    Redump,
    /// User-imported datfiles (Dat-o-Matic)
    NoIntro,
}

impl Origin {
    pub const ALL: [Origin; 2] = [Origin::Redump, Origin::NoIntro];

    /// Identifier used in system ids and directory names
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Redump => "redump",
            Self::NoIntro => "no-intro",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "redump" => Some(Self::Redump),
            "no-intro" | "nointro" => Some(Self::NoIntro),
            _ => None,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redump => write!(f, "Redump"),
            Self::NoIntro => write!(f, "No-Intro"),
        }
    }
}

/// Composite `origin/slug` identifier of a system catalog, e.g. `redump/sony-playstation`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemId(pub String);

impl SystemId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn compose(origin: Origin, slug: &str) -> Self {
        Self(format!("{}/{slug}", origin.as_str()))
    }

    /// Origin prefix, if it names a known origin
    #[must_use]
    pub fn origin(&self) -> Option<Origin> {
        self.0.split_once('/').and_then(|(o, _)| Origin::parse(o))
    }

    #[must_use]
    pub fn slug(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(_, s)| s)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SystemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SystemId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
