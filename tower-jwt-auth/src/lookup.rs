use std::{fmt::Display, str::FromStr};

use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::error::StartupError;

/// Where in a request a credential may be found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenSource {
    Header,
    Query,
    /// A path parameter, read from the [PathParams](crate::context::PathParams) extension.
    Param,
    Cookie,
    /// A field of an `application/x-www-form-urlencoded` body.
    Form,
}

impl TokenSource {
    fn as_str(&self) -> &'static str {
        match self {
            TokenSource::Header => "header",
            TokenSource::Query => "query",
            TokenSource::Param => "param",
            TokenSource::Cookie => "cookie",
            TokenSource::Form => "form",
        }
    }
}

impl FromStr for TokenSource {
    type Err = StartupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "header" => Ok(TokenSource::Header),
            "query" => Ok(TokenSource::Query),
            "param" => Ok(TokenSource::Param),
            "cookie" => Ok(TokenSource::Cookie),
            "form" => Ok(TokenSource::Form),
            other => Err(StartupError::InvalidParameter(format!(
                "unknown token source '{}'",
                other
            ))),
        }
    }
}

impl Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `source:name` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TokenLookup {
    pub source: TokenSource,
    pub name: String,
}

impl TokenLookup {
    pub fn new(source: TokenSource, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
        }
    }
}

impl FromStr for TokenLookup {
    type Err = StartupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (source, name) = s.trim().split_once(':').ok_or_else(|| {
            StartupError::InvalidParameter(format!("token lookup '{}' is not 'source:name'", s))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(StartupError::InvalidParameter(format!(
                "token lookup '{}' has an empty name",
                s
            )));
        }
        Ok(TokenLookup::new(source.trim().parse()?, name))
    }
}

impl Display for TokenLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source, self.name)
    }
}

/// Ordered list of places to look for a credential.
///
/// Parsed from a comma separated list of `source:name` pairs,
/// e.g. `header:Authorization,query:jwt,cookie:jwt`.
/// Earlier entries win over later ones.
#[derive(Clone, Debug, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct LookupChain(Vec<TokenLookup>);

impl LookupChain {
    pub fn new(lookups: Vec<TokenLookup>) -> Result<Self, StartupError> {
        if lookups.is_empty() {
            return Err(StartupError::InvalidParameter(
                "token lookup must contain at least one source".to_owned(),
            ));
        }
        Ok(Self(lookups))
    }

    pub fn single(lookup: TokenLookup) -> Self {
        Self(vec![lookup])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenLookup> {
        self.0.iter()
    }

    /// First lookup reading from `source`, if any.
    pub fn find_source(&self, source: TokenSource) -> Option<&TokenLookup> {
        self.0.iter().find(|lookup| lookup.source == source)
    }
}

impl FromStr for LookupChain {
    type Err = StartupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lookups = s
            .split(',')
            .map(TokenLookup::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        LookupChain::new(lookups)
    }
}

impl Display for LookupChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}
