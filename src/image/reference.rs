use crate::errors::ImageError;
use regex::Regex;
use std::{
    cmp::{Ordering, PartialOrd},
    fmt,
    hash::{Hash, Hasher},
    ops::Range,
    str::FromStr,
};

/// Parsed reference to a packaged cell image
///
/// This is an owned struct representing a cell image tag of the form
/// `organization/name:version`, which refers to one published revision of a
/// cell image. Every local storage path and every runtime invocation argument
/// is derived from one of these.
///
/// The organization and name sections are lowercase alphanumeric and may
/// contain dashes anywhere except the beginning and end. The version is
/// tag-like: up to 128 characters, alphanumerics and underscores anywhere,
/// dots and dashes anywhere except the beginning. The version is optional in
/// the serialized form and defaults to `latest`.
#[derive(Clone)]
pub struct ImageReference {
    serialized: String,
    organization_pos: Range<usize>,
    name_pos: Range<usize>,
    version_pos: Option<Range<usize>>,
}

static LATEST_STR: &str = "latest";

impl ImageReference {
    /// Returns a reference to the existing string representation of an
    /// [ImageReference]
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Parse a [prim@str] as an [ImageReference]
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            static ref RE: Regex = Regex::new(&format!(
                "^{}/{}(?::{})?$",
                ImageReference::organization_regex_str(),
                ImageReference::name_regex_str(),
                ImageReference::version_regex_str(),
            ))
            .unwrap();
        }
        match RE.captures(s) {
            None => Err(ImageError::InvalidReferenceFormat(s.to_owned())),
            Some(captures) => Ok(ImageReference {
                serialized: s.to_owned(),
                organization_pos: captures.name("org").unwrap().range(),
                name_pos: captures.name("name").unwrap().range(),
                version_pos: captures.name("ver").map(|m| m.range()),
            }),
        }
    }

    /// Parse an [ImageReference] from its component pieces
    ///
    /// This may fail because of a problem with one of the components, or
    /// because the resulting tag would be parsed in a manner other than
    /// intended.
    pub fn from_parts(
        organization: &str,
        name: &str,
        version: Option<&str>,
    ) -> Result<Self, ImageError> {
        let combined = match version {
            Some(version) => format!("{}/{}:{}", organization, name, version),
            None => format!("{}/{}", organization, name),
        };
        let parsed = ImageReference::parse(&combined)?;
        if parsed.organization() == organization
            && parsed.name() == name
            && parsed.version_str() == version
        {
            Ok(parsed)
        } else {
            // Parsing ambiguity
            Err(ImageError::InvalidReferenceFormat(combined))
        }
    }

    /// Return references to the parsed components within this
    /// [ImageReference]
    pub fn as_parts(&self) -> (&str, &str, Option<&str>) {
        (self.organization(), self.name(), self.version_str())
    }

    /// Returns a reference to the organization portion of the string
    pub fn organization(&self) -> &str {
        &self.serialized[self.organization_pos.clone()]
    }

    /// Returns a reference to the name portion of the string
    pub fn name(&self) -> &str {
        &self.serialized[self.name_pos.clone()]
    }

    /// Returns a reference to the optional version portion of the string.
    pub fn version_str(&self) -> Option<&str> {
        self.version_pos
            .as_ref()
            .map(|pos| &self.serialized[pos.clone()])
    }

    /// Returns the effective version, defaulting to `latest` when the
    /// serialized form carries none
    pub fn version(&self) -> &str {
        self.version_str().unwrap_or(LATEST_STR)
    }

    /// Is this the special version `latest`?
    pub fn is_latest(&self) -> bool {
        self.version() == LATEST_STR
    }

    pub(crate) fn organization_regex_str() -> &'static str {
        "(?P<org>[a-z0-9]|[a-z0-9][a-z0-9-]*[a-z0-9])"
    }

    pub(crate) fn name_regex_str() -> &'static str {
        "(?P<name>[a-z0-9]|[a-z0-9][a-z0-9-]*[a-z0-9])"
    }

    pub(crate) fn version_regex_str() -> &'static str {
        "(?P<ver>[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,127})"
    }
}

impl Eq for ImageReference {}

impl PartialEq for ImageReference {
    fn eq(&self, other: &Self) -> bool {
        self.serialized.eq(&other.serialized)
    }
}

impl FromStr for ImageReference {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageReference::parse(s)
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Hash for ImageReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serialized.hash(state);
    }
}

impl Ord for ImageReference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.serialized.cmp(&other.serialized)
    }
}

impl PartialOrd for ImageReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.serialized.partial_cmp(&other.serialized)
    }
}
