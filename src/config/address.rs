//! Source address parsing
//!
//! A configuration address looks like `scheme:resource/path?query=args#local=args`. The
//! scheme picks a source implementation; the path segments and arguments configure it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::common::{ConfigureError, Result};

/// Parsed configuration address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAddress {
    scheme: String,
    non_local: String,
    segments: Vec<String>,
    arguments: BTreeMap<String, String>,
    query: BTreeMap<String, Vec<String>>,
}

impl SourceAddress {
    /// Parse an address string
    ///
    /// Local arguments come after the last `#`; query arguments after the first `?` of the
    /// resource. Both are merged into one argument namespace, a query argument replacing a
    /// local one of the same name.
    pub fn parse(input: &str) -> Result<Self> {
        let mut arguments = BTreeMap::new();

        let non_local = match input.rfind('#') {
            Some(offset) => {
                for (name, value) in parse_pairs(&input[offset + 1..])? {
                    arguments.insert(name, value);
                }
                &input[..offset]
            }
            None => input,
        };

        let scheme_end = match non_local.find(':') {
            Some(offset) if offset > 0 => offset,
            _ => {
                return Err(ConfigureError::Address(format!(
                    "unable to determine scheme from {:?}",
                    input
                )))
            }
        };
        let scheme = &non_local[..scheme_end];

        let mut resource = non_local[scheme_end + 1..].trim_start_matches('/');

        let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
        if let Some(offset) = resource.find('?') {
            for (name, value) in parse_pairs(&resource[offset + 1..])? {
                query.entry(name.clone()).or_default().push(value.clone());
                arguments.insert(name, value);
            }
            resource = &resource[..offset];
        }

        let mut segments: Vec<String> = resource.split('/').map(str::to_string).collect();
        while segments.last().is_some_and(|s| s.is_empty()) {
            segments.pop();
        }

        Ok(Self {
            scheme: scheme.to_string(),
            non_local: non_local.to_string(),
            segments,
            arguments,
            query,
        })
    }

    /// Scheme, the text before the first colon
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The address without its local (`#`) part
    pub fn without_local(&self) -> &str {
        &self.non_local
    }

    /// Path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of path segments
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Path segment by position
    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// Final path segment
    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Merged local and query argument
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).map(String::as_str)
    }

    /// All arguments
    pub fn arguments(&self) -> &BTreeMap<String, String> {
        &self.arguments
    }

    /// Every value a query argument was given, in order
    pub fn query_values(&self, name: &str) -> &[String] {
        self.query.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parse a numeric argument
    pub fn numeric_argument(&self, name: &str) -> Result<Option<u64>> {
        match self.argument(name) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map(Some)
                .map_err(|_| ConfigureError::InvalidNumber {
                    name: name.to_string(),
                    value: value.to_string(),
                }),
        }
    }

    /// Rebuild the path segments as a local filesystem path
    ///
    /// On Windows a one-letter first segment is taken as a drive (`file://C/dir` becomes
    /// `C:\dir`), `C:` is kept as is, and anything else becomes a UNC path.
    pub fn path_as_local(&self) -> String {
        let mut path = String::new();

        if cfg!(windows) {
            let mut rest = self.segments.iter();
            if let Some(first) = rest.next() {
                if first.len() == 1 {
                    path.push_str(first);
                    path.push(':');
                } else if first.len() == 2 && first.ends_with(':') {
                    path.push_str(first);
                } else {
                    path.push_str("\\\\");
                    path.push_str(first);
                }
            }
            for segment in rest {
                path.push('\\');
                path.push_str(segment);
            }
        } else {
            for segment in &self.segments {
                path.push('/');
                path.push_str(segment);
            }
        }

        path
    }
}

impl FromStr for SourceAddress {
    type Err = ConfigureError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Schemes whose final path segment is an access token
const TOKEN_SCHEMES: [&str; 2] = ["managed", "smbtrack"];

impl fmt::Display for SourceAddress {
    /// Arguments are left out and access tokens masked, so the result is safe to log
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked = TOKEN_SCHEMES.contains(&self.scheme.as_str()) && self.segments.len() > 1;

        write!(f, "{}:", self.scheme)?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            if masked && i + 1 == self.segments.len() {
                f.write_str("***")?;
            } else {
                f.write_str(segment)?;
            }
        }
        Ok(())
    }
}

/// Split `a=1&b=2` into decoded pairs; entries without a name are skipped
fn parse_pairs(part: &str) -> Result<Vec<(String, String)>> {
    let mut pairs = Vec::new();

    if part.trim().is_empty() {
        return Ok(pairs);
    }

    for entry in part.split('&') {
        match entry.find('=') {
            Some(offset) if offset > 0 => {
                let name = entry[..offset].to_string();
                let raw = entry[offset + 1..].replace('+', " ");
                let value = urlencoding::decode(&raw)
                    .map_err(|e| {
                        ConfigureError::Address(format!("unable to decode argument {}: {}", name, e))
                    })?
                    .into_owned();
                pairs.push((name, value));
            }
            _ => {}
        }
    }

    Ok(pairs)
}
