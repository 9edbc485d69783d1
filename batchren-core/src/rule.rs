use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

use crate::entry::Entry;
use crate::error::ConfigError;

/// Widest zero padding accepted by a sequence rule
pub const MAX_PADDING: usize = 32;

/// Substring substitution in the file stem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceRule {
    /// Only entries whose name contains this keyword take part (empty matches all)
    pub keyword: String,
    pub case_sensitive: bool,
    pub old: String,
    pub new: String,
    /// The keyword was matched against the relative path when scanning, so the
    /// rule does not check it against the name again
    #[serde(default)]
    pub match_path: bool,
    #[serde(skip)]
    matcher: Option<Regex>,
}

impl ReplaceRule {
    pub fn new(
        keyword: impl Into<String>,
        case_sensitive: bool,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let old = old.into();
        if old.is_empty() {
            return Err(ConfigError::EmptyOldSubstring);
        }
        let matcher = build_matcher(&old, case_sensitive)?;
        Ok(Self {
            keyword: keyword.into(),
            case_sensitive,
            old,
            new: new.into(),
            match_path: false,
            matcher: Some(matcher),
        })
    }

    pub fn matching_path(mut self, match_path: bool) -> Self {
        self.match_path = match_path;
        self
    }

    fn matcher(&self) -> Option<Cow<'_, Regex>> {
        match &self.matcher {
            Some(m) => Some(Cow::Borrowed(m)),
            // Deserialized rules carry no compiled matcher
            None => build_matcher(&self.old, self.case_sensitive).ok().map(Cow::Owned),
        }
    }

    fn keyword_matches(&self, name: &str) -> bool {
        if self.keyword.is_empty() {
            return true;
        }
        if self.case_sensitive {
            name.contains(&self.keyword)
        } else {
            name.to_lowercase().contains(&self.keyword.to_lowercase())
        }
    }

    fn propose(&self, entry: &Entry) -> Option<String> {
        if !self.match_path && !self.keyword_matches(&entry.name) {
            return None;
        }
        let matcher = self.matcher()?;
        if matcher.is_match(&entry.stem) {
            let stem = matcher.replace_all(&entry.stem, regex::NoExpand(&self.new));
            return Some(format!("{}{}", stem, entry.extension));
        }
        // The extension only changes when the search text names it, dot included
        if self.old.contains('.') && matcher.is_match(&entry.name) {
            return Some(
                matcher
                    .replace_all(&entry.name, regex::NoExpand(&self.new))
                    .into_owned(),
            );
        }
        None
    }
}

fn build_matcher(old: &str, case_sensitive: bool) -> Result<Regex, ConfigError> {
    RegexBuilder::new(&regex::escape(old))
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|e| ConfigError::InvalidField {
            field: "old",
            reason: e.to_string(),
        })
}

/// Zero-padded counter with prefix and suffix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceRule {
    pub start: u64,
    pub padding: usize,
    pub prefix: String,
    pub suffix: String,
    /// Append the entry's own extension after `suffix`
    pub keep_extension: bool,
}

impl SequenceRule {
    pub fn new(
        start: u64,
        padding: usize,
        prefix: impl Into<String>,
        suffix: impl Into<String>,
        keep_extension: bool,
    ) -> Result<Self, ConfigError> {
        if padding > MAX_PADDING {
            return Err(ConfigError::PaddingTooWide(padding));
        }
        let prefix = prefix.into();
        let suffix = suffix.into();
        for (field, value) in [("prefix", &prefix), ("suffix", &suffix)] {
            if value.contains('/') || value.contains('\\') {
                return Err(ConfigError::InvalidField {
                    field,
                    reason: "path separators are not allowed".to_string(),
                });
            }
        }
        Ok(Self {
            start,
            padding,
            prefix,
            suffix,
            keep_extension,
        })
    }

    /// Fails when numbering `count` files from `start` would overflow
    pub fn check_capacity(&self, count: usize) -> Result<(), ConfigError> {
        let last = (count as u64).saturating_sub(1);
        match self.start.checked_add(last) {
            Some(_) => Ok(()),
            None => Err(ConfigError::InvalidField {
                field: "start",
                reason: format!("{} leaves no room to number {} files", self.start, count),
            }),
        }
    }

    fn propose(&self, entry: &Entry, index: usize) -> Option<String> {
        let number = self.start.checked_add(index as u64)?;
        let extension = if self.keep_extension {
            entry.extension.as_str()
        } else {
            ""
        };
        Some(format!(
            "{}{:0width$}{}{}",
            self.prefix,
            number,
            self.suffix,
            extension,
            width = self.padding
        ))
    }
}

/// Strategy producing a candidate name for an entry at a batch position
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum NamingRule {
    Replace(ReplaceRule),
    Sequence(SequenceRule),
}

impl NamingRule {
    /// Candidate name for `entry`, or `None` when the rule does not apply to it.
    /// Pure: never touches the filesystem.
    pub fn propose(&self, entry: &Entry, index: usize) -> Option<String> {
        match self {
            Self::Replace(rule) => rule.propose(entry),
            Self::Sequence(rule) => rule.propose(entry, index),
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Self::Replace(_) => "replace",
            Self::Sequence(_) => "sequence",
        }
    }
}

impl fmt::Display for NamingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(r) => write!(f, "replace '{}' -> '{}'", r.old, r.new),
            Self::Sequence(r) => write!(
                f,
                "sequence {}{{{}..}}{} (padding {})",
                r.prefix, r.start, r.suffix, r.padding
            ),
        }
    }
}
