//! File-name eligibility.

/// Allowed file-name suffixes, matched literally and case-sensitively.
///
/// `"txt"` matches `notes.txt` and also `notestxt`; it does not match
/// `notes.TXT`. An empty set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilter {
    suffixes: Vec<String>,
}

impl PathFilter {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { suffixes: suffixes.into_iter().map(Into::into).collect() }
    }

    /// Parse a comma-separated list such as `"txt, md"`.
    ///
    /// Entries are trimmed and empty entries dropped, so a trailing comma does
    /// not turn into an empty suffix that would match every file.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn matches(&self, filename: &str) -> bool {
        matches(filename, &self.suffixes)
    }
}

pub fn matches<S: AsRef<str>>(filename: &str, allowed: &[S]) -> bool {
    allowed.iter().any(|suffix| filename.ends_with(suffix.as_ref()))
}
