//! Command manifest: the line-oriented list of command identifiers produced
//! by the build and read once at startup.
//!
//! One identifier per line. `#` starts a comment that runs to end of line.
//! Blank and comment-only lines are ignored; repeated identifiers collapse.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandManifest {
    identifiers: Vec<String>,
}

impl CommandManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse manifest text. Never fails; malformed lines are just identifiers.
    pub fn parse(text: &str) -> Self {
        let mut manifest = Self::new();
        for line in text.lines() {
            let content = line.split('#').next().unwrap_or("").trim();
            if !content.is_empty() {
                manifest.push(content);
            }
        }
        manifest
    }

    /// Read and parse a manifest file.
    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read command manifest: {}", path.display()))?;
        let manifest = Self::parse(&raw);
        debug!(path = %path.display(), entries = manifest.len(), "Loaded command manifest");
        Ok(manifest)
    }

    fn push(&mut self, identifier: &str) {
        if !self.identifiers.iter().any(|i| i == identifier) {
            self.identifiers.push(identifier.to_string());
        }
    }

    /// Append another manifest's identifiers, dropping ones already present.
    pub fn merge(&mut self, other: &CommandManifest) {
        for identifier in &other.identifiers {
            self.push(identifier);
        }
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.identifiers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let text = "\
# generated
demo.PingCommand
   demo.EchoCommand   # trailing comment

#demo.Disabled
demo.PingCommand
";
        let manifest = CommandManifest::parse(text);
        assert_eq!(
            manifest.identifiers().collect::<Vec<_>>(),
            vec!["demo.PingCommand", "demo.EchoCommand"]
        );
    }

    #[test]
    fn test_merge_dedupes() {
        let mut a = CommandManifest::parse("a\nb\n");
        let b = CommandManifest::parse("b\nc\n");
        a.merge(&b);
        assert_eq!(a.identifiers().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_empty() {
        assert!(CommandManifest::parse("\n  \n# only comments\n").is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file_errors() {
        let err = CommandManifest::load(Path::new("/nonexistent/cmdbot.commands")).await;
        assert!(err.is_err());
    }
}
