use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allowed commit message prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Refactor,
    Test,
    Chore,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown commit type `{0}` (expected one of feat, fix, docs, refactor, test, chore)")]
pub struct UnknownCommitType(pub String);

impl CommitType {
    pub const ALL: [CommitType; 6] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Refactor,
        CommitType::Test,
        CommitType::Chore,
    ];

    /// Exact, case-sensitive match on the literal prefix token.
    pub fn parse(token: &str) -> Result<Self, UnknownCommitType> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == token)
            .ok_or_else(|| UnknownCommitType(token.to_string()))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Docs => "docs",
            Self::Refactor => "refactor",
            Self::Test => "test",
            Self::Chore => "chore",
        }
    }
}

impl std::fmt::Display for CommitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
