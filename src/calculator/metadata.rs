//! Well-known metadata keys exposed by version calculators

use strum_macros::{Display, EnumIter, EnumString};

/// Fixed set of metadata keys a calculator may provide alongside the version.
///
/// The string form of each key is the name used in the user-property channel
/// and in exported property files.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString,
)]
pub enum MetadataKey {
    /// The version string as computed by the calculator
    #[strum(serialize = "calculated-version")]
    CalculatedVersion,
    /// "true" when the working tree has uncommitted changes
    #[strum(serialize = "dirty")]
    Dirty,
    /// Full commit id of HEAD
    #[strum(serialize = "git-sha1-full")]
    GitSha1Full,
    /// Abbreviated (8 character) commit id of HEAD
    #[strum(serialize = "git-sha1-8")]
    GitSha1Short,
    /// Name of the tag the version was derived from, if any
    #[strum(serialize = "base-tag")]
    BaseTag,
    /// Version extracted from the base tag, if any
    #[strum(serialize = "base-version")]
    BaseVersion,
    /// Comma separated list of annotated version tags present on HEAD
    #[strum(serialize = "head-version-annotated-tags")]
    HeadVersionAnnotatedTags,
    /// Comma separated list of lightweight version tags present on HEAD
    #[strum(serialize = "head-version-lightweight-tags")]
    HeadVersionLightweightTags,
    /// Current branch name, when HEAD is not detached
    #[strum(serialize = "branch-name")]
    BranchName,
    /// Number of commits between HEAD and the base tag
    #[strum(serialize = "commit-distance")]
    CommitDistance,
    /// Timestamp of the HEAD commit, formatted `%Y%m%d%H%M%S`
    #[strum(serialize = "commit-timestamp")]
    CommitTimestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_keys_render_expected_names() {
        assert_eq!(MetadataKey::GitSha1Full.to_string(), "git-sha1-full");
        assert_eq!(MetadataKey::GitSha1Short.to_string(), "git-sha1-8");
        assert_eq!(MetadataKey::BaseTag.to_string(), "base-tag");
        assert_eq!(
            MetadataKey::HeadVersionAnnotatedTags.to_string(),
            "head-version-annotated-tags"
        );
    }

    #[test]
    fn test_keys_round_trip_through_strings() {
        for key in MetadataKey::iter() {
            let rendered = key.to_string();
            assert_eq!(MetadataKey::from_str(&rendered).unwrap(), key);
        }
    }
}
