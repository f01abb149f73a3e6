//! Versioned snapshots of column profiles
//!
//! A snapshot is the envelope `{version, profile}` encoded as JSON or YAML.
//! Decoding checks the version before the profile body and re-validates the
//! embedded configuration.

use serde::{Deserialize, Serialize};

use super::profiler::ColumnProfiler;
use crate::error::{ProfileError, ProfileResult};

/// Version written into every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    profile: &'a ColumnProfiler,
}

#[derive(Deserialize)]
struct Snapshot {
    profile: ColumnProfiler,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

fn check_version(probe: VersionProbe) -> ProfileResult<()> {
    if probe.version != SNAPSHOT_VERSION {
        return Err(ProfileError::SnapshotVersion {
            expected: SNAPSHOT_VERSION,
            found: probe.version,
        });
    }
    Ok(())
}

impl ColumnProfiler {
    fn snapshot(&self) -> SnapshotRef<'_> {
        SnapshotRef {
            version: SNAPSHOT_VERSION,
            profile: self,
        }
    }

    /// Encode as a JSON snapshot
    pub fn to_json(&self) -> ProfileResult<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Encode as an indented JSON snapshot
    pub fn to_json_pretty(&self) -> ProfileResult<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }

    /// Decode a JSON snapshot
    pub fn from_json(json: &str) -> ProfileResult<ColumnProfiler> {
        check_version(serde_json::from_str(json)?)?;
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.profile.check_consistency()?;
        Ok(snapshot.profile)
    }

    /// Encode as a YAML snapshot
    pub fn to_yaml(&self) -> ProfileResult<String> {
        Ok(serde_yaml::to_string(&self.snapshot())?)
    }

    /// Decode a YAML snapshot
    pub fn from_yaml(yaml: &str) -> ProfileResult<ColumnProfiler> {
        check_version(serde_yaml::from_str(yaml)?)?;
        let snapshot: Snapshot = serde_yaml::from_str(yaml)?;
        snapshot.profile.check_consistency()?;
        Ok(snapshot.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileConfig;
    use crate::sketch::ValueDomain;

    fn sample_profile() -> ColumnProfiler {
        let config = ProfileConfig::builder()
            .domain(ValueDomain::Real)
            .top_bottom_k(3)
            .build();
        let mut profiler = ColumnProfiler::new(config).unwrap();
        profiler.track_all([Some("3.25"), Some("-1"), None, Some("x1"), Some("1e3"), Some(" ")]);
        profiler
    }

    #[test]
    fn test_json_round_trip() {
        let profile = sample_profile();
        let json = profile.to_json().unwrap();
        let back = ColumnProfiler::from_json(&json).unwrap();
        assert_eq!(back, profile);
        assert_eq!(back.regexp(true), profile.regexp(true));
        assert_eq!(back.top_k(), profile.top_k());
    }

    #[test]
    fn test_yaml_round_trip() {
        let profile = sample_profile();
        let yaml = profile.to_yaml().unwrap();
        let back = ColumnProfiler::from_yaml(&yaml).unwrap();
        assert_eq!(back, profile);
    }

    #[test]
    fn test_unknown_version_rejected() {
        let json = sample_profile().to_json().unwrap().replacen(
            "\"version\":1",
            "\"version\":7",
            1,
        );
        assert_eq!(
            ColumnProfiler::from_json(&json).unwrap_err(),
            ProfileError::SnapshotVersion {
                expected: 1,
                found: 7
            }
        );
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            ColumnProfiler::from_json("{\"profile\": 3}"),
            Err(ProfileError::Serialization(_))
        ));
    }

    #[test]
    fn test_inconsistent_snapshot_rejected() {
        let profile = sample_profile();
        let mut value: serde_json::Value = serde_json::from_str(&profile.to_json().unwrap()).unwrap();
        value["profile"]["config"]["topBottomK"] = serde_json::json!(4);
        let err = ColumnProfiler::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, ProfileError::InvalidConfig(_)));
    }

    #[test]
    fn test_extreme_reals_round_trip() {
        let config = ProfileConfig::builder().domain(ValueDomain::Real).build();
        let mut profile = ColumnProfiler::new(config).unwrap();
        profile.track_all([Some("1e308"), Some("-1e308")]);
        let moments = profile.moments().unwrap();
        assert_eq!(moments.mean(), Some(0.0));
        assert!(moments.variance().unwrap().is_finite());

        let json = profile.to_json().unwrap();
        assert!(!json.contains("\"m2\":null"));
        assert_eq!(ColumnProfiler::from_json(&json).unwrap(), profile);
        assert_eq!(ColumnProfiler::from_yaml(&profile.to_yaml().unwrap()).unwrap(), profile);
    }
}
