//! Structural checks run once, right after the manifest JSON is decoded.

use super::{Manifest, MANIFEST_SCHEMA_VERSION};
use crate::errors::ManifestError;
use crate::verify::parse_sha256;

pub(super) fn validate(m: &mut Manifest) -> Result<(), ManifestError> {
    if m.schema_version != MANIFEST_SCHEMA_VERSION {
        return Err(ManifestError::UnsupportedSchema {
            found: m.schema_version,
            expected: MANIFEST_SCHEMA_VERSION,
        });
    }
    if m.base_url.trim().is_empty() {
        return Err(ManifestError::Malformed("base_url is empty".into()));
    }

    for (flavor, info) in m.flavors.iter_mut() {
        if info.release_tag.trim().is_empty() {
            return Err(ManifestError::Malformed(format!(
                "flavor {flavor:?} has an empty release_tag"
            )));
        }
        for (key, asset) in info.assets.iter_mut() {
            let ctx = format!("flavors.{flavor}.assets.{key}.sha256");
            asset.sha256 = parse_sha256(&asset.sha256, &ctx)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::Manifest;
    use crate::errors::ManifestError;

    fn doc(schema: u32, tag: &str, sha: &str) -> String {
        format!(
            r#"{{
              "schema_version": {schema},
              "base_url": "https://example.invalid/releases",
              "flavors": {{
                "default": {{
                  "release_tag": "{tag}",
                  "assets": {{ "linux_amd64": {{ "file": "a.tar.gz", "sha256": "{sha}" }} }}
                }}
              }}
            }}"#
        )
    }

    #[test]
    fn digests_are_lowercased() {
        let m = Manifest::from_json(&doc(1, "v1", &"AB".repeat(32))).expect("valid");
        assert_eq!(
            m.flavors["default"].assets["linux_amd64"].sha256,
            "ab".repeat(32)
        );
    }

    #[test]
    fn short_digest_fails_at_parse_time() {
        let err = Manifest::from_json(&doc(1, "v1", "abc")).expect_err("bad digest");
        match err {
            ManifestError::InvalidDigest(d) => {
                assert_eq!(d.context, "flavors.default.assets.linux_amd64.sha256");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let err = Manifest::from_json(&doc(2, "v1", &"a".repeat(64))).expect_err("schema 2");
        assert_eq!(
            err,
            ManifestError::UnsupportedSchema {
                found: 2,
                expected: 1
            }
        );
    }

    #[test]
    fn empty_release_tag_is_malformed() {
        let err = Manifest::from_json(&doc(1, " ", &"a".repeat(64))).expect_err("empty tag");
        assert!(matches!(err, ManifestError::Malformed(_)));
    }
}
