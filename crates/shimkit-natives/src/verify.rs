//! SHA-256 helpers: digest format validation and a hashing write-through.

use crate::errors::InvalidDigest;
use sha2::{Digest, Sha256};
use std::io::{self, Write};

/// Validate a hex sha256 and return it lowercased.
///
/// `context` names where the value came from (manifest path, env var) so the
/// error points the operator at the right place.
pub fn parse_sha256(value: &str, context: &str) -> Result<String, InvalidDigest> {
    let trimmed = value.trim();
    if trimmed.len() == 64 && trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(trimmed.to_ascii_lowercase())
    } else {
        Err(InvalidDigest {
            context: context.to_string(),
            value: value.to_string(),
        })
    }
}

/// Case-insensitive comparison of two hex digests.
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}

/// Writer that forwards every byte to `inner` and feeds the same bytes to a
/// SHA-256 accumulator, so a download is hashed in the same pass that writes
/// it to disk.
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha256,
    written: u64,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush and return the inner writer with the lowercase hex digest.
    pub fn finish(mut self) -> io::Result<(W, String)> {
        self.inner.flush()?;
        Ok((self.inner, hex::encode(self.hasher.finalize())))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        // only hash what the sink actually accepted
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const HELLO_SHA: &str = "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03";

    #[test]
    fn hashing_writer_matches_direct_digest() {
        let mut w = HashingWriter::new(Vec::new());
        w.write_all(b"hel").expect("write");
        w.write_all(b"lo\n").expect("write");
        assert_eq!(w.bytes_written(), 6);

        let (buf, digest) = w.finish().expect("finish");
        assert_eq!(buf, b"hello\n");
        assert_eq!(digest, HELLO_SHA);
    }

    #[test]
    fn empty_stream_digest() {
        let (_, digest) = HashingWriter::new(io::sink()).finish().expect("finish");
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[rstest]
    #[case(HELLO_SHA, true)]
    #[case("5891B5B522D5DF086D0FF0B110FBD9D21BB4FC7163AF34D08286A2E846F6BE03", true)]
    #[case("  5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03 ", true)]
    #[case("5891b5b5", false)]
    #[case("", false)]
    #[case("z891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03", false)]
    #[case("5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be0300", false)]
    fn digest_format(#[case] input: &str, #[case] valid: bool) {
        let got = parse_sha256(input, "test");
        assert_eq!(got.is_ok(), valid, "input {input:?}");
        if let Ok(d) = got {
            assert_eq!(d, HELLO_SHA);
        }
    }

    #[test]
    fn comparison_ignores_case() {
        assert!(digests_match(HELLO_SHA, &HELLO_SHA.to_uppercase()));
        assert!(!digests_match(HELLO_SHA, &"0".repeat(64)));
    }
}
