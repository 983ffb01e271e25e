//! Downloads a resolved image URL into memory.

use log::debug;

use crate::http_transport::{HttpFailure, HttpTransport};
use crate::protocol::{RawImageBytes, ResolvedImage};

/// Extension of the URL's last path segment, leading dot included.
///
/// Query strings and fragments are ignored; a segment without a dot (or only a
/// leading one) yields an empty string.
pub fn extension_from_url(url: &str) -> String {
    let without_fragment = url.split('#').next().unwrap_or_default();
    let without_query = without_fragment.split('?').next().unwrap_or_default();
    let after_scheme = without_query
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(without_query);
    let path = after_scheme
        .find('/')
        .map(|index| &after_scheme[index..])
        .unwrap_or_default();
    let segment = path.rsplit('/').next().unwrap_or_default();
    match segment.rfind('.') {
        Some(index) if index > 0 => segment[index..].to_string(),
        _ => String::new(),
    }
}

/// One buffered GET; no retries.
pub fn fetch(
    transport: &dyn HttpTransport,
    image: &ResolvedImage,
) -> Result<RawImageBytes, HttpFailure> {
    let bytes = transport.get_bytes(&image.url)?;
    let extension = extension_from_url(&image.url);
    debug!(
        "Fetched {} bytes from {} (extension '{}')",
        bytes.len(),
        image.url,
        extension
    );
    Ok(RawImageBytes { bytes, extension })
}

#[cfg(test)]
mod tests {
    use super::{extension_from_url, fetch};
    use crate::http_transport::test_support::FakeTransport;
    use crate::http_transport::{HttpFailure, HttpFailureKind};
    use crate::protocol::ResolvedImage;

    #[test]
    fn test_extension_from_url_takes_last_segment_suffix() {
        assert_eq!(
            extension_from_url(
                "https://commons.wikimedia.org/wiki/Special:FilePath/Plato_Pio-Clemente_Inv305.jpg"
            ),
            ".jpg"
        );
        assert_eq!(extension_from_url("https://host/a/b/photo.final.JPEG"), ".JPEG");
        assert_eq!(extension_from_url("https://host/a/photo.png?width=300#top"), ".png");
    }

    #[test]
    fn test_extension_from_url_is_empty_without_suffix() {
        assert_eq!(extension_from_url("https://host/Special:FilePath/Portrait"), "");
        assert_eq!(extension_from_url("https://commons.wikimedia.org"), "");
        assert_eq!(extension_from_url("https://host/dir.d/"), "");
        assert_eq!(extension_from_url("https://host/.hidden"), "");
    }

    #[test]
    fn test_fetch_returns_body_and_extension() {
        let url = "https://media.test/FilePath/Bust.png";
        let transport = FakeTransport::default().with_bytes(url, vec![1, 2, 3]);
        let raw = fetch(
            &transport,
            &ResolvedImage {
                url: url.to_string(),
            },
        )
        .expect("canned bytes should be returned");
        assert_eq!(raw.bytes, vec![1, 2, 3]);
        assert_eq!(raw.extension, ".png");
    }

    #[test]
    fn test_fetch_propagates_http_failure() {
        let url = "https://media.test/FilePath/Missing.jpg";
        let transport = FakeTransport::default().with_failure(
            url,
            HttpFailure {
                kind: HttpFailureKind::Hard,
                status: Some(404),
                message: "not found".to_string(),
            },
        );
        let error = fetch(
            &transport,
            &ResolvedImage {
                url: url.to_string(),
            },
        )
        .expect_err("404 should surface as an HttpFailure");
        assert_eq!(error.status, Some(404));
    }
}
