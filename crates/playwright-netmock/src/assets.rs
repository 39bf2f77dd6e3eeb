// Static-asset request detection
//
// When `skip_asset_requests` is enabled (the default), requests for
// well-known static assets bypass the mock engine entirely and
// continue to the real network. Pages load plenty of documents,
// styles, scripts, and images per navigation; resolving each against
// the handler set is pure overhead when tests only mock API traffic.

use url::Url;

/// Extensions treated as static assets: documents, styles, scripts,
/// fonts, images, and media.
const ASSET_EXTENSIONS: &[&str] = &[
    "html", "htm", "css", "js", "mjs", "map", "woff", "woff2", "ttf", "otf", "eot", "ico", "png",
    "jpg", "jpeg", "gif", "svg", "webp", "avif", "mp3", "mp4", "webm", "ogg", "wav",
];

/// Checks whether the URL points at a well-known static asset.
///
/// Only the final path segment's extension is considered; query and
/// fragment are ignored.
pub(crate) fn is_common_asset_request(url: &Url) -> bool {
    let segment = url.path().rsplit('/').next().unwrap_or("");

    match segment.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => {
            let extension = extension.to_ascii_lowercase();
            ASSET_EXTENSIONS.contains(&extension.as_str())
        }
        _ => false,
    }
}
