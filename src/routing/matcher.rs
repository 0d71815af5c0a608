// Entry gate: which paths the edge logic runs on at all.
//
// Excluded: build output under /_next/static, the image optimizer under
// /_next/image, the favicon, and common image files anywhere.

use once_cell::sync::Lazy;
use regex::Regex;

const EXCLUDED_PREFIXES: &[&str] = &["_next/static", "_next/image", "favicon.ico"];

static IMAGE_EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(?:svg|png|jpg|jpeg|gif|webp)$").expect("image extension pattern is valid")
});

/// True when the tenant pipeline should run for `path`
pub fn applies(path: &str) -> bool {
    let rest = path.strip_prefix('/').unwrap_or(path);

    if EXCLUDED_PREFIXES.iter().any(|prefix| rest.starts_with(prefix)) {
        return false;
    }

    !IMAGE_EXTENSION.is_match(rest)
}
