/// Complete a URL typed without a scheme.
///
/// Known schemes and relative paths pass through, local hosts get `http://`,
/// dotted hosts get `https://` and a bare word becomes `https://www.<word>.com`.
pub fn normalize_url(url: &str) -> String {
    const SCHEMES: [&str; 7] = ["http://", "https://", "file://", "data:", "about:", "chrome://", "chrome-extension://"];

    let trimmed = url.trim();
    if SCHEMES.iter().any(|scheme| trimmed.starts_with(scheme)) {
        return trimmed.to_string();
    }

    if trimmed.starts_with('/') || trimmed.starts_with("./") || trimmed.starts_with("../") {
        return trimmed.to_string();
    }

    if trimmed.starts_with("localhost") || trimmed.starts_with("127.0.0.1") {
        return format!("http://{}", trimmed);
    }

    if trimmed.contains('.') {
        return format!("https://{}", trimmed);
    }

    format!("https://www.{}.com", trimmed)
}
