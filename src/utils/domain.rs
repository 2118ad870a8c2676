// src/utils/domain.rs

/// Normalizes an institution domain so that records from `www.` and bare hosts
/// group together.
///
/// The input is ASCII-lowercased, then scheme, path, query, port, trailing dot
/// and any leading `www.` labels are stripped repeatedly until nothing changes.
/// Other subdomains are kept: `bank.example.com` stays `bank.example.com`.
pub fn normalize_domain(domain: &str) -> String {
    let mut current = domain.to_ascii_lowercase();
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Returns the host part of a URL (`netloc` without credentials or port), as
/// given, e.g. `www.bank.com` for `https://www.bank.com/rates`.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed.host_str().map(|h| h.to_string())
}

// One stripping pass. Every step only shortens the string, so the fixed point
// in `normalize_domain` is reached.
fn strip_once(domain: &str) -> String {
    let mut s = domain.trim();

    if let Some(idx) = s.find("://") {
        s = &s[idx + 3..];
    }
    if let Some(idx) = s.find(&['/', '?', '#'][..]) {
        s = &s[..idx];
    }
    if let Some(idx) = s.rfind('@') {
        s = &s[idx + 1..];
    }
    if let Some(idx) = s.find(':') {
        s = &s[..idx];
    }
    s = s.trim_end_matches('.');
    while let Some(rest) = s.strip_prefix("www.") {
        s = rest;
    }

    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_www_prefix_is_stripped() {
        assert_eq!(normalize_domain("www.example.com"), "example.com");
        assert_eq!(normalize_domain("example.com"), "example.com");
        assert_eq!(normalize_domain("www.example.com"), normalize_domain("example.com"));
    }

    #[test]
    fn test_other_subdomains_are_kept() {
        assert_eq!(normalize_domain("www.bank.example.com"), "bank.example.com");
        assert_eq!(normalize_domain("bank.example.com"), "bank.example.com");
    }

    #[test]
    fn test_url_noise_is_removed() {
        assert_eq!(normalize_domain("HTTPS://WWW.DCU.org/bank/savings.html"), "dcu.org");
        assert_eq!(normalize_domain("  www.parkbank.bank:443 "), "parkbank.bank");
        assert_eq!(normalize_domain("huntington.com."), "huntington.com");
        assert_eq!(normalize_domain("www.www.verveacu.com"), "verveacu.com");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let samples = [
            "www.example.com",
            "example.com",
            "WWW.Example.COM/",
            "www. www.x",
            "www.www.",
            "www..",
            "http://user@www.bank.com:8080/a?b#c",
            "www.http://x",
            "",
            "   ",
            "b\u{e4}nk.example",
        ];
        for d in samples {
            let once = normalize_domain(d);
            assert_eq!(normalize_domain(&once), once, "not idempotent for {:?}", d);
        }
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://www.simplicity.coop/rates").as_deref(), Some("www.simplicity.coop"));
        assert_eq!(host_of("https://verveacu.com:8443/personal/").as_deref(), Some("verveacu.com"));
        assert_eq!(host_of("not a url"), None);
    }
}
