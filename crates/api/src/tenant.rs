//! Host-header subdomain extraction.

/// The tenant subdomain carried by `host`, if any.
///
/// The port is ignored. `localhost`, IP literals and hosts with fewer than
/// three labels carry no subdomain: `acme.fieldops.app` → `acme`, while
/// `fieldops.app` and `acme.localhost` → `None`.
pub fn subdomain_from_host(host: &str) -> Option<String> {
    let host = host.trim();
    if host.starts_with('[') {
        return None;
    }
    let host = host.split(':').next().unwrap_or(host);
    if host.eq_ignore_ascii_case("localhost") || host.parse::<std::net::Ipv4Addr>().is_ok() {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 3 || labels.iter().any(|l| l.is_empty()) {
        return None;
    }
    if labels.last().is_some_and(|l| l.eq_ignore_ascii_case("localhost")) {
        return None;
    }
    Some(labels[0].to_ascii_lowercase())
}
