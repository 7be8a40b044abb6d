//! Cache fingerprinting (spec.md §4.1.3): a fixed-width digest of
//! `service || method || path || canonical(query)`, where `canonical`
//! totally orders query keys with URL-decoded values.

use sha2::{Digest, Sha256};

use crate::domain::service_kind::ServiceKind;

pub fn fingerprint(service: ServiceKind, method: &str, path: &str, query: &[(String, String)]) -> String {
    let mut sorted = query.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    let mut hasher = Sha256::new();
    hasher.update(service.path_prefix().as_bytes());
    hasher.update(b"|");
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"|");
    hasher.update(path.as_bytes());
    for (k, v) in &sorted {
        hasher.update(b"|");
        hasher.update(k.as_bytes());
        hasher.update(b"=");
        hasher.update(v.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_key_order_does_not_affect_fingerprint() {
        let a = fingerprint(
            ServiceKind::Chart,
            "GET",
            "/history",
            &[("b".into(), "2".into()), ("a".into(), "1".into())],
        );
        let b = fingerprint(
            ServiceKind::Chart,
            "GET",
            "/history",
            &[("a".into(), "1".into()), ("b".into(), "2".into())],
        );
        assert_eq!(a, b);
    }

    #[test]
    fn different_services_never_collide() {
        let a = fingerprint(ServiceKind::Chart, "GET", "/history", &[]);
        let b = fingerprint(ServiceKind::News, "GET", "/history", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn method_case_is_normalized() {
        let a = fingerprint(ServiceKind::Chart, "get", "/x", &[]);
        let b = fingerprint(ServiceKind::Chart, "GET", "/x", &[]);
        assert_eq!(a, b);
    }
}
