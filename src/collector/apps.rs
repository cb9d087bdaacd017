//! Installed-app detection through URL-scheme probing.

use tracing::debug;

/// Apps probed by default, with the URL scheme each one registers.
pub const KNOWN_APPS: [(&str, &str); 3] = [
    ("WhatsApp", "whatsapp://"),
    ("Facebook", "fb://"),
    ("Instagram", "instagram://"),
];

/// Answers whether the platform has a handler for a URL scheme.
pub trait SchemeProbe {
    fn can_open(&self, scheme: &str) -> bool;
}

impl<F> SchemeProbe for F
where
    F: Fn(&str) -> bool,
{
    fn can_open(&self, scheme: &str) -> bool {
        self(scheme)
    }
}

/// Names of the apps whose scheme the probe can open, in input order.
///
/// A name listed twice is reported once.
pub fn detect_installed_apps<P: SchemeProbe + ?Sized>(
    probe: &P,
    candidates: &[(&str, &str)],
) -> Vec<String> {
    let mut installed: Vec<String> = Vec::new();
    for (name, scheme) in candidates {
        if installed.iter().any(|n| n == name) {
            continue;
        }
        if probe.can_open(scheme) {
            debug!(app = name, scheme, "App detected");
            installed.push(name.to_string());
        }
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_in_fixed_order() {
        let probe = |scheme: &str| scheme == "instagram://" || scheme == "whatsapp://";
        let apps = detect_installed_apps(&probe, &KNOWN_APPS);
        assert_eq!(apps, vec!["WhatsApp", "Instagram"]);
    }

    #[test]
    fn test_nothing_installed() {
        let probe = |_: &str| false;
        assert!(detect_installed_apps(&probe, &KNOWN_APPS).is_empty());
    }

    #[test]
    fn test_no_duplicates() {
        let probe = |_: &str| true;
        let candidates = [
            ("Facebook", "fb://"),
            ("Facebook", "fb://"),
            ("WhatsApp", "whatsapp://"),
        ];
        assert_eq!(
            detect_installed_apps(&probe, &candidates),
            vec!["Facebook", "WhatsApp"]
        );
    }
}
