//! Site resolution
//!
//! Narrows the account's site list down to the sites a run extracts.

use super::error::ConfigurationError;
use crate::client::{SiteEntry, UNVERIFIED_PERMISSION};

/// Whether the account can extract this site
pub fn is_eligible(entry: &SiteEntry) -> bool {
    let url = entry.site_url.to_ascii_lowercase();
    entry.permission_level != UNVERIFIED_PERMISSION
        && (url.starts_with("http://") || url.starts_with("https://"))
}

/// Identifiers of every eligible site, in backend order
pub fn verified_site_urls(entries: &[SiteEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| is_eligible(entry))
        .map(|entry| entry.site_url.clone())
        .collect()
}

/// Sites to extract.
///
/// Without an allow-list every eligible site is returned. With one, each
/// entry must be eligible; the allow-list is returned in its own order.
pub fn resolve_sites(
    entries: &[SiteEntry],
    allow_list: Option<&[String]>,
) -> Result<Vec<String>, ConfigurationError> {
    let verified = verified_site_urls(entries);

    let allow_list = match allow_list {
        Some(list) if !list.is_empty() => list,
        _ => return Ok(verified),
    };

    let mut sites: Vec<String> = Vec::with_capacity(allow_list.len());
    for site_url in allow_list {
        if !verified.contains(site_url) {
            return Err(ConfigurationError::UnverifiedSite {
                site_url: site_url.clone(),
                valid: verified,
            });
        }
        if !sites.contains(site_url) {
            sites.push(site_url.clone());
        }
    }

    Ok(sites)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<SiteEntry> {
        vec![
            SiteEntry::new("https://example.com/", "siteOwner"),
            SiteEntry::new("http://blog.example.com/", "siteFullUser"),
            SiteEntry::new("https://unverified.com/", "siteUnverifiedUser"),
            SiteEntry::new("sc-domain:example.com", "siteOwner"),
            SiteEntry::new("https://shop.example.com/", "siteRestrictedUser"),
        ]
    }

    #[test]
    fn test_eligibility() {
        let all = entries();
        assert!(is_eligible(&all[0]));
        assert!(is_eligible(&all[1]));
        assert!(!is_eligible(&all[2]));
        assert!(!is_eligible(&all[3]));
        assert!(is_eligible(&all[4]));
    }

    #[test]
    fn test_no_allow_list_returns_all_eligible() {
        let sites = resolve_sites(&entries(), None).unwrap();
        assert_eq!(
            sites,
            vec![
                "https://example.com/",
                "http://blog.example.com/",
                "https://shop.example.com/"
            ]
        );

        let empty: Vec<String> = Vec::new();
        assert_eq!(resolve_sites(&entries(), Some(&empty)).unwrap(), sites);
    }

    #[test]
    fn test_allow_list_keeps_its_order() {
        let allow = vec![
            "https://shop.example.com/".to_string(),
            "https://example.com/".to_string(),
            "https://shop.example.com/".to_string(),
        ];
        let sites = resolve_sites(&entries(), Some(&allow)).unwrap();
        assert_eq!(sites, vec!["https://shop.example.com/", "https://example.com/"]);
    }

    #[test]
    fn test_allow_list_with_unverified_site_fails() {
        let allow = vec![
            "https://example.com/".to_string(),
            "https://unverified.com/".to_string(),
        ];
        let err = resolve_sites(&entries(), Some(&allow)).unwrap_err();

        match err {
            ConfigurationError::UnverifiedSite { site_url, valid } => {
                assert_eq!(site_url, "https://unverified.com/");
                assert_eq!(valid.len(), 3);
                assert!(valid.contains(&"https://example.com/".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_never_returns_ineligible_sites() {
        for site in resolve_sites(&entries(), None).unwrap() {
            assert!(site.starts_with("http"));
            assert_ne!(site, "https://unverified.com/");
        }
    }
}
