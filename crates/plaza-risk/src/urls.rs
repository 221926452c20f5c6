// SPDX-FileCopyrightText: 2026 Plaza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! URL risk analysis for embedded links.
//!
//! Static checks only: no DNS resolution, no network. A link to a
//! marketplace domain carries no penalty; anything else accrues risk up
//! to a configurable cap.

use regex::Regex;
use url::{Host, Url};

/// Known URL shorteners, routinely used to disguise payment-redirect links.
const SHORTENER_DOMAINS: &[&str] = &[
    "bit.ly", "tinyurl.com", "t.co", "goo.gl", "is.gd", "cutt.ly", "rb.gy", "ow.ly",
];

/// Outcome of scanning one text for risky links.
#[derive(Debug, Default, Clone)]
pub struct UrlFindings {
    /// Combined penalty, capped by the caller-supplied maximum.
    pub penalty: u8,
    /// Factor tags for each finding.
    pub factors: Vec<String>,
}

/// Scan `text` for embedded links and score them.
///
/// Penalties per link: raw IP host +50, shortener +40, unparseable +30,
/// any other non-marketplace domain +25. The sum is capped at
/// `max_penalty`.
pub fn analyze_urls(
    text: &str,
    url_pattern: &Regex,
    marketplace_domains: &[String],
    max_penalty: u8,
) -> UrlFindings {
    let mut findings = UrlFindings::default();
    let mut total: u32 = 0;

    for m in url_pattern.find_iter(text) {
        let raw = m.as_str().trim_end_matches(['.', ',', ';', ')']);
        let candidate = if raw.to_lowercase().starts_with("www.") {
            format!("http://{raw}")
        } else {
            raw.to_string()
        };

        let Ok(parsed) = Url::parse(&candidate) else {
            total += 30;
            findings.factors.push("malformed_url".to_string());
            continue;
        };

        match parsed.host() {
            Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => {
                total += 50;
                findings.factors.push("ip_literal_url".to_string());
            }
            Some(Host::Domain(domain)) => {
                let domain = domain.to_lowercase();
                if is_shortener(&domain) {
                    total += 40;
                    findings.factors.push("shortened_url".to_string());
                } else if !is_marketplace(&domain, marketplace_domains) {
                    total += 25;
                    findings.factors.push("external_url".to_string());
                }
            }
            None => {
                total += 30;
                findings.factors.push("malformed_url".to_string());
            }
        }
    }

    findings.penalty = total.min(u32::from(max_penalty)) as u8;
    findings
}

fn is_shortener(domain: &str) -> bool {
    SHORTENER_DOMAINS
        .iter()
        .any(|s| domain == *s || domain.ends_with(&format!(".{s}")))
}

fn is_marketplace(domain: &str, marketplace_domains: &[String]) -> bool {
    marketplace_domains.iter().any(|d| {
        let d = d.to_lowercase();
        domain == d || domain.ends_with(&format!(".{d}"))
    })
}
