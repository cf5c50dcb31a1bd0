//! `Set-Cookie` rewriting for cross-site sessions.
//!
//! Upstream cookies are scoped to the upstream host. Each one is rewritten
//! so the browser stores it for the relay's host and sends it back on
//! credentialed cross-site requests: `Domain` becomes the inbound request's
//! hostname, `SameSite` becomes `None` and `Secure` is always present.
//! Every other attribute keeps its spelling and relative order.

use std::fmt;

use crate::config::SameSitePolicy;

/// One `;`-separated attribute following the name/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieAttribute {
    pub key: String,
    pub value: Option<String>,
}

impl CookieAttribute {
    fn new(key: &str, value: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }

    fn parse(segment: &str) -> Self {
        match segment.split_once('=') {
            Some((key, value)) => Self::new(key.trim(), Some(value.trim())),
            None => Self::new(segment, None),
        }
    }

    fn is(&self, key: &str) -> bool {
        self.key.eq_ignore_ascii_case(key)
    }
}

impl fmt::Display for CookieAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.key, value),
            None => f.write_str(&self.key),
        }
    }
}

/// A parsed `Set-Cookie` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// `name=value`, untouched.
    pub main_part: String,
    pub attributes: Vec<CookieAttribute>,
}

impl Cookie {
    /// Parse a single `Set-Cookie` value. Returns `None` for empty input.
    pub fn parse(header: &str) -> Option<Self> {
        let mut segments = header.split(';').map(str::trim);

        let main_part = segments.next().filter(|s| !s.is_empty())?.to_string();
        let attributes = segments
            .filter(|s| !s.is_empty())
            .map(CookieAttribute::parse)
            .collect();

        Some(Self {
            main_part,
            attributes,
        })
    }

    /// Scope the cookie to `hostname` for cross-site use.
    ///
    /// Afterwards the cookie carries exactly one `Domain`, one `SameSite`
    /// and one `Secure` attribute. Recognized attributes are replaced where
    /// they stood; missing ones are appended in that order.
    pub fn rewrite(&mut self, hostname: &str, policy: SameSitePolicy) {
        let mut domain_seen = false;
        let mut same_site_seen = false;
        let mut secure_seen = false;

        let mut rewritten = Vec::with_capacity(self.attributes.len() + 3);
        for attr in self.attributes.drain(..) {
            if attr.is("Domain") {
                if !domain_seen {
                    rewritten.push(CookieAttribute::new("Domain", Some(hostname)));
                    domain_seen = true;
                }
            } else if attr.is("SameSite") {
                if !same_site_seen {
                    rewritten.push(match policy {
                        SameSitePolicy::ForceNone => CookieAttribute::new("SameSite", Some("None")),
                        SameSitePolicy::Preserve => attr,
                    });
                    same_site_seen = true;
                }
            } else if attr.is("Secure") {
                if !secure_seen {
                    rewritten.push(CookieAttribute::new("Secure", None));
                    secure_seen = true;
                }
            } else {
                rewritten.push(attr);
            }
        }

        if !domain_seen {
            rewritten.push(CookieAttribute::new("Domain", Some(hostname)));
        }
        if !same_site_seen {
            rewritten.push(CookieAttribute::new("SameSite", Some("None")));
        }
        if !secure_seen {
            rewritten.push(CookieAttribute::new("Secure", None));
        }

        self.attributes = rewritten;
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.main_part)?;
        for attr in &self.attributes {
            write!(f, "; {}", attr)?;
        }
        Ok(())
    }
}

/// Parse, rewrite and serialize one `Set-Cookie` value.
///
/// Returns `None` when the value cannot be parsed; callers drop it.
pub fn rewrite_set_cookie(header: &str, hostname: &str, policy: SameSitePolicy) -> Option<String> {
    let mut cookie = Cookie::parse(header)?;
    cookie.rewrite(hostname, policy);
    Some(cookie.to_string())
}
