//! Scope-indexed credential lookup
//!
//! Each entry maps a scope (a URL prefix such as
//! `http://www.google.com/calendar/feeds/`) to one credential. A lookup for a
//! URL tries the exact key first and then the longest stored scope that is a
//! prefix of the URL, so `http://docs.google.com/feeds/` wins over the
//! catch-all [`SCOPE_ALL`] for a docs URL.
//!
//! Scopes and lookup URLs are compared in the form `url::Url` serializes
//! them (lower-case scheme and host, default port dropped), the same form an
//! [`HttpRequest`] carries. Strings that do not parse as URLs, such as
//! [`SCOPE_ALL`], are compared as given.
//!
//! The map sits behind a `std::sync::RwLock`: lookups run concurrently and
//! writes are short. A poisoned lock is recovered since every write leaves
//! the map consistent.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use gdata_auth::{Credential, HttpRequest};
use tracing::debug;
use url::Url;

/// Scope that matches every `http://` URL.
pub const SCOPE_ALL: &str = "http://";

/// How a URL lookup was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Exact,
    Prefix,
    Miss,
}

impl Lookup {
    /// Label value for the `result` metric label.
    pub fn label(&self) -> &'static str {
        match self {
            Lookup::Exact => "exact",
            Lookup::Prefix => "prefix",
            Lookup::Miss => "miss",
        }
    }
}

fn record_lookup(lookup: Lookup) {
    metrics::counter!("token_store_lookups_total", "result" => lookup.label()).increment(1);
}

/// Thread-safe map of scope to credential.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: RwLock<BTreeMap<String, Credential>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Credential>> {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Credential>> {
        self.tokens.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `credential` under every scope, replacing earlier entries.
    ///
    /// Returns `false` and stores nothing when `scopes` is empty.
    pub fn add<S: AsRef<str>>(&self, credential: Credential, scopes: &[S]) -> bool {
        if scopes.is_empty() {
            return false;
        }
        let mut tokens = self.write();
        for scope in scopes {
            tokens.insert(normalize(scope.as_ref()).into_owned(), credential.clone());
        }
        debug!(kind = credential.kind(), scopes = scopes.len(), "added credential");
        true
    }

    /// Credential for `url`: exact scope first, then the longest prefix.
    pub fn find(&self, url: &str) -> Option<Credential> {
        let url = normalize(url);
        let tokens = self.read();
        let found = match_scope(&tokens, &url).map(|(scope, lookup)| (tokens[scope].clone(), lookup));
        let lookup = found.as_ref().map_or(Lookup::Miss, |(_, lookup)| *lookup);
        record_lookup(lookup);
        found.map(|(credential, _)| credential)
    }

    /// Remove the entry [`find`](Self::find) would return for `url`.
    ///
    /// Other scopes holding the same credential are kept.
    pub fn remove(&self, url: &str) -> bool {
        let url = normalize(url);
        let mut tokens = self.write();
        let Some(scope) = match_scope(&tokens, &url).map(|(scope, _)| scope.to_owned()) else {
            return false;
        };
        tokens.remove(&scope);
        debug!(scope, "removed credential");
        true
    }

    /// Apply the credential for the request's URL.
    ///
    /// Returns `Ok(false)` and leaves the request untouched on a miss.
    pub fn authorize(&self, request: &mut HttpRequest) -> gdata_auth::Result<bool> {
        let Some(credential) = self.find(request.url.as_str()) else {
            return Ok(false);
        };
        credential.apply_to(request)?;
        Ok(true)
    }

    /// Stored scopes, normalized, in sorted order.
    pub fn scopes(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Snapshot of every `(scope, credential)` pair.
    pub fn entries(&self) -> Vec<(String, Credential)> {
        self.read()
            .iter()
            .map(|(scope, cred)| (scope.clone(), cred.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// `raw` as `url::Url` serializes it, or unchanged when it does not parse.
fn normalize(raw: &str) -> Cow<'_, str> {
    match Url::parse(raw) {
        Ok(url) if url.as_str() != raw => Cow::Owned(url.into()),
        _ => Cow::Borrowed(raw),
    }
}

/// Key holding the credential for `url`, and how it matched.
///
/// Stored prefixes of one URL with equal length are the same string, so the
/// longest match is unique.
fn match_scope<'m>(tokens: &'m BTreeMap<String, Credential>, url: &str) -> Option<(&'m str, Lookup)> {
    if let Some((scope, _)) = tokens.get_key_value(url) {
        return Some((scope.as_str(), Lookup::Exact));
    }
    tokens
        .keys()
        .filter(|scope| url.starts_with(scope.as_str()))
        .max_by_key(|scope| scope.len())
        .map(|scope| (scope.as_str(), Lookup::Prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdata_auth::{Consumer, DelegatedCredential, LoginCredential, OAuthCredential};
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

    fn login(value: &str) -> Credential {
        LoginCredential::new(value).into()
    }

    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn add_with_no_scopes_stores_nothing() {
        let store = TokenStore::new();
        assert!(!store.add(login("a"), &[] as &[&str]));
        assert!(store.is_empty());
    }

    #[test]
    fn add_with_no_scopes_leaves_store_unchanged() {
        let store = TokenStore::new();
        store.add(login("kept"), &["http://x/"]);

        assert!(!store.add(login("other"), &[] as &[&str]));
        assert_eq!(store.len(), 1);
        assert_eq!(store.scopes(), vec!["http://x/".to_string()]);
        assert_eq!(store.find("http://x/feed"), Some(login("kept")));
    }

    #[test]
    fn add_registers_every_scope() {
        let store = TokenStore::new();
        assert!(store.add(login("a"), &["http://x/", "http://y/"]));
        assert_eq!(store.len(), 2);
        assert_eq!(store.find("http://x/"), Some(login("a")));
        assert_eq!(store.find("http://y/"), Some(login("a")));
    }

    #[test]
    fn later_add_replaces_scope() {
        let store = TokenStore::new();
        store.add(login("old"), &["http://x/"]);
        store.add(login("new"), &["http://x/"]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.find("http://x/"), Some(login("new")));
    }

    #[test]
    fn find_matches_prefix() {
        let store = TokenStore::new();
        store.add(login("cal"), &["http://www.google.com/calendar/feeds/"]);
        assert_eq!(
            store.find("http://www.google.com/calendar/feeds/default/private/full"),
            Some(login("cal"))
        );
        assert_eq!(store.find("http://www.google.com/m8/feeds/"), None);
    }

    #[test]
    fn exact_match_wins_over_prefix() {
        let store = TokenStore::new();
        store.add(login("all"), &[SCOPE_ALL]);
        store.add(login("exact"), &["http://a.com/feed"]);
        assert_eq!(store.find("http://a.com/feed"), Some(login("exact")));
        assert_eq!(store.find("http://b.com/"), Some(login("all")));
    }

    #[test]
    fn exact_match_wins_in_either_insertion_order() {
        let orders: [[(&str, &str); 2]; 2] = [
            [("http://a.com/x", "exact"), ("http://a.com/", "prefix")],
            [("http://a.com/", "prefix"), ("http://a.com/x", "exact")],
        ];
        for order in orders {
            let store = TokenStore::new();
            for (scope, value) in order {
                store.add(login(value), &[scope]);
            }
            assert_eq!(store.find("http://a.com/x"), Some(login("exact")));
            assert_eq!(store.find("http://a.com/"), Some(login("prefix")));
            assert_eq!(store.find("http://a.com/y"), Some(login("prefix")));
        }
    }

    #[test]
    fn longest_prefix_wins() {
        let store = TokenStore::new();
        store.add(login("all"), &[SCOPE_ALL]);
        store.add(login("docs"), &["http://docs.google.com/"]);
        store.add(login("feeds"), &["http://docs.google.com/feeds/"]);

        for _ in 0..10 {
            assert_eq!(
                store.find("http://docs.google.com/feeds/documents/private/full"),
                Some(login("feeds"))
            );
        }
        assert_eq!(store.find("http://docs.google.com/other"), Some(login("docs")));
    }

    #[test]
    fn scope_all_does_not_match_https() {
        let store = TokenStore::new();
        store.add(login("all"), &[SCOPE_ALL]);
        assert_eq!(store.find("https://a.com/"), None);
    }

    #[test]
    fn remove_deletes_matched_scope_only() {
        let store = TokenStore::new();
        store.add(login("a"), &["http://x/", "http://y/"]);
        assert!(store.remove("http://x/feeds/1"));
        assert_eq!(store.find("http://x/feeds/1"), None);
        assert_eq!(store.find("http://y/"), Some(login("a")));
        assert!(!store.remove("http://z/"));
    }

    #[test]
    fn remove_picks_longest_prefix() {
        let store = TokenStore::new();
        store.add(login("all"), &[SCOPE_ALL]);
        store.add(login("x"), &["http://x/"]);
        assert!(store.remove("http://x/1"));
        assert_eq!(store.scopes(), vec![SCOPE_ALL.to_string()]);
    }

    #[test]
    fn authorize_applies_matching_credential() {
        let store = TokenStore::new();
        store.add(
            DelegatedCredential::new("tok", vec![]).into(),
            &["http://www.google.com/calendar/feeds/"],
        );

        let mut request =
            HttpRequest::parse("GET", "http://www.google.com/calendar/feeds/default").unwrap();
        assert!(store.authorize(&mut request).unwrap());
        assert_eq!(request.authorization(), Some("AuthSub token=tok"));

        let mut miss = HttpRequest::parse("GET", "http://docs.google.com/feeds/").unwrap();
        assert!(!store.authorize(&mut miss).unwrap());
        assert!(miss.authorization().is_none());
    }

    #[test]
    fn authorize_matches_scopes_with_mixed_case_host_and_default_port() {
        let store = TokenStore::new();
        store.add(login("cal"), &["http://WWW.Google.com/calendar/"]);
        store.add(login("feeds"), &["http://b.com:80/feeds/"]);
        store.add(login("secure"), &["https://c.com:443/data/"]);

        for (url, expected) in [
            ("http://WWW.Google.com/calendar/default", "cal"),
            ("http://b.com:80/feeds/1", "feeds"),
            ("https://c.com/data/1", "secure"),
        ] {
            assert_eq!(store.find(url), Some(login(expected)), "{url}");
            let mut request = HttpRequest::parse("GET", url).unwrap();
            assert!(store.authorize(&mut request).unwrap(), "{url}");
            let header = format!("GoogleLogin auth={expected}");
            assert_eq!(request.authorization(), Some(header.as_str()));
        }
        assert_eq!(
            store.scopes(),
            vec![
                "http://b.com/feeds/".to_string(),
                "http://www.google.com/calendar/".to_string(),
                "https://c.com/data/".to_string(),
            ]
        );
    }

    #[test]
    fn remove_normalizes_the_url() {
        let store = TokenStore::new();
        store.add(login("a"), &["http://b.com/feeds/"]);
        assert!(store.remove("http://B.com:80/feeds/1"));
        assert!(store.is_empty());
    }

    #[test]
    fn unparsable_scopes_are_kept_verbatim() {
        let store = TokenStore::new();
        store.add(login("all"), &[SCOPE_ALL]);
        assert_eq!(store.scopes(), vec![SCOPE_ALL.to_string()]);
        assert_eq!(store.find("http://anything/"), Some(login("all")));
    }

    #[test]
    fn holds_oauth_credentials() {
        let store = TokenStore::new();
        let oauth: Credential =
            OAuthCredential::from_access_token(Consumer::new("ck", "cs"), "T", "S").into();
        store.add(oauth.clone(), &["http://x/"]);
        assert_eq!(store.find("http://x/a"), Some(oauth));
    }

    #[test]
    fn concurrent_readers_and_writers() {
        let store = std::sync::Arc::new(TokenStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let scope = format!("http://host{i}/");
                    store.add(login(&i.to_string()), &[scope.as_str()]);
                    store.find(&format!("{scope}feed"))
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), Some(login(&i.to_string())));
        }
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn lookups_are_counted_by_result() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let store = TokenStore::new();
        store.add(login("a"), &["http://x/"]);
        store.find("http://x/");
        store.find("http://x/feed");
        store.find("http://y/");

        let output = handle.render();
        assert!(output.contains("token_store_lookups_total"), "{output}");
        assert!(output.contains("result=\"exact\""), "{output}");
        assert!(output.contains("result=\"prefix\""), "{output}");
        assert!(output.contains("result=\"miss\""), "{output}");
    }
}
