//! Outbound link categorization.
//!
//! Sorts the links found on a channel page into a closed taxonomy of platforms.
//! Links wrapped in a redirector (`...?q=<destination>`) are unwrapped first.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use url::Url;

use super::cleanup::clean_url;

/// Platform buckets for outbound links.
///
/// Variant order is the matching precedence: the first platform whose domain
/// matches wins. `Website` is the catch-all and is never matched by domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Youtube,
    Instagram,
    Twitter,
    Facebook,
    Linkedin,
    Pinterest,
    Reddit,
    Tumblr,
    Tiktok,
    Twitch,
    Onlyfans,
    Spotify,
    Soundcloud,
    Discord,
    Patreon,
    Github,
    Website,
}

impl Platform {
    /// Returns the string representation used as the output key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::Linkedin => "linkedin",
            Platform::Pinterest => "pinterest",
            Platform::Reddit => "reddit",
            Platform::Tumblr => "tumblr",
            Platform::Tiktok => "tiktok",
            Platform::Twitch => "twitch",
            Platform::Onlyfans => "onlyfans",
            Platform::Spotify => "spotify",
            Platform::Soundcloud => "soundcloud",
            Platform::Discord => "discord",
            Platform::Patreon => "patreon",
            Platform::Github => "github",
            Platform::Website => "website",
        }
    }

    /// Known domains for the platform. A host matches if it equals one of these
    /// or is a subdomain of one.
    pub fn domains(&self) -> &'static [&'static str] {
        match self {
            Platform::Youtube => &["youtube.com", "youtu.be", "youtube-nocookie.com"],
            Platform::Instagram => &["instagram.com", "instagr.am"],
            Platform::Twitter => &["twitter.com", "x.com"],
            Platform::Facebook => &["facebook.com", "fb.com", "fb.me"],
            Platform::Linkedin => &["linkedin.com", "lnkd.in"],
            Platform::Pinterest => &["pinterest.com", "pinterest.co.uk", "pin.it"],
            Platform::Reddit => &["reddit.com", "redd.it"],
            Platform::Tumblr => &["tumblr.com"],
            Platform::Tiktok => &["tiktok.com"],
            Platform::Twitch => &["twitch.tv"],
            Platform::Onlyfans => &["onlyfans.com"],
            Platform::Spotify => &["spotify.com"],
            Platform::Soundcloud => &["soundcloud.com"],
            Platform::Discord => &["discord.gg", "discord.com", "discordapp.com"],
            Platform::Patreon => &["patreon.com"],
            Platform::Github => &["github.com"],
            Platform::Website => &[],
        }
    }

    fn matches_host(&self, host: &str) -> bool {
        self.domains()
            .iter()
            .any(|d| host == *d || host.strip_suffix(*d).is_some_and(|p| p.ends_with('.')))
    }
}

/// Per-platform link lists. Every platform key is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PlatformLinks(BTreeMap<Platform, Vec<String>>);

impl PlatformLinks {
    /// Creates a map with an empty list for every platform.
    pub fn empty() -> Self {
        PlatformLinks(Platform::iter().map(|p| (p, Vec::new())).collect())
    }

    /// Links for one platform.
    pub fn get(&self, platform: Platform) -> &[String] {
        self.0.get(&platform).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of categorized links.
    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    fn push(&mut self, platform: Platform, url: String) {
        let bucket = self.0.entry(platform).or_default();
        if !bucket.contains(&url) {
            bucket.push(url);
        }
    }
}

impl Default for PlatformLinks {
    fn default() -> Self {
        Self::empty()
    }
}

/// Returns the decoded `q` destination if the URL is a redirect wrapper.
fn unwrap_redirect(url: &Url) -> Option<Url> {
    let (_, destination) = url.query_pairs().find(|(k, _)| k == "q")?;
    let target = Url::parse(destination.as_ref()).ok()?;
    matches!(target.scheme(), "http" | "https").then_some(target)
}

/// Classifies a set of outbound URLs into platform buckets.
///
/// Redirect wrappers are replaced by their destinations, then the direct and
/// resolved URLs are deduplicated as one candidate set. Each candidate lands in
/// at most one bucket: YouTube links go to `youtube`, the first matching
/// platform otherwise, and remaining http(s) links go to `website`.
///
/// # Arguments
///
/// * `urls` - Raw outbound URLs in discovery order
///
/// # Returns
///
/// A `PlatformLinks` with every platform key present.
pub fn categorize<S: AsRef<str>>(urls: &[S]) -> PlatformLinks {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for raw in urls {
        let Ok(parsed) = Url::parse(raw.as_ref().trim()) else {
            log::debug!("Skipping unparseable link {:?}", raw.as_ref());
            continue;
        };
        let resolved = unwrap_redirect(&parsed).unwrap_or(parsed);
        if seen.insert(resolved.to_string()) {
            candidates.push(resolved);
        }
    }

    let mut links = PlatformLinks::empty();
    for url in candidates {
        if !matches!(url.scheme(), "http" | "https") {
            continue;
        }
        let host = url.host_str().unwrap_or_default().to_lowercase();
        let platform = Platform::iter()
            .filter(|p| *p != Platform::Website)
            .find(|p| p.matches_host(&host));

        match platform {
            Some(Platform::Spotify) => {
                let has_profile_segment = url
                    .path_segments()
                    .is_some_and(|mut segs| segs.any(|s| s == "user" || s == "artist"));
                if has_profile_segment {
                    links.push(Platform::Spotify, url.to_string());
                } else {
                    links.push(Platform::Website, url.to_string());
                }
            }
            Some(Platform::Tiktok) => links.push(Platform::Tiktok, clean_url(url.as_str())),
            Some(p) => links.push(p, url.to_string()),
            None => links.push(Platform::Website, url.to_string()),
        }
    }
    links
}
