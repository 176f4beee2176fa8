//! Structured data layer: named path probes over the page's bootstrap JSON.
//!
//! The channel page embeds its initial state as a large JSON object
//! (`ytInitialData`). Its shape changes often, so field locations are kept as
//! data: each field has an ordered list of probes, and the first probe that
//! yields a non-empty value wins.

use serde_json::{Deserializer, Value};

/// Name of the bootstrap object on channel and search pages.
pub const INITIAL_DATA_VAR: &str = "ytInitialData";

/// Script evaluated in the page to read the bootstrap object.
pub const INITIAL_DATA_SCRIPT: &str = "window.ytInitialData";

/// One step of a probe path.
#[derive(Debug, Clone, Copy)]
pub enum Seg {
    /// Object member
    Key(&'static str),
    /// Array element
    Index(usize),
    /// Every array element (fan-out)
    Each,
}

use Seg::{Each, Index, Key};

/// Subtree a field probe is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Root,
    AboutViewModel,
    LegacyAbout,
    HeaderMetadataParts,
}

/// A field location: scope, relative path, and an optional required substring
/// used to pick one entry out of a mixed list (e.g. "subscribers" vs "videos").
struct FieldProbe {
    scope: Scope,
    path: &'static [Seg],
    must_contain: Option<&'static str>,
}

const fn at(scope: Scope, path: &'static [Seg]) -> FieldProbe {
    FieldProbe {
        scope,
        path,
        must_contain: None,
    }
}

const fn containing(scope: Scope, path: &'static [Seg], needle: &'static str) -> FieldProbe {
    FieldProbe {
        scope,
        path,
        must_contain: Some(needle),
    }
}

const ABOUT_VIEW_MODEL: &[&[Seg]] = &[
    &[
        Key("onResponseReceivedEndpoints"), Each, Key("showEngagementPanelEndpoint"),
        Key("engagementPanel"), Key("engagementPanelSectionListRenderer"), Key("content"),
        Key("sectionListRenderer"), Key("contents"), Each, Key("itemSectionRenderer"),
        Key("contents"), Each, Key("aboutChannelRenderer"), Key("metadata"),
        Key("aboutChannelViewModel"),
    ],
    &[
        Key("onResponseReceivedEndpoints"), Each, Key("appendContinuationItemsAction"),
        Key("continuationItems"), Each, Key("aboutChannelRenderer"), Key("metadata"),
        Key("aboutChannelViewModel"),
    ],
];

const LEGACY_ABOUT: &[&[Seg]] = &[&[
    Key("contents"), Key("twoColumnBrowseResultsRenderer"), Key("tabs"), Each,
    Key("tabRenderer"), Key("content"), Key("sectionListRenderer"), Key("contents"), Each,
    Key("itemSectionRenderer"), Key("contents"), Each, Key("channelAboutFullMetadataRenderer"),
]];

const HEADER_METADATA_PARTS: &[&[Seg]] = &[&[
    Key("header"), Key("pageHeaderRenderer"), Key("content"), Key("pageHeaderViewModel"),
    Key("metadata"), Key("contentMetadataViewModel"), Key("metadataRows"), Each,
    Key("metadataParts"), Each, Key("text"),
]];

const NAME: &[FieldProbe] = &[
    at(Scope::Root, &[Key("metadata"), Key("channelMetadataRenderer"), Key("title")]),
    at(Scope::Root, &[Key("header"), Key("pageHeaderRenderer"), Key("pageTitle")]),
    at(Scope::Root, &[Key("header"), Key("c4TabbedHeaderRenderer"), Key("title")]),
    at(Scope::LegacyAbout, &[Key("title")]),
];

const SUBSCRIBERS: &[FieldProbe] = &[
    at(Scope::AboutViewModel, &[Key("subscriberCountText")]),
    at(Scope::Root, &[Key("header"), Key("c4TabbedHeaderRenderer"), Key("subscriberCountText")]),
    containing(Scope::HeaderMetadataParts, &[], "subscriber"),
];

const VIDEOS: &[FieldProbe] = &[
    at(Scope::AboutViewModel, &[Key("videoCountText")]),
    at(Scope::Root, &[Key("header"), Key("c4TabbedHeaderRenderer"), Key("videosCountText")]),
    containing(Scope::HeaderMetadataParts, &[], "video"),
];

const VIEWS: &[FieldProbe] = &[
    at(Scope::AboutViewModel, &[Key("viewCountText")]),
    at(Scope::LegacyAbout, &[Key("viewCountText")]),
];

const DESCRIPTION: &[FieldProbe] = &[
    at(Scope::AboutViewModel, &[Key("description")]),
    at(Scope::LegacyAbout, &[Key("description")]),
    at(Scope::Root, &[Key("metadata"), Key("channelMetadataRenderer"), Key("description")]),
];

const LOCATION: &[FieldProbe] = &[
    at(Scope::AboutViewModel, &[Key("country")]),
    at(Scope::LegacyAbout, &[Key("country")]),
];

const JOINED: &[FieldProbe] = &[
    at(Scope::AboutViewModel, &[Key("joinedDateText")]),
    at(Scope::LegacyAbout, &[Key("joinedDateText")]),
];

const AVATAR: &[FieldProbe] = &[
    at(
        Scope::Root,
        &[Key("metadata"), Key("channelMetadataRenderer"), Key("avatar"), Key("thumbnails"), Index(0), Key("url")],
    ),
    at(
        Scope::Root,
        &[Key("header"), Key("c4TabbedHeaderRenderer"), Key("avatar"), Key("thumbnails"), Index(0), Key("url")],
    ),
    at(
        Scope::Root,
        &[
            Key("header"), Key("pageHeaderRenderer"), Key("content"), Key("pageHeaderViewModel"),
            Key("image"), Key("decoratedAvatarViewModel"), Key("avatar"), Key("avatarViewModel"),
            Key("image"), Key("sources"), Index(0), Key("url"),
        ],
    ),
];

/// Link probes collect every match rather than the first.
const LINKS: &[FieldProbe] = &[
    at(
        Scope::AboutViewModel,
        &[
            Key("links"), Each, Key("channelExternalLinkViewModel"), Key("link"), Key("commandRuns"),
            Each, Key("onTap"), Key("innertubeCommand"), Key("urlEndpoint"), Key("url"),
        ],
    ),
    at(
        Scope::AboutViewModel,
        &[Key("links"), Each, Key("channelExternalLinkViewModel"), Key("link"), Key("content")],
    ),
    at(
        Scope::LegacyAbout,
        &[Key("primaryLinks"), Each, Key("navigationEndpoint"), Key("urlEndpoint"), Key("url")],
    ),
    at(
        Scope::Root,
        &[
            Key("header"), Key("c4TabbedHeaderRenderer"), Key("headerLinks"),
            Key("channelHeaderLinksRenderer"), Key("primaryLinks"), Each, Key("navigationEndpoint"),
            Key("urlEndpoint"), Key("url"),
        ],
    ),
    at(
        Scope::Root,
        &[
            Key("header"), Key("c4TabbedHeaderRenderer"), Key("headerLinks"),
            Key("channelHeaderLinksRenderer"), Key("secondaryLinks"), Each, Key("navigationEndpoint"),
            Key("urlEndpoint"), Key("url"),
        ],
    ),
];

const BADGES: &[FieldProbe] = &[
    at(
        Scope::Root,
        &[Key("header"), Key("c4TabbedHeaderRenderer"), Key("badges"), Each, Key("metadataBadgeRenderer"), Key("tooltip")],
    ),
    at(
        Scope::Root,
        &[
            Key("header"), Key("pageHeaderRenderer"), Key("content"), Key("pageHeaderViewModel"),
            Key("title"), Key("dynamicTextViewModel"), Key("text"), Key("attachmentRuns"), Each,
            Key("element"), Key("type"), Key("imageType"), Key("image"), Key("sources"), Each,
            Key("clientResource"), Key("imageName"),
        ],
    ),
];

/// Fields read from the structured data object. `None` means "not found here".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredFields {
    /// Raw name node (may be a nested text object)
    pub name: Option<Value>,
    pub subscribers: Option<String>,
    pub videos: Option<String>,
    pub views: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub joined: Option<String>,
    pub avatar: Option<String>,
    pub links: Vec<String>,
    /// Badge tooltips or badge image names
    pub badges: Vec<String>,
}

/// Follows a path, fanning out at every `Each`.
pub fn probe_all<'a>(root: &'a Value, path: &[Seg]) -> Vec<&'a Value> {
    let mut current = vec![root];
    for seg in path {
        let mut next = Vec::new();
        for node in current {
            match (seg, node) {
                (Key(k), Value::Object(map)) => next.extend(map.get(*k)),
                (Index(i), Value::Array(items)) => next.extend(items.get(*i)),
                (Each, Value::Array(items)) => next.extend(items.iter()),
                _ => {}
            }
        }
        if next.is_empty() {
            return next;
        }
        current = next;
    }
    current.into_iter().filter(|v| !v.is_null()).collect()
}

/// First non-null value at a path.
pub fn probe<'a>(root: &'a Value, path: &[Seg]) -> Option<&'a Value> {
    probe_all(root, path).into_iter().next()
}

/// Unwraps the text shapes used throughout the bootstrap object.
///
/// Tries, in order: plain string, `content`, `simpleText`, `runs[].text`
/// (concatenated) and `text`. Returns `None` for empty results.
pub fn text_of(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => {
            if let Some(t) = map.get("content").and_then(text_of) {
                t
            } else if let Some(t) = map.get("simpleText").and_then(text_of) {
                t
            } else if let Some(Value::Array(runs)) = map.get("runs") {
                runs.iter()
                    .filter_map(|r| r.get("text").and_then(Value::as_str))
                    .collect::<String>()
            } else if let Some(t) = map.get("text").and_then(text_of) {
                t
            } else {
                return None;
            }
        }
        _ => return None,
    };
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn scope_roots<'a>(root: &'a Value, scope: Scope) -> Vec<&'a Value> {
    let paths: &[&[Seg]] = match scope {
        Scope::Root => return vec![root],
        Scope::AboutViewModel => ABOUT_VIEW_MODEL,
        Scope::LegacyAbout => LEGACY_ABOUT,
        Scope::HeaderMetadataParts => HEADER_METADATA_PARTS,
    };
    paths.iter().flat_map(|p| probe_all(root, p)).collect()
}

fn matches_filter(probe: &FieldProbe, value: &Value) -> bool {
    match probe.must_contain {
        None => true,
        Some(needle) => text_of(value).is_some_and(|t| t.to_lowercase().contains(needle)),
    }
}

fn first_node<'a>(root: &'a Value, probes: &[FieldProbe]) -> Option<&'a Value> {
    probes.iter().find_map(|probe| {
        scope_roots(root, probe.scope)
            .into_iter()
            .flat_map(|base| probe_all(base, probe.path))
            .find(|v| text_of(v).is_some() && matches_filter(probe, v))
    })
}

fn first_text(root: &Value, probes: &[FieldProbe]) -> Option<String> {
    first_node(root, probes).and_then(text_of)
}

fn all_texts(root: &Value, probes: &[FieldProbe]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for probe in probes {
        for base in scope_roots(root, probe.scope) {
            for value in probe_all(base, probe.path) {
                if let Some(t) = text_of(value) {
                    if !out.contains(&t) {
                        out.push(t);
                    }
                }
            }
        }
    }
    out
}

/// Display links sometimes lack a scheme ("instagram.com/maker").
fn with_scheme(link: String) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        link
    } else {
        format!("https://{link}")
    }
}

/// Reads every known field from the bootstrap object.
pub fn read_structured_fields(data: &Value) -> StructuredFields {
    let mut links: Vec<String> = Vec::new();
    for link in all_texts(data, LINKS).into_iter().map(with_scheme) {
        if !links.contains(&link) {
            links.push(link);
        }
    }

    StructuredFields {
        name: first_node(data, NAME).cloned(),
        subscribers: first_text(data, SUBSCRIBERS),
        videos: first_text(data, VIDEOS),
        views: first_text(data, VIEWS),
        description: first_text(data, DESCRIPTION),
        location: first_text(data, LOCATION),
        joined: first_text(data, JOINED),
        avatar: first_text(data, AVATAR),
        links,
        badges: all_texts(data, BADGES),
    }
}

/// Extracts a JSON object assigned to a global in inline page script.
///
/// Recognizes `var NAME = {...}`, `window["NAME"] = {...}` and
/// `window.NAME = {...}`. Only the first complete JSON value after the
/// assignment is parsed, so trailing script is ignored.
pub fn extract_bootstrap_object(html: &str, var_name: &str) -> Option<Value> {
    let markers = [
        format!("var {var_name} = "),
        format!("window[\"{var_name}\"] = "),
        format!("window.{var_name} = "),
        format!("{var_name} = "),
    ];
    for marker in &markers {
        let mut search_from = 0;
        while let Some(found) = html[search_from..].find(marker.as_str()) {
            let start = search_from + found + marker.len();
            search_from = start;
            let rest = html[start..].trim_start();
            if !rest.starts_with('{') {
                continue;
            }
            let mut stream = Deserializer::from_str(rest).into_iter::<Value>();
            match stream.next() {
                Some(Ok(value)) if value.is_object() => return Some(value),
                Some(Err(e)) => log::debug!("Bootstrap object {} did not parse: {}", var_name, e),
                _ => {}
            }
        }
    }
    None
}
