//! Custom URL schemes raised by the chapter document
//!
//! Highlight taps, narration links and click listeners are reported by the
//! document as navigations to custom schemes. `classify` turns an outgoing
//! request into the action the page should take.

use crate::config::ClassBasedOnClickListener;
use crate::geometry::{Point, Rect};

pub const HIGHLIGHT_SCHEME: &str = "highlight";
pub const HIGHLIGHT_WITH_NOTE_SCHEME: &str = "highlight-with-note";
pub const PLAY_AUDIO_SCHEME: &str = "play-audio";

const CLIENT_X: &str = "/clientX=";

/// What the page should do with an outgoing request
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationAction {
    /// Tap on existing highlight markup: show the highlight menu at `rect`
    ShowHighlightMenu { rect: Rect, with_note: bool },
    /// Narration link for a fragment of the current chapter
    PlayAudio { fragment_id: String },
    /// Link to a chapter file, possibly with an `#anchor`
    InternalLink { path: String, anchor: Option<String> },
    /// `#anchor` within the current document
    Anchor { anchor: String },
    /// Click on an element watched by a class-based click listener
    ClickListener {
        scheme: String,
        content: Option<String>,
        point: Point,
    },
    /// Web link the user tapped
    OpenExternal { url: String },
    /// Anything else: offer it to the system opener
    OpenWithSystem { url: String },
    /// Let the surface load it
    Allow,
    /// Drop it
    Cancel,
}

/// Classify a request leaving the chapter document
pub fn classify(url: &str, link_activated: bool, listeners: &[ClassBasedOnClickListener]) -> NavigationAction {
    let Some((scheme, _)) = url.split_once(':') else {
        return NavigationAction::Allow;
    };

    match scheme {
        HIGHLIGHT_SCHEME | HIGHLIGHT_WITH_NOTE_SCHEME => {
            let Some(payload) = decoded_payload(url, scheme) else {
                return NavigationAction::Cancel;
            };
            NavigationAction::ShowHighlightMenu {
                rect: parse_rect(&payload),
                with_note: scheme == HIGHLIGHT_WITH_NOTE_SCHEME,
            }
        }
        PLAY_AUDIO_SCHEME => match decoded_payload(url, scheme) {
            Some(fragment_id) => NavigationAction::PlayAudio { fragment_id },
            None => NavigationAction::Cancel,
        },
        "file" => classify_file(url),
        "mailto" => NavigationAction::Allow,
        _ => {
            if url != "about:blank" && scheme.contains("http") && link_activated {
                return NavigationAction::OpenExternal { url: url.to_string() };
            }

            if let Some(action) = classify_click_listener(url, scheme, listeners) {
                return action;
            }

            NavigationAction::OpenWithSystem { url: url.to_string() }
        }
    }
}

/// Percent-decoded text after `<scheme>://`
fn decoded_payload(url: &str, scheme: &str) -> Option<String> {
    let decoded = urlencoding::decode(url).ok()?;
    let prefix = format!("{}://", scheme);
    let payload = decoded.strip_prefix(&prefix).unwrap_or(&decoded[scheme.len() + 1..]);
    Some(payload.to_string())
}

fn classify_file(url: &str) -> NavigationAction {
    let rest = url.strip_prefix("file://").unwrap_or(&url["file:".len()..]);
    let (path, anchor) = match rest.split_once('#') {
        Some((path, anchor)) => (path, Some(anchor).filter(|a| !a.is_empty())),
        None => (rest, None),
    };
    let path = urlencoding::decode(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_string());

    let has_extension = path
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(stem, ext)| !stem.is_empty() && !ext.is_empty());

    if has_extension {
        return NavigationAction::InternalLink {
            path,
            anchor: anchor.map(str::to_string),
        };
    }

    match anchor {
        Some(anchor) => NavigationAction::Anchor {
            anchor: anchor.to_string(),
        },
        None => NavigationAction::Allow,
    }
}

fn classify_click_listener(
    url: &str,
    scheme: &str,
    listeners: &[ClassBasedOnClickListener],
) -> Option<NavigationAction> {
    let listener = listeners.iter().find(|l| l.scheme_name == scheme)?;
    let split = url.find(CLIENT_X)?;
    let point = parse_touch_point(&url[split..])?;

    let base = &url[..split];
    let raw_content = base.replace(&format!("{}://", scheme), "");
    let content = urlencoding::decode(&raw_content).ok().map(|c| c.into_owned());

    Some(NavigationAction::ClickListener {
        scheme: listener.scheme_name.clone(),
        content,
        point,
    })
}

/// Parse `/clientX=188&clientY=292` into a point
pub fn parse_touch_point(parameters: &str) -> Option<Point> {
    let stripped = parameters.replace(CLIENT_X, "").replace("clientY=", "");
    let mut values = stripped.split('&');

    let x = values.next()?.trim().parse::<i64>().ok()?;
    let y = values.next()?.trim().parse::<i64>().ok()?;
    if values.next().is_some() {
        return None;
    }

    Some(Point::new(x as f64, y as f64))
}

/// Parse a rect written as `{{x, y}, {w, h}}` or `x,y,w,h`.
///
/// Anything without four numbers yields a zero rect, which the menu treats
/// as "keep the current anchor".
pub fn parse_rect(text: &str) -> Rect {
    let numbers: Vec<f64> = text
        .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse().ok())
        .collect();

    match numbers[..] {
        [x, y, width, height, ..] => Rect::new(x, y, width, height),
        _ => Rect::ZERO,
    }
}

/// Chapter href of an internal link, relative to the book's resource base.
///
/// `None` when the path does not lie under `base`.
pub fn resolve_internal_href(path: &str, base: &str) -> Option<String> {
    if base.is_empty() {
        return None;
    }

    let after_base = path.split(base).nth(1)?;
    let href = after_base.trim_matches('/');
    if href.is_empty() {
        return None;
    }

    Some(href.to_string())
}
