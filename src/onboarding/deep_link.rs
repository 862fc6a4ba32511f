//! Deep-link entry: read a step number off the entry location and strip it.

use url::{Url, form_urlencoded};

use super::model::StepId;

/// Base used to resolve relative entry locations such as `/onboarding?step=3`.
const RELATIVE_BASE: &str = "http://localhost";

/// A parsed entry location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLink {
    /// Step to resume at, if the parameter held an integer in 1..=6.
    pub step: Option<StepId>,
    /// The location with the step parameter removed. Present only when a
    /// valid step was consumed, so the caller knows to rewrite the address.
    pub stripped: Option<String>,
}

impl EntryLink {
    /// Parse `location` (absolute URL or path with query) for `param`.
    ///
    /// Missing, non-numeric and out-of-range values are treated as absent
    /// and leave the location untouched.
    pub fn parse(location: &str, param: &str) -> Self {
        let none = Self {
            step: None,
            stripped: None,
        };

        let (url, relative) = match Url::parse(location) {
            Ok(url) => (url, false),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                match Url::parse(RELATIVE_BASE).and_then(|base| base.join(location)) {
                    Ok(url) => (url, true),
                    Err(_) => return none,
                }
            }
            Err(_) => return none,
        };

        let step = url
            .query_pairs()
            .find(|(key, _)| key == param)
            .and_then(|(_, value)| value.trim().parse::<i64>().ok())
            .and_then(StepId::from_index);

        let Some(step) = step else {
            return none;
        };

        Self {
            step: Some(step),
            stripped: Some(strip_param(&url, param, relative)),
        }
    }
}

/// Drop every `param` pair from the query. The remaining segments are
/// copied byte-for-byte, so their original encoding survives.
fn strip_param(url: &Url, param: &str, relative: bool) -> String {
    let kept: Vec<&str> = url
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|segment| !segment.is_empty())
        .filter(|segment| {
            form_urlencoded::parse(segment.as_bytes())
                .next()
                .is_none_or(|(key, _)| key != param)
        })
        .collect();

    let mut out = url.clone();
    if kept.is_empty() {
        out.set_query(None);
    } else {
        out.set_query(Some(&kept.join("&")));
    }

    if relative {
        let mut rel = out.path().to_string();
        if let Some(query) = out.query() {
            rel.push('?');
            rel.push_str(query);
        }
        if let Some(fragment) = out.fragment() {
            rel.push('#');
            rel.push_str(fragment);
        }
        rel
    } else {
        out.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_location_with_step() {
        let link = EntryLink::parse("/onboarding?step=4", "step");
        assert_eq!(link.step, Some(StepId::Chat));
        assert_eq!(link.stripped.as_deref(), Some("/onboarding"));
    }

    #[test]
    fn absolute_location_keeps_other_params() {
        let link = EntryLink::parse(
            "https://example.com/onboarding?ref=mail&step=6&lang=en#top",
            "step",
        );
        assert_eq!(link.step, Some(StepId::Network));
        assert_eq!(
            link.stripped.as_deref(),
            Some("https://example.com/onboarding?ref=mail&lang=en#top")
        );
    }

    #[test]
    fn relative_location_keeps_fragment() {
        let link = EntryLink::parse("/onboarding?step=1#intro", "step");
        assert_eq!(link.step, Some(StepId::Identity));
        assert_eq!(link.stripped.as_deref(), Some("/onboarding#intro"));
    }

    #[test]
    fn out_of_range_values_are_ignored() {
        for location in [
            "/onboarding?step=0",
            "/onboarding?step=7",
            "/onboarding?step=-1",
            "/onboarding?step=abc",
            "/onboarding?step=",
            "/onboarding?step=2.5",
            "/onboarding",
        ] {
            let link = EntryLink::parse(location, "step");
            assert_eq!(link.step, None, "{location}");
            assert_eq!(link.stripped, None, "{location}");
        }
    }

    #[test]
    fn custom_param_name() {
        let link = EntryLink::parse("/welcome?s=2&step=5", "s");
        assert_eq!(link.step, Some(StepId::Vcs));
        assert_eq!(link.stripped.as_deref(), Some("/welcome?step=5"));
    }

    #[test]
    fn other_params_keep_their_encoding() {
        let cases = [
            ("/search?q=a%20b&step=3", "/search?q=a%20b"),
            ("/onboarding?flag&step=2", "/onboarding?flag"),
            ("/onboarding?path=a/b&step=4", "/onboarding?path=a/b"),
            ("/onboarding?q=a+b&step=5&x=%2F", "/onboarding?q=a+b&x=%2F"),
        ];
        for (location, expected) in cases {
            let link = EntryLink::parse(location, "step");
            assert!(link.step.is_some(), "{location}");
            assert_eq!(link.stripped.as_deref(), Some(expected), "{location}");
        }
    }

    #[test]
    fn encoded_param_name_is_stripped() {
        let link = EntryLink::parse("https://example.com/o?st%65p=2&ref=x", "step");
        assert_eq!(link.step, Some(StepId::Vcs));
        assert_eq!(link.stripped.as_deref(), Some("https://example.com/o?ref=x"));
    }

    #[test]
    fn unparsable_location_is_ignored() {
        let link = EntryLink::parse("http://[::1", "step");
        assert_eq!(link.step, None);
    }
}
