//! Wire payload for the webhook event.
//!
//! Shape: `{"b":"<body>","t":"<recipient>"}`. `"t"` is left out entirely when
//! there is no recipient, so the webhook falls back to its own default.

use serde::Serialize;

/// Default upper bound of the encoded payload, in bytes.
pub const DEFAULT_PAYLOAD_LIMIT: usize = 256;

#[derive(Serialize)]
struct WirePayload<'a> {
    #[serde(rename = "b")]
    body: &'a str,

    #[serde(rename = "t", skip_serializing_if = "Option::is_none")]
    recipient: Option<&'a str>,
}

fn render(body: &str, recipient: Option<&str>) -> String {
    // Serializing two borrowed strings into a String has no failure path.
    serde_json::to_string(&WirePayload { body, recipient }).unwrap_or_default()
}

/// Byte offsets of every char boundary in `s`, including `s.len()`.
fn boundaries(s: &str) -> Vec<usize> {
    s.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(s.len()))
        .collect()
}

/// Longest prefix of `text` (cut at a char boundary) for which `fits` holds.
///
/// The encoded length grows with the prefix length, so a binary search over the
/// boundaries finds it. Returns `None` when even the empty prefix does not fit.
fn longest_fitting_prefix<'a>(text: &'a str, fits: impl Fn(&str) -> bool) -> Option<&'a str> {
    let cuts = boundaries(text);
    let (mut lo, mut hi) = (0usize, cuts.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let prefix = cuts.get(mid).and_then(|&end| text.get(..end))?;
        if fits(prefix) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    let last = lo.checked_sub(1)?;
    cuts.get(last).and_then(|&end| text.get(..end))
}

/// Encode a message into the compact webhook payload, never exceeding `limit` bytes.
///
/// An empty recipient is treated as absent. If the full encoding is too long the
/// body is shortened to the longest prefix that fits; if the bare envelope with the
/// recipient still does not fit, the recipient is shortened the same way; as a last
/// resort the encoded text itself is cut at a char boundary. The result depends
/// only on the inputs.
pub fn encode_payload(body: &str, recipient: Option<&str>, limit: usize) -> String {
    let recipient = recipient.filter(|r| !r.is_empty());

    let full = render(body, recipient);
    if full.len() <= limit {
        return full;
    }

    let fits = |b: &str, r: Option<&str>| render(b, r).len() <= limit;

    if let Some(prefix) = longest_fitting_prefix(body, |b| fits(b, recipient)) {
        return render(prefix, recipient);
    }

    if let Some(r) = recipient
        && let Some(prefix) = longest_fitting_prefix(r, |r| fits("", Some(r)))
    {
        return render("", Some(prefix));
    }

    let mut bare = render("", None);
    let cut = boundaries(&bare)
        .into_iter()
        .take_while(|&end| end <= limit)
        .last()
        .unwrap_or(0);
    bare.truncate(cut);
    bare
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(s: &str) -> serde_json::Value {
        serde_json::from_str(s).unwrap()
    }

    #[test]
    fn body_and_recipient() {
        let s = encode_payload("Hi", Some("+15551234567"), DEFAULT_PAYLOAD_LIMIT);
        assert_eq!(s, r#"{"b":"Hi","t":"+15551234567"}"#);
    }

    #[rstest]
    #[case::none(None)]
    #[case::empty(Some(""))]
    fn missing_recipient_omits_t(#[case] recipient: Option<&str>) {
        let s = encode_payload("Hi", recipient, DEFAULT_PAYLOAD_LIMIT);
        assert_eq!(s, r#"{"b":"Hi"}"#);
        assert!(parse(&s).get("t").is_none());
    }

    #[test]
    fn escapes_json_specials() {
        let s = encode_payload("say \"hi\"\n", None, DEFAULT_PAYLOAD_LIMIT);
        assert_eq!(parse(&s)["b"], "say \"hi\"\n");
    }

    #[test]
    fn long_body_is_truncated_to_fit() {
        let body = "x".repeat(1_000);
        let s = encode_payload(&body, Some("+15551234567"), DEFAULT_PAYLOAD_LIMIT);
        assert!(s.len() <= DEFAULT_PAYLOAD_LIMIT);

        let v = parse(&s);
        assert_eq!(v["t"], "+15551234567");
        let kept = v["b"].as_str().unwrap();
        assert!(body.starts_with(kept));
        // One more char would not have fit.
        let longer = render(&body[..kept.len() + 1], Some("+15551234567"));
        assert!(longer.len() > DEFAULT_PAYLOAD_LIMIT);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let body = "é".repeat(300);
        let s = encode_payload(&body, None, 64);
        assert!(s.len() <= 64);
        let kept = parse(&s)["b"].as_str().unwrap().to_string();
        assert!(kept.chars().all(|c| c == 'é'));
        assert!(!kept.is_empty());
    }

    #[test]
    fn escaped_chars_count_against_the_limit() {
        let body = "\"".repeat(200);
        let s = encode_payload(&body, None, 50);
        assert!(s.len() <= 50);
        assert!(parse(&s)["b"].as_str().unwrap().chars().all(|c| c == '"'));
    }

    #[test]
    fn truncation_is_deterministic() {
        let body = "The quick brown fox ".repeat(40);
        let a = encode_payload(&body, Some("+12125551212"), 100);
        let b = encode_payload(&body, Some("+12125551212"), 100);
        assert_eq!(a, b);
    }

    #[test]
    fn oversized_recipient_is_shortened_after_body() {
        let recipient = "9".repeat(100);
        let s = encode_payload("hello", Some(&recipient), 40);
        assert!(s.len() <= 40);
        let v = parse(&s);
        assert_eq!(v["b"], "");
        assert!(recipient.starts_with(v["t"].as_str().unwrap()));
    }

    #[test]
    fn tiny_limit_never_overflows() {
        let s = encode_payload("hello", Some("+1555"), 4);
        assert!(s.len() <= 4);
    }

    #[rstest]
    #[case(10)]
    #[case(32)]
    #[case(128)]
    #[case(256)]
    fn never_exceeds_limit(#[case] limit: usize) {
        let body = "a\u{1F600}\\b".repeat(80);
        let s = encode_payload(&body, Some("+15551234567"), limit);
        assert!(s.len() <= limit, "limit={limit} got={}", s.len());
    }
}
