//! Chat embed payloads for single and batched alerts.

use serde_json::{json, Value};

use redwatch_store::MatchRecord;

/// Embed accent color.
pub const EMBED_COLOR: u32 = 0xFF4500;

const FOOTER_TEXT: &str = "Redwatch";

/// Payload for one match: snippet as description, keyword/community/
/// author fields, plus an "Also Matched" field when other phrases hit
/// the same item.
pub fn single_match_payload(m: &MatchRecord) -> Value {
    let description = truncate_chars(&m.snippet, 200);

    let mut fields = vec![
        json!({"name": "Keyword", "value": m.matched_phrase, "inline": true}),
        json!({"name": "Subreddit", "value": format!("r/{}", m.community), "inline": true}),
        json!({"name": "Author", "value": format!("u/{}", m.author), "inline": true}),
    ];
    if !m.also_matched.is_empty() {
        fields.push(json!({
            "name": "Also Matched",
            "value": m.also_matched.join(", "),
            "inline": false,
        }));
    }

    json!({
        "embeds": [{
            "title": format!("Keyword Match in r/{}", m.community),
            "description": description,
            "url": m.url,
            "color": EMBED_COLOR,
            "fields": fields,
            "footer": {"text": FOOTER_TEXT},
        }]
    })
}

/// Payload for a batch: one field per match with a 100-char snippet and
/// a view link.
pub fn batch_payload(matches: &[MatchRecord]) -> Value {
    let fields: Vec<Value> = matches
        .iter()
        .map(|m| {
            json!({
                "name": format!("{} in r/{}", m.matched_phrase, m.community),
                "value": format!("{}\n[View post]({})", m.snippet.chars().take(100).collect::<String>(), m.url),
                "inline": false,
            })
        })
        .collect();

    json!({
        "embeds": [{
            "title": format!("{} New Keyword Matches", matches.len()),
            "description": format!("Batch alert — {} matches detected recently.", matches.len()),
            "color": EMBED_COLOR,
            "fields": fields,
            "footer": {"text": FOOTER_TEXT},
        }]
    })
}

/// Cap at `max` chars, replacing the tail with `"..."` when truncating.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use redwatch_store::{AlertStatus, ContentKind};

    fn record(phrase: &str, also: Vec<String>) -> MatchRecord {
        MatchRecord {
            id: "m1".into(),
            tenant_id: "t1".into(),
            rule_id: "r1".into(),
            content_id: "c1".into(),
            kind: ContentKind::Post,
            community: "sportsbook".into(),
            matched_phrase: phrase.into(),
            also_matched: also,
            snippet: "found arbitrage betting here".into(),
            proximity_score: 0.8,
            url: "https://reddit.com/r/sportsbook/comments/abc".into(),
            author: "poster".into(),
            is_deleted: false,
            detected_at: Utc::now(),
            alert_sent_at: None,
            alert_status: AlertStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn single_embed_shape() {
        let payload = single_match_payload(&record("arbitrage betting", vec![]));
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], "Keyword Match in r/sportsbook");
        assert_eq!(embed["color"], 16729344);
        assert_eq!(embed["fields"].as_array().unwrap().len(), 3);
        assert_eq!(embed["fields"][0]["name"], "Keyword");
        assert_eq!(embed["fields"][0]["value"], "arbitrage betting");
        assert_eq!(embed["fields"][1]["value"], "r/sportsbook");
        assert_eq!(embed["fields"][2]["value"], "u/poster");
        assert_eq!(embed["footer"]["text"], "Redwatch");
    }

    #[test]
    fn single_embed_includes_also_matched() {
        let payload =
            single_match_payload(&record("arbitrage", vec!["parlay".into(), "promo".into()]));
        let fields = payload["embeds"][0]["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[3]["name"], "Also Matched");
        assert_eq!(fields[3]["value"], "parlay, promo");
        assert_eq!(fields[3]["inline"], false);
    }

    #[test]
    fn long_description_is_truncated_with_ellipsis() {
        let mut m = record("arbitrage", vec![]);
        m.snippet = "x".repeat(250);
        let payload = single_match_payload(&m);
        let description = payload["embeds"][0]["description"].as_str().unwrap();
        assert_eq!(description.chars().count(), 200);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn batch_embed_shape() {
        let matches = vec![
            record("arbitrage", vec![]),
            record("parlay", vec![]),
            record("promo", vec![]),
        ];
        let payload = batch_payload(&matches);
        let embed = &payload["embeds"][0];

        assert_eq!(embed["title"], "3 New Keyword Matches");
        assert_eq!(embed["color"], 16729344);
        let fields = embed["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0]["name"], "arbitrage in r/sportsbook");
        let value = fields[0]["value"].as_str().unwrap();
        assert!(value.contains("[View post](https://reddit.com/r/sportsbook/comments/abc)"));
    }
}
