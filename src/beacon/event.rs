//! Event payload formatting.

use crate::encoding::percent_encode;

/// Format the `utme` event payload: a literal digit tag followed by a
/// parenthesized, `*`-joined category/action/[label] group, optionally
/// followed by a parenthesized value group.
///
/// Each field is percent-encoded individually; the tag, parentheses and `*`
/// separators stay literal because the payload is placed into the query
/// string unescaped. An empty label drops its segment entirely; a non-empty
/// value appends a second group whether or not the label was present.
pub fn format_event_payload(category: &str, action: &str, label: &str, value: &str) -> String {
    let category = percent_encode(category);
    let action = percent_encode(action);
    let label = percent_encode(label);
    let value = percent_encode(value);

    let mut payload = format!("5({category}*{action}");
    if !label.is_empty() {
        payload.push('*');
        payload.push_str(&label);
    }
    payload.push(')');
    if !value.is_empty() {
        payload.push('(');
        payload.push_str(&value);
        payload.push(')');
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omits_label_segment_when_label_is_empty() {
        assert_eq!(format_event_payload("cat", "act", "", ""), "5(cat*act)");
    }

    #[test]
    fn includes_label_when_present() {
        assert_eq!(
            format_event_payload("cat", "act", "lbl", ""),
            "5(cat*act*lbl)"
        );
    }

    #[test]
    fn appends_value_group_without_label() {
        assert_eq!(format_event_payload("cat", "act", "", "5"), "5(cat*act)(5)");
    }

    #[test]
    fn appends_value_group_after_label() {
        assert_eq!(
            format_event_payload("cat", "act", "lbl", "42"),
            "5(cat*act*lbl)(42)"
        );
    }

    #[test]
    fn escapes_reserved_characters_inside_fields() {
        assert_eq!(format_event_payload("a b", "c&d", "", ""), "5(a%20b*c%26d)");
    }
}
