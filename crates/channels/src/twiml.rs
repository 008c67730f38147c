//! TwiML replies for the WhatsApp webhook.

/// Wrap `text` in a single-message TwiML response.
pub fn message_response(text: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape(text)
    )
}

/// A response that sends nothing back.
pub fn empty_response() -> String {
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response></Response>".into()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_plain_text() {
        assert_eq!(
            message_response("1. buy milk"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>1. buy milk</Message></Response>"
        );
    }

    #[test]
    fn empty_has_no_message() {
        assert!(!empty_response().contains("<Message>"));
    }

    #[test]
    fn escapes_markup() {
        let xml = message_response("Delete the task \"a<b\" & 'c'?");
        assert!(xml.contains("Delete the task &quot;a&lt;b&quot; &amp; &apos;c&apos;?"));
    }

    #[test]
    fn keeps_newlines_and_unicode() {
        let xml = message_response("1. קנה חלב\n2. gym");
        assert!(xml.contains("1. קנה חלב\n2. gym"));
    }
}
