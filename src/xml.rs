/// Escapes text for XML element content or attribute values. Characters
/// XML 1.0 cannot carry at all are dropped.
pub fn escape(text: &str) -> String {
    if text.chars().all(is_xml_char) {
        return htmlescape::encode_minimal(text);
    }
    let cleaned: String = text.chars().filter(|c| is_xml_char(*c)).collect();
    htmlescape::encode_minimal(&cleaned)
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}
