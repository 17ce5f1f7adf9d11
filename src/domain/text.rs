//! 朗读文本规则
//!
//! 入队文本在送入合成之前先归一化，并判定是否包含值得朗读的内容。

/// 归一化待朗读文本
///
/// - 内嵌双引号加倍（送入播放管线时不会截断参数）
/// - 去掉反斜杠
/// - 去掉首尾空白
pub fn normalize_utterance(text: &str) -> String {
    text.replace('"', "\"\"").replace('\\', "").trim().to_string()
}

/// 文本是否包含可朗读内容
///
/// 至少包含一个单词字符，或平假名/片假名/CJK 统一表意文字区间内的字符。
/// 纯符号、纯空白的消息不值得合成。
pub fn is_speakable(text: &str) -> bool {
    text.chars().any(|c| {
        c.is_alphanumeric()
            || c == '_'
            || matches!(c, '\u{3040}'..='\u{30ff}' | '\u{4e00}'..='\u{9faf}')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_doubles_quotes() {
        assert_eq!(normalize_utterance(r#"say "hi""#), r#"say ""hi"""#);
    }

    #[test]
    fn test_normalize_strips_backslashes_and_whitespace() {
        assert_eq!(normalize_utterance("  a\\b  "), "ab");
    }

    #[test]
    fn test_speakable_plain_text() {
        assert!(is_speakable("ok text"));
    }

    #[test]
    fn test_speakable_japanese() {
        assert!(is_speakable("日本語"));
        assert!(is_speakable("こんにちは"));
        assert!(is_speakable("カタカナ"));
    }

    #[test]
    fn test_unspeakable_empty_and_punctuation() {
        assert!(!is_speakable(""));
        assert!(!is_speakable("!!!"));
        assert!(!is_speakable("... !? "));
    }
}
