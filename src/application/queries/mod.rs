//! Queries - 查询
//!
//! speaker 命令的补全候选查询。

use std::sync::Arc;

use crate::domain::voice::VoiceCatalog;

/// 一个补全候选
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakerChoice {
    /// 展示给用户的显示名
    pub name: String,
    /// 提交时使用的音色 id
    pub value: String,
}

/// SpeakerAutocomplete Handler
///
/// 按显示名做大小写不敏感的子串匹配，候选数由目录限制在 25 以内。
pub struct SpeakerAutocompleteHandler {
    catalog: Arc<VoiceCatalog>,
}

impl SpeakerAutocompleteHandler {
    pub fn new(catalog: Arc<VoiceCatalog>) -> Self {
        Self { catalog }
    }

    pub fn handle(&self, fragment: &str) -> Vec<SpeakerChoice> {
        self.catalog
            .search(fragment)
            .into_iter()
            .map(|v| SpeakerChoice {
                name: v.display_name.clone(),
                value: v.id.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::Voice;

    #[test]
    fn test_autocomplete_filters_by_display_name() {
        let catalog = Arc::new(VoiceCatalog::new(vec![
            Voice {
                id: "ja-JP-NanamiNeural".to_string(),
                display_name: "NanamiNeural".to_string(),
            },
            Voice {
                id: "ja-JP-KeitaNeural".to_string(),
                display_name: "KeitaNeural".to_string(),
            },
        ]));
        let handler = SpeakerAutocompleteHandler::new(catalog);

        let choices = handler.handle("keita");
        assert_eq!(
            choices,
            vec![SpeakerChoice {
                name: "KeitaNeural".to_string(),
                value: "ja-JP-KeitaNeural".to_string(),
            }]
        );

        // 空片段返回全部（上限以内）
        assert_eq!(handler.handle("").len(), 2);
    }
}
