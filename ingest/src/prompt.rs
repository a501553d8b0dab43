//! Structuring prompt sent for each source document.

const TEMPLATE: &str = "
以下のドキュメント内容を読み込み、指定の形式で出力してください。

【ドキュメント名】: {filename}

【ドキュメント内容】:
{content}

---

【出力形式】:

## {filename}

**カテゴリ**: [学会発表/論文/体験談/解説/イベント報告/協会誌/その他から選択]
**年代**: [YYYY年 - ファイル名や内容から推定]
**キーパーソン**: [登場する専門家・医師・研究者名をカンマ区切りで]

### 概要
[3-5文で内容を要約。専門用語は一般向けに説明を追加]

### 主要データ・エビデンス
- [数値データや実験結果があれば箇条書き]
- [被験者数、測定方法、p値などの統計情報]
- [効果の具体例]
（データがない場合は「特記なし」と記載）

### キーフレーズ（SNS活用可能）
> 「[文書内の印象的な引用文1]」
> 「[文書内の印象的な引用文2]」
（引用は原文のまま）

### SNS活用アイデア
- **Instagram**: [投稿アイデア - 具体的に]
- **note**: [記事アイデア - 具体的に]

---

日本語で出力してください。内容が読み取れない場合は、その旨を記載してください。
";

/// Fill the template. Placeholders are substituted in one pass, so braces in
/// `content` are never reinterpreted.
#[must_use]
pub fn render_prompt(filename: &str, content: &str) -> String {
    let mut out = String::with_capacity(TEMPLATE.len() + content.len() + filename.len() * 2);
    let mut rest = TEMPLATE;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if let Some(after) = tail.strip_prefix("{filename}") {
            out.push_str(filename);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{content}") {
            out.push_str(content);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
