// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Extraction prompt construction

use crate::config::FieldSchema;

const TRUNCATION_MARKER: &str = "...";

/// Cut `text` to at most `max_chars` characters, appending "..." when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Build the instruction sent to the generative service
///
/// The prompt lists every schema field, embeds the transcript truncated to
/// `max_text_chars`, and shows the exact JSON shape expected back.
pub fn build_extraction_prompt(schema: &FieldSchema, text: &str, max_text_chars: usize) -> String {
    let fields_list = schema
        .iter()
        .map(|f| format!("- {}", f))
        .collect::<Vec<_>>()
        .join("\n");

    let data_example = schema
        .iter()
        .map(|f| format!("        \"{}\": \"抽出された値または空文字\"", f))
        .collect::<Vec<_>>()
        .join(",\n");
    let score_example = schema
        .iter()
        .map(|f| format!("        \"{}\": 0.9", f))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"以下は登記簿謄本から抽出したテキストです。
このテキストから以下の項目を抽出し、JSON形式で回答してください。

抽出項目:
{fields}

抽出したテキスト:
{text}

回答フォーマット:
{{
    "extracted_data": {{
{data}
    }},
    "confidence_scores": {{
{scores}
    }},
    "metadata": {{
        "total_fields": {total},
        "average_confidence": 0.9
    }}
}}

注意:
- 抽出できない項目は空文字 "" にしてください
- 信頼度は0.0から1.0の数値で設定してください
- 必ずJSONフォーマットで回答してください
- 上記の全ての項目を含めてください
"#,
        fields = fields_list,
        text = truncate_chars(text, max_text_chars),
        data = data_example,
        scores = score_example,
        total = schema.len(),
    )
}
