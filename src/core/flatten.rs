use crate::domain::model::{FlatRow, RawRecord, COLUMN_COUNT};
use serde_json::Value;

pub const IMAGE_DELIMITER: &str = " | ";

/// 欄位的來源位置
#[derive(Debug, Clone, Copy)]
enum Source {
    Top(&'static str),
    Nested(&'static str, &'static str),
    /// 清單以 `IMAGE_DELIMITER` 串接
    Joined(&'static str),
}

/// 與 `COLUMNS` 一一對應
const SOURCES: [Source; COLUMN_COUNT] = [
    Source::Top("id"),
    Source::Top("name"),
    Source::Top("slug"),
    Source::Top("status"),
    Source::Top("price"),
    Source::Top("old_price"),
    Source::Top("views"),
    Source::Top("rating"),
    Source::Top("favorites_count"),
    Source::Top("contact_count"),
    Source::Top("is_new"),
    Source::Top("has_delivery"),
    Source::Top("is_premium"),
    Source::Top("is_shop"),
    Source::Top("warranty"),
    Source::Top("whatsapp_enabled"),
    Source::Nested("category", "id"),
    Source::Nested("category", "name"),
    Source::Nested("category", "slug"),
    Source::Nested("city", "id"),
    Source::Nested("city", "name"),
    Source::Nested("customer", "id"),
    Source::Nested("customer", "name"),
    Source::Nested("customer", "phone"),
    Source::Nested("customer", "is_shop"),
    Source::Nested("customer", "ads_count"),
    Source::Joined("images"),
    Source::Top("created_at"),
    Source::Top("updated_at"),
    Source::Top("last_auto_refresh"),
    Source::Top("description"),
    Source::Top("meta_title"),
    Source::Top("meta_description"),
    Source::Top("meta_keywords"),
];

/// 將一筆原始商品攤平成固定欄位；任何缺漏都只會產生空欄位
pub fn flatten(record: &RawRecord) -> FlatRow {
    FlatRow::from_cells(SOURCES.map(|source| extract(record, source)))
}

fn extract(record: &RawRecord, source: Source) -> Option<String> {
    match source {
        Source::Top(field) => record.get(field).and_then(render),
        Source::Nested(parent, field) => record
            .get(parent)
            .filter(|value| value.is_object())
            .and_then(|object| object.get(field))
            .and_then(render),
        Source::Joined(field) => match record.get(field)? {
            Value::Array(items) if items.is_empty() => None,
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(render_element)
                    .collect::<Vec<_>>()
                    .join(IMAGE_DELIMITER),
            ),
            other => render(other),
        },
    }
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        // 與既有下游報表一致：True / False
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        other => Some(other.to_string()),
    }
}

fn render_element(value: &Value) -> String {
    render(value).unwrap_or_default()
}
