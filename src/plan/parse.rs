//! 容错 JSON 解析适配器
//!
//! 推理服务常在 JSON 外包一层说明文字或 ```json 代码块。解析顺序：
//! 1. 整段文本（去掉代码块包裹）直接解析；
//! 2. 失败则截取第一个 `{` 到最后一个 `}` 再解析。这是有损的启发式，不是通用解析器；
//! 3. 仍失败返回 Unparseable。
//!
//! 永不返回错误，由调用方决定兜底。

use serde::de::DeserializeOwned;

/// 解析结果
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// 整段文本即合法 JSON
    Direct(T),
    /// 从 `{ ... }` 子串中提取成功
    Extracted(T),
    Unparseable,
}

impl<T> Parsed<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Parsed::Direct(v) | Parsed::Extracted(v) => Some(v),
            Parsed::Unparseable => None,
        }
    }
}

/// 去掉 ```json ... ``` 或 ``` ... ``` 包裹
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.rfind("```")
        .map(|end| rest[..end].trim())
        .unwrap_or_else(|| rest.trim())
}

pub fn parse_tolerant<T: DeserializeOwned>(raw: &str) -> Parsed<T> {
    let body = strip_code_fence(raw);
    if let Ok(v) = serde_json::from_str::<T>(body) {
        return Parsed::Direct(v);
    }

    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        return Parsed::Unparseable;
    };
    if start >= end {
        return Parsed::Unparseable;
    }
    match serde_json::from_str::<T>(&raw[start..=end]) {
        Ok(v) => Parsed::Extracted(v),
        Err(e) => {
            tracing::debug!("Tolerant JSON extraction failed: {}", e);
            Parsed::Unparseable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        a: u32,
    }

    #[test]
    fn test_direct() {
        assert_eq!(parse_tolerant::<Sample>(r#" {"a": 1} "#), Parsed::Direct(Sample { a: 1 }));
        assert_eq!(
            parse_tolerant::<Sample>("```json\n{\"a\": 2}\n```"),
            Parsed::Direct(Sample { a: 2 })
        );
    }

    #[test]
    fn test_extracted_from_prose() {
        let raw = "Sure! Here is the plan: {\"a\": 3} Let me know.";
        assert_eq!(parse_tolerant::<Sample>(raw), Parsed::Extracted(Sample { a: 3 }));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_tolerant::<Sample>("no json here"), Parsed::Unparseable);
        assert_eq!(parse_tolerant::<Sample>("} backwards {"), Parsed::Unparseable);
        assert_eq!(parse_tolerant::<Sample>("{\"a\": 1} and {\"a\": 2}"), Parsed::Unparseable);
        assert_eq!(parse_tolerant::<Sample>("").into_option(), None);
    }
}
