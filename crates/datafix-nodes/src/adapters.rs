//! Built-in adapters between data types
//!
//! | From     | To       | Conversion                              |
//! |----------|----------|-----------------------------------------|
//! | `string` | `int`    | Parses the trimmed string as an integer |
//! | `int`    | `string` | Formats the integer                     |
//! | `string` | `path`   | Normalizes separators of a non-empty string |

use std::path::MAIN_SEPARATOR;
use std::sync::Arc;

use datafix_engine::{adapter_fn, Adapter, AdapterRegistration, EngineError, Result};
use serde_json::{json, Value};

fn expect_str<'a>(value: &'a Value, to: &str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        EngineError::Adapter(format!("cannot convert {} to {}: not a string", value, to))
    })
}

/// `string` -> `int`
pub fn string_to_int() -> Arc<dyn Adapter> {
    adapter_fn(|value| {
        let text = expect_str(value, "int")?;
        text.trim()
            .parse::<i64>()
            .map(|n| json!(n))
            .map_err(|e| EngineError::Adapter(format!("cannot convert '{}' to int: {}", text, e)))
    })
}

/// `int` -> `string`
pub fn int_to_string() -> Arc<dyn Adapter> {
    adapter_fn(|value| match value.as_i64() {
        Some(n) => Ok(json!(n.to_string())),
        None => Err(EngineError::Adapter(format!(
            "cannot convert {} to string: not an integer",
            value
        ))),
    })
}

/// `string` -> `path`
pub fn string_to_path() -> Arc<dyn Adapter> {
    adapter_fn(|value| {
        let text = expect_str(value, "path")?.trim();
        if text.is_empty() {
            return Err(EngineError::Adapter("cannot convert an empty string to path".into()));
        }
        let normalized: String = text
            .chars()
            .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
            .collect();
        Ok(json!(normalized))
    })
}

inventory::submit!(AdapterRegistration {
    from: "string",
    to: "int",
    build: string_to_int,
});

inventory::submit!(AdapterRegistration {
    from: "int",
    to: "string",
    build: int_to_string,
});

inventory::submit!(AdapterRegistration {
    from: "string",
    to: "path",
    build: string_to_path,
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_string_to_int() {
        let adapter = string_to_int();
        assert_eq!(adapter.adapt(&json!(" 42 ")).unwrap(), json!(42));
        assert!(matches!(
            adapter.adapt(&json!("4x")),
            Err(EngineError::Adapter(_))
        ));
        assert!(adapter.adapt(&json!(4)).is_err());
    }

    #[test]
    fn test_int_to_string() {
        assert_eq!(int_to_string().adapt(&json!(-7)).unwrap(), json!("-7"));
        assert!(int_to_string().adapt(&json!(1.5)).is_err());
    }

    #[test]
    fn test_string_to_path() {
        let adapter = string_to_path();
        let expected: PathBuf = ["assets", "mesh.obj"].iter().collect();
        assert_eq!(
            adapter.adapt(&json!("assets\\mesh.obj")).unwrap(),
            json!(expected.to_string_lossy())
        );
        assert!(adapter.adapt(&json!("  ")).is_err());
    }
}
