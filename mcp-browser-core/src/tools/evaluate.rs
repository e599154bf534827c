//! Execute JavaScript in the page, capturing `console.log` output.

use crate::browser::BrowserManager;
use pmcp::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, JsonSchema, Validate)]
#[schemars(deny_unknown_fields)]
pub struct EvaluateInput {
    #[validate(length(min = 1))]
    #[schemars(
        description = "JavaScript code to execute. The value of the last expression is returned."
    )]
    pub script: String,
}

/// What the wrapped script resolves to.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub logs: Vec<String>,
}

/// Wrap `script` so that `console.log` calls made while it runs are collected
/// alongside its result. The page's own `console.log` is restored afterwards.
pub fn wrap_script(script: &str) -> Result<String, serde_json::Error> {
    let source = serde_json::to_string(script)?;
    Ok(format!(
        r#"(async () => {{
    const logs = [];
    const original = console.log;
    console.log = (...args) => {{
        logs.push(args.map(a => typeof a === 'object' ? JSON.stringify(a) : String(a)).join(' '));
        original.apply(console, args);
    }};
    try {{
        const result = await eval({source});
        return {{ result: result === undefined ? null : result, logs }};
    }} finally {{
        console.log = original;
    }}
}})()"#
    ))
}

pub async fn execute(
    manager: &Arc<BrowserManager>,
    input: EvaluateInput,
) -> Result<Value, Error> {
    input
        .validate()
        .map_err(|e| Error::validation(format!("Validation failed: {}", e)))?;

    let page = manager
        .page()
        .await
        .map_err(|e| Error::internal(format!("Browser error: {:#}", e)))?;

    let fail = |e: &dyn std::fmt::Display| {
        Error::internal(format!("Failed to evaluate script: {}", e))
    };

    let wrapped = wrap_script(&input.script).map_err(|e| fail(&e))?;
    let evaluation: Evaluation = page
        .evaluate_expression(wrapped)
        .await
        .map_err(|e| fail(&e))?
        .into_value()
        .map_err(|e| fail(&e))?;

    tracing::debug!(logs = evaluation.logs.len(), "Script evaluated");

    Ok(serde_json::to_value(evaluation)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_script_embedded_as_string_literal() {
        let wrapped = wrap_script("document.title + \"!\"").unwrap();
        assert!(wrapped.contains(r#"await eval("document.title + \"!\"")"#));
        assert!(wrapped.contains("console.log = original;"));
    }

    #[test]
    fn test_evaluation_reply_carries_result_and_logs() {
        let evaluation: Evaluation = serde_json::from_value(json!({
            "result": {"count": 2},
            "logs": ["starting", "done 2"]
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(evaluation).unwrap(),
            json!({"result": {"count": 2}, "logs": ["starting", "done 2"]})
        );
    }

    #[test]
    fn test_missing_fields_default() {
        let evaluation: Evaluation = serde_json::from_value(json!({})).unwrap();
        assert!(evaluation.result.is_null());
        assert!(evaluation.logs.is_empty());
    }
}
