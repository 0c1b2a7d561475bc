//! Outbound port: the step-trace (visualization) service.
//!
//! The relay core never calls this; only the HTTP surface does.

use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;

use super::error::TraceServiceError;

/// Languages the trace service can execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceLanguage {
    Cpp,
    C,
    Java,
    JavaScript,
    Python,
}

impl TraceLanguage {
    /// Language code understood by the trace backend
    pub fn backend_code(&self) -> &'static str {
        match self {
            TraceLanguage::Cpp => "cpp",
            TraceLanguage::C => "c",
            TraceLanguage::Java => "java",
            TraceLanguage::JavaScript => "js",
            TraceLanguage::Python => "py3",
        }
    }
}

impl FromStr for TraceLanguage {
    type Err = TraceServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cpp" => Ok(TraceLanguage::Cpp),
            "c" => Ok(TraceLanguage::C),
            "java" => Ok(TraceLanguage::Java),
            "javascript" => Ok(TraceLanguage::JavaScript),
            "python" => Ok(TraceLanguage::Python),
            _ => Err(TraceServiceError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// One function frame with its named local variables
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
    pub function_name: String,
    pub variables: serde_json::Map<String, serde_json::Value>,
}

/// Program state after one execution step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    pub line: Option<u32>,
    pub event: String,
    pub function_name: Option<String>,
    /// Everything printed so far
    pub stdout: String,
    pub frames: Vec<StackFrame>,
    pub globals: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExecutionTrace {
    pub steps: Vec<TraceStep>,
}

#[async_trait]
pub trait TraceService: Send + Sync {
    async fn trace(
        &self,
        language: TraceLanguage,
        code: &str,
    ) -> Result<ExecutionTrace, TraceServiceError>;
}
