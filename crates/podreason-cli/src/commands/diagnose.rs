use crate::config::PodreasonConfig;
use anyhow::{Context, Result};
use podreason_common::{DeliveryType, DiagnosisResult};
use podreason_core::{AnalysisRequest, AnalyzerFactory, ModuleRegistry};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Reads a JSON request from `input`, or from stdin when `input` is `-`
pub fn load_request(input: &Path) -> Result<AnalysisRequest> {
    let content = if input == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer).context("reading request from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(input).with_context(|| format!("reading request {}", input.display()))?
    };
    serde_json::from_str(&content).with_context(|| format!("parsing request {}", input.display()))
}

pub async fn diagnose(config: &PodreasonConfig, delivery_type: DeliveryType, request: AnalysisRequest) -> Result<DiagnosisResult> {
    let factory = AnalyzerFactory::with_defaults(Arc::new(ModuleRegistry::builtin()), Arc::new(config.diagnosis.clone()));
    let result = factory.diagnose(delivery_type, request).await?;
    info!(pod = %result.pod_name, result = %result.result, has_error = result.has_error, "Diagnosis complete");
    Ok(result)
}

pub async fn run_diagnose(config: &PodreasonConfig, delivery_type: DeliveryType, input: &Path) -> Result<()> {
    let request = load_request(input)?;
    let result = diagnose(config, delivery_type, request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
