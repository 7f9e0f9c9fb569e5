use ort::execution_providers::ExecutionProviderDispatch;

/// Name of the accelerated provider registered on this platform, if any.
pub const PLATFORM_PROVIDER: Option<&str> = if cfg!(target_os = "macos") {
    Some("CoreML")
} else if cfg!(target_os = "windows") {
    Some("DirectML")
} else {
    None
};

/// ONNX execution providers for the detection models, most preferred first.
///
/// CPU is always the implicit fallback, so Linux registers none.
pub fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
    log::debug!(
        "ONNX execution provider: {}",
        PLATFORM_PROVIDER.unwrap_or("CPU")
    );
    platform_providers()
}

#[cfg(target_os = "macos")]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
}

#[cfg(target_os = "windows")]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn platform_providers() -> Vec<ExecutionProviderDispatch> {
    vec![]
}
