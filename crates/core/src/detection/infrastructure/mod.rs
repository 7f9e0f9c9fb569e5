pub mod execution_provider;
pub mod face_analysis_detector;
pub mod math;
pub mod model_cache;
pub mod model_resolver;
pub mod onnx_genderage_classifier;
pub mod onnx_yolo_detector;
