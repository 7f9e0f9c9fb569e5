pub mod gemini_client;
pub mod gemini_wire;
