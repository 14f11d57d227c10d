pub mod genai;
pub mod music;
