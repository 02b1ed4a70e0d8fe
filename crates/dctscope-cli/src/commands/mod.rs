pub mod extract;
pub mod quantization;
