use crate::core::Report;
use crate::error::RenderError;

pub fn encode(report: &Report, pretty: bool) -> Result<Vec<u8>, RenderError> {
    let encoded = if pretty {
        serde_json::to_vec_pretty(report)
    } else {
        serde_json::to_vec(report)
    };
    encoded.map_err(RenderError::Encoding)
}

pub fn decode(bytes: &[u8]) -> Result<Report, RenderError> {
    serde_json::from_slice(bytes).map_err(RenderError::Decoding)
}
