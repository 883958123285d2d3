use rand::RngCore;

use app_api::AppContext;

pub const TOKEN_HEADER: &str = "x-runmap-token";

#[derive(Clone)]
pub struct HttpState {
    pub context: AppContext,
    pub token: String,
}

impl HttpState {
    pub fn new(context: AppContext, token: String) -> Self {
        Self { context, token }
    }
}

/// 128 random bits, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}
