use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Api {
    pub address: String,
    pub rpc_port: u16,
    pub http_port: u16,
}
