use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Persistence {
    pub redis_url: String,
}
