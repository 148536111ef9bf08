use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Telemetry {
    pub stdout: Option<Stdout>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Stdout {}
