use taki_core::config::Config;
use tracing_subscriber::{prelude::__tracing_subscriber_SubscriberExt, Registry};

use self::stdout::create_stdout_layer;

pub mod stdout;

pub fn setup(config: &Config) -> anyhow::Result<()> {
    let subscriber = Registry::default().with(create_stdout_layer(config)?);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
