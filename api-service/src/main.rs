use common_config::Config;
use envconfig::Envconfig;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = Config::init_from_env()?;
    http_server::run(api_service::DESCRIPTOR, config, api_service::app()).await
}
