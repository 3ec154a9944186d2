use common_config::Config;
use envconfig::Envconfig;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let config = Config::init_from_env()?;
    http_server::run(web_app::DESCRIPTOR, config, web_app::app()).await
}
