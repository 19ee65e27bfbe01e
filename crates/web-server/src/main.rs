// This main function is the entry point when running `cargo run -p web-server`.
// It loads the configuration, installs the subscriber and hands over to the library.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = configuration::load_config()?;
    let _guard = configuration::init_tracing(&config.logging)?;
    web_server::run_server(&config).await
}
