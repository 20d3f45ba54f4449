mod config;
mod data;
mod decoder;
mod evolution;
mod fitness;
mod generator;
mod periods;
mod server;
mod solver;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();


    if let Err(e) = server::run_server().await {
        log::error!("{e}");
        std::process::exit(1);
    }
}
