//! Scoreboard and static file server for the ABR arcade.
//!
//! ```bash
//! cargo run --features server --bin abr-scoreboard -- --dist ./dist
//! ```

// This binary is native-only. On wasm32, provide a no-op main.
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::net::SocketAddr;
    use std::path::PathBuf;

    use abr_arcade::server::ServerConfig;
    use clap::Parser;

    #[derive(Parser)]
    #[command(name = "abr-scoreboard")]
    #[command(about = "Serve the ABR arcade and its scoreboard", long_about = None)]
    #[command(version)]
    pub(crate) struct Cli {
        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:3000")]
        pub(crate) bind: SocketAddr,

        /// Scoreboard JSON file (created on first post)
        #[arg(short, long, default_value = "./data/scores.json")]
        pub(crate) data: PathBuf,

        /// Directory with the built game
        #[arg(long, default_value = "./dist")]
        pub(crate) dist: PathBuf,

        /// Only log errors
        #[arg(short, long)]
        pub(crate) quiet: bool,
    }

    impl Cli {
        pub(crate) fn config(&self) -> ServerConfig {
            ServerConfig {
                bind: self.bind,
                data_file: self.data.clone(),
                dist_dir: self.dist.clone(),
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() {
    use clap::Parser;

    let cli = cli::Cli::parse();

    let level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    if let Err(e) = abr_arcade::server::run(cli.config()).await {
        log::error!("{e}");
        std::process::exit(1);
    }
}
