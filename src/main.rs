use std::process::ExitCode;

use swipectl::{cli::Options, cli::USAGE, daemon, Config};

#[tokio::main]
async fn main() -> ExitCode {
    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("swipectl: {err}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    if options.help {
        #[allow(clippy::disallowed_macros)]
        {
            println!("{USAGE}");
        }
        return ExitCode::SUCCESS;
    }

    let default_level = if options.verbose { "debug" } else { "info" };
    if let Ok(env_filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt()
            .compact()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(default_level)
            .compact()
            .init();
    }

    #[cfg(feature = "profile-with-tracy")]
    profiling::tracy_client::Client::start();

    #[cfg(feature = "profile-with-puffin")]
    let _server = puffin_http::Server::new(&format!("0.0.0.0:{}", puffin_http::DEFAULT_PORT));
    #[cfg(feature = "profile-with-puffin")]
    profiling::puffin::set_scopes_on(true);

    let config = match Config::load(options.conffile.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    if options.list {
        match config.action_table() {
            Ok(table) => {
                #[allow(clippy::disallowed_macros)]
                {
                    print!("{}", config.describe(&table));
                }
                return ExitCode::SUCCESS;
            }
            Err(err) => {
                tracing::error!("{err}");
                return ExitCode::FAILURE;
            }
        }
    }

    match daemon::run(&config, &options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
