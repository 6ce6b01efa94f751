use quorum_clock::SystemClock;
use quorum_engine::{DecisionEngine, SessionConfig, paper_deps};

fn print_help() {
    eprintln!(
        r#"quorum - signal-aggregating trading decision engine (paper mode)

USAGE:
    quorum [OPTIONS] [CONFIG]

ARGS:
    <CONFIG>            JSON session config (defaults apply when omitted)

OPTIONS:
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)
"#
    );
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config_path: Option<String> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_help();
                return;
            }
            path if config_path.is_none() && !path.starts_with('-') => {
                config_path = Some(path.to_string());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                std::process::exit(1);
            }
        }
    }

    let config = match &config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            SessionConfig::from_file(path)
        }
        None => {
            log::info!("Using default configuration");
            let config = SessionConfig::default();
            config.validate().map(|_| config)
        }
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    let clock = SystemClock::shared();
    let engine = match paper_deps(&config, clock).and_then(|deps| DecisionEngine::new(config, deps)) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = engine.start().await {
        log::error!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Cannot listen for Ctrl-C: {}", e);
    }
    log::info!("Shutting down...");

    if let Err(e) = engine.stop().await {
        log::error!("{}", e);
    }

    let state = engine.risk().portfolio_state().await;
    log::info!(
        "Session end: value={} cash={} realized={} unrealized={} trades={} open={}",
        state.portfolio_value().round_dp(2),
        state.cash.round_dp(2),
        state.daily.realized.round_dp(2),
        state.daily.unrealized.round_dp(2),
        state.daily.trades_today,
        state.open_positions()
    );
}
