use axum::Router;
use lambda_http::{run, Error};
use verdant::core::controller::AppState;
use verdant::core::domain::Configuration;
use verdant::core::repository::RepositoryStore;
use verdant::utils::ddb::setup_tracing;
use verdant::{catalog, ledger, members};

// See https://docs.aws.amazon.com/lambda/latest/dg/lambda-rust.html
// https://docs.aws.amazon.com/lambda/latest/dg/rust-http-events.html

const DEV_MODE: bool = true;

#[tokio::main]
async fn main() -> Result<(), Error> {
    setup_tracing();

    let store = RepositoryStore::from_env();
    let state = if DEV_MODE {
        std::env::set_var("AWS_LAMBDA_FUNCTION_NAME", "_");
        std::env::set_var("AWS_LAMBDA_FUNCTION_MEMORY_SIZE", "4096");
        std::env::set_var("AWS_LAMBDA_FUNCTION_VERSION", "1");
        std::env::set_var("AWS_LAMBDA_RUNTIME_API", "http://[::]:9000/.rt");
        AppState::build(Configuration::from_env("dev"), store).await
    } else {
        AppState::build(Configuration::from_env("prod"), store).await
    };

    // the ledger also serves catalog and member routes so one process owns the shared store
    let app = Router::new()
        .merge(ledger::controller::routes())
        .merge(catalog::controller::routes())
        .merge(members::controller::routes())
        .with_state(state);

    run(app).await
}
