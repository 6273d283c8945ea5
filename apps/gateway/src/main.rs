use std::net::SocketAddr;
use std::sync::Arc;

use qlkube_gateway::config::Config;
use qlkube_gateway::graphql::{
    BaseSchema, KindRegistry, KubeListResolver, OperationResolver, SchemaComposer,
};
use qlkube_gateway::build_router;
use qlkube_kube_client::KubeClient;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qlkube_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "failed to start qlkube server");
        return Err(e);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let client = KubeClient::from_config(&config.common.kube)?;

    tracing::info!(
        in_cluster = config.common.kube.in_cluster,
        api_url = %client.base_url(),
        auth_mode = ?config.auth_mode,
        environment = %config.common.environment,
        "Starting qlkube on port {}",
        config.port
    );

    tracing::info!("Fetching OpenAPI document...");
    let document = client.fetch_openapi().await?;

    let auth_mode = config.auth_mode;
    let resolver_client = client.clone();
    let base = BaseSchema::from_openapi(&document, move |operation| {
        Arc::new(KubeListResolver::new(resolver_client.clone(), operation, auth_mode))
            as Arc<dyn OperationResolver>
    })?;

    let schema = SchemaComposer::new(base)
        .registry(KindRegistry::kubernetes())
        .compose()?;

    let app = build_router(schema, client, &config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    if config.graphiql {
        tracing::info!(
            "GraphiQL available at http://{}:{}/graphql",
            addr.ip(),
            addr.port()
        );
    }

    axum::serve(listener, app).await?;

    Ok(())
}
