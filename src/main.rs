use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use local_llm_service::{AppConfig, InteractionLogger, TextGenerator, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!(?config.listen_addr, model = %config.model_id, "loading model artifacts");

    let generator: Arc<dyn TextGenerator> = {
        #[cfg(feature = "tch-backend")]
        {
            Arc::new(local_llm_service::model::TextGenerationPipeline::load(
                config.as_ref(),
            )?)
        }
        #[cfg(not(feature = "tch-backend"))]
        {
            anyhow::bail!("built without an inference backend; enable the tch-backend feature")
        }
    };

    let logger = Arc::new(InteractionLogger::new(config.log_dir.clone())?);
    let router = build_router(config.clone(), generator, logger);

    let listener = TcpListener::bind(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "Local LLM API ready");

    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,hyper=warn,axum::rejection=trace".into());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
