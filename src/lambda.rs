use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use sublease_core::utils::logger;
use sublease_core::utils::validation::Validate;
use sublease_core::{
    EmailQueueProcessor, HttpMailer, LambdaConfig, MarketError, QueueReport, S3DocumentStore,
    S3EmailQueue, SweepEngine, SweepReport, SystemClock,
};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Sweep,
    EmailQueue,
}

/// Payload of the scheduled EventBridge rule that invokes this function.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub task: Task,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum Response {
    Sweep(SweepReport),
    EmailQueue(QueueReport),
}

fn boxed(e: MarketError) -> Error {
    Box::new(e)
}

async fn function_handler(event: LambdaEvent<Request>) -> Result<Response, Error> {
    let request = event.payload;
    tracing::info!("Starting scheduled task {:?}", request.task);

    let config = LambdaConfig::from_env().map_err(boxed)?;
    config.validate().map_err(boxed)?;

    let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .region(Region::new(config.store_region.clone()))
        .build();
    let client = S3Client::from_conf(s3_config);

    let response = match request.task {
        Task::Sweep => {
            let store = S3DocumentStore::new(client, config.store_bucket.clone(), config.store_prefix.clone());
            let engine = SweepEngine::new(store, SystemClock);
            Response::Sweep(engine.run(request.dry_run).await.map_err(boxed)?)
        }
        Task::EmailQueue => {
            let endpoint = config.mail_endpoint.clone().ok_or_else(|| {
                boxed(MarketError::MissingConfigError {
                    field: "MAIL_ENDPOINT".to_string(),
                })
            })?;
            let queue = S3EmailQueue::new(client, config.store_bucket.clone(), config.store_prefix.clone());
            let mailer = HttpMailer::new(endpoint, config.mail_api_key.clone(), config.mail_from.clone());
            let processor =
                EmailQueueProcessor::with_policy(queue, mailer, SystemClock, config.retry_policy());
            Response::EmailQueue(processor.process().await.map_err(boxed)?)
        }
    };

    tracing::info!("Scheduled task {:?} completed", request.task);
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();
    run(service_fn(function_handler)).await
}
