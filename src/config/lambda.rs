use crate::core::email_queue::{RetryPolicy, DEFAULT_BACKOFF_SECONDS, DEFAULT_MAX_ATTEMPTS};
use crate::domain::model::{EmailJob, ItemVersion, ListableItem};
use crate::domain::ports::{DocumentStore, EmailQueue};
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::Validate;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::env;

#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub store_bucket: String,
    pub store_prefix: String,
    pub store_region: String,
    pub mail_endpoint: Option<String>,
    pub mail_api_key: Option<String>,
    pub mail_from: String,
    pub max_attempts: u32,
    pub backoff_seconds: u64,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            store_bucket: env::var("STORE_BUCKET").map_err(|_| MarketError::ConfigError {
                message: "STORE_BUCKET environment variable is required".to_string(),
            })?,
            store_prefix: env::var("STORE_PREFIX").unwrap_or_else(|_| "sublease".to_string()),
            store_region: env::var("STORE_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            mail_endpoint: env::var("MAIL_ENDPOINT").ok(),
            mail_api_key: env::var("MAIL_API_KEY").ok(),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@localhost".to_string()),
            max_attempts: env::var("MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            backoff_seconds: env::var("BACKOFF_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_BACKOFF_SECONDS as u64),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::seconds(self.backoff_seconds as i64),
        }
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        use crate::utils::validation::*;

        validate_s3_bucket_name("store_bucket", &self.store_bucket)?;
        validate_non_empty_string("store_prefix", &self.store_prefix)?;
        validate_aws_region("store_region", &self.store_region)?;
        if let Some(endpoint) = &self.mail_endpoint {
            validate_url("mail_endpoint", endpoint)?;
        }
        validate_range("max_attempts", self.max_attempts, 1, 10)?;
        validate_positive_number("backoff_seconds", self.backoff_seconds, 1)?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    let invalid = |reason: &str| MarketError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: bucket_name.to_string(),
        reason: reason.to_string(),
    };

    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(invalid("S3 bucket name must be between 3 and 63 characters"));
    }
    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }
    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(invalid("S3 bucket name cannot start or end with a hyphen"));
    }
    Ok(())
}

fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    crate::utils::validation::validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(MarketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens".to_string(),
        });
    }
    Ok(())
}

fn storage_error(action: &str, key: &str, err: impl std::error::Error) -> MarketError {
    MarketError::StorageError {
        message: format!("{} {}: {}", action, key, DisplayErrorContext(err)),
    }
}

/// S3 rejects a conditional request whose ETag no longer matches with
/// `PreconditionFailed`, or `ConditionalRequestConflict` under contention.
fn is_condition_failure(code: Option<&str>) -> bool {
    matches!(code, Some("PreconditionFailed") | Some("ConditionalRequestConflict"))
}

/// JSON objects in one bucket, addressed by key, with ETag-guarded writes.
#[derive(Debug, Clone)]
struct S3Json {
    client: S3Client,
    bucket: String,
}

enum WriteCondition<'a> {
    Always,
    Absent,
    Matches(&'a str),
}

impl S3Json {
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<(T, Option<String>)>> {
        let output = match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) => {
                let service = err.into_service_error();
                if service.is_no_such_key() {
                    return Ok(None);
                }
                return Err(storage_error("read", key, service));
            }
        };

        let etag = output.e_tag().map(str::to_string);
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| storage_error("read body of", key, e))?;
        let value = serde_json::from_slice(&data.into_bytes())?;
        Ok(Some((value, etag)))
    }

    async fn put<T: Serialize>(&self, key: &str, value: &T, condition: WriteCondition<'_>) -> Result<bool> {
        let body = serde_json::to_vec(value)?;
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(body));
        request = match condition {
            WriteCondition::Always => request,
            WriteCondition::Absent => request.if_none_match("*"),
            WriteCondition::Matches(etag) => request.if_match(etag),
        };

        match request.send().await {
            Ok(_) => Ok(true),
            Err(err) if is_condition_failure(err.code()) => Ok(false),
            Err(err) => Err(storage_error("write", key, err)),
        }
    }

    async fn delete(&self, key: &str, etag: &str) -> Result<bool> {
        match self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .if_match(etag)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if is_condition_failure(err.code()) => Ok(false),
            Err(err) => Err(storage_error("delete", key, err)),
        }
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(token.take())
                .send()
                .await
                .map_err(|e| storage_error("list", prefix, e))?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter(|key| key.ends_with(".json"))
                    .map(str::to_string),
            );

            match page.next_continuation_token() {
                Some(next) if page.is_truncated() == Some(true) => token = Some(next.to_string()),
                _ => break,
            }
        }
        Ok(keys)
    }
}

/// One JSON object per item under `{prefix}/items/`.
#[derive(Debug, Clone)]
pub struct S3DocumentStore {
    objects: S3Json,
    prefix: String,
}

impl S3DocumentStore {
    pub fn new(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            objects: S3Json { client, bucket },
            prefix,
        }
    }

    fn items_prefix(&self) -> String {
        format!("{}/items/", self.prefix.trim_end_matches('/'))
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}.json", self.items_prefix(), id)
    }
}

impl DocumentStore for S3DocumentStore {
    async fn get(&self, id: &str) -> Result<Option<ListableItem>> {
        Ok(self.objects.get(&self.key(id)).await?.map(|(item, _)| item))
    }

    async fn list(&self) -> Result<Vec<ListableItem>> {
        let mut items = Vec::new();
        for key in self.objects.list_keys(&self.items_prefix()).await? {
            // Deleted between list and get.
            if let Some((item, _)) = self.objects.get::<ListableItem>(&key).await? {
                items.push(item);
            }
        }
        Ok(items)
    }

    async fn insert(&self, item: &ListableItem) -> Result<()> {
        if self.objects.put(&self.key(&item.id), item, WriteCondition::Absent).await? {
            Ok(())
        } else {
            Err(MarketError::AlreadyExists(item.id.clone()))
        }
    }

    async fn update_if(&self, item: &ListableItem, expected: ItemVersion) -> Result<bool> {
        let key = self.key(&item.id);
        let Some((current, etag)) = self.objects.get::<ListableItem>(&key).await? else {
            return Err(MarketError::NotFound(item.id.clone()));
        };
        if !expected.matches(&current) {
            return Ok(false);
        }
        let condition = match etag.as_deref() {
            Some(etag) => WriteCondition::Matches(etag),
            None => WriteCondition::Always,
        };
        self.objects.put(&key, item, condition).await
    }

    async fn delete_if(&self, id: &str, expected: ItemVersion) -> Result<bool> {
        let key = self.key(id);
        let Some((current, etag)) = self.objects.get::<ListableItem>(&key).await? else {
            return Ok(false);
        };
        if !expected.matches(&current) {
            return Ok(false);
        }
        let etag = etag.ok_or_else(|| MarketError::StorageError {
            message: format!("object {} has no ETag; refusing an unconditional delete", key),
        })?;
        self.objects.delete(&key, &etag).await
    }
}

/// One JSON object per queued email under `{prefix}/email-queue/`.
#[derive(Debug, Clone)]
pub struct S3EmailQueue {
    objects: S3Json,
    prefix: String,
}

impl S3EmailQueue {
    pub fn new(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            objects: S3Json { client, bucket },
            prefix,
        }
    }

    fn queue_prefix(&self) -> String {
        format!("{}/email-queue/", self.prefix.trim_end_matches('/'))
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}.json", self.queue_prefix(), id)
    }
}

impl EmailQueue for S3EmailQueue {
    async fn enqueue(&self, job: &EmailJob) -> Result<()> {
        if self.objects.put(&self.key(&job.id), job, WriteCondition::Absent).await? {
            Ok(())
        } else {
            Err(MarketError::AlreadyExists(job.id.clone()))
        }
    }

    async fn due(&self, now: DateTime<Utc>) -> Result<Vec<EmailJob>> {
        let mut jobs = Vec::new();
        for key in self.objects.list_keys(&self.queue_prefix()).await? {
            if let Some((job, _)) = self.objects.get::<EmailJob>(&key).await? {
                if job.is_due(now) {
                    jobs.push(job);
                }
            }
        }
        Ok(jobs)
    }

    async fn save(&self, job: &EmailJob) -> Result<()> {
        self.objects
            .put(&self.key(&job.id), job, WriteCondition::Always)
            .await
            .map(|_| ())
    }
}
