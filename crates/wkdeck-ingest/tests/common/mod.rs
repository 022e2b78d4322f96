//! Shared fixtures for wkdeck integration tests
//!
//! - [`TestPostgres`]: throwaway PostgreSQL container (needs Docker)
//! - [`mount_subjects`]: a mock WaniKani `/subjects` endpoint
//! - [`sample_subjects`]: one radical and one kanji in upstream form

#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tracing::{debug, info};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wkdeck_ingest::{DatabaseSettings, FetchSettings, PipelineConfig};

pub const TEST_TOKEN: &str = "test-token";

// ============================================================================
// PostgreSQL Test Container
// ============================================================================

pub struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    pool: PgPool,
    connection_string: String,
}

impl TestPostgres {
    pub async fn start() -> Result<Self> {
        info!("Starting PostgreSQL test container...");

        let container = Postgres::default()
            .with_tag("16-alpine")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container
            .get_host()
            .await
            .context("Failed to get container host")?;
        let port = container
            .get_host_port_ipv4(5432.tcp())
            .await
            .context("Failed to get container port")?;

        let connection_string =
            format!("postgresql://postgres:postgres@{}:{}/postgres", host, port);
        debug!("PostgreSQL connection: {}", connection_string);

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&connection_string)
            .await
            .context("Failed to connect to PostgreSQL")?;

        Ok(Self {
            _container: container,
            pool,
            connection_string,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn settings(&self) -> DatabaseSettings {
        DatabaseSettings {
            url: self.connection_string.clone(),
            max_connections: 5,
        }
    }

    /// Whether a relation (table or view) exists
    pub async fn relation_exists(&self, name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

// ============================================================================
// Mock WaniKani API
// ============================================================================

pub fn kanji_subject() -> Value {
    json!({
        "id": 500,
        "object": "kanji",
        "url": "https://api.wanikani.com/v2/subjects/500",
        "data_updated_at": "2024-05-01T00:00:00.000000Z",
        "data": {
            "created_at": "2012-02-27T18:08:16.000000Z",
            "level": 5,
            "slug": "京",
            "characters": "京",
            "meanings": [{"meaning": "Capital", "primary": true, "accepted_answer": true}],
            "auxiliary_meanings": [],
            "readings": [
                {"reading": "きょう", "primary": true, "type": "onyomi", "accepted_answer": true},
                {"reading": "け", "primary": false, "type": "kunyomi", "accepted_answer": false}
            ],
            "component_subject_ids": [8],
            "amalgamation_subject_ids": [],
            "visually_similar_subject_ids": [],
            "meaning_mnemonic": "The <radical>lid</radical> of the <kanji>capital</kanji>.",
            "reading_mnemonic": "Read it <reading>きょう</reading>."
        }
    })
}

pub fn radical_subject() -> Value {
    json!({
        "id": 8,
        "object": "radical",
        "url": "https://api.wanikani.com/v2/subjects/8",
        "data_updated_at": "2024-05-01T00:00:00.000000Z",
        "data": {
            "level": 1,
            "slug": "lid",
            "characters": "亠",
            "meanings": [{"meaning": "Lid", "primary": true, "accepted_answer": true}],
            "character_images": [{"url": "https://files.wanikani.com/lid.svg", "content_type": "image/svg+xml"}],
            "amalgamation_subject_ids": [500],
            "meaning_mnemonic": "A <radical>lid</radical> on a pot."
        }
    })
}

pub fn sample_subjects() -> Vec<Value> {
    vec![radical_subject(), kanji_subject()]
}

pub fn page(data: Vec<Value>, next_url: Option<String>) -> Value {
    json!({
        "object": "collection",
        "url": "https://api.wanikani.com/v2/subjects",
        "pages": {"per_page": 1000, "next_url": next_url, "previous_url": null},
        "total_count": data.len(),
        "data_updated_at": "2024-05-01T00:00:00.000000Z",
        "data": data
    })
}

/// Serve `subjects` as a single page
pub async fn mount_subjects(server: &MockServer, subjects: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/v2/subjects"))
        .and(header("Authorization", format!("Bearer {TEST_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(subjects, None)))
        .mount(server)
        .await;
}

pub fn fetch_settings(server: &MockServer) -> FetchSettings {
    FetchSettings {
        base_url: format!("{}/v2", server.uri()),
        timeout: Duration::from_secs(5),
        max_retries: 3,
        retry_delay: Duration::from_millis(10),
    }
}

pub fn pipeline_config(server: &MockServer, root: &Path) -> PipelineConfig {
    PipelineConfig {
        api_token: TEST_TOKEN.to_string(),
        fetch: fetch_settings(server),
        data_dir: root.join("data"),
        deck_dir: root.join("ankidecks"),
        ..Default::default()
    }
}

/// Snapshot files currently in `dir`
pub fn snapshot_files(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect()
        })
        .unwrap_or_default()
}
