//! MongoDB test infrastructure
//!
//! Provides a `TestMongo` helper that starts a MongoDB container for
//! integration tests.

use mongodb::{Client, Database};
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;

/// Test MongoDB wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is
/// dropped.
pub struct TestMongo {
    #[allow(dead_code)]
    container: ContainerAsync<Mongo>,
    pub client: Client,
    pub uri: String,
}

impl TestMongo {
    /// Start a MongoDB container and connect a client to it
    ///
    /// # Example
    ///
    /// ```no_run
    /// use test_utils::TestMongo;
    ///
    /// # async fn example() {
    /// let mongo = TestMongo::new().await;
    /// let db = mongo.database("catalog_test");
    /// # }
    /// ```
    pub async fn new() -> Self {
        let container = Mongo::default()
            .start()
            .await
            .expect("Failed to start Mongo container");

        let host_port = container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get host port");

        let uri = format!("mongodb://127.0.0.1:{}", host_port);

        // Connect through the workspace connector so tests exercise the
        // same code path production does
        let client = database::mongodb::connect(&uri)
            .await
            .expect("Failed to connect to test MongoDB");

        tracing::info!(port = host_port, "Test MongoDB ready");

        Self {
            container,
            client,
            uri,
        }
    }

    /// Get a handle to a database on the test server
    pub fn database(&self, name: &str) -> Database {
        self.client.database(name)
    }
}
