//! The catalog query cache.
//!
//! Holds the current filter state and the last fetched page of results,
//! and keeps exactly one in-flight search consistent with the latest
//! requested filters: a new search aborts the previous fetch, and a stale
//! response that still arrives is discarded by a generation check. Query
//! and results persist across restarts.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use futures::future::{AbortHandle, Abortable};
use serde::{Deserialize, Serialize};
use storefront_client::types::{CategoryDto, PageResponse, ProductDto, ProductQuery};
use storefront_client::{ApiError, StorefrontClient};
use storefront_core::state::{read_state_file, write_state_file, StateError};
use storefront_core::Version;
use tracing::{debug, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to persist catalog state")]
    Persist(#[source] StateError),
}

/// On-disk form of the query cache, the analog of the original session
/// cache: the UI can render the last page before the first fetch lands.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogOnDisk {
    version: Version<1>,
    query: ProductQuery,
    page: PageResponse<ProductDto>,
    categories: Vec<CategoryDto>,
}

#[derive(Debug)]
struct CatalogState {
    query: ProductQuery,
    page: PageResponse<ProductDto>,
    categories: Vec<CategoryDto>,
    /// Human-readable message of the last failed fetch; cleared when a
    /// new search is issued.
    error: Option<String>,
    /// Monotonic search counter. Only the newest generation may apply
    /// its response.
    generation: u64,
    loading: bool,
}

#[derive(Debug)]
pub struct CatalogStore {
    client: Arc<StorefrontClient>,
    state: Mutex<CatalogState>,
    in_flight: Mutex<Option<AbortHandle>>,
    state_file: Option<PathBuf>,
}

impl CatalogStore {
    /// Creates the store, restoring the persisted query and results if
    /// present.
    pub fn new(
        client: Arc<StorefrontClient>,
        state_file: Option<PathBuf>,
    ) -> Result<Self, CatalogError> {
        let mut state = CatalogState {
            query: ProductQuery::default(),
            page: PageResponse::default(),
            categories: vec![],
            error: None,
            generation: 0,
            loading: false,
        };
        if let Some(ref file) = state_file {
            let (on_disk, _lock) =
                read_state_file::<CatalogOnDisk>(file).map_err(CatalogError::Persist)?;
            if let Some(on_disk) = on_disk {
                debug!(page = on_disk.page.number, "restored catalog state");
                state.query = on_disk.query;
                state.page = on_disk.page;
                state.categories = on_disk.categories;
            }
        }
        Ok(CatalogStore {
            client,
            state: Mutex::new(state),
            in_flight: Mutex::new(None),
            state_file,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn query(&self) -> ProductQuery {
        self.lock().query.clone()
    }

    pub fn page(&self) -> PageResponse<ProductDto> {
        self.lock().page.clone()
    }

    pub fn categories(&self) -> Vec<CategoryDto> {
        self.lock().categories.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Merges an update into the current query and fetches the result
    /// page, superseding any outstanding fetch.
    ///
    /// Filter changes and pagination both go through here, so there is
    /// only one fetch path. A superseded call returns `Ok(())` without
    /// touching the results; a failed call records its error message and
    /// leaves the previous results visible.
    #[instrument(skip_all)]
    pub async fn search(&self, update: impl FnOnce(&mut ProductQuery)) -> Result<(), CatalogError> {
        let (query, generation) = {
            let mut state = self.lock();
            update(&mut state.query);
            state.generation += 1;
            state.error = None;
            state.loading = true;
            (state.query.clone(), state.generation)
        };

        // supersede the previous fetch, if it is still running
        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self
            .in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .replace(handle)
        {
            previous.abort();
        }

        debug!(page = query.page, "issuing catalog search");
        let result = match Abortable::new(self.client.products(&query), registration).await {
            Err(futures::future::Aborted) => {
                // superseded by a newer search; its caller owns the state
                debug!("catalog search superseded, dropping result");
                return Ok(());
            },
            Ok(result) => result,
        };

        match result {
            Ok(page) => {
                {
                    let mut state = self.lock();
                    if state.generation != generation {
                        // lost the race to a newer search after the
                        // response arrived
                        debug!("discarding stale catalog response");
                        return Ok(());
                    }
                    state.page = page;
                    state.loading = false;
                }
                self.persist()
            },
            Err(err) => {
                warn!(%err, "catalog search failed");
                {
                    let mut state = self.lock();
                    if state.generation == generation {
                        state.error = Some(err.to_string());
                        state.loading = false;
                    }
                }
                Err(err.into())
            },
        }
    }

    /// Moves one page forward. Does nothing when already on the last page.
    pub async fn next_page(&self) -> Result<(), CatalogError> {
        let state = self.lock();
        if state.page.number + 1 >= state.page.total_pages {
            debug!("already on the last page");
            return Ok(());
        }
        drop(state);
        self.search(|query| query.page += 1).await
    }

    /// Moves one page back. Does nothing on the first page.
    pub async fn prev_page(&self) -> Result<(), CatalogError> {
        if self.lock().query.page == 0 {
            return Ok(());
        }
        self.search(|query| query.page -= 1).await
    }

    /// Fetches the category list. Same error-recording behavior as
    /// search, but no supersede coordination; categories are static.
    pub async fn load_categories(&self) -> Result<(), CatalogError> {
        match self.client.categories().await {
            Ok(categories) => {
                self.lock().categories = categories;
                self.persist()
            },
            Err(err) => {
                warn!(%err, "failed to load categories");
                self.lock().error = Some(err.to_string());
                Err(err.into())
            },
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn lock(&self) -> std::sync::MutexGuard<'_, CatalogState> {
        self.state.lock().expect("catalog state lock poisoned")
    }

    fn persist(&self) -> Result<(), CatalogError> {
        let Some(ref file) = self.state_file else {
            return Ok(());
        };
        let on_disk = {
            let state = self.lock();
            CatalogOnDisk {
                version: Version,
                query: state.query.clone(),
                page: state.page.clone(),
                categories: state.categories.clone(),
            }
        };
        let (_, lock) = read_state_file::<CatalogOnDisk>(file).map_err(CatalogError::Persist)?;
        write_state_file(&on_disk, file, lock).map_err(CatalogError::Persist)?;
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use std::time::Duration;

    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use storefront_client::ClientConfig;

    use super::*;

    fn store(url: &str) -> CatalogStore {
        let client = Arc::new(
            StorefrontClient::new(ClientConfig {
                base_url: url.to_string(),
                ..Default::default()
            })
            .unwrap(),
        );
        CatalogStore::new(client, None).unwrap()
    }

    fn product_page(title: &str, number: u32) -> serde_json::Value {
        json!({
            "content": [{
                "id": format!("p-{title}"),
                "title": title,
                "description": "",
                "price": 10.0,
                "imageUrl": null,
                "active": true,
                "categories": []
            }],
            "totalElements": 30,
            "totalPages": 3,
            "size": 12,
            "number": number
        })
    }

    #[tokio::test]
    async fn search_replaces_the_result_page() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/products").query_param("q", "dune");
            then.status(200).json_body(product_page("Dune", 0));
        });

        let store = store(&server.base_url());
        store
            .search(|query| query.text = Some("dune".to_string()))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(store.page().content[0].title, "Dune");
        assert_eq!(store.page().total_pages, 3);
        assert!(!store.is_loading());
        assert_eq!(store.error(), None);
    }

    #[tokio::test]
    async fn a_newer_search_supersedes_an_outstanding_one() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/products").query_param("q", "alpha");
            // slow enough that the second search lands first
            then.status(200)
                .delay(Duration::from_millis(400))
                .json_body(product_page("Alpha", 0));
        });
        server.mock(|when, then| {
            when.method(GET).path("/products").query_param("q", "beta");
            then.status(200).json_body(product_page("Beta", 0));
        });

        let store = Arc::new(store(&server.base_url()));
        let first = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .search(|query| query.text = Some("alpha".to_string()))
                    .await
            })
        };
        // let the first search reach its fetch before superseding it
        tokio::time::sleep(Duration::from_millis(50)).await;
        store
            .search(|query| query.text = Some("beta".to_string()))
            .await
            .unwrap();
        first.await.unwrap().unwrap();

        // only the later query's results are ever visible
        assert_eq!(store.page().content[0].title, "Beta");
        assert_eq!(store.query().text, Some("beta".to_string()));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn a_failed_search_keeps_the_previous_results() {
        let server = MockServer::start_async().await;
        let mut ok_mock = server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(200).json_body(product_page("Dune", 0));
        });

        let store = store(&server.base_url());
        store.search(|_| {}).await.unwrap();

        ok_mock.delete();
        server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(500).json_body(json!({"message": "boom"}));
        });

        let err = store
            .search(|query| query.text = Some("dune".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Api(_)));

        assert_eq!(store.page().content[0].title, "Dune");
        assert!(store.error().unwrap().contains("boom"));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn pagination_goes_through_the_single_fetch_path() {
        let server = MockServer::start_async().await;
        let page0 = server.mock(|when, then| {
            when.method(GET).path("/products").query_param("page", "0");
            then.status(200).json_body(product_page("Dune", 0));
        });
        let page1 = server.mock(|when, then| {
            when.method(GET).path("/products").query_param("page", "1");
            then.status(200).json_body(product_page("Solaris", 1));
        });

        let store = store(&server.base_url());
        store.search(|_| {}).await.unwrap();
        page0.assert();

        store.next_page().await.unwrap();
        page1.assert();
        assert_eq!(store.query().page, 1);
        assert_eq!(store.page().number, 1);

        store.prev_page().await.unwrap();
        page0.assert_hits(2);
    }

    #[tokio::test]
    async fn next_page_stops_at_the_last_page() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(200).json_body(json!({
                "content": [],
                "totalElements": 0,
                "totalPages": 0,
                "size": 12,
                "number": 0
            }));
        });

        let store = store(&server.base_url());
        store.search(|_| {}).await.unwrap();
        store.next_page().await.unwrap();

        // the empty result page has nowhere to go
        mock.assert_hits(1);
        assert_eq!(store.query().page, 0);
    }

    #[tokio::test]
    async fn query_and_results_survive_a_restart() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/products");
            then.status(200).json_body(product_page("Dune", 0));
        });
        server.mock(|when, then| {
            when.method(GET).path("/categories");
            then.status(200).json_body(json!([
                {"id": "c1", "name": "Sci-Fi", "type": "GENRE_BOOK", "colorHex": "#00ff00"}
            ]));
        });

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("catalog.json");
        let client = Arc::new(
            StorefrontClient::new(ClientConfig {
                base_url: server.base_url(),
                ..Default::default()
            })
            .unwrap(),
        );

        {
            let store = CatalogStore::new(Arc::clone(&client), Some(file.clone())).unwrap();
            store.load_categories().await.unwrap();
            store
                .search(|query| query.text = Some("dune".to_string()))
                .await
                .unwrap();
        }

        let store = CatalogStore::new(client, Some(file)).unwrap();
        assert_eq!(store.query().text, Some("dune".to_string()));
        assert_eq!(store.page().content[0].title, "Dune");
        assert_eq!(store.categories()[0].name, "Sci-Fi");
    }
}
