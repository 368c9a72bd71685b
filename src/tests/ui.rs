use crate::{
    auction::{Bid, Placement},
    auth::StaticPassword,
    board::BidBoard,
    persistence::SqlitePersistence,
    service::{router, UiState, FORM_REJECTED_MESSAGE, STORAGE_FAILURE_MESSAGE},
    store::{BidStore, InMemoryBidStore, SqliteBidStore},
};
use anyhow::{bail, Result};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

const PASSWORD: &str = "1234";

fn app_with(store: Arc<dyn BidStore + Send + Sync>) -> Router {
    let board = Arc::new(BidBoard::new(store, StaticPassword::new_shared(PASSWORD)));
    router(UiState::new(board, "bids.db"))
}

async fn get_page(app: Router) -> Result<(StatusCode, String)> {
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty())?)
        .await?;
    read(response).await
}

async fn post_form(app: Router, uri: &str, body: &str) -> Result<(StatusCode, String)> {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_owned()))?,
        )
        .await?;
    read(response).await
}

async fn read(response: axum::response::Response) -> Result<(StatusCode, String)> {
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await?;
    Ok((status, String::from_utf8(bytes.to_vec())?))
}

#[tokio::test]
async fn empty_board_page() -> Result<()> {
    let (status, body) = get_page(app_with(InMemoryBidStore::new_shared())).await?;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No bids yet. Be the first!"));
    assert!(body.contains("No bids recorded."));
    assert!(body.contains("Database file: bids.db"));
    assert!(body.contains("type=\"password\""));
    Ok(())
}

#[tokio::test]
async fn placing_a_bid_shows_it_as_leader() -> Result<()> {
    let store = Arc::new(InMemoryBidStore::new());
    let app = app_with(store.clone());

    let (status, body) = post_form(app.clone(), "/bid", "username=Ana&amount=100").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Bid of R$ 100.00 recorded for Ana"));
    assert!(body.contains("<strong>Ana</strong> &mdash; R$ 100.00"));
    assert_eq!(store.history()?.len(), 1);

    let (status, body) = post_form(app, "/bid", "username=Bia&amount=50").await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("there is already a bid of R$ 100.00 or more"));
    assert_eq!(store.history()?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn invalid_input_is_rejected() -> Result<()> {
    let store = Arc::new(InMemoryBidStore::new());
    let app = app_with(store.clone());

    let (status, body) = post_form(app.clone(), "/bid", "username=+++&amount=10").await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("Please enter a valid name before bidding."));

    let (status, _) = post_form(app.clone(), "/bid", "username=Ana&amount=lots").await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post_form(app, "/bid", "amount=10").await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    assert!(store.history()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn user_text_is_escaped() -> Result<()> {
    let app = app_with(InMemoryBidStore::new_shared());

    let (_, body) = post_form(app, "/bid", "username=%3Cscript%3E&amount=5").await?;
    assert!(!body.contains("<script>"));
    assert!(body.contains("&lt;script&gt;"));
    Ok(())
}

#[tokio::test]
async fn admin_actions_check_the_password_every_time() -> Result<()> {
    let store = Arc::new(InMemoryBidStore::new());
    let app = app_with(store.clone());
    store.insert("Ana", 10.0)?;

    let (status, body) = post_form(app.clone(), "/admin/clear", "password=nope").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("Wrong password. Action not allowed."));

    let (status, _) = post_form(app.clone(), "/admin/reset", "").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(store.history()?.len(), 1);

    let (status, body) = post_form(app.clone(), "/admin/clear", "password=1234").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("All bids were removed."));
    assert!(store.history()?.is_empty());

    store.insert("Bia", 20.0)?;
    let (status, body) = post_form(app, "/admin/reset", "password=1234").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Database reset."));
    assert!(store.history()?.is_empty());
    Ok(())
}

#[tokio::test]
async fn storage_failure_renders_a_generic_message() -> Result<()> {
    let dir = tempfile::tempdir()?;
    // never initialized, so every query fails
    let store = SqliteBidStore::new(SqlitePersistence::open(dir.path().join("bids.db"), 1)?);
    let app = app_with(Arc::new(store));

    let (status, body) = get_page(app.clone()).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains(STORAGE_FAILURE_MESSAGE));
    assert!(!body.contains("no such table"));

    let (status, _) = post_form(app, "/bid", "username=Ana&amount=10").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}

#[tokio::test]
async fn huge_amount_over_http_is_recorded() -> Result<()> {
    let store = Arc::new(InMemoryBidStore::new());
    let app = app_with(store.clone());

    let (status, _) = post_form(app, "/bid", "username=Ana&amount=1e307").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.leader()?.expect("a leader").amount, 1e307);
    Ok(())
}

#[tokio::test]
async fn unreadable_forms_still_render_the_page() -> Result<()> {
    let store = Arc::new(InMemoryBidStore::new());
    let app = app_with(store.clone());

    for uri in ["/bid", "/admin/clear", "/admin/reset"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"username":"Ana","amount":"10"}"#))?,
            )
            .await?;
        let (status, body) = read(response).await?;

        assert!(status.is_client_error(), "{uri}: {status}");
        assert!(body.contains(FORM_REJECTED_MESSAGE));
        assert!(body.contains("No bids yet. Be the first!"));
    }

    assert!(store.history()?.is_empty());
    Ok(())
}

/// Writes go through, every read of the board fails
struct BrokenReads(InMemoryBidStore);

impl BidStore for BrokenReads {
    fn initialize(&self) -> Result<()> {
        self.0.initialize()
    }

    fn insert(&self, username: &str, amount: f64) -> Result<Bid> {
        self.0.insert(username, amount)
    }

    fn insert_if_higher(&self, username: &str, amount: f64) -> Result<Placement> {
        self.0.insert_if_higher(username, amount)
    }

    fn leader(&self) -> Result<Option<Bid>> {
        bail!("disk I/O error")
    }

    fn history(&self) -> Result<Vec<Bid>> {
        bail!("disk I/O error")
    }

    fn clear(&self) -> Result<()> {
        self.0.clear()
    }

    fn reset(&self) -> Result<()> {
        self.0.reset()
    }
}

#[tokio::test]
async fn committed_bid_is_reported_even_if_the_board_cannot_be_read() -> Result<()> {
    let store = Arc::new(BrokenReads(InMemoryBidStore::new()));
    let app = app_with(store.clone());

    let (status, body) = post_form(app, "/bid", "username=Ana&amount=10").await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Bid of R$ 10.00 recorded for Ana"));
    assert!(body.contains(STORAGE_FAILURE_MESSAGE));
    assert_eq!(store.0.history()?.len(), 1);
    Ok(())
}
