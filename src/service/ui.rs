//! Web UI
//!
//! One page, three forms. Every request reads the board fresh, applies at
//! most one flow and answers with the re-rendered page.
use crate::{
    auction,
    board::{BidBoard, BoardError},
    render::{self, Notice},
    service::LoopService,
};
use anyhow::{format_err, Context, Result};
use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::{net::SocketAddr, sync::Arc};
use tokio::{runtime::Runtime, sync::oneshot};
use tracing::{debug, error, info};

pub const STORAGE_FAILURE_MESSAGE: &str =
    "Something went wrong while talking to the database. Please try again.";

pub const FORM_REJECTED_MESSAGE: &str =
    "The submitted form could not be read. Please use the form on this page.";

#[derive(Clone)]
pub struct UiState {
    board: Arc<BidBoard>,
    db_path: Arc<str>,
}

impl UiState {
    pub fn new(board: Arc<BidBoard>, db_path: impl Into<Arc<str>>) -> Self {
        Self {
            board,
            db_path: db_path.into(),
        }
    }
}

#[derive(Deserialize)]
pub struct BidForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    amount: String,
}

#[derive(Deserialize)]
pub struct AdminForm {
    #[serde(default)]
    password: String,
}

pub fn router(state: UiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/bid", post(submit_bid))
        .route("/admin/clear", post(clear_bids))
        .route("/admin/reset", post(reset_database))
        .with_state(state)
}

async fn index(State(state): State<UiState>) -> Response {
    render_board(&state, StatusCode::OK, None).await
}

async fn submit_bid(
    State(state): State<UiState>,
    form: Result<Form<BidForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return unreadable_form(&state, rejection).await,
    };

    let board = state.board.clone();
    let result = run_blocking(move || {
        let amount = auction::parse_amount(&form.amount)?;
        board.submit(&form.username, amount)
    })
    .await;

    let (status, notice) = match result {
        Ok(bid) => (
            StatusCode::OK,
            Notice::success(format!(
                "Bid of {} recorded for {}",
                render::format_amount(bid.amount),
                bid.username
            )),
        ),
        Err(e) => rejection(e),
    };

    render_board(&state, status, Some(notice)).await
}

async fn clear_bids(
    State(state): State<UiState>,
    form: Result<Form<AdminForm>, FormRejection>,
) -> Response {
    admin_action(state, form, BidBoard::clear, "All bids were removed.").await
}

async fn reset_database(
    State(state): State<UiState>,
    form: Result<Form<AdminForm>, FormRejection>,
) -> Response {
    admin_action(state, form, BidBoard::reset, "Database reset.").await
}

async fn admin_action(
    state: UiState,
    form: Result<Form<AdminForm>, FormRejection>,
    action: fn(&BidBoard, &str) -> Result<(), BoardError>,
    confirmation: &'static str,
) -> Response {
    let password = match form {
        Ok(Form(form)) => form.password,
        Err(rejection) => return unreadable_form(&state, rejection).await,
    };

    let board = state.board.clone();
    let result = run_blocking(move || action(&board, &password)).await;

    let (status, notice) = match result {
        Ok(()) => (StatusCode::OK, Notice::success(confirmation)),
        Err(e) => rejection(e),
    };

    render_board(&state, status, Some(notice)).await
}

/// A body that isn't a url-encoded form still gets the page back
async fn unreadable_form(state: &UiState, rejection: FormRejection) -> Response {
    debug!(%rejection, "unreadable form");
    render_board(
        state,
        rejection.status(),
        Some(Notice::error(FORM_REJECTED_MESSAGE)),
    )
    .await
}

fn rejection(e: BoardError) -> (StatusCode, Notice) {
    match e {
        BoardError::Validation(e) => (StatusCode::UNPROCESSABLE_ENTITY, Notice::error(e.to_string())),
        BoardError::NotHighBid { leader_amount } => (
            StatusCode::CONFLICT,
            Notice::warning(format!(
                "Bid rejected: there is already a bid of {} or more.",
                render::format_amount(leader_amount)
            )),
        ),
        e @ BoardError::Authorization => (StatusCode::FORBIDDEN, Notice::error(e.to_string())),
        BoardError::Storage(e) => {
            error!("storage failure: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Notice::error(STORAGE_FAILURE_MESSAGE),
            )
        }
    }
}

async fn render_board(state: &UiState, status: StatusCode, notice: Option<Notice>) -> Response {
    let board = state.board.clone();
    match run_blocking(move || board.snapshot()).await {
        Ok(view) => (
            status,
            Html(render::page(&view, notice.as_ref(), &state.db_path)),
        )
            .into_response(),
        Err(e) => {
            error!("failed to read the board: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render::failure_page(
                    notice
                        .as_ref()
                        .filter(|notice| notice.message != STORAGE_FAILURE_MESSAGE),
                    STORAGE_FAILURE_MESSAGE,
                )),
            )
                .into_response()
        }
    }
}

/// Store calls block, keep them off the async workers
async fn run_blocking<T, F>(f: F) -> Result<T, BoardError>
where
    F: FnOnce() -> Result<T, BoardError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BoardError::Storage(format_err!("blocking task failed: {e}")))?
}

async fn run_http_server(state: UiState, addr: SocketAddr) -> Result<()> {
    let app = router(state);

    info!(%addr, "http server listening");
    axum::Server::try_bind(&addr)?
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

pub struct Ui {
    // cancels all tasks on drop
    _runtime: Runtime,
    server_rx: oneshot::Receiver<Result<()>>,
}

impl Ui {
    pub fn new(state: UiState, addr: SocketAddr) -> Result<Self> {
        let runtime = Runtime::new()?;

        let (tx, rx) = oneshot::channel();

        runtime.spawn(async move {
            // nobody to tell if the receiver is already gone
            let _ = tx.send(
                run_http_server(state, addr)
                    .await
                    .with_context(|| format!("Failed to run http server on {addr}")),
            );
        });

        Ok(Self {
            _runtime: runtime,
            server_rx: rx,
        })
    }
}

impl LoopService for Ui {
    fn run_iteration(&mut self) -> Result<()> {
        // don't hog the cpu
        std::thread::sleep(std::time::Duration::from_millis(100));

        match self.server_rx.try_recv() {
            Ok(res) => res,
            Err(oneshot::error::TryRecvError::Empty) => Ok(()),
            Err(oneshot::error::TryRecvError::Closed) => {
                Err(format_err!("ui server died without leaving a response?!"))
            }
        }
    }
}
