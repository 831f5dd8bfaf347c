//! HTTP request handlers.

use crate::error::Error;
use crate::middleware::RequestId;
use crate::mint::{ClaimPrice, DropContext};
use crate::pages::{self, CollectionCard, DetailView};
use crate::response::HealthResponse;
use crate::session::{session_id_from_cookies, BeginError, SESSION_COOKIE};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Json};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Health check with basic service metrics.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        content_api: state.config.content_api_url.clone(),
        active_rpc: state.chain.active_url(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        requests: state.request_count.load(Ordering::Relaxed),
        failovers: state.chain.failover_count(),
        sessions: state.sessions.len(),
    })
}

/// Listing page: every collection, no filtering, no pagination. A content
/// store failure propagates as a page-level error.
pub async fn listing(State(state): State<Arc<AppState>>) -> Result<Html<String>, Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let collections = state.content.collections().await?;
    info!(count = collections.len(), "Rendering listing");

    let cards: Vec<CollectionCard> = collections
        .iter()
        .map(|c| CollectionCard {
            title: c.title.clone(),
            description: c.description.clone(),
            name: c.nft_collection_name.clone(),
            slug: c.slug.current.clone(),
            preview_url: state.content.image_url(&c.preview_image),
        })
        .collect();

    Ok(Html(pages::listing(&cards)))
}

/// Detail page for one collection. Unknown slug is a terminal 404. The
/// price and supply reads are independent and run concurrently, joined by
/// the wallet address lookup.
pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    let collection = state
        .content
        .collection(&slug)
        .await?
        .ok_or_else(|| Error::NotFound(slug.clone()))?;

    let (address, conditions, supply) = tokio::join!(
        state.chain.wallet_address(),
        state.chain.claim_conditions(&collection.address),
        state.chain.supply(&collection.address),
    );
    let (address, conditions, supply) = (address?, conditions?, supply?);

    // Display price comes from the first claim condition.
    let price = conditions
        .first()
        .map(|c| ClaimPrice {
            amount: c.price.clone(),
            currency: c.currency.clone(),
        })
        .ok_or_else(|| Error::Chain(format!("no claim conditions for {}", collection.address)))?;

    let ctx = DropContext {
        address,
        claimed: supply.claimed,
        total: supply.total,
        price,
    };

    info!(
        slug = %slug,
        contract = %collection.address,
        claimed = supply.claimed,
        "Rendering drop page"
    );

    let existing = cookie_session_id(&headers);
    let (session_id, page) =
        state
            .sessions
            .mount(existing.as_deref(), &slug, &collection.address, ctx);

    let view = DetailView {
        title: collection.title,
        description: collection.description,
        name: collection.nft_collection_name,
        slug,
        image_url: state.content.image_url(&collection.main_image),
        page,
    };

    let mut response = Html(pages::detail(&view)).into_response();
    let cookie = format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax");
    if let Ok(value) = header::HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    Ok(response)
}

/// Submit a claim for one token. Every outcome redirects back to the detail
/// page; chain rejections are caught here and collapsed into the generic
/// failure toast, with no retry.
pub async fn mint(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    request_id: Option<Extension<RequestId>>,
    headers: HeaderMap,
) -> Response {
    state.request_count.fetch_add(1, Ordering::Relaxed);

    // Correlation id set by middleware.
    let req_id = request_id
        .map(|Extension(RequestId(id))| id)
        .unwrap_or_default();

    let back = Redirect::to(&format!("/nft/{slug}"));

    let Some(session_id) = cookie_session_id(&headers) else {
        warn!(req_id = %req_id, slug = %slug, "Mint attempt without a session");
        return back.into_response();
    };

    let intent = match state.sessions.begin_mint(&session_id, &slug) {
        Ok(intent) => intent,
        Err(BeginError::NoSession) => {
            warn!(req_id = %req_id, slug = %slug, "Mint attempt from an expired session");
            return back.into_response();
        }
        Err(BeginError::Flow(reason)) => {
            warn!(req_id = %req_id, slug = %slug, %reason, "Mint attempt rejected");
            return back.into_response();
        }
    };

    info!(req_id = %req_id, slug = %slug, contract = %intent.contract, "Minting in progress");

    // Quantity is fixed at one.
    match state.chain.claim(&intent.contract, &intent.address, 1).await {
        Ok(outcome) => {
            info!(
                req_id = %req_id,
                slug = %slug,
                receipt = %outcome.receipt,
                token_id = %outcome.token_id,
                "Claim confirmed"
            );
            if let Some(metadata) = &outcome.metadata {
                debug!(%metadata, "Claimed token metadata");
            }
            state.sessions.finish_mint(&session_id, true);
        }
        Err(e) => {
            error!(req_id = %req_id, slug = %slug, error = %e, "Claim failed");
            state.sessions.finish_mint(&session_id, false);
        }
    }

    back.into_response()
}

/// Close the success dialog. Pure UI transition, mint state untouched.
pub async fn close_dialog(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Some(session_id) = cookie_session_id(&headers) {
        state.sessions.close_dialog(&session_id);
    }
    Redirect::to(&format!("/nft/{slug}")).into_response()
}

fn cookie_session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(session_id_from_cookies)
}
