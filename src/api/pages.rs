//! Site pages and the session snapshot API.
//!
//! - `GET /` — landing page
//! - `GET /tools?mode=single|multi` — analysis tools
//! - `GET /api/v1/session` — identity of the caller's browser

use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};

use crate::auth::BrowserSession;
use crate::models::{AnalysisMode, Identity};
use crate::services::SessionRegistry;
use crate::services::upload::UploadBoard;
use crate::views;

/// Routes served at the site root.
pub fn configure_page_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home).service(tools);
}

/// Routes served under `/api/v1`.
pub fn configure_api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(current_session);
}

#[get("/")]
async fn home(session: BrowserSession, registry: web::Data<SessionRegistry>) -> HttpResponse {
    let identity = registry.current(&session.id);
    session.page(views::home::render(identity.as_ref()))
}

#[derive(Deserialize)]
pub struct ToolsQuery {
    pub mode: Option<String>,
}

/// Tools page. An explicit `mode` switches the tab; otherwise the last one is kept.
#[get("/tools")]
async fn tools(
    session: BrowserSession,
    query: web::Query<ToolsQuery>,
    registry: web::Data<SessionRegistry>,
    board: web::Data<UploadBoard>,
) -> HttpResponse {
    if let Some(mode) = query.mode.as_deref().and_then(AnalysisMode::parse) {
        board.set_mode(&session.id, mode);
    }
    let state = board.snapshot(&session.id);
    let identity = registry.current(&session.id);
    session.page(views::tools::render(identity.as_ref(), state.mode, &state))
}

/// Session snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub signed_in: bool,
    pub user: Option<Identity>,
}

/// GET /api/v1/session
#[get("/session")]
async fn current_session(
    session: BrowserSession,
    registry: web::Data<SessionRegistry>,
) -> HttpResponse {
    let user = registry.current(&session.id);
    session.apply(&mut HttpResponse::Ok()).json(SessionResponse {
        signed_in: user.is_some(),
        user,
    })
}
