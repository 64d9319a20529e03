//! Read/admin HTTP interface. Handlers only translate between HTTP and the
//! engine's structured results; all state access goes through the same
//! guarded [`Database`] the event processor uses.

use std::sync::Arc;

use actix_web::{
    dev::Server, http::StatusCode, web, App, HttpRequest, HttpResponse, HttpServer, ResponseError,
};
use chrono::Utc;

use crate::{config::Config, database::Database, error::EngineError};

struct AppState {
    db: Arc<Database>,
    admin_token: Option<String>,
}

impl ResponseError for EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::PreconditionFailed(_) => StatusCode::CONFLICT,
            EngineError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.to_string() }))
    }
}

async fn index() -> HttpResponse {
    HttpResponse::Ok().body("Housemate Ryker is online and managing the neighborhood!")
}

async fn stats(data: web::Data<Arc<AppState>>) -> HttpResponse {
    let summary = data.db.activity_summary(Utc::now(), 5).await;
    HttpResponse::Ok().json(summary)
}

async fn leaderboard(data: web::Data<Arc<AppState>>) -> HttpResponse {
    HttpResponse::Ok().json(data.db.leaderboard(10).await)
}

async fn user(
    data: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, EngineError> {
    let user_id = path.into_inner();
    match data.db.get_user(&user_id).await {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(EngineError::NotFound(format!("user {}", user_id))),
    }
}

async fn modlogs_for_target(
    data: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> HttpResponse {
    HttpResponse::Ok().json(data.db.find_by_target(&path.into_inner()).await)
}

async fn recent_modlogs(data: web::Data<Arc<AppState>>) -> HttpResponse {
    HttpResponse::Ok().json(data.db.recent_entries(20).await)
}

#[derive(Deserialize)]
struct AdjustRequest {
    delta: i64,
}

async fn adjust_points(
    req: HttpRequest,
    data: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<AdjustRequest>,
) -> Result<HttpResponse, EngineError> {
    if let Err(denied) = check_admin(&req, &data) {
        return Ok(denied);
    }
    let outcome = data.db.adjust_points(&path.into_inner(), body.delta).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

async fn draw_raffle(
    req: HttpRequest,
    data: web::Data<Arc<AppState>>,
) -> Result<HttpResponse, EngineError> {
    if let Err(denied) = check_admin(&req, &data) {
        return Ok(denied);
    }
    let outcome = data.db.draw_raffle(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Admin routes fail closed: without a configured token nobody gets in.
fn check_admin(req: &HttpRequest, data: &AppState) -> Result<(), HttpResponse> {
    let expected = match &data.admin_token {
        Some(token) => token,
        None => {
            warn!("ADMIN_TOKEN is not set, refusing admin access");
            return Err(
                HttpResponse::ServiceUnavailable().body("admin access is not configured")
            );
        }
    };
    match req
        .headers()
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
    {
        Some(got) if got == expected => Ok(()),
        _ => Err(HttpResponse::Unauthorized().body("missing or invalid admin token")),
    }
}

pub fn start_api(db: Arc<Database>, config: &Config) -> std::io::Result<Server> {
    let admin_token = config.admin_token.clone();
    let server = HttpServer::new(move || {
        let data = web::Data::new(Arc::new(AppState {
            db: db.clone(),
            admin_token: admin_token.clone(),
        }));

        App::new()
            .app_data(data)
            .route("/", web::get().to(index))
            .route("/api/stats", web::get().to(stats))
            .route("/api/leaderboard", web::get().to(leaderboard))
            .route("/api/user/{id}", web::get().to(user))
            .route("/api/user/{id}/adjust", web::post().to(adjust_points))
            .route("/api/modlogs", web::get().to(recent_modlogs))
            .route("/api/modlogs/{id}", web::get().to(modlogs_for_target))
            .route("/api/raffle/draw", web::post().to(draw_raffle))
    })
    .bind(&config.bind_addr)?
    .run();
    Ok(server)
}
