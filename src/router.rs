use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::auth::{AuthError, Credentials, IdentityProvider};
use crate::habits::HabitSample;
use crate::history::{export_csv, HistoryError, UserIdentity};
use crate::report::{ReportFormat, SleepReport};
use crate::service::{Prediction, ServiceError, SleepSmartService};

#[derive(Clone)]
pub(crate) struct SleepApi {
    service: Arc<SleepSmartService>,
    identity: Arc<dyn IdentityProvider>,
}

/// Router exposing scoring, reports, history and dashboard endpoints.
///
/// Per-user routes require `Authorization: Bearer <id token>` issued by
/// `identity` to the user named in the path.
pub fn sleep_router(
    service: Arc<SleepSmartService>,
    identity: Arc<dyn IdentityProvider>,
) -> Router {
    Router::new()
        .route("/api/v1/predictions", post(predict_handler))
        .route("/api/v1/reports", post(report_handler))
        .route(
            "/api/v1/users/:user_id/entries",
            post(submit_handler).get(history_handler),
        )
        .route("/api/v1/users/:user_id/entries.csv", get(export_handler))
        .route("/api/v1/users/:user_id/dashboard", get(dashboard_handler))
        .with_state(SleepApi { service, identity })
}

/// Router exposing account sign-up and log-in.
pub fn auth_router(provider: Arc<dyn IdentityProvider>) -> Router {
    Router::new()
        .route("/api/v1/auth/signup", post(signup_handler))
        .route("/api/v1/auth/login", post(login_handler))
        .with_state(provider)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReportQuery {
    #[serde(default)]
    format: Option<String>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Accepts the request only when its bearer token belongs to `user_id`. The
/// token is kept on the identity so hosted stores can enforce their own rules.
async fn authorize(
    api: &SleepApi,
    user_id: String,
    headers: &HeaderMap,
) -> Result<UserIdentity, Response> {
    let user = UserIdentity::new(user_id);
    if let Err(error) = user.validated_id() {
        return Err(service_error_response(error.into()));
    }
    let Some(token) = bearer_token(headers) else {
        return Err(error_body(StatusCode::UNAUTHORIZED, "missing bearer token"));
    };

    match api.identity.verify(token).await {
        Ok(owner) if owner == user.user_id => Ok(user.with_token(token)),
        Ok(owner) => {
            warn!(%owner, requested = %user.user_id, "token presented for another user");
            Err(error_body(
                StatusCode::UNAUTHORIZED,
                "token was not issued to this user",
            ))
        }
        Err(error) => Err(auth_error_response(error)),
    }
}

fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn service_error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::History(HistoryError::InvalidUser(_)) => StatusCode::BAD_REQUEST,
        ServiceError::History(HistoryError::Unauthorized) => StatusCode::UNAUTHORIZED,
        ServiceError::History(
            HistoryError::Http(_) | HistoryError::Api { .. } | HistoryError::Unavailable(_),
        ) => StatusCode::BAD_GATEWAY,
        ServiceError::History(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        warn!(error = %error, "history store failure");
    }
    error_body(status, error.to_string())
}

fn attachment(content_type: String, file_name: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}

pub(crate) async fn predict_handler(
    State(api): State<SleepApi>,
    Json(sample): Json<HabitSample>,
) -> Response {
    match api.service.predict(sample, Local::now().date_naive()) {
        Ok(prediction) => (StatusCode::OK, Json(prediction)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn report_handler(
    Query(query): Query<ReportQuery>,
    Json(prediction): Json<Prediction>,
) -> Response {
    let format = match query.format.as_deref().map(str::parse::<ReportFormat>) {
        None => ReportFormat::default(),
        Some(Ok(format)) => format,
        Some(Err(error)) => return error_body(StatusCode::BAD_REQUEST, error.to_string()),
    };

    let report = SleepReport::from_prediction(&prediction);
    attachment(
        format.content_type().to_string(),
        format.file_name(),
        report.render(format),
    )
}

pub(crate) async fn submit_handler(
    State(api): State<SleepApi>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    Json(sample): Json<HabitSample>,
) -> Response {
    let user = match authorize(&api, user_id, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    match api
        .service
        .submit(&user, sample, Local::now().date_naive())
        .await
    {
        Ok(submission) => (StatusCode::CREATED, Json(submission)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn history_handler(
    State(api): State<SleepApi>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = match authorize(&api, user_id, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    match api.service.history(&user).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(error) => service_error_response(error),
    }
}

pub(crate) async fn export_handler(
    State(api): State<SleepApi>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = match authorize(&api, user_id, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    let entries = match api.service.history(&user).await {
        Ok(entries) => entries,
        Err(error) => return service_error_response(error),
    };

    match export_csv(&entries) {
        Ok(csv) => attachment(
            "text/csv; charset=utf-8".to_string(),
            "sleep_history.csv",
            csv,
        ),
        Err(error) => service_error_response(error.into()),
    }
}

pub(crate) async fn dashboard_handler(
    State(api): State<SleepApi>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = match authorize(&api, user_id, &headers).await {
        Ok(user) => user,
        Err(response) => return response,
    };
    match api.service.dashboard(&user).await {
        Ok(Some(summary)) => (StatusCode::OK, Json(summary)).into_response(),
        Ok(None) => error_body(StatusCode::NOT_FOUND, "no sleep data recorded yet"),
        Err(error) => service_error_response(error),
    }
}

fn auth_error_response(error: AuthError) -> Response {
    let status = match &error {
        AuthError::InvalidEmail | AuthError::MissingPassword | AuthError::WeakPassword => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
        AuthError::EmailExists => StatusCode::CONFLICT,
        AuthError::Rejected(_) => StatusCode::BAD_REQUEST,
        AuthError::Http(_) => StatusCode::BAD_GATEWAY,
    };
    error_body(status, error.to_string())
}

pub(crate) async fn signup_handler(
    State(provider): State<Arc<dyn IdentityProvider>>,
    Json(credentials): Json<Credentials>,
) -> Response {
    match provider.sign_up(&credentials).await {
        Ok(session) => (StatusCode::CREATED, Json(session)).into_response(),
        Err(error) => auth_error_response(error),
    }
}

pub(crate) async fn login_handler(
    State(provider): State<Arc<dyn IdentityProvider>>,
    Json(credentials): Json<Credentials>,
) -> Response {
    match provider.sign_in(&credentials).await {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(error) => auth_error_response(error),
    }
}
