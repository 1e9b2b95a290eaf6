use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use warp::Filter;
use warp::http::StatusCode;

use crate::auth::AuthService;
use crate::config::Config;
use crate::error::ApiError;
use crate::session_manager::SessionManager;
use quiz_core::{LeaderboardView, QuestionCatalog, ScoreKeeper};
use quiz_types::{GuessRequest, NewQuestion, QuestionPatch, UserStatsResponse};

pub mod auth;
pub mod config;
pub mod error;
pub mod session_manager;

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

const MAX_PAGE_SIZE: usize = 100;
const MAX_BODY_BYTES: u64 = 16 * 1024;

type JsonReply = warp::reply::WithStatus<warp::reply::Json>;

fn json_reply<T: Serialize>(value: &T, status: StatusCode) -> JsonReply {
    warp::reply::with_status(warp::reply::json(value), status)
}

fn error_reply(err: ApiError) -> JsonReply {
    let status = err.status();
    if status.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        warn!("Request rejected: {}", err);
    }
    json_reply(&err.to_response(), status)
}

fn into_reply<T: Serialize>(result: Result<T, ApiError>, status: StatusCode) -> JsonReply {
    match result {
        Ok(value) => json_reply(&value, status),
        Err(err) => error_reply(err),
    }
}

pub fn create_routes(
    session_manager: Arc<SessionManager>,
    catalog: QuestionCatalog,
    score_keeper: ScoreKeeper,
    leaderboard: LeaderboardView,
    auth_service: Arc<AuthService>,
    config: Arc<Config>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let session_filter = warp::any().map({
        let session_manager = session_manager.clone();
        move || session_manager.clone()
    });

    let catalog_filter = warp::any().map(move || catalog.clone());
    let keeper_filter = warp::any().map(move || score_keeper.clone());
    let leaderboard_filter = warp::any().map(move || leaderboard.clone());

    let auth_filter = warp::any().map({
        let auth_service = auth_service.clone();
        move || auth_service.clone()
    });

    let config_filter = warp::any().map({
        let config = config.clone();
        move || config.clone()
    });

    let auth_header = warp::header::optional::<String>("authorization");

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", StatusCode::OK));

    let start_game = warp::path!("game" / "start")
        .and(warp::post())
        .and(auth_header)
        .and(session_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_start_game);

    let guess = warp::path!("game" / "guess")
        .and(warp::post())
        .and(auth_header)
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<GuessRequest>())
        .and(session_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_guess);

    let current_game = warp::path!("game")
        .and(warp::get())
        .and(auth_header)
        .and(session_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_current_game);

    let abandon_game = warp::path!("game")
        .and(warp::delete())
        .and(auth_header)
        .and(session_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_abandon_game);

    let leaderboard_route = warp::path!("leaderboard")
        .and(warp::get())
        .and(warp::query::<LimitQuery>())
        .and(leaderboard_filter.clone())
        .and(config_filter.clone())
        .and_then(handle_leaderboard_request);

    let user_stats = warp::path!("user" / "stats")
        .and(warp::get())
        .and(auth_header)
        .and(keeper_filter.clone())
        .and(leaderboard_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_user_stats_request);

    let user_games = warp::path!("user" / "games")
        .and(warp::get())
        .and(auth_header)
        .and(warp::query::<LimitQuery>())
        .and(keeper_filter.clone())
        .and(auth_filter.clone())
        .and(config_filter.clone())
        .and_then(handle_user_games_request);

    let list_questions = warp::path!("questions")
        .and(warp::get())
        .and(auth_header)
        .and(catalog_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_list_questions);

    let add_question = warp::path!("questions")
        .and(warp::post())
        .and(auth_header)
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<NewQuestion>())
        .and(catalog_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_add_question);

    let update_question = warp::path!("questions" / String)
        .and(warp::put())
        .and(auth_header)
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<QuestionPatch>())
        .and(catalog_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_update_question);

    let remove_question = warp::path!("questions" / String)
        .and(warp::delete())
        .and(auth_header)
        .and(catalog_filter.clone())
        .and(auth_filter.clone())
        .and_then(handle_remove_question);

    // CORS configuration
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);

    health
        .or(start_game)
        .or(guess)
        .or(current_game)
        .or(abandon_game)
        .or(leaderboard_route)
        .or(user_stats)
        .or(user_games)
        .or(list_questions)
        .or(add_question)
        .or(update_question)
        .or(remove_question)
        .with(cors)
        .with(warp::log("quiz_arena"))
}

async fn handle_start_game(
    auth_header: Option<String>,
    session_manager: Arc<SessionManager>,
    auth_service: Arc<AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = async {
        let identity = auth_service.authenticate(auth_header.as_deref())?;
        session_manager.start(&identity).await
    }
    .await;

    Ok(into_reply(result, StatusCode::OK))
}

async fn handle_guess(
    auth_header: Option<String>,
    request: GuessRequest,
    session_manager: Arc<SessionManager>,
    auth_service: Arc<AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = async {
        let identity = auth_service.authenticate(auth_header.as_deref())?;
        session_manager.guess(&identity, &request.letter).await
    }
    .await;

    Ok(into_reply(result, StatusCode::OK))
}

async fn handle_current_game(
    auth_header: Option<String>,
    session_manager: Arc<SessionManager>,
    auth_service: Arc<AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = async {
        let identity = auth_service.authenticate(auth_header.as_deref())?;
        session_manager.view(&identity.id).await
    }
    .await;

    Ok(into_reply(result, StatusCode::OK))
}

async fn handle_abandon_game(
    auth_header: Option<String>,
    session_manager: Arc<SessionManager>,
    auth_service: Arc<AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = async {
        let identity = auth_service.authenticate(auth_header.as_deref())?;
        let abandoned = session_manager.abandon(&identity.id).await?;
        Ok::<_, ApiError>(serde_json::json!({ "abandoned": abandoned }))
    }
    .await;

    Ok(into_reply(result, StatusCode::OK))
}

async fn handle_leaderboard_request(
    query: LimitQuery,
    leaderboard: LeaderboardView,
    config: Arc<Config>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let limit = query
        .limit
        .unwrap_or(config.leaderboard_size)
        .min(MAX_PAGE_SIZE);

    let result = leaderboard.top_ranked(limit).await.map_err(ApiError::from);
    Ok(into_reply(result, StatusCode::OK))
}

async fn handle_user_stats_request(
    auth_header: Option<String>,
    score_keeper: ScoreKeeper,
    leaderboard: LeaderboardView,
    auth_service: Arc<AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = async {
        let identity = auth_service.authenticate(auth_header.as_deref())?;
        let stats = score_keeper.stats(&identity.id).await?;
        let rank = leaderboard.rank_of(&identity.id).await?;

        Ok::<_, ApiError>(UserStatsResponse {
            user_id: identity.id,
            stats,
            rank,
        })
    }
    .await;

    Ok(into_reply(result, StatusCode::OK))
}

async fn handle_user_games_request(
    auth_header: Option<String>,
    query: LimitQuery,
    score_keeper: ScoreKeeper,
    auth_service: Arc<AuthService>,
    config: Arc<Config>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let limit = query
        .limit
        .unwrap_or(config.recent_games_limit)
        .min(MAX_PAGE_SIZE);

    let result = async {
        let identity = auth_service.authenticate(auth_header.as_deref())?;
        Ok::<_, ApiError>(score_keeper.recent_games(&identity.id, limit).await?)
    }
    .await;

    Ok(into_reply(result, StatusCode::OK))
}

async fn handle_list_questions(
    auth_header: Option<String>,
    catalog: QuestionCatalog,
    auth_service: Arc<AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = async {
        let identity = auth_service.authenticate(auth_header.as_deref())?;
        auth_service.require_admin(&identity)?;
        Ok::<_, ApiError>(catalog.list().await?)
    }
    .await;

    Ok(into_reply(result, StatusCode::OK))
}

async fn handle_add_question(
    auth_header: Option<String>,
    question: NewQuestion,
    catalog: QuestionCatalog,
    auth_service: Arc<AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = async {
        let identity = auth_service.authenticate(auth_header.as_deref())?;
        auth_service.require_admin(&identity)?;
        Ok::<_, ApiError>(catalog.add(question).await?)
    }
    .await;

    Ok(into_reply(result, StatusCode::CREATED))
}

async fn handle_update_question(
    question_id: String,
    auth_header: Option<String>,
    patch: QuestionPatch,
    catalog: QuestionCatalog,
    auth_service: Arc<AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = async {
        let identity = auth_service.authenticate(auth_header.as_deref())?;
        auth_service.require_admin(&identity)?;
        Ok::<_, ApiError>(catalog.update(&question_id, patch).await?)
    }
    .await;

    Ok(into_reply(result, StatusCode::OK))
}

async fn handle_remove_question(
    question_id: String,
    auth_header: Option<String>,
    catalog: QuestionCatalog,
    auth_service: Arc<AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = async {
        let identity = auth_service.authenticate(auth_header.as_deref())?;
        auth_service.require_admin(&identity)?;
        catalog.remove(&question_id).await?;
        Ok::<_, ApiError>(serde_json::json!({ "removed": question_id }))
    }
    .await;

    Ok(into_reply(result, StatusCode::OK))
}
