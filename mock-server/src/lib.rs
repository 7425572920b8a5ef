use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub token: String,
    pub id: String,
}

#[derive(Deserialize)]
pub struct ApiKeyQuery {
    apikey: Option<String>,
}

struct User {
    id: String,
    password: String,
}

#[derive(Default)]
pub struct Db {
    users: HashMap<String, User>,
    tokens: HashMap<String, String>,
    todos: HashMap<String, Vec<Todo>>,
}

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    db: Arc<RwLock<Db>>,
}

/// Error response with a `{"message": ...}` body.
#[derive(Debug)]
pub struct ApiFailure(StatusCode, &'static str);

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "message": self.1 }))).into_response()
    }
}

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        db: Arc::new(RwLock::new(Db::default())),
    };
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/users/{user_id}/todos", post(create_todo).get(list_todos))
        .route("/api/users/{user_id}/todos/{id}", put(update_todo).delete(delete_todo))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

fn check_api_key(state: &AppState, query: &ApiKeyQuery) -> Result<(), ApiFailure> {
    match query.apikey.as_deref() {
        Some(key) if key == &*state.api_key => Ok(()),
        _ => Err(ApiFailure(StatusCode::UNAUTHORIZED, "Invalid API key")),
    }
}

/// Resolve the bearer token and require it to belong to `user_id`.
fn authorize(db: &Db, headers: &HeaderMap, user_id: &str) -> Result<(), ApiFailure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiFailure(StatusCode::UNAUTHORIZED, "Missing bearer token"))?;
    let owner = db
        .tokens
        .get(token)
        .ok_or(ApiFailure(StatusCode::UNAUTHORIZED, "Invalid token"))?;
    if owner != user_id {
        return Err(ApiFailure(StatusCode::FORBIDDEN, "Token does not match user"));
    }
    Ok(())
}

fn issue_token(db: &mut Db, user_id: &str) -> UserResponse {
    let token = Uuid::new_v4().to_string();
    db.tokens.insert(token.clone(), user_id.to_string());
    UserResponse {
        token,
        id: user_id.to_string(),
    }
}

async fn register(
    State(state): State<AppState>,
    Query(query): Query<ApiKeyQuery>,
    Json(input): Json<Registration>,
) -> Result<(StatusCode, Json<UserResponse>), ApiFailure> {
    check_api_key(&state, &query)?;
    let mut db = state.db.write().await;
    if db.users.contains_key(&input.email) {
        return Err(ApiFailure(StatusCode::CONFLICT, "User already exists"));
    }
    let id = Uuid::new_v4().to_string();
    db.users.insert(
        input.email.clone(),
        User {
            id: id.clone(),
            password: input.password,
        },
    );
    db.todos.insert(id.clone(), Vec::new());
    tracing::info!(user_id = %id, name = %input.name, "registered user");
    Ok((StatusCode::CREATED, Json(issue_token(&mut db, &id))))
}

async fn login(
    State(state): State<AppState>,
    Query(query): Query<ApiKeyQuery>,
    Json(input): Json<Login>,
) -> Result<Json<UserResponse>, ApiFailure> {
    check_api_key(&state, &query)?;
    let mut db = state.db.write().await;
    let id = match db.users.get(&input.email) {
        Some(user) if user.password == input.password => user.id.clone(),
        _ => return Err(ApiFailure(StatusCode::UNAUTHORIZED, "Invalid credentials")),
    };
    Ok(Json(issue_token(&mut db, &id)))
}

async fn list_todos(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ApiKeyQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<Todo>>, ApiFailure> {
    check_api_key(&state, &query)?;
    let db = state.db.read().await;
    authorize(&db, &headers, &user_id)?;
    Ok(Json(db.todos.get(&user_id).cloned().unwrap_or_default()))
}

async fn create_todo(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<ApiKeyQuery>,
    headers: HeaderMap,
    Json(input): Json<Todo>,
) -> Result<(StatusCode, Json<Todo>), ApiFailure> {
    check_api_key(&state, &query)?;
    let mut db = state.db.write().await;
    authorize(&db, &headers, &user_id)?;
    let todo = Todo {
        id: Uuid::new_v4().to_string(),
        text: input.text,
        completed: input.completed,
    };
    db.todos.entry(user_id).or_default().push(todo.clone());
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
    Query(query): Query<ApiKeyQuery>,
    headers: HeaderMap,
    Json(input): Json<Todo>,
) -> Result<Json<Todo>, ApiFailure> {
    check_api_key(&state, &query)?;
    let mut db = state.db.write().await;
    authorize(&db, &headers, &user_id)?;
    let todo = db
        .todos
        .get_mut(&user_id)
        .and_then(|todos| todos.iter_mut().find(|t| t.id == id))
        .ok_or(ApiFailure(StatusCode::NOT_FOUND, "Todo not found"))?;
    todo.text = input.text;
    todo.completed = input.completed;
    Ok(Json(todo.clone()))
}

async fn delete_todo(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(String, String)>,
    Query(query): Query<ApiKeyQuery>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiFailure> {
    check_api_key(&state, &query)?;
    let mut db = state.db.write().await;
    authorize(&db, &headers, &user_id)?;
    let todos = db.todos.entry(user_id).or_default();
    let before = todos.len();
    todos.retain(|t| t.id != id);
    if todos.len() == before {
        return Err(ApiFailure(StatusCode::NOT_FOUND, "Todo not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
