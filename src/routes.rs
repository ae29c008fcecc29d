use std::sync::{Arc, Mutex};

use actix_web::error::{ErrorInternalServerError, InternalError, JsonPayloadError, PathError};
use actix_web::{web, HttpRequest, HttpResponse, Responder, ResponseError};
use log::{error, warn};
use serde_json::json;
use tokio::task;

use crate::error::StoreError;
use crate::models::{NewPost, NewUser};
use crate::store::Store;

pub struct AppState {
    pub store: Arc<Mutex<Store>>,
}

impl AppState {
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

/// Runs `f` against the store on the blocking pool.
async fn with_store<T, F>(data: &web::Data<AppState>, f: F) -> Result<T, actix_web::Error>
where
    T: Send + 'static,
    F: FnOnce(&Store) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(&data.store);
    let result = task::spawn_blocking(move || {
        // A panic mid-request leaves the connection itself usable.
        let store = store.lock().unwrap_or_else(|poisoned| {
            warn!("Store mutex was poisoned, recovering");
            poisoned.into_inner()
        });
        f(&store)
    })
    .await
    .map_err(|e| {
        error!("Store task failed: {}", e);
        ErrorInternalServerError("500 Internal Server Error")
    })?;
    if let Err(StoreError::Database(e)) = &result {
        error!("Store request failed: {:?}", e);
    }
    Ok(result?)
}

/// Replaces actix's plain-text extractor errors with a `{"detail": ..}` body,
/// keeping the extractor's status code.
fn detail_error<E: ResponseError + 'static>(err: E, _req: &HttpRequest) -> actix_web::Error {
    warn!("Rejected request: {}", err);
    let response = HttpResponse::build(err.status_code()).json(json!({ "detail": err.to_string() }));
    InternalError::from_response(err, response).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(detail_error::<JsonPayloadError>))
        .app_data(web::PathConfig::default().error_handler(detail_error::<PathError>))
        .route("/users", web::post().to(create_user))
        .route("/users", web::get().to(list_users))
        .route("/users/{id}", web::get().to(get_user))
        .route("/posts", web::post().to(create_post))
        .route("/posts", web::get().to(list_posts))
        .route("/posts/{id}", web::get().to(get_post))
        .route("/posts/{id}", web::put().to(update_post))
        .route("/posts/{id}", web::delete().to(delete_post));
}

async fn create_user(
    data: web::Data<AppState>,
    user: web::Json<NewUser>,
) -> Result<impl Responder, actix_web::Error> {
    let user = user.into_inner();
    let created = with_store(&data, move |store| store.create_user(&user)).await?;
    Ok(HttpResponse::Created().json(created))
}

async fn get_user(data: web::Data<AppState>, id: web::Path<i64>) -> Result<impl Responder, actix_web::Error> {
    let id = id.into_inner();
    let user = with_store(&data, move |store| store.get_user(id)).await?;
    Ok(HttpResponse::Ok().json(user))
}

async fn list_users(data: web::Data<AppState>) -> Result<impl Responder, actix_web::Error> {
    let users = with_store(&data, |store| store.list_users()).await?;
    Ok(HttpResponse::Ok().json(users))
}

async fn create_post(
    data: web::Data<AppState>,
    post: web::Json<NewPost>,
) -> Result<impl Responder, actix_web::Error> {
    let post = post.into_inner();
    let created = with_store(&data, move |store| store.create_post(&post)).await?;
    Ok(HttpResponse::Created().json(created))
}

async fn get_post(data: web::Data<AppState>, id: web::Path<i64>) -> Result<impl Responder, actix_web::Error> {
    let id = id.into_inner();
    let post = with_store(&data, move |store| store.get_post(id)).await?;
    Ok(HttpResponse::Ok().json(post))
}

async fn list_posts(data: web::Data<AppState>) -> Result<impl Responder, actix_web::Error> {
    let posts = with_store(&data, |store| store.list_posts()).await?;
    Ok(HttpResponse::Ok().json(posts))
}

async fn update_post(
    data: web::Data<AppState>,
    id: web::Path<i64>,
    post: web::Json<NewPost>,
) -> Result<impl Responder, actix_web::Error> {
    let id = id.into_inner();
    let post = post.into_inner();
    let updated = with_store(&data, move |store| store.update_post(id, &post)).await?;
    Ok(HttpResponse::Ok().json(updated))
}

async fn delete_post(data: web::Data<AppState>, id: web::Path<i64>) -> Result<impl Responder, actix_web::Error> {
    let id = id.into_inner();
    with_store(&data, move |store| store.delete_post(id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(json!({ "detail": "404 Not Found" }))
}
