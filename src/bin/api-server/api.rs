use actix_web::{http::StatusCode, web, HttpResponse};
use dish_detail::{data::Dish, db as db_api};
use sqlx::SqlitePool;

pub(super) struct ApiState {
    db_pool: SqlitePool,
}

impl ApiState {
    pub(super) async fn new(addr: &str) -> anyhow::Result<Self> {
        let db_pool = db_api::connect(addr).await?;
        db_api::migrate(&db_pool).await?;
        Ok(Self { db_pool })
    }

    pub(super) fn pool(&self) -> &SqlitePool {
        &self.db_pool
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
struct ErrJsonResp {
    message: String,
}

fn err_resp(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrJsonResp {
        message: message.into(),
    })
}

fn internal_err(err: anyhow::Error) -> HttpResponse {
    tracing::error!("{err:#}");
    err_resp(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
}

#[derive(serde::Deserialize)]
pub(super) struct DishPath {
    id: String,
}

#[actix_web::get("/api/v1/dish-ids")]
pub(super) async fn list_dish_ids(data: web::Data<ApiState>) -> HttpResponse {
    match db_api::get_dish_ids(&data.db_pool).await {
        Ok(ids) => HttpResponse::Ok().json(ids),
        Err(err) => internal_err(err),
    }
}

#[actix_web::get("/api/v1/dishes")]
pub(super) async fn list_dishes(data: web::Data<ApiState>) -> HttpResponse {
    match db_api::get_dishes(&data.db_pool).await {
        Ok(dishes) => HttpResponse::Ok().json(dishes),
        Err(err) => internal_err(err),
    }
}

#[actix_web::get("/api/v1/dishes/{id}")]
pub(super) async fn show_dish(data: web::Data<ApiState>, path: web::Path<DishPath>) -> HttpResponse {
    match db_api::get_dish(&data.db_pool, &path.id).await {
        Ok(Some(dish)) => HttpResponse::Ok().json(dish),
        Ok(None) => err_resp(StatusCode::NOT_FOUND, format!("no dish with id {}", path.id)),
        Err(err) => internal_err(err),
    }
}

#[actix_web::put("/api/v1/dishes/{id}")]
pub(super) async fn update_dish(
    data: web::Data<ApiState>,
    path: web::Path<DishPath>,
    body: web::Json<Dish>,
) -> HttpResponse {
    let dish = body.into_inner();
    if dish.id != path.id {
        return err_resp(
            StatusCode::BAD_REQUEST,
            format!("dish id {} does not match path {}", dish.id, path.id),
        );
    }

    match db_api::put_dish(&data.db_pool, &dish).await {
        Ok(Some(dish)) => {
            tracing::info!("dish {} now has {} comments", dish.id, dish.comments.len());
            HttpResponse::Ok().json(dish)
        }
        Ok(None) => err_resp(StatusCode::NOT_FOUND, format!("no dish with id {}", path.id)),
        Err(err) => internal_err(err),
    }
}
