use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use dish_detail::{config::Config, data::Dish, db as db_api};

mod api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    config.setup_logging()?;

    let state = api::ApiState::new(&config.database_url).await?;
    if let Some(seed) = &config.seed_file {
        let raw = std::fs::read_to_string(seed)
            .with_context(|| format!("fail to read seed file {}", seed.display()))?;
        let dishes: Vec<Dish> = serde_json::from_str(&raw)
            .with_context(|| format!("fail to parse seed file {}", seed.display()))?;
        let added = db_api::seed_dishes(state.pool(), &dishes).await?;
        tracing::info!("seeded {added} dishes from {}", seed.display());
    }

    let state = web::Data::new(state);
    let origin = config.allowed_origin.clone();
    tracing::info!("listening on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allowed_origin(&origin)
                    .allow_any_method()
                    .allow_any_header(),
            )
            .service(api::list_dish_ids)
            .service(api::list_dishes)
            .service(api::show_dish)
            .service(api::update_dish)
    })
    .bind(config.bind_addr.as_str())?
    .run()
    .await?;
    Ok(())
}
