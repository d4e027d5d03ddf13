use std::sync::Arc;

use dish_detail::{config::Config, navigation::History, DishDetail, HttpDishService};
use tokio::io::{AsyncBufReadExt, BufReader};

mod handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    config.setup_logging()?;

    let service = Arc::new(HttpDishService::new(config.base_url.clone()));
    let mut detail = DishDetail::new(service, Box::new(History::new()), config.base_url);
    detail.init().await;

    let mut args = std::env::args().skip(1);
    let first = args.next().map(|id| format!("open {id}"));

    println!("{}", handlers::HELP);
    if let Some(line) = first {
        run_line(&mut detail, &line).await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !run_line(&mut detail, &line).await? {
            break;
        }
    }
    Ok(())
}

async fn run_line(detail: &mut DishDetail, line: &str) -> anyhow::Result<bool> {
    match handlers::ViewerAction::new(line) {
        Ok(action) => action.run(detail).await,
        Err(hint) => {
            println!("{hint}\n\n{}", handlers::HELP);
            Ok(true)
        }
    }
}
