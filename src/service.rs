use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::data::Dish;

/// Remote store of dishes the detail view reads from and writes comments to.
#[async_trait]
pub trait DishService: Send + Sync {
    /// Identifiers of every dish, in menu order.
    async fn get_dish_ids(&self) -> anyhow::Result<Vec<String>>;
    async fn get_dish(&self, id: &str) -> anyhow::Result<Dish>;
    /// Replace the stored dish, returning the server's canonical copy.
    async fn put_dish(&self, dish: &Dish) -> anyhow::Result<Dish>;
}

pub struct HttpDishService {
    http: Client,
    base_url: Url,
}

impl HttpDishService {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn dish_ids_url(&self) -> anyhow::Result<Url> {
        self.base_url
            .join("dish-ids")
            .with_context(|| format!("fail to build dish ids url from {}", self.base_url))
    }

    fn dishes_url(&self) -> anyhow::Result<Url> {
        self.base_url
            .join("dishes")
            .with_context(|| format!("fail to build dishes url from {}", self.base_url))
    }

    fn dish_url(&self, id: &str) -> anyhow::Result<Url> {
        let mut url = self.dishes_url()?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("base url {} cannot hold resource paths", self.base_url))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }
}

#[async_trait]
impl DishService for HttpDishService {
    async fn get_dish_ids(&self) -> anyhow::Result<Vec<String>> {
        let url = self.dish_ids_url()?;
        debug!("GET {url}");
        let ids = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("fail to decode dish ids")?;
        Ok(ids)
    }

    async fn get_dish(&self, id: &str) -> anyhow::Result<Dish> {
        let url = self.dish_url(id)?;
        debug!("GET {url}");
        let dish = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("fail to decode dish {id}"))?;
        Ok(dish)
    }

    async fn put_dish(&self, dish: &Dish) -> anyhow::Result<Dish> {
        let url = self.dish_url(&dish.id)?;
        debug!("PUT {url}");
        let dish = self
            .http
            .put(url)
            .json(dish)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("fail to decode updated dish {}", dish.id))?;
        Ok(dish)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::normalize_base_url;

    fn service(base: &str) -> HttpDishService {
        HttpDishService::new(normalize_base_url(base).unwrap())
    }

    #[test]
    fn test_dish_urls() {
        let svc = service("http://localhost:8080/api/v1");
        assert_eq!(
            svc.dishes_url().unwrap().as_str(),
            "http://localhost:8080/api/v1/dishes"
        );
        assert_eq!(
            svc.dish_url("42").unwrap().as_str(),
            "http://localhost:8080/api/v1/dishes/42"
        );
        assert_eq!(
            svc.dish_ids_url().unwrap().as_str(),
            "http://localhost:8080/api/v1/dish-ids"
        );
    }

    #[test]
    fn test_dish_id_is_escaped() {
        let svc = service("http://localhost:8080/");
        assert_eq!(
            svc.dish_url("a/b c").unwrap().as_str(),
            "http://localhost:8080/dishes/a%2Fb%20c"
        );
    }
}
