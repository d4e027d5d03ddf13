use std::{collections::HashMap, sync::Arc};

use anyhow::{anyhow, Context};
use reqwest::Url;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    data::Dish,
    form::{CommentForm, FormErrors},
    navigation::Location,
    service::DishService,
    siblings::siblings,
    switch::{SwitchLatest, Ticket},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Shown,
    Hidden,
}

/// Parameters extracted from the current navigation path.
#[derive(Debug, Clone, Default)]
pub struct RouteParams {
    params: HashMap<String, String>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        let mut params = Self::new();
        params.insert("id", id);
        params
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Everything a template binds to, apart from the form.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub dish: Option<Dish>,
    /// working copy that new comments are appended to
    pub modified_dish: Option<Dish>,
    pub dish_ids: Option<Vec<String>>,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub err_mess: Option<String>,
    pub visibility: Visibility,
}

impl Default for DetailView {
    fn default() -> Self {
        Self {
            dish: None,
            modified_dish: None,
            dish_ids: None,
            prev: None,
            next: None,
            err_mess: None,
            visibility: Visibility::Shown,
        }
    }
}

impl DetailView {
    fn show(&mut self, dish: Dish) {
        self.modified_dish = Some(dish.clone());
        self.dish = Some(dish);
        self.err_mess = None;
        self.set_prev_next();
        self.visibility = Visibility::Shown;
    }

    fn set_prev_next(&mut self) {
        let found = match (&self.dish, &self.dish_ids) {
            (Some(dish), Some(ids)) => siblings(&dish.id, ids),
            _ => None,
        };
        self.prev = found.as_ref().map(|s| s.prev.clone());
        self.next = found.map(|s| s.next);
    }

    fn fail(&mut self, err: &anyhow::Error) {
        self.err_mess = Some(format!("{err:#}"));
    }
}

pub struct DishDetail {
    service: Arc<dyn DishService>,
    location: Arc<Mutex<Box<dyn Location>>>,
    base_url: Url,
    view: Arc<Mutex<DetailView>>,
    form: CommentForm,
    switch: SwitchLatest,
}

impl DishDetail {
    pub fn new(service: Arc<dyn DishService>, location: Box<dyn Location>, base_url: Url) -> Self {
        Self {
            service,
            location: Arc::new(Mutex::new(location)),
            base_url,
            view: Arc::new(Mutex::new(DetailView::default())),
            form: CommentForm::new(),
            switch: SwitchLatest::new(),
        }
    }

    /// Base url templates resolve image paths against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Load the dish identifiers used for prev/next navigation.
    pub async fn init(&self) {
        let result = self
            .service
            .get_dish_ids()
            .await
            .context("fail to load dish list");

        let mut view = self.view.lock().await;
        match result {
            Ok(ids) => {
                debug!("loaded {} dish ids", ids.len());
                view.dish_ids = Some(ids);
                view.set_prev_next();
            }
            Err(err) => {
                warn!("{err:#}");
                view.fail(&err);
            }
        }
    }

    /// React to a new route: hide the current dish and fetch the requested one
    /// in the background. Any fetch still running for an older route is
    /// cancelled.
    pub async fn route_changed(&mut self, params: RouteParams) {
        let id = params.get("id").map(str::to_string);

        let ticket = {
            let mut view = self.view.lock().await;
            view.visibility = Visibility::Hidden;
            self.switch.begin()
        };

        let service = Arc::clone(&self.service);
        let view = Arc::clone(&self.view);
        let location = Arc::clone(&self.location);
        let task = tokio::spawn(async move {
            let result = match id {
                Some(id) => service
                    .get_dish(&id)
                    .await
                    .with_context(|| format!("fail to load dish {id}")),
                None => Err(anyhow!("missing route parameter `id`")),
            };
            apply_fetch(&view, &location, &ticket, result).await;
        });
        self.switch.track(task);
    }

    /// Wait until the latest route fetch has been applied.
    pub async fn settled(&mut self) {
        self.switch.settle().await;
    }

    pub async fn view(&self) -> DetailView {
        self.view.lock().await.clone()
    }

    pub fn form(&self) -> &CommentForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut CommentForm {
        &mut self.form
    }

    pub fn form_errors(&self) -> &FormErrors {
        self.form.errors()
    }

    /// Append the form's comment to the shown dish and persist it.
    ///
    /// The form is only cleared once the server has accepted the update. A
    /// rejected update clears the dish and reports through `err_mess`.
    pub async fn submit(&mut self) -> anyhow::Result<Dish> {
        let comment = match self.form.to_comment() {
            Ok(comment) => comment,
            Err(err) => {
                // surface every message, including fields never edited
                self.form.touch_all();
                return Err(err);
            }
        };

        let modified = {
            let mut view = self.view.lock().await;
            let mut modified = view
                .modified_dish
                .clone()
                .context("no dish loaded to comment on")?;
            modified.comments.push(comment);
            view.modified_dish = Some(modified.clone());
            modified
        };

        let result = self
            .service
            .put_dish(&modified)
            .await
            .with_context(|| format!("fail to save comment on dish {}", modified.id));

        let mut view = self.view.lock().await;
        match result {
            Ok(dish) => {
                info!("comment saved on dish {}", dish.id);
                let shown_id = view.dish.as_ref().map(|d| d.id.as_str());
                let still_shown = shown_id == Some(dish.id.as_str());
                if still_shown {
                    view.show(dish.clone());
                } else {
                    debug!("dish {} is no longer shown, keeping current view", dish.id);
                }
                self.form.reset();
                Ok(dish)
            }
            Err(err) => {
                warn!("{err:#}");
                let shown_id = view.dish.as_ref().map(|d| d.id.as_str());
                if shown_id == Some(modified.id.as_str()) {
                    view.dish = None;
                    view.modified_dish = None;
                    view.prev = None;
                    view.next = None;
                }
                view.fail(&err);
                Err(err)
            }
        }
    }

    /// Step back in history, returning the route that should be shown now.
    pub async fn go_back(&mut self) -> Option<String> {
        self.location.lock().await.back()
    }
}

async fn apply_fetch(
    view: &Mutex<DetailView>,
    location: &Mutex<Box<dyn Location>>,
    ticket: &Ticket,
    result: anyhow::Result<Dish>,
) {
    let mut view = view.lock().await;
    if !ticket.is_current() {
        debug!("dropping result of a superseded dish fetch");
        return;
    }
    match result {
        Ok(dish) => {
            debug!("showing dish {}", dish.id);
            // only routes that actually loaded become history steps
            location.lock().await.visit(&dish.id);
            view.show(dish);
        }
        Err(err) => {
            warn!("{err:#}");
            view.fail(&err);
        }
    }
}
