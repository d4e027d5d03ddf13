use std::str::FromStr;

use anyhow::Context;
use derive_builder::Builder;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::data::{Comment, Dish};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS dish (
    id          TEXT PRIMARY KEY NOT NULL,
    name        TEXT NOT NULL,
    image       TEXT NOT NULL DEFAULT '',
    category    TEXT NOT NULL DEFAULT '',
    featured    BOOLEAN NOT NULL DEFAULT 0,
    label       TEXT NOT NULL DEFAULT '',
    price       REAL NOT NULL DEFAULT 0,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS comment (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    dish    TEXT NOT NULL REFERENCES dish (id) ON DELETE CASCADE,
    author  TEXT NOT NULL,
    rating  INTEGER NOT NULL,
    comment TEXT NOT NULL,
    date    TEXT NOT NULL
);
"#;

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid database url {database_url}"))?
        .create_if_missing(true);
    let mut pool_options = SqlitePoolOptions::new().max_connections(5);
    if database_url.contains(":memory:") {
        // an in-memory database only lives as long as its one connection
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    }
    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("fail to open database {database_url}"))?;
    Ok(pool)
}

pub async fn migrate(db_conn: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(SCHEMA)
        .execute(db_conn)
        .await
        .context("fail to create tables")?;
    Ok(())
}

#[derive(Builder)]
pub struct NewDishProps {
    #[builder(setter(into))]
    id: String,
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into), default)]
    image: String,
    #[builder(setter(into), default)]
    category: String,
    #[builder(default)]
    featured: bool,
    #[builder(setter(into), default)]
    label: String,
    #[builder(default)]
    price: f64,
    #[builder(setter(into), default)]
    description: String,
}

pub async fn add_dish(db_conn: &SqlitePool, props: NewDishProps) -> anyhow::Result<()> {
    let NewDishProps {
        id,
        name,
        image,
        category,
        featured,
        label,
        price,
        description,
    } = props;

    sqlx::query(
        r#"
INSERT INTO dish
    (id, name, image, category, featured, label, price, description)
VALUES
    (?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&id)
    .bind(&name)
    .bind(image)
    .bind(category)
    .bind(featured)
    .bind(label)
    .bind(price)
    .bind(description)
    .execute(db_conn)
    .await
    .with_context(|| format!("fail to add dish {id} {name}"))?;

    Ok(())
}

/// Insert `dishes` with their comments, unless the menu already has entries.
/// Returns how many dishes were inserted.
pub async fn seed_dishes(db_conn: &SqlitePool, dishes: &[Dish]) -> anyhow::Result<usize> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM dish")
        .fetch_one(db_conn)
        .await?;
    if count > 0 {
        return Ok(0);
    }

    for dish in dishes {
        let props = NewDishPropsBuilder::default()
            .id(dish.id.as_str())
            .name(dish.name.as_str())
            .image(dish.image.as_str())
            .category(dish.category.as_str())
            .featured(dish.featured)
            .label(dish.label.as_str())
            .price(dish.price)
            .description(dish.description.as_str())
            .build()?;
        add_dish(db_conn, props).await?;
        for comment in &dish.comments {
            add_comment(db_conn, &dish.id, comment).await?;
        }
    }
    Ok(dishes.len())
}

pub async fn add_comment<'e, E>(db_conn: E, dish: &str, comment: &Comment) -> anyhow::Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query("INSERT INTO comment (dish, author, rating, comment, date) VALUES (?, ?, ?, ?, ?)")
        .bind(dish)
        .bind(&comment.author)
        .bind(i64::from(comment.rating))
        .bind(&comment.comment)
        .bind(&comment.date)
        .execute(db_conn)
        .await
        .with_context(|| format!("fail to add comment to dish {dish}"))?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct DishRow {
    id: String,
    name: String,
    image: String,
    category: String,
    featured: bool,
    label: String,
    price: f64,
    description: String,
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    author: String,
    rating: i64,
    comment: String,
    date: String,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            author: row.author,
            // the column only ever receives u8 values
            rating: u8::try_from(row.rating).unwrap_or(u8::MAX),
            comment: row.comment,
            date: row.date,
        }
    }
}

impl DishRow {
    fn into_dish(self, comments: Vec<Comment>) -> Dish {
        Dish {
            id: self.id,
            name: self.name,
            image: self.image,
            category: self.category,
            featured: self.featured,
            label: self.label,
            price: self.price,
            description: self.description,
            comments,
        }
    }
}

async fn get_comments(db_conn: &SqlitePool, dish: &str) -> anyhow::Result<Vec<Comment>> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT author, rating, comment, date FROM comment WHERE dish = ? ORDER BY id",
    )
    .bind(dish)
    .fetch_all(db_conn)
    .await
    .with_context(|| format!("fail to get comments of dish {dish}"))?;
    Ok(rows.into_iter().map(Comment::from).collect())
}

/// Dish identifiers in insertion order.
pub async fn get_dish_ids(db_conn: &SqlitePool) -> anyhow::Result<Vec<String>> {
    let ids: Vec<(String,)> = sqlx::query_as("SELECT id FROM dish ORDER BY rowid")
        .fetch_all(db_conn)
        .await
        .context("fail to list dish ids")?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}

pub async fn get_dishes(db_conn: &SqlitePool) -> anyhow::Result<Vec<Dish>> {
    let rows = sqlx::query_as::<_, DishRow>("SELECT * FROM dish ORDER BY rowid")
        .fetch_all(db_conn)
        .await
        .context("fail to list dishes")?;

    let mut dishes = Vec::with_capacity(rows.len());
    for row in rows {
        let comments = get_comments(db_conn, &row.id).await?;
        dishes.push(row.into_dish(comments));
    }
    Ok(dishes)
}

pub async fn get_dish(db_conn: &SqlitePool, id: &str) -> anyhow::Result<Option<Dish>> {
    let row = sqlx::query_as::<_, DishRow>("SELECT * FROM dish WHERE id = ?")
        .bind(id)
        .fetch_optional(db_conn)
        .await
        .with_context(|| format!("fail to get dish {id}"))?;

    let Some(row) = row else { return Ok(None) };
    let comments = get_comments(db_conn, id).await?;
    Ok(Some(row.into_dish(comments)))
}

/// Replace a stored dish and its comments. Returns `None` if no dish has that id.
pub async fn put_dish(db_conn: &SqlitePool, dish: &Dish) -> anyhow::Result<Option<Dish>> {
    let mut tx = db_conn.begin().await?;

    let updated = sqlx::query(
        r#"
UPDATE dish
SET name = ?, image = ?, category = ?, featured = ?, label = ?, price = ?, description = ?
WHERE id = ?"#,
    )
    .bind(&dish.name)
    .bind(&dish.image)
    .bind(&dish.category)
    .bind(dish.featured)
    .bind(&dish.label)
    .bind(dish.price)
    .bind(&dish.description)
    .bind(&dish.id)
    .execute(&mut tx)
    .await
    .with_context(|| format!("fail to update dish {}", dish.id))?
    .rows_affected();

    if updated == 0 {
        tx.rollback().await?;
        return Ok(None);
    }

    sqlx::query("DELETE FROM comment WHERE dish = ?")
        .bind(&dish.id)
        .execute(&mut tx)
        .await?;
    for comment in &dish.comments {
        add_comment(&mut tx, &dish.id, comment).await?;
    }
    tx.commit().await?;

    get_dish(db_conn, &dish.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CommentBuilder;

    async fn memory_db() -> SqlitePool {
        let db = connect("sqlite::memory:").await.unwrap();
        migrate(&db).await.unwrap();
        db
    }

    fn new_dish(id: &str, name: &str) -> NewDishProps {
        NewDishPropsBuilder::default()
            .id(id)
            .name(name)
            .image("images/uthappizza.png")
            .price(4.99)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_ids_keep_insertion_order() {
        let db = memory_db().await;
        for (id, name) in [("2", "Vadonut"), ("0", "Uthappizza"), ("1", "Zucchipakoda")] {
            add_dish(&db, new_dish(id, name)).await.unwrap();
        }

        assert_eq!(get_dish_ids(&db).await.unwrap(), vec!["2", "0", "1"]);
        let names: Vec<_> = get_dishes(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["Vadonut", "Uthappizza", "Zucchipakoda"]);
    }

    #[tokio::test]
    async fn test_get_missing_dish() {
        let db = memory_db().await;
        assert!(get_dish(&db, "404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_dish_replaces_comments() {
        let db = memory_db().await;
        add_dish(&db, new_dish("0", "Uthappizza")).await.unwrap();

        let mut dish = get_dish(&db, "0").await.unwrap().unwrap();
        assert!(dish.comments.is_empty());

        let comment = "Very good chicken, love from WuHan";
        dish.comments.push(
            CommentBuilder::default()
                .author("Avimitin")
                .rating(5u8)
                .comment(comment)
                .build()
                .unwrap(),
        );
        dish.label = "Hot".to_string();

        let stored = put_dish(&db, &dish).await.unwrap().unwrap();
        assert_eq!(stored, dish);
        assert_eq!(stored.comments[0].comment, comment);

        // a second put does not duplicate earlier comments
        let stored = put_dish(&db, &stored).await.unwrap().unwrap();
        assert_eq!(stored.comments.len(), 1);
    }

    #[tokio::test]
    async fn test_put_unknown_dish() {
        let db = memory_db().await;
        let ghost: Dish = serde_json::from_str(r#"{"id":"ghost","name":"Nothing"}"#).unwrap();
        assert!(put_dish(&db, &ghost).await.unwrap().is_none());
        assert!(get_dish_ids(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_seed_only_when_empty() {
        let db = memory_db().await;
        let dishes: Vec<Dish> = serde_json::from_str(
            r#"[
                {"id":"0","name":"Uthappizza","comments":[
                    {"author":"John Lemon","rating":5,"comment":"Imagine all the eatables","date":"2012-10-16T17:57:28.556Z"}
                ]},
                {"id":"1","name":"Zucchipakoda"}
            ]"#,
        )
        .unwrap();

        assert_eq!(seed_dishes(&db, &dishes).await.unwrap(), 2);
        assert_eq!(seed_dishes(&db, &dishes).await.unwrap(), 0);

        let dish = get_dish(&db, "0").await.unwrap().unwrap();
        assert_eq!(dish, dishes[0]);
    }
}
