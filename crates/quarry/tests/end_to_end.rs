use std::collections::HashMap;

use pretty_assertions::assert_eq;
use quarry::{
    Column, ColumnType, Comparator, Database, Direction, FromValue, Model, NamingConvention, Row,
    TableDef, Value,
};
use quarry_driver_sqlite::Sqlite;

#[derive(Debug, Default, Clone, PartialEq)]
struct User {
    id: i64,
    name: String,
}

impl Model for User {
    const NAME: &'static str = "User";

    fn table(_naming: &dyn NamingConvention) -> TableDef {
        TableDef::new(Self::NAME)
            .column(Column::new("id", ColumnType::BigInt))
            .column(Column::new("name", ColumnType::Text).size(120).not_null())
            .has_many("Post")
    }

    fn from_row(row: &Row) -> quarry::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }

    fn values(&self) -> Vec<(String, Value)> {
        vec![("name".into(), Value::from(&self.name))]
    }

    fn primary_key(&self) -> Value {
        self.id.into()
    }

    fn set_primary_key(&mut self, value: Value) -> quarry::Result<()> {
        self.id = i64::from_value(value)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Post {
    id: i64,
    title: String,
    views: i64,
    user_id: i64,
}

impl Model for Post {
    const NAME: &'static str = "Post";

    fn table(_naming: &dyn NamingConvention) -> TableDef {
        TableDef::new(Self::NAME)
            .column(Column::new("id", ColumnType::BigInt))
            .column(Column::new("title", ColumnType::Text).size(255).not_null())
            .column(Column::new("views", ColumnType::BigInt).default_value(0))
            .column(Column::new("user_id", ColumnType::BigInt))
            .belongs_to("User")
            .has_many("Comment")
    }

    fn from_row(row: &Row) -> quarry::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            views: row.get("views")?,
            user_id: row.get("user_id")?,
        })
    }

    fn values(&self) -> Vec<(String, Value)> {
        vec![
            ("title".into(), Value::from(&self.title)),
            ("views".into(), self.views.into()),
            ("user_id".into(), self.user_id.into()),
        ]
    }

    fn primary_key(&self) -> Value {
        self.id.into()
    }

    fn set_primary_key(&mut self, value: Value) -> quarry::Result<()> {
        self.id = i64::from_value(value)?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Comment {
    id: i64,
    body: String,
    post_id: i64,
}

impl Model for Comment {
    const NAME: &'static str = "Comment";

    fn table(_naming: &dyn NamingConvention) -> TableDef {
        TableDef::new(Self::NAME)
            .column(Column::new("id", ColumnType::BigInt))
            .column(Column::new("body", ColumnType::Text))
            .column(Column::new("post_id", ColumnType::BigInt))
            .belongs_to("Post")
    }

    fn from_row(row: &Row) -> quarry::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            body: row.get("body")?,
            post_id: row.get("post_id")?,
        })
    }

    fn values(&self) -> Vec<(String, Value)> {
        vec![
            ("body".into(), Value::from(&self.body)),
            ("post_id".into(), self.post_id.into()),
        ]
    }

    fn primary_key(&self) -> Value {
        self.id.into()
    }

    fn set_primary_key(&mut self, value: Value) -> quarry::Result<()> {
        self.id = i64::from_value(value)?;
        Ok(())
    }
}

fn database() -> Database {
    // First caller wins; later inits are no-ops.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let connection = Sqlite::in_memory().connect().unwrap();
    let db = Database::builder()
        .model::<User>()
        .model::<Post>()
        .model::<Comment>()
        .build("sqlite3", "main", Box::new(connection))
        .unwrap();
    db.create_tables().unwrap();
    db
}

fn seed(db: &Database) -> (User, User) {
    let mut ada = User {
        id: 0,
        name: "ada".into(),
    };
    let mut brian = User {
        id: 0,
        name: "brian".into(),
    };
    db.save(&mut ada).unwrap();
    db.save(&mut brian).unwrap();

    for (title, views, user_id) in [
        ("intro", 10, ada.id),
        ("methods", 25, ada.id),
        ("closing", 3, brian.id),
    ] {
        let mut post = Post {
            id: 0,
            title: title.into(),
            views,
            user_id,
        };
        db.save(&mut post).unwrap();
        let mut comment = Comment {
            id: 0,
            body: format!("re: {title}"),
            post_id: post.id,
        };
        db.save(&mut comment).unwrap();
    }
    (ada, brian)
}

#[test]
fn save_assigns_and_then_updates() {
    let db = database();
    let mut user = User {
        id: 0,
        name: "ada".into(),
    };
    db.save(&mut user).unwrap();
    assert_eq!(user.id, 1);

    user.name = "ada lovelace".into();
    db.save(&mut user).unwrap();

    let reloaded: User = db.find(user.id).unwrap();
    assert_eq!(reloaded.name, "ada lovelace");
    assert_eq!(db.scope::<User>().unwrap().count().unwrap(), 1);
}

#[test]
fn find_missing_row_is_no_rows() {
    let db = database();
    let err = db.find::<User>(42).unwrap_err();
    assert!(err.is_no_rows());
}

#[test]
fn chaining_filters_narrows_and_branches() {
    let db = database();
    seed(&db);

    let posts = db.scope::<Post>().unwrap();
    let popular = posts.cmp("posts.views", Comparator::Ge, 10);
    let by_title = popular.equal_to("posts.title", "methods");

    // Branching off `popular` does not disturb it.
    assert_eq!(popular.count().unwrap(), 2);
    assert_eq!(by_title.count().unwrap(), 1);
    assert_eq!(posts.count().unwrap(), 3);

    let titles: Vec<String> = posts
        .between("posts.views", 5, 30)
        .order_by("posts.views", Direction::Desc)
        .pluck("title")
        .unwrap();
    assert_eq!(titles, vec!["methods".to_string(), "intro".to_string()]);
}

#[test]
fn in_list_expands_and_matches() {
    let db = database();
    seed(&db);

    let posts = db
        .scope::<Post>()
        .unwrap()
        .in_list("posts.title", vec!["intro".into(), "closing".into()])
        .order("posts.title")
        .all()
        .unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].title, "closing");
}

#[test]
fn named_bindings_filter() {
    let db = database();
    seed(&db);

    let mut binds = HashMap::new();
    binds.insert("min".to_string(), Value::from(5));
    binds.insert("max".to_string(), Value::from(30));

    let count = db
        .scope::<Post>()
        .unwrap()
        .filter_named("posts.views >= :min: AND posts.views <= :max:", &binds)
        .count()
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn resolved_joins_reach_related_tables() {
    let db = database();
    let (ada, _) = seed(&db);

    // One hop: posts -> users.
    let posts = db
        .scope::<Post>()
        .unwrap()
        .inner_join::<User>()
        .unwrap()
        .filter("users.name = ?", vec!["ada".into()])
        .order("posts.title")
        .all()
        .unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.user_id == ada.id));

    // Two hops: comments -> posts -> users, resolved transitively.
    let comments = db
        .scope::<Comment>()
        .unwrap()
        .inner_join::<User>()
        .unwrap()
        .filter("users.name = ?", vec!["brian".into()])
        .all()
        .unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].body, "re: closing");
}

#[test]
fn joining_twice_adds_one_join() {
    let db = database();
    seed(&db);

    let scope = db
        .scope::<Post>()
        .unwrap()
        .inner_join::<User>()
        .unwrap()
        .inner_join::<User>()
        .unwrap();
    assert_eq!(scope.stmt().joins.len(), 1);
    assert_eq!(scope.count().unwrap(), 3);
}

#[test]
fn count_and_pluck_agree() {
    let db = database();
    seed(&db);

    let posts = db.scope::<Post>().unwrap();
    let ids: Vec<i64> = posts.pluck("id").unwrap();
    assert_eq!(ids.len() as i64, posts.count().unwrap());
}

#[test]
fn group_by_with_aggregate_pluck() {
    let db = database();
    seed(&db);

    let authors: Vec<i64> = db
        .scope::<Post>()
        .unwrap()
        .group_by("posts.user_id")
        .order("posts.user_id")
        .pluck("user_id")
        .unwrap();
    assert_eq!(authors, vec![1, 2]);
}

#[test]
fn update_attribute_and_raw_set() {
    let db = database();
    seed(&db);

    let posts = db.scope::<Post>().unwrap();
    let touched = posts
        .equal_to("posts.title", "intro")
        .update_attribute("views", 11)
        .unwrap();
    assert_eq!(touched, 1);

    let views: Vec<i64> = posts
        .equal_to("posts.title", "intro")
        .pluck("views")
        .unwrap();
    assert_eq!(views, vec![11]);

    // Raw SET expressions go through untouched.
    let touched = posts.update_sql("views = views + 1", vec![]).unwrap();
    assert_eq!(touched, 3);
    let total: i64 = db
        .query_value("SELECT SUM(views) FROM posts", &[])
        .unwrap();
    assert_eq!(total, 11 + 25 + 3 + 3);
}

#[test]
fn conditional_and_unconditional_delete() {
    let db = database();
    seed(&db);

    let comments = db.scope::<Comment>().unwrap();
    assert_eq!(
        comments
            .filter("body LIKE ?", vec!["re: c%".into()])
            .delete()
            .unwrap(),
        1
    );

    // No conditions means the whole table goes. Deliberate.
    assert_eq!(comments.delete().unwrap(), 2);
    assert_eq!(comments.count().unwrap(), 0);
}

#[test]
fn transactions_roll_back_and_respect_the_limit() {
    let db = database();
    seed(&db);
    let posts_before = db.scope::<Post>().unwrap().count().unwrap();

    {
        let tx = db.begin_transaction().unwrap();
        let mut post = Post {
            id: 0,
            title: "draft".into(),
            views: 0,
            user_id: 1,
        };
        db.save(&mut post).unwrap();
        tx.rollback().unwrap();
    }
    assert_eq!(db.scope::<Post>().unwrap().count().unwrap(), posts_before);

    db.set_transaction_limit(1, false);
    let tx = db.begin_transaction().unwrap();
    let err = db.begin_transaction().unwrap_err();
    assert!(err.is_transaction_limit());
    tx.commit().unwrap();

    // The slot freed; a new transaction may start.
    db.begin_transaction().unwrap();
}

#[test]
fn dropping_a_transaction_rolls_back() {
    let db = database();
    seed(&db);
    let before = db.scope::<User>().unwrap().count().unwrap();

    {
        let _tx = db.begin_transaction().unwrap();
        let mut user = User {
            id: 0,
            name: "ghost".into(),
        };
        db.save(&mut user).unwrap();
    }
    assert_eq!(db.scope::<User>().unwrap().count().unwrap(), before);
}

#[test]
fn drop_tables_removes_everything() {
    let db = database();
    seed(&db);
    db.drop_tables().unwrap();

    // The tables are gone; querying one is a driver error now.
    assert!(db.scope::<User>().unwrap().count().is_err());
}
