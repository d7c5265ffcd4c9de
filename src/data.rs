use crate::error::MantraResult;
use sqlx::{Pool, Sqlite, SqliteConnection};

pub mod photo;
pub mod registration;
pub mod student;

pub trait DataType: Sized {
    type Id;
    type FormForAdding;

    async fn get_from_db_by_id(id: Self::Id, conn: &mut SqliteConnection) -> MantraResult<Option<Self>>;
    async fn get_all(pool: &Pool<Sqlite>) -> MantraResult<Vec<Self>>;
    async fn insert_into_database(to_be_added: Self::FormForAdding, conn: &mut SqliteConnection) -> MantraResult<Self::Id>;
}
