use crate::{
    data::DataType,
    error::{
        CommitTransactionSnafu, FetchStudentSnafu, FetchStudentsSnafu, FormatTimestampSnafu,
        GetDatabaseConnectionSnafu, InsertStudentSnafu, InvalidStoredTimestampSnafu, MakeQuerySnafu,
        MantraError, MantraResult,
    },
};
use serde::{Serialize, Serializer};
use snafu::ResultExt;
use sqlx::{FromRow, Pool, Sqlite, SqliteConnection};
use time::{
    OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem,
    macros::format_description,
};

///fixed-width so that `ORDER BY created_at` on the text column is chronological
const STORAGE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:9]Z"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CreatedAt(pub OffsetDateTime);

impl CreatedAt {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    pub fn to_storage(self) -> MantraResult<String> {
        self.0.format(STORAGE_FORMAT).context(FormatTimestampSnafu)
    }
}

impl TryFrom<String> for CreatedAt {
    type Error = MantraError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PrimitiveDateTime::parse(&value, STORAGE_FORMAT)
            .map(|pdt| Self(pdt.assume_utc()))
            .context(InvalidStoredTimestampSnafu { original: value })
    }
}

impl Serialize for CreatedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        time::serde::rfc3339::serialize(&self.0, serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub aadhar: String,
    pub father_name: String,
    pub address: String,
    pub mobile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
    pub medium: String,
    pub class: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitive_exam: Option<String>,
    #[sqlx(try_from = "String")]
    pub created_at: CreatedAt,
}

///an already-validated registration, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub aadhar: String,
    pub father_name: String,
    pub address: String,
    pub mobile: String,
    pub photo_path: Option<String>,
    pub medium: String,
    pub class: String,
    pub competitive_exam: Option<String>,
}

impl DataType for Student {
    type Id = i64;
    type FormForAdding = NewStudent;

    async fn get_from_db_by_id(id: Self::Id, conn: &mut SqliteConnection) -> MantraResult<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM students WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await
            .context(FetchStudentSnafu { id })
    }

    async fn get_all(pool: &Pool<Sqlite>) -> MantraResult<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM students ORDER BY created_at DESC, id DESC")
            .fetch_all(pool)
            .await
            .context(FetchStudentsSnafu)
    }

    async fn insert_into_database(
        to_be_added: Self::FormForAdding,
        conn: &mut SqliteConnection,
    ) -> MantraResult<Self::Id> {
        let NewStudent {
            first_name,
            last_name,
            aadhar,
            father_name,
            address,
            mobile,
            photo_path,
            medium,
            class,
            competitive_exam,
        } = to_be_added;
        let created_at = CreatedAt::now().to_storage()?;

        sqlx::query_scalar::<_, i64>(
            "INSERT INTO students (first_name, last_name, aadhar, father_name, address, mobile, photo_path, medium, class, competitive_exam, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(aadhar)
        .bind(father_name)
        .bind(address)
        .bind(mobile)
        .bind(photo_path)
        .bind(medium)
        .bind(class)
        .bind(competitive_exam)
        .bind(created_at)
        .fetch_one(conn)
        .await
        .context(InsertStudentSnafu)
    }
}

fn sample_students() -> [NewStudent; 3] {
    let sample = |first: &str, last: &str, aadhar: &str, father: &str, address: &str, mobile: &str, medium: &str, class: &str, exam: &str| NewStudent {
        first_name: first.into(),
        last_name: last.into(),
        aadhar: aadhar.into(),
        father_name: father.into(),
        address: address.into(),
        mobile: mobile.into(),
        photo_path: None,
        medium: medium.into(),
        class: class.into(),
        competitive_exam: Some(exam.into()),
    };

    [
        sample("Raj", "Kumar", "123456789012", "Ram Kumar", "123 Main Street, Delhi", "9876543210", "CBSE", "10", "SSC CGL"),
        sample("Priya", "Sharma", "987654321098", "Suresh Sharma", "456 Park Avenue, Mumbai", "8765432109", "UP Board", "12", "NDA"),
        sample("Amit", "Singh", "456789123456", "Rajesh Singh", "789 Garden Road, Lucknow", "7654321098", "CBSE", "11", "UPSC Prelims"),
    ]
}

///development convenience: fills an empty table with a few demo rows.
///returns how many rows were inserted
pub async fn seed_sample_students(pool: &Pool<Sqlite>) -> MantraResult<usize> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(pool)
        .await
        .context(MakeQuerySnafu)?;
    if existing > 0 {
        info!(existing, "Sample data already exists, skipping insertion");
        return Ok(0);
    }

    let mut transaction = pool.begin().await.context(GetDatabaseConnectionSnafu)?;
    let samples = sample_students();
    let count = samples.len();
    for student in samples {
        Student::insert_into_database(student, &mut transaction).await?;
    }
    transaction.commit().await.context(CommitTransactionSnafu)?;

    info!(count, "Inserted sample students");
    Ok(count)
}
