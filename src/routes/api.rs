use crate::{
    data::{
        DataType,
        registration::{RegistrationSubmission, register_student},
        student::Student,
    },
    error::{FetchStudentSnafu, MantraError, MantraResult},
    state::MantraState,
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, Uri},
};
use jiff::Timestamp;
use serde::Serialize;
use snafu::ResultExt;

#[derive(Debug, Clone, Serialize)]
pub struct ApiSuccess<V> {
    success: bool,
    #[serde(flatten)]
    value: V,
}

impl<V: Serialize> ApiSuccess<V> {
    pub const fn of(value: V) -> Json<Self> {
        Json(Self {
            success: true,
            value,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registered {
    message: &'static str,
    student_id: i64,
}

#[derive(Debug, Serialize)]
pub struct AllStudents {
    students: Vec<Student>,
}

#[derive(Debug, Serialize)]
pub struct OneStudent {
    student: Student,
}

#[derive(Debug, Serialize)]
pub struct Health {
    message: &'static str,
    timestamp: Timestamp,
}

pub async fn post_register(
    State(state): State<MantraState>,
    mut multipart: Multipart,
) -> MantraResult<(StatusCode, Json<ApiSuccess<Registered>>)> {
    let max_photo_bytes = state.config().upload_config().max_photo_bytes();
    let submission = RegistrationSubmission::from_multipart(&mut multipart, max_photo_bytes).await?;
    let student_id = register_student(&state, submission).await?;

    Ok((
        StatusCode::CREATED,
        ApiSuccess::of(Registered {
            message: "Registration successful! We will contact you soon.",
            student_id,
        }),
    ))
}

pub async fn get_students(State(state): State<MantraState>) -> MantraResult<Json<ApiSuccess<AllStudents>>> {
    let students = Student::get_all(&state).await?;
    Ok(ApiSuccess::of(AllStudents { students }))
}

pub async fn get_student(
    State(state): State<MantraState>,
    Path(raw_id): Path<String>,
) -> MantraResult<Json<ApiSuccess<OneStudent>>> {
    //anything that isn't an id we could have issued is just not found
    let Ok(id) = raw_id.parse::<i64>() else {
        return Err(MantraError::MissingStudent { id: raw_id });
    };

    let mut conn = state.acquire().await.context(FetchStudentSnafu { id })?;
    let Some(student) = Student::get_from_db_by_id(id, &mut conn).await? else {
        return Err(MantraError::MissingStudent { id: raw_id });
    };

    Ok(ApiSuccess::of(OneStudent { student }))
}

pub async fn get_health() -> Json<ApiSuccess<Health>> {
    ApiSuccess::of(Health {
        message: "Server is running",
        timestamp: Timestamp::now(),
    })
}

pub async fn not_found(uri: Uri) -> MantraError {
    MantraError::UnknownRoute {
        path: uri.path().to_string(),
    }
}
